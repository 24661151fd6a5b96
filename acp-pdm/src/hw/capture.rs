//! PDM capture start/stop and interrupt masking.
//!
//! Ordering matters on both edges. Start enables the clock, then the PDM
//! decimator, then its DMA. Stop waits for the DMA to drain in-flight
//! transfers before the decimator is disabled, and flushes the FIFO last.

use embedded_hal::delay::DelayNs;
use log::{debug, error};

use super::AcpHardware;
use crate::constants::{DMA_POLL_DELAY_US, DMA_POLL_LIMIT, NUM_CHANNELS};
use crate::error::{Error, Result, Stage};
use crate::regs::{map, poll, Registers};

/// Capture engine state.
///
/// `Starting` and `Stopping` persist only when a sequence failed part way;
/// from either, both [`start_capture`](AcpHardware::start_capture) and
/// [`stop_capture`](AcpHardware::stop_capture) run their full sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl<R, D> AcpHardware<R, D>
where
    R: Registers,
    D: DelayNs,
{
    /// Select the PDM clock frequency and ungate the PDM clock.
    pub fn enable_clock(&mut self) {
        self.regs.write32(map::ACP_PDM_CLK_FREQ_MASK, map::ACP_WOV_CLK_CTRL);
        self.regs
            .modify32(map::ACP_WOV_MISC_CTRL, map::ACP_WOV_MISC_CTRL_MASK, 0);
    }

    /// Stereo input at the fixed decimation factor.
    pub fn configure_pdm(&mut self) {
        self.regs.write32(NUM_CHANNELS, map::ACP_WOV_PDM_NO_OF_CHANNELS);
        self.regs
            .write32(map::PDM_DECIMATION_FACTOR, map::ACP_WOV_PDM_DECIMATION_FACTOR);
    }

    /// Start PDM capture.
    ///
    /// No-op when already running. Otherwise enables the clock, the PDM
    /// decimator and the PDM DMA, then waits for the DMA to report enabled.
    pub fn start_capture(&mut self) -> Result<()> {
        if self.capture == CaptureState::Running {
            return Ok(());
        }
        self.capture = CaptureState::Starting;

        self.enable_clock();
        self.regs.write32(map::ACP_PDM_ENABLE, map::ACP_WOV_PDM_ENABLE);
        self.regs.write32(map::ACP_PDM_DMA_EN, map::ACP_WOV_PDM_DMA_ENABLE);

        let delay = &mut self.delay;
        poll(
            &self.regs,
            map::ACP_WOV_PDM_DMA_ENABLE,
            DMA_POLL_LIMIT,
            || delay.delay_us(DMA_POLL_DELAY_US),
            |v| v & map::ACP_PDM_DMA_EN_STATUS == map::ACP_PDM_DMA_EN_STATUS,
        )
        .ok_or_else(|| {
            error!("acp-pdm: PDM DMA did not start");
            Error::Timeout(Stage::DmaEnable)
        })?;

        self.capture = CaptureState::Running;
        debug!("acp-pdm: capture running");
        Ok(())
    }

    /// Stop PDM capture.
    ///
    /// No-op when idle. A running DMA is asked to disable and waited on;
    /// then the decimator is switched off and the FIFO flushed.
    pub fn stop_capture(&mut self) -> Result<()> {
        if self.capture == CaptureState::Idle {
            return Ok(());
        }
        self.capture = CaptureState::Stopping;

        let pdm_enable = self.regs.read32(map::ACP_WOV_PDM_ENABLE);
        let dma_enable = self.regs.read32(map::ACP_WOV_PDM_DMA_ENABLE);

        if dma_enable & map::ACP_PDM_DMA_EN != 0 {
            self.regs
                .write32(map::ACP_PDM_DMA_DISABLE_REQ, map::ACP_WOV_PDM_DMA_ENABLE);

            let delay = &mut self.delay;
            poll(
                &self.regs,
                map::ACP_WOV_PDM_DMA_ENABLE,
                DMA_POLL_LIMIT,
                || delay.delay_us(DMA_POLL_DELAY_US),
                |v| v & map::ACP_PDM_DMA_EN_STATUS == 0,
            )
            .ok_or_else(|| {
                error!("acp-pdm: PDM DMA did not stop");
                Error::Timeout(Stage::DmaDisable)
            })?;
        }

        if pdm_enable & map::ACP_PDM_ENABLE != 0 {
            self.regs.write32(map::ACP_PDM_DISABLE, map::ACP_WOV_PDM_ENABLE);
        }

        self.regs.write32(0x1, map::ACP_WOV_PDM_FIFO_FLUSH);
        self.capture = CaptureState::Idle;
        debug!("acp-pdm: capture stopped");
        Ok(())
    }

    /// Enable external interrupts and unmask the PDM DMA cause.
    pub fn enable_interrupts(&mut self) {
        self.regs.write32(0x1, map::ACP_EXTERNAL_INTR_ENB);
        self.regs
            .modify32(map::ACP_EXTERNAL_INTR_CNTL, map::PDM_DMA_INTR_MASK, 0);
    }

    /// Mask the PDM DMA cause, clear latched status, disable external
    /// interrupts.
    pub fn disable_interrupts(&mut self) {
        self.regs
            .modify32(map::ACP_EXTERNAL_INTR_CNTL, 0, map::PDM_DMA_INTR_MASK);
        self.regs
            .write32(map::ACP_EXT_INTR_STAT_CLEAR_MASK, map::ACP_EXTERNAL_INTR_STAT);
        self.regs.write32(0x0, map::ACP_EXTERNAL_INTR_ENB);
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    /// Whether the decimator is on and the DMA reports enabled.
    pub fn is_dma_running(&self) -> bool {
        let pdm_enable = self.regs.read32(map::ACP_WOV_PDM_ENABLE);
        let dma_enable = self.regs.read32(map::ACP_WOV_PDM_DMA_ENABLE);
        pdm_enable & map::ACP_PDM_ENABLE != 0
            && dma_enable & map::ACP_PDM_DMA_EN_STATUS != 0
    }

    /// 64-bit count of bytes written by the PDM DMA.
    pub fn linear_position(&self) -> u64 {
        let high = self.regs.read32(map::ACP_WOV_RX_LINEARPOSITIONCNTR_HIGH);
        let low = self.regs.read32(map::ACP_WOV_RX_LINEARPOSITIONCNTR_LOW);
        (u64::from(high) << 32) | u64::from(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingDelay, SimAcp};

    fn hw(sim: &SimAcp) -> AcpHardware<&SimAcp, CountingDelay> {
        AcpHardware::new(sim, CountingDelay::default())
    }

    // ── Clock ─────────────────────────────────────────────────────────

    #[test]
    fn enable_clock_sets_divisor_and_gate_bit() {
        let sim = SimAcp::powered();
        sim.set(map::ACP_WOV_MISC_CTRL, 0x0100);
        hw(&sim).enable_clock();
        assert_eq!(sim.get(map::ACP_WOV_CLK_CTRL), 0x7);
        assert_eq!(sim.get(map::ACP_WOV_MISC_CTRL), 0x0110);
    }

    #[test]
    fn configure_pdm_programs_stereo() {
        let sim = SimAcp::powered();
        hw(&sim).configure_pdm();
        assert_eq!(sim.get(map::ACP_WOV_PDM_NO_OF_CHANNELS), 2);
        assert_eq!(sim.get(map::ACP_WOV_PDM_DECIMATION_FACTOR), 2);
    }

    // ── Start ─────────────────────────────────────────────────────────

    #[test]
    fn start_enables_pdm_before_dma() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.start_capture().unwrap();

        assert_eq!(hw.capture_state(), CaptureState::Running);
        assert!(hw.is_dma_running());

        let clk = sim.first_write(map::ACP_WOV_CLK_CTRL).unwrap();
        let pdm = sim.first_write(map::ACP_WOV_PDM_ENABLE).unwrap();
        let dma = sim.first_write(map::ACP_WOV_PDM_DMA_ENABLE).unwrap();
        assert!(clk < pdm && pdm < dma);
    }

    #[test]
    fn start_twice_does_not_touch_hardware() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.start_capture().unwrap();
        sim.clear_log();

        hw.start_capture().unwrap();
        assert!(sim.writes().is_empty());
        assert_eq!(sim.reads_of(map::ACP_WOV_PDM_DMA_ENABLE), 0);
    }

    #[test]
    fn start_times_out_after_exact_bound() {
        let sim = SimAcp::powered();
        sim.hold_dma.set(true);
        let mut hw = hw(&sim);

        assert_eq!(hw.start_capture(), Err(Error::Timeout(Stage::DmaEnable)));
        assert_eq!(sim.reads_of(map::ACP_WOV_PDM_DMA_ENABLE), DMA_POLL_LIMIT);
        assert_eq!(hw.capture_state(), CaptureState::Starting);

        let (_, delay) = hw.release();
        assert_eq!(delay.calls, DMA_POLL_LIMIT);
        assert_eq!(delay.total_ns, u64::from(DMA_POLL_LIMIT) * 5_000);
    }

    // ── Stop ──────────────────────────────────────────────────────────

    #[test]
    fn stop_when_idle_is_a_no_op() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.stop_capture().unwrap();
        assert!(sim.writes().is_empty());
        assert_eq!(hw.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn stop_disables_dma_then_pdm_then_flushes() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.start_capture().unwrap();
        sim.clear_log();

        hw.stop_capture().unwrap();
        assert_eq!(
            sim.writes(),
            [
                (map::ACP_WOV_PDM_DMA_ENABLE, 0x2),
                (map::ACP_WOV_PDM_ENABLE, 0x0),
                (map::ACP_WOV_PDM_FIFO_FLUSH, 0x1),
            ]
        );
        assert_eq!(hw.capture_state(), CaptureState::Idle);
        assert!(!hw.is_dma_running());
    }

    #[test]
    fn stop_skips_disable_for_inactive_units() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.start_capture().unwrap();
        // Hardware already quiesced on its own.
        sim.set(map::ACP_WOV_PDM_DMA_ENABLE, 0);
        sim.set(map::ACP_WOV_PDM_ENABLE, 0);
        sim.clear_log();

        hw.stop_capture().unwrap();
        assert_eq!(sim.writes(), [(map::ACP_WOV_PDM_FIFO_FLUSH, 0x1)]);
    }

    #[test]
    fn stop_timeout_leaves_pdm_enabled() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.start_capture().unwrap();
        sim.hold_dma.set(true);

        assert_eq!(hw.stop_capture(), Err(Error::Timeout(Stage::DmaDisable)));
        assert_eq!(hw.capture_state(), CaptureState::Stopping);
        assert_eq!(sim.get(map::ACP_WOV_PDM_ENABLE), 1);
        assert!(sim.writes_to(map::ACP_WOV_PDM_FIFO_FLUSH).is_empty());
    }

    #[test]
    fn failed_start_can_be_stopped() {
        let sim = SimAcp::powered();
        sim.hold_dma.set(true);
        let mut hw = hw(&sim);
        assert!(hw.start_capture().is_err());
        sim.hold_dma.set(false);

        hw.stop_capture().unwrap();
        assert_eq!(hw.capture_state(), CaptureState::Idle);
        assert_eq!(sim.get(map::ACP_WOV_PDM_ENABLE), 0);
    }

    // ── Interrupts ────────────────────────────────────────────────────

    #[test]
    fn enable_interrupts_unmasks_pdm_cause() {
        let sim = SimAcp::powered();
        sim.set(map::ACP_EXTERNAL_INTR_CNTL, 0x1);
        hw(&sim).enable_interrupts();
        assert_eq!(sim.get(map::ACP_EXTERNAL_INTR_ENB), 1);
        assert_eq!(sim.get(map::ACP_EXTERNAL_INTR_CNTL), 0x1 | (1 << 16));
    }

    #[test]
    fn disable_interrupts_masks_and_clears_status() {
        let sim = SimAcp::powered();
        let mut hw = hw(&sim);
        hw.enable_interrupts();
        sim.raise(map::PDM_DMA_STAT | map::ACP_ERROR_STAT);

        hw.disable_interrupts();
        assert_eq!(sim.get(map::ACP_EXTERNAL_INTR_CNTL) & (1 << 16), 0);
        assert_eq!(sim.get(map::ACP_EXTERNAL_INTR_STAT), 0);
        assert_eq!(sim.get(map::ACP_EXTERNAL_INTR_ENB), 0);
        assert_eq!(
            sim.writes_to(map::ACP_EXTERNAL_INTR_STAT),
            [0xFFFF_FFFF]
        );
    }

    // ── Position ──────────────────────────────────────────────────────

    #[test]
    fn linear_position_combines_words() {
        let sim = SimAcp::powered();
        sim.set(map::ACP_WOV_RX_LINEARPOSITIONCNTR_HIGH, 0x2);
        sim.set(map::ACP_WOV_RX_LINEARPOSITIONCNTR_LOW, 0x8000_0010);
        assert_eq!(hw(&sim).linear_position(), 0x2_8000_0010);
    }
}
