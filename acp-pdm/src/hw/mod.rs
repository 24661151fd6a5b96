//! Register-level control of the ACP PDM block.
//!
//! [`AcpHardware`] is the device context: it owns the register window and the
//! delay provider, and carries the capture state machine. Its operations are
//! split by concern:
//!
//! | File | Operations |
//! |------|------------|
//! | `power.rs` | power-gate on/off, two-phase soft reset |
//! | `dma.rs` | ATU page table in scratch registers, ring buffer registers |
//! | `capture.rs` | PDM clock, PDM/DMA enable and disable, interrupt mask |
//!
//! The [`HardwareControl`] trait exposes exactly these operations so the
//! [`CaptureCoordinator`](crate::coordinator::CaptureCoordinator) can be
//! driven against a test double.

mod capture;
mod dma;
mod power;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::buffer::DmaRegion;
use crate::constants::{PCI_DEVICE_ACP, PCI_VENDOR_AMD, REVISION_RENOIR};
use crate::error::{Error, Result};
use crate::regs::map;
use crate::regs::Registers;

pub use capture::CaptureState;
pub use power::PowerState;

/// Operations the capture coordinator needs from the hardware.
pub trait HardwareControl {
    /// Decode the power-gate status register.
    fn power_state(&self) -> PowerState;

    /// Bring the power gate fully on. Returns immediately if already on.
    fn power_on(&mut self) -> Result<()>;

    /// Power the block off.
    fn power_off(&mut self) -> Result<()>;

    /// Assert and release the soft reset, observing both phases.
    fn reset(&mut self) -> Result<()>;

    /// Program the ATU page table for `region`. Returns the number of
    /// descriptor pairs written.
    fn configure_descriptors(&mut self, region: &dyn DmaRegion) -> Result<u32>;

    /// Program ring buffer base, size and watermark, then enable the ATU.
    fn init_ring_buffer(&mut self, addr: u32, buffer_bytes: u32, watermark_bytes: u32);

    /// Program PDM channel count and decimation.
    fn configure_pdm(&mut self);

    /// Enable the PDM clock.
    fn enable_clock(&mut self);

    /// Start PDM sampling and DMA. No-op when already running.
    fn start_capture(&mut self) -> Result<()>;

    /// Stop DMA, then PDM sampling, then flush the FIFO. No-op when idle.
    fn stop_capture(&mut self) -> Result<()>;

    /// Unmask the PDM DMA interrupt.
    fn enable_interrupts(&mut self);

    /// Mask the PDM DMA interrupt and clear latched status.
    fn disable_interrupts(&mut self);

    /// Where the start/stop state machine currently is.
    fn capture_state(&self) -> CaptureState;

    /// PDM enabled and DMA reporting enabled.
    fn is_dma_running(&self) -> bool;

    /// Bytes the DMA engine has written since it was started.
    fn linear_position(&self) -> u64;

    /// Reset the block and gate its clocks ahead of driver teardown.
    fn detach(&mut self) -> Result<()>;
}

/// Check the PCI identity of a candidate function.
pub fn probe(vendor: u16, device: u16, revision: u8) -> Result<()> {
    if vendor != PCI_VENDOR_AMD || device != PCI_DEVICE_ACP || revision != REVISION_RENOIR {
        warn!("acp-pdm: only Renoir is supported (rev {revision:#04x})");
        return Err(Error::UnsupportedRevision(revision));
    }
    info!("acp-pdm: AMD digital microphone for Renoir");
    Ok(())
}

/// Device context for one ACP instance.
///
/// Generic over the register window and an [`embedded_hal::delay::DelayNs`]
/// provider used between status polls.
pub struct AcpHardware<R, D> {
    regs: R,
    delay: D,
    capture: CaptureState,
}

impl<R, D> AcpHardware<R, D>
where
    R: Registers,
    D: DelayNs,
{
    /// Wrap a register window without touching the hardware.
    pub fn new(regs: R, delay: D) -> Self {
        AcpHardware {
            regs,
            delay,
            capture: CaptureState::Idle,
        }
    }

    /// Bring the ACP up: power on, enable, reset, select the audio clock.
    ///
    /// On failure the window and delay are dropped, releasing whatever the
    /// platform attached to them.
    pub fn attach(regs: R, delay: D, revision: u8) -> Result<Self> {
        probe(PCI_VENDOR_AMD, PCI_DEVICE_ACP, revision)?;

        let mut hw = Self::new(regs, delay);
        hw.power_on()?;
        hw.regs.write32(0x1, map::ACP_CONTROL);
        hw.reset()?;
        hw.regs.write32(map::ACP_CLKMUX_SEL_AUDIO, map::ACP_CLKMUX_SEL);
        info!("acp-pdm: hardware initialized");
        Ok(hw)
    }

    /// Reset the block, gate the audio clock and disable the ACP.
    pub fn shutdown(&mut self) -> Result<()> {
        self.reset()?;
        self.regs.write32(0x0, map::ACP_CLKMUX_SEL);
        self.regs.write32(0x0, map::ACP_CONTROL);
        self.capture = CaptureState::Idle;
        info!("acp-pdm: hardware shut down");
        Ok(())
    }

    /// Shared access to the register window.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Consume the context and return the window and delay.
    pub fn release(self) -> (R, D) {
        (self.regs, self.delay)
    }
}

impl<R, D> HardwareControl for AcpHardware<R, D>
where
    R: Registers,
    D: DelayNs,
{
    fn power_state(&self) -> PowerState {
        AcpHardware::power_state(self)
    }

    fn power_on(&mut self) -> Result<()> {
        AcpHardware::power_on(self)
    }

    fn power_off(&mut self) -> Result<()> {
        AcpHardware::power_off(self)
    }

    fn reset(&mut self) -> Result<()> {
        AcpHardware::reset(self)
    }

    fn configure_descriptors(&mut self, region: &dyn DmaRegion) -> Result<u32> {
        AcpHardware::configure_descriptors(self, region)
    }

    fn init_ring_buffer(&mut self, addr: u32, buffer_bytes: u32, watermark_bytes: u32) {
        AcpHardware::init_ring_buffer(self, addr, buffer_bytes, watermark_bytes)
    }

    fn configure_pdm(&mut self) {
        AcpHardware::configure_pdm(self)
    }

    fn enable_clock(&mut self) {
        AcpHardware::enable_clock(self)
    }

    fn start_capture(&mut self) -> Result<()> {
        AcpHardware::start_capture(self)
    }

    fn stop_capture(&mut self) -> Result<()> {
        AcpHardware::stop_capture(self)
    }

    fn enable_interrupts(&mut self) {
        AcpHardware::enable_interrupts(self)
    }

    fn disable_interrupts(&mut self) {
        AcpHardware::disable_interrupts(self)
    }

    fn capture_state(&self) -> CaptureState {
        self.capture
    }

    fn is_dma_running(&self) -> bool {
        AcpHardware::is_dma_running(self)
    }

    fn linear_position(&self) -> u64 {
        AcpHardware::linear_position(self)
    }

    fn detach(&mut self) -> Result<()> {
        self.shutdown()
    }
}
