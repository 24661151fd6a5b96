//! Power-gate state machine and soft reset.

use core::hint::spin_loop;

use embedded_hal::delay::DelayNs;
use log::{debug, error};

use super::AcpHardware;
use crate::constants::{POWER_POLL_DELAY_US, POWER_POLL_LIMIT, RESET_POLL_LIMIT};
use crate::error::{Error, Result, Stage};
use crate::regs::{map, poll, Registers};

/// Power-gate state as reported by `ACP_PGFSM_STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Status 0: every power domain is up.
    PoweredOn,
    /// Status 1: a power-on command is in flight.
    PoweringOn,
    /// Status 2: the block is power gated.
    PoweredOff,
    /// Status 3: a power-off command is in flight.
    PoweringOff,
    /// Status bits outside the state field are set.
    Unknown(u32),
}

impl PowerState {
    /// Decode a raw status register value.
    pub fn from_status(status: u32) -> Self {
        if status & !map::ACP_PGFSM_STATUS_MASK != 0 {
            return PowerState::Unknown(status);
        }
        match status {
            map::ACP_POWERED_ON => PowerState::PoweredOn,
            map::ACP_POWER_ON_IN_PROGRESS => PowerState::PoweringOn,
            map::ACP_POWERED_OFF => PowerState::PoweredOff,
            _ => PowerState::PoweringOff,
        }
    }
}

impl<R, D> AcpHardware<R, D>
where
    R: Registers,
    D: DelayNs,
{
    pub fn power_state(&self) -> PowerState {
        PowerState::from_status(self.regs.read32(map::ACP_PGFSM_STATUS))
    }

    /// Power the ACP on.
    ///
    /// Returns at once when the status already reads fully on. The power-on
    /// command is skipped while a power-on is in flight; either way the status
    /// is then polled every microsecond until it reads zero.
    pub fn power_on(&mut self) -> Result<()> {
        let status = self.regs.read32(map::ACP_PGFSM_STATUS);
        if status == map::ACP_POWERED_ON {
            return Ok(());
        }

        if status & map::ACP_PGFSM_STATUS_MASK != map::ACP_POWER_ON_IN_PROGRESS {
            self.regs
                .write32(map::ACP_PGFSM_CNTL_POWER_ON_MASK, map::ACP_PGFSM_CONTROL);
        }

        let delay = &mut self.delay;
        poll(
            &self.regs,
            map::ACP_PGFSM_STATUS,
            POWER_POLL_LIMIT,
            || delay.delay_us(POWER_POLL_DELAY_US),
            |v| v == map::ACP_POWERED_ON,
        )
        .map(|_| debug!("acp-pdm: powered on"))
        .ok_or_else(|| {
            error!("acp-pdm: power on timed out");
            Error::Timeout(Stage::PowerOn)
        })
    }

    /// Power the ACP off and wait for the status to report it.
    pub fn power_off(&mut self) -> Result<()> {
        self.regs
            .write32(map::ACP_PGFSM_CNTL_POWER_OFF_MASK, map::ACP_PGFSM_CONTROL);

        let delay = &mut self.delay;
        poll(
            &self.regs,
            map::ACP_PGFSM_STATUS,
            POWER_POLL_LIMIT,
            || delay.delay_us(POWER_POLL_DELAY_US),
            |v| v & map::ACP_PGFSM_STATUS_MASK == map::ACP_POWERED_OFF,
        )
        .map(|_| debug!("acp-pdm: powered off"))
        .ok_or_else(|| {
            error!("acp-pdm: power off timed out");
            Error::Timeout(Stage::PowerOff)
        })
    }

    /// Soft reset the audio block.
    ///
    /// The reset self-clears in two observable phases: the done bits latch
    /// after assert, and the register reads zero after release. Both are
    /// busy-polled without sleeping.
    pub fn reset(&mut self) -> Result<()> {
        self.regs.write32(1, map::ACP_SOFT_RESET);
        let asserted = poll(
            &self.regs,
            map::ACP_SOFT_RESET,
            RESET_POLL_LIMIT,
            spin_loop,
            |v| v & map::ACP_SOFT_RESET_SOFTRESET_AUDDONE_MASK != 0,
        );

        // Release the reset line even when the assert phase never completed.
        self.regs.write32(0, map::ACP_SOFT_RESET);
        if asserted.is_none() {
            error!("acp-pdm: soft reset never reported done");
            return Err(Error::Timeout(Stage::ResetAssert));
        }

        poll(&self.regs, map::ACP_SOFT_RESET, RESET_POLL_LIMIT, spin_loop, |v| v == 0)
            .map(|_| debug!("acp-pdm: reset complete"))
            .ok_or_else(|| {
                error!("acp-pdm: soft reset never cleared");
                Error::Timeout(Stage::ResetClear)
            })
    }
}
