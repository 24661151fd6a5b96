//! Simulated ACP register file shared by the unit tests.

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::regs::map;
use crate::regs::Registers;

/// Register file that logs every access and reacts to the commands the
/// driver issues: power-gate, soft reset, PDM DMA enable/disable and
/// write-1-to-clear interrupt status.
///
/// The `hold_*` switches freeze the corresponding state machine so poll
/// loops run out of iterations.
#[derive(Default)]
pub struct SimAcp {
    regs: RefCell<BTreeMap<u32, u32>>,
    reads: RefCell<BTreeMap<u32, u32>>,
    log: RefCell<Vec<(u32, u32)>>,
    pub hold_power: Cell<bool>,
    pub hold_reset: Cell<bool>,
    pub hold_reset_clear: Cell<bool>,
    pub hold_dma: Cell<bool>,
}

impl SimAcp {
    /// A powered-off ACP.
    pub fn new() -> Self {
        let sim = SimAcp::default();
        sim.set(map::ACP_PGFSM_STATUS, map::ACP_POWERED_OFF);
        sim
    }

    /// An ACP whose power gate already reports fully on.
    pub fn powered() -> Self {
        let sim = SimAcp::default();
        sim.set(map::ACP_PGFSM_STATUS, map::ACP_POWERED_ON);
        sim
    }

    /// Current value without counting a read.
    pub fn get(&self, reg: u32) -> u32 {
        self.regs.borrow().get(&reg).copied().unwrap_or(0)
    }

    /// Force a value without logging a write or running side effects.
    pub fn set(&self, reg: u32, value: u32) {
        self.regs.borrow_mut().insert(reg, value);
    }

    /// Latch interrupt status bits as the hardware would.
    pub fn raise(&self, bits: u32) {
        let stat = self.get(map::ACP_EXTERNAL_INTR_STAT);
        self.set(map::ACP_EXTERNAL_INTR_STAT, stat | bits);
    }

    pub fn reads_of(&self, reg: u32) -> u32 {
        self.reads.borrow().get(&reg).copied().unwrap_or(0)
    }

    /// Every write in order, as `(register, value)`.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.log.borrow().clone()
    }

    /// Values written to one register, in order.
    pub fn writes_to(&self, reg: u32) -> Vec<u32> {
        self.log
            .borrow()
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Position of the first write to `reg` in the log.
    pub fn first_write(&self, reg: u32) -> Option<usize> {
        self.log.borrow().iter().position(|(r, _)| *r == reg)
    }

    /// Position of the last write to `reg` in the log.
    pub fn last_write(&self, reg: u32) -> Option<usize> {
        self.log.borrow().iter().rposition(|(r, _)| *r == reg)
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
        self.reads.borrow_mut().clear();
    }
}

impl Registers for SimAcp {
    fn read32(&self, reg: u32) -> u32 {
        *self.reads.borrow_mut().entry(reg).or_insert(0) += 1;
        self.get(reg)
    }

    fn write32(&self, value: u32, reg: u32) {
        self.log.borrow_mut().push((reg, value));
        match reg {
            map::ACP_PGFSM_CONTROL => {
                if self.hold_power.get() {
                    return;
                }
                let status = if value == map::ACP_PGFSM_CNTL_POWER_ON_MASK {
                    map::ACP_POWERED_ON
                } else {
                    map::ACP_POWERED_OFF
                };
                self.set(map::ACP_PGFSM_STATUS, status);
            }
            map::ACP_SOFT_RESET => {
                let next = match value {
                    1 if !self.hold_reset.get() => map::ACP_SOFT_RESET_SOFTRESET_AUDDONE_MASK,
                    1 => 0,
                    _ if self.hold_reset_clear.get() => self.get(reg),
                    _ => 0,
                };
                self.set(reg, next);
            }
            map::ACP_WOV_PDM_DMA_ENABLE => {
                if self.hold_dma.get() {
                    return;
                }
                let next = if value == map::ACP_PDM_DMA_EN {
                    map::ACP_PDM_DMA_EN | map::ACP_PDM_DMA_EN_STATUS
                } else {
                    0
                };
                self.set(reg, next);
            }
            map::ACP_EXTERNAL_INTR_STAT => {
                let stat = self.get(reg);
                self.set(reg, stat & !value);
            }
            _ => self.set(reg, value),
        }
    }
}

/// Delay provider that only accumulates the requested time.
#[derive(Debug, Default)]
pub struct CountingDelay {
    pub total_ns: u64,
    pub calls: u32,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}
