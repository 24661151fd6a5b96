//! PDM DMA interrupt handler.
//!
//! ## Usage
//!
//! ```ignore
//! static POSITION: PositionCounter = PositionCounter::new();
//! static EVENTS: EventQueue = EventQueue::new();
//!
//! // Control path, after building the coordinator:
//! let bridge = coordinator.interrupt_bridge(window);
//!
//! // Interrupt dispatch slot:
//! move || bridge.handle()
//!
//! // Control path, on the work loop:
//! coordinator.service_events();
//! ```

use crate::events::{CaptureEvent, EventQueue};
use crate::position::PositionCounter;
use crate::regs::{map, Registers};

/// Whether an interrupt belonged to this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    None,
    Handled,
}

/// Interrupt-context half of the driver.
///
/// Touches only the interrupt status register, the position counter and the
/// event queue. It never polls, sleeps or allocates, and never races the
/// power, reset or DMA configuration sequences.
pub struct InterruptBridge<'a, R> {
    regs: R,
    position: &'a PositionCounter,
    events: &'a EventQueue,
    periods_per_ring: u64,
}

impl<'a, R: Registers> InterruptBridge<'a, R> {
    /// `periods_per_ring` must be non-zero.
    pub fn new(
        regs: R,
        position: &'a PositionCounter,
        events: &'a EventQueue,
        periods_per_ring: u32,
    ) -> Self {
        InterruptBridge {
            regs,
            position,
            events,
            periods_per_ring: u64::from(periods_per_ring.max(1)),
        }
    }

    /// Acknowledge and account for a pending ACP interrupt.
    ///
    /// A PDM DMA cause is cleared (write-1-to-clear), advances the position
    /// counter by one period and, when that completes the ring, queues a
    /// [`CaptureEvent::RingWrapped`]. The error cause is cleared and queued as
    /// [`CaptureEvent::HardwareError`].
    pub fn handle(&self) -> IrqReturn {
        let status = self.regs.read32(map::ACP_EXTERNAL_INTR_STAT);
        let mut handled = IrqReturn::None;

        if status & map::PDM_DMA_STAT != 0 {
            self.regs.write32(map::PDM_DMA_STAT, map::ACP_EXTERNAL_INTR_STAT);
            let periods = self.position.advance();
            if periods % self.periods_per_ring == 0 {
                self.events.push(CaptureEvent::RingWrapped { periods });
            }
            handled = IrqReturn::Handled;
        }

        if status & map::ACP_ERROR_STAT != 0 {
            self.regs.write32(map::ACP_ERROR_STAT, map::ACP_EXTERNAL_INTR_STAT);
            self.events.push(CaptureEvent::HardwareError { status });
            handled = IrqReturn::Handled;
        }

        handled
    }
}
