//! Register access for the ACP BAR0 window.
//!
//! Everything above this module talks to hardware through the [`Registers`]
//! trait, addressed by the physical register addresses in [`map`]. On real
//! hardware that is an [`MmioWindow`]; tests substitute a simulated register
//! file.

pub mod map;
mod mmio;

pub use mmio::MmioWindow;

/// 32-bit register access by physical register address.
///
/// Accesses take `&self` because the registers reflect live device state, not
/// memory owned by the caller; the interrupt path and the control path share
/// one window. Implementations must not cache or reorder accesses.
pub trait Registers {
    /// Read the register at `reg`.
    fn read32(&self, reg: u32) -> u32;

    /// Write `value` to the register at `reg`.
    fn write32(&self, value: u32, reg: u32);

    /// Read-modify-write: `new = (current & !clear) | set`.
    fn modify32(&self, reg: u32, set: u32, clear: u32) -> u32 {
        let value = (self.read32(reg) & !clear) | set;
        self.write32(value, reg);
        value
    }
}

impl<T: Registers + ?Sized> Registers for &T {
    fn read32(&self, reg: u32) -> u32 {
        (**self).read32(reg)
    }

    fn write32(&self, value: u32, reg: u32) {
        (**self).write32(value, reg)
    }
}

/// Read `reg` up to `limit` times until `done` accepts the value.
///
/// `between` runs after every rejected read. Returns the accepted value, or
/// `None` once exactly `limit` reads have been rejected.
pub fn poll<R, F, W>(regs: &R, reg: u32, limit: u32, mut between: W, done: F) -> Option<u32>
where
    R: Registers + ?Sized,
    F: Fn(u32) -> bool,
    W: FnMut(),
{
    for _ in 0..limit {
        let value = regs.read32(reg);
        if done(value) {
            return Some(value);
        }
        between();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimAcp;

    #[test]
    fn modify_preserves_unmasked_bits() {
        let sim = SimAcp::new();
        sim.set(map::ACP_WOV_MISC_CTRL, 0x0103);
        let v = sim.modify32(map::ACP_WOV_MISC_CTRL, 0x10, 0x01);
        assert_eq!(v, 0x0112);
        assert_eq!(sim.get(map::ACP_WOV_MISC_CTRL), 0x0112);
    }

    #[test]
    fn poll_returns_first_accepted_value() {
        let sim = SimAcp::new();
        sim.set(map::ACP_WOV_BUFFER_STATUS, 7);
        let mut waits = 0;
        let v = poll(&sim, map::ACP_WOV_BUFFER_STATUS, 10, || waits += 1, |v| v == 7);
        assert_eq!(v, Some(7));
        assert_eq!(waits, 0);
        assert_eq!(sim.reads_of(map::ACP_WOV_BUFFER_STATUS), 1);
    }

    #[test]
    fn poll_gives_up_after_exactly_limit_reads() {
        let sim = SimAcp::new();
        let mut waits = 0;
        let v = poll(&sim, map::ACP_WOV_BUFFER_STATUS, 37, || waits += 1, |v| v != 0);
        assert_eq!(v, None);
        assert_eq!(waits, 37);
        assert_eq!(sim.reads_of(map::ACP_WOV_BUFFER_STATUS), 37);
    }

    #[test]
    fn reference_forwards_to_target() {
        let sim = SimAcp::new();
        let r = &sim;
        r.write32(0xAB, map::ACP_CONTROL);
        assert_eq!(Registers::read32(&r, map::ACP_CONTROL), 0xAB);
    }
}
