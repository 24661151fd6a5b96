use core::ptr::{self, NonNull};

use super::map::{ACP_PHY_BASE_ADDRESS, ACP_REG_END};
use super::Registers;

/// Mapped BAR0 window of the ACP.
///
/// Translates a physical register address into `base + (reg - ACP_PHY_BASE_ADDRESS)`
/// and performs volatile 32-bit accesses there. The mapping itself belongs to the
/// platform; this is a borrowed view and is `Copy` so the interrupt handler can
/// hold its own.
#[derive(Debug, Clone, Copy)]
pub struct MmioWindow {
    base: NonNull<u32>,
}

// SAFETY: The window points at device registers, not at Rust-owned memory.
// Every access is a single volatile 32-bit load or store, which the device
// serializes; sharing the pointer between contexts cannot cause a data race
// in the Rust memory model sense.
unsafe impl Send for MmioWindow {}
unsafe impl Sync for MmioWindow {}

impl MmioWindow {
    /// Length of the window in bytes.
    pub const LEN: usize = (ACP_REG_END - ACP_PHY_BASE_ADDRESS) as usize;

    /// Wrap a mapped BAR0 virtual address.
    ///
    /// Returns `None` for a null or misaligned base.
    ///
    /// # Safety
    ///
    /// `base` must be the virtual address of an uncached mapping of at least
    /// [`Self::LEN`] bytes of ACP BAR0, and the mapping must outlive every copy
    /// of the returned window.
    pub unsafe fn new(base: *mut u8) -> Option<Self> {
        if base as usize % 4 != 0 {
            return None;
        }
        NonNull::new(base.cast::<u32>()).map(|base| MmioWindow { base })
    }

    fn slot(&self, reg: u32) -> *mut u32 {
        debug_assert!(
            (ACP_PHY_BASE_ADDRESS..ACP_REG_END).contains(&reg) && reg % 4 == 0,
            "register {reg:#x} outside the ACP window"
        );
        let word = ((reg - ACP_PHY_BASE_ADDRESS) / 4) as usize;
        // SAFETY: `new` guarantees LEN bytes are mapped and `reg` lies inside them.
        unsafe { self.base.as_ptr().add(word) }
    }
}

impl Registers for MmioWindow {
    fn read32(&self, reg: u32) -> u32 {
        // SAFETY: see `slot`; device registers must be read with a volatile load.
        unsafe { ptr::read_volatile(self.slot(reg)) }
    }

    fn write32(&self, value: u32, reg: u32) {
        // SAFETY: see `slot`; device registers must be written with a volatile store.
        unsafe { ptr::write_volatile(self.slot(reg), value) }
    }
}
