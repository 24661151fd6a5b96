//! Renoir ACP register addresses and bitfield definitions.
//!
//! Addresses are physical, as listed in the Renoir ACP register map. The PCI
//! BAR0 window starts at [`ACP_PHY_BASE_ADDRESS`]; accessors subtract it to
//! get the offset into the mapping. All registers are 32 bits wide.

// Some registers are defined for completeness (VAD, error status, etc.)
// but are not yet used by the driver.
#![allow(dead_code)]

/// Physical address that BAR0 offset 0 corresponds to.
pub const ACP_PHY_BASE_ADDRESS: u32 = 0x0124_0000;

/// Last register address covered by BAR0 (exclusive).
pub const ACP_REG_END: u32 = 0x0125_0200;

// ── Address translation unit ───────────────────────────────────────────────

/// ATU group 1 page size.
/// - Bits 2:0 — page size select (2 = 4 KiB)
pub const ACP_AXI2AXI_ATU_PAGE_SIZE_GRP_1: u32 = 0x0124_0C00;

/// ATU group 1 page-table base.
/// - Bit  31   — group enable
/// - Bits 30:0 — SRAM offset of the page table
pub const ACP_AXI2AXI_ATU_BASE_ADDR_GRP_1: u32 = 0x0124_0C04;

/// ATU control.
/// - Bit 0 — translation enable
pub const ACP_AXI2AXI_ATU_CTRL: u32 = 0x0124_0C40;

// ── Global control ─────────────────────────────────────────────────────────

/// Soft reset.
/// - Bit 16 — SOFTRESET_AUDDONE
/// - Bit  0 — SOFTRESET_AUD
pub const ACP_SOFT_RESET: u32 = 0x0124_1000;

/// ACP global control.
/// - Bit 0 — ACP enable
pub const ACP_CONTROL: u32 = 0x0124_1004;

/// Power-gate FSM command.
pub const ACP_PGFSM_CONTROL: u32 = 0x0124_101C;

/// Power-gate FSM status.
/// - Bits 1:0 — 0=on, 1=powering on, 2=off, 3=powering off
pub const ACP_PGFSM_STATUS: u32 = 0x0124_1020;

/// Audio clock mux select (0 = off, 3 = 48 MHz audio clock).
pub const ACP_CLKMUX_SEL: u32 = 0x0124_1024;

// ── External interrupts ────────────────────────────────────────────────────

/// External interrupt enable.
/// - Bit 0 — global enable
pub const ACP_EXTERNAL_INTR_ENB: u32 = 0x0124_1800;

/// External interrupt cause mask.
/// - Bit 16 — PDM DMA
pub const ACP_EXTERNAL_INTR_CNTL: u32 = 0x0124_1804;

/// External interrupt status (write-1-to-clear).
/// - Bit 29 — ACP error
/// - Bit  4 — PDM DMA watermark reached
pub const ACP_EXTERNAL_INTR_STAT: u32 = 0x0124_1808;

// ── Wake-on-voice / PDM block ──────────────────────────────────────────────

/// PDM decimator enable.
/// - Bit 0 — enable
pub const ACP_WOV_PDM_ENABLE: u32 = 0x0124_2C04;

/// PDM DMA enable.
/// - Bit 1 — DMA_EN_STATUS (read-only)
/// - Bit 0 — DMA_EN (write 0b10 to request disable)
pub const ACP_WOV_PDM_DMA_ENABLE: u32 = 0x0124_2C08;

/// Ring buffer base, as seen through the ATU window.
pub const ACP_WOV_RX_RINGBUFADDR: u32 = 0x0124_2C0C;

/// Ring buffer size in bytes.
pub const ACP_WOV_RX_RINGBUFSIZE: u32 = 0x0124_2C10;

/// Byte position inside the ring (wraps).
pub const ACP_WOV_RX_LINKPOSITIONCNTR: u32 = 0x0124_2C14;

/// Linear byte position, high word.
pub const ACP_WOV_RX_LINEARPOSITIONCNTR_HIGH: u32 = 0x0124_2C18;

/// Linear byte position, low word.
pub const ACP_WOV_RX_LINEARPOSITIONCNTR_LOW: u32 = 0x0124_2C1C;

/// Bytes between PDM DMA interrupts (the period size).
pub const ACP_WOV_RX_INTR_WATERMARK_SIZE: u32 = 0x0124_2C20;

/// PDM FIFO flush (write 1).
pub const ACP_WOV_PDM_FIFO_FLUSH: u32 = 0x0124_2C24;

/// Number of PDM channels.
pub const ACP_WOV_PDM_NO_OF_CHANNELS: u32 = 0x0124_2C28;

/// PDM decimation factor.
pub const ACP_WOV_PDM_DECIMATION_FACTOR: u32 = 0x0124_2C2C;

/// Voice activity detection control.
pub const ACP_WOV_PDM_VAD_CTRL: u32 = 0x0124_2C30;

/// Buffer status.
pub const ACP_WOV_BUFFER_STATUS: u32 = 0x0124_2C58;

/// PDM miscellaneous control.
/// - Bit 4 — PDM clock gate enable
pub const ACP_WOV_MISC_CTRL: u32 = 0x0124_2C5C;

/// PDM clock control.
/// - Bits 2:0 — clock frequency select
pub const ACP_WOV_CLK_CTRL: u32 = 0x0124_2C60;

/// Dynamic clock gating for VAD.
pub const ACP_PDM_VAD_DYNAMIC_CLK_GATING_EN: u32 = 0x0124_2C64;

/// PDM error status.
pub const ACP_WOV_ERROR_STATUS_REGISTER: u32 = 0x0124_2C68;

// ── Scratch ────────────────────────────────────────────────────────────────

/// First scratch register. The ATU page table lives here as
/// `(low, high | VALID)` pairs, 8 bytes per page.
pub const ACP_SCRATCH_REG_0: u32 = 0x0125_0000;

/// Descriptor pairs that fit between [`ACP_SCRATCH_REG_0`] and [`ACP_REG_END`].
pub const SCRATCH_DESCRIPTOR_PAIRS: u32 = (ACP_REG_END - ACP_SCRATCH_REG_0) / 8;

// ── Field values ───────────────────────────────────────────────────────────

/// SRAM offset of the ATU page table (the scratch registers).
pub const ACP_SRAM_PTE_OFFSET: u32 = 0x0205_0000;

/// ATU page-size select value for 4 KiB pages.
pub const ACP_PAGE_SIZE_4K_ENABLE: u32 = 0x2;

/// Base of the device-visible window translated by the ATU.
pub const MEM_WINDOW_START: u32 = 0x0400_0000;

/// Group-enable and descriptor valid tag.
pub const ATU_VALID: u32 = 1 << 31;

pub const ACP_PGFSM_CNTL_POWER_ON_MASK: u32 = 0xFFFF_FFFF;
pub const ACP_PGFSM_CNTL_POWER_OFF_MASK: u32 = 0x0000_0000;
pub const ACP_PGFSM_STATUS_MASK: u32 = 0x03;

pub const ACP_POWERED_ON: u32 = 0x00;
pub const ACP_POWER_ON_IN_PROGRESS: u32 = 0x01;
pub const ACP_POWERED_OFF: u32 = 0x02;
pub const ACP_POWER_OFF_IN_PROGRESS: u32 = 0x03;

pub const ACP_SOFT_RESET_SOFTRESET_AUDDONE_MASK: u32 = 0x0001_0001;

pub const ACP_CLKMUX_SEL_AUDIO: u32 = 0x3;

pub const ACP_EXT_INTR_STAT_CLEAR_MASK: u32 = 0xFFFF_FFFF;
pub const ACP_ERROR_STAT: u32 = 1 << 29;
pub const PDM_DMA_STAT: u32 = 1 << 4;
pub const PDM_DMA_INTR_MASK: u32 = 1 << 16;

pub const ACP_PDM_CLK_FREQ_MASK: u32 = 0x07;
pub const ACP_WOV_MISC_CTRL_MASK: u32 = 0x10;

pub const ACP_PDM_ENABLE: u32 = 0x01;
pub const ACP_PDM_DISABLE: u32 = 0x00;

pub const ACP_PDM_DMA_EN: u32 = 0x01;
pub const ACP_PDM_DMA_EN_STATUS: u32 = 0x02;
pub const ACP_PDM_DMA_DISABLE_REQ: u32 = 0x02;

pub const PDM_DECIMATION_FACTOR: u32 = 0x2;
