//! Fixed capture format, ring-buffer defaults and hardware poll bounds.

// ── Capture format ─────────────────────────────────────────────────────────

/// The only sample rate the PDM decimator produces, in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Number of interleaved channels in the capture stream.
pub const NUM_CHANNELS: u32 = 2;

/// Bits per sample as stored in the ring buffer.
pub const SAMPLE_WIDTH_BITS: u32 = 32;

/// Bytes per interleaved frame (all channels of one sample instant).
pub const FRAME_BYTES: u32 = NUM_CHANNELS * SAMPLE_WIDTH_BITS / 8;

// ── Ring buffer ────────────────────────────────────────────────────────────

/// Default period (interrupt watermark) size in bytes.
pub const PERIOD_BYTES: u32 = 8192;

/// Default number of periods in the ring.
pub const NUM_PERIODS: u32 = 4;

/// Default ring buffer size in bytes.
pub const BUFFER_BYTES: u32 = PERIOD_BYTES * NUM_PERIODS;

/// ATU page size. Every descriptor pair maps exactly one page.
pub const PAGE_BYTES: u32 = 4096;

// ── Poll bounds ────────────────────────────────────────────────────────────

/// Status reads performed while waiting on the power-gate state machine.
pub const POWER_POLL_LIMIT: u32 = 500;

/// Delay between power-gate status reads, in microseconds.
pub const POWER_POLL_DELAY_US: u32 = 1;

/// Status reads performed in each of the two soft-reset phases.
pub const RESET_POLL_LIMIT: u32 = 500;

/// Status reads performed while waiting for the PDM DMA to start or stop.
pub const DMA_POLL_LIMIT: u32 = 20_000;

/// Delay between PDM DMA status reads, in microseconds.
pub const DMA_POLL_DELAY_US: u32 = 5;

// ── PCI identity ───────────────────────────────────────────────────────────

/// AMD PCI vendor ID.
pub const PCI_VENDOR_AMD: u16 = 0x1022;

/// ACP PCI device ID.
pub const PCI_DEVICE_ACP: u16 = 0x15E2;

/// PCI revision of the Renoir ACP, the only supported revision.
pub const REVISION_RENOIR: u8 = 0x01;
