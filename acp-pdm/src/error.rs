//! Driver error type.

use core::fmt;

/// Hardware wait that ran out of iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Power-gate never reported fully on.
    PowerOn,
    /// Power-gate never reported powered off.
    PowerOff,
    /// Soft reset never reported the reset-done bits.
    ResetAssert,
    /// Soft reset register never cleared after de-assert.
    ResetClear,
    /// PDM DMA never reported enabled.
    DmaEnable,
    /// PDM DMA never reported disabled.
    DmaDisable,
}

/// Errors returned by the ACP PDM driver.
///
/// A [`Timeout`](Error::Timeout) leaves the hardware in an indeterminate
/// state; the only recovery is a full reset (detach and attach again).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bounded hardware poll ran out of iterations.
    Timeout(Stage),
    /// The PCI function is not a Renoir ACP.
    UnsupportedRevision(u8),
    /// Only 48 kHz capture is supported.
    UnsupportedFormat(u32),
    /// DMA buffer or descriptor memory was unavailable.
    AllocationFailure,
    /// Ring geometry is not a whole number of frames and periods.
    InvalidGeometry,
    /// A scatter-gather segment is empty or not page aligned.
    InvalidSegment {
        /// Byte offset into the region where the bad segment starts.
        offset: u32,
    },
    /// The region needs more descriptor pairs than the scratch space holds.
    TooManySegments,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::PowerOn => "power on",
            Stage::PowerOff => "power off",
            Stage::ResetAssert => "reset assert",
            Stage::ResetClear => "reset clear",
            Stage::DmaEnable => "PDM DMA enable",
            Stage::DmaDisable => "PDM DMA disable",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout(stage) => write!(f, "timed out waiting for {stage}"),
            Error::UnsupportedRevision(rev) => {
                write!(f, "unsupported ACP revision {rev:#04x} (only Renoir)")
            }
            Error::UnsupportedFormat(rate) => write!(f, "unsupported sample rate {rate} Hz"),
            Error::AllocationFailure => f.write_str("DMA memory allocation failed"),
            Error::InvalidGeometry => f.write_str("invalid ring buffer geometry"),
            Error::InvalidSegment { offset } => {
                write!(f, "invalid DMA segment at offset {offset:#x}")
            }
            Error::TooManySegments => f.write_str("DMA region exceeds descriptor scratch space"),
        }
    }
}
