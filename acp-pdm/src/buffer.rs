//! Capture ring geometry and the DMA memory it lives in.
//!
//! ## Layout
//!
//! ```text
//!  period 0   period 1   period 2   period 3        (watermark = one period)
//! ┌──────────┬──────────┬──────────┬──────────┐
//! │ L R L R… │          │          │          │ ◄── PDM DMA writes, wraps
//! └──────────┴──────────┴──────────┴──────────┘
//!  ▲ MEM_WINDOW_START, translated page by page through the ATU
//! ```

use crate::constants::{BUFFER_BYTES, FRAME_BYTES, PERIOD_BYTES};
use crate::error::{Error, Result};

/// Sizes of the capture ring, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    buffer_bytes: u32,
    period_bytes: u32,
    frame_bytes: u32,
}

impl RingGeometry {
    /// Four 8 KiB periods of 32-bit stereo frames.
    pub const DEFAULT: RingGeometry = RingGeometry {
        buffer_bytes: BUFFER_BYTES,
        period_bytes: PERIOD_BYTES,
        frame_bytes: FRAME_BYTES,
    };

    /// The buffer must be a whole number of periods and a period a whole
    /// number of frames.
    pub fn new(buffer_bytes: u32, period_bytes: u32, frame_bytes: u32) -> Result<Self> {
        if frame_bytes == 0
            || period_bytes == 0
            || buffer_bytes == 0
            || period_bytes % frame_bytes != 0
            || buffer_bytes % period_bytes != 0
        {
            return Err(Error::InvalidGeometry);
        }
        Ok(RingGeometry {
            buffer_bytes,
            period_bytes,
            frame_bytes,
        })
    }

    /// Geometry for `buffer_bytes` / `period_bytes` in the fixed capture format.
    pub fn with_sizes(buffer_bytes: u32, period_bytes: u32) -> Result<Self> {
        Self::new(buffer_bytes, period_bytes, FRAME_BYTES)
    }

    pub fn buffer_bytes(&self) -> u32 {
        self.buffer_bytes
    }

    pub fn period_bytes(&self) -> u32 {
        self.period_bytes
    }

    pub fn frame_bytes(&self) -> u32 {
        self.frame_bytes
    }

    /// Periods per trip around the ring.
    pub fn periods(&self) -> u32 {
        self.buffer_bytes / self.period_bytes
    }

    pub fn period_frames(&self) -> u32 {
        self.period_bytes / self.frame_bytes
    }

    pub fn buffer_frames(&self) -> u32 {
        self.buffer_bytes / self.frame_bytes
    }

    /// Frame index reached after `periods_completed` periods:
    /// `(periods_completed * period_frames) mod buffer_frames`.
    pub fn frame_at(&self, periods_completed: u64) -> u32 {
        // buffer_frames == periods * period_frames, so reducing the period
        // count first gives the same result without overflow.
        let within = (periods_completed % u64::from(self.periods())) as u32;
        within * self.period_frames()
    }
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One physically contiguous piece of a DMA region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Bus/physical address.
    pub addr: u64,
    /// Bytes from `addr` to the end of this contiguous piece.
    pub len: u32,
}

/// DMA-capable memory described as a scatter-gather list.
///
/// Implemented by the platform's buffer type, which releases the memory when
/// dropped.
pub trait DmaRegion {
    /// Total length in bytes.
    fn len(&self) -> u32;

    /// The contiguous piece starting at byte `offset`, or `None` past the end.
    fn segment(&self, offset: u32) -> Option<Segment>;

    /// Kernel virtual address of byte 0.
    fn cpu_ptr(&self) -> *mut u8;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Platform allocator for DMA memory.
pub trait DmaAllocator {
    type Region: DmaRegion;

    /// Allocate `bytes` of device-readable, device-writable memory.
    fn allocate(&mut self, bytes: u32) -> Option<Self::Region>;
}

/// A single physically contiguous allocation.
#[derive(Debug)]
pub struct ContiguousRegion {
    phys: u64,
    cpu: *mut u8,
    len: u32,
}

impl ContiguousRegion {
    pub fn new(phys: u64, cpu: *mut u8, len: u32) -> Self {
        ContiguousRegion { phys, cpu, len }
    }
}

impl DmaRegion for ContiguousRegion {
    fn len(&self) -> u32 {
        self.len
    }

    fn segment(&self, offset: u32) -> Option<Segment> {
        (offset < self.len).then(|| Segment {
            addr: self.phys + u64::from(offset),
            len: self.len - offset,
        })
    }

    fn cpu_ptr(&self) -> *mut u8 {
        self.cpu
    }
}

/// The ring buffer: DMA memory plus the geometry laid over it.
///
/// Owned by the capture coordinator for the life of the driver; dropping it
/// releases the region.
#[derive(Debug)]
pub struct CaptureBuffer<B> {
    region: B,
    geometry: RingGeometry,
}

impl<B: DmaRegion> CaptureBuffer<B> {
    /// Fails with [`Error::AllocationFailure`] if `region` is smaller than
    /// the ring.
    pub fn new(region: B, geometry: RingGeometry) -> Result<Self> {
        if region.len() < geometry.buffer_bytes() {
            return Err(Error::AllocationFailure);
        }
        Ok(CaptureBuffer { region, geometry })
    }

    /// Allocate a region sized for `geometry`.
    pub fn allocate<A>(allocator: &mut A, geometry: RingGeometry) -> Result<Self>
    where
        A: DmaAllocator<Region = B>,
    {
        let region = allocator
            .allocate(geometry.buffer_bytes())
            .ok_or(Error::AllocationFailure)?;
        Self::new(region, geometry)
    }

    pub fn region(&self) -> &B {
        &self.region
    }

    pub fn geometry(&self) -> RingGeometry {
        self.geometry
    }

    pub fn into_region(self) -> B {
        self.region
    }
}
