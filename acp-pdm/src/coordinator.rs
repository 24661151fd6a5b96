//! Capture coordinator: the audio-engine-facing half of the driver.
//!
//! Owns the capture buffer and drives a [`HardwareControl`] through the
//! start/stop sequences. All methods run on the serialized control path; the
//! only state shared with interrupt context is the [`PositionCounter`] and the
//! [`EventQueue`], both borrowed so they can live in `static`s next to the
//! interrupt handler.

use log::{debug, error, info, warn};

use crate::buffer::{CaptureBuffer, DmaAllocator, DmaRegion, RingGeometry};
use crate::bridge::InterruptBridge;
use crate::constants::{NUM_CHANNELS, SAMPLE_RATE, SAMPLE_WIDTH_BITS};
use crate::error::{Error, Result};
use crate::events::{CaptureEvent, EventQueue};
use crate::hw::{HardwareControl, PowerState};
use crate::position::PositionCounter;
use crate::regs::{map, Registers};

/// Stream direction. The PDM block only captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
}

/// Sample format of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl StreamFormat {
    /// The only format the PDM path produces: 48 kHz, stereo, 32-bit.
    pub const PDM_CAPTURE: StreamFormat = StreamFormat {
        sample_rate: SAMPLE_RATE,
        channels: NUM_CHANNELS as u16,
        bits_per_sample: SAMPLE_WIDTH_BITS as u16,
    };
}

/// What the coordinator tells the audio engine about its stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamDescriptor {
    pub direction: Direction,
    pub format: StreamFormat,
    /// CPU address of the ring buffer.
    pub buffer: *mut u8,
    pub buffer_bytes: u32,
    pub period_bytes: u32,
}

/// Upstream audio engine.
pub trait EngineHost {
    /// Publish the capture stream and its ring buffer.
    fn register_stream(&mut self, stream: &StreamDescriptor) -> Result<()>;

    /// Record a position timestamp. `wrapped` is `false` for the initial
    /// timestamp at start and `true` each time the ring wraps.
    fn take_timestamp(&mut self, wrapped: bool);

    /// The hardware latched an error cause.
    fn hardware_error(&mut self, _status: u32) {}
}

/// Drives capture for one ACP instance.
pub struct CaptureCoordinator<'a, H, B, E> {
    hw: H,
    buffer: CaptureBuffer<B>,
    position: &'a PositionCounter,
    events: &'a EventQueue,
    host: E,
    running: bool,
    /// First timeout seen by `start`/`stop`; blocks `start` until cleared.
    fault: Option<Error>,
}

impl<'a, H, B, E> CaptureCoordinator<'a, H, B, E>
where
    H: HardwareControl,
    B: DmaRegion,
    E: EngineHost,
{
    /// Take ownership of `region`, register the stream with `host` and
    /// program the ATU page table.
    ///
    /// On failure everything passed in is dropped, which releases the DMA
    /// region and whatever the hardware context holds.
    pub fn new(
        hw: H,
        region: B,
        geometry: RingGeometry,
        position: &'a PositionCounter,
        events: &'a EventQueue,
        host: E,
    ) -> Result<Self> {
        let buffer = CaptureBuffer::new(region, geometry)?;
        Self::from_buffer(hw, buffer, position, events, host)
    }

    /// Allocate the ring from `allocator`, then construct as [`new`](Self::new).
    pub fn with_allocator<A>(
        hw: H,
        allocator: &mut A,
        geometry: RingGeometry,
        position: &'a PositionCounter,
        events: &'a EventQueue,
        host: E,
    ) -> Result<Self>
    where
        A: DmaAllocator<Region = B>,
    {
        let buffer = CaptureBuffer::allocate(allocator, geometry).map_err(|e| {
            error!("acp-pdm: failed to allocate {} byte ring", geometry.buffer_bytes());
            e
        })?;
        Self::from_buffer(hw, buffer, position, events, host)
    }

    fn from_buffer(
        mut hw: H,
        buffer: CaptureBuffer<B>,
        position: &'a PositionCounter,
        events: &'a EventQueue,
        mut host: E,
    ) -> Result<Self> {
        let geometry = buffer.geometry();
        let stream = StreamDescriptor {
            direction: Direction::Input,
            format: StreamFormat::PDM_CAPTURE,
            buffer: buffer.region().cpu_ptr(),
            buffer_bytes: geometry.buffer_bytes(),
            period_bytes: geometry.period_bytes(),
        };
        host.register_stream(&stream)?;

        let pages = hw.configure_descriptors(buffer.region())?;
        info!(
            "acp-pdm: capture stream {} bytes in {} periods ({pages} pages)",
            geometry.buffer_bytes(),
            geometry.periods()
        );

        Ok(CaptureCoordinator {
            hw,
            buffer,
            position,
            events,
            host,
            running: false,
            fault: None,
        })
    }

    /// Start capture. Idempotent.
    ///
    /// On failure the hardware is stopped again and the coordinator stays
    /// stopped. After a [`Timeout`](Error::Timeout) from start or stop, every
    /// start returns that error until [`recover`](Self::recover) or
    /// [`shutdown`](Self::shutdown) resets the block.
    pub fn start(&mut self) -> Result<()> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        if self.running {
            return Ok(());
        }

        if let Err(e) = self.bring_up() {
            warn!("acp-pdm: start failed: {e}");
            self.note_fault(e);
            self.hw.disable_interrupts();
            if let Err(stop) = self.hw.stop_capture() {
                error!("acp-pdm: unwind after failed start also failed: {stop}");
                self.note_fault(stop);
            }
            return Err(e);
        }

        self.running = true;
        debug!("acp-pdm: capture started");
        Ok(())
    }

    fn bring_up(&mut self) -> Result<()> {
        if self.hw.power_state() != PowerState::PoweredOn {
            self.hw.power_on()?;
        }

        let geometry = self.buffer.geometry();
        self.hw.configure_descriptors(self.buffer.region())?;
        self.hw.init_ring_buffer(
            map::MEM_WINDOW_START,
            geometry.buffer_bytes(),
            geometry.period_bytes(),
        );
        self.hw.configure_pdm();

        // The PDM interrupt is masked here, so nothing else writes these.
        self.position.reset();
        self.events.clear();
        self.host.take_timestamp(false);

        self.hw.start_capture()?;
        self.hw.enable_interrupts();
        Ok(())
    }

    /// Stop capture. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        self.hw.disable_interrupts();
        let res = self.hw.stop_capture();
        self.running = false;
        match res {
            Ok(()) => debug!("acp-pdm: capture stopped"),
            Err(e) => {
                error!("acp-pdm: stop failed: {e}");
                self.note_fault(e);
            }
        }
        res
    }

    /// Stop capture and detach the hardware ahead of teardown.
    ///
    /// The detach reset runs even when stopping fails. Returns the first
    /// error of the two.
    pub fn shutdown(&mut self) -> Result<()> {
        let stopped = self.stop();
        let detached = self.hw.detach();
        if detached.is_ok() {
            self.fault = None;
        }
        stopped.and(detached)
    }

    /// Soft reset the block after a timeout and allow capture to start again.
    pub fn recover(&mut self) -> Result<()> {
        self.hw.disable_interrupts();
        self.hw.reset()?;
        self.running = false;
        if let Some(fault) = self.fault.take() {
            info!("acp-pdm: recovered from {fault}");
        }
        Ok(())
    }

    /// The timeout currently blocking [`start`](Self::start), if any.
    pub fn fault(&self) -> Option<Error> {
        self.fault
    }

    fn note_fault(&mut self, e: Error) {
        if matches!(e, Error::Timeout(_)) && self.fault.is_none() {
            self.fault = Some(e);
        }
    }

    /// Frame index the DMA has most recently completed, within the ring.
    pub fn current_frame(&self) -> u32 {
        self.buffer.geometry().frame_at(self.position.periods())
    }

    /// Only the fixed capture rate is accepted.
    pub fn on_format_change(&mut self, sample_rate: u32) -> Result<()> {
        if sample_rate != SAMPLE_RATE {
            warn!("acp-pdm: rejecting sample rate {sample_rate}");
            return Err(Error::UnsupportedFormat(sample_rate));
        }
        Ok(())
    }

    /// Deliver everything the interrupt handler queued to the host. Returns
    /// the number of events delivered.
    pub fn service_events(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.events.pop() {
            match event {
                CaptureEvent::RingWrapped { .. } => self.host.take_timestamp(true),
                CaptureEvent::HardwareError { status } => {
                    error!("acp-pdm: hardware error, status {status:#010x}");
                    self.host.hardware_error(status);
                }
            }
            delivered += 1;
        }

        let dropped = self.events.take_dropped();
        if dropped > 0 {
            warn!("acp-pdm: {dropped} capture events lost");
        }
        delivered
    }

    /// Build the interrupt handler for this stream over `regs`.
    pub fn interrupt_bridge<R: Registers>(&self, regs: R) -> InterruptBridge<'a, R> {
        InterruptBridge::new(
            regs,
            self.position,
            self.events,
            self.buffer.geometry().periods(),
        )
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn geometry(&self) -> RingGeometry {
        self.buffer.geometry()
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn host(&self) -> &E {
        &self.host
    }

    /// Consume the coordinator, returning the hardware context, the DMA
    /// region and the host.
    pub fn release(self) -> (H, B, E) {
        (self.hw, self.buffer.into_region(), self.host)
    }
}
