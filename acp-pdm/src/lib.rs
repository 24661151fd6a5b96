//! # acp-pdm
//!
//! A `no_std` driver core for the digital microphone (PDM) capture path of the
//! AMD Audio Co-Processor (ACP) on Renoir APUs. It brings the block out of
//! power gating and reset, maps a capture ring through the ACP address
//! translation unit, runs the PDM DMA engine and turns its period interrupts
//! into a sample position for an upstream audio engine.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Registers | [`regs`] | Volatile 32-bit access, bounded polling, register map |
//! | Hardware | [`hw`] | Power sequencing, ATU page table, PDM/DMA control |
//! | Memory | [`buffer`] | Ring geometry and DMA region ownership |
//! | Interrupt | [`bridge`] / [`position`] / [`events`] | ISR, shared period counter, event channel |
//! | Engine | [`coordinator`] | Start/stop, position reporting, upstream host |
//! | Samples | [`convert`] | 32-bit PCM to `f32` with gain (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use acp_pdm::*;
//!
//! static POSITION: PositionCounter = PositionCounter::new();
//! static EVENTS: EventQueue = EventQueue::new();
//!
//! let window = unsafe { MmioWindow::new(bar0) }.ok_or(Error::AllocationFailure)?;
//! let hw = AcpHardware::attach(window, delay, pci_revision)?;
//! let mut capture = CaptureCoordinator::with_allocator(
//!     hw, &mut dma, RingGeometry::DEFAULT, &POSITION, &EVENTS, engine,
//! )?;
//! let bridge = capture.interrupt_bridge(window);
//! // Register `move || bridge.handle()` with the platform interrupt.
//!
//! capture.start()?;
//! loop {
//!     capture.service_events();
//!     let frame = capture.current_frame();
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `convert` | yes | Sample conversion and gain (requires `libm`) |
//!
//! ## Capture format
//!
//! - **Sample rate:** 48 000 Hz ([`constants::SAMPLE_RATE`])
//! - **Channels:** 2, interleaved
//! - **Sample format:** `i32` (signed 32-bit)
//! - **Ring:** 4 periods of 8 KiB ([`RingGeometry::DEFAULT`])

#![no_std]

pub mod constants;
pub mod error;
pub mod regs;
pub mod hw;
pub mod buffer;
pub mod position;
pub mod events;
pub mod bridge;
pub mod coordinator;

#[cfg(feature = "convert")]
pub mod convert;

#[cfg(test)]
mod testing;


pub use bridge::{InterruptBridge, IrqReturn};
pub use buffer::{CaptureBuffer, ContiguousRegion, DmaAllocator, DmaRegion, RingGeometry, Segment};
pub use coordinator::{CaptureCoordinator, Direction, EngineHost, StreamDescriptor, StreamFormat};
pub use error::{Error, Result, Stage};
pub use events::{CaptureEvent, EventQueue};
pub use hw::{AcpHardware, CaptureState, HardwareControl, PowerState};
pub use position::PositionCounter;
pub use regs::{MmioWindow, Registers};
