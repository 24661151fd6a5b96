//! Interrupt-to-control-path event channel.
//!
//! The interrupt bridge may not block, allocate or call back into the audio
//! framework. It pushes a [`CaptureEvent`] here instead, and the capture
//! coordinator drains the queue on the control path.
//!
//! # Contract
//!
//! - Only the interrupt handler calls [`push()`](EventQueue::push).
//! - Only the control path calls [`pop()`](EventQueue::pop) and
//!   [`clear()`](EventQueue::clear).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Slots in an [`EventQueue`]; one is kept empty to tell full from empty.
pub const EVENT_SLOTS: usize = 16;

/// Something the interrupt handler observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The DMA finished the last period of the ring; `periods` is the
    /// running total at that moment.
    RingWrapped { periods: u64 },
    /// The ACP latched its error cause; `status` is the raw interrupt status.
    HardwareError { status: u32 },
}

/// Bounded lock-free single-producer single-consumer queue of
/// [`CaptureEvent`]s (Lamport ring).
///
/// A push onto a full queue drops the event and counts it instead of
/// waiting.
pub struct EventQueue {
    slots: [UnsafeCell<CaptureEvent>; EVENT_SLOTS],
    /// Next slot to write (producer only).
    head: AtomicUsize,
    /// Next slot to read (consumer only).
    tail: AtomicUsize,
    dropped: AtomicU32,
}

// SAFETY: head is only stored by the producer and tail only by the consumer.
// A slot is written strictly before the Release store of head that publishes
// it, and read strictly before the Release store of tail that frees it, so the
// two sides never touch the same slot at the same time.
unsafe impl Sync for EventQueue {}

impl EventQueue {
    pub const fn new() -> Self {
        EventQueue {
            slots: [const { UnsafeCell::new(CaptureEvent::RingWrapped { periods: 0 }) };
                EVENT_SLOTS],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue an event (producer side). Returns `false` and counts a drop when
    /// the queue is full.
    pub fn push(&self, event: CaptureEvent) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % EVENT_SLOTS;

        if next == self.tail.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: sole producer; `next != tail` means the consumer is not
        // reading this slot.
        unsafe {
            *self.slots[head].get() = event;
        }
        self.head.store(next, Ordering::Release);
        true
    }

    /// Take the oldest event (consumer side).
    pub fn pop(&self) -> Option<CaptureEvent> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: sole consumer; `tail != head` means the producer published
        // this slot and will not write it until tail moves past.
        let event = unsafe { *self.slots[tail].get() };
        self.tail.store((tail + 1) % EVENT_SLOTS, Ordering::Release);
        Some(event)
    }

    /// Discard queued events and the drop count (consumer side).
    pub fn clear(&self) {
        while self.pop().is_some() {}
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + EVENT_SLOTS - tail) % EVENT_SLOTS
    }

    /// Return and reset the number of events dropped on a full queue.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::thread;

    fn wrap(periods: u64) -> CaptureEvent {
        CaptureEvent::RingWrapped { periods }
    }

    #[test]
    fn fifo_order() {
        let q = EventQueue::new();
        assert!(q.is_empty());
        assert!(q.push(wrap(4)));
        assert!(q.push(CaptureEvent::HardwareError { status: 1 << 29 }));
        assert_eq!(q.len(), 2);

        assert_eq!(q.pop(), Some(wrap(4)));
        assert_eq!(q.pop(), Some(CaptureEvent::HardwareError { status: 1 << 29 }));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn full_queue_counts_drops() {
        let q = EventQueue::new();
        for n in 0..(EVENT_SLOTS as u64 - 1) {
            assert!(q.push(wrap(n)));
        }
        assert!(!q.push(wrap(99)));
        assert!(!q.push(wrap(100)));
        assert_eq!(q.take_dropped(), 2);
        assert_eq!(q.take_dropped(), 0);

        // Oldest events survive the overflow.
        assert_eq!(q.pop(), Some(wrap(0)));
    }

    #[test]
    fn wraparound_keeps_order() {
        let q = EventQueue::new();
        for round in 0..5u64 {
            for n in 0..10 {
                assert!(q.push(wrap(round * 100 + n)));
            }
            for n in 0..10 {
                assert_eq!(q.pop(), Some(wrap(round * 100 + n)));
            }
        }
        assert!(q.is_empty());
    }

    #[test]
    fn clear_empties_and_resets_drops() {
        let q = EventQueue::new();
        for n in 0..EVENT_SLOTS as u64 {
            q.push(wrap(n));
        }
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.take_dropped(), 0);
    }

    #[test]
    fn producer_and_consumer_on_separate_threads() {
        static QUEUE: EventQueue = EventQueue::new();
        const COUNT: u64 = 50_000;

        thread::scope(|s| {
            s.spawn(|| {
                let mut n = 0;
                while n < COUNT {
                    if QUEUE.push(wrap(n)) {
                        n += 1;
                    }
                }
            });
            s.spawn(|| {
                let mut expected = 0;
                while expected < COUNT {
                    if let Some(ev) = QUEUE.pop() {
                        assert_eq!(ev, wrap(expected));
                        expected += 1;
                    }
                }
            });
        });

        // Failed pushes were retried, so the counter only saw transient drops.
        QUEUE.take_dropped();
        assert!(QUEUE.is_empty());
    }
}
