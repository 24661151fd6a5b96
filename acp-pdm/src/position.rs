//! Completed-period counter shared between the interrupt and control paths.
//!
//! The interrupt bridge is the only writer: one [`advance`](PositionCounter::advance)
//! per serviced PDM DMA interrupt. Readers on any context see a consistent
//! value because the counter is a single atomic word.

use core::sync::atomic::{AtomicU64, Ordering};

/// Monotonic count of capture periods the DMA has completed.
#[derive(Debug)]
pub struct PositionCounter {
    periods: AtomicU64,
}

impl PositionCounter {
    pub const fn new() -> Self {
        PositionCounter {
            periods: AtomicU64::new(0),
        }
    }

    /// Record one completed period and return the new count.
    pub fn advance(&self) -> u64 {
        self.periods.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Periods completed so far.
    pub fn periods(&self) -> u64 {
        self.periods.load(Ordering::Acquire)
    }

    /// Restart from zero. Only valid while the PDM interrupt is masked.
    pub fn reset(&self) {
        self.periods.store(0, Ordering::Release);
    }
}

impl Default for PositionCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::thread;

    #[test]
    fn advance_returns_new_count() {
        let c = PositionCounter::new();
        assert_eq!(c.periods(), 0);
        assert_eq!(c.advance(), 1);
        assert_eq!(c.advance(), 2);
        assert_eq!(c.periods(), 2);
        c.reset();
        assert_eq!(c.periods(), 0);
    }

    #[test]
    fn reader_never_sees_count_go_backwards() {
        static COUNTER: PositionCounter = PositionCounter::new();
        const TICKS: u64 = 100_000;

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..TICKS {
                    COUNTER.advance();
                }
            });
            s.spawn(|| {
                let mut last = 0;
                while last < TICKS {
                    let now = COUNTER.periods();
                    assert!(now >= last, "went from {last} to {now}");
                    last = now;
                }
            });
        });

        assert_eq!(COUNTER.periods(), TICKS);
    }
}
