//! One-second tick accumulator shared with the timer ISR.

use core::cell::Cell;
use critical_section::Mutex;

/// Count of seconds that have passed since the last commit.
///
/// The 1 Hz timer ISR calls [`increment`]; the commit path drains the count
/// with [`take`]. Both run inside a scoped critical section, so the pair is
/// safe on targets without atomic read-modify-write instructions.
///
/// The counter is 8 bits wide: the owner must commit at least every 255
/// seconds, otherwise the count wraps and time is silently lost.
///
/// [`increment`]: TickCounter::increment
/// [`take`]: TickCounter::take
pub struct TickCounter {
    pending: Mutex<Cell<u8>>,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(0)),
        }
    }

    /// Add one tick. Safe to call from interrupt context.
    #[inline]
    pub fn increment(&self) {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            pending.set(pending.get().wrapping_add(1));
        });
    }

    /// Atomically read the queued tick count and reset it to zero.
    #[inline]
    pub fn take(&self) -> u8 {
        critical_section::with(|cs| self.pending.borrow(cs).replace(0))
    }

    /// Discard all queued ticks.
    #[inline]
    pub fn clear(&self) {
        self.take();
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_take() {
        let ticks = TickCounter::new();
        assert_eq!(ticks.take(), 0);

        ticks.increment();
        ticks.increment();
        ticks.increment();
        assert_eq!(ticks.take(), 3);
        assert_eq!(ticks.take(), 0);
    }

    #[test]
    fn test_clear() {
        let ticks = TickCounter::new();
        ticks.increment();
        ticks.clear();
        assert_eq!(ticks.take(), 0);
    }

    #[test]
    fn test_wraps_after_256_ticks() {
        let ticks = TickCounter::new();
        for _ in 0..256 {
            ticks.increment();
        }
        assert_eq!(ticks.take(), 0);
    }
}
