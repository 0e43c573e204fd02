//! Counting primitives for fan-out / fan-in over a fixed number of parties
//!
//! [`CountdownLatch`] elects the single party that finishes last;
//! [`SlotClaimer`] hands out each slot index exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A counter that elects the caller taking it to zero
///
/// Exactly one call to [`count_down`](Self::count_down) returns `true` over
/// the latch's lifetime (none if it was created at zero). Counting down an
/// already released latch is a no-op that returns `false`.
#[derive(Debug)]
pub struct CountdownLatch {
    remaining: AtomicUsize,
}

impl CountdownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
        }
    }

    /// Decrement the count; `true` only for the caller that reached zero
    pub fn count_down(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            })
            .is_ok_and(|previous| previous == 1)
    }

    /// Parties that have not counted down yet
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.remaining() == 0
    }
}

/// Hands out the indices `0..len` once each, in order
#[derive(Debug)]
pub struct SlotClaimer {
    next: AtomicUsize,
    len: usize,
}

impl SlotClaimer {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    /// Claim the next unclaimed slot, `None` once all are taken
    pub fn claim(&self) -> Option<usize> {
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                (next < self.len).then_some(next + 1)
            })
            .ok()
    }

    /// Slots not claimed yet
    pub fn unclaimed(&self) -> usize {
        self.len.saturating_sub(self.next.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_latch_releases_once() {
        let latch = CountdownLatch::new(3);
        assert!(!latch.count_down());
        assert!(!latch.count_down());
        assert!(latch.count_down());
        assert!(latch.is_released());

        // Further calls never elect a second winner
        assert!(!latch.count_down());
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn test_zero_latch_is_already_released() {
        let latch = CountdownLatch::new(0);
        assert!(latch.is_released());
        assert!(!latch.count_down());
    }

    #[test]
    fn test_latch_elects_exactly_one_thread() {
        for _ in 0..50 {
            let latch = Arc::new(CountdownLatch::new(16));
            let winners: usize = (0..16)
                .map(|_| {
                    let latch = Arc::clone(&latch);
                    thread::spawn(move || latch.count_down())
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| handle.join().unwrap() as usize)
                .sum();
            assert_eq!(winners, 1);
        }
    }

    #[test]
    fn test_claimer_hands_out_each_slot_once() {
        let claimer = Arc::new(SlotClaimer::new(64));
        let mut claimed: Vec<usize> = (0..8)
            .map(|_| {
                let claimer = Arc::clone(&claimer);
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some(slot) = claimer.claim() {
                        mine.push(slot);
                    }
                    mine
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        claimed.sort_unstable();
        assert_eq!(claimed, (0..64).collect::<Vec<_>>());
        assert_eq!(claimer.unclaimed(), 0);
        assert_eq!(claimer.claim(), None);
    }
}
