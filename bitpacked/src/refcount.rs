//! Reference counts for identities that have no heap cell to store one in.
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::RwLock;

use crate::{Mode, RuntimeError, RuntimeResult, Word};

/// Reported for every packed identity when counts are not simulated.
pub const DUMMY_REFCNT: usize = 0x3FFF_FFFF;

/// Where the count of a given word lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RefcountSource {
    Heap,
    Simulated,
    Sentinel,
}

impl RefcountSource {
    pub fn of(mode: &Mode, word: Word) -> Self {
        if !mode.is_packing() || word.is_heap() {
            RefcountSource::Heap
        } else if mode.simulates_refcounts() {
            RefcountSource::Simulated
        } else {
            RefcountSource::Sentinel
        }
    }
}

/// Atomic counters keyed by packed word.
///
/// Equal values pack to the same word on every thread, so the counter is shared
/// by everyone holding that value.
#[derive(Debug, Default)]
pub struct SimulatedCounts {
    counts: RwLock<HashMap<Word, AtomicUsize, ahash::RandomState>>,
}

impl SimulatedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero for a word nobody has retained yet.
    pub fn count(&self, word: Word) -> usize {
        self.counts
            .read()
            .get(&word)
            .map_or(0, |count| count.load(Ordering::Acquire))
    }

    pub fn increment(&self, word: Word) -> usize {
        if let Some(count) = self.counts.read().get(&word) {
            return count.fetch_add(1, Ordering::AcqRel) + 1;
        }
        let mut counts = self.counts.write();
        counts
            .entry(word)
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::AcqRel)
            + 1
    }

    /// A counter that reaches zero leaves the map; an absent word reads as zero.
    pub fn decrement(&self, word: Word) -> RuntimeResult<usize> {
        let remaining = {
            let counts = self.counts.read();
            let count = counts
                .get(&word)
                .ok_or(RuntimeError::RefcountUnderflow(word))?;
            count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .map(|previous| previous - 1)
                .map_err(|_| RuntimeError::RefcountUnderflow(word))?
        };
        if remaining == 0 {
            let mut counts = self.counts.write();
            // another thread may have retained the word since
            if counts
                .get(&word)
                .is_some_and(|count| count.load(Ordering::Acquire) == 0)
            {
                counts.remove(&word);
            }
        }
        Ok(remaining)
    }

    pub fn tracked(&self) -> usize {
        self.counts.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModeCreateInfo, packers::bits::pack_int};

    #[test]
    fn source_follows_the_mode_table() {
        let packed = pack_int(1234).unwrap();
        let heap = Word::from_address(0x7f00_0000_1000);

        let conventional = Mode::conventional();
        assert_eq!(RefcountSource::of(&conventional, packed), RefcountSource::Heap);
        assert_eq!(RefcountSource::of(&conventional, heap), RefcountSource::Heap);

        let simulated = Mode::packed().unwrap();
        assert_eq!(RefcountSource::of(&simulated, packed), RefcountSource::Simulated);
        assert_eq!(RefcountSource::of(&simulated, heap), RefcountSource::Heap);

        let sentinel = Mode::new(ModeCreateInfo {
            packing: true,
            simulate_refcounts: false,
            error_detection: true,
        })
        .unwrap();
        assert_eq!(RefcountSource::of(&sentinel, packed), RefcountSource::Sentinel);
        assert_eq!(RefcountSource::of(&sentinel, heap), RefcountSource::Heap);
    }

    #[test]
    fn counts_go_up_and_down() {
        let counts = SimulatedCounts::new();
        let word = pack_int(7).unwrap();
        assert_eq!(counts.count(word), 0);
        assert_eq!(counts.increment(word), 1);
        assert_eq!(counts.increment(word), 2);
        assert_eq!(counts.decrement(word), Ok(1));
        assert_eq!(counts.decrement(word), Ok(0));
        assert_eq!(counts.decrement(word), Err(RuntimeError::RefcountUnderflow(word)));
        assert_eq!(counts.count(word), 0);
    }

    #[test]
    fn released_words_are_forgotten() {
        let counts = SimulatedCounts::new();
        for n in 0..10_000 {
            let word = pack_int(n).unwrap();
            counts.increment(word);
            counts.increment(word);
            assert_eq!(counts.decrement(word), Ok(1));
            assert_eq!(counts.tracked(), 1);
            assert_eq!(counts.decrement(word), Ok(0));
            assert_eq!(counts.count(word), 0);
        }
        assert_eq!(counts.tracked(), 0);
    }

    #[test]
    fn untracked_words_underflow() {
        let counts = SimulatedCounts::new();
        let word = pack_int(-1).unwrap();
        assert_eq!(counts.decrement(word), Err(RuntimeError::RefcountUnderflow(word)));
        assert_eq!(counts.tracked(), 0);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counts = SimulatedCounts::new();
        let word = pack_int(12000).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        counts.increment(word);
                    }
                });
            }
        });
        assert_eq!(counts.count(word), 8000);
        assert_eq!(counts.tracked(), 1);
    }
}
