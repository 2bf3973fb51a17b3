//! Lock-free unsigned counters backing the accountant's bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};

/// An atomic byte or allocation count that is never driven below zero.
///
/// `withdraw` refuses to underflow and `deposit_within` refuses to exceed a
/// cap; both retry a compare-and-swap until they either commit or observe a
/// value that rules the update out.
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new(initial: u64) -> Counter {
        Counter(AtomicU64::new(initial))
    }

    /// Subtracts `amount` if the counter holds at least that much.
    /// Returns `false`, leaving the value untouched, otherwise.
    pub fn withdraw(&self, amount: u64) -> bool {
        let mut observed = self.0.load(Ordering::Relaxed);
        while observed >= amount {
            match self.0.compare_exchange_weak(
                observed,
                observed - amount,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => observed = actual,
            }
        }
        false
    }

    /// Adds `amount` if the result stays at or below `limit`.
    /// Returns `false`, leaving the value untouched, otherwise.
    pub fn deposit_within(&self, amount: u64, limit: u64) -> bool {
        let mut observed = self.0.load(Ordering::Relaxed);
        while observed <= limit && amount <= limit - observed {
            match self.0.compare_exchange_weak(
                observed,
                observed + amount,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => observed = actual,
            }
        }
        false
    }

    /// Adds `amount` unconditionally.
    pub fn deposit(&self, amount: u64) {
        self.0.fetch_add(amount, Ordering::Release);
    }

    /// Current value; a snapshot only, other threads may change it at once.
    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Counter({})", self.read())
    }
}
