//! Process-wide accounting of outstanding native (off-heap) memory.
//!
//! Every native allocation must [`reserve`](MemoryAccountant::reserve) its size
//! before it is made and [`unreserve`](MemoryAccountant::unreserve) it once the
//! memory is freed. A reservation that does not fit under the configured cap
//! triggers a best-effort reclamation pass followed by a bounded backoff; if the
//! cap still cannot accommodate it, the reservation is refused.

use std::sync::{Arc, Mutex, OnceLock};

use config::AccountantConfig;
use counter::Counter;

pub mod config;
pub mod counter;

type Reclaimer = Arc<dyn Fn() + Send + Sync + 'static>;

/// Counters for outstanding native memory, with an admission policy.
pub struct MemoryAccountant {
    config: OnceLock<AccountantConfig>,
    /// Bytes actually requested from the system, including alignment padding.
    reserved: Counter,
    /// Sum of the capacities of outstanding allocations; this is what the cap limits.
    total_capacity: Counter,
    /// Number of outstanding allocations.
    count: Counter,
    reclaimer: Mutex<Option<Reclaimer>>,
}

impl MemoryAccountant {
    /// Creates an accountant with a fixed configuration.
    pub fn new(config: AccountantConfig) -> MemoryAccountant {
        let accountant = Self::lazy();
        let _ = accountant.config.set(config);
        accountant
    }

    /// Creates an accountant that reads its configuration from the environment
    /// the first time a reservation needs it.
    pub fn lazy() -> MemoryAccountant {
        MemoryAccountant {
            config: OnceLock::new(),
            reserved: Counter::new(0),
            total_capacity: Counter::new(0),
            count: Counter::new(0),
            reclaimer: Mutex::new(None),
        }
    }

    /// The process-wide accountant used by default for native allocations.
    pub fn global() -> &'static Arc<MemoryAccountant> {
        static GLOBAL: OnceLock<Arc<MemoryAccountant>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(MemoryAccountant::lazy()))
    }

    /// Returns the effective configuration, resolving it if necessary.
    pub fn config(&self) -> &AccountantConfig {
        self.config.get_or_init(|| {
            let config = AccountantConfig::from_env();
            log::debug!(
                "native memory limit resolved to {} bytes",
                config.max_capacity
            );
            config
        })
    }

    /// Maximum aggregate capacity of outstanding native allocations.
    pub fn max_capacity(&self) -> u64 {
        self.config().max_capacity
    }

    /// Installs the hook invoked when a reservation does not fit.
    ///
    /// The hook should release whatever native memory its owner can spare
    /// (e.g. dropping cached buffers). It may be called concurrently.
    pub fn set_reclaimer(&self, reclaimer: impl Fn() + Send + Sync + 'static) {
        *self.lock_reclaimer() = Some(Arc::new(reclaimer));
    }

    /// Removes the reclamation hook.
    pub fn clear_reclaimer(&self) {
        *self.lock_reclaimer() = None;
    }

    /// Reserves `size` bytes of native memory for an allocation of `capacity`
    /// bytes (`size` may exceed `capacity` by alignment padding).
    ///
    /// Succeeds immediately if `capacity` fits under the cap. Otherwise runs the
    /// reclaimer and retries according to the backoff policy; returns a
    /// [`ReserveError`] if the capacity never becomes available.
    pub fn reserve(&self, size: u64, capacity: u64) -> Result<(), ReserveError> {
        if self.try_reserve(size, capacity) {
            return Ok(());
        }

        log::debug!(
            "native reservation of {capacity} bytes is contended (in use {}, limit {})",
            self.total_capacity(),
            self.max_capacity()
        );

        self.reclaim();
        if self.try_reserve(size, capacity) {
            return Ok(());
        }

        for delay in self.config().backoff.delays() {
            std::thread::sleep(delay);
            if self.try_reserve(size, capacity) {
                return Ok(());
            }
        }

        let err = ReserveError {
            size,
            capacity,
            in_use: self.total_capacity(),
            limit: self.max_capacity(),
        };
        log::warn!("{err}");
        Err(err)
    }

    /// Returns a reservation made by [`reserve`](Self::reserve).
    pub fn unreserve(&self, size: u64, capacity: u64) {
        let ok = self.count.withdraw(1)
            & self.reserved.withdraw(size)
            & self.total_capacity.withdraw(capacity);
        if !ok {
            log::error!(
                "native memory accounting underflow releasing {size} bytes \
                 (capacity {capacity}): {self:?}"
            );
            debug_assert!(ok, "native memory accounting underflow");
        }
    }

    /// Bytes reserved from the system, including alignment padding.
    pub fn reserved(&self) -> u64 {
        self.reserved.read()
    }

    /// Total capacity of outstanding allocations.
    pub fn total_capacity(&self) -> u64 {
        self.total_capacity.read()
    }

    /// Number of outstanding allocations.
    pub fn count(&self) -> u64 {
        self.count.read()
    }

    fn try_reserve(&self, size: u64, capacity: u64) -> bool {
        if !self
            .total_capacity
            .deposit_within(capacity, self.max_capacity())
        {
            return false;
        }
        self.reserved.deposit(size);
        self.count.deposit(1);
        true
    }

    fn reclaim(&self) {
        let reclaimer = self.lock_reclaimer().clone();
        if let Some(reclaimer) = reclaimer {
            reclaimer();
        }
    }

    fn lock_reclaimer(&self) -> std::sync::MutexGuard<'_, Option<Reclaimer>> {
        self.reclaimer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryAccountant {
    fn default() -> Self {
        Self::lazy()
    }
}

impl std::fmt::Debug for MemoryAccountant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAccountant")
            .field("reserved", &self.reserved.read())
            .field("total_capacity", &self.total_capacity.read())
            .field("count", &self.count.read())
            .field("config", &self.config.get())
            .finish_non_exhaustive()
    }
}

/// A native memory reservation was refused after reclaim-and-retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReserveError {
    /// Requested size, including padding.
    pub size: u64,
    /// Requested capacity.
    pub capacity: u64,
    /// Capacity in use when the reservation was refused.
    pub in_use: u64,
    /// Configured cap.
    pub limit: u64,
}

impl ReserveError {
    /// Capacity still available under the cap when the reservation was refused.
    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.in_use)
    }
}

impl std::fmt::Display for ReserveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot reserve {} bytes of native memory: {} of {} in use",
            self.capacity, self.in_use, self.limit
        )
    }
}

impl std::error::Error for ReserveError {}

impl From<ReserveError> for std::io::Error {
    fn from(e: ReserveError) -> Self {
        std::io::Error::new(std::io::ErrorKind::OutOfMemory, e)
    }
}
