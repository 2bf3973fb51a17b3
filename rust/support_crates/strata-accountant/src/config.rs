//! Accountant configuration: the aggregate native memory cap and the
//! reclaim-and-retry backoff policy.

use std::time::Duration;

/// Environment variable holding the maximum aggregate native capacity, in bytes.
/// Accepts an optional `k`, `m` or `g` suffix (binary multiples).
pub const MAX_NATIVE_MEMORY_VAR: &str = "STRATA_MAX_NATIVE_MEMORY";

/// Environment variable holding the initial backoff delay in milliseconds.
pub const BACKOFF_MS_VAR: &str = "STRATA_RESERVE_BACKOFF_MS";

/// Environment variable holding the number of backoff sleeps before a
/// reservation is refused.
pub const MAX_SLEEPS_VAR: &str = "STRATA_RESERVE_MAX_SLEEPS";

/// Default cap on aggregate native capacity when nothing is configured (4 GiB).
pub const DEFAULT_MAX_NATIVE_MEMORY: u64 = 4 << 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountantConfig {
    /// Maximum total capacity of outstanding native allocations, in bytes.
    pub max_capacity: u64,
    /// Retry policy applied once a reservation does not fit.
    pub backoff: BackoffPolicy,
}

impl AccountantConfig {
    pub fn with_max_capacity(max_capacity: u64) -> AccountantConfig {
        AccountantConfig {
            max_capacity,
            ..Default::default()
        }
    }

    pub fn backoff(mut self, backoff: BackoffPolicy) -> AccountantConfig {
        self.backoff = backoff;
        self
    }

    /// Reads the configuration from the process environment, falling back to
    /// defaults for unset or malformed values.
    pub fn from_env() -> AccountantConfig {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AccountantConfig {
        let mut config = AccountantConfig::default();
        if let Some(value) = lookup(MAX_NATIVE_MEMORY_VAR) {
            match parse_size(&value) {
                Some(max) => config.max_capacity = max,
                None => log::warn!("ignoring malformed {MAX_NATIVE_MEMORY_VAR}={value:?}"),
            }
        }
        if let Some(value) = lookup(BACKOFF_MS_VAR) {
            match value.trim().parse::<u64>() {
                Ok(ms) => config.backoff.initial_delay = Duration::from_millis(ms),
                Err(_) => log::warn!("ignoring malformed {BACKOFF_MS_VAR}={value:?}"),
            }
        }
        if let Some(value) = lookup(MAX_SLEEPS_VAR) {
            match value.trim().parse::<u32>() {
                Ok(sleeps) => config.backoff.max_sleeps = sleeps,
                Err(_) => log::warn!("ignoring malformed {MAX_SLEEPS_VAR}={value:?}"),
            }
        }
        config
    }
}

impl Default for AccountantConfig {
    fn default() -> Self {
        AccountantConfig {
            max_capacity: DEFAULT_MAX_NATIVE_MEMORY,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Bounded exponential backoff used while waiting for concurrently released
/// allocations to return their capacity.
///
/// The total wait is at most `initial_delay * (2^max_sleeps - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_sleeps: u32,
}

impl BackoffPolicy {
    /// A policy that refuses immediately after the reclaim pass.
    pub fn none() -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::ZERO,
            max_sleeps: 0,
        }
    }

    /// The sequence of sleep durations.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let initial = self.initial_delay;
        (0..self.max_sleeps).map(move |i| initial.saturating_mul(1u32 << i.min(31)))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            initial_delay: Duration::from_millis(1),
            max_sleeps: 9,
        }
    }
}

/// Parses a byte size such as `"65536"`, `"64k"`, `"512M"` or `"2g"`.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let (digits, shift) = match s.as_bytes().last()? {
        b'k' | b'K' => (&s[..s.len() - 1], 10),
        b'm' | b'M' => (&s[..s.len() - 1], 20),
        b'g' | b'G' => (&s[..s.len() - 1], 30),
        _ => (s, 0),
    };
    let value = digits.parse::<u64>().ok()?;
    value.checked_mul(1u64 << shift)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0"), Some(0));
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("64k"), Some(64 * 1024));
        assert_eq!(parse_size(" 512M "), Some(512 << 20));
        assert_eq!(parse_size("2g"), Some(2 << 30));
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("g"), None);
        assert_eq!(parse_size("-5"), None);
        assert_eq!(parse_size("99999999999999999999g"), None);
        assert_eq!(parse_size(&format!("{}g", u64::MAX >> 20)), None);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (MAX_NATIVE_MEMORY_VAR, "16m"),
            (BACKOFF_MS_VAR, "5"),
            (MAX_SLEEPS_VAR, "3"),
        ]
        .into_iter()
        .collect();
        let config = AccountantConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.max_capacity, 16 << 20);
        assert_eq!(config.backoff.initial_delay, Duration::from_millis(5));
        assert_eq!(config.backoff.max_sleeps, 3);
    }

    #[test]
    fn test_from_lookup_malformed_falls_back() {
        let config = AccountantConfig::from_lookup(|k| {
            (k == MAX_NATIVE_MEMORY_VAR).then(|| "lots".to_string())
        });
        assert_eq!(config, AccountantConfig::default());
    }

    #[test]
    fn test_backoff_delays() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_millis(1),
            max_sleeps: 4,
        };
        let delays = policy.delays().collect::<Vec<_>>();
        assert_eq!(
            delays,
            [1, 2, 4, 8].map(Duration::from_millis).to_vec()
        );
        assert_eq!(BackoffPolicy::none().delays().count(), 0);
    }
}
