/*!
 * Queue Configuration
 *
 * Construction-time settings shared by both queue flavours.
 */

use serde::{Deserialize, Deserializer, Serialize};

/// Environment variable enabling de-duplication (`1` or `true`)
pub const DEDUP_ENV: &str = "DEDUPQ_DEDUP";

/// Environment variable holding the initial capacity hint
pub const CAPACITY_ENV: &str = "DEDUPQ_CAPACITY";

/// Queue configuration
///
/// `capacity` only preallocates storage; it is not a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Skip values that are already queued
    #[serde(default)]
    pub dedup: bool,
    /// Initial capacity hint
    #[serde(default, deserialize_with = "clamped_capacity")]
    pub capacity: usize,
}

impl QueueConfig {
    pub const fn new(dedup: bool) -> Self {
        Self { dedup, capacity: 0 }
    }

    /// Plain FIFO, repeated values allowed
    pub const fn fifo() -> Self {
        Self::new(false)
    }

    /// FIFO that ignores values already present
    pub const fn deduplicating() -> Self {
        Self::new(true)
    }

    pub const fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the capacity from a signed hint; negative values become zero
    pub fn with_capacity_hint(self, hint: i64) -> Self {
        self.with_capacity(clamp_hint(hint))
    }

    /// Load configuration from the environment
    ///
    /// Environment variables:
    /// - DEDUPQ_DEDUP: Enable de-duplication (default: false)
    /// - DEDUPQ_CAPACITY: Initial capacity hint (default: 0, negative clamps to 0)
    pub fn from_env() -> Self {
        let dedup = std::env::var(DEDUP_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let capacity = std::env::var(CAPACITY_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(clamp_hint)
            .unwrap_or(0);

        Self { dedup, capacity }
    }
}

fn clamp_hint(hint: i64) -> usize {
    usize::try_from(hint.max(0)).unwrap_or(usize::MAX)
}

fn clamped_capacity<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(clamp_hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(QueueConfig::default(), QueueConfig::fifo());
        assert!(QueueConfig::deduplicating().dedup);
        assert_eq!(QueueConfig::fifo().capacity, 0);
    }

    #[test]
    fn test_negative_hint_clamps_to_zero() {
        assert_eq!(QueueConfig::fifo().with_capacity_hint(-5).capacity, 0);
        assert_eq!(QueueConfig::fifo().with_capacity_hint(16).capacity, 16);
    }

    #[test]
    fn test_builder_chain() {
        let config = QueueConfig::fifo().with_dedup(true).with_capacity(8);
        assert_eq!(config, QueueConfig { dedup: true, capacity: 8 });
    }
}
