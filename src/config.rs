//! # Pool Configuration
//!
//! Per-pool settings passed at construction. Configs can be written by hand or
//! loaded from RON text:
//!
//! ```
//! use axiom_pool::config::{ExhaustionPolicy, PoolConfig};
//!
//! let config = PoolConfig::from_ron_str("(capacity: 64, on_exhaustion: Abort)").unwrap();
//! assert_eq!(config.capacity, 64);
//! assert_eq!(config.on_exhaustion, ExhaustionPolicy::Abort);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// What `allocate` does when no slot is free.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// Return [`PoolError::PoolExhausted`].
    #[default]
    Error,
    /// Treat exhaustion as a sizing bug and panic.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of slots. Fixed for the lifetime of the pool.
    pub capacity: u32,
    pub on_exhaustion: ExhaustionPolicy,
}

impl PoolConfig {
    pub const DEFAULT_CAPACITY: u32 = 1000;

    /// Largest capacity accepted; the free stack stores `u32` indices and
    /// `u32::MAX` is never a valid slot.
    pub const MAX_CAPACITY: u32 = u32::MAX - 1;

    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn on_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.on_exhaustion = policy;
        self
    }

    /// Parses a RON document. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> PoolResult<Self> {
        let config: Self = ron::from_str(text).map_err(|e| PoolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> PoolResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PoolError::Config(e.to_string()))
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 || self.capacity > Self::MAX_CAPACITY {
            return Err(PoolError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            on_exhaustion: ExhaustionPolicy::default(),
        }
    }
}
