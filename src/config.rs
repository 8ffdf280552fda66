use crate::application::dispatcher::DEFAULT_MAX_BATCH_SIZE;
use crate::application::scheduler::DEFAULT_FLUSH_INTERVAL;
use crate::error::{IngestError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TOPIC: &str = "boletos-registro";

/// Tunables of the buffering engine.
///
/// Every field has a default, so a config file only needs to name what it
/// changes:
///
/// ```toml
/// topic = "boletos-registro"
/// max_batch_size = 10000
/// flush_interval_ms = 500
/// capacity = 1000000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Broker topic every record is published to.
    pub topic: String,
    /// Records drained per flush, and the occupancy that triggers an eager flush.
    pub max_batch_size: usize,
    /// Period of the scheduled flush.
    pub flush_interval_ms: u64,
    /// Maximum buffered records. `None` leaves the buffer unbounded.
    pub capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            capacity: None,
        }
    }
}

impl EngineConfig {
    /// Loads a TOML config file and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| IngestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(IngestError::Config("topic must not be empty".to_string()));
        }
        if self.max_batch_size == 0 {
            return Err(IngestError::Config(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.flush_interval_ms == 0 {
            return Err(IngestError::Config(
                "flush_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.capacity == Some(0) {
            return Err(IngestError::Config(
                "capacity must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
