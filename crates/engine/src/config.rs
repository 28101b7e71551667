//! Copy configuration via `tablecopy.toml`
//!
//! Every field is optional in the file; missing fields take their defaults.
//! Command-line flags override values loaded from a file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tablecopy_core::limits::{
    DEFAULT_PROGRESS_INTERVAL, DEFAULT_SCANNER_COUNT, MAX_BATCH_WRITE_ITEMS, MAX_SCANNER_COUNT,
    MIN_SCANNER_COUNT,
};
use tablecopy_core::{resolve_scanner_count, Error, Result};
use tracing::warn;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "tablecopy.toml";

/// Polling of a newly created target table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterConfig {
    /// Delay between `describe` polls in milliseconds (default: 10000)
    #[serde(default = "default_waiter_delay_ms")]
    pub delay_ms: u64,
    /// Polls before giving up (default: 100)
    #[serde(default = "default_waiter_attempts")]
    pub max_attempts: u32,
}

fn default_waiter_delay_ms() -> u64 {
    10_000
}

fn default_waiter_attempts() -> u32 {
    100
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_waiter_delay_ms(),
            max_attempts: default_waiter_attempts(),
        }
    }
}

impl WaiterConfig {
    /// Delay between polls
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Retry of failed batch writes
///
/// # Example
///
/// ```text
/// let config = RetryConfig::default().with_max_attempts(3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries per batch after the first attempt (0 = no retries)
    #[serde(default)]
    pub max_attempts: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    50
}

fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Set the retry count
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Whether any retry is configured
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: usize) -> Duration {
        // 1 << 63 is the largest shift that fits u64
        let shift = attempt.min(63);
        let delay_ms = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Copy configuration loaded from `tablecopy.toml`
///
/// # Example
///
/// ```toml
/// scanner_count = 8
/// create_target = true
///
/// [retry]
/// max_attempts = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Requested number of parallel scanners
    #[serde(default = "default_scanner_count")]
    pub scanner_count: u32,
    /// Create the target table when it does not exist
    #[serde(default)]
    pub create_target: bool,
    /// Carry streams, indexes, SSE and tags over to a created target
    #[serde(default)]
    pub verbose_copy: bool,
    /// Items per write batch, capped at the writer's maximum
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Item limit passed to every scan call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_page_limit: Option<usize>,
    /// Records read between progress log lines
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    /// Target readiness polling
    #[serde(default)]
    pub waiter: WaiterConfig,
    /// Batch write retries
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_scanner_count() -> u32 {
    DEFAULT_SCANNER_COUNT
}

fn default_batch_size() -> usize {
    MAX_BATCH_WRITE_ITEMS
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            scanner_count: default_scanner_count(),
            create_target: false,
            verbose_copy: false,
            batch_size: default_batch_size(),
            scan_page_limit: None,
            progress_interval: default_progress_interval(),
            waiter: WaiterConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl CopyConfig {
    /// Scanner count actually used
    ///
    /// Out-of-range requests fall back to the default with a warning.
    pub fn effective_scanner_count(&self) -> u32 {
        let resolved = resolve_scanner_count(self.scanner_count);
        if resolved != self.scanner_count {
            warn!(
                requested = self.scanner_count,
                min = MIN_SCANNER_COUNT,
                max = MAX_SCANNER_COUNT,
                using = resolved,
                "scanner count out of range, using default"
            );
        }
        resolved
    }

    /// Batch capacity given the writer's per-call maximum
    pub fn effective_batch_size(&self, writer_max: usize) -> usize {
        self.batch_size.clamp(1, writer_max.max(1))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# tablecopy configuration
#
# Parallel scanners (1-20, anything else falls back to 5)
scanner_count = 5

# Create the target table if it does not exist
create_target = false

# When creating the target, also copy streams, secondary indexes,
# encryption settings and tags from the source
verbose_copy = false

# Items per batch write (at most 25)
batch_size = 25

# Item limit per scan page (unset = store default)
# scan_page_limit = 1000

# Records read between progress log lines
progress_interval = 1000

[waiter]
delay_ms = 10000
max_attempts = 100

[retry]
# 0 disables retries of failed batch writes
max_attempts = 0
base_delay_ms = 50
max_delay_ms = 2000
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => {
                Error::Config(format!("Config file '{}': {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: CopyConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        if config.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if config.progress_interval == 0 {
            return Err(Error::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
