//! Worker configuration.

use serde::{Deserialize, Serialize};

use telemetry_core::{Error, Result};
use telemetry_dsp::{DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE, DEFAULT_WINDOW_SIZE};

/// Complete worker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Message queue sizing
    pub queue: QueueConfig,

    /// Filter parameters used when a request omits them
    pub filters: FilterDefaults,

    /// Input guards
    pub limits: LimitsConfig,

    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Requests buffered before `send` waits
    pub request_capacity: usize,

    /// Responses buffered before the worker waits for the host
    pub response_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            request_capacity: 64,
            response_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    pub window_size: usize,
    pub process_noise: f64,
    pub measurement_noise: f64,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest series accepted by the O(N²) DFT; unbounded when unset
    pub max_spectrum_len: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from file, with `TELEMETRY__*` environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()
            .map_err(config_error)?;

        let config: Self = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()
            .map_err(config_error)?;

        let config: Self = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue.request_capacity == 0 || self.queue.response_capacity == 0 {
            return Err(Error::Config("queue capacities must be at least 1".into()));
        }
        if self.filters.process_noise < 0.0 || self.filters.measurement_noise < 0.0 {
            return Err(Error::Config("filter noise variances must be non-negative".into()));
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("TELEMETRY")
        .separator("__")
        .try_parsing(true)
}

fn config_error(e: config::ConfigError) -> Error {
    Error::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Environment variables are process-wide; loaders run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.queue.request_capacity, 64);
        assert_eq!(config.filters.window_size, 5);
        assert_eq!(config.filters.process_noise, 0.1);
        assert_eq!(config.filters.measurement_noise, 1.0);
        assert_eq!(config.limits.max_spectrum_len, None);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[queue]\nrequest_capacity = 8\n\n[limits]\nmax_spectrum_len = 4096\n\n[logging]\njson = true"
        )
        .unwrap();

        let config = WorkerConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.queue.request_capacity, 8);
        assert_eq!(config.queue.response_capacity, 64);
        assert_eq!(config.limits.max_spectrum_len, Some(4096));
        assert!(config.logging.json);
        assert_eq!(config.filters, FilterDefaults::default());
    }

    #[test]
    fn test_invalid_capacity_rejected() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[queue]\nresponse_capacity = 0").unwrap();

        let result = WorkerConfig::from_file(file.path().to_str().unwrap());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let _env = env_lock();
        let result = WorkerConfig::from_file("/nonexistent/telemetry-worker.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[queue]\nrequest_capacity = 8\n\n[limits]\nmax_spectrum_len = 4096").unwrap();

        std::env::set_var("TELEMETRY__QUEUE__REQUEST_CAPACITY", "7");
        std::env::set_var("TELEMETRY__LIMITS__MAX_SPECTRUM_LEN", "128");
        let from_env = WorkerConfig::from_env();
        let from_file = WorkerConfig::from_file(file.path().to_str().unwrap());
        std::env::remove_var("TELEMETRY__QUEUE__REQUEST_CAPACITY");
        std::env::remove_var("TELEMETRY__LIMITS__MAX_SPECTRUM_LEN");

        let from_env = from_env.unwrap();
        assert_eq!(from_env.queue.request_capacity, 7);
        assert_eq!(from_env.queue.response_capacity, 64);
        assert_eq!(from_env.limits.max_spectrum_len, Some(128));
        assert_eq!(from_env.filters, FilterDefaults::default());

        // Environment wins over the file
        let from_file = from_file.unwrap();
        assert_eq!(from_file.queue.request_capacity, 7);
        assert_eq!(from_file.limits.max_spectrum_len, Some(128));
    }

    #[test]
    fn test_environment_defaults() {
        let _env = env_lock();
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_environment_invalid_value() {
        let _env = env_lock();
        std::env::set_var("TELEMETRY__QUEUE__REQUEST_CAPACITY", "0");
        let result = WorkerConfig::from_env();
        std::env::remove_var("TELEMETRY__QUEUE__REQUEST_CAPACITY");

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
