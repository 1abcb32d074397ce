use crate::consts::{
    DEFAULT_DATA_FILE, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_THRESHOLD, ENV_CONFIG, ENV_DATA_FILE,
};
use crate::exceptions::BenchError;
use crate::regression::{BaselineStrategy, Detector};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by every command.
///
/// Resolution order: built-in defaults, then the JSON file named by
/// `--config` or `BENCHTRAIL_CONFIG`, then `BENCHTRAIL_DATA_FILE`, then
/// command-line flags (applied by the caller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_file: PathBuf,
    pub repo_url: Option<String>,
    pub threshold: f64,
    pub baseline: BaselineStrategy,
    pub lock_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            repo_url: None,
            threshold: DEFAULT_THRESHOLD,
            baseline: BaselineStrategy::Previous,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl Config {
    pub fn load(explicit: Option<&Path>) -> Result<Self, BenchError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(BenchError::Configuration(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                crate::fs::read_json::<Config>(&path).map_err(|e| {
                    BenchError::Configuration(format!("{}: {}", path.display(), e))
                })?
            }
            None => Config::default(),
        };

        if let Some(data_file) = env::var_os(ENV_DATA_FILE) {
            config.data_file = PathBuf::from(data_file);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(BenchError::Configuration(format!(
                "threshold must be a non-negative fraction (e.g. 0.05), got {}",
                self.threshold
            )));
        }
        if let BaselineStrategy::RollingMean { window: 0 } = self.baseline {
            return Err(BenchError::Configuration(
                "rolling baseline window must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn detector(&self) -> Detector {
        Detector::new(self.threshold, self.baseline)
    }
}
