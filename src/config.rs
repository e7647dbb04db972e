use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

pub const SNAPSHOT_DIR_VAR: &str = "APP_STORE_SNAPSHOT_DIR";
pub const CASE_TIMEOUT_VAR: &str = "APP_STORE_CASE_TIMEOUT_SECS";

const DEFAULT_SNAPSHOT_DIR: &str = "./db";
const DEFAULT_CASE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Where snapshots live and how long a single case may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub snapshot_dir: PathBuf,
    pub case_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            case_timeout: DEFAULT_CASE_TIMEOUT,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = HarnessConfig::default();

        if let Some(dir) = lookup(SNAPSHOT_DIR_VAR).filter(|d| !d.is_empty()) {
            config.snapshot_dir = PathBuf::from(dir);
        }

        if let Some(value) = lookup(CASE_TIMEOUT_VAR) {
            config.case_timeout = match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: CASE_TIMEOUT_VAR,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(
        vars: &'a HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |var| vars.get(var).map(|v| v.to_string())
    }

    #[test]
    fn defaults_when_unset() {
        let vars = HashMap::new();
        let config = HarnessConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.case_timeout, Duration::from_secs(60));
    }

    #[test]
    fn reads_overrides() {
        let vars = HashMap::from([(SNAPSHOT_DIR_VAR, "/data/snapshots"), (CASE_TIMEOUT_VAR, " 5 ")]);
        let config = HarnessConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.snapshot_dir, PathBuf::from("/data/snapshots"));
        assert_eq!(config.case_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_and_garbage_timeouts() {
        for bad in ["0", "ten", "-3"] {
            let vars = HashMap::from([(CASE_TIMEOUT_VAR, bad)]);
            let err = HarnessConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout { ref value, .. } if value == bad));
        }
    }

    #[test]
    fn cli_directory_wins() {
        let config = HarnessConfig::default().with_snapshot_dir("fixtures");
        assert_eq!(config.snapshot_dir, PathBuf::from("fixtures"));
    }
}
