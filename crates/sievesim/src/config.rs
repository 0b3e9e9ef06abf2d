//! Simulator configuration: JSON file plus command-line overrides

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sievecache::CacheConfig;

/// Shape of the generated request stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    /// Number of distinct keys
    pub keys: u64,
    /// Total requests across all threads
    pub ops: usize,
    /// Zipf exponent, 0.0 = uniform
    pub skew: f64,
    pub seed: u64,
    pub threads: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            keys: 10_000,
            ops: 1_000_000,
            skew: 0.99,
            seed: 42,
            threads: 1,
        }
    }
}

/// Full simulator settings as read from `--config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    pub cache: CacheConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
}

/// Values given on the command line; `None` keeps the file/default value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub capacity: Option<usize>,
    pub ttl_ms: Option<u64>,
    pub keys: Option<u64>,
    pub ops: Option<usize>,
    pub skew: Option<f64>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

impl SimConfig {
    /// Read a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(capacity) = overrides.capacity {
            self.cache.capacity = capacity;
        }
        if let Some(ttl_ms) = overrides.ttl_ms {
            self.cache = self.cache.with_ttl(Duration::from_millis(ttl_ms));
        }
        if let Some(keys) = overrides.keys {
            self.workload.keys = keys;
        }
        if let Some(ops) = overrides.ops {
            self.workload.ops = ops;
        }
        if let Some(skew) = overrides.skew {
            self.workload.skew = skew;
        }
        if let Some(seed) = overrides.seed {
            self.workload.seed = seed;
        }
        if let Some(threads) = overrides.threads {
            self.workload.threads = threads;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if self.workload.keys == 0 {
            bail!("workload needs at least one key");
        }
        if self.workload.threads == 0 {
            bail!("workload needs at least one thread");
        }
        if !(0.0..=1.0).contains(&self.workload.skew) {
            bail!("skew must be within 0.0..=1.0, got {}", self.workload.skew);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sievecache::EvictionPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "cache": {{ "capacity": 64, "policy": "lru", "ttl_ms": 500 }},
                "workload": {{ "keys": 1000, "skew": 0.5 }}
            }}"#
        )
        .unwrap();

        let config = SimConfig::load(file.path()).unwrap();

        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.cache.policy, EvictionPolicy::LeastRecentlyUsed);
        assert_eq!(config.cache.ttl(), Some(Duration::from_millis(500)));
        assert_eq!(config.workload.keys, 1000);
        assert_eq!(config.workload.skew, 0.5);
        // Unspecified workload fields fall back to defaults
        assert_eq!(config.workload.threads, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn test_load_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "cache": {{ "capacity": "lots" }} }}"#).unwrap();

        let err = SimConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = SimConfig::default();
        config.apply(&Overrides {
            capacity: Some(7),
            ttl_ms: Some(250),
            threads: Some(4),
            ..Overrides::default()
        });

        assert_eq!(config.cache.capacity, 7);
        assert_eq!(config.cache.ttl_ms, Some(250));
        assert_eq!(config.workload.threads, 4);
        assert_eq!(config.workload.keys, 10_000);
    }

    #[test]
    fn test_validate() {
        let mut config = SimConfig::default();
        assert!(config.validate().is_ok());

        config.workload.skew = 1.5;
        assert!(config.validate().is_err());

        config.workload.skew = 0.5;
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
    }
}
