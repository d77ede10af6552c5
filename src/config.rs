// src/config.rs

//! Run configuration for [`QuantumVm`](crate::vm::QuantumVm).

use crate::core::constants::mbqc_constants::DEFAULT_MAX_TANGLES;
use crate::core::{QvmError, Result};
use std::env;
use std::str::FromStr;

/// Knobs for one VM instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QvmConfig {
    /// Number of entanglement groups that may be alive at once.
    pub max_tangles: usize,
    /// Seed for measurement sampling. A random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Rescale every group to unit norm once the command stream ends.
    pub normalize_on_finish: bool,
    /// Log the memory dump at `debug` after every command.
    pub trace_memory: bool,
    /// Run the structural validator after every command.
    pub validate_each_step: bool,
    /// Let process environment variables override angle constants.
    pub read_env_angles: bool,
}

impl Default for QvmConfig {
    fn default() -> Self {
        Self {
            max_tangles: DEFAULT_MAX_TANGLES,
            seed: None,
            normalize_on_finish: true,
            trace_memory: false,
            validate_each_step: false,
            read_env_angles: true,
        }
    }
}

impl QvmConfig {
    pub const ENV_MAX_TANGLES: &'static str = "MBQC_MAX_TANGLES";
    pub const ENV_SEED: &'static str = "MBQC_SEED";
    pub const ENV_TRACE_MEMORY: &'static str = "MBQC_TRACE_MEMORY";
    pub const ENV_VALIDATE: &'static str = "MBQC_VALIDATE";

    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `MBQC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `MBQC_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(Self::ENV_MAX_TANGLES) {
            config.max_tangles = parse_value(Self::ENV_MAX_TANGLES, &raw)?;
            if config.max_tangles == 0 {
                return Err(QvmError::Config {
                    message: format!("{} must be at least 1", Self::ENV_MAX_TANGLES),
                });
            }
        }
        if let Some(raw) = lookup(Self::ENV_SEED) {
            config.seed = Some(parse_value(Self::ENV_SEED, &raw)?);
        }
        if let Some(raw) = lookup(Self::ENV_TRACE_MEMORY) {
            config.trace_memory = parse_flag(Self::ENV_TRACE_MEMORY, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_VALIDATE) {
            config.validate_each_step = parse_flag(Self::ENV_VALIDATE, &raw)?;
        }
        Ok(config)
    }

    pub fn with_max_tangles(mut self, max_tangles: usize) -> Self {
        self.max_tangles = max_tangles;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_normalize_on_finish(mut self, enabled: bool) -> Self {
        self.normalize_on_finish = enabled;
        self
    }

    pub fn with_trace_memory(mut self, enabled: bool) -> Self {
        self.trace_memory = enabled;
        self
    }

    pub fn with_validate_each_step(mut self, enabled: bool) -> Self {
        self.validate_each_step = enabled;
        self
    }

    pub fn with_env_angles(mut self, enabled: bool) -> Self {
        self.read_env_angles = enabled;
        self
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| QvmError::Config {
        message: format!("{} has invalid value \"{}\"", key, raw),
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(QvmError::Config {
            message: format!("{} expects a boolean, got \"{}\"", key, raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = QvmConfig::default();
        assert_eq!(config.max_tangles, 32767);
        assert_eq!(config.seed, None);
        assert!(config.normalize_on_finish);
        assert!(!config.trace_memory);
        assert!(!config.validate_each_step);
        assert!(config.read_env_angles);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = QvmConfig::from_lookup(lookup(&[
            ("MBQC_MAX_TANGLES", "16"),
            ("MBQC_SEED", " 42 "),
            ("MBQC_TRACE_MEMORY", "yes"),
            ("MBQC_VALIDATE", "1"),
        ]))
        .unwrap();
        let expected = QvmConfig::new()
            .with_max_tangles(16)
            .with_seed(42)
            .with_trace_memory(true)
            .with_validate_each_step(true);
        assert_eq!(config, expected);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        assert!(matches!(
            QvmConfig::from_lookup(lookup(&[("MBQC_SEED", "abc")])),
            Err(QvmError::Config { .. })
        ));
        assert!(matches!(
            QvmConfig::from_lookup(lookup(&[("MBQC_VALIDATE", "maybe")])),
            Err(QvmError::Config { .. })
        ));
        assert!(matches!(
            QvmConfig::from_lookup(lookup(&[("MBQC_MAX_TANGLES", "0")])),
            Err(QvmError::Config { .. })
        ));
    }
}
