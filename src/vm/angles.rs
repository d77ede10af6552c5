// src/vm/angles.rs

use super::program::AngleExpr;
use crate::core::constants::mbqc_constants::BUILTIN_ANGLES;
use crate::core::{QvmError, Result};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Source of values for angle names nothing else can resolve.
///
/// Returning `None` declines, which fails the lookup with
/// [`QvmError::UnknownAngle`].
pub trait AnglePrompt {
    fn prompt(&mut self, name: &str) -> Option<f64>;
}

impl<F> AnglePrompt for F
where
    F: FnMut(&str) -> Option<f64>,
{
    fn prompt(&mut self, name: &str) -> Option<f64> {
        self(name)
    }
}

/// Named angle constants used by measurement commands.
///
/// A name is upper-cased and then resolved from, in order: an environment
/// override (explicit overrides first, then the process environment when
/// enabled), the table itself, and finally the installed prompt. A prompted
/// value is stored in the table so later commands reuse it.
pub struct AngleTable {
    constants: HashMap<String, f64>,
    overrides: HashMap<String, String>,
    use_process_env: bool,
    prompt: Option<Box<dyn AnglePrompt>>,
}

impl AngleTable {
    /// A table holding the built-in multiples of π.
    pub fn new() -> Self {
        Self {
            constants: BUILTIN_ANGLES
                .iter()
                .map(|&(name, value)| (name.to_string(), value))
                .collect(),
            overrides: HashMap::new(),
            use_process_env: true,
            prompt: None,
        }
    }

    /// Enables or disables reading overrides from the process environment.
    pub fn use_process_env(mut self, enabled: bool) -> Self {
        self.use_process_env = enabled;
        self
    }

    /// Installs the fallback used for names nothing else resolves.
    pub fn with_prompt(mut self, prompt: impl AnglePrompt + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    pub fn set_prompt(&mut self, prompt: impl AnglePrompt + 'static) {
        self.prompt = Some(Box::new(prompt));
    }

    /// Adds or replaces a constant.
    pub fn insert(&mut self, name: &str, value: f64) {
        self.constants.insert(name.to_uppercase(), value);
    }

    /// Sets an override that takes precedence over the table, as an
    /// environment variable would. `value` is a float or a constant name.
    pub fn set_override(&mut self, name: &str, value: impl Into<String>) {
        self.overrides.insert(name.to_uppercase(), value.into());
    }

    /// Value currently stored under `name`, ignoring overrides and prompt.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.constants.get(&name.to_uppercase()).copied()
    }

    /// Evaluates an angle expression to radians.
    pub fn resolve(&mut self, angle: &AngleExpr) -> Result<f64> {
        match angle {
            AngleExpr::Literal(value) => Ok(*value),
            AngleExpr::Negate(inner) => Ok(-self.resolve(inner)?),
            AngleExpr::Named(name) => self.lookup(name),
        }
    }

    /// Resolves a constant name.
    pub fn lookup(&mut self, name: &str) -> Result<f64> {
        let key = name.to_uppercase();

        if let Some(raw) = self.environment_value(&key) {
            debug!(name = %key, value = %raw, "angle taken from environment");
            let raw = raw.trim();
            return match raw.parse::<f64>() {
                Ok(value) => Ok(value),
                Err(_) => self
                    .get(raw)
                    .ok_or(QvmError::UnknownAngle { name: raw.to_uppercase() }),
            };
        }

        if let Some(&value) = self.constants.get(&key) {
            return Ok(value);
        }

        let prompted = self.prompt.as_mut().and_then(|prompt| prompt.prompt(&key));
        match prompted {
            Some(value) => {
                info!(name = %key, value, "added angle constant");
                self.constants.insert(key, value);
                Ok(value)
            }
            None => Err(QvmError::UnknownAngle { name: key }),
        }
    }

    fn environment_value(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(key) {
            return Some(value.clone());
        }
        if self.use_process_env {
            return std::env::var(key).ok();
        }
        None
    }
}

impl Default for AngleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AngleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AngleTable")
            .field("constants", &self.constants)
            .field("overrides", &self.overrides)
            .field("use_process_env", &self.use_process_env)
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}
