//! Operator configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default bound on the output channel.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Number of workers draining the input. Must be at least 1.
    pub concurrency: usize,

    /// Output channel bound. `None` means unbounded.
    pub output_capacity: Option<usize>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            output_capacity: Some(DEFAULT_OUTPUT_CAPACITY),
        }
    }
}

impl OperatorConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `OPFLOW_CONCURRENCY`: worker count
    /// - `OPFLOW_OUTPUT_CAPACITY`: output bound; `0` or `unbounded` removes the bound
    ///
    /// Unparseable values are ignored. The result is validated, so
    /// `OPFLOW_CONCURRENCY=0` is an error.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("OPFLOW_CONCURRENCY") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.concurrency = v;
            }
        }

        if let Ok(s) = std::env::var("OPFLOW_OUTPUT_CAPACITY") {
            cfg.output_capacity = parse_capacity(&s).unwrap_or(cfg.output_capacity);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_output_capacity(mut self, capacity: Option<usize>) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Reject settings the executor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".into()));
        }
        if self.output_capacity == Some(0) {
            return Err(Error::Config(
                "output capacity must be positive (use None for unbounded)".into(),
            ));
        }
        Ok(())
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// `Some(None)` is "unbounded", `None` is unparseable.
fn parse_capacity(s: &str) -> Option<Option<usize>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("unbounded") {
        return Some(None);
    }
    match s.parse::<usize>() {
        Ok(0) => Some(None),
        Ok(v) => Some(Some(v)),
        Err(_) => None,
    }
}
