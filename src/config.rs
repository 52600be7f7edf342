//! Service configuration read from environment variables.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use crate::solver::{self, Tuning};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
    #[error("SCHEDULER_STRATEGY names unknown strategy `{0}`")]
    UnknownStrategy(String),
}

/// Runtime settings for the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Strategy used when a request does not name one.
    pub default_strategy: String,
    pub tuning: Tuning,
    /// Upper bound on solves running at once.
    pub max_concurrent_solves: usize,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Environment Variables
    /// - `SCHEDULER_HOST` (optional, default: 127.0.0.1)
    /// - `SCHEDULER_PORT` (optional, default: 8080)
    /// - `SCHEDULER_STRATEGY` (optional, default: highs)
    /// - `SCHEDULER_SEED` (optional, default: 1234)
    /// - `SCHEDULER_ITERATIONS` (optional, default: 20000): local search budget
    /// - `SCHEDULER_MAX_CONCURRENT_SOLVES` (optional, default: 4)
    ///
    /// # Errors
    /// Returns an error if a variable cannot be parsed or the strategy is not
    /// registered.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Settings::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Tuning::default();
        let host = lookup("SCHEDULER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse(&lookup, "SCHEDULER_PORT", 8080)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "SCHEDULER_HOST",
                value: host.clone(),
            })?;

        let default_strategy = lookup("SCHEDULER_STRATEGY").unwrap_or_else(|| "highs".to_string());
        if solver::strategy(&default_strategy).is_err() {
            return Err(ConfigError::UnknownStrategy(default_strategy));
        }

        Ok(Self {
            bind_addr,
            default_strategy,
            tuning: Tuning {
                seed: parse(&lookup, "SCHEDULER_SEED", defaults.seed)?,
                iterations: parse(&lookup, "SCHEDULER_ITERATIONS", defaults.iterations)?,
            },
            max_concurrent_solves: parse(&lookup, "SCHEDULER_MAX_CONCURRENT_SOLVES", 4_usize)?
                .max(1),
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}
