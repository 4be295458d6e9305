// SPDX-License-Identifier: MIT

//! Runtime settings read from the environment
//!
//! | Variable                   | Default     |
//! |----------------------------|-------------|
//! | `GRAPHFLOW_HOST`           | `127.0.0.1` |
//! | `GRAPHFLOW_PORT`           | `8000`      |
//! | `GRAPHFLOW_MAX_ITERATIONS` | `100`       |

use std::env;
use std::str::FromStr;

use crate::adk::error::FlowError;
use crate::kinetic::workflow::graph::DEFAULT_MAX_ITERATIONS;

pub const HOST_VAR: &str = "GRAPHFLOW_HOST";
pub const PORT_VAR: &str = "GRAPHFLOW_PORT";
pub const MAX_ITERATIONS_VAR: &str = "GRAPHFLOW_MAX_ITERATIONS";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub max_iterations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (env, map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: lookup(HOST_VAR).unwrap_or(defaults.host),
            port: parse_var(&lookup, PORT_VAR)?.unwrap_or(defaults.port),
            max_iterations: parse_var(&lookup, MAX_ITERATIONS_VAR)?
                .unwrap_or(defaults.max_iterations),
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, FlowError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FlowError::config(format!("{}={:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_iterations, 100);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            (HOST_VAR, "0.0.0.0"),
            (PORT_VAR, "9090"),
            (MAX_ITERATIONS_VAR, " 25 "),
        ]))
        .unwrap();

        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.max_iterations, 25);
    }

    #[test]
    fn test_invalid_port() {
        let err = Settings::from_lookup(lookup_from(&[(PORT_VAR, "eighty")])).unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
        assert!(err.to_string().contains("GRAPHFLOW_PORT"));
    }
}
