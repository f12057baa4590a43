// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Executor settings read from the process environment (or any other key/value source).

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

/// Enables `__schema` and `__type` (default `true`).
pub const GRAPHQL_INTROSPECTION: &str = "GRAPHQL_INTROSPECTION";
/// Allows mutation operations (default `true`).
pub const GRAPHQL_ALLOW_MUTATIONS: &str = "GRAPHQL_ALLOW_MUTATIONS";

const SWITCH_ON: [&str; 6] = ["true", "1", "yes", "on", "enabled", "enable"];
const SWITCH_OFF: [&str; 6] = ["false", "0", "no", "off", "disabled", "disable"];

/// A source of configuration values.
pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Reads `key` as an on/off switch, `default_value` if it is unset.
    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            Some(value) => parse_switch(key, value),
            None => Ok(default_value),
        }
    }
}

fn parse_switch(key: &str, value: String) -> Result<bool, EnvError> {
    let normalized = value.trim().to_lowercase();

    if SWITCH_ON.contains(&normalized.as_str()) {
        Ok(true)
    } else if SWITCH_OFF.contains(&normalized.as_str()) {
        Ok(false)
    } else {
        Err(EnvError::InvalidBoolean {
            key: key.to_string(),
            value,
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EnvError {
    #[error(
        "Invalid value {value:?} for {key}, expected one of {} (or {})",
        SWITCH_ON.join(", "),
        SWITCH_OFF.join(", ")
    )]
    InvalidBoolean { key: String, value: String },
}

/// The variables of the running process.
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Explicit values, optionally layered over another environment that answers for the keys
/// not set here.
#[derive(Clone, Default)]
pub struct MapEnvironment {
    overrides: HashMap<String, String>,
    base: Option<Arc<dyn Environment>>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layered_over(base: Arc<dyn Environment>) -> Self {
        Self {
            overrides: HashMap::new(),
            base: Some(base),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(key.into(), value.into());
    }
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        match self.overrides.get(key) {
            Some(value) => Some(value.clone()),
            None => self.base.as_deref().and_then(|base| base.get(key)),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        let mut env = Self::new();
        for (key, value) in entries {
            env.set(key, value);
        }
        env
    }
}

/// Switches that change what an execution accepts, independent of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Whether `__schema` and `__type` resolve on the query root. `__typename` is always
    /// available.
    pub introspection: bool,
    /// Whether mutation operations may be executed.
    pub allow_mutations: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            introspection: true,
            allow_mutations: true,
        }
    }
}

impl ExecutorConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self {
            introspection: env.enabled(GRAPHQL_INTROSPECTION, true)?,
            allow_mutations: env.enabled(GRAPHQL_ALLOW_MUTATIONS, true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ExecutorConfig::from_env(&MapEnvironment::new()).unwrap();

        assert_eq!(config, ExecutorConfig::default());
    }

    #[test]
    fn reads_switches() {
        let env: MapEnvironment = [
            (GRAPHQL_INTROSPECTION, "off"),
            (GRAPHQL_ALLOW_MUTATIONS, " Disabled "),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            ExecutorConfig::from_env(&env).unwrap(),
            ExecutorConfig {
                introspection: false,
                allow_mutations: false,
            }
        );
    }

    #[test]
    fn overrides_shadow_the_base_environment() {
        let base: MapEnvironment = [(GRAPHQL_ALLOW_MUTATIONS, "maybe")].into_iter().collect();
        let mut env = MapEnvironment::layered_over(Arc::new(base));

        assert_eq!(
            ExecutorConfig::from_env(&env),
            Err(EnvError::InvalidBoolean {
                key: GRAPHQL_ALLOW_MUTATIONS.to_string(),
                value: "maybe".to_string(),
            })
        );

        env.set(GRAPHQL_ALLOW_MUTATIONS, "yes");
        assert!(ExecutorConfig::from_env(&env).unwrap().allow_mutations);
    }
}
