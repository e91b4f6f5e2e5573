//! Dispatcher configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable switching authorization off
pub const AUTH_DISABLED_VAR: &str = "PORTAL_RPC_AUTH_DISABLED";
/// Environment variable naming the deployment environment
pub const ENVIRONMENT_VAR: &str = "PORTAL_RPC_ENV";

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
    Test,
}

impl Environment {
    /// Production-like environments never expose exception detail.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production | Environment::Staging)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown environment '{0}'")]
    InvalidEnvironment(String),

    #[error("{var} must be a boolean, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

/// Runtime switches of the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Skip the action and menu checks for every call
    pub authorization_disabled: bool,
    pub environment: Environment,
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorization_disabled(mut self, disabled: bool) -> Self {
        self.authorization_disabled = disabled;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Read [`AUTH_DISABLED_VAR`] and [`ENVIRONMENT_VAR`] from the process
    /// environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(AUTH_DISABLED_VAR) {
            config.authorization_disabled = parse_flag(AUTH_DISABLED_VAR, &value)?;
        }
        if let Some(value) = lookup(ENVIRONMENT_VAR) {
            config.environment = value.parse()?;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
