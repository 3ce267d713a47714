//! Validator facade configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ValidatorError;

pub const BACKEND_ENV_VAR: &str = "XSD_VALIDATOR_BACKEND";
pub const ENDPOINT_ENV_VAR: &str = "XSD_VALIDATOR_ENDPOINT";
pub const ENGINE_ENV_VAR: &str = "XSD_VALIDATOR_ENGINE";
pub const TIMEOUT_ENV_VAR: &str = "XSD_VALIDATOR_TIMEOUT_SECS";

const DEFAULT_ENGINE: &str = "xmlschema";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// XML Schema 1.1 when available, else 1.0.
    #[default]
    Auto,
    Xsd10,
    Xsd11,
    Remote,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Xsd10 => "xsd10",
            Self::Xsd11 => "xsd11",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "xsd10" | "lxml" => Ok(Self::Xsd10),
            "xsd11" | "xmlschema11" => Ok(Self::Xsd11),
            "remote" | "http" => Ok(Self::Remote),
            _ => Err(ValidatorError::UnknownBackend {
                name: s.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for BackendKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Backend selection and remote endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub backend: BackendKind,
    pub endpoint: Option<String>,
    pub engine: String,
    pub timeout_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            endpoint: None,
            engine: DEFAULT_ENGINE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ValidatorConfig {
    /// Defaults overridden by the `XSD_VALIDATOR_*` environment variables.
    pub fn from_env() -> Result<Self, ValidatorError> {
        Self::default().overlay_env()
    }

    /// Apply any `XSD_VALIDATOR_*` variables set in the environment.
    pub fn overlay_env(self) -> Result<Self, ValidatorError> {
        self.overlay(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`; unset or blank values keep the current setting.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ValidatorError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(backend) = get(BACKEND_ENV_VAR) {
            self.backend = backend.parse()?;
        }
        if let Some(endpoint) = get(ENDPOINT_ENV_VAR) {
            self.endpoint = Some(endpoint);
        }
        if let Some(engine) = get(ENGINE_ENV_VAR) {
            self.engine = engine;
        }
        if let Some(timeout) = get(TIMEOUT_ENV_VAR) {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| ValidatorError::InvalidTimeout { value: timeout })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn legacy_backend_names_are_aliases() {
        assert_eq!("lxml".parse::<BackendKind>().unwrap(), BackendKind::Xsd10);
        assert_eq!("XMLSchema11".parse::<BackendKind>().unwrap(), BackendKind::Xsd11);
        assert_eq!("http".parse::<BackendKind>().unwrap(), BackendKind::Remote);
        assert!(matches!(
            "saxon".parse::<BackendKind>(),
            Err(ValidatorError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn overlay_reads_variables() {
        let vars = env(&[
            (BACKEND_ENV_VAR, "remote"),
            (ENDPOINT_ENV_VAR, "http://validator:8080/validate"),
            (ENGINE_ENV_VAR, " "),
            (TIMEOUT_ENV_VAR, "5"),
        ]);
        let config = ValidatorConfig::default()
            .overlay(|name| vars.get(name).cloned())
            .unwrap();
        assert_eq!(config.backend, BackendKind::Remote);
        assert_eq!(config.endpoint.as_deref(), Some("http://validator:8080/validate"));
        assert_eq!(config.engine, "xmlschema");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let vars = env(&[(TIMEOUT_ENV_VAR, "soon")]);
        let err = ValidatorConfig::default()
            .overlay(|name| vars.get(name).cloned())
            .unwrap_err();
        assert!(matches!(err, ValidatorError::InvalidTimeout { .. }));
    }
}
