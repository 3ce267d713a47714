//! Runtime settings for the `mtx` binary.
//!
//! Precedence for every setting: command-line flag, then environment, then
//! the optional `mtx.toml` file, then built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use mtx_standards::{STANDARDS_ENV_VAR, bundled_standards_root};
use mtx_validate::{BackendKind, ValidatorConfig};

pub const DEFAULT_WORKERS: usize = 4;

/// Contents of an `mtx.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub standards_dir: Option<PathBuf>,
    pub validator: ValidatorConfig,
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    pub workers: usize,
    pub prevalidate: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            prevalidate: true,
        }
    }
}

impl FileConfig {
    /// Read a config file; a relative `standards_dir` is taken from the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: FileConfig =
            toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
        if let Some(dir) = &config.standards_dir
            && dir.is_relative()
            && let Some(parent) = path.parent()
        {
            config.standards_dir = Some(parent.join(dir));
        }
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub standards_dir: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub workers: Option<usize>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub standards_dir: PathBuf,
    pub validator: ValidatorConfig,
    pub batch: BatchSettings,
}

impl Settings {
    /// Resolve against the process environment.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve(
        file: FileConfig,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let standards_dir = overrides
            .standards_dir
            .clone()
            .or_else(|| env(STANDARDS_ENV_VAR).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .or(file.standards_dir)
            .unwrap_or_else(bundled_standards_root);

        let mut validator = file
            .validator
            .overlay(&env)
            .context("validator settings from environment")?;
        if let Some(backend) = overrides.backend {
            validator.backend = backend;
        }

        let mut batch = file.batch;
        if let Some(workers) = overrides.workers {
            batch.workers = workers;
        }

        Ok(Self {
            standards_dir,
            validator,
            batch,
        })
    }
}
