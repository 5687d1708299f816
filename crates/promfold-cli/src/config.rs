//! promfold.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// Default period between ingestion cycles in `promfold run`.
pub const DEFAULT_INTERVAL_SECS: u64 = 15;

/// Contents of a `promfold.toml` file. Every field is optional; command-line
/// flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub state_file: Option<PathBuf>,
    pub spool_dir: Option<PathBuf>,
    pub consume: Option<bool>,
    pub interval_secs: Option<u64>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub state_file: Option<PathBuf>,
    pub spool_dir: Option<PathBuf>,
    pub keep: bool,
    pub interval_secs: Option<u64>,
}

/// Fully resolved settings for an ingestion command.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub state_file: PathBuf,
    pub spool_dir: PathBuf,
    pub consume: bool,
    pub interval: Duration,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from an empty config.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// The state file, preferring the command-line value.
    pub fn state_file(&self, overrides: &Overrides) -> anyhow::Result<PathBuf> {
        match overrides.state_file.as_ref().or(self.state_file.as_ref()) {
            Some(path) => Ok(path.clone()),
            None => bail!("no state file given; pass --state or set state_file in the config"),
        }
    }

    /// Apply command-line overrides and fill in defaults.
    pub fn resolve(&self, overrides: &Overrides) -> anyhow::Result<Settings> {
        let state_file = self.state_file(overrides)?;
        let Some(spool_dir) = overrides.spool_dir.as_ref().or(self.spool_dir.as_ref()) else {
            bail!("no spool directory given; pass --spool or set spool_dir in the config");
        };
        let consume = !overrides.keep && self.consume.unwrap_or(true);
        let interval_secs = overrides
            .interval_secs
            .or(self.interval_secs)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            bail!("interval_secs must be at least 1");
        }

        Ok(Settings {
            state_file,
            spool_dir: spool_dir.clone(),
            consume,
            interval: Duration::from_secs(interval_secs),
        })
    }
}
