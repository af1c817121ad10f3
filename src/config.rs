use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::locate::ResolutionOptions;

/// On-disk configuration (`lodestar.json`). Every field is optional; absent
/// fields fall back to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub headless: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub fuzzy_floor: Option<f64>,
    pub report_dir: Option<PathBuf>,
}

/// Effective settings after merging a config file over the defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub headless: bool,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub fuzzy_floor: f64,
    pub report_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_ms: 10_000,
            max_retries: 3,
            fuzzy_floor: 0.3,
            report_dir: PathBuf::from("lodestar-report"),
        }
    }
}

pub const DEFAULT_CONFIG_FILE: &str = "lodestar.json";

impl Config {
    /// Load configuration. With an explicit `path` the file must exist; with
    /// none, `lodestar.json` in the working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !candidate.exists() {
            if path.is_some() {
                bail!("config file not found: {}", candidate.display());
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&candidate)
            .with_context(|| format!("failed to read {}", candidate.display()))?;
        let file: ConfigFile = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config in {}", candidate.display()))?;

        let mut config = Self::default();
        config.apply(file);
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.headless {
            self.headless = v;
        }
        if let Some(v) = file.timeout_ms {
            self.timeout_ms = v;
        }
        if let Some(v) = file.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = file.fuzzy_floor {
            self.fuzzy_floor = v;
        }
        if let Some(v) = file.report_dir {
            self.report_dir = v;
        }
    }

    /// Resolution options derived from this configuration.
    pub fn resolution_options(&self) -> ResolutionOptions {
        ResolutionOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            prefer_inputs: false,
            fuzzy_floor: self.fuzzy_floor,
        }
    }
}
