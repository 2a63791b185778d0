//! Layered configuration for noteloom.
//!
//! # Usage
//!
//! ```rust,no_run
//! use loomconf::LoomConfig;
//!
//! let config = LoomConfig::load().expect("Failed to load config");
//! println!("corpus: {}", config.paths.corpus_dir.display());
//! println!("window: {}", config.pipeline.sequence_length);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/noteloom/config.toml` (system)
//! 2. `~/.config/noteloom/config.toml` (user)
//! 3. `./noteloom.toml` (local override), or the path given with `--config`
//! 4. Environment variables (`NOTELOOM_*`, `RUST_LOG`)
//!
//! Tables merge key by key, so a later file only needs the keys it changes.
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! corpus_dir = "~/midi/classical"
//! artifacts_dir = "~/.local/share/noteloom"
//!
//! [pipeline]
//! sequence_length = 100
//! num_tokens = 500
//! step = 0.5
//! markov_order = 3
//!
//! [render]
//! tempo_bpm = 120.0
//! ppq = 480
//! note_length = 1.0
//! velocity = 90
//! program = 0
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files, discover_config_files_with_override, ConfigSources};
pub use sections::{PathsConfig, PipelineConfig, RenderConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Config file {0} does not exist")]
    Missing(PathBuf),

    #[error("Environment variable {var} has invalid value {value:?}")]
    Env { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete noteloom configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoomConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl LoomConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/noteloom/config.toml`
    /// 3. `~/.config/noteloom/config.toml`
    /// 4. `./noteloom.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load with `config_path` in place of `./noteloom.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path)?;
        let (mut config, mut sources) = Self::load_files(&files)?;
        loader::apply_env_overrides(&mut config, &mut sources)?;
        config.validate()?;
        Ok((config, sources))
    }

    /// Merge the given files in order, without environment overrides.
    pub fn load_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_table(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }

        let origin = files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let config = loader::config_from_table(merged, &origin)?;
        Ok((config, sources))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.pipeline.sequence_length == 0 {
            return invalid("pipeline.sequence_length must be at least 1".into());
        }
        if self.pipeline.markov_order == 0 {
            return invalid("pipeline.markov_order must be at least 1".into());
        }
        if !(self.pipeline.step.is_finite() && self.pipeline.step > 0.0) {
            return invalid(format!("pipeline.step must be positive, got {}", self.pipeline.step));
        }
        if !(self.render.tempo_bpm.is_finite() && self.render.tempo_bpm > 0.0) {
            return invalid(format!(
                "render.tempo_bpm must be positive, got {}",
                self.render.tempo_bpm
            ));
        }
        if !(self.render.note_length.is_finite() && self.render.note_length > 0.0) {
            return invalid(format!(
                "render.note_length must be positive, got {}",
                self.render.note_length
            ));
        }
        if self.render.ppq == 0 || self.render.ppq > 0x7FFF {
            return invalid(format!("render.ppq out of range: {}", self.render.ppq));
        }
        if !(1..=127).contains(&self.render.velocity) {
            return invalid(format!("render.velocity out of range: {}", self.render.velocity));
        }
        if self.render.program > 127 {
            return invalid(format!("render.program out of range: {}", self.render.program));
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# noteloom configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "corpus_dir = {}\n",
            toml_string(&self.paths.corpus_dir.display().to_string())
        ));
        output.push_str(&format!(
            "artifacts_dir = {}\n",
            toml_string(&self.paths.artifacts_dir.display().to_string())
        ));

        output.push_str("\n[pipeline]\n");
        output.push_str(&format!(
            "sequence_length = {}\n",
            self.pipeline.sequence_length
        ));
        output.push_str(&format!("num_tokens = {}\n", self.pipeline.num_tokens));
        output.push_str(&format!("step = {:?}\n", self.pipeline.step));
        output.push_str(&format!("markov_order = {}\n", self.pipeline.markov_order));

        output.push_str("\n[render]\n");
        output.push_str(&format!("tempo_bpm = {:?}\n", self.render.tempo_bpm));
        output.push_str(&format!("ppq = {}\n", self.render.ppq));
        output.push_str(&format!("note_length = {:?}\n", self.render.note_length));
        output.push_str(&format!("velocity = {}\n", self.render.velocity));
        output.push_str(&format!("program = {}\n", self.render.program));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = {}\n",
            toml_string(&self.telemetry.log_level)
        ));

        output
    }
}

/// Quote a string as a TOML basic string.
fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
