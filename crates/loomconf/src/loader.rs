//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, LoomConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/noteloom/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("noteloom/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    let local = PathBuf::from("noteloom.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Discover config files, with an explicit path replacing the local override.
///
/// Unlike the standard locations, an explicit path must exist.
pub fn discover_config_files_with_override(
    cli_path: Option<&Path>,
) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = discover_config_files();
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        files.retain(|f| f != Path::new("noteloom.toml"));
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// Read a TOML file as a raw table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let value = match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
                continue;
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
}

/// Turn a merged table into a config, filling gaps with defaults.
pub fn config_from_table(table: toml::Table, origin: &Path) -> Result<LoomConfig, ConfigError> {
    let mut config: LoomConfig =
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;
    config.paths.corpus_dir = expand_path(&config.paths.corpus_dir.to_string_lossy());
    config.paths.artifacts_dir = expand_path(&config.paths.artifacts_dir.to_string_lossy());
    Ok(config)
}

/// Parse a single TOML document into a config.
pub fn parse_config(contents: &str, path: &Path) -> Result<LoomConfig, ConfigError> {
    config_from_table(parse_table(contents, path)?, path)
}

/// Apply `NOTELOOM_*` and `RUST_LOG` overrides from the process environment.
pub fn apply_env_overrides(
    config: &mut LoomConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides(config, sources, env::vars())
}

/// Apply overrides from an explicit set of variables.
pub fn apply_overrides<I>(
    config: &mut LoomConfig,
    sources: &mut ConfigSources,
    vars: I,
) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut rust_log = None;

    for (key, value) in vars {
        match key.as_str() {
            "NOTELOOM_CORPUS_DIR" => config.paths.corpus_dir = expand_path(&value),
            "NOTELOOM_ARTIFACTS_DIR" => config.paths.artifacts_dir = expand_path(&value),
            "NOTELOOM_SEQUENCE_LENGTH" => {
                config.pipeline.sequence_length = parse_env(&key, &value)?
            }
            "NOTELOOM_NUM_TOKENS" => config.pipeline.num_tokens = parse_env(&key, &value)?,
            "NOTELOOM_STEP" => config.pipeline.step = parse_env(&key, &value)?,
            "NOTELOOM_MARKOV_ORDER" => config.pipeline.markov_order = parse_env(&key, &value)?,
            "NOTELOOM_TEMPO_BPM" => config.render.tempo_bpm = parse_env(&key, &value)?,
            "NOTELOOM_PPQ" => config.render.ppq = parse_env(&key, &value)?,
            "NOTELOOM_NOTE_LENGTH" => config.render.note_length = parse_env(&key, &value)?,
            "NOTELOOM_VELOCITY" => config.render.velocity = parse_env(&key, &value)?,
            "NOTELOOM_PROGRAM" => config.render.program = parse_env(&key, &value)?,
            "NOTELOOM_LOG_LEVEL" => config.telemetry.log_level = value,
            // Applied last so it wins over NOTELOOM_LOG_LEVEL
            "RUST_LOG" => {
                rust_log = Some(value);
                continue;
            }
            _ => continue,
        }
        sources.env_overrides.push(key);
    }

    if let Some(filter) = rust_log {
        config.telemetry.log_level = filter;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        match directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            Some(home) => home.join(stripped),
            None => PathBuf::from(path),
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            match env::var(var_name) {
                Ok(var_value) => PathBuf::from(var_value).join(&stripped[slash_pos + 1..]),
                Err(_) => PathBuf::from(path),
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
