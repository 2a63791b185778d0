//! Config sections. Every field has a compiled default so a partial file
//! only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the corpus lives and where artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the MIDI corpus, searched recursively.
    /// Default: ./Midi Files
    #[serde(default = "PathsConfig::default_corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Vocabulary, corpus and predictor artifacts.
    /// Default: ~/.local/share/noteloom
    #[serde(default = "PathsConfig::default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl PathsConfig {
    fn default_corpus_dir() -> PathBuf {
        PathBuf::from("Midi Files")
    }

    fn default_artifacts_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join("noteloom"))
            .unwrap_or_else(|| PathBuf::from(".noteloom"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            corpus_dir: Self::default_corpus_dir(),
            artifacts_dir: Self::default_artifacts_dir(),
        }
    }
}

/// Windowing and generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Context window length. Default: 100
    #[serde(default = "PipelineConfig::default_sequence_length")]
    pub sequence_length: usize,

    /// Tokens generated per run. Default: 500
    #[serde(default = "PipelineConfig::default_num_tokens")]
    pub num_tokens: usize,

    /// Offset between decoded events, in quarter lengths. Default: 0.5
    #[serde(default = "PipelineConfig::default_step")]
    pub step: f64,

    /// Longest context the bundled n-gram predictor conditions on.
    /// Default: 3
    #[serde(default = "PipelineConfig::default_markov_order")]
    pub markov_order: usize,
}

impl PipelineConfig {
    fn default_sequence_length() -> usize {
        100
    }

    fn default_num_tokens() -> usize {
        500
    }

    fn default_step() -> f64 {
        0.5
    }

    fn default_markov_order() -> usize {
        3
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sequence_length: Self::default_sequence_length(),
            num_tokens: Self::default_num_tokens(),
            step: Self::default_step(),
            markov_order: Self::default_markov_order(),
        }
    }
}

/// MIDI output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Default: 120
    #[serde(default = "RenderConfig::default_tempo_bpm")]
    pub tempo_bpm: f64,

    /// Ticks per quarter note. Default: 480
    #[serde(default = "RenderConfig::default_ppq")]
    pub ppq: u16,

    /// Sounding length of each note in quarter lengths. Default: 1.0
    #[serde(default = "RenderConfig::default_note_length")]
    pub note_length: f64,

    /// Default: 90
    #[serde(default = "RenderConfig::default_velocity")]
    pub velocity: u8,

    /// GM program for the output track. Default: 0 (piano)
    #[serde(default)]
    pub program: u8,
}

impl RenderConfig {
    fn default_tempo_bpm() -> f64 {
        120.0
    }

    fn default_ppq() -> u16 {
        480
    }

    fn default_note_length() -> f64 {
        1.0
    }

    fn default_velocity() -> u8 {
        90
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: Self::default_tempo_bpm(),
            ppq: Self::default_ppq(),
            note_length: Self::default_note_length(),
            velocity: Self::default_velocity(),
            program: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `RUST_LOG` style filter). Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
