//! MIDI side of the noteloom pipeline.
//!
//! Discovers `.mid` files, turns each into the symbolic events of its first
//! instrument part, and renders decoded events back to a format-1 file.

pub mod corpus;
pub mod events;
pub mod extract;
pub mod gm;
pub mod midi_writer;
pub mod note;

pub use corpus::{discover, is_midi_file, MidiParser};
pub use events::{events_from_bytes, group_onsets, partition_by_program};
pub use extract::extract_notes;
pub use midi_writer::{events_to_midi, write_midi, RenderOptions};
pub use note::{Part, TimedNote, PERCUSSION_CHANNEL};

use std::path::PathBuf;

/// Errors from MIDI corpus operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("corpus root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("corpus walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid render options: {0}")]
    InvalidRender(String),

    #[error("MIDI write error: {0}")]
    MidiWrite(String),
}

pub type Result<T> = std::result::Result<T, Error>;
