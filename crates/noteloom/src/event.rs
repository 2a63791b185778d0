use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};

/// One parsed event from a symbolic music file, in performance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SymbolicEvent {
    /// A single sounding pitch.
    Note { pitch: Pitch },
    /// Pitches starting together.
    Chord { pitches: Vec<Pitch> },
    /// Anything the tokenizer has no token for (rests, markers, ...).
    Other { kind: String },
}

impl SymbolicEvent {
    pub fn note(pitch: Pitch) -> Self {
        SymbolicEvent::Note { pitch }
    }

    pub fn chord(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        SymbolicEvent::Chord {
            pitches: pitches.into_iter().collect(),
        }
    }
}
