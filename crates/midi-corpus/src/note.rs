use serde::{Deserialize, Serialize};

/// MIDI channel reserved for percussion (channel 10, zero-based).
pub const PERCUSSION_CHANNEL: u8 = 9;

/// A note onset at an absolute tick, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedNote {
    pub onset_tick: u64,
    pub pitch: u8,
    pub channel: u8,
    /// GM program active on the channel at onset; 0 until a program change.
    pub program: u8,
}

impl TimedNote {
    pub fn is_percussion(&self) -> bool {
        self.channel == PERCUSSION_CHANNEL
    }
}

/// Notes that share one GM program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub program: u8,
    pub notes: Vec<TimedNote>,
}
