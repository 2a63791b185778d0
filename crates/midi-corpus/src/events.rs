//! MIDI notes to symbolic events.
//!
//! A file is split into parts by GM program, ignoring the percussion
//! channel. Only the first part (the one whose first note sounds earliest)
//! is tokenized, ties going to the lower pitch. A file without program
//! changes is a single piano part.
//! Within the part, notes that start on the same tick form one chord.

use crate::extract::extract_notes;
use crate::gm;
use crate::note::{Part, TimedNote};
use crate::{Error, Result};
use midly::Smf;
use noteloom::{Pitch, SymbolicEvent};
use tracing::debug;

/// Split notes into parts by program, in order of each part's first onset.
///
/// Percussion notes are dropped. Input must be sorted by onset, as
/// [`extract_notes`] returns it.
pub fn partition_by_program(notes: &[TimedNote]) -> Vec<Part> {
    let mut parts: Vec<Part> = Vec::new();
    for note in notes.iter().filter(|n| !n.is_percussion()) {
        match parts.iter_mut().find(|p| p.program == note.program) {
            Some(part) => part.notes.push(note.clone()),
            None => parts.push(Part {
                program: note.program,
                notes: vec![note.clone()],
            }),
        }
    }
    parts
}

/// Group notes by onset tick: one pitch is a note, several are a chord.
///
/// Duplicate pitches at one onset (unisons across channels) collapse.
pub fn group_onsets(notes: &[TimedNote]) -> Vec<SymbolicEvent> {
    let mut events = Vec::new();
    let mut i = 0;
    while i < notes.len() {
        let onset = notes[i].onset_tick;
        let mut pitches: Vec<u8> = notes[i..]
            .iter()
            .take_while(|n| n.onset_tick == onset)
            .map(|n| n.pitch)
            .collect();
        i += pitches.len();

        pitches.sort_unstable();
        pitches.dedup();
        let pitches: Vec<Pitch> = pitches.into_iter().filter_map(Pitch::from_midi).collect();
        match pitches.len() {
            0 => {}
            1 => events.push(SymbolicEvent::note(pitches[0])),
            _ => events.push(SymbolicEvent::chord(pitches)),
        }
    }
    events
}

/// Parse MIDI bytes into the events of the first instrument part.
pub fn events_from_bytes(bytes: &[u8]) -> Result<Vec<SymbolicEvent>> {
    let smf = Smf::parse(bytes).map_err(|e| Error::MidiParse(e.to_string()))?;
    let notes = extract_notes(&smf);
    let parts = partition_by_program(&notes);

    let Some(first) = parts.first() else {
        debug!(tracks = smf.tracks.len(), "no pitched notes");
        return Ok(Vec::new());
    };
    debug!(
        parts = parts.len(),
        program = first.program,
        instrument = gm::program_name(first.program),
        notes = first.notes.len(),
        "selected first part"
    );
    Ok(group_onsets(&first.notes))
}
