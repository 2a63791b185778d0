use crate::note::TimedNote;
use midly::{MidiMessage, Smf, TrackEventKind};
use std::collections::HashMap;

/// Every sounding note onset in the file, sorted by tick, then pitch, then
/// channel.
///
/// Only note-ons with non-zero velocity count; durations are not kept.
/// Program changes are tracked per channel and carry over between tracks
/// in file order.
pub fn extract_notes(smf: &Smf) -> Vec<TimedNote> {
    let mut notes = Vec::new();
    let mut programs: HashMap<u8, u8> = HashMap::new();

    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());

            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let channel = channel.as_int();
            match message {
                MidiMessage::ProgramChange { program } => {
                    programs.insert(channel, program.as_int());
                }
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    notes.push(TimedNote {
                        onset_tick: tick,
                        pitch: key.as_int(),
                        channel,
                        program: programs.get(&channel).copied().unwrap_or(0),
                    });
                }
                _ => {}
            }
        }
    }

    notes.sort_by(|a, b| {
        a.onset_tick
            .cmp(&b.onset_tick)
            .then(a.pitch.cmp(&b.pitch))
            .then(a.channel.cmp(&b.channel))
    });
    notes
}
