use crate::{Error, Result};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use noteloom::{Instrument, OutputEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Options for rendering decoded events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Ticks per quarter note. Default: 480.
    pub ppq: u16,
    /// Default: 120.
    pub tempo_bpm: f64,
    /// Sounding length of every note, in quarter lengths. Default: 1.0.
    pub note_length: f64,
    /// Note-on velocity. Default: 90.
    pub velocity: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ppq: 480,
            tempo_bpm: 120.0,
            note_length: 1.0,
            velocity: 90,
        }
    }
}

impl RenderOptions {
    fn validate(&self) -> Result<()> {
        if self.ppq == 0 || self.ppq > 0x7FFF {
            return Err(Error::InvalidRender(format!("ppq {} out of range", self.ppq)));
        }
        if !(self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0) {
            return Err(Error::InvalidRender(format!(
                "tempo {} must be positive",
                self.tempo_bpm
            )));
        }
        if !(self.note_length.is_finite() && self.note_length > 0.0) {
            return Err(Error::InvalidRender(format!(
                "note length {} must be positive",
                self.note_length
            )));
        }
        Ok(())
    }

    fn ticks(&self, quarters: f64) -> u64 {
        (quarters * self.ppq as f64).round().max(0.0) as u64
    }
}

/// Largest delta time a track event can carry.
const MAX_DELTA: u64 = 0x0FFF_FFFF;

/// Render decoded events to Standard MIDI File format 1 bytes.
///
/// Track 0: tempo. Track 1: the instrument of the first event (piano when
/// there are none), with track name, program change and note events on
/// channel 0. A note is cut short where the same pitch sounds again.
pub fn events_to_midi(events: &[OutputEvent], options: &RenderOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let instrument = events
        .first()
        .map(|e| e.instrument.clone())
        .unwrap_or_default();

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(options.ppq)),
    ));
    smf.tracks.push(tempo_track(options.tempo_bpm));
    smf.tracks.push(instrument_track(events, &instrument, options)?);

    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| Error::MidiWrite(e.to_string()))?;
    Ok(buf)
}

/// Render and write to `path`.
pub fn write_midi(path: &Path, events: &[OutputEvent], options: &RenderOptions) -> Result<()> {
    let bytes = events_to_midi(events, options)?;
    std::fs::write(path, &bytes).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        events = events.len(),
        bytes = bytes.len(),
        "wrote MIDI file"
    );
    Ok(())
}

fn tempo_track(bpm: f64) -> Track<'static> {
    let usec = (60_000_000.0 / bpm).round().clamp(1.0, 0xFF_FFFF as f64) as u32;
    vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(usec))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]
}

fn instrument_track<'a>(
    events: &[OutputEvent],
    instrument: &'a Instrument,
    options: &RenderOptions,
) -> Result<Track<'a>> {
    let channel = u4::new(0);
    let mut messages: Vec<(u64, TrackEventKind<'a>)> = vec![
        (0, TrackEventKind::Meta(MetaMessage::TrackName(instrument.name.as_bytes()))),
        (
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(instrument.program & 0x7F),
                },
            },
        ),
    ];

    let length = options.ticks(options.note_length).max(1);
    let mut onsets: Vec<(u64, u8)> = events
        .iter()
        .flat_map(|e| {
            let tick = options.ticks(e.offset);
            e.kind.pitches().iter().map(move |p| (tick, p.midi()))
        })
        .collect();
    onsets.sort_unstable();
    onsets.dedup();

    // Next onset of each pitch, scanning backwards.
    let mut next_same: HashMap<u8, u64> = HashMap::new();
    let mut notes: Vec<(u64, u64, u8)> = Vec::with_capacity(onsets.len());
    for &(tick, pitch) in onsets.iter().rev() {
        let mut end = tick + length;
        if let Some(&next) = next_same.get(&pitch) {
            end = end.min(next);
        }
        next_same.insert(pitch, tick);
        notes.push((tick, end, pitch));
    }
    notes.reverse();

    let vel = u7::new(options.velocity.clamp(1, 127));
    for (on, off, pitch) in notes {
        let key = u7::new(pitch);
        messages.push((
            on,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            },
        ));
        messages.push((
            off,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel: u7::new(0) },
            },
        ));
    }

    // Meta first, then note-offs, then note-ons at the same tick
    messages.sort_by_key(|(tick, kind)| {
        let rank = match kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOff { .. },
                ..
            } => 1,
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { .. },
                ..
            } => 2,
            _ => 0,
        };
        (*tick, rank)
    });

    let mut track = Vec::with_capacity(messages.len() + 1);
    let mut last_tick = 0u64;
    for (tick, kind) in messages {
        let delta = tick - last_tick;
        if delta > MAX_DELTA {
            return Err(Error::InvalidRender(format!(
                "gap of {delta} ticks at tick {tick} exceeds the MIDI delta limit"
            )));
        }
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(track)
}
