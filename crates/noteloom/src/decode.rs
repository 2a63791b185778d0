//! Token-to-event decoding.
//!
//! Offsets are positional: token `i` sounds at `i * step` quarter lengths.
//! A malformed token aborts decoding rather than being skipped, since
//! dropping it would shift every later offset.

use crate::pitch::Pitch;
use crate::token::{Token, CHORD_DELIMITER};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Instrument tag carried by every decoded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// General MIDI program number (0-127).
    pub program: u8,
    pub name: String,
}

impl Instrument {
    pub fn new(program: u8, name: impl Into<String>) -> Self {
        Self {
            program: program.min(127),
            name: name.into(),
        }
    }

    pub fn piano() -> Self {
        Self::new(0, "Piano")
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::piano()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "pitches", rename_all = "snake_case")]
pub enum EventKind {
    Note(Pitch),
    /// Simultaneous pitches in token order.
    Chord(Vec<Pitch>),
}

impl EventKind {
    pub fn pitches(&self) -> &[Pitch] {
        match self {
            EventKind::Note(p) => std::slice::from_ref(p),
            EventKind::Chord(ps) => ps,
        }
    }
}

/// A decoded note or chord at a time offset in quarter lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub offset: f64,
    pub kind: EventKind,
    pub instrument: Instrument,
}

#[derive(Debug, Clone)]
pub struct Decoder {
    step: f64,
    instrument: Instrument,
}

impl Decoder {
    /// `step` is the offset increment per token, in quarter lengths.
    pub fn new(step: f64) -> Result<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(Error::InvalidStep(step));
        }
        Ok(Self {
            step,
            instrument: Instrument::piano(),
        })
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn decode(&self, tokens: &[Token]) -> Result<Vec<OutputEvent>> {
        let events = tokens
            .iter()
            .enumerate()
            .map(|(position, token)| {
                Ok(OutputEvent {
                    offset: position as f64 * self.step,
                    kind: decode_token(token, position)?,
                    instrument: self.instrument.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(events = events.len(), step = self.step, "decoded");
        Ok(events)
    }
}

/// Decode with the default piano instrument.
pub fn decode(tokens: &[Token], step: f64) -> Result<Vec<OutputEvent>> {
    Decoder::new(step)?.decode(tokens)
}

fn decode_token(token: &Token, position: usize) -> Result<EventKind> {
    let fail = |reason: String| Error::Decode {
        token: token.to_string(),
        position,
        reason,
    };

    if token.is_chord() {
        let pitches = token
            .as_str()
            .split(CHORD_DELIMITER)
            .map(|part| {
                let pc: u8 = part
                    .parse()
                    .map_err(|_| fail(format!("chord component {part:?} is not an integer")))?;
                if pc >= 12 {
                    return Err(fail(format!("pitch class {pc} is out of range 0-11")));
                }
                Ok(Pitch::from_pitch_class(pc))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EventKind::Chord(pitches))
    } else {
        token
            .as_str()
            .parse::<Pitch>()
            .map(EventKind::Note)
            .map_err(|e| fail(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(names: &[&str]) -> Vec<Token> {
        names.iter().map(|n| Token::from(*n)).collect()
    }

    #[test]
    fn chord_token_becomes_chord() {
        let events = decode(&toks(&["0.4.7"]), 0.5).unwrap();
        assert_eq!(events.len(), 1);
        let pcs: Vec<u8> = events[0].kind.pitches().iter().map(|p| p.pitch_class()).collect();
        assert_eq!(pcs, vec![0, 4, 7]);
        assert!(matches!(events[0].kind, EventKind::Chord(_)));
        assert_eq!(events[0].offset, 0.0);
    }

    #[test]
    fn numeric_token_is_single_note_chord() {
        let events = decode(&toks(&["7"]), 1.0).unwrap();
        assert_eq!(
            events[0].kind,
            EventKind::Chord(vec![Pitch::from_midi(67).unwrap()])
        );
    }

    #[test]
    fn chord_keeps_token_order() {
        let events = decode(&toks(&["4.7.10.0"]), 1.0).unwrap();
        let midi: Vec<u8> = events[0].kind.pitches().iter().map(|p| p.midi()).collect();
        assert_eq!(midi, vec![64, 67, 70, 60]);
    }

    #[test]
    fn notes_round_trip_with_constant_step() {
        let names = ["C4", "E-4", "G4", "B-3", "F#5", "A0"];
        let pitches: Vec<Pitch> = names.iter().map(|n| n.parse().unwrap()).collect();
        let tokens: Vec<Token> = pitches.iter().map(|&p| Token::note(p).unwrap()).collect();

        let events = decode(&tokens, 0.5).unwrap();

        let decoded: Vec<String> = events
            .iter()
            .map(|e| match &e.kind {
                EventKind::Note(p) => p.name(),
                other => panic!("expected note, got {other:?}"),
            })
            .collect();
        assert_eq!(decoded, names.to_vec());

        let offsets: Vec<f64> = events.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);
        assert!(events.iter().all(|e| e.instrument == Instrument::piano()));
    }

    #[test]
    fn custom_instrument() {
        let decoder = Decoder::new(0.25)
            .unwrap()
            .with_instrument(Instrument::new(40, "Violin"));
        let events = decoder.decode(&toks(&["A4", "0.3.7"])).unwrap();
        assert!(events.iter().all(|e| e.instrument.program == 40));
        assert_eq!(events[1].offset, 0.25);
    }

    #[test]
    fn malformed_tokens_report_position() {
        let err = decode(&toks(&["C4", "E4", "Q4", "G4"]), 0.5).unwrap_err();
        match err {
            Error::Decode {
                token, position, ..
            } => {
                assert_eq!(token, "Q4");
                assert_eq!(position, 2);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            decode(&toks(&["0.x.7"]), 0.5),
            Err(Error::Decode { position: 0, .. })
        ));
        assert!(matches!(
            decode(&toks(&["C4", "0.13"]), 0.5),
            Err(Error::Decode { position: 1, .. })
        ));
        assert!(matches!(
            decode(&toks(&["0..4"]), 0.5),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(decode(&toks(&[""]), 0.5), Err(Error::Decode { .. })));
    }

    #[test]
    fn step_must_be_positive() {
        assert!(matches!(Decoder::new(0.0), Err(Error::InvalidStep(_))));
        assert!(matches!(Decoder::new(-1.0), Err(Error::InvalidStep(_))));
        assert!(matches!(Decoder::new(f64::NAN), Err(Error::InvalidStep(_))));
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(decode(&[], 0.5).unwrap().is_empty());
    }
}
