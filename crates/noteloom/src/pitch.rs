//! Pitches, canonical pitch names, and pitch-class normal order.
//!
//! Names use `#` for sharps and `-` for flats with MIDI 60 = `C4`.
//! Each pitch class has one canonical spelling, so names produced here
//! for octave 0 and above parse back to the same pitch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Canonical spelling for each pitch class, C = 0.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "E-", "E", "F", "F#", "G", "G#", "A", "B-", "B",
];

/// A single pitch as a MIDI note number (0–127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pitch(u8);

impl Pitch {
    /// Middle C.
    pub const MIDDLE_C: Pitch = Pitch(60);

    /// Build a pitch from a MIDI note number, rejecting values above 127.
    pub fn from_midi(midi: u8) -> Option<Self> {
        (midi <= 127).then_some(Pitch(midi))
    }

    /// The pitch class `pc` (taken mod 12) in octave 4.
    pub fn from_pitch_class(pc: u8) -> Self {
        Pitch(60 + pc % 12)
    }

    pub fn midi(self) -> u8 {
        self.0
    }

    pub fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Whether [`name`](Self::name) parses back to this pitch. Octave -1
    /// (MIDI 0-11) does not: the minus sign reads as a flat.
    pub fn has_round_trip_name(self) -> bool {
        self.octave() >= 0
    }

    /// Canonical name, e.g. `C4`, `E-4`, `F#2`.
    pub fn name(self) -> String {
        format!(
            "{}{}",
            PITCH_CLASS_NAMES[self.pitch_class() as usize],
            self.octave()
        )
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Why a pitch name failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PitchParseError {
    #[error("empty pitch name")]
    Empty,
    #[error("unknown step {0:?}")]
    UnknownStep(char),
    #[error("invalid octave {0:?}")]
    InvalidOctave(String),
    #[error("pitch is outside the MIDI range 0-127")]
    OutOfRange,
}

impl FromStr for Pitch {
    type Err = PitchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let step = chars.next().ok_or(PitchParseError::Empty)?;
        let base: i32 = match step.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            other => return Err(PitchParseError::UnknownStep(other)),
        };

        let rest = chars.as_str();
        let accidental_len = rest
            .find(|c: char| !matches!(c, '#' | '-' | 'b'))
            .unwrap_or(rest.len());
        let (accidentals, octave) = rest.split_at(accidental_len);

        // "-" is always a flat, so octaves below zero do not parse back.
        let mut alter: i32 = 0;
        for c in accidentals.chars() {
            match c {
                '#' => alter += 1,
                '-' | 'b' => alter -= 1,
                _ => unreachable!("accidental run only holds #, - and b"),
            }
        }

        let octave: i32 = if octave.is_empty() {
            4
        } else {
            octave
                .parse()
                .map_err(|_| PitchParseError::InvalidOctave(octave.to_string()))?
        };

        let midi = (octave + 1) * 12 + base + alter;
        if !(0..=127).contains(&midi) {
            return Err(PitchParseError::OutOfRange);
        }
        Ok(Pitch(midi as u8))
    }
}

/// Normal order of a pitch-class set.
///
/// Pitch classes are reduced mod 12 and deduplicated, then rotated to the
/// most compact ordering. Ties on span are broken by the interval from the
/// first element to the second-to-last, then to the third-to-last, and so
/// on. Fully symmetric sets start on their lowest pitch class.
pub fn normal_order(pitch_classes: impl IntoIterator<Item = u8>) -> Vec<u8> {
    let pcs: Vec<u8> = pitch_classes
        .into_iter()
        .map(|p| p % 12)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let n = pcs.len();
    if n <= 1 {
        return pcs;
    }

    (0..n)
        .map(|start| (0..n).map(|k| pcs[(start + k) % n]).collect::<Vec<u8>>())
        .min_by_key(|rotation| {
            let first = rotation[0];
            // Intervals from the first element, read from the last backwards.
            let key: Vec<u8> = rotation[1..]
                .iter()
                .rev()
                .map(|&pc| (pc + 12 - first) % 12)
                .collect();
            (key, first)
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_for_midi_numbers() {
        assert_eq!(Pitch::MIDDLE_C.name(), "C4");
        assert_eq!(Pitch::from_midi(61).unwrap().name(), "C#4");
        assert_eq!(Pitch::from_midi(63).unwrap().name(), "E-4");
        assert_eq!(Pitch::from_midi(70).unwrap().name(), "B-4");
        assert_eq!(Pitch::from_midi(21).unwrap().name(), "A0");
        assert_eq!(Pitch::from_midi(0).unwrap().name(), "C-1");
        assert!(Pitch::from_midi(128).is_none());
    }

    #[test]
    fn parse_canonical_and_alternate_spellings() {
        assert_eq!("C4".parse::<Pitch>().unwrap().midi(), 60);
        assert_eq!("E-4".parse::<Pitch>().unwrap().midi(), 63);
        assert_eq!("D#4".parse::<Pitch>().unwrap().midi(), 63);
        assert_eq!("Bb3".parse::<Pitch>().unwrap().midi(), 58);
        assert_eq!("f#2".parse::<Pitch>().unwrap().midi(), 42);
        assert_eq!("G##4".parse::<Pitch>().unwrap().midi(), 69);
        assert_eq!("A".parse::<Pitch>().unwrap().midi(), 69);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Pitch>(), Err(PitchParseError::Empty));
        assert_eq!("H4".parse::<Pitch>(), Err(PitchParseError::UnknownStep('H')));
        assert!(matches!(
            "C4x".parse::<Pitch>(),
            Err(PitchParseError::InvalidOctave(_))
        ));
        assert_eq!("G9".parse::<Pitch>().unwrap().midi(), 127);
        assert_eq!("G#9".parse::<Pitch>(), Err(PitchParseError::OutOfRange));
    }

    #[test]
    fn every_midi_name_round_trips() {
        for midi in 0..=127u8 {
            let pitch = Pitch::from_midi(midi).unwrap();
            let parsed = pitch.name().parse::<Pitch>();
            if pitch.has_round_trip_name() {
                assert_eq!(parsed.unwrap(), pitch, "{}", pitch);
            } else {
                assert_ne!(parsed.ok(), Some(pitch), "{}", pitch);
            }
        }
        assert!(!Pitch::from_midi(11).unwrap().has_round_trip_name());
        assert!(Pitch::from_midi(12).unwrap().has_round_trip_name());
    }

    #[test]
    fn normal_order_triads() {
        assert_eq!(normal_order([60, 64, 67]), vec![0, 4, 7]);
        assert_eq!(normal_order([67, 71, 74]), vec![7, 11, 2]);
        // First inversion of C major reduces to the same set.
        assert_eq!(normal_order([64, 67, 72]), vec![0, 4, 7]);
    }

    #[test]
    fn normal_order_seventh_chord() {
        // C7: the most compact rotation starts on E.
        assert_eq!(normal_order([0, 4, 7, 10]), vec![4, 7, 10, 0]);
    }

    #[test]
    fn normal_order_symmetric_sets_start_lowest() {
        assert_eq!(normal_order([8, 0, 4]), vec![0, 4, 8]);
        assert_eq!(normal_order([3, 6, 9, 0]), vec![0, 3, 6, 9]);
    }

    #[test]
    fn normal_order_doublings_and_singletons() {
        assert_eq!(normal_order([48, 60, 72]), vec![0]);
        assert!(normal_order(std::iter::empty()).is_empty());
    }
}
