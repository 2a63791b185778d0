use crate::pitch::{normal_order, Pitch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between pitch classes in a chord token.
pub const CHORD_DELIMITER: char = '.';

/// An opaque event symbol.
///
/// Note tokens are canonical pitch names (`C4`, `E-4`); chord tokens are
/// normal-order pitch classes joined by [`CHORD_DELIMITER`] (`4.7.10.0`).
/// Tokens order and compare by their exact string value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Token for a single pitch, `None` below octave 0 where the name
    /// would not decode back to the same pitch.
    pub fn note(pitch: Pitch) -> Option<Self> {
        pitch.has_round_trip_name().then(|| Token(pitch.name()))
    }

    /// Token for a set of simultaneous pitches, `None` if the set is empty.
    pub fn chord(pitches: &[Pitch]) -> Option<Self> {
        let order = normal_order(pitches.iter().map(|p| p.pitch_class()));
        if order.is_empty() {
            return None;
        }
        let parts: Vec<String> = order.iter().map(|pc| pc.to_string()).collect();
        Some(Token(parts.join(CHORD_DELIMITER.to_string().as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the decoder reads this token as a chord: it contains the
    /// delimiter or is made only of ASCII digits.
    ///
    /// A single-pitch-class chord such as `"7"` has no delimiter, which is
    /// why all-digit tokens count as chords.
    pub fn is_chord(&self) -> bool {
        self.0.contains(CHORD_DELIMITER)
            || (!self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitches(midi: &[u8]) -> Vec<Pitch> {
        midi.iter().map(|&m| Pitch::from_midi(m).unwrap()).collect()
    }

    #[test]
    fn note_token_is_pitch_name() {
        assert_eq!(Token::note(Pitch::from_midi(63).unwrap()).unwrap().as_str(), "E-4");
    }

    #[test]
    fn chord_token_uses_normal_order() {
        assert_eq!(Token::chord(&pitches(&[60, 64, 67])).unwrap().as_str(), "0.4.7");
        assert_eq!(Token::chord(&pitches(&[55, 59, 62])).unwrap().as_str(), "7.11.2");
        assert_eq!(Token::chord(&pitches(&[48, 60])).unwrap().as_str(), "0");
        assert!(Token::chord(&[]).is_none());
    }

    #[test]
    fn chord_detection_heuristic() {
        assert!(Token::from("0.4.7").is_chord());
        assert!(Token::from("11").is_chord());
        assert!(!Token::from("C4").is_chord());
        assert!(!Token::from("E-4").is_chord());
        assert!(!Token::from("").is_chord());
    }

    #[test]
    fn tokens_sort_by_string() {
        let mut tokens = vec![Token::from("C4"), Token::from("0.4.7"), Token::from("B-3")];
        tokens.sort();
        assert_eq!(
            tokens,
            vec![Token::from("0.4.7"), Token::from("B-3"), Token::from("C4")]
        );
    }
}
