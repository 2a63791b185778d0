//! Symbolic music sequence pipeline.
//!
//! Turns ordered note/chord events into an opaque token stream, builds a
//! stable vocabulary over it, slices training windows, drives a black-box
//! [`Predictor`] through greedy autoregressive generation, and decodes the
//! generated tokens back into timed events.
//!
//! # Example
//!
//! ```
//! use noteloom::{prepare, Decoder, Generator, Predictor, Token};
//!
//! struct Repeat(usize, usize);
//!
//! impl Predictor for Repeat {
//!     fn predict(&self, _window: &[f32]) -> Vec<f32> {
//!         let mut out = vec![0.0; self.1];
//!         out[self.0] = 1.0;
//!         out
//!     }
//! }
//!
//! let tokens: Vec<Token> = ["C4", "E4", "G4", "C4"].iter().map(|t| Token::from(*t)).collect();
//! let set = prepare(&tokens, 2).unwrap();
//! assert_eq!(set.pairs(), 2);
//!
//! let g4 = set.vocabulary.index_of(&Token::from("G4")).unwrap();
//! let predictor = Repeat(g4, set.vocabulary.len());
//! let generator = Generator::new(&set.vocabulary, &predictor, 2).unwrap();
//! let mut rng = rand::rng();
//! let out = generator.generate(3, Some(&set.indices[..2]), &mut rng).unwrap();
//! assert_eq!(out, vec![Token::from("G4"); 3]);
//!
//! let events = Decoder::new(0.5).unwrap().decode(&out).unwrap();
//! assert_eq!(events[2].offset, 1.0);
//! ```

pub mod context;
pub mod decode;
pub mod event;
pub mod generate;
pub mod markov;
pub mod pitch;
pub mod predictor;
pub mod token;
pub mod tokenizer;
pub mod vocab;
pub mod window;

pub use context::RollingContext;
pub use decode::{decode, Decoder, EventKind, Instrument, OutputEvent};
pub use event::SymbolicEvent;
pub use generate::Generator;
pub use markov::MarkovPredictor;
pub use pitch::{normal_order, Pitch};
pub use predictor::{argmax, Predictor};
pub use token::{Token, CHORD_DELIMITER};
pub use tokenizer::{tokenize, tokenize_corpus, CorpusParser, CorpusTokens, ParseFailure};
pub use vocab::Vocabulary;
pub use window::{normalize, prepare, TrainingSet};

use std::path::PathBuf;

/// Errors from the sequence pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse {path}: {message}")]
    CorpusParse { path: PathBuf, message: String },

    #[error("token {token:?} is not in the vocabulary")]
    UnknownToken { token: String },

    #[error("index {index} is out of range for vocabulary of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("invalid seed: {reason}")]
    InvalidSeed { reason: String },

    #[error("no seed given and no reference corpus attached")]
    NoSeedSource,

    #[error("reference corpus has {len} indices, fewer than sequence length {sequence_length}")]
    ReferenceTooShort { len: usize, sequence_length: usize },

    #[error("predictor returned {actual} values at step {step}, expected {expected}")]
    PredictorContract {
        step: usize,
        expected: usize,
        actual: usize,
    },

    #[error("predictor returned a non-finite value at step {step}, index {index}")]
    NonFiniteDistribution { step: usize, index: usize },

    #[error("cannot decode token {token:?} at position {position}: {reason}")]
    Decode {
        token: String,
        position: usize,
        reason: String,
    },

    #[error("sequence length must be positive")]
    InvalidSequenceLength,

    #[error("predictor order must be positive")]
    InvalidOrder,

    #[error("decode step must be positive and finite, got {0}")]
    InvalidStep(f64),

    #[error("vocabulary is empty")]
    EmptyVocabulary,

    #[error("vocabulary artifact mismatch: {0}")]
    VocabularyMismatch(String),

    #[error("generation cancelled after {completed} tokens")]
    Cancelled { completed: usize },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
