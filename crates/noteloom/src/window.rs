//! Sliding-window training pairs.
//!
//! For a stream of `L` tokens and window size `S`, every start position
//! `i` in `0..L-S` yields an input window of the `S` indices starting at
//! `i` and a one-hot target for index `i + S`. Inputs are divided by the
//! vocabulary size with [`normalize`], the same function the generator
//! uses at inference time.

use crate::token::Token;
use crate::vocab::Vocabulary;
use crate::{Error, Result};
use ndarray::{s, Array2, Array3, ArrayView1, Axis};
use tracing::info;

/// Supervised training data derived from one token stream.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// `(pairs, sequence_length, 1)`, values in `[0, 1)`.
    pub inputs: Array3<f32>,
    /// `(pairs, vocabulary.len())`, one-hot.
    pub targets: Array2<f32>,
    pub vocabulary: Vocabulary,
    /// The whole stream as vocabulary indices. Doubles as the reference
    /// corpus for random generation seeds.
    pub indices: Vec<usize>,
    pub sequence_length: usize,
}

impl TrainingSet {
    pub fn pairs(&self) -> usize {
        self.inputs.len_of(Axis(0))
    }

    /// Normalized input window of pair `i`.
    pub fn input_window(&self, i: usize) -> Vec<f32> {
        self.inputs.slice(s![i, .., 0]).to_vec()
    }

    /// Target index of pair `i`.
    pub fn target_index(&self, i: usize) -> usize {
        self.indices[i + self.sequence_length]
    }
}

/// Scale indices into `[0, 1)` by dividing by the vocabulary size.
pub fn normalize(indices: impl IntoIterator<Item = usize>, size: usize) -> Vec<f32> {
    let size = size as f32;
    indices.into_iter().map(|i| i as f32 / size).collect()
}

/// Build the vocabulary and all window/target pairs for `tokens`.
///
/// A stream no longer than `sequence_length` produces zero pairs.
pub fn prepare(tokens: &[Token], sequence_length: usize) -> Result<TrainingSet> {
    if sequence_length == 0 {
        return Err(Error::InvalidSequenceLength);
    }

    let vocabulary = Vocabulary::build(tokens);
    let indices = vocabulary.encode(tokens)?;
    let size = vocabulary.len();
    let pairs = indices.len().saturating_sub(sequence_length);

    let mut inputs = Array3::<f32>::zeros((pairs, sequence_length, 1));
    let mut targets = Array2::<f32>::zeros((pairs, size));

    for i in 0..pairs {
        let window = normalize(indices[i..i + sequence_length].iter().copied(), size);
        inputs
            .slice_mut(s![i, .., 0])
            .assign(&ArrayView1::from(window.as_slice()));
        targets[[i, indices[i + sequence_length]]] = 1.0;
    }

    info!(
        tokens = tokens.len(),
        vocabulary = size,
        pairs,
        sequence_length,
        "training pairs prepared"
    );

    Ok(TrainingSet {
        inputs,
        targets,
        vocabulary,
        indices,
        sequence_length,
    })
}
