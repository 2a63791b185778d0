//! Greedy autoregressive generation.
//!
//! Each step feeds the normalized rolling context to the predictor, takes
//! the argmax of the returned distribution, emits its token, and slides
//! the context by one. There is no sampling and no backtracking: the same
//! seed, vocabulary and predictor always give the same output.

use crate::context::RollingContext;
use crate::predictor::{argmax, Predictor};
use crate::token::Token;
use crate::vocab::Vocabulary;
use crate::{Error, Result};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Drives a [`Predictor`] over a rolling window of vocabulary indices.
///
/// The vocabulary and the optional reference corpus are only borrowed, so
/// any number of generators can share them.
pub struct Generator<'a, P: ?Sized> {
    vocabulary: &'a Vocabulary,
    predictor: &'a P,
    sequence_length: usize,
    reference: Option<&'a [usize]>,
}

impl<'a, P: Predictor + ?Sized> Generator<'a, P> {
    pub fn new(vocabulary: &'a Vocabulary, predictor: &'a P, sequence_length: usize) -> Result<Self> {
        if sequence_length == 0 {
            return Err(Error::InvalidSequenceLength);
        }
        if vocabulary.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        Ok(Self {
            vocabulary,
            predictor,
            sequence_length,
            reference: None,
        })
    }

    /// Attach the index stream that random seed windows are drawn from.
    pub fn with_reference(mut self, indices: &'a [usize]) -> Self {
        self.reference = Some(indices);
        self
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Generate `num_tokens` tokens.
    ///
    /// With `seed`, the context starts from those indices; otherwise a
    /// window is drawn uniformly from the reference corpus with `rng`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        num_tokens: usize,
        seed: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<Vec<Token>> {
        let context = self.initial_context(seed, rng)?;
        self.run(context, num_tokens, None)
    }

    /// Like [`generate`](Self::generate), checking `cancel` before every
    /// predictor call.
    pub fn generate_cancellable<R: Rng + ?Sized>(
        &self,
        num_tokens: usize,
        seed: Option<&[usize]>,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<Vec<Token>> {
        let context = self.initial_context(seed, rng)?;
        self.run(context, num_tokens, Some(cancel))
    }

    /// Build the starting context from a seed or the reference corpus.
    pub fn initial_context<R: Rng + ?Sized>(
        &self,
        seed: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<RollingContext> {
        let window = match seed {
            Some(seed) => seed,
            None => {
                let reference = self.reference.ok_or(Error::NoSeedSource)?;
                if reference.len() < self.sequence_length {
                    return Err(Error::ReferenceTooShort {
                        len: reference.len(),
                        sequence_length: self.sequence_length,
                    });
                }
                let start = rng.random_range(0..=reference.len() - self.sequence_length);
                debug!(start, "drew seed window from reference corpus");
                &reference[start..start + self.sequence_length]
            }
        };

        if window.len() != self.sequence_length {
            return Err(Error::InvalidSeed {
                reason: format!(
                    "expected {} indices, got {}",
                    self.sequence_length,
                    window.len()
                ),
            });
        }
        let size = self.vocabulary.len();
        if let Some((position, &index)) = window.iter().enumerate().find(|(_, &i)| i >= size) {
            return Err(Error::InvalidSeed {
                reason: format!(
                    "index {index} at position {position} is outside vocabulary of size {size}"
                ),
            });
        }

        RollingContext::new(window.iter().copied()).ok_or(Error::InvalidSequenceLength)
    }

    fn run(
        &self,
        mut context: RollingContext,
        num_tokens: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Token>> {
        let size = self.vocabulary.len();
        let mut output = Vec::with_capacity(num_tokens);

        for step in 0..num_tokens {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                info!(completed = step, "generation cancelled");
                return Err(Error::Cancelled { completed: step });
            }

            let distribution = self.predictor.predict(&context.normalized(size));
            if distribution.len() != size {
                return Err(Error::PredictorContract {
                    step,
                    expected: size,
                    actual: distribution.len(),
                });
            }
            if let Some(index) = distribution.iter().position(|p| !p.is_finite()) {
                return Err(Error::NonFiniteDistribution { step, index });
            }

            let index = argmax(&distribution).ok_or(Error::EmptyVocabulary)?;
            let token = self.vocabulary.token_of(index)?;
            debug!(step, index, token = token.as_str(), "generated");
            output.push(token.clone());
            context.push(index);
        }

        info!(tokens = output.len(), "generation complete");
        Ok(output)
    }
}
