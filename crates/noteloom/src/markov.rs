//! N-gram predictor over vocabulary indices.
//!
//! Counts which index follows each context of length 1..=order in a
//! reference index stream. Prediction looks up the longest suffix of the
//! incoming window that was observed, backing off to shorter contexts and
//! finally to the unigram distribution. It satisfies the same `Predictor`
//! contract as any trained model, so the generator cannot tell the two
//! apart.

use crate::predictor::Predictor;
use crate::vocab::Vocabulary;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Next-index counts for one context.
type TransitionTable = BTreeMap<usize, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovPredictor {
    vocabulary_size: usize,
    vocabulary_fingerprint: String,
    order: usize,
    /// `tables[k - 1]` maps an order-`k` context key to its transitions.
    tables: Vec<BTreeMap<String, TransitionTable>>,
    unigram: TransitionTable,
}

impl MarkovPredictor {
    /// Count transitions in `indices` for every context length up to `order`.
    pub fn fit(vocabulary: &Vocabulary, indices: &[usize], order: usize) -> Result<Self> {
        if order == 0 {
            return Err(Error::InvalidOrder);
        }
        let size = vocabulary.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= size) {
            return Err(Error::IndexOutOfRange { index, size });
        }

        let mut tables = vec![BTreeMap::<String, TransitionTable>::new(); order];
        let mut unigram = TransitionTable::new();

        for (pos, &next) in indices.iter().enumerate() {
            *unigram.entry(next).or_insert(0.0) += 1.0;
            for k in 1..=order.min(pos) {
                let key = context_key(&indices[pos - k..pos]);
                *tables[k - 1]
                    .entry(key)
                    .or_default()
                    .entry(next)
                    .or_insert(0.0) += 1.0;
            }
        }

        info!(
            order,
            vocabulary = size,
            contexts = tables.iter().map(|t| t.len()).sum::<usize>(),
            "markov predictor fit"
        );

        Ok(Self {
            vocabulary_size: size,
            vocabulary_fingerprint: vocabulary.fingerprint(),
            order,
            tables,
            unigram,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// Fingerprint of the vocabulary this model was fit against.
    pub fn vocabulary_fingerprint(&self) -> &str {
        &self.vocabulary_fingerprint
    }

    /// Distribution over next indices given a raw (unnormalized) context.
    pub fn distribution(&self, context: &[usize]) -> Vec<f32> {
        for k in (1..=self.order.min(context.len())).rev() {
            let key = context_key(&context[context.len() - k..]);
            if let Some(table) = self.tables[k - 1].get(&key) {
                if let Some(dist) = self.normalized(table) {
                    return dist;
                }
            }
        }
        self.normalized(&self.unigram)
            .unwrap_or_else(|| vec![1.0 / self.vocabulary_size as f32; self.vocabulary_size])
    }

    fn normalized(&self, table: &TransitionTable) -> Option<Vec<f32>> {
        let total: f64 = table.values().sum();
        if total <= 0.0 {
            return None;
        }
        let mut out = vec![0.0; self.vocabulary_size];
        for (&index, &count) in table {
            if let Some(slot) = out.get_mut(index) {
                *slot = (count / total) as f32;
            }
        }
        Some(out)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl Predictor for MarkovPredictor {
    fn predict(&self, window: &[f32]) -> Vec<f32> {
        let size = self.vocabulary_size as f32;
        let max = self.vocabulary_size.saturating_sub(1);
        let context: Vec<usize> = window
            .iter()
            .map(|&v| ((v * size).round().max(0.0) as usize).min(max))
            .collect();
        self.distribution(&context)
    }
}

/// Encode a context as a string key for BTreeMap lookup.
fn context_key(context: &[usize]) -> String {
    context
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::argmax;
    use crate::token::Token;
    use crate::window::normalize;

    fn vocab(n: usize) -> Vocabulary {
        let tokens: Vec<Token> = (0..n).map(|i| Token::from(format!("t{i:02}"))).collect();
        Vocabulary::build(&tokens)
    }

    #[test]
    fn context_key_format() {
        assert_eq!(context_key(&[2, 10, 3]), "2,10,3");
        assert_eq!(context_key(&[]), "");
    }

    #[test]
    fn learns_deterministic_cycle() {
        let v = vocab(4);
        let stream: Vec<usize> = (0..40).map(|i| i % 4).collect();
        let model = MarkovPredictor::fit(&v, &stream, 2).unwrap();

        for last in 0..4 {
            let window = normalize([(last + 3) % 4, last], 4);
            let dist = model.predict(&window);
            assert_eq!(dist.len(), 4);
            assert_eq!(argmax(&dist), Some((last + 1) % 4));
        }
    }

    #[test]
    fn backs_off_to_shorter_context() {
        let v = vocab(3);
        // "0,1" is always followed by 2; "2,1" never occurs.
        let stream = vec![0, 1, 2, 0, 1, 2];
        let model = MarkovPredictor::fit(&v, &stream, 2).unwrap();

        let dist = model.distribution(&[2, 1]);
        assert_eq!(argmax(&dist), Some(2));
    }

    #[test]
    fn unseen_context_uses_unigram() {
        let v = vocab(3);
        let stream = vec![0, 0, 0, 1];
        let model = MarkovPredictor::fit(&v, &stream, 1).unwrap();

        let dist = model.distribution(&[2]);
        assert_eq!(dist, vec![0.75, 0.25, 0.0]);
    }

    #[test]
    fn empty_stream_is_uniform() {
        let v = vocab(4);
        let model = MarkovPredictor::fit(&v, &[], 3).unwrap();
        assert_eq!(model.distribution(&[1, 2, 3]), vec![0.25; 4]);
    }

    #[test]
    fn distributions_sum_to_one() {
        let v = vocab(5);
        let stream = vec![0, 3, 1, 4, 4, 2, 0, 3, 3, 1, 0];
        let model = MarkovPredictor::fit(&v, &stream, 3).unwrap();
        for ctx in [vec![0, 3], vec![4, 4, 2], vec![1], vec![2, 2, 2]] {
            let sum: f32 = model.distribution(&ctx).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "{ctx:?} sums to {sum}");
        }
    }

    #[test]
    fn rejects_bad_input() {
        let v = vocab(2);
        assert!(matches!(
            MarkovPredictor::fit(&v, &[0, 2], 1),
            Err(Error::IndexOutOfRange { index: 2, size: 2 })
        ));
        assert!(matches!(
            MarkovPredictor::fit(&v, &[0, 1], 0),
            Err(Error::InvalidOrder)
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.json");
        let v = vocab(3);
        let model = MarkovPredictor::fit(&v, &[0, 1, 2, 1, 0], 2).unwrap();

        model.save(&path).unwrap();
        let loaded = MarkovPredictor::load(&path).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.vocabulary_fingerprint(), v.fingerprint());
    }
}
