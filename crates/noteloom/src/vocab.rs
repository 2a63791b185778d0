//! Token vocabulary: a sorted, deduplicated bijection between tokens and
//! dense indices.
//!
//! Index assignment depends only on the set of tokens, never on the order
//! they were observed in, so the same corpus always yields the same
//! mapping. The persisted artifact carries its size and a blake3
//! fingerprint of the ordered token list; a vocabulary loaded from disk is
//! checked against both before use.

use crate::token::Token;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<Token>,
    index: HashMap<Token, usize>,
}

/// On-disk form of a [`Vocabulary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyArtifact {
    pub size: usize,
    pub fingerprint: String,
    pub tokens: Vec<Token>,
}

impl Vocabulary {
    /// Build from an observed token multiset.
    pub fn build<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Self {
        let sorted: Vec<Token> = tokens
            .into_iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self::from_sorted(sorted)
    }

    fn from_sorted(tokens: Vec<Token>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    /// Number of distinct tokens; also the predictor's output width.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in index order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn index_of(&self, token: &Token) -> Result<usize> {
        self.index
            .get(token)
            .copied()
            .ok_or_else(|| Error::UnknownToken {
                token: token.to_string(),
            })
    }

    pub fn token_of(&self, index: usize) -> Result<&Token> {
        self.tokens.get(index).ok_or(Error::IndexOutOfRange {
            index,
            size: self.tokens.len(),
        })
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.index.contains_key(token)
    }

    /// Map a token sequence to indices, failing on the first unknown token.
    pub fn encode(&self, tokens: &[Token]) -> Result<Vec<usize>> {
        tokens.iter().map(|t| self.index_of(t)).collect()
    }

    /// blake3 hex digest of the ordered token list.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for token in &self.tokens {
            hasher.update(token.as_str().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn to_artifact(&self) -> VocabularyArtifact {
        VocabularyArtifact {
            size: self.len(),
            fingerprint: self.fingerprint(),
            tokens: self.tokens.clone(),
        }
    }

    /// Rebuild from an artifact, verifying order, size and fingerprint.
    pub fn from_artifact(artifact: VocabularyArtifact) -> Result<Self> {
        if artifact.tokens.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::VocabularyMismatch(
                "tokens are not strictly sorted".to_string(),
            ));
        }
        if artifact.tokens.len() != artifact.size {
            return Err(Error::VocabularyMismatch(format!(
                "declared size {} but found {} tokens",
                artifact.size,
                artifact.tokens.len()
            )));
        }
        let vocab = Self::from_sorted(artifact.tokens);
        let actual = vocab.fingerprint();
        if actual != artifact.fingerprint {
            return Err(Error::VocabularyMismatch(format!(
                "fingerprint {} does not match declared {}",
                actual, artifact.fingerprint
            )));
        }
        Ok(vocab)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_artifact())?;
        std::fs::write(path, json).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), size = self.len(), "vocabulary saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: VocabularyArtifact = serde_json::from_str(&data)?;
        let vocab = Self::from_artifact(artifact)?;
        info!(path = %path.display(), size = vocab.len(), "vocabulary loaded");
        Ok(vocab)
    }
}
