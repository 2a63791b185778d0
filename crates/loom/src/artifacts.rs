//! On-disk artifacts shared between `prepare`, `fit` and `generate`.
//!
//! All three live in one directory and are tied together by the
//! vocabulary fingerprint: a corpus or predictor written against a
//! different vocabulary is refused rather than silently misread.

use anyhow::{bail, Context, Result};
use noteloom::{MarkovPredictor, Vocabulary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const CORPUS_FILE: &str = "corpus.json";
pub const PREDICTOR_FILE: &str = "predictor.json";

/// The encoded training corpus: the reference stream random seeds come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusArtifact {
    pub sequence_length: usize,
    pub vocabulary_fingerprint: String,
    pub indices: Vec<usize>,
}

impl CorpusArtifact {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write corpus to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus from {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Corrupt corpus artifact {}", path.display()))
    }
}

/// Paths of the artifacts under one directory.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))
    }

    pub fn vocabulary(&self) -> PathBuf {
        self.root.join(VOCABULARY_FILE)
    }

    pub fn corpus(&self) -> PathBuf {
        self.root.join(CORPUS_FILE)
    }

    pub fn predictor(&self) -> PathBuf {
        self.root.join(PREDICTOR_FILE)
    }

    /// Load the vocabulary and the corpus encoded against it.
    pub fn load_prepared(&self) -> Result<(Vocabulary, CorpusArtifact)> {
        let vocab_path = self.vocabulary();
        let vocabulary = Vocabulary::load(&vocab_path).with_context(|| {
            format!(
                "Failed to load {} (run `loom prepare` first)",
                vocab_path.display()
            )
        })?;
        let corpus = CorpusArtifact::load(&self.corpus())?;

        let fingerprint = vocabulary.fingerprint();
        if corpus.vocabulary_fingerprint != fingerprint {
            bail!(
                "{} was encoded with vocabulary {} but {} is {}; re-run `loom prepare`",
                self.corpus().display(),
                corpus.vocabulary_fingerprint,
                vocab_path.display(),
                fingerprint
            );
        }
        if let Some(&index) = corpus.indices.iter().find(|&&i| i >= vocabulary.len()) {
            bail!(
                "{} holds index {} outside vocabulary of size {}",
                self.corpus().display(),
                index,
                vocabulary.len()
            );
        }
        Ok((vocabulary, corpus))
    }

    /// Load the predictor, checking it was fit against `vocabulary`.
    pub fn load_predictor(&self, vocabulary: &Vocabulary) -> Result<MarkovPredictor> {
        let path = self.predictor();
        let predictor = MarkovPredictor::load(&path).with_context(|| {
            format!("Failed to load {} (run `loom fit` first)", path.display())
        })?;
        if predictor.vocabulary_fingerprint() != vocabulary.fingerprint() {
            bail!(
                "{} was fit against a different vocabulary; re-run `loom fit`",
                path.display()
            );
        }
        Ok(predictor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noteloom::Token;

    fn vocab(names: &[&str]) -> Vocabulary {
        let tokens: Vec<Token> = names.iter().map(|n| Token::from(*n)).collect();
        Vocabulary::build(&tokens)
    }

    #[test]
    fn corpus_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CORPUS_FILE);
        let corpus = CorpusArtifact {
            sequence_length: 4,
            vocabulary_fingerprint: "abc".into(),
            indices: vec![0, 2, 1, 1],
        };
        corpus.save(&path).unwrap();
        assert_eq!(CorpusArtifact::load(&path).unwrap(), corpus);
    }

    #[test]
    fn mismatched_fingerprint_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactDir::new(dir.path());

        let v = vocab(&["C4", "D4"]);
        v.save(&artifacts.vocabulary()).unwrap();
        CorpusArtifact {
            sequence_length: 1,
            vocabulary_fingerprint: vocab(&["C4", "E4"]).fingerprint(),
            indices: vec![0, 1],
        }
        .save(&artifacts.corpus())
        .unwrap();

        let err = artifacts.load_prepared().unwrap_err();
        assert!(err.to_string().contains("re-run `loom prepare`"));
    }

    #[test]
    fn out_of_range_index_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactDir::new(dir.path());

        let v = vocab(&["C4", "D4"]);
        v.save(&artifacts.vocabulary()).unwrap();
        CorpusArtifact {
            sequence_length: 1,
            vocabulary_fingerprint: v.fingerprint(),
            indices: vec![0, 5],
        }
        .save(&artifacts.corpus())
        .unwrap();

        assert!(artifacts.load_prepared().is_err());
    }

    #[test]
    fn predictor_for_other_vocabulary_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactDir::new(dir.path());

        let fitted_on = vocab(&["C4", "D4"]);
        MarkovPredictor::fit(&fitted_on, &[0, 1, 0], 1)
            .unwrap()
            .save(&artifacts.predictor())
            .unwrap();

        assert!(artifacts.load_predictor(&fitted_on).is_ok());
        assert!(artifacts.load_predictor(&vocab(&["C4", "G4"])).is_err());
    }
}
