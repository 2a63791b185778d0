//! prepare -> fit -> generate over a small on-disk corpus.

use loom::artifacts::{ArtifactDir, CorpusArtifact};
use loom::commands::{self, GenerateRequest};
use midi_corpus::{write_midi, MidiParser, RenderOptions};
use noteloom::{tokenize, CorpusParser, Decoder, Token, Vocabulary};
use pretty_assertions::assert_eq;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn toks(names: &[&str]) -> Vec<Token> {
    names.iter().map(|n| Token::from(*n)).collect()
}

fn write_song(path: &Path, tokens: &[Token]) {
    let events = Decoder::new(0.5).unwrap().decode(tokens).unwrap();
    write_midi(path, &events, &RenderOptions::default()).unwrap();
}

fn arpeggio(repeats: usize) -> Vec<Token> {
    toks(&["C4", "E4", "G4"])
        .into_iter()
        .cycle()
        .take(3 * repeats)
        .collect()
}

fn request(output: &Path, seed: Option<&[&str]>) -> GenerateRequest {
    GenerateRequest {
        num_tokens: 6,
        seed: seed.map(|s| s.iter().map(|t| t.to_string()).collect()),
        rng_seed: Some(11),
        step: 0.5,
        program: 0,
        render: RenderOptions::default(),
        output: output.to_path_buf(),
    }
}

#[tokio::test]
async fn full_pipeline_over_midi_files() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let artifact_dir = tempfile::tempdir().unwrap();
    write_song(&corpus_dir.path().join("a.mid"), &arpeggio(5));
    write_song(&corpus_dir.path().join("b.mid"), &arpeggio(4));
    std::fs::write(corpus_dir.path().join("broken.mid"), b"nope").unwrap();

    let artifacts = ArtifactDir::new(artifact_dir.path());
    let report = commands::prepare(corpus_dir.path(), &artifacts, 3).unwrap();
    assert_eq!(report.files_found, 3);
    assert_eq!(report.files_parsed, 2);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.tokens, 27);
    assert_eq!(report.vocabulary_size, 3);
    assert_eq!(report.training_pairs, 24);

    let vocabulary = Vocabulary::load(&artifacts.vocabulary()).unwrap();
    let corpus = CorpusArtifact::load(&artifacts.corpus()).unwrap();
    assert_eq!(corpus.sequence_length, 3);
    assert_eq!(corpus.indices.len(), 27);
    assert_eq!(corpus.vocabulary_fingerprint, vocabulary.fingerprint());

    let predictor = commands::fit(&artifacts, 3).unwrap();
    assert_eq!(predictor.order(), 3);

    let output = artifact_dir.path().join("songs/out.mid");
    let tokens = commands::generate(
        &artifacts,
        request(&output, Some(&["C4", "E4", "G4"])),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(tokens, toks(&["C4", "E4", "G4", "C4", "E4", "G4"]));

    let parsed = MidiParser.parse(&output).unwrap();
    assert_eq!(tokenize(&parsed), tokens);

    // Without a seed the start window comes from the corpus.
    let tokens = commands::generate(&artifacts, request(&output, None), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(tokens.len(), 6);
}

#[tokio::test]
async fn fit_clamps_order_to_window() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let artifact_dir = tempfile::tempdir().unwrap();
    write_song(&corpus_dir.path().join("a.mid"), &arpeggio(3));

    let artifacts = ArtifactDir::new(artifact_dir.path());
    commands::prepare(corpus_dir.path(), &artifacts, 2).unwrap();
    let predictor = commands::fit(&artifacts, 8).unwrap();
    assert_eq!(predictor.order(), 2);
}

#[tokio::test]
async fn generate_errors() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let artifact_dir = tempfile::tempdir().unwrap();
    write_song(&corpus_dir.path().join("a.mid"), &arpeggio(3));
    let artifacts = ArtifactDir::new(artifact_dir.path());
    let output = artifact_dir.path().join("out.mid");

    // Nothing fitted yet
    commands::prepare(corpus_dir.path(), &artifacts, 3).unwrap();
    assert!(commands::generate(&artifacts, request(&output, None), CancellationToken::new())
        .await
        .is_err());

    commands::fit(&artifacts, 2).unwrap();

    let err = commands::generate(
        &artifacts,
        request(&output, Some(&["C4", "E4", "B9"])),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<noteloom::Error>(),
        Some(noteloom::Error::UnknownToken { .. })
    ));

    let err = commands::generate(
        &artifacts,
        request(&output, Some(&["C4", "E4"])),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<noteloom::Error>(),
        Some(noteloom::Error::InvalidSeed { .. })
    ));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = commands::generate(&artifacts, request(&output, None), cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<noteloom::Error>(),
        Some(noteloom::Error::Cancelled { completed: 0 })
    ));
    assert!(!output.exists());
}

#[test]
fn empty_corpus_is_an_error() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let artifact_dir = tempfile::tempdir().unwrap();
    let artifacts = ArtifactDir::new(artifact_dir.path());
    assert!(commands::prepare(corpus_dir.path(), &artifacts, 3).is_err());
    assert!(!artifacts.vocabulary().exists());
}
