//! CLI command implementations

use crate::artifacts::{ArtifactDir, CorpusArtifact};
use anyhow::{bail, Context, Result};
use loomconf::{ConfigSources, LoomConfig};
use midi_corpus::{discover, gm, write_midi, MidiParser, RenderOptions};
use noteloom::{prepare as prepare_windows, tokenize_corpus, Decoder, Generator, MarkovPredictor, Token};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Summary of a `prepare` run.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareReport {
    pub files_found: usize,
    pub files_parsed: usize,
    pub files_failed: usize,
    pub tokens: usize,
    pub vocabulary_size: usize,
    pub training_pairs: usize,
}

/// Tokenize the corpus and write the vocabulary and corpus artifacts.
pub fn prepare(
    corpus_dir: &Path,
    artifacts: &ArtifactDir,
    sequence_length: usize,
) -> Result<PrepareReport> {
    let files = discover(corpus_dir)
        .with_context(|| format!("Failed to scan corpus {}", corpus_dir.display()))?;
    if files.is_empty() {
        bail!("No .mid or .midi files under {}", corpus_dir.display());
    }

    let corpus = tokenize_corpus(&files, &MidiParser);
    for failure in &corpus.failures {
        warn!(error = %failure, "skipped");
    }
    if corpus.tokens.is_empty() {
        bail!(
            "No notes or chords found in {} files under {}",
            files.len(),
            corpus_dir.display()
        );
    }

    let set = prepare_windows(&corpus.tokens, sequence_length)?;
    if set.pairs() == 0 {
        warn!(
            tokens = corpus.tokens.len(),
            sequence_length, "corpus is shorter than one window; random seeding will fail"
        );
    }

    artifacts.create()?;
    set.vocabulary
        .save(&artifacts.vocabulary())
        .context("Failed to save vocabulary")?;
    CorpusArtifact {
        sequence_length,
        vocabulary_fingerprint: set.vocabulary.fingerprint(),
        indices: set.indices.clone(),
    }
    .save(&artifacts.corpus())?;

    let report = PrepareReport {
        files_found: files.len(),
        files_parsed: corpus.files_parsed,
        files_failed: corpus.failures.len(),
        tokens: corpus.tokens.len(),
        vocabulary_size: set.vocabulary.len(),
        training_pairs: set.pairs(),
    };
    info!(?report, "prepared corpus");
    Ok(report)
}

/// Fit the bundled n-gram predictor on the prepared corpus.
pub fn fit(artifacts: &ArtifactDir, order: usize) -> Result<MarkovPredictor> {
    let (vocabulary, corpus) = artifacts.load_prepared()?;

    let order = if order > corpus.sequence_length {
        warn!(
            order,
            sequence_length = corpus.sequence_length,
            "order exceeds the context window, clamping"
        );
        corpus.sequence_length
    } else {
        order
    };

    let predictor = MarkovPredictor::fit(&vocabulary, &corpus.indices, order)?;
    predictor
        .save(&artifacts.predictor())
        .context("Failed to save predictor")?;
    Ok(predictor)
}

/// Options for one `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub num_tokens: usize,
    /// Seed tokens; exactly `sequence_length` of them when given.
    pub seed: Option<Vec<String>>,
    /// Fixed RNG seed for reproducible random seeding.
    pub rng_seed: Option<u64>,
    pub step: f64,
    pub program: u8,
    pub render: RenderOptions,
    pub output: PathBuf,
}

/// Generate tokens from the prepared artifacts and write them as MIDI.
///
/// Runs on a blocking thread; `cancel` stops it between steps.
pub async fn generate(
    artifacts: &ArtifactDir,
    request: GenerateRequest,
    cancel: CancellationToken,
) -> Result<Vec<Token>> {
    let (vocabulary, corpus) = artifacts.load_prepared()?;
    let predictor = artifacts.load_predictor(&vocabulary)?;

    let seed = request
        .seed
        .as_ref()
        .map(|names| {
            let tokens: Vec<Token> = names.iter().map(|n| Token::from(n.as_str())).collect();
            vocabulary.encode(&tokens)
        })
        .transpose()
        .context("Seed contains a token that is not in the vocabulary")?;

    let num_tokens = request.num_tokens;
    let rng_seed = request.rng_seed;
    let (tokens, vocabulary) = tokio::task::spawn_blocking(move || {
        let mut rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let generator = Generator::new(&vocabulary, &predictor, corpus.sequence_length)?
            .with_reference(&corpus.indices);
        let tokens =
            generator.generate_cancellable(num_tokens, seed.as_deref(), &mut rng, &cancel)?;
        Ok::<_, noteloom::Error>((tokens, vocabulary))
    })
    .await
    .context("Generation task panicked")?
    .context("Generation failed")?;

    info!(tokens = tokens.len(), vocabulary = vocabulary.len(), "generated");

    let events = Decoder::new(request.step)?
        .with_instrument(gm::instrument(request.program))
        .decode(&tokens)?;
    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_midi(&request.output, &events, &request.render)
        .with_context(|| format!("Failed to write {}", request.output.display()))?;

    Ok(tokens)
}

/// Render options from the `[render]` config section.
pub fn render_options(config: &LoomConfig) -> RenderOptions {
    RenderOptions {
        ppq: config.render.ppq,
        tempo_bpm: config.render.tempo_bpm,
        note_length: config.render.note_length,
        velocity: config.render.velocity,
    }
}

/// Print the effective config and, optionally, where it came from.
pub fn show_config(config: &LoomConfig, sources: &ConfigSources, show_sources: bool) {
    if show_sources {
        println!("# Files loaded (in order):");
        if sources.files.is_empty() {
            println!("#   (none, using defaults)");
        }
        for path in &sources.files {
            println!("#   {}", path.display());
        }
        if !sources.env_overrides.is_empty() {
            println!("# Environment overrides: {}", sources.env_overrides.join(", "));
        }
        println!();
    }
    print!("{}", config.to_toml());
}
