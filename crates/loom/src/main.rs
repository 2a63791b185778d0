//! loom - MIDI corpus to generated MIDI
//!
//! Subcommands:
//! - `loom prepare` - Tokenize the corpus, write vocabulary and corpus artifacts
//! - `loom fit` - Fit the n-gram predictor on the prepared corpus
//! - `loom generate` - Generate tokens and render them to a MIDI file
//! - `loom config` - Show the effective configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use loom::artifacts::ArtifactDir;
use loom::commands::{self, GenerateRequest};
use loomconf::LoomConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "loom")]
#[command(about = "Symbolic music generation from a MIDI corpus")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./noteloom.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory (overrides paths.artifacts_dir)
    #[arg(short, long, global = true)]
    artifacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a MIDI corpus and build the vocabulary
    Prepare {
        /// Corpus root (overrides paths.corpus_dir)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Context window length (overrides pipeline.sequence_length)
        #[arg(short = 'l', long)]
        sequence_length: Option<usize>,
    },

    /// Fit the bundled n-gram predictor
    Fit {
        /// Longest context to condition on (overrides pipeline.markov_order)
        #[arg(long)]
        order: Option<usize>,
    },

    /// Generate music and write it to a MIDI file
    Generate {
        /// Output file
        #[arg(short, long, default_value = "output.mid")]
        output: PathBuf,

        /// Tokens to generate (overrides pipeline.num_tokens)
        #[arg(short = 'n', long)]
        num_tokens: Option<usize>,

        /// Comma-separated seed tokens, e.g. C4,E4,G4,0.4.7
        #[arg(long, value_delimiter = ',')]
        seed: Option<Vec<String>>,

        /// RNG seed for picking a start window from the corpus
        #[arg(long)]
        rng_seed: Option<u64>,

        /// Offset between events in quarter lengths (overrides pipeline.step)
        #[arg(long)]
        step: Option<f64>,

        /// GM program for the output track (overrides render.program)
        #[arg(long)]
        program: Option<u8>,
    },

    /// Show the effective configuration
    Config {
        /// Also list the files and environment variables it came from
        #[arg(long)]
        sources: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = LoomConfig::load_with_sources_from(cli.config.as_deref())?;
    loom::telemetry::init(&config.telemetry.log_level);

    let artifacts = ArtifactDir::new(
        cli.artifacts
            .clone()
            .unwrap_or_else(|| config.paths.artifacts_dir.clone()),
    );

    match cli.command {
        Commands::Prepare {
            corpus,
            sequence_length,
        } => {
            let corpus_dir = corpus.unwrap_or_else(|| config.paths.corpus_dir.clone());
            let sequence_length = sequence_length.unwrap_or(config.pipeline.sequence_length);
            let report = commands::prepare(&corpus_dir, &artifacts, sequence_length)?;
            println!(
                "Prepared {} tokens from {}/{} files ({} skipped): vocabulary {}, {} training windows",
                report.tokens,
                report.files_parsed,
                report.files_found,
                report.files_failed,
                report.vocabulary_size,
                report.training_pairs
            );
            println!("Artifacts in {}", artifacts.root().display());
        }
        Commands::Fit { order } => {
            let order = order.unwrap_or(config.pipeline.markov_order);
            let predictor = commands::fit(&artifacts, order)?;
            println!(
                "Fit order-{} predictor over a vocabulary of {} -> {}",
                predictor.order(),
                predictor.vocabulary_size(),
                artifacts.predictor().display()
            );
        }
        Commands::Generate {
            output,
            num_tokens,
            seed,
            rng_seed,
            step,
            program,
        } => {
            let request = GenerateRequest {
                num_tokens: num_tokens.unwrap_or(config.pipeline.num_tokens),
                seed,
                rng_seed,
                step: step.unwrap_or(config.pipeline.step),
                program: program.unwrap_or(config.render.program),
                render: commands::render_options(&config),
                output: output.clone(),
            };

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Interrupted, stopping generation");
                    on_signal.cancel();
                }
            });

            let tokens = commands::generate(&artifacts, request, cancel).await?;
            println!("Wrote {} events to {}", tokens.len(), output.display());
        }
        Commands::Config { sources: show } => {
            commands::show_config(&config, &sources, show);
        }
    }

    Ok(())
}
