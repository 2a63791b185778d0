//! Event-to-token extraction over single files and whole corpora.
//!
//! A corpus is tokenized file by file in the order given. A file that fails
//! to parse is logged and skipped; it never aborts the run.

use crate::event::SymbolicEvent;
use crate::token::Token;
use crate::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-file parse failure reported by a [`CorpusParser`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseFailure(pub String);

impl ParseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Turns one symbolic music file into ordered events.
///
/// Implementations resolve instrument partitioning themselves and return a
/// flat event list for the part that should be tokenized.
pub trait CorpusParser {
    fn parse(&self, path: &Path) -> Result<Vec<SymbolicEvent>, ParseFailure>;
}

impl<P: CorpusParser + ?Sized> CorpusParser for &P {
    fn parse(&self, path: &Path) -> Result<Vec<SymbolicEvent>, ParseFailure> {
        (**self).parse(path)
    }
}

/// Result of tokenizing a corpus.
#[derive(Debug, Default)]
pub struct CorpusTokens {
    /// Concatenated token stream, files in input order.
    pub tokens: Vec<Token>,
    /// Files that contributed tokens (possibly zero tokens).
    pub files_parsed: usize,
    /// Files skipped because they failed to parse. Each is an
    /// [`Error::CorpusParse`].
    pub failures: Vec<Error>,
}

/// Map events to tokens, one per recognised event, preserving order.
///
/// Notes become their pitch name and chords their normal-order token.
/// `Other` events, empty chords and notes below octave 0 produce nothing.
pub fn tokenize<'a>(events: impl IntoIterator<Item = &'a SymbolicEvent>) -> Vec<Token> {
    events
        .into_iter()
        .filter_map(|event| match event {
            SymbolicEvent::Note { pitch } => {
                let token = Token::note(*pitch);
                if token.is_none() {
                    debug!(midi = pitch.midi(), "skipping note below octave 0");
                }
                token
            }
            SymbolicEvent::Chord { pitches } => {
                let token = Token::chord(pitches);
                if token.is_none() {
                    debug!("skipping empty chord");
                }
                token
            }
            SymbolicEvent::Other { kind } => {
                debug!(kind = kind.as_str(), "skipping unrecognised event");
                None
            }
        })
        .collect()
}

/// Tokenize every file in `paths` with `parser` and concatenate the results.
///
/// Callers own the traversal order; pass paths in a stable order so that
/// vocabulary indices and training windows are reproducible.
pub fn tokenize_corpus<P, I>(paths: I, parser: &P) -> CorpusTokens
where
    P: CorpusParser + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    let mut out = CorpusTokens::default();

    for path in paths {
        let path = path.as_ref();
        match parser.parse(path) {
            Ok(events) => {
                let tokens = tokenize(&events);
                debug!(
                    path = %path.display(),
                    events = events.len(),
                    tokens = tokens.len(),
                    "parsed"
                );
                out.tokens.extend(tokens);
                out.files_parsed += 1;
            }
            Err(failure) => {
                warn!(path = %path.display(), error = %failure, "skipping unparseable file");
                out.failures.push(Error::CorpusParse {
                    path: PathBuf::from(path),
                    message: failure.0,
                });
            }
        }
    }

    info!(
        files = out.files_parsed,
        failed = out.failures.len(),
        tokens = out.tokens.len(),
        "corpus tokenized"
    );
    out
}
