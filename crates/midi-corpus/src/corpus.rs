use crate::events::events_from_bytes;
use crate::{Error, Result};
use noteloom::{CorpusParser, ParseFailure, SymbolicEvent};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Whether `path` has a `.mid` or `.midi` extension, any case.
pub fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
}

/// Every MIDI file under `root`, sorted by path.
///
/// Sorting keeps vocabulary indices and training windows stable across
/// filesystems that list directories in different orders.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && is_midi_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    info!(root = %root.display(), files = files.len(), "discovered MIDI corpus");
    Ok(files)
}

/// [`CorpusParser`] over Standard MIDI Files.
#[derive(Debug, Default, Clone, Copy)]
pub struct MidiParser;

impl MidiParser {
    pub fn parse_file(&self, path: &Path) -> Result<Vec<SymbolicEvent>> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let events = events_from_bytes(&bytes)?;
        debug!(path = %path.display(), events = events.len(), "parsed MIDI file");
        Ok(events)
    }
}

impl CorpusParser for MidiParser {
    fn parse(&self, path: &Path) -> std::result::Result<Vec<SymbolicEvent>, ParseFailure> {
        self.parse_file(path)
            .map_err(|e| ParseFailure::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::make_test_midi_format1;
    use noteloom::tokenize_corpus;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn extension_matching() {
        assert!(is_midi_file(Path::new("a/b.mid")));
        assert!(is_midi_file(Path::new("B.MID")));
        assert!(is_midi_file(Path::new("c.Midi")));
        assert!(!is_midi_file(Path::new("d.mp3")));
        assert!(!is_midi_file(Path::new("mid")));
    }

    #[test]
    fn discovers_nested_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        for name in ["b/inner/z.mid", "a/y.MIDI", "x.mid", "notes.txt"] {
            fs::write(root.join(name), b"").unwrap();
        }

        let found: Vec<PathBuf> = discover(root)
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a/y.MIDI"),
                PathBuf::from("b/inner/z.mid"),
                PathBuf::from("x.mid"),
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover(&dir.path().join("nope")),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn corrupt_files_are_skipped_by_the_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.mid");
        let bad = dir.path().join("bad.mid");
        fs::write(&good, make_test_midi_format1()).unwrap();
        fs::write(&bad, b"MThd garbage").unwrap();

        let files = discover(dir.path()).unwrap();
        let corpus = tokenize_corpus(&files, &MidiParser);

        assert_eq!(corpus.files_parsed, 1);
        assert_eq!(corpus.failures.len(), 1);
        let names: Vec<&str> = corpus.tokens.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["C4", "E4", "G4"]);
    }
}
