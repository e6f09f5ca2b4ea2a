use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use log::{info, warn};
use crate::error::CorpusLoadError;

/// The dictionary: uppercase alphabetic words within a length range.
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    words: HashSet<String>,
}

fn normalize(line: &str, min_len: usize, max_len: usize) -> Option<String> {
    let word = line.trim();
    if word.len() < min_len || word.len() > max_len {
        return None;
    }
    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(word.to_ascii_uppercase())
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    io::BufReader::new(file).lines().collect()
}

impl Corpus {
    /// Keep alphabetic tokens of `min_len..=max_len` letters, uppercased and deduplicated.
    pub fn load<I, S>(lines: I, min_len: usize, max_len: usize) -> Result<Corpus, CorpusLoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: HashSet<String> = lines
            .into_iter()
            .filter_map(|line| normalize(line.as_ref(), min_len, max_len))
            .collect();

        if words.is_empty() {
            return Err(CorpusLoadError::Empty { min_len, max_len });
        }
        Ok(Corpus { words })
    }

    /// Load `<base_dir>/words/<lang>/lexicon.txt`, then merge the optional
    /// `insertions.txt` and drop anything listed in `deletions.txt`.
    pub fn from_share_dir(
        base_dir: &Path,
        lang: &str,
        min_len: usize,
        max_len: usize,
    ) -> Result<Corpus, CorpusLoadError> {
        let lang_dir: PathBuf = base_dir.join("words").join(lang);
        let lexicon_path = lang_dir.join("lexicon.txt");

        let lines = read_lines(&lexicon_path).map_err(|source| CorpusLoadError::Io {
            path: lexicon_path.clone(),
            source,
        })?;
        let mut corpus = Corpus::load(lines, min_len, max_len)?;

        match read_lines(&lang_dir.join("insertions.txt")) {
            Ok(extra) => {
                let before = corpus.len();
                corpus
                    .words
                    .extend(extra.iter().filter_map(|l| normalize(l, min_len, max_len)));
                info!("Inserted {} words into {} lexicon.", corpus.len() - before, lang);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Ignoring unreadable insertions for {}: {}", lang, e),
        }

        match read_lines(&lang_dir.join("deletions.txt")) {
            Ok(censored) => {
                let before = corpus.len();
                for word in censored {
                    corpus.words.remove(&word.trim().to_ascii_uppercase());
                }
                info!("Deleted {} words from {} lexicon.", before - corpus.len(), lang);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Ignoring unreadable deletions for {}: {}", lang, e),
        }

        if corpus.is_empty() {
            return Err(CorpusLoadError::Empty { min_len, max_len });
        }

        info!(
            "Total valid words for {} ({}..={} letters): {}",
            lang, min_len, max_len, corpus.len()
        );
        Ok(corpus)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_filters_and_normalizes() {
        let lines = ["cat", "  Castle ", "at", "toolongword", "don't", "CAT", "", "slate"];
        let corpus = Corpus::load(lines, 3, 8).unwrap();

        assert_eq!(corpus.len(), 3);
        assert!(corpus.contains("CAT"));
        assert!(corpus.contains("CASTLE"));
        assert!(corpus.contains("SLATE"));
        assert!(!corpus.contains("AT"));
        assert!(!corpus.contains("cat"));
    }

    #[test]
    fn test_load_empty_is_an_error() {
        let err = Corpus::load(["a", "bb", "1234"], 3, 8).unwrap_err();
        assert!(matches!(err, CorpusLoadError::Empty { min_len: 3, max_len: 8 }));
    }

    #[test]
    fn test_missing_lexicon_is_an_error() {
        let dir = std::env::temp_dir().join(format!("wordtwist-missing-{}", std::process::id()));
        let err = Corpus::from_share_dir(&dir, "en", 3, 8).unwrap_err();
        assert!(matches!(err, CorpusLoadError::Io { .. }));
    }

    #[test]
    fn test_insertions_and_deletions() {
        let dir = std::env::temp_dir().join(format!("wordtwist-share-{}", std::process::id()));
        let lang_dir = dir.join("words").join("en");
        fs::create_dir_all(&lang_dir).unwrap();
        fs::write(lang_dir.join("lexicon.txt"), "cat\nact\ntac\n").unwrap();
        fs::write(lang_dir.join("insertions.txt"), "scat\n").unwrap();
        fs::write(lang_dir.join("deletions.txt"), "tac\n").unwrap();

        let corpus = Corpus::from_share_dir(&dir, "en", 3, 8).unwrap();
        assert!(corpus.contains("CAT"));
        assert!(corpus.contains("ACT"));
        assert!(corpus.contains("SCAT"));
        assert!(!corpus.contains("TAC"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
