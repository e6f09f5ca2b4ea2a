use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a usable word list at startup.
#[derive(Error, Debug)]
pub enum CorpusLoadError {
    #[error("failed to read lexicon at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("lexicon yielded no words between {min_len} and {max_len} letters")]
    Empty { min_len: usize, max_len: usize },
}

/// Failure to precompute the puzzle cache. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheBuildError {
    #[error("cannot build puzzle cache from an empty corpus")]
    EmptyCorpus,
    #[error("no puzzle tiers configured")]
    NoTiers,
    #[error("puzzle tier '{0}' has no base words")]
    EmptyTier(String),
    #[error("base word {0} is not in the corpus")]
    BaseWordNotInCorpus(String),
    #[error("base word {word} should have {expected} letters")]
    WrongLength { word: String, expected: usize },
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Corpus(#[from] CorpusLoadError),
    #[error(transparent)]
    Cache(#[from] CacheBuildError),
}

impl From<StartupError> for io::Error {
    fn from(err: StartupError) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

/// Session backend failures. Game outcomes never travel through this type.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session backend unavailable: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("corrupt session record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the in-process store may take over for this call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }
}
