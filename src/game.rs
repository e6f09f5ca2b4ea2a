//! Entry points the HTTP layer calls. Everything here trusts the session
//! store for what was dealt and found; nothing a client sends about letters
//! or scores is taken at face value.

use std::sync::Arc;
use chrono::Utc;
use log::debug;
use serde::Serialize;
use thiserror::Error;
use crate::config::GameConfig;
use crate::error::StoreError;
use crate::services::generator::{Puzzle, PuzzleGenerator};
use crate::services::puzzle_cache::SolutionSet;
use crate::store::{AcceptOutcome, GameMode, RejectReason, RoundSession, RoundSummary, SessionStore};
use crate::utils::can_form;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("no puzzle available for level {0}")]
    NoPuzzle(u32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A game-level result: the value, or the reason the request was turned down.
pub type Outcome<T> = Result<T, RejectReason>;

/// A freshly dealt puzzle together with the session that tracks it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(flatten)]
    pub puzzle: Puzzle,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted { word: String, points: u32, score: u32 },
    Rejected { word: String, reason: RejectReason },
}

pub struct Game<S> {
    generator: PuzzleGenerator,
    store: S,
    config: Arc<GameConfig>,
}

impl<S: SessionStore> Game<S> {
    pub fn new(generator: PuzzleGenerator, store: S, config: Arc<GameConfig>) -> Self {
        Game { generator, store, config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dictionary_size(&self) -> usize {
        self.generator.cache().corpus().len()
    }

    pub fn cached_puzzles(&self) -> usize {
        self.generator.cache().len()
    }

    pub fn generate(&self, level: u32) -> Result<Puzzle, GameError> {
        self.generator.generate(level).ok_or(GameError::NoPuzzle(level))
    }

    /// Deal a puzzle and open the session that will referee it.
    pub async fn start_round(&self, level: u32, mode: GameMode) -> Result<Round, GameError> {
        let puzzle = self.generate(level)?;
        let session_id = self.create_session(&puzzle.letters, puzzle.level, mode).await?;
        Ok(Round { puzzle, session_id })
    }

    pub async fn create_session(&self, letters: &[char], level: u32, mode: GameMode) -> Result<String, GameError> {
        Ok(self.store.create(letters, level, mode).await?)
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<RoundSession>, GameError> {
        Ok(self.store.get(id).await?)
    }

    pub fn is_expired_for_timer(&self, session: &RoundSession) -> bool {
        self.config.timer.is_expired(session.mode, session.created_at, Utc::now())
    }

    pub fn points_for(&self, word: &str) -> u32 {
        self.config.scoring.points_for(word.chars().count())
    }

    /// Credit `word` to the session at its formula value. Does not check the
    /// word against the dictionary; see [`Game::submit_word`] for that.
    pub async fn accept_word(&self, id: &str, word: &str) -> Result<AcceptOutcome, GameError> {
        let word = word.trim().to_ascii_uppercase();
        let points = self.points_for(&word);
        Ok(self.store.accept_word(id, &word, points).await?)
    }

    fn is_playable(&self, word: &str, letters: &[char]) -> bool {
        let len = word.len();
        len >= self.config.min_word_length
            && len <= self.config.max_word_length
            && word.chars().all(|c| c.is_ascii_uppercase())
            && can_form(word, letters)
            && self.generator.cache().corpus().contains(word)
    }

    /// Full referee path for a player's guess: the session must be open and
    /// on time, the word must be spelled from the dealt letters and be in the
    /// dictionary, and it must not have been credited before.
    pub async fn submit_word(&self, id: &str, word: &str) -> Result<Submission, GameError> {
        let word = word.trim().to_ascii_uppercase();
        let rejected = |reason| Submission::Rejected { word: word.clone(), reason };

        let session = match self.store.get(id).await? {
            Some(session) => session,
            None => return Ok(rejected(RejectReason::SessionNotFound)),
        };
        if self.is_expired_for_timer(&session) {
            self.store.close(id).await?;
            return Ok(rejected(RejectReason::TimeExpired));
        }
        if !self.is_playable(&word, &session.letters) {
            debug!("Rejected {} for session {}: not a valid word", word, id);
            return Ok(rejected(RejectReason::InvalidWord));
        }

        let points = self.points_for(&word);
        Ok(match self.store.accept_word(id, &word, points).await? {
            AcceptOutcome::Accepted { score } => {
                debug!("Accepted {} for session {} (+{}, total {})", word, id, points, score);
                Submission::Accepted { word, points, score }
            }
            AcceptOutcome::Rejected(reason) => rejected(reason),
        })
    }

    /// Every solution for a rack, uncapped.
    pub fn solutions_for(&self, letters: &[char]) -> Arc<SolutionSet> {
        self.generator.valid_words_for(letters)
    }

    /// Solutions for the letters an open session was dealt.
    pub async fn reveal(&self, id: &str) -> Result<Outcome<Arc<SolutionSet>>, GameError> {
        let session = match self.store.get(id).await? {
            Some(session) => session,
            None => return Ok(Err(RejectReason::SessionNotFound)),
        };
        if self.is_expired_for_timer(&session) {
            self.store.close(id).await?;
            return Ok(Err(RejectReason::TimeExpired));
        }
        Ok(Ok(self.solutions_for(&session.letters)))
    }

    pub async fn summarize_session(&self, id: &str) -> Result<Option<RoundSummary>, GameError> {
        Ok(self.store.summarize(id).await?)
    }

    pub async fn close_session(&self, id: &str) -> Result<Option<RoundSummary>, GameError> {
        Ok(self.store.close(id).await?)
    }

    /// End a round for scoring. A timed round that ran out is closed without a
    /// summary so its score cannot be recorded.
    pub async fn finish(&self, id: &str) -> Result<Outcome<RoundSummary>, GameError> {
        let session = match self.store.get(id).await? {
            Some(session) => session,
            None => return Ok(Err(RejectReason::SessionNotFound)),
        };
        if self.is_expired_for_timer(&session) {
            self.store.close(id).await?;
            return Ok(Err(RejectReason::TimeExpired));
        }
        Ok(self.store.close(id).await?.ok_or(RejectReason::SessionNotFound))
    }

    pub async fn active_sessions(&self) -> Result<usize, GameError> {
        Ok(self.store.count().await?)
    }
}
