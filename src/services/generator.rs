use std::collections::BTreeMap;
use std::sync::Arc;
use rand::seq::SliceRandom;
use serde::Serialize;
use log::debug;
use crate::config::GameConfig;
use crate::services::puzzle_cache::{PuzzleCache, SolutionSet};
use crate::utils::shuffle_letters;

/// What a player sees when a round starts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub letters: Vec<char>,
    pub level: u32,
    pub words_by_length: BTreeMap<usize, Vec<String>>,
    /// Number of words in `words_by_length`, i.e. after the per-length cap.
    pub total_words: usize,
    /// Whether some solution uses every letter. Decided before capping.
    pub has_full_word: bool,
}

pub struct PuzzleGenerator {
    cache: Arc<PuzzleCache>,
    config: Arc<GameConfig>,
}

impl PuzzleGenerator {
    pub fn new(cache: Arc<PuzzleCache>, config: Arc<GameConfig>) -> Self {
        PuzzleGenerator { cache, config }
    }

    /// Deal a puzzle for `level`. None only if no tier has base words, which
    /// the cache refuses to build with.
    pub fn generate(&self, level: u32) -> Option<Puzzle> {
        let tier = self.config.tier_for_level(level)?;
        let base_word = tier.base_words.choose(&mut rand::thread_rng())?;
        let letters = shuffle_letters(base_word);

        let solutions = self.cache.resolve(&letters);
        let has_full_word = solutions.has_word_of_length(tier.letter_count);
        let words_by_length = solutions.by_length(Some(self.config.max_words_per_length));
        let total_words = words_by_length.values().map(Vec::len).sum();

        debug!(
            "Generated level {} puzzle ({} tier): {} of {} words shown",
            level,
            tier.name,
            total_words,
            solutions.len()
        );

        Some(Puzzle {
            letters,
            level: level.max(1),
            words_by_length,
            total_words,
            has_full_word,
        })
    }

    /// Every solution for a rack, uncapped. Used for the end-of-round reveal.
    pub fn valid_words_for(&self, letters: &[char]) -> Arc<SolutionSet> {
        self.cache.resolve(letters)
    }

    pub fn cache(&self) -> &PuzzleCache {
        &self.cache
    }
}
