use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use log::{info, warn};
use crate::config::GameConfig;
use crate::error::CacheBuildError;
use crate::services::word_loader::Corpus;
use crate::utils::{can_form, letter_mask, signature_of};

/// Every corpus word that can be spelled from one rack, shortest first, then alphabetical.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolutionSet {
    words: Vec<String>,
}

impl SolutionSet {
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn has_word_of_length(&self, len: usize) -> bool {
        self.words.iter().any(|w| w.len() == len)
    }

    /// Group by length, each group alphabetical, optionally truncated to `cap` words.
    pub fn by_length(&self, cap: Option<usize>) -> BTreeMap<usize, Vec<String>> {
        let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for word in &self.words {
            let group = groups.entry(word.len()).or_default();
            if cap.map_or(true, |cap| group.len() < cap) {
                group.push(word.clone());
            }
        }
        groups
    }
}

/// Scan the whole corpus for words of `min_len..=letters.len()` letters spellable from `letters`.
pub fn compute_solutions(corpus: &Corpus, letters: &[char], min_len: usize) -> SolutionSet {
    let max_len = letters.len();
    let rack_mask = letter_mask(letters.iter().copied());

    let mut words: Vec<String> = corpus
        .iter()
        .filter(|word| word.len() >= min_len && word.len() <= max_len)
        .filter(|word| letter_mask(word.chars()) & !rack_mask == 0)
        .filter(|word| can_form(word, letters))
        .map(str::to_string)
        .collect();

    words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    SolutionSet { words }
}

/// Signature -> solutions for every curated base word, computed once before serving.
pub struct PuzzleCache {
    corpus: Arc<Corpus>,
    min_len: usize,
    entries: HashMap<String, Arc<SolutionSet>>,
}

impl PuzzleCache {
    pub fn build(corpus: Arc<Corpus>, config: &GameConfig) -> Result<PuzzleCache, CacheBuildError> {
        if corpus.is_empty() {
            return Err(CacheBuildError::EmptyCorpus);
        }
        if config.tiers.is_empty() {
            return Err(CacheBuildError::NoTiers);
        }

        let mut entries = HashMap::new();
        for tier in &config.tiers {
            if tier.base_words.is_empty() {
                return Err(CacheBuildError::EmptyTier(tier.name.clone()));
            }

            for word in &tier.base_words {
                if word.len() != tier.letter_count {
                    return Err(CacheBuildError::WrongLength {
                        word: word.clone(),
                        expected: tier.letter_count,
                    });
                }
                if !corpus.contains(word) {
                    return Err(CacheBuildError::BaseWordNotInCorpus(word.clone()));
                }

                let signature = signature_of(word);
                if entries.contains_key(&signature) {
                    continue;
                }
                let letters: Vec<char> = signature.chars().collect();
                let solutions = compute_solutions(&corpus, &letters, config.min_word_length);
                entries.insert(signature, Arc::new(solutions));
            }
        }

        let cache = PuzzleCache {
            corpus,
            min_len: config.min_word_length,
            entries,
        };
        info!(
            "Puzzle cache ready: {} signatures, {} solution words",
            cache.len(),
            cache.total_words()
        );
        Ok(cache)
    }

    pub fn lookup(&self, signature: &str) -> Option<Arc<SolutionSet>> {
        self.entries.get(signature).cloned()
    }

    /// Cached solutions for a rack, computing them on the spot when the rack
    /// was never precomputed.
    pub fn resolve(&self, letters: &[char]) -> Arc<SolutionSet> {
        let signature = signature_of(&letters.iter().collect::<String>());
        match self.lookup(&signature) {
            Some(solutions) => solutions,
            None => {
                warn!("Puzzle cache miss for {}; scanning corpus", signature);
                Arc::new(compute_solutions(&self.corpus, letters, self.min_len))
            }
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_words(&self) -> usize {
        self.entries.values().map(|s| s.len()).sum()
    }
}
