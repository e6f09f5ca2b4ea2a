//! Curated puzzle base words. Within one list no two words are anagrams of
//! each other, so two different picks never deal the same letters.

/// Levels 1 through 5.
pub const SIX_LETTER_WORDS: &[&str] = &[
    "ALMOST", "BASKET", "CASTLE", "DANGER", "EAGLES", "FABRIC", "GARLIC", "HANDLE",
    "ISLAND", "JANGLE", "KISMET", "LAMENT", "MANGLE", "NACHOS", "OBTUSE", "PALACE",
    "QUARTS", "RAISIN", "SAILOR", "TABLES", "UNSAFE", "VALISE", "WALNUT", "YANKED",
    "ZEALOT", "BRANCH", "CLAMPS", "DREAMS", "FLAUNT", "GRAINS", "HASTEN", "INSERT",
    "JOINTS", "KELVIN", "LOATHE", "MODEST", "OPERAS", "PLANET", "QUIVER", "REASON",
    "SENIOR", "TANGLE", "UNITES", "VARIES", "WASTER", "YOGURT", "STRIPE", "MASTER",
    "LISTEN", "HEARTS", "TRADES", "CREATE", "PASTEL", "ALERTS", "ANTLER", "REMITS",
    "STRIDE", "SATIRE", "SORTIE",
];

/// Levels 6 through 10.
pub const SEVEN_LETTER_WORDS: &[&str] = &[
    "CAPTAIN", "DOLPHIN", "EARNEST", "FASHION", "GLAMOUR", "HARVEST", "JOURNEY", "KITCHEN",
    "LANTERN", "MONSTER", "NOSTRIL", "ORCHARD", "PARTIES", "QUARTER", "ROASTED", "SHELTER",
    "TRAINED", "UPSTAGE", "VOLCANO", "WARNING", "BLASTER", "CHAPTER", "DESTINY", "FREIGHT",
    "GRANITE", "HOLSTER", "MARINES", "PAINTER", "REALIST", "SPARTAN", "TEACHER",
];

/// Level 11 and up.
pub const EIGHT_LETTER_WORDS: &[&str] = &[
    "TRIANGLE", "ABSOLUTE", "BACKPACK", "CHAMPION", "DAUGHTER", "ELEPHANT", "FOUNTAIN", "GRATEFUL",
    "HOSPITAL", "INTERVAL", "LOCATION", "MOUNTAIN", "NOTEBOOK", "PAINTERS", "QUESTION", "RELATION",
    "SANDWICH", "TREASURE", "UMBRELLA", "VACATION", "WHISTLER", "STRANGER", "MATERIAL", "DINOSAUR",
    "CAROUSEL",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::signature_of;
    use std::collections::HashSet;

    fn assert_unique_signatures(words: &[&str]) {
        let mut seen = HashSet::new();
        for word in words {
            assert!(seen.insert(signature_of(word)), "{} repeats another word's letters", word);
        }
    }

    #[test]
    fn test_no_duplicate_signatures_per_tier() {
        assert_unique_signatures(SIX_LETTER_WORDS);
        assert_unique_signatures(SEVEN_LETTER_WORDS);
        assert_unique_signatures(EIGHT_LETTER_WORDS);
    }

    #[test]
    fn test_word_lengths() {
        assert!(SIX_LETTER_WORDS.iter().all(|w| w.len() == 6));
        assert!(SEVEN_LETTER_WORDS.iter().all(|w| w.len() == 7));
        assert!(EIGHT_LETTER_WORDS.iter().all(|w| w.len() == 8));
    }

    #[test]
    fn test_shipped_lexicon_covers_every_tier() {
        use std::path::Path;
        use std::sync::Arc;
        use crate::config::GameConfig;
        use crate::services::puzzle_cache::PuzzleCache;
        use crate::services::word_loader::Corpus;

        let config = GameConfig::default();
        let share = Path::new(env!("CARGO_MANIFEST_DIR")).join("share");
        let corpus = Corpus::from_share_dir(&share, "en", config.min_word_length, config.max_word_length).unwrap();
        assert!(corpus.len() > 20_000);
        for word in ["TEAL", "LETS", "SCAT", "CLEAT", "ACES", "LACES", "STALE"] {
            assert!(corpus.contains(word), "{} missing from the en lexicon", word);
        }
        for word in SIX_LETTER_WORDS.iter().chain(SEVEN_LETTER_WORDS).chain(EIGHT_LETTER_WORDS) {
            assert!(corpus.contains(word), "{} missing from the en lexicon", word);
        }

        let cache = PuzzleCache::build(Arc::new(corpus), &config).unwrap();
        assert_eq!(cache.len(), SIX_LETTER_WORDS.len() + SEVEN_LETTER_WORDS.len() + EIGHT_LETTER_WORDS.len());
        for word in SIX_LETTER_WORDS.iter().chain(SEVEN_LETTER_WORDS).chain(EIGHT_LETTER_WORDS) {
            let solutions = cache.lookup(&signature_of(word)).unwrap();
            assert!(solutions.contains(word));
        }
    }
}
