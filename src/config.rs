use chrono::{DateTime, Duration, Utc};
use crate::services::puzzle_words::{EIGHT_LETTER_WORDS, SEVEN_LETTER_WORDS, SIX_LETTER_WORDS};
use crate::store::GameMode;

/// Shortest and longest words the game knows about.
pub const MIN_WORD_LENGTH: usize = 3;
pub const MAX_WORD_LENGTH: usize = 8;

/// A difficulty band: every level up to `max_level` deals `letter_count` letters
/// drawn from one of `base_words`. The last tier has no ceiling.
#[derive(Debug, Clone)]
pub struct Tier {
    pub name: String,
    pub max_level: Option<u32>,
    pub letter_count: usize,
    pub base_words: Vec<String>,
}

impl Tier {
    pub fn new(name: &str, max_level: Option<u32>, letter_count: usize, words: &[&str]) -> Self {
        Tier {
            name: name.to_string(),
            max_level,
            letter_count,
            base_words: words.iter().map(|w| w.to_uppercase()).collect(),
        }
    }

    fn covers(&self, level: u32) -> bool {
        self.max_level.map_or(true, |max| level <= max)
    }
}

/// points = length * per_letter + (length - min_length) * per_extra_letter
#[derive(Debug, Clone, Copy)]
pub struct ScoringRules {
    pub per_letter: u32,
    pub per_extra_letter: u32,
    pub min_length: usize,
}

impl ScoringRules {
    pub fn points_for(&self, word_len: usize) -> u32 {
        let extra = word_len.saturating_sub(self.min_length) as u32;
        word_len as u32 * self.per_letter + extra * self.per_extra_letter
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimerRules {
    pub duration: Duration,
    pub grace: Duration,
}

impl TimerRules {
    /// A timed round is over once more than duration + grace has elapsed.
    /// Untimed rounds never run out.
    pub fn is_expired(&self, mode: GameMode, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match mode {
            GameMode::Untimed => false,
            GameMode::Timed => now - created_at > self.duration + self.grace,
        }
    }
}

/// Gameplay tunables shared by the puzzle engine and the session stores.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub min_word_length: usize,
    pub max_word_length: usize,
    pub scoring: ScoringRules,
    pub timer: TimerRules,
    pub session_ttl: Duration,
    pub admin_session_ttl: Duration,
    pub reaper_interval: Duration,
    pub redis_retry_interval: Duration,
    pub max_words_per_length: usize,
    pub tiers: Vec<Tier>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            min_word_length: MIN_WORD_LENGTH,
            max_word_length: MAX_WORD_LENGTH,
            scoring: ScoringRules {
                per_letter: 10,
                per_extra_letter: 5,
                min_length: MIN_WORD_LENGTH,
            },
            timer: TimerRules {
                duration: Duration::seconds(120),
                grace: Duration::seconds(5),
            },
            session_ttl: Duration::hours(2),
            admin_session_ttl: Duration::hours(24),
            reaper_interval: Duration::minutes(10),
            redis_retry_interval: Duration::seconds(5),
            max_words_per_length: 12,
            tiers: vec![
                Tier::new("six", Some(5), 6, SIX_LETTER_WORDS),
                Tier::new("seven", Some(10), 7, SEVEN_LETTER_WORDS),
                Tier::new("eight", None, 8, EIGHT_LETTER_WORDS),
            ],
        }
    }
}

impl GameConfig {
    /// Level 0 is treated as level 1. Levels past every ceiling land in the last tier.
    pub fn tier_for_level(&self, level: u32) -> Option<&Tier> {
        let level = level.max(1);
        self.tiers
            .iter()
            .find(|tier| tier.covers(level))
            .or_else(|| self.tiers.last())
    }

    pub fn with_timer_seconds(mut self, seconds: i64) -> Self {
        self.timer.duration = Duration::seconds(seconds);
        self
    }
}
