pub mod generator;
pub mod puzzle_cache;
pub mod puzzle_words;
pub mod word_loader;
