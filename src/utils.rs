use rand::seq::SliceRandom;
use rand::RngCore;

/// Check if a word can be spelled from the available tiles.
/// Every tile is used at most once, so "LULL" needs three L's and a U.
pub fn can_form(word: &str, letters: &[char]) -> bool {
    let mut available: Vec<char> = letters.iter().map(|c| c.to_ascii_uppercase()).collect();

    for ch in word.chars() {
        let ch = ch.to_ascii_uppercase();
        match available.iter().position(|&c| c == ch) {
            Some(idx) => {
                available.swap_remove(idx);
            }
            None => return false,
        }
    }

    true
}

/// Canonical key for a multiset of letters: uppercase, sorted.
/// Two racks are anagrams of each other iff their signatures are equal.
pub fn signature_of(letters: &str) -> String {
    let mut chars: Vec<char> = letters.chars().map(|c| c.to_ascii_uppercase()).collect();
    chars.sort_unstable();
    chars.into_iter().collect()
}

/// One bit per distinct letter A-Z. If a word has a bit the rack lacks, it cannot be formed.
pub fn letter_mask(letters: impl IntoIterator<Item = char>) -> u32 {
    letters.into_iter().fold(0, |mask, c| {
        let c = c.to_ascii_uppercase();
        if c.is_ascii_uppercase() {
            mask | 1 << (c as u8 - b'A')
        } else {
            mask
        }
    })
}

/// Uniformly random display order for a word's letters.
pub fn shuffle_letters(word: &str) -> Vec<char> {
    let mut rng = rand::thread_rng();
    let mut letters: Vec<char> = word.chars().map(|c| c.to_ascii_uppercase()).collect();
    letters.shuffle(&mut rng);
    letters
}

/// 128 random bits, hex encoded. Used for round ids and admin tokens.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
