// ── Guest secret generation ──
//
// Secrets are read aloud and typed on phones, so the default shape is
// two capitalized dictionary words and a digit: `Forest-Harbor7`.
// Every random draw comes from the operating system's CSPRNG.

use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use secrecy::SecretString;
use tracing::warn;

const EMBEDDED_WORDS: &str = include_str!("../words.txt");

const MIN_WORD_LEN: usize = 3;
const MAX_WORD_LEN: usize = 10;
const SEPARATOR: char = '-';
const FALLBACK_LEN: usize = 16;

/// Curated dictionary the secret words are drawn from.
///
/// Only purely alphabetic words of 3 to 10 characters are kept.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Parse a whitespace-separated word list, discarding unusable entries.
    pub fn parse(text: &str) -> Self {
        let mut words: Vec<String> = text
            .split_whitespace()
            .filter(|w| (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&w.chars().count()))
            .filter(|w| w.chars().all(char::is_alphabetic))
            .map(str::to_lowercase)
            .collect();
        words.sort_unstable();
        words.dedup();
        Self { words }
    }

    /// The list compiled into the binary.
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_WORDS)
    }

    /// Load a list from a file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn choose(&self, rng: &mut OsRng) -> Option<&str> {
        self.words.choose(rng).map(String::as_str)
    }
}

/// Produces a fresh guest secret on every call.
#[derive(Debug, Clone)]
pub struct SecretRandomizer {
    words: WordList,
}

impl SecretRandomizer {
    pub fn new(words: WordList) -> Self {
        Self { words }
    }

    /// `Word-Word<digit>`, or 16 random letters and digits if the
    /// word list is empty.
    pub fn generate(&self) -> SecretString {
        let mut rng = OsRng;

        let secret = match (self.words.choose(&mut rng), self.words.choose(&mut rng)) {
            (Some(first), Some(second)) => {
                let digit: u8 = rng.gen_range(0..10);
                format!(
                    "{}{SEPARATOR}{}{digit}",
                    capitalize(first),
                    capitalize(second)
                )
            }
            _ => {
                warn!("word list is empty, falling back to random characters");
                rng.sample_iter(&Alphanumeric)
                    .take(FALLBACK_LEN)
                    .map(char::from)
                    .collect()
            }
        };

        SecretString::from(secret)
    }
}

impl Default for SecretRandomizer {
    fn default() -> Self {
        Self::new(WordList::embedded())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use secrecy::ExposeSecret;

    use super::*;

    /// Splits `Word-Word7` into its parts, if it has that shape.
    fn split_default(secret: &str) -> Option<(&str, &str, char)> {
        let (first, rest) = secret.split_once(SEPARATOR)?;
        let digit = rest.chars().last()?;
        let second = &rest[..rest.len() - digit.len_utf8()];
        Some((first, second, digit))
    }

    fn is_capitalized_word(word: &str) -> bool {
        let mut chars = word.chars();
        chars.next().is_some_and(char::is_uppercase)
            && chars.all(char::is_lowercase)
            && (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&word.chars().count())
    }

    #[test]
    fn parse_filters_length_and_alphabet() {
        let list = WordList::parse("an ok cat horse3 don't elephants extraordinary River river");
        assert_eq!(list.words, ["cat", "elephants", "river"]);
    }

    #[test]
    fn embedded_list_is_usable() {
        assert!(WordList::embedded().len() > 1000);
    }

    #[test]
    fn default_policy_matches_word_word_digit() {
        let randomizer = SecretRandomizer::default();
        for _ in 0..1000 {
            let secret = randomizer.generate();
            let value = secret.expose_secret();
            let Some((first, second, digit)) = split_default(value) else {
                panic!("unexpected secret shape: {value}");
            };
            assert!(is_capitalized_word(first), "bad first word in {value}");
            assert!(is_capitalized_word(second), "bad second word in {value}");
            assert!(digit.is_ascii_digit(), "bad trailing digit in {value}");
        }
    }

    #[test]
    fn consecutive_secrets_differ() {
        let randomizer = SecretRandomizer::default();
        let draws: Vec<String> = (0..1000)
            .map(|_| randomizer.generate().expose_secret().to_owned())
            .collect();

        assert!(draws.windows(2).all(|pair| pair[0] != pair[1]));
        let distinct: HashSet<_> = draws.iter().collect();
        assert!(distinct.len() >= 990, "only {} distinct secrets", distinct.len());
    }

    #[test]
    fn empty_word_list_falls_back_to_alphanumeric() {
        let randomizer = SecretRandomizer::new(WordList::parse(""));
        let secret = randomizer.generate();
        let value = secret.expose_secret();
        assert_eq!(value.len(), FALLBACK_LEN);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(value, randomizer.generate().expose_secret());
    }

    #[test]
    fn capitalize_normalizes_case() {
        assert_eq!(capitalize("harbor"), "Harbor");
        assert_eq!(capitalize("hARBOR"), "Harbor");
        assert_eq!(capitalize(""), "");
    }
}
