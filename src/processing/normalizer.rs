//! Text normalization applied before embedding

use regex::Regex;

/// Lower-cases text and strips digits and punctuation, leaving single-spaced words.
pub struct TextNormalizer {
    digit_regex: Regex,
    symbol_regex: Regex,
    whitespace_regex: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        let digit_regex = Regex::new(r"\d+").expect("Invalid digit regex");

        // Anything that is neither a letter, a number nor whitespace. Underscores
        // and combining marks count as punctuation here.
        let symbol_regex = Regex::new(r"[^\p{L}\p{N}\s]").expect("Invalid symbol regex");

        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        Self {
            digit_regex,
            symbol_regex,
            whitespace_regex,
        }
    }

    /// Normalize raw extracted text. Pure and idempotent.
    pub fn normalize(&self, raw_text: &str) -> String {
        let lowered = raw_text.to_lowercase();
        let without_digits = self.digit_regex.replace_all(&lowered, " ");
        let without_symbols = self.symbol_regex.replace_all(&without_digits, " ");
        self.whitespace_regex
            .replace_all(&without_symbols, " ")
            .trim()
            .to_string()
    }
}
