use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Typing-difficulty proxies for a passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextMetrics {
    pub typed_chars: u32,
    pub words: u32,
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop everything that is neither a word character nor whitespace, then collapse whitespace.
pub fn normalize_for_difficulty(text: &str) -> String {
    collapse_whitespace(&NON_WORD.replace_all(text, ""))
}

pub fn score_text(text: &str) -> TextMetrics {
    let normalized = normalize_for_difficulty(text);
    TextMetrics {
        typed_chars: normalized.chars().count() as u32,
        words: WORD.find_iter(&normalized).count() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_is_not_typed() {
        assert_eq!(normalize_for_difficulty("  Hello,   world!\n\tIt's  me. "), "Hello world Its me");
        let m = score_text("Hello, world! It's me.");
        assert_eq!(m, TextMetrics { typed_chars: 18, words: 4 });
    }

    #[test]
    fn test_unicode_letters_count_as_word_characters() {
        let m = score_text("Café — naïve façade");
        assert_eq!(m.words, 3);
        assert_eq!(m.typed_chars, "Café naïve façade".chars().count() as u32);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(score_text("  ... !!! "), TextMetrics::default());
    }
}
