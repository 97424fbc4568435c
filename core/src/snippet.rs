use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Length of the excerpt in chars.
    pub max_chars: usize,
    /// Context kept before the first matching word.
    pub lead_chars: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self { max_chars: 200, lead_chars: 60 }
    }
}

/// A literal excerpt of `text`: a window around the earliest case-insensitive
/// whole-word occurrence of any of `words`, or the start of the page when none
/// occurs. Hits inside a longer word ("cat" in "concatenate") don't count.
pub fn excerpt(text: &str, words: &[String], config: &SnippetConfig) -> String {
    let first_idx = words
        .iter()
        .filter(|w| !w.trim().is_empty())
        .filter_map(|w| {
            RegexBuilder::new(&format!(r"\b{}\b", regex::escape(w))).case_insensitive(true).build().ok()
        })
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min();

    let start = match first_idx {
        Some(idx) => back_chars(text, idx, config.lead_chars),
        None => 0,
    };
    let rest = &text[start..];
    let end = rest.char_indices().nth(config.max_chars).map_or(rest.len(), |(i, _)| i);
    rest[..end].trim().to_string()
}

/// Byte offset `n` chars before `idx`, never splitting a char.
fn back_chars(text: &str, idx: usize, n: usize) -> usize {
    if n == 0 {
        return idx;
    }
    text[..idx].char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn no_match_takes_page_start() {
        let cfg = SnippetConfig { max_chars: 5, lead_chars: 2 };
        assert_eq!(excerpt("hello world", &words(&["absent"]), &cfg), "hello");
    }

    #[test]
    fn window_starts_before_match() {
        let cfg = SnippetConfig { max_chars: 7, lead_chars: 4 };
        assert_eq!(excerpt("aaaa bbb CAT ccc", &words(&["cat"]), &cfg), "bbb CAT");
    }

    #[test]
    fn hits_inside_longer_words_are_ignored() {
        let cfg = SnippetConfig { max_chars: 7, lead_chars: 0 };
        let text = "concatenate filler text the cat sat";
        assert_eq!(excerpt(text, &words(&["cat"]), &cfg), "cat sat");
        assert_eq!(excerpt("scatter only", &words(&["cat"]), &cfg), "scatter");
    }

    #[test]
    fn earliest_word_wins() {
        let cfg = SnippetConfig { max_chars: 3, lead_chars: 0 };
        assert_eq!(excerpt("one two three", &words(&["three", "two"]), &cfg), "two");
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let cfg = SnippetConfig { max_chars: 4, lead_chars: 2 };
        assert_eq!(excerpt("ééé café ñ", &words(&["café"]), &cfg), "é ca");
    }

    #[test]
    fn short_text_is_returned_whole() {
        assert_eq!(excerpt("tiny", &[], &SnippetConfig::default()), "tiny");
        assert_eq!(excerpt("", &words(&["x"]), &SnippetConfig::default()), "");
    }
}
