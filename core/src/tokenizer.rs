use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Which words are dropped before they reach the vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopWords {
    #[default]
    English,
    None,
    Custom(Vec<String>),
}

/// Tokenizer settings. These are persisted with every index so that queries
/// are embedded exactly the way the pages were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub stopwords: StopWords,
    /// Apply the English Snowball stemmer after stop-word removal.
    pub stem: bool,
    /// Tokens shorter than this (in chars) are dropped.
    pub min_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { stopwords: StopWords::English, stem: false, min_token_len: 2 }
    }
}

pub struct Tokenizer {
    custom: Option<HashSet<String>>,
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        let custom = match &config.stopwords {
            StopWords::Custom(words) => Some(words.iter().map(|w| w.to_lowercase()).collect()),
            _ => None,
        };
        Self { custom, config: config.clone() }
    }

    fn is_stopword(&self, token: &str) -> bool {
        match &self.config.stopwords {
            StopWords::English => ENGLISH_STOPWORDS.contains(token),
            StopWords::None => false,
            StopWords::Custom(_) => self.custom.as_ref().is_some_and(|set| set.contains(token)),
        }
    }

    /// Normalized (NFKC, lowercase) words that survive the length and
    /// stop-word filters, before stemming. Used to locate snippet windows.
    pub fn words(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|token| token.chars().count() >= self.config.min_token_len)
            .filter(|token| !self.is_stopword(token))
            .map(str::to_string)
            .collect()
    }

    /// Terms as they enter the vocabulary.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let words = self.words(text);
        if !self.config.stem {
            return words;
        }
        words.into_iter().map(|w| STEMMER.stem(&w).into_owned()).collect()
    }
}

/// Tokenize with the default settings: NFKC, lowercase, English stop-words, no stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::new(&TokenizerConfig::default()).tokenize(text)
}
