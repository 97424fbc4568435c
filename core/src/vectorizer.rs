//! Vocabulary and tf-idf weighting model.
//!
//! A `Vectorizer` is fitted once per build on the whole corpus and persisted
//! with the index; queries go through the same instance.

use crate::index::{SparseRow, TermId};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfMode {
    /// idf = ln((1 + n) / (1 + df)) + 1
    #[default]
    Smooth,
    /// idf = ln(n / df) + 1
    Plain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weighting {
    /// Use 1 + ln(tf) instead of the raw count.
    pub sublinear_tf: bool,
    pub idf: IdfMode,
}

impl Weighting {
    fn tf(&self, count: u32) -> f32 {
        if count == 0 {
            0.0
        } else if self.sublinear_tf {
            1.0 + (count as f32).ln()
        } else {
            count as f32
        }
    }

    fn idf(&self, n: usize, df: u32) -> f32 {
        let (n, df) = (n as f32, df.max(1) as f32);
        match self.idf {
            IdfMode::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            IdfMode::Plain => (n / df).ln() + 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vectorizer {
    tokenizer: TokenizerConfig,
    weighting: Weighting,
    vocabulary: BTreeMap<String, TermId>,
    idf: Vec<f32>,
}

impl Vectorizer {
    /// Learn vocabulary and idf from `texts` and return the weighted rows, one per text.
    pub fn fit(tokenizer: &TokenizerConfig, weighting: Weighting, texts: &[&str]) -> (Self, Vec<SparseRow>) {
        let tok = Tokenizer::new(tokenizer);
        let counts: Vec<BTreeMap<String, u32>> = texts.iter().map(|t| term_counts(&tok, t)).collect();

        let mut df_by_term: BTreeMap<&str, u32> = BTreeMap::new();
        for page in &counts {
            for term in page.keys() {
                *df_by_term.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        // ids follow lexicographic term order
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(df_by_term.len());
        for (id, (term, df)) in df_by_term.iter().enumerate() {
            vocabulary.insert((*term).to_string(), id as TermId);
            idf.push(weighting.idf(texts.len(), *df));
        }

        let vectorizer = Self { tokenizer: tokenizer.clone(), weighting, vocabulary, idf };
        let rows = counts.iter().map(|page| vectorizer.weigh(page)).collect();
        (vectorizer, rows)
    }

    /// Embed `text` into this vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseRow {
        let tok = Tokenizer::new(&self.tokenizer);
        self.weigh(&term_counts(&tok, text))
    }

    fn weigh(&self, counts: &BTreeMap<String, u32>) -> SparseRow {
        let mut entries: Vec<(TermId, f32)> = counts
            .iter()
            .filter_map(|(term, &c)| {
                let id = *self.vocabulary.get(term)?;
                Some((id, self.weighting.tf(c) * self.idf[id as usize]))
            })
            .collect();
        entries.sort_by_key(|&(id, _)| id);
        let mut row = SparseRow { entries };
        let norm = row.norm();
        if norm > 0.0 {
            for (_, w) in row.entries.iter_mut() {
                *w /= norm;
            }
        }
        row
    }

    pub fn tokenizer_config(&self) -> &TokenizerConfig {
        &self.tokenizer
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, TermId> {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    /// Query words that exist in the vocabulary, unstemmed, for snippet placement.
    pub fn known_words(&self, text: &str) -> Vec<String> {
        let tok = Tokenizer::new(&self.tokenizer);
        let mut seen = HashSet::new();
        tok.words(text)
            .into_iter()
            .filter(|w| {
                tok.tokenize(w).first().is_some_and(|t| self.vocabulary.contains_key(t))
            })
            .filter(|w| seen.insert(w.clone()))
            .collect()
    }
}

fn term_counts(tok: &Tokenizer, text: &str) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for term in tok.tokenize(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}
