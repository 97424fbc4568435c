use crate::index::Index;
use crate::snippet::{excerpt, SnippetConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Cosine similarity in [0, 1], rounded to 3 decimals.
    pub score: f32,
    pub document_id: String,
    pub page_number: u32,
    pub snippet: String,
}

/// Rank every page of `index` against `query` and return the best `k`.
pub fn search(query: &str, k: usize, index: &Index) -> Vec<SearchHit> {
    search_with(query, k, index, &SnippetConfig::default())
}

pub fn search_with(query: &str, k: usize, index: &Index, snippet: &SnippetConfig) -> Vec<SearchHit> {
    let built = match index {
        Index::Empty => return Vec::new(),
        Index::Built(b) => b,
    };
    if k == 0 {
        return Vec::new();
    }

    let q = built.vectorizer().transform(query);
    // rows and query are unit vectors (or zero), so the dot product is the cosine
    let mut scored: Vec<(usize, f32)> = built
        .matrix()
        .rows
        .iter()
        .enumerate()
        .map(|(row, weights)| (row, round_score(weights.dot(&q))))
        .collect();
    // stable: equal scores keep row order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);

    let words = built.vectorizer().known_words(query);
    tracing::debug!(query, k, num_pages = built.pages().len(), "search");
    scored
        .into_iter()
        .map(|(row, score)| {
            let page = &built.pages()[row];
            SearchHit {
                score,
                document_id: page.document_id.clone(),
                page_number: page.page_number,
                snippet: excerpt(&page.text, &words, snippet),
            }
        })
        .collect()
}

fn round_score(raw: f32) -> f32 {
    let clamped = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
    (clamped * 1000.0).round() / 1000.0
}
