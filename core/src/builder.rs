use crate::config::IndexConfig;
use crate::index::{BuiltIndex, Index, PageRecord, WeightMatrix};
use crate::vectorizer::Vectorizer;

/// Build a fresh index over the whole corpus. Row `i` is `corpus[i]`.
///
/// Pure: nothing is persisted here. The same corpus and config always give
/// the same index.
pub fn build_index(corpus: &[PageRecord], config: &IndexConfig) -> Index {
    if corpus.is_empty() {
        tracing::info!("corpus is empty, index is empty");
        return Index::Empty;
    }

    let texts: Vec<&str> = corpus.iter().map(|p| p.text.as_str()).collect();
    let (vectorizer, rows) = Vectorizer::fit(&config.tokenizer, config.weighting, &texts);
    let cols = vectorizer.vocabulary_size();
    let matrix = WeightMatrix { rows, cols };

    tracing::info!(num_pages = corpus.len(), num_terms = cols, "built index");
    Index::Built(BuiltIndex::new(vectorizer, matrix, corpus.to_vec()))
}
