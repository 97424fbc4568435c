//! Page-level tf-idf indexing: build, persist and query.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod persist;
pub mod search;
pub mod snippet;
pub mod tokenizer;
pub mod vectorizer;

pub use builder::build_index;
pub use catalog::{Catalog, DocumentSummary, IngestReport};
pub use config::IndexConfig;
pub use error::{Error, Result};
pub use extract::{ExtractorSet, PageExtractor, PdfExtractor, PlainTextExtractor};
pub use index::{BuiltIndex, Corpus, Index, PageRecord, SparseRow, TermId, WeightMatrix};
pub use persist::{IndexPaths, IndexStore};
pub use search::{search, search_with, SearchHit};
