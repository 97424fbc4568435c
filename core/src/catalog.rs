//! The live index: ingestion, removal and rebuilds behind one writer,
//! searches against immutable snapshots.

use crate::builder::build_index;
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::extract::{check_document, PageExtractor};
use crate::index::{Corpus, Index, PageRecord};
use crate::persist::IndexStore;
use crate::search::{search_with, SearchHit};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub pages: usize,
    /// True when a document with the same id was replaced.
    pub replaced: bool,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub pages: usize,
}

pub struct Catalog {
    store: IndexStore,
    config: IndexConfig,
    extractor: Box<dyn PageExtractor>,
    writer: Mutex<()>,
    current: RwLock<Arc<Index>>,
}

impl Catalog {
    /// Load whatever the store holds (possibly nothing) and serve it.
    pub fn open(store: IndexStore, config: IndexConfig, extractor: Box<dyn PageExtractor>) -> Result<Self> {
        config.validate()?;
        let index = store.load()?;
        Ok(Self {
            store,
            config,
            extractor,
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(index)),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The index currently served. Never observed half-built.
    pub fn snapshot(&self) -> Arc<Index> {
        self.current.read().clone()
    }

    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        let index = self.snapshot();
        search_with(query, k, &index, &self.config.snippet)
    }

    /// Validate, extract and index a document. Replaces any earlier document
    /// with the same name.
    pub fn ingest(&self, name: &str, bytes: &[u8]) -> Result<IngestReport> {
        check_document(self.extractor.as_ref(), name)?;
        let pages = self.extractor.extract_pages(name, bytes)?;
        self.ingest_pages(name, pages)
    }

    /// Index pages that were already extracted.
    pub fn ingest_pages(&self, name: &str, pages: Vec<String>) -> Result<IngestReport> {
        crate::extract::validate_document_name(name)?;
        let _guard = self.writer.lock();
        let mut corpus = self.snapshot().corpus();
        let before = corpus.len();
        corpus.retain(|p| p.document_id != name);
        let replaced = corpus.len() != before;

        let added = pages.len();
        corpus.extend(
            pages.into_iter().enumerate().map(|(i, text)| PageRecord::new(name, i as u32 + 1, text)),
        );
        let total_pages = corpus.len();
        self.commit(&corpus)?;
        tracing::info!(document = name, pages = added, replaced, total_pages, "ingested document");
        Ok(IngestReport { document_id: name.to_string(), pages: added, replaced, total_pages })
    }

    /// Drop a document and rebuild. Removing the last one leaves an empty index.
    pub fn remove_document(&self, name: &str) -> Result<usize> {
        let _guard = self.writer.lock();
        let mut corpus = self.snapshot().corpus();
        let before = corpus.len();
        corpus.retain(|p| p.document_id != name);
        let removed = before - corpus.len();
        if removed == 0 {
            return Err(Error::NotFound { kind: "document", name: name.to_string() });
        }
        self.commit(&corpus)?;
        tracing::info!(document = name, pages = removed, "removed document");
        Ok(removed)
    }

    /// Full rebuild of the current corpus with the current configuration.
    pub fn rebuild(&self) -> Result<usize> {
        let _guard = self.writer.lock();
        let corpus = self.snapshot().corpus();
        self.commit(&corpus)?;
        Ok(corpus.len())
    }

    /// Documents in corpus order with their page counts.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        let index = self.snapshot();
        let mut out: Vec<DocumentSummary> = Vec::new();
        for page in index.pages() {
            match out.iter_mut().find(|d| d.document_id == page.document_id) {
                Some(d) => d.pages += 1,
                None => out.push(DocumentSummary { document_id: page.document_id.clone(), pages: 1 }),
            }
        }
        out
    }

    pub fn page(&self, document_id: &str, page_number: u32) -> Option<PageRecord> {
        self.snapshot()
            .pages()
            .iter()
            .find(|p| p.document_id == document_id && p.page_number == page_number)
            .cloned()
    }

    // Caller holds the writer lock. The new index is only published after it is on disk.
    fn commit(&self, corpus: &Corpus) -> Result<()> {
        let index = build_index(corpus, &self.config);
        self.store.save(&index)?;
        *self.current.write() = Arc::new(index);
        Ok(())
    }
}
