use crate::error::{Error, Result};
use crate::vectorizer::Vectorizer;
use serde::{Deserialize, Serialize};

pub type TermId = u32;

/// One page of one document: the retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub document_id: String,
    /// 1-based.
    pub page_number: u32,
    pub text: String,
}

impl PageRecord {
    /// `page_number` counts from 1; 0 is a caller bug and stored indexes holding
    /// it fail validation.
    pub fn new(document_id: impl Into<String>, page_number: u32, text: impl Into<String>) -> Self {
        debug_assert!(page_number >= 1, "page numbers are 1-based");
        Self { document_id: document_id.into(), page_number, text: text.into() }
    }
}

/// Every page of every known document. Row order of the index follows this order.
pub type Corpus = Vec<PageRecord>;

/// Sparse row of the weight matrix, entries sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseRow {
    pub entries: Vec<(TermId, f32)>,
}

impl SparseRow {
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|&(_, w)| w == 0.0)
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Merge-join dot product; both rows must be sorted by term id.
    pub fn dot(&self, other: &SparseRow) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }
}

/// (num_pages x vocabulary_size) matrix of L2-normalised tf-idf weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    pub rows: Vec<SparseRow>,
    pub cols: usize,
}

impl WeightMatrix {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltIndex {
    pub(crate) vectorizer: Vectorizer,
    pub(crate) matrix: WeightMatrix,
    pub(crate) pages: Vec<PageRecord>,
}

impl BuiltIndex {
    pub(crate) fn new(vectorizer: Vectorizer, matrix: WeightMatrix, pages: Vec<PageRecord>) -> Self {
        debug_assert_eq!(matrix.row_count(), pages.len());
        Self { vectorizer, matrix, pages }
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn matrix(&self) -> &WeightMatrix {
        &self.matrix
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Structural checks applied to anything read back from storage.
    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(Error::Corrupt("built index without pages".into()));
        }
        if self.matrix.row_count() != self.pages.len() {
            return Err(Error::Corrupt(format!(
                "weight matrix has {} rows for {} pages",
                self.matrix.row_count(),
                self.pages.len()
            )));
        }
        let vocab = self.vectorizer.vocabulary_size();
        if self.matrix.cols != vocab || self.vectorizer.idf().len() != vocab {
            return Err(Error::Corrupt(format!(
                "matrix width {} and idf length {} disagree with vocabulary size {vocab}",
                self.matrix.cols,
                self.vectorizer.idf().len()
            )));
        }
        if let Some(p) = self.pages.iter().find(|p| p.page_number == 0) {
            return Err(Error::Corrupt(format!("page 0 recorded for {}", p.document_id)));
        }
        for (i, row) in self.matrix.rows.iter().enumerate() {
            let sorted = row.entries.windows(2).all(|w| w[0].0 < w[1].0);
            let in_range = row.entries.iter().all(|&(t, _)| (t as usize) < vocab);
            if !sorted || !in_range {
                return Err(Error::Corrupt(format!("row {i} has invalid term ids")));
            }
        }
        Ok(())
    }
}

/// The searchable state. `Empty` is a real, queryable state, not a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Index {
    #[default]
    Empty,
    Built(BuiltIndex),
}

impl Index {
    pub fn is_empty(&self) -> bool {
        matches!(self, Index::Empty)
    }

    pub fn num_pages(&self) -> usize {
        match self {
            Index::Empty => 0,
            Index::Built(b) => b.pages.len(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        match self {
            Index::Empty => 0,
            Index::Built(b) => b.vectorizer.vocabulary_size(),
        }
    }

    pub fn pages(&self) -> &[PageRecord] {
        match self {
            Index::Empty => &[],
            Index::Built(b) => &b.pages,
        }
    }

    /// The corpus this index was built from, in row order.
    pub fn corpus(&self) -> Corpus {
        self.pages().to_vec()
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Index::Empty => Ok(()),
            Index::Built(b) => b.validate(),
        }
    }
}
