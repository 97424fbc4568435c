//! Page extraction: turning an uploaded document into ordered page texts.

use crate::error::{Error, Result};

/// Form feed, the page separator `pdftotext` and friends emit.
pub const PAGE_BREAK: u8 = 0x0C;

pub trait PageExtractor: Send + Sync {
    /// Whether a document with this file name can be extracted.
    fn supports(&self, file_name: &str) -> bool;

    /// One entry per page, in order. A page that cannot be read becomes an
    /// empty string; only a document that cannot be opened at all is an error.
    fn extract_pages(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<String>>;
}

fn has_extension(file_name: &str, ext: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(ext)
}

/// Plain UTF-8 text, pages separated by form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PageExtractor for PlainTextExtractor {
    fn supports(&self, file_name: &str) -> bool {
        has_extension(file_name, ".txt")
    }

    fn extract_pages(&self, _file_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let body = bytes.strip_suffix(&[PAGE_BREAK]).unwrap_or(bytes);
        Ok(body
            .split(|&b| b == PAGE_BREAK)
            .enumerate()
            .map(|(i, raw)| match std::str::from_utf8(raw) {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    tracing::warn!(page = i + 1, error = %e, "unreadable page, indexing as empty");
                    String::new()
                }
            })
            .collect())
    }
}

/// PDF documents, one entry per page in page-tree order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn supports(&self, file_name: &str) -> bool {
        has_extension(file_name, ".pdf")
    }

    fn extract_pages(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| Error::UnreadableDocument {
            name: file_name.to_string(),
            reason: e.to_string(),
        })?;
        let pages = doc
            .get_pages()
            .keys()
            .map(|&page| match doc.extract_text(&[page]) {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    tracing::warn!(document = file_name, page, error = %e, "unreadable page, indexing as empty");
                    String::new()
                }
            })
            .collect();
        Ok(pages)
    }
}

/// Dispatches on file name to the first extractor that supports it.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn PageExtractor>>,
}

impl ExtractorSet {
    pub fn new(extractors: Vec<Box<dyn PageExtractor>>) -> Self {
        Self { extractors }
    }

    /// `.txt` and `.pdf`.
    pub fn standard() -> Self {
        Self::new(vec![Box::new(PlainTextExtractor), Box::new(PdfExtractor)])
    }

    fn find(&self, file_name: &str) -> Option<&dyn PageExtractor> {
        self.extractors.iter().find(|e| e.supports(file_name)).map(|e| e.as_ref())
    }
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl PageExtractor for ExtractorSet {
    fn supports(&self, file_name: &str) -> bool {
        self.find(file_name).is_some()
    }

    fn extract_pages(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
        match self.find(file_name) {
            Some(ex) => ex.extract_pages(file_name, bytes),
            None => Err(Error::UnsupportedDocument(file_name.to_string())),
        }
    }
}

/// Document names double as document ids: non-empty, a bare file name.
pub fn validate_document_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("document name is empty".into()));
    }
    if trimmed != name || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::InvalidInput(format!("invalid document name: {name:?}")));
    }
    Ok(())
}

/// Checks that run before any index mutation.
pub fn check_document(extractor: &dyn PageExtractor, name: &str) -> Result<()> {
    validate_document_name(name)?;
    if !extractor.supports(name) {
        return Err(Error::UnsupportedDocument(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_pages(bytes: &[u8]) -> Vec<String> {
        PlainTextExtractor.extract_pages("doc.txt", bytes).unwrap()
    }

    #[test]
    fn splits_on_form_feed() {
        assert_eq!(text_pages(b"first page\x0c second page \x0c"), vec!["first page", "second page"]);
    }

    #[test]
    fn text_without_breaks_is_one_page() {
        assert_eq!(text_pages(b"just text"), vec!["just text"]);
        assert!(text_pages(b"").is_empty());
    }

    #[test]
    fn invalid_utf8_page_degrades_to_empty() {
        assert_eq!(text_pages(b"ok\x0c\xff\xfe\x0cstill ok"), vec!["ok", "", "still ok"]);
    }

    #[test]
    fn blank_pages_are_kept() {
        assert_eq!(text_pages(b"a\x0c\x0cb"), vec!["a", "", "b"]);
    }

    #[test]
    fn broken_pdf_is_unreadable_not_a_panic() {
        let res = PdfExtractor.extract_pages("book.pdf", b"%PDF-1.4");
        assert!(matches!(res, Err(Error::UnreadableDocument { .. })));
    }

    #[test]
    fn standard_set_routes_by_extension() {
        let set = ExtractorSet::standard();
        assert!(set.supports("notes.TXT"));
        assert!(set.supports("book.pdf"));
        assert!(!set.supports("slides.docx"));
        assert_eq!(set.extract_pages("a.txt", b"x\x0cy").unwrap(), vec!["x", "y"]);
        assert!(matches!(set.extract_pages("a.docx", b"x"), Err(Error::UnsupportedDocument(_))));
    }

    #[test]
    fn rejects_unsupported_and_bad_names() {
        let set = ExtractorSet::standard();
        assert!(check_document(&set, "book.TXT").is_ok());
        assert!(check_document(&set, "book.pdf").is_ok());
        assert!(matches!(check_document(&set, "book.docx"), Err(Error::UnsupportedDocument(_))));
        assert!(matches!(check_document(&PlainTextExtractor, "book.pdf"), Err(Error::UnsupportedDocument(_))));
        assert!(matches!(check_document(&set, "../x.txt"), Err(Error::InvalidInput(_))));
        assert!(matches!(check_document(&set, " "), Err(Error::InvalidInput(_))));
    }
}
