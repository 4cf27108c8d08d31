use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::CitationConfig;
use crate::cst_texts::cst_xml_path;
use crate::cst_xml::{load_document, Document, LoadOptions};
use crate::logger;
use crate::types::LoadError;

/// Read-through cache of parsed CST documents, keyed by book key.
///
/// Owned by the caller and passed to the extractor explicitly. Cached
/// documents are never mutated; call `invalidate()` or `clear()` when the XML
/// files change on disk.
#[derive(Debug)]
pub struct DocumentCache {
    cst_xml_dir: PathBuf,
    options: LoadOptions,
    docs: RwLock<HashMap<String, Arc<Document>>>,
}

impl DocumentCache {
    pub fn new(cst_xml_dir: &Path, options: LoadOptions) -> Self {
        DocumentCache {
            cst_xml_dir: cst_xml_dir.to_path_buf(),
            options,
            docs: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CitationConfig) -> Self {
        DocumentCache::new(&config.cst_xml_dir, LoadOptions { unwrap_notes: config.unwrap_notes })
    }

    pub fn cst_xml_dir(&self) -> &Path {
        &self.cst_xml_dir
    }

    /// The parsed document for `book`, loading it on first use.
    pub fn get(&self, book: &str) -> Result<Arc<Document>, LoadError> {
        if let Some(doc) = self.docs.read().get(book) {
            return Ok(Arc::clone(doc));
        }

        let path = cst_xml_path(&self.cst_xml_dir, book)
            .ok_or_else(|| LoadError::UnknownBook(book.to_string()))?;

        logger::info(&format!("Loading {} from {:?}", book, path));
        let doc = Arc::new(load_document(&path, self.options)?);

        // A concurrent caller may have loaded it meanwhile, keep the first one.
        let mut docs = self.docs.write();
        let entry = docs.entry(book.to_string()).or_insert(doc);
        Ok(Arc::clone(entry))
    }

    /// Insert an already parsed document, e.g. one built in memory.
    pub fn insert(&self, book: &str, doc: Document) -> Arc<Document> {
        let doc = Arc::new(doc);
        self.docs.write().insert(book.to_string(), Arc::clone(&doc));
        doc
    }

    pub fn contains(&self, book: &str) -> bool {
        self.docs.read().contains_key(book)
    }

    pub fn invalidate(&self, book: &str) -> bool {
        self.docs.write().remove(book).is_some()
    }

    pub fn clear(&self) {
        self.docs.write().clear();
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}
