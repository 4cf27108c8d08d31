use std::path::PathBuf;

use dotenvy::dotenv;

use dpd_backend::citations::{find_source_sutta_examples, ExtractorOptions};
use dpd_backend::cst_xml::LoadOptions;
use dpd_backend::document_cache::DocumentCache;
use dpd_backend::types::Citation;

/// The fixture CST directory with excerpts of dn1, mn1, an4 and kn2.
pub fn cst_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/romn")
}

pub fn cache_setup() -> DocumentCache {
    dotenv().ok();
    DocumentCache::new(&cst_dir(), LoadOptions::default())
}

#[allow(dead_code)]
pub fn find(cache: &DocumentCache, book: &str, pattern: &str) -> Vec<Citation> {
    find_source_sutta_examples(cache, book, pattern, &ExtractorOptions::default()).unwrap()
}

#[allow(dead_code)]
pub fn sources(citations: &[Citation]) -> Vec<&str> {
    citations.iter().map(|c| c.source.as_str()).collect()
}
