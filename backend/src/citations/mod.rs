//! Source citations and examples from the CST texts.
//!
//! One linear pass over the `<p>` paragraphs of a book: header paragraphs
//! update the running source/sutta labels, every other match becomes a
//! citation with either the surrounding sentences or the whole stanza.

pub mod book_rules;
pub mod stanza;

use std::time::Duration;

use regex::Regex;

use crate::config::CitationConfig;
use crate::cst_xml::{Document, NodeId};
use crate::document_cache::DocumentCache;
use crate::helpers::{clean_example, sentence_windows, snippet, split_sentences};
use crate::logger;
use crate::types::{Citation, CitationError};

pub use book_rules::{book_rule, BookRule, ScanState, BOOK_RULES};
pub use stanza::{assemble_stanza, Stanza, StanzaError};

use book_rules::{HeaderIssue, HeaderTrigger};
use stanza::is_stanza_rend;

const SNIPPET_LEN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorOptions {
    pub stanza_timeout: Duration,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        ExtractorOptions {
            stanza_timeout: Duration::from_millis(crate::config::DEFAULT_STANZA_TIMEOUT_MS),
        }
    }
}

impl From<&CitationConfig> for ExtractorOptions {
    fn from(config: &CitationConfig) -> Self {
        ExtractorOptions { stanza_timeout: config.stanza_timeout() }
    }
}

/// Citations for every occurrence of `pattern` in the book's document.
///
/// Books without a rule give an empty list.
pub fn find_citations(doc: &Document, book: &str, pattern: &Regex) -> Vec<Citation> {
    find_citations_with(doc, book, pattern, &ExtractorOptions::default())
}

pub fn find_citations_with(doc: &Document, book: &str, pattern: &Regex, options: &ExtractorOptions) -> Vec<Citation> {
    let Some(rule) = book_rule(book) else {
        logger::debug(&format!("No citation rule for book '{}'", book));
        return Vec::new();
    };

    let mut scan = Scan {
        doc,
        rule,
        pattern,
        options,
        state: ScanState::default(),
        last_stanza: None,
        citations: Vec::new(),
    };

    for p in doc.paragraphs() {
        scan.paragraph(*p);
    }

    scan.citations
}

/// Load the book through `cache` and find `pattern` in it.
///
/// The pattern is checked first, and books without a rule return an empty
/// list without touching the filesystem.
pub fn find_source_sutta_examples(
    cache: &DocumentCache,
    book: &str,
    pattern: &str,
    options: &ExtractorOptions,
) -> Result<Vec<Citation>, CitationError> {
    let re = Regex::new(pattern)?;

    if book_rule(book).is_none() {
        logger::info(&format!("Book '{}' has no citation rule, nothing to search", book));
        return Ok(Vec::new());
    }

    let doc = cache.get(book)?;
    let citations = find_citations_with(&doc, book, &re, options);

    logger::info(&format!("{}: {} citations for '{}'", book, citations.len(), pattern));
    Ok(citations)
}

struct Scan<'a> {
    doc: &'a Document,
    rule: &'static BookRule,
    pattern: &'a Regex,
    options: &'a ExtractorOptions,
    state: ScanState,
    last_stanza: Option<NodeId>,
    citations: Vec<Citation>,
}

impl Scan<'_> {
    fn paragraph(&mut self, p: NodeId) {
        self.track_header(p);

        // Front matter before the first header has no citation context.
        if !self.state.header_seen {
            return;
        }

        let text = clean_example(&self.doc.text(p));
        if !self.pattern.is_match(&text) {
            return;
        }

        let rend = self.doc.attr(p, "rend").unwrap_or_default();
        if is_stanza_rend(rend) {
            self.stanza(p);
        } else {
            self.sentences(&text);
        }
    }

    fn track_header(&mut self, p: NodeId) {
        if self.rule.trigger != HeaderTrigger::ChapterDiv && self.doc.attr(p, "rend").is_none() {
            logger::warn(&format!(
                "{}: paragraph without rend attribute, searching '{}': {}",
                self.rule.book,
                self.pattern.as_str(),
                snippet(&self.doc.text(p), SNIPPET_LEN),
            ));
            return;
        }

        if !self.rule.is_header(self.doc, p) {
            return;
        }
        self.state.header_seen = true;

        match self.rule.derive_header(self.doc, p, &mut self.state) {
            Ok(update) => self.state.apply(update),
            Err(issue @ HeaderIssue::SkippedSubhead(_)) => {
                logger::debug(&format!("{}: {}", self.rule.book, issue));
            }
            Err(issue) => {
                logger::warn(&format!(
                    "{}: header not updated, {}, searching '{}': {}",
                    self.rule.book,
                    issue,
                    self.pattern.as_str(),
                    snippet(&self.doc.text(p), SNIPPET_LEN),
                ));
            }
        }
    }

    fn stanza(&mut self, p: NodeId) {
        match assemble_stanza(self.doc, p, self.options.stanza_timeout) {
            Ok(stanza) => {
                // Several lines of one stanza can match.
                if self.last_stanza == Some(stanza.first_line) {
                    return;
                }
                self.last_stanza = Some(stanza.first_line);
                self.push(stanza.text);
            }
            Err(e) => {
                logger::error(&format!(
                    "{}: stanza skipped, {}, searching '{}': {}",
                    self.rule.book,
                    e,
                    self.pattern.as_str(),
                    snippet(&self.doc.text(p), SNIPPET_LEN),
                ));
            }
        }
    }

    fn sentences(&mut self, text: &str) {
        let sentences = split_sentences(text);
        for window in sentence_windows(&sentences, |s| self.pattern.is_match(s)) {
            self.push(window.to_example());
        }
    }

    fn push(&mut self, example: String) {
        self.citations.push(Citation::new(&self.state.source, &self.state.sutta, example));
    }
}
