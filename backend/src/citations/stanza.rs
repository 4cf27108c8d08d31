//! Reassembles a verse (gāthā) from its line paragraphs.
//!
//! CST marks each line of a stanza as its own `<p>`: `gatha1`, then
//! `gatha2` / `gatha3`, and `gathalast`.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::cst_xml::{Document, NodeId};
use crate::helpers::{clean_gatha, periods_to_commas};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanzaRole {
    First,
    Middle,
    Last,
}

impl StanzaRole {
    pub fn of(rend: &str) -> Option<Self> {
        match rend {
            "gatha1" => Some(StanzaRole::First),
            "gatha2" | "gatha3" => Some(StanzaRole::Middle),
            "gathalast" => Some(StanzaRole::Last),
            _ => None,
        }
    }

    fn of_node(doc: &Document, id: NodeId) -> Option<Self> {
        if !doc.is_element(id, "p") {
            return None;
        }
        doc.attr(id, "rend").and_then(StanzaRole::of)
    }
}

/// Any `rend` naming a verse line.
pub fn is_stanza_rend(rend: &str) -> bool {
    rend.contains("gatha")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StanzaError {
    #[error("stanza walk did not finish within {0:?}")]
    Timeout(Duration),

    #[error("unexpected '{0}' paragraph inside a stanza")]
    Malformed(String),

    #[error("stanza has no first line")]
    NoFirstLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    /// The `gatha1` paragraph, identifies the stanza.
    pub first_line: NodeId,
    pub text: String,
}

fn check_guard(started: Instant, timeout: Duration) -> Result<(), StanzaError> {
    if started.elapsed() >= timeout {
        return Err(StanzaError::Timeout(timeout));
    }
    Ok(())
}

fn first_line(doc: &Document, line: NodeId) -> String {
    let mut text = clean_gatha(&doc.text(line));
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn middle_line(doc: &Document, line: NodeId) -> String {
    let text = periods_to_commas(&clean_gatha(&doc.text(line)));
    let mut text = text.trim_end_matches('\n').to_string();
    if !text.ends_with(',') {
        text.push(',');
    }
    text.push('\n');
    text
}

fn last_line(doc: &Document, line: NodeId) -> String {
    let text = clean_gatha(&doc.text(line));
    let text = text.trim_end_matches('\n');
    match text.strip_suffix(',') {
        Some(stripped) => format!("{}.", stripped),
        None => text.to_string(),
    }
}

/// Walk back from a matching line to `gatha1`, then forward to `gathalast`.
///
/// Both walks are bounded by `timeout`.
pub fn assemble_stanza(doc: &Document, line: NodeId, timeout: Duration) -> Result<Stanza, StanzaError> {
    let started = Instant::now();

    let mut first = line;
    loop {
        check_guard(started, timeout)?;
        match StanzaRole::of_node(doc, first) {
            Some(StanzaRole::First) => break,
            Some(StanzaRole::Middle) | Some(StanzaRole::Last) => {
                first = doc.prev_element_sibling(first).ok_or(StanzaError::NoFirstLine)?;
            }
            None => {
                let rend = doc.attr(first, "rend").unwrap_or_default().to_string();
                return Err(StanzaError::Malformed(rend));
            }
        }
    }

    let mut text = first_line(doc, first);
    let mut current = first;
    loop {
        check_guard(started, timeout)?;
        let Some(next) = doc.next_element_sibling(current) else {
            break;
        };
        match StanzaRole::of_node(doc, next) {
            Some(StanzaRole::Middle) => text.push_str(&middle_line(doc, next)),
            Some(StanzaRole::Last) => {
                text.push_str(&last_line(doc, next));
                break;
            }
            // The next stanza or prose
            _ => break,
        }
        current = next;
    }

    Ok(Stanza {
        first_line: first,
        text: text.trim_end().to_string(),
    })
}
