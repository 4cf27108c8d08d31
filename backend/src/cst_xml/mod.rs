//! Loading and navigating the CST XML texts.

pub mod encoding;
pub mod document;
pub mod xml_parser;

pub use document::{Document, NodeId};
pub use xml_parser::{load_document, parse_document, LoadOptions};
