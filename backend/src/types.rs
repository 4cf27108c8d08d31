use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One example found in a CST text: where it comes from and what it says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Citation code, e.g. "MN107", "AN4.52", "DHP1"
    pub source: String,
    /// Lowercase sutta title, e.g. "brahmajālasuttaṃ"
    pub sutta: String,
    /// Example sentence(s) or the assembled stanza
    pub example: String,
}

impl Citation {
    pub fn new(source: &str, sutta: &str, example: String) -> Self {
        Citation {
            source: source.to_string(),
            sutta: sutta.to_string(),
            example,
        }
    }

    pub fn as_tuple(&self) -> (&str, &str, &str) {
        (&self.source, &self.sutta, &self.example)
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error in {path:?}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("No CST file is registered for book '{0}'")]
    UnknownBook(String),
}

#[derive(Error, Debug)]
pub enum CitationError {
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "tsv")]
    Tsv,
    #[serde(rename = "json")]
    Json,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid OutputFormat value: {0}")]
pub struct ParseOutputFormatError(String);

impl FromStr for OutputFormat {
    type Err = ParseOutputFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ParseOutputFormatError(s.to_string())),
        }
    }
}
