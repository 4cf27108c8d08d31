use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STANZA_TIMEOUT_MS: u64 = 1000;

/// Settings for loading CST texts and extracting citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Directory holding the CST romanized XML files (`s0101m.mul.xml`, ...)
    pub cst_xml_dir: PathBuf,
    /// Wall-clock bound for walking the lines of one stanza
    pub stanza_timeout_ms: u64,
    /// Replace `<note>` variant readings with inline ` [text] ` runs
    pub unwrap_notes: bool,
}

impl Default for CitationConfig {
    fn default() -> Self {
        CitationConfig {
            cst_xml_dir: PathBuf::from("resources/tipitaka-xml/romn"),
            stanza_timeout_ms: DEFAULT_STANZA_TIMEOUT_MS,
            unwrap_notes: true,
        }
    }
}

impl CitationConfig {
    /// Defaults overridden by `DPD_CST_XML_DIR`, `DPD_STANZA_TIMEOUT_MS` and
    /// `DPD_UNWRAP_NOTES`, after loading a `.env` file if there is one.
    pub fn from_env() -> Self {
        dotenv().ok();

        let mut config = CitationConfig::default();

        if let Ok(dir) = env::var("DPD_CST_XML_DIR")
            && !dir.trim().is_empty() {
                config.cst_xml_dir = PathBuf::from(dir);
            }

        if let Some(ms) = env::var("DPD_STANZA_TIMEOUT_MS").ok().and_then(|v| v.trim().parse::<u64>().ok()) {
            config.stanza_timeout_ms = ms;
        }

        if let Ok(v) = env::var("DPD_UNWRAP_NOTES") {
            config.unwrap_notes = v.to_lowercase() != "false";
        }

        config
    }

    pub fn with_cst_xml_dir(mut self, dir: PathBuf) -> Self {
        self.cst_xml_dir = dir;
        self
    }

    pub fn stanza_timeout(&self) -> Duration {
        Duration::from_millis(self.stanza_timeout_ms)
    }
}
