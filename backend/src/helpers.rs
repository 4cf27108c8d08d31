use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_VARIANT_READING: Regex = Regex::new(r" ?\[[^\]]*\]").unwrap();
    /// Abbreviations in brackets, no more than 20 characters, e.g. " (sī. syā.)"
    static ref RE_ABBREV_PARENS: Regex = Regex::new(r" \([^)]{0,20}\.\)").unwrap();
    static ref RE_PE_ELLIPSIS: Regex = Regex::new(r"…\s*pe\s*[॰.]?\s*…").unwrap();
    static ref RE_DOT_RUN: Regex = Regex::new(r"\.{3,}|…+").unwrap();
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    /// A full stop left detached after removing a variant reading, but not an ellipsis
    static ref RE_DETACHED_STOP: Regex = Regex::new(r" \.(\s|$)").unwrap();
    static ref RE_TITLE_NUMBERING: Regex = Regex::new(r"^\d*\.\s*").unwrap();
    static ref RE_ALL_NUMBERING: Regex = Regex::new(r"\d*\. *").unwrap();
}

/// Placeholder for a unified ellipsis while doubled periods are collapsed.
const ELLIPSIS_MARK: char = '\u{E000}';

/// Normalize a CST paragraph for matching and display.
///
/// Lowercases, drops curly quotes and variant readings, unifies the ellipsis
/// markers to ` ... ` and collapses whitespace.
pub fn clean_example(text: &str) -> String {
    let mut text = text.trim().to_lowercase();

    text = text.replace(['‘', '’'], "");
    text = RE_VARIANT_READING.replace_all(&text, "").into_owned();
    text = text.replace(" – ", ", ");

    let mark = ELLIPSIS_MARK.to_string();
    text = RE_PE_ELLIPSIS.replace_all(&text, mark.as_str()).into_owned();
    text = RE_DOT_RUN.replace_all(&text, mark.as_str()).into_owned();
    while text.contains("..") {
        text = text.replace("..", ".");
    }
    text = text.replace(ELLIPSIS_MARK, " ... ");

    text = text.replace(';', ",");
    text = RE_ABBREV_PARENS.replace_all(&text, "").into_owned();
    text = RE_WHITESPACE.replace_all(&text, " ").into_owned();
    text = text.replace(" ,", ",");
    text = RE_DETACHED_STOP.replace_all(&text, ".$1").into_owned();

    text.trim().to_string()
}

/// Normalize one verse line: commas become line breaks.
pub fn clean_gatha(text: &str) -> String {
    let mut text = clean_example(text);
    text = text.replace(" ,", ",");
    text = text.replace(" .", ".");
    text = text.replace(", ", ",\n");
    if text.ends_with(',') {
        text.push('\n');
    }
    text
}

/// Sutta or chapter title without its numbering or variant readings, lowercase.
///
/// "1. Mūlapariyāyasuttaṃ [mūlapariyāya]" -> "mūlapariyāyasuttaṃ"
pub fn clean_title(text: &str) -> String {
    let text = RE_WHITESPACE.replace_all(text.trim(), " ");
    let text = RE_TITLE_NUMBERING.replace(&text, "");
    let text = RE_VARIANT_READING.replace_all(&text, "");
    text.trim().to_lowercase()
}

/// Removes every "12. " style number in a heading.
pub fn strip_numbering(text: &str) -> String {
    RE_ALL_NUMBERING.replace_all(text, "").trim().to_string()
}

pub fn first_word(text: &str) -> String {
    text.split_whitespace().next().unwrap_or_default().to_string()
}

/// Collapses whitespace and shortens the text for log messages.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let text = RE_WHITESPACE.replace_all(text.trim(), " ");
    if text.chars().count() <= max_chars {
        text.into_owned()
    } else {
        let mut s: String = text.chars().take(max_chars).collect();
        s.push('…');
        s
    }
}

fn is_sentence_end(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if c != '.' && c != '?' && c != '!' {
        return false;
    }

    // A dot in an ellipsis run is never a boundary.
    if c == '.' {
        let prev_dot = i > 0 && chars[i - 1] == '.';
        let next_dot = i + 1 < chars.len() && chars[i + 1] == '.';
        if prev_dot || next_dot {
            return false;
        }
    }

    i + 1 == chars.len() || chars[i + 1].is_whitespace()
}

/// Turns sentence-ending periods into commas, leaving ellipsis runs alone.
pub fn periods_to_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let in_run = (i > 0 && chars[i - 1] == '.') || chars.get(i + 1) == Some(&'.');
            if *c == '.' && !in_run { ',' } else { *c }
        })
        .collect()
}

/// Split normalized text into sentences, keeping the closing punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for i in 0..chars.len() {
        // "12. evaṃ me sutaṃ": a paragraph number is not a sentence
        let only_digits = chars[start..i].iter().any(|c| c.is_ascii_digit())
            && chars[start..i].iter().all(|c| c.is_ascii_digit() || c.is_whitespace());
        if is_sentence_end(&chars, i) && !only_digits {
            let sentence: String = chars[start..=i].iter().collect();
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = i + 1;
        }
    }

    if start < chars.len() {
        let rest: String = chars[start..].iter().collect();
        let rest = rest.trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
    }

    sentences
}

/// A matched sentence with its neighbours in the same paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceWindow {
    pub prev: String,
    pub sentence: String,
    pub next: String,
}

impl SentenceWindow {
    /// The non-empty parts joined by single spaces.
    pub fn to_example(&self) -> String {
        [self.prev.as_str(), self.sentence.as_str(), self.next.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// Every sentence matching `is_match`, with the sentence before and after it.
pub fn sentence_windows<F>(sentences: &[String], is_match: F) -> Vec<SentenceWindow>
where
    F: Fn(&str) -> bool,
{
    sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| is_match(s))
        .map(|(i, s)| SentenceWindow {
            prev: if i > 0 { sentences[i - 1].clone() } else { String::new() },
            sentence: s.clone(),
            next: sentences.get(i + 1).cloned().unwrap_or_default(),
        })
        .collect()
}
