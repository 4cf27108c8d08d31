//! Per-book header rules for the CST texts.
//!
//! Each collection marks its suttas differently. Instead of a branch per book,
//! every book key maps to a small `BookRule` which the scanner evaluates with
//! one generic routine.

use lazy_static::lazy_static;
use regex::Regex;

use crate::cst_xml::{Document, NodeId};
use crate::helpers::{clean_title, first_word, strip_numbering};

lazy_static! {
    /// "12. Lohiccasuttaṃ" -> ("12", "Lohiccasuttaṃ")
    static ref RE_NUMBERED_HEADING: Regex = Regex::new(r"^(\d+)\.\s+(.*)$").unwrap();
    static ref RE_LEADING_NUMBER: Regex = Regex::new(r"^(\d+)\.").unwrap();
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Which paragraphs carry header information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTrigger {
    /// `<p rend="subhead">`
    Subhead,
    /// `<p rend="hangnum">`, the verse number lines
    Hangnum,
    /// Every paragraph inside a `<div type="chapter">`
    ChapterDiv,
}

/// How the citation code is derived from a header paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// Count subheads naming a sutta, plus the suttas of the earlier volumes.
    SuttaCounter { offset: u32 },
    /// `LABEL.n` from the `n` attribute of the following paragraph.
    NextParagraphNumber,
    /// No citation code, only the sutta title.
    Unnumbered,
    /// Number of the nearest preceding `<head rend="chapter">`, plus an offset.
    ChapterHead { offset: u32, separator: &'static str },
    /// Number of the `<head>` of the enclosing chapter div.
    ChapterDiv,
    /// Count every subhead.
    RunningCounter,
    /// Cūḷaniddesa: Pārāyana and Khaggavisāṇa, then the Khaggavisāṇa commentary.
    Niddesa2,
    /// Vinaya `LABEL.chapter.section`; listed subheads are not sections.
    VinayaSection { skip_subheads: &'static [&'static str] },
}

/// How the sutta title is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// The header paragraph without numbering.
    Subhead,
    /// The first word of the header paragraph.
    FirstWord,
    /// The title part of the chapter head.
    Chapter,
    /// "chapter title, section title"
    Section,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookRule {
    pub book: &'static str,
    pub label: &'static str,
    pub trigger: HeaderTrigger,
    pub numbering: Numbering,
    pub title: TitleRule,
}

const fn rule(
    book: &'static str,
    label: &'static str,
    trigger: HeaderTrigger,
    numbering: Numbering,
    title: TitleRule,
) -> BookRule {
    BookRule { book, label, trigger, numbering, title }
}

use HeaderTrigger as T;
use Numbering as N;
use TitleRule as R;

const VINAYA_SKIP: &[&str] = &["soṇassa pabbajjā", "abhiññātānaṃ pabbajjā"];

pub static BOOK_RULES: &[BookRule] = &[
    // dn2 follows the 13 suttas of dn1, dn3 the 13+10 of dn1 and dn2
    rule("dn1", "DN", T::Subhead, N::ChapterHead { offset: 0, separator: "" }, R::Chapter),
    rule("dn2", "DN", T::Subhead, N::ChapterHead { offset: 13, separator: "" }, R::Chapter),
    rule("dn3", "DN", T::Subhead, N::ChapterHead { offset: 23, separator: "" }, R::Chapter),

    rule("mn1", "MN", T::Subhead, N::SuttaCounter { offset: 0 }, R::Subhead),
    rule("mn2", "MN", T::Subhead, N::SuttaCounter { offset: 50 }, R::Subhead),
    rule("mn3", "MN", T::Subhead, N::SuttaCounter { offset: 100 }, R::Subhead),

    rule("sn1", "SN", T::Subhead, N::Unnumbered, R::Subhead),
    rule("sn2", "SN", T::Subhead, N::Unnumbered, R::Subhead),
    rule("sn3", "SN", T::Subhead, N::Unnumbered, R::Subhead),
    rule("sn4", "SN", T::Subhead, N::Unnumbered, R::Subhead),
    rule("sn5", "SN", T::Subhead, N::Unnumbered, R::Subhead),

    rule("an1", "AN1", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an2", "AN2", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an3", "AN3", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an4", "AN4", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an5", "AN5", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an6", "AN6", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an7", "AN7", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an8", "AN8", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an9", "AN9", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an10", "AN10", T::Subhead, N::NextParagraphNumber, R::Subhead),
    rule("an11", "AN11", T::Subhead, N::NextParagraphNumber, R::Subhead),

    // Mahāvagga and Cūḷavagga
    rule("vin3", "VIN3", T::Subhead, N::VinayaSection { skip_subheads: VINAYA_SKIP }, R::Section),
    rule("vin4", "VIN4", T::Subhead, N::VinayaSection { skip_subheads: VINAYA_SKIP }, R::Section),

    rule("kn1", "KHP", T::ChapterDiv, N::ChapterDiv, R::Chapter),
    rule("kn2", "DHP", T::Hangnum, N::ChapterHead { offset: 0, separator: "" }, R::Chapter),
    rule("kn3", "UD", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn4", "ITI", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn5", "SNP", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn6", "VV", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn7", "PV", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn8", "TH", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn9", "THI", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn10", "APA", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn11", "API", T::Subhead, N::RunningCounter, R::Subhead),
    rule("kn12", "BV", T::Hangnum, N::ChapterHead { offset: 0, separator: "" }, R::Chapter),
    rule("kn13", "CP", T::Hangnum, N::ChapterHead { offset: 0, separator: "" }, R::Chapter),
    rule("kn14", "JA", T::Subhead, N::RunningCounter, R::FirstWord),
    rule("kn15", "NIDD1", T::Hangnum, N::ChapterHead { offset: 0, separator: "." }, R::Chapter),
    rule("kn16", "NIDD2", T::Subhead, N::Niddesa2, R::FirstWord),
];

pub fn book_rule(book: &str) -> Option<&'static BookRule> {
    BOOK_RULES.iter().find(|r| r.book == book)
}

/// Running labels and counters of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub source: String,
    pub sutta: String,
    pub sutta_counter: u32,
    pub kn_counter: u32,
    /// Set once the first header paragraph of the book has been seen.
    pub header_seen: bool,
}

/// Why a header paragraph did not update the labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderIssue {
    MissingAttribute { attr: &'static str },
    NoChapterHead,
    UnparsedChapter(String),
    SkippedSubhead(String),
}

impl std::fmt::Display for HeaderIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderIssue::MissingAttribute { attr } => write!(f, "missing '{}' attribute on the next paragraph", attr),
            HeaderIssue::NoChapterHead => write!(f, "no preceding chapter head"),
            HeaderIssue::UnparsedChapter(text) => write!(f, "chapter head not numbered: '{}'", text),
            HeaderIssue::SkippedSubhead(text) => write!(f, "skipped subhead '{}'", text),
        }
    }
}

/// New labels from a header paragraph. `source: None` keeps the previous source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderUpdate {
    pub source: Option<String>,
    pub sutta: String,
}

impl ScanState {
    pub fn apply(&mut self, update: HeaderUpdate) {
        if let Some(source) = update.source {
            self.source = source;
        }
        self.sutta = update.sutta;
    }
}

fn normalized_text(doc: &Document, id: NodeId) -> String {
    RE_WHITESPACE.replace_all(doc.text(id).trim(), " ").into_owned()
}

fn chapter_head_of(doc: &Document, p: NodeId) -> Option<NodeId> {
    doc.find_previous(p, |d, n| d.matches(n, "head", "rend", "chapter"))
}

fn chapter_div_of(doc: &Document, p: NodeId) -> Option<NodeId> {
    doc.find_ancestor(p, |d, n| d.matches(n, "div", "type", "chapter"))
}

/// ("12", "Lohiccasuttaṃ") from "12. Lohiccasuttaṃ"
fn split_numbered_heading(text: &str) -> Result<(u32, String), HeaderIssue> {
    RE_NUMBERED_HEADING
        .captures(text)
        .and_then(|caps| {
            let num = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some((num, caps.get(2)?.as_str().to_string()))
        })
        .ok_or_else(|| HeaderIssue::UnparsedChapter(text.to_string()))
}

impl BookRule {
    /// Whether this paragraph is a header for the book's markup.
    pub fn is_header(&self, doc: &Document, p: NodeId) -> bool {
        match self.trigger {
            HeaderTrigger::Subhead => doc.attr(p, "rend") == Some("subhead"),
            HeaderTrigger::Hangnum => doc.attr(p, "rend") == Some("hangnum"),
            HeaderTrigger::ChapterDiv => chapter_div_of(doc, p).is_some(),
        }
    }

    fn title(&self, heading: &str, chapter_title: Option<&str>) -> String {
        match self.title {
            TitleRule::Subhead => clean_title(heading),
            TitleRule::FirstWord => first_word(&clean_title(heading)),
            TitleRule::Chapter => clean_title(chapter_title.unwrap_or(heading)),
            TitleRule::Section => {
                let section = strip_numbering(&heading.to_lowercase());
                match chapter_title {
                    Some(chapter) => format!("{}, {}", strip_numbering(chapter), section).to_lowercase(),
                    None => section,
                }
            }
        }
    }

    /// Derive the new labels for a header paragraph, advancing the counters in `state`.
    pub fn derive_header(&self, doc: &Document, p: NodeId, state: &mut ScanState) -> Result<HeaderUpdate, HeaderIssue> {
        let heading = normalized_text(doc, p);
        let label = self.label;

        match self.numbering {
            Numbering::SuttaCounter { offset } => {
                if heading.contains("suttaṃ") {
                    state.sutta_counter += 1;
                }
                Ok(HeaderUpdate {
                    source: Some(format!("{}{}", label, state.sutta_counter + offset)),
                    sutta: self.title(&heading, None),
                })
            }

            Numbering::NextParagraphNumber => {
                let n = doc
                    .next_element_sibling(p)
                    .and_then(|next| doc.attr(next, "n"))
                    .ok_or(HeaderIssue::MissingAttribute { attr: "n" })?;
                Ok(HeaderUpdate {
                    source: Some(format!("{}.{}", label, n)),
                    sutta: self.title(&heading, None),
                })
            }

            Numbering::Unnumbered => Ok(HeaderUpdate {
                source: Some(String::new()),
                sutta: self.title(&heading, None),
            }),

            Numbering::ChapterHead { offset, separator } => {
                let head = chapter_head_of(doc, p).ok_or(HeaderIssue::NoChapterHead)?;
                let (num, chapter_title) = split_numbered_heading(&normalized_text(doc, head))?;
                Ok(HeaderUpdate {
                    source: Some(format!("{}{}{}", label, separator, num + offset)),
                    sutta: self.title(&heading, Some(&chapter_title)),
                })
            }

            Numbering::ChapterDiv => {
                let head = chapter_div_of(doc, p)
                    .and_then(|div| doc.find_descendant(div, "head"))
                    .ok_or(HeaderIssue::NoChapterHead)?;
                let (num, chapter_title) = split_numbered_heading(&normalized_text(doc, head))?;
                Ok(HeaderUpdate {
                    source: Some(format!("{}{}", label, num)),
                    sutta: self.title(&heading, Some(&chapter_title)),
                })
            }

            Numbering::RunningCounter => {
                state.kn_counter += 1;
                Ok(HeaderUpdate {
                    source: Some(format!("{}{}", label, state.kn_counter)),
                    sutta: self.title(&heading, None),
                })
            }

            Numbering::Niddesa2 => {
                state.kn_counter += 1;
                let c = state.kn_counter;
                let title = self.title(&heading, None);
                // 1-20 Pārāyana and Khaggavisāṇa, 21-37 Cūḷaniddesa, 38- Khaggavisāṇa commentary
                let update = if c < 21 {
                    HeaderUpdate { source: Some(format!("{}.{}", label, c)), sutta: title }
                } else if c < 38 {
                    HeaderUpdate { source: Some(format!("{}.{}", label, c - 20)), sutta: title }
                } else {
                    HeaderUpdate {
                        source: Some(format!("{}.19", label)),
                        sutta: format!("khaggavisāṇasuttaniddeso, {}", title),
                    }
                };
                Ok(update)
            }

            Numbering::VinayaSection { skip_subheads } => {
                let subhead = heading.to_lowercase();
                if skip_subheads.iter().any(|s| *s == subhead) {
                    return Err(HeaderIssue::SkippedSubhead(subhead));
                }

                let section_num = RE_LEADING_NUMBER
                    .captures(&subhead)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string());

                let head = chapter_head_of(doc, p).ok_or(HeaderIssue::NoChapterHead)?;
                let chapter_text = normalized_text(doc, head).to_lowercase();
                let chapter_num = RE_LEADING_NUMBER
                    .captures(&chapter_text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string());

                // Without both numbers the previous source stays.
                let source = match (chapter_num, section_num) {
                    (Some(chapter), Some(section)) => Some(format!("{}.{}.{}", label, chapter, section)),
                    _ => None,
                };

                Ok(HeaderUpdate {
                    source,
                    sutta: self.title(&subhead, Some(&chapter_text)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst_xml::{parse_document, LoadOptions};

    fn doc(xml: &str) -> Document {
        parse_document(xml, LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_every_rule_has_a_cst_text() {
        for r in BOOK_RULES {
            assert!(crate::cst_texts::cst_text(r.book).is_some(), "no CST file for {}", r.book);
        }
    }

    #[test]
    fn test_book_rule_lookup() {
        assert_eq!(book_rule("an4").unwrap().label, "AN4");
        assert!(book_rule("vin1").is_none());
        assert!(book_rule("").is_none());
    }

    #[test]
    fn test_dn_offsets() {
        let d = doc(r#"<body><head rend="chapter">2. Mahānidānasuttaṃ</head><p rend="subhead">Paṭiccasamuppādo</p></body>"#);
        let p = d.paragraphs()[0];
        let mut state = ScanState::default();

        let update = book_rule("dn2").unwrap().derive_header(&d, p, &mut state).unwrap();
        assert_eq!(update.source.as_deref(), Some("DN15"));
        assert_eq!(update.sutta, "mahānidānasuttaṃ");

        let update = book_rule("dn3").unwrap().derive_header(&d, p, &mut state).unwrap();
        assert_eq!(update.source.as_deref(), Some("DN25"));
    }

    #[test]
    fn test_mn_counts_only_sutta_subheads() {
        let d = doc(r#"<body>
            <p rend="subhead">1. Cūḷasīhanādasuttaṃ</p>
            <p rend="subhead">Upādānakathā</p>
            <p rend="subhead">2. Mahāsīhanādasuttaṃ</p>
        </body>"#);
        let rule = book_rule("mn2").unwrap();
        let mut state = ScanState::default();
        let sources: Vec<String> = d.paragraphs().iter()
            .map(|p| rule.derive_header(&d, *p, &mut state).unwrap().source.unwrap())
            .collect();
        assert_eq!(sources, vec!["MN51", "MN51", "MN52"]);
    }

    #[test]
    fn test_an_uses_next_paragraph_number() {
        let d = doc(r#"<body>
            <p rend="subhead">2. Sīlasuttaṃ</p>
            <p rend="bodytext" n="12">Sīlaṃ...</p>
        </body>"#);
        let p = d.paragraphs()[0];
        let update = book_rule("an4").unwrap().derive_header(&d, p, &mut ScanState::default()).unwrap();
        assert_eq!(update.source.as_deref(), Some("AN4.12"));
        assert_eq!(update.sutta, "sīlasuttaṃ");
    }

    #[test]
    fn test_an_missing_number_is_issue() {
        let d = doc(r#"<body><p rend="subhead">2. Sīlasuttaṃ</p><p rend="bodytext">Sīlaṃ</p></body>"#);
        let p = d.paragraphs()[0];
        let issue = book_rule("an4").unwrap().derive_header(&d, p, &mut ScanState::default()).unwrap_err();
        assert_eq!(issue, HeaderIssue::MissingAttribute { attr: "n" });
    }

    #[test]
    fn test_vinaya_section() {
        let d = doc(r#"<body>
            <head rend="chapter">1. Mahākhandhako</head>
            <p rend="subhead">5. Upasampadākathā</p>
            <p rend="subhead">Soṇassa pabbajjā</p>
            <p rend="subhead">Pabbajjākathā</p>
        </body>"#);
        let rule = book_rule("vin3").unwrap();
        let ps = d.paragraphs();
        let mut state = ScanState::default();

        let update = rule.derive_header(&d, ps[0], &mut state).unwrap();
        assert_eq!(update.source.as_deref(), Some("VIN3.1.5"));
        assert_eq!(update.sutta, "mahākhandhako, upasampadākathā");

        assert!(matches!(rule.derive_header(&d, ps[1], &mut state), Err(HeaderIssue::SkippedSubhead(_))));

        let update = rule.derive_header(&d, ps[2], &mut state).unwrap();
        assert_eq!(update.source, None);
        assert_eq!(update.sutta, "mahākhandhako, pabbajjākathā");
    }

    #[test]
    fn test_niddesa2_ranges() {
        let d = doc(r#"<body><p rend="subhead">Ajitamāṇavapucchāniddeso paṭhamo</p></body>"#);
        let p = d.paragraphs()[0];
        let rule = book_rule("kn16").unwrap();

        let mut state = ScanState { kn_counter: 20, ..ScanState::default() };
        let update = rule.derive_header(&d, p, &mut state).unwrap();
        assert_eq!(update.source.as_deref(), Some("NIDD2.1"));
        assert_eq!(update.sutta, "ajitamāṇavapucchāniddeso");

        let mut state = ScanState { kn_counter: 40, ..ScanState::default() };
        let update = rule.derive_header(&d, p, &mut state).unwrap();
        assert_eq!(update.source.as_deref(), Some("NIDD2.19"));
        assert_eq!(update.sutta, "khaggavisāṇasuttaniddeso, ajitamāṇavapucchāniddeso");
    }

    #[test]
    fn test_khp_chapter_div() {
        let d = doc(r#"<body><div type="chapter"><head rend="chapter">2. Dasasikkhāpadaṃ</head>
            <p rend="bodytext">Pāṇātipātā veramaṇī.</p></div></body>"#);
        let p = d.paragraphs()[0];
        let rule = book_rule("kn1").unwrap();
        assert!(rule.is_header(&d, p));
        let update = rule.derive_header(&d, p, &mut ScanState::default()).unwrap();
        assert_eq!(update.source.as_deref(), Some("KHP2"));
        assert_eq!(update.sutta, "dasasikkhāpadaṃ");
    }

    #[test]
    fn test_nidd1_separator() {
        let d = doc(r#"<body><head rend="chapter">3. Purābhedasuttaniddeso</head><p rend="hangnum">84.</p></body>"#);
        let p = d.paragraphs()[0];
        let update = book_rule("kn15").unwrap().derive_header(&d, p, &mut ScanState::default()).unwrap();
        assert_eq!(update.source.as_deref(), Some("NIDD1.3"));
    }
}
