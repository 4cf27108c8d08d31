//! Builds a `Document` from the VRI CST XML markup.
//!
//! Load-time cleanup:
//! - `<pb/>` page breaks are dropped
//! - `<note>` variant readings become inline ` [text] ` runs (when `unwrap_notes`)
//! - `<hi rend="paranum">` and `<hi rend="dot">` are unwrapped into their parent

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cst_xml::document::{Document, NodeId};
use crate::cst_xml::encoding::read_xml_file;
use crate::types::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub unwrap_notes: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { unwrap_notes: true }
    }
}

/// What an open tag turned into, so the matching end tag can be handled.
enum OpenTag {
    Element(NodeId),
    Unwrapped,
    Note { text: String },
}

/// Read and parse one CST XML file.
pub fn load_document(path: &Path, options: LoadOptions) -> Result<Document, LoadError> {
    let content = read_xml_file(path)?;
    parse_document(&content, options).map_err(|message| LoadError::Xml {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse CST XML content. The error is a message with the reader position.
pub fn parse_document(content: &str, options: LoadOptions) -> Result<Document, String> {
    let mut reader = Reader::from_str(content);

    let mut doc = Document::new();
    let mut stack: Vec<OpenTag> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML parse error at position {}: {:?}", reader.buffer_position(), e))?;

        match event {
            Event::Start(ref e) => {
                let name = tag_name(e)?;
                let open = if let Some(OpenTag::Note { .. }) = stack.last() {
                    // Markup inside a note only contributes text.
                    OpenTag::Unwrapped
                } else if name == "note" && options.unwrap_notes {
                    OpenTag::Note { text: String::new() }
                } else if is_unwrapped_hi(&name, e) {
                    OpenTag::Unwrapped
                } else {
                    let parent = current_parent(&stack);
                    OpenTag::Element(doc.push_element(parent, &name, attributes(e)))
                };
                stack.push(open);
            }

            Event::Empty(ref e) => {
                let name = tag_name(e)?;
                let inside_note = matches!(stack.last(), Some(OpenTag::Note { .. }));
                if name != "pb" && !inside_note && !is_unwrapped_hi(&name, e) {
                    let parent = current_parent(&stack);
                    doc.push_element(parent, &name, attributes(e));
                }
            }

            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("Error reading text at position {}: {:?}", reader.buffer_position(), err))?;
                push_text(&mut doc, &mut stack, &text);
            }

            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                push_text(&mut doc, &mut stack, &text);
            }

            Event::End(_) => match stack.pop() {
                Some(OpenTag::Note { text }) => {
                    let note = format!(" [{}] ", text.trim());
                    push_text(&mut doc, &mut stack, &note);
                }
                Some(_) => {}
                None => {
                    return Err(format!("Unbalanced end tag at position {}", reader.buffer_position()));
                }
            },

            Event::Eof => break,

            _ => {}
        }
    }

    Ok(doc)
}

/// Text goes into an open note, or else under the nearest real element.
fn push_text(doc: &mut Document, stack: &mut [OpenTag], text: &str) {
    for open in stack.iter_mut().rev() {
        match open {
            OpenTag::Note { text: note_text } => {
                note_text.push_str(text);
                return;
            }
            OpenTag::Element(id) => {
                doc.push_text(Some(*id), text);
                return;
            }
            OpenTag::Unwrapped => continue,
        }
    }
    // Text outside the root element is whitespace between prolog and root.
}

fn current_parent(stack: &[OpenTag]) -> Option<NodeId> {
    stack.iter().rev().find_map(|open| match open {
        OpenTag::Element(id) => Some(*id),
        _ => None,
    })
}

fn is_unwrapped_hi(name: &str, e: &BytesStart) -> bool {
    name == "hi" && matches!(get_attribute(e, b"rend").as_deref(), Some("paranum") | Some("dot"))
}

fn tag_name(e: &BytesStart) -> Result<String, String> {
    std::str::from_utf8(e.name().as_ref())
        .map(|s| s.to_string())
        .map_err(|err| format!("Invalid tag name: {}", err))
}

fn attributes(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).to_string();
            let value = a
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).to_string());
            (key, value)
        })
        .collect()
}

/// Get an attribute value from a BytesStart element
fn get_attribute(element: &BytesStart, attr_name: &[u8]) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == attr_name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Document {
        parse_document(xml, LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_paragraphs_and_heads() {
        let doc = parse(r#"<?xml version="1.0"?>
            <TEI.2><text><body>
                <p rend="nikaya">Dīghanikāyo</p>
                <div id="dn1" type="book">
                    <head rend="book">Sīlakkhandhavaggapāḷi</head>
                    <div id="dn1_1" n="dn1_1" type="sutta">
                        <head rend="chapter">1. Brahmajālasuttaṃ</head>
                        <p rend="subhead">Paribbājakakathā</p>
                    </div>
                </div>
            </body></text></TEI.2>"#);

        let ps = doc.paragraphs();
        assert_eq!(ps.len(), 2);
        assert_eq!(doc.attr(ps[0], "rend"), Some("nikaya"));
        assert_eq!(doc.text(ps[1]), "Paribbājakakathā");

        let head = doc.find_previous(ps[1], |d, n| d.matches(n, "head", "rend", "chapter")).unwrap();
        assert_eq!(doc.text(head), "1. Brahmajālasuttaṃ");
    }

    #[test]
    fn test_page_breaks_dropped_and_paranum_unwrapped() {
        let doc = parse(r#"<body><p rend="bodytext" n="1"><hi rend="paranum">1</hi><hi rend="dot">.</hi> Evaṃ me <pb ed="M" n="1.0001"/>sutaṃ.</p></body>"#);
        let p = doc.paragraphs()[0];
        assert_eq!(doc.text(p), "1. Evaṃ me sutaṃ.");
        assert!(doc.node(p).children.iter().all(|c| doc.name(*c).is_none()));
    }

    #[test]
    fn test_notes_unwrapped_to_brackets() {
        let doc = parse(r#"<body><p rend="bodytext">sattā<note>satto (ka.)</note> honti</p></body>"#);
        let p = doc.paragraphs()[0];
        assert_eq!(doc.text(p), "sattā [satto (ka.)]  honti");
    }

    #[test]
    fn test_notes_kept_when_not_unwrapping() {
        let doc = parse_document(
            r#"<body><p rend="bodytext">sattā<note>satto</note> honti</p></body>"#,
            LoadOptions { unwrap_notes: false },
        ).unwrap();
        let p = doc.paragraphs()[0];
        assert!(doc.find_descendant(p, "note").is_some());
    }

    #[test]
    fn test_other_hi_kept_as_element() {
        let doc = parse(r#"<body><p rend="bodytext"><hi rend="bold">Evaṃ</hi> me sutaṃ.</p></body>"#);
        let p = doc.paragraphs()[0];
        assert!(doc.find_descendant(p, "hi").is_some());
        assert_eq!(doc.text(p), "Evaṃ me sutaṃ.");
    }

    #[test]
    fn test_unbalanced_end_tag_is_error() {
        assert!(parse_document("<body></body></p>", LoadOptions::default()).is_err());
    }
}
