// Character encoding detection and conversion for CST XML files.
// The romn files ship as UTF-16LE with BOM; others declare their encoding in the XML prolog.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::logger;
use crate::types::LoadError;

lazy_static! {
    static ref RE_DECLARED_ENCODING: Regex =
        Regex::new(r#"^<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap();
}

/// Reads an XML file, detects its encoding and converts it to UTF-8 with Unix line endings.
pub fn read_xml_file(path: &Path) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io { path: path.to_path_buf(), source };

    let mut file = File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;

    let (text, encoding, had_errors) = decode_xml_bytes(&bytes);

    logger::debug(&format!(
        "File: {:?}, Encoding: {}",
        path.file_name().unwrap_or_default(),
        encoding.name(),
    ));

    if had_errors {
        logger::warn(&format!("Encoding errors detected while decoding {:?}", path));
    }

    Ok(text)
}

/// Decodes raw XML bytes. Returns the text, the encoding used and whether
/// malformed sequences were replaced.
pub fn decode_xml_bytes(bytes: &[u8]) -> (String, &'static Encoding, bool) {
    let (encoding, bom_len) = detect_encoding(bytes);

    let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);

    (decoded.replace("\r\n", "\n"), encoding, had_errors)
}

/// Detects the encoding from the BOM, then from the byte pattern of `<?`,
/// then from the `encoding="..."` declaration. Returns the BOM length to skip.
fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    // UTF-16LE BOM: 0xFF 0xFE
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        return (UTF_16LE, 2);
    }

    // UTF-16BE BOM: 0xFE 0xFF
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        return (UTF_16BE, 2);
    }

    // UTF-8 BOM: 0xEF 0xBB 0xBF
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return (UTF_8, 3);
    }

    // UTF-16 without BOM: "<" is followed or preceded by a zero byte
    if bytes.len() >= 2 && bytes[0] == b'<' && bytes[1] == 0 {
        return (UTF_16LE, 0);
    }
    if bytes.len() >= 2 && bytes[0] == 0 && bytes[1] == b'<' {
        return (UTF_16BE, 0);
    }

    (declared_encoding(bytes).unwrap_or(UTF_8), 0)
}

/// The encoding named in an ASCII-compatible XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let prolog = &bytes[..bytes.len().min(256)];
    let label = RE_DECLARED_ENCODING.captures(prolog)?.get(1)?.as_bytes();
    let encoding = Encoding::for_label(label)?;

    // A declaration readable as single bytes can't be UTF-16.
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return None;
    }

    Some(encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn test_detect_utf16le_bom() {
        let bytes = vec![0xFF, 0xFE, 0x41, 0x00];
        assert_eq!(detect_encoding(&bytes), (UTF_16LE, 2));
    }

    #[test]
    fn test_detect_utf16be_bom() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x41];
        assert_eq!(detect_encoding(&bytes), (UTF_16BE, 2));
    }

    #[test]
    fn test_detect_utf8_bom() {
        let bytes = vec![0xEF, 0xBB, 0xBF, 0x41];
        assert_eq!(detect_encoding(&bytes), (UTF_8, 3));
    }

    #[test]
    fn test_detect_no_bom() {
        let bytes = b"<text/>".to_vec();
        assert_eq!(detect_encoding(&bytes), (UTF_8, 0));
    }

    #[test]
    fn test_detect_declared_encoding() {
        let bytes = br#"<?xml version="1.0" encoding="windows-1252"?><p/>"#.to_vec();
        assert_eq!(detect_encoding(&bytes), (WINDOWS_1252, 0));
    }

    #[test]
    fn test_declared_utf16_without_bom_in_ascii_is_ignored() {
        let bytes = br#"<?xml version="1.0" encoding="UTF-16"?><p/>"#.to_vec();
        assert_eq!(detect_encoding(&bytes), (UTF_8, 0));
    }

    #[test]
    fn test_decode_utf16le_with_crlf() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<p>a\r\nṃ</p>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, encoding, had_errors) = decode_xml_bytes(&bytes);
        assert_eq!(text, "<p>a\nṃ</p>");
        assert_eq!(encoding, UTF_16LE);
        assert!(!had_errors);
    }

    #[test]
    fn test_read_xml_file_missing() {
        let err = read_xml_file(Path::new("/nonexistent/s0101m.mul.xml")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
