//! Registry of CST (Chaṭṭha Saṅgāyana Tipiṭaka) root texts by book key.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A CST root text: the short book key used across DPD and its XML file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CstText {
    pub book: &'static str,
    pub xml_filename: &'static str,
}

const fn cst(book: &'static str, xml_filename: &'static str) -> CstText {
    CstText { book, xml_filename }
}

pub static CST_TEXTS: &[CstText] = &[
    // Vinaya
    cst("vin1", "vin01m.mul.xml"),
    cst("vin2", "vin02m1.mul.xml"),
    cst("vin3", "vin02m2.mul.xml"),
    cst("vin4", "vin02m3.mul.xml"),
    cst("vin5", "vin02m4.mul.xml"),
    // Dīgha Nikāya
    cst("dn1", "s0101m.mul.xml"),
    cst("dn2", "s0102m.mul.xml"),
    cst("dn3", "s0103m.mul.xml"),
    // Majjhima Nikāya
    cst("mn1", "s0201m.mul.xml"),
    cst("mn2", "s0202m.mul.xml"),
    cst("mn3", "s0203m.mul.xml"),
    // Saṃyutta Nikāya
    cst("sn1", "s0301m.mul.xml"),
    cst("sn2", "s0302m.mul.xml"),
    cst("sn3", "s0303m.mul.xml"),
    cst("sn4", "s0304m.mul.xml"),
    cst("sn5", "s0305m.mul.xml"),
    // Aṅguttara Nikāya
    cst("an1", "s0401m.mul.xml"),
    cst("an2", "s0402m1.mul.xml"),
    cst("an3", "s0402m2.mul.xml"),
    cst("an4", "s0402m3.mul.xml"),
    cst("an5", "s0403m1.mul.xml"),
    cst("an6", "s0403m2.mul.xml"),
    cst("an7", "s0403m3.mul.xml"),
    cst("an8", "s0404m1.mul.xml"),
    cst("an9", "s0404m2.mul.xml"),
    cst("an10", "s0404m3.mul.xml"),
    cst("an11", "s0404m4.mul.xml"),
    // Khuddaka Nikāya
    cst("kn1", "s0501m.mul.xml"),
    cst("kn2", "s0502m.mul.xml"),
    cst("kn3", "s0503m.mul.xml"),
    cst("kn4", "s0504m.mul.xml"),
    cst("kn5", "s0505m.mul.xml"),
    cst("kn6", "s0506m.mul.xml"),
    cst("kn7", "s0507m.mul.xml"),
    cst("kn8", "s0508m.mul.xml"),
    cst("kn9", "s0509m.mul.xml"),
    cst("kn10", "s0510m1.mul.xml"),
    cst("kn11", "s0510m2.mul.xml"),
    cst("kn12", "s0511m.mul.xml"),
    cst("kn13", "s0512m.mul.xml"),
    // Jātaka continues in s0514m.mul.xml
    cst("kn14", "s0513m.mul.xml"),
    cst("kn15", "s0515m.mul.xml"),
    cst("kn16", "s0516m.mul.xml"),
];

pub fn cst_text(book: &str) -> Option<&'static CstText> {
    CST_TEXTS.iter().find(|t| t.book == book)
}

/// Full path of a book's XML file under the CST directory.
pub fn cst_xml_path(cst_xml_dir: &Path, book: &str) -> Option<PathBuf> {
    cst_text(book).map(|t| cst_xml_dir.join(t.xml_filename))
}

/// Book availability in a CST directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFile {
    pub text: &'static CstText,
    pub present: bool,
}

/// Lists every known book and whether its XML file is in `cst_xml_dir`.
///
/// Only the top level of the directory is read; a missing directory means no
/// book is present.
pub fn list_book_files(cst_xml_dir: &Path) -> Vec<BookFile> {
    let names: HashSet<String> = WalkDir::new(cst_xml_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();

    CST_TEXTS
        .iter()
        .map(|text| BookFile {
            text,
            present: names.contains(text.xml_filename),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_keys_are_unique() {
        for (i, a) in CST_TEXTS.iter().enumerate() {
            assert!(CST_TEXTS.iter().skip(i + 1).all(|b| b.book != a.book), "duplicate key {}", a.book);
        }
    }

    #[test]
    fn test_cst_xml_path() {
        let p = cst_xml_path(Path::new("romn"), "dn1").unwrap();
        assert_eq!(p, PathBuf::from("romn/s0101m.mul.xml"));
        assert!(cst_xml_path(Path::new("romn"), "xyz").is_none());
    }

    #[test]
    fn test_list_book_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s0201m.mul.xml"), "<body/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let books = list_book_files(dir.path());
        assert_eq!(books.len(), CST_TEXTS.len());

        let present: Vec<&str> = books.iter().filter(|b| b.present).map(|b| b.text.book).collect();
        assert_eq!(present, vec!["mn1"]);
    }

    #[test]
    fn test_list_book_files_missing_dir() {
        let books = list_book_files(Path::new("/nonexistent/cst/romn"));
        assert!(books.iter().all(|b| !b.present));
    }
}
