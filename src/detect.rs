//! DOCX format detection and validation.

use crate::error::{Error, Result};
use crate::package::{DOCUMENT_PART, STYLES_PART, THEME_PART};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// DOCX package information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Whether `word/styles.xml` is present
    pub has_styles: bool,
    /// Whether a theme part is present
    pub has_theme: bool,
    /// Number of entries under `word/media/`
    pub media_count: usize,
    /// Total number of zip entries
    pub entry_count: usize,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOCX ({} parts, {} media)", self.entry_count, self.media_count)
    }
}

/// Zip local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect DOCX format from a file path.
///
/// # Example
/// ```no_run
/// use thesisfmt::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("thesis.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    detect_format_from_bytes(&data)
}

/// Detect DOCX format from the full package bytes.
///
/// # Returns
/// * `Ok(DocxFormat)` if the data is a zip archive holding `word/document.xml`
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !is_zip_bytes(data) {
        return Err(Error::UnknownFormat);
    }

    let archive = ZipArchive::new(Cursor::new(data)).map_err(|_| Error::UnknownFormat)?;
    let names: Vec<&str> = archive.file_names().collect();

    if !names.contains(&DOCUMENT_PART) {
        return Err(Error::UnknownFormat);
    }

    Ok(DocxFormat {
        has_styles: names.contains(&STYLES_PART),
        has_theme: names.contains(&THEME_PART)
            || names.iter().any(|n| n.starts_with("word/theme/")),
        media_count: names.iter().filter(|n| n.starts_with("word/media/")).count(),
        entry_count: names.len(),
    })
}

/// Check the zip magic bytes.
pub fn is_zip_bytes(data: &[u8]) -> bool {
    data.len() >= ZIP_MAGIC.len() && data.starts_with(ZIP_MAGIC)
}

/// Check if a file is a DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes hold a DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_with(names: &[&str]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(b"<x/>").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_detect_valid_docx() {
        let data = zip_with(&[
            "word/document.xml",
            "word/styles.xml",
            "word/theme/theme1.xml",
            "word/media/image1.png",
        ]);
        let format = detect_format_from_bytes(&data).unwrap();
        assert!(format.has_styles);
        assert!(format.has_theme);
        assert_eq!(format.media_count, 1);
        assert_eq!(format.entry_count, 4);
    }

    #[test]
    fn test_detect_zip_without_document() {
        let data = zip_with(&["content.xml"]);
        assert!(matches!(
            detect_format_from_bytes(&data),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_detect_invalid_format() {
        assert!(matches!(
            detect_format_from_bytes(b"%PDF-1.7"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(detect_format_from_bytes(b"PK"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_is_docx_bytes() {
        assert!(is_docx_bytes(&zip_with(&["word/document.xml"])));
        assert!(!is_docx_bytes(b"Not a docx"));
        assert!(!is_docx_bytes(b""));
    }
}
