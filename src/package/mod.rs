//! Zip package access for DOCX documents.
//!
//! A [`Package`] holds every entry of the source archive in order. Entries
//! that are never replaced are copied raw on save, so their bytes and
//! compression survive untouched.

mod rels;
pub mod xml;

pub use rels::{
    resolve_target, Relationship, Relationships, IMAGE_REL_TYPE, OFFICE_DOCUMENT_REL_TYPE,
    RELS_NAMESPACE, STYLES_REL_TYPE,
};
pub use xml::{XmlDeclaration, XmlDocument, XmlElement, XmlNode};

use crate::error::{Error, Result};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Style definitions part.
pub const STYLES_PART: &str = "word/styles.xml";
/// Default theme part.
pub const THEME_PART: &str = "word/theme/theme1.xml";
/// Relationships of the main document part.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    /// Index in the source archive, if the entry came from one
    source_index: Option<usize>,
    modified: bool,
    is_dir: bool,
}

/// An opened DOCX package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<PackageEntry>,
    source: Option<Vec<u8>>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Open a package from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open a package from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !crate::detect::is_zip_bytes(&data) {
            return Err(Error::UnknownFormat);
        }

        let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut content = Vec::with_capacity(file.size() as usize);
            if !file.is_dir() {
                file.read_to_end(&mut content)?;
            }
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data: content,
                source_index: Some(index),
                modified: false,
                is_dir: file.is_dir(),
            });
        }
        drop(archive);

        Ok(Self {
            entries,
            source: Some(data),
        })
    }

    /// Names of all entries, in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Whether an entry exists.
    pub fn has_part(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Raw (decompressed) content of an entry.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Content of a required entry.
    pub fn require_part(&self, name: &str) -> Result<&[u8]> {
        self.part(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    /// Replace or add an entry.
    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.data = data;
                entry.modified = true;
            }
            None => self.entries.push(PackageEntry {
                name,
                data,
                source_index: None,
                modified: true,
                is_dir: false,
            }),
        }
    }

    /// Parse an XML entry, if present.
    pub fn xml_part(&self, name: &str) -> Result<Option<XmlDocument>> {
        match self.part(name) {
            Some(data) => XmlDocument::parse(data, name).map(Some),
            None => Ok(None),
        }
    }

    /// Serialize and store an XML entry.
    pub fn set_xml_part(&mut self, name: &str, doc: &XmlDocument) -> Result<()> {
        let bytes = doc.to_bytes(name)?;
        self.set_part(name, bytes);
        Ok(())
    }

    /// Names of entries under `word/media/`.
    pub fn media_names(&self) -> Vec<&str> {
        self.part_names()
            .filter(|n| n.starts_with("word/media/"))
            .collect()
    }

    /// Write the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut source = match &self.source {
            Some(data) => Some(ZipArchive::new(Cursor::new(data.as_slice()))?),
            None => None,
        };

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            if let (false, Some(index), Some(archive)) =
                (entry.modified, entry.source_index, source.as_mut())
            {
                let file = archive.by_index_raw(index)?;
                writer.raw_copy_file(file)?;
                continue;
            }

            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
