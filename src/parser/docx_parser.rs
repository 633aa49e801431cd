//! DOCX document parser.

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    Alignment, Document, FontAttributes, ImageData, Metadata, ParagraphFormat, ParagraphRecord,
    TableData,
};
use crate::package::{
    Package, Relationships, XmlDocument, XmlElement, DOCUMENT_PART, DOCUMENT_RELS_PART,
    STYLES_PART, THEME_PART,
};

use super::options::{ErrorMode, ParseOptions};
use super::section::read_page_settings;
use super::split::split_label_paragraphs;
use super::styles::{ParaProps, RunProps, StyleSheet};
use super::wml::{
    attr_i64, block_at, block_paths, first_blip_embed, has_graphic, paragraph_runs,
    paragraph_style_id, paragraph_text, run_text, table_cells, W_BODY, W_P, W_PPR, W_RPR, W_TBL,
};

/// Font size used when nothing in the document specifies one (五号).
pub const DEFAULT_FONT_SIZE: f32 = 10.5;
/// East Asian family for title-like paragraphs without one.
pub const DEFAULT_TITLE_ZH_FAMILY: &str = "黑体";
/// East Asian family for other paragraphs without one.
pub const DEFAULT_ZH_FAMILY: &str = "宋体";
/// Latin family used when nothing specifies one.
pub const DEFAULT_EN_FAMILY: &str = "Times New Roman";
/// Color used when nothing specifies one.
pub const DEFAULT_COLOR: &str = "black";

/// Paragraphs shorter than this many characters count as title-like.
const TITLE_LIKE_MAX_CHARS: usize = 50;
/// Paragraphs at or above this point size count as title-like.
const TITLE_LIKE_MIN_SIZE: f32 = 14.0;

/// DOCX document parser.
pub struct DocxParser {
    package: Package,
    options: ParseOptions,
    source: Option<String>,
}

impl DocxParser {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a DOCX file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let package = Package::open(path)?;
        let mut parser = Self::with_package(package, options)?;
        parser.source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(parser)
    }

    /// Parse a DOCX from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a DOCX from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        let package = Package::from_bytes(data.to_vec())?;
        Self::with_package(package, options)
    }

    /// Parse a DOCX from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse a DOCX from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(reader: R, options: ParseOptions) -> Result<Self> {
        let package = Package::from_reader(reader)?;
        Self::with_package(package, options)
    }

    /// Wrap an already opened package.
    pub fn with_package(package: Package, options: ParseOptions) -> Result<Self> {
        if !package.has_part(DOCUMENT_PART) {
            return Err(Error::UnknownFormat);
        }
        Ok(Self {
            package,
            options,
            source: None,
        })
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Consume the parser and return its package.
    pub fn into_package(self) -> Package {
        self.package
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse the document into records.
    pub fn parse(&self) -> Result<Document> {
        let mut main = self
            .package
            .xml_part(DOCUMENT_PART)?
            .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.to_string()))?;
        let body = main
            .root
            .child_mut(W_BODY)
            .ok_or_else(|| Error::Corrupted("main document part has no body".to_string()))?;

        let split_count = if self.options.split_keywords {
            split_label_paragraphs(body)
        } else {
            0
        };
        let body: &XmlElement = body;

        let styles = self.auxiliary_part(STYLES_PART)?;
        let theme = match self.theme_part_name() {
            Some(name) => self.auxiliary_part(&name)?,
            None => None,
        };
        let sheet = StyleSheet::from_parts(
            styles.as_ref().map(|d| &d.root),
            theme.as_ref().map(|d| &d.root),
        );
        let rels = self
            .auxiliary_part(DOCUMENT_RELS_PART)?
            .map(|d| Relationships::from_xml(&d))
            .unwrap_or_default();

        let mut extraction = Extraction {
            sheet: &sheet,
            rels: &rels,
            package: &self.package,
            options: &self.options,
            image_sequence: 0,
            table_sequence: 0,
            recovered: 0,
        };

        let paths = block_paths(body);
        let mut records = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let Some(block) = block_at(body, path) else {
                continue;
            };
            let record = if block.is(W_TBL) {
                extraction.table(block, index)
            } else if block.is(W_P) {
                extraction.paragraph(block, index)
            } else {
                None
            };
            records.extend(record);
        }

        let metadata = Metadata {
            source: self.source.clone(),
            block_count: paths.len(),
            split_count,
            paragraph_count: records.iter().filter(|r| r.is_text()).count(),
            image_count: records.iter().filter(|r| r.is_image()).count(),
            table_count: records.iter().filter(|r| r.is_table()).count(),
            recovered_defects: extraction.recovered,
        };

        log::info!(
            "extracted {} records from {} blocks ({} split, {} recovered defects)",
            records.len(),
            metadata.block_count,
            split_count,
            metadata.recovered_defects
        );

        Ok(Document {
            metadata,
            page: read_page_settings(body),
            records,
        })
    }

    fn theme_part_name(&self) -> Option<String> {
        if self.package.has_part(THEME_PART) {
            return Some(THEME_PART.to_string());
        }
        self.package
            .part_names()
            .find(|n| n.starts_with("word/theme/") && n.ends_with(".xml"))
            .map(str::to_string)
    }

    fn auxiliary_part(&self, name: &str) -> Result<Option<XmlDocument>> {
        match self.package.xml_part(name) {
            Ok(doc) => Ok(doc),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("skipping unreadable part {}: {}", name, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Per-parse extraction state.
struct Extraction<'a> {
    sheet: &'a StyleSheet,
    rels: &'a Relationships,
    package: &'a Package,
    options: &'a ParseOptions,
    image_sequence: u32,
    table_sequence: u32,
    recovered: usize,
}

impl Extraction<'_> {
    fn table(&mut self, table: &XmlElement, index: usize) -> Option<ParagraphRecord> {
        if !self.options.extract_tables {
            return None;
        }
        self.table_sequence += 1;
        let data = TableData {
            rows: table_cells(table),
            sequence: self.table_sequence,
        };
        Some(ParagraphRecord::table(data, index))
    }

    fn paragraph(&mut self, paragraph: &XmlElement, index: usize) -> Option<ParagraphRecord> {
        if self.options.extract_images && has_graphic(paragraph) {
            if let Some(image) = self.image(paragraph) {
                return Some(ParagraphRecord::image(image, index));
            }
        }

        let text = paragraph_text(paragraph);
        if text.trim().is_empty() {
            return None;
        }

        let style_id = paragraph_style_id(paragraph).or(self.sheet.default_paragraph_style());
        let (style_run, style_para) = style_id
            .map(|id| self.sheet.resolve_chain(id))
            .unwrap_or_default();
        let style_name = style_id.map(|id| self.sheet.style_name(id).to_string());

        let mut record = ParagraphRecord::text(text, index);
        record.format = self.paragraph_format(paragraph, &style_para);
        record.fonts = self.fonts(paragraph, &record.text, &style_run, style_name.as_deref(), index);
        record.style_name = style_name;
        Some(record)
    }

    fn paragraph_format(&self, paragraph: &XmlElement, style_para: &ParaProps) -> ParagraphFormat {
        let mut props = paragraph
            .child(W_PPR)
            .map(ParaProps::from_ppr)
            .unwrap_or_default();
        props.inherit(style_para);
        props.inherit(self.sheet.doc_para());

        ParagraphFormat {
            alignment: props.alignment.unwrap_or(Alignment::Left),
            first_line: props.first_line.unwrap_or_default(),
            left: props.left.unwrap_or_default(),
            right: props.right.unwrap_or_default(),
            space_before: props.space_before.unwrap_or_default(),
            space_after: props.space_after.unwrap_or_default(),
            line_spacing: props.line_spacing.unwrap_or_default(),
        }
    }

    fn fonts(
        &mut self,
        paragraph: &XmlElement,
        text: &str,
        style_run: &RunProps,
        style_name: Option<&str>,
        index: usize,
    ) -> FontAttributes {
        let theme = self.sheet.theme();
        let mut runs: Vec<(RunProps, String)> = Vec::new();

        for run in paragraph_runs(paragraph) {
            let run_text = run_text(run);
            if run_text.trim().is_empty() {
                continue;
            }
            let mut props = run.child(W_RPR).map(RunProps::from_rpr).unwrap_or_default();
            if let Some(char_style) = props.style_id.clone() {
                let (char_run, _) = self.sheet.resolve_chain(&char_style);
                props.inherit(&char_run);
            }
            props.inherit(style_run);
            props.inherit(self.sheet.doc_run());
            runs.push((props, run_text));
        }

        let title_like = is_title_like(text, style_name, &runs);
        let mut fonts = FontAttributes::new();
        let mut unresolved = true;

        for (props, run_text) in &runs {
            let zh = props
                .east_asia
                .as_ref()
                .and_then(|f| f.resolve(theme))
                .or_else(|| theme.body_east_asia());
            let en = props
                .latin
                .as_ref()
                .and_then(|f| f.resolve(theme))
                .or_else(|| theme.body_latin());

            if zh.is_some() || en.is_some() || props.size.is_some() || props.color.is_some() {
                unresolved = false;
            }

            let default_zh = if title_like {
                DEFAULT_TITLE_ZH_FAMILY
            } else {
                DEFAULT_ZH_FAMILY
            };
            fonts.zh_family.insert(zh.unwrap_or(default_zh).to_string());
            fonts.en_family.insert(en.unwrap_or(DEFAULT_EN_FAMILY).to_string());
            fonts.size.insert(props.size.unwrap_or(DEFAULT_FONT_SIZE));
            fonts
                .color
                .insert(props.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()));
            fonts.bold.insert(props.bold.unwrap_or(false));
            fonts.italic.insert(props.italic.unwrap_or(false));
            fonts
                .all_caps
                .insert(props.caps.unwrap_or(false) || is_upper_latin(run_text));
        }

        if unresolved {
            log::warn!(
                "paragraph {} has no resolvable font information; using defaults",
                index
            );
            self.recovered += 1;
        }

        let default_zh = if title_like {
            DEFAULT_TITLE_ZH_FAMILY
        } else {
            DEFAULT_ZH_FAMILY
        };
        fonts.zh_family.fill_if_empty(default_zh.to_string());
        fonts.en_family.fill_if_empty(DEFAULT_EN_FAMILY.to_string());
        fonts.size.fill_if_empty(DEFAULT_FONT_SIZE);
        fonts.color.fill_if_empty(DEFAULT_COLOR.to_string());
        fonts.bold.fill_if_empty(false);
        fonts.italic.fill_if_empty(false);
        fonts.all_caps.fill_if_empty(false);
        fonts
    }

    fn image(&mut self, paragraph: &XmlElement) -> Option<ImageData> {
        let rel_id = first_blip_embed(paragraph)?;
        let part_name = match self.rels.target_part(rel_id, "word") {
            Some(name) => name,
            None => {
                log::warn!("image relationship {} does not resolve to a package part", rel_id);
                self.recovered += 1;
                String::new()
            }
        };

        let data = self
            .package
            .part(&part_name)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        let extent = paragraph
            .find("wp:extent")
            .and_then(|e| Some((attr_i64(e, "cx")?, attr_i64(e, "cy")?)));
        let description = paragraph
            .find("wp:docPr")
            .and_then(|d| d.attr("descr"))
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string);

        self.image_sequence += 1;
        Some(ImageData {
            rel_id: rel_id.to_string(),
            part_name,
            data,
            extent,
            description,
            sequence: self.image_sequence,
        })
    }
}

fn is_title_like(text: &str, style_name: Option<&str>, runs: &[(RunProps, String)]) -> bool {
    if text.trim().chars().count() < TITLE_LIKE_MAX_CHARS {
        return true;
    }
    if let Some(name) = style_name {
        let lowered = name.to_lowercase();
        if lowered.contains("title") || lowered.contains("heading") || name.contains("标题") {
            return true;
        }
    }
    runs.iter().any(|(props, _)| {
        props.bold == Some(true) || props.size.is_some_and(|s| s >= TITLE_LIKE_MIN_SIZE)
    })
}

/// Latin text written entirely in capitals.
fn is_upper_latin(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(char::is_ascii_alphabetic).collect();
    letters.len() >= 2 && letters.iter().all(char::is_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_upper_latin() {
        assert!(is_upper_latin("ABSTRACT"));
        assert!(is_upper_latin("第1章 INTRODUCTION"));
        assert!(!is_upper_latin("Abstract"));
        assert!(!is_upper_latin("摘要"));
        assert!(!is_upper_latin("A"));
    }

    #[test]
    fn test_title_like() {
        assert!(is_title_like("第一章 绪论", None, &[]));
        let long = "正".repeat(80);
        assert!(!is_title_like(&long, Some("Normal"), &[]));
        assert!(is_title_like(&long, Some("Heading 1"), &[]));
        let bold = RunProps {
            bold: Some(true),
            ..Default::default()
        };
        assert!(is_title_like(&long, None, &[(bold, long.clone())]));
    }

    #[test]
    fn test_rejects_package_without_document() {
        let mut package = Package::new();
        package.set_part("content.xml", b"<x/>".to_vec());
        let bytes = package.to_bytes().unwrap();
        assert!(matches!(
            DocxParser::from_bytes(&bytes),
            Err(Error::UnknownFormat)
        ));
    }
}
