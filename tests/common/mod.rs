//! In-memory DOCX fixtures for integration tests.

#![allow(dead_code)]

use thesisfmt::Package;

const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Minimal PNG signature, enough to count as image data.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Builds a DOCX package paragraph by paragraph.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    images: Vec<(String, String)>,
    styles: Option<String>,
    section: Option<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain paragraph with one run.
    pub fn paragraph(self, text: &str) -> Self {
        self.styled(text, "", "")
    }

    /// Paragraph with raw `w:pPr` and `w:rPr` children.
    pub fn styled(mut self, text: &str, ppr: &str, rpr: &str) -> Self {
        let ppr = if ppr.is_empty() {
            String::new()
        } else {
            format!("<w:pPr>{}</w:pPr>", ppr)
        };
        let rpr = if rpr.is_empty() {
            String::new()
        } else {
            format!("<w:rPr>{}</w:rPr>", rpr)
        };
        self.body.push_str(&format!(
            r#"<w:p>{}<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            ppr, rpr, text
        ));
        self
    }

    pub fn centered(self, text: &str) -> Self {
        self.styled(text, r#"<w:jc w:val="center"/>"#, "")
    }

    pub fn empty(mut self) -> Self {
        self.body.push_str("<w:p/>");
        self
    }

    /// Inline PNG image with its own relationship.
    pub fn image(mut self) -> Self {
        let number = self.images.len() + 1;
        let rel_id = format!("rIdImg{}", number);
        self.body.push_str(&format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline>"#,
                r#"<wp:extent cx="3048000" cy="2032000"/>"#,
                r#"<wp:docPr id="{n}" name="Picture {n}"/>"#,
                r#"<a:graphic><a:graphicData><pic:pic><pic:blipFill>"#,
                r#"<a:blip r:embed="{id}"/>"#,
                r#"</pic:blipFill></pic:pic></a:graphicData></a:graphic>"#,
                r#"</wp:inline></w:drawing></w:r></w:p>"#
            ),
            n = number,
            id = rel_id
        ));
        self.images.push((rel_id, format!("media/image{}.png", number)));
        self
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in *row {
                self.body.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>",
                    cell
                ));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    /// Final section with page size and margins in twips.
    pub fn section(mut self, width: u32, height: u32, left: u32, right: u32) -> Self {
        self.section = Some(format!(
            r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="1440" w:right="{}" w:bottom="1440" w:left="{}" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr>"#,
            width, height, right, left
        ));
        self
    }

    /// Raw `w:styles` content.
    pub fn styles(mut self, styles: &str) -> Self {
        self.styles = Some(styles.to_string());
        self
    }

    pub fn package(&self) -> Package {
        let mut package = Package::new();
        package.set_part("[Content_Types].xml", content_types().into_bytes());
        package.set_part("_rels/.rels", root_rels().into_bytes());

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}{}</w:body></w:document>"#,
            NAMESPACES,
            self.body,
            self.section.as_deref().unwrap_or("")
        );
        package.set_part("word/document.xml", document.into_bytes());

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, target) in &self.images {
            rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, IMAGE_REL, target
            ));
            package.set_part(format!("word/{}", target), PNG_BYTES.to_vec());
        }
        rels.push_str("</Relationships>");
        package.set_part("word/_rels/document.xml.rels", rels.into_bytes());

        if let Some(styles) = &self.styles {
            let styles = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{}</w:styles>"#,
                styles
            );
            package.set_part("word/styles.xml", styles.into_bytes());
        }
        package
    }

    pub fn build(&self) -> Vec<u8> {
        self.package().to_bytes().expect("package serializes")
    }
}

fn content_types() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Default Extension="png" ContentType="image/png"/>"#,
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        r#"</Types>"#
    )
    .to_string()
}

fn root_rels() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        r#"</Relationships>"#
    )
    .to_string()
}

/// Front matter and a short chapter, with the abstract label inline.
pub fn sample_thesis() -> DocxBuilder {
    DocxBuilder::new()
        .centered("摘要：本文研究论文格式的自动检查方法。")
        .paragraph("关键词：格式；论文；检查")
        .paragraph("1 引言")
        .paragraph("正文内容。")
        .section(11906, 16838, 1800, 1800)
}
