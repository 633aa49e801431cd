//! Recreate mode: a fresh package assembled from the extracted records.

use super::in_place::format_isolated;
use super::page::PageTarget;
use super::style::{highlight_run, RoleStyle};
use super::{ReconstructOptions, ReconstructSummary};
use crate::classify::rules::caption_kind;
use crate::error::Result;
use crate::model::{
    Alignment, Document, ElementContent, ImageData, ParagraphRecord, ParagraphRole, TableData,
    Violation,
};
use crate::package::{
    Package, Relationships, XmlDocument, XmlElement, XmlNode, DOCUMENT_PART, DOCUMENT_RELS_PART,
    IMAGE_REL_TYPE, OFFICE_DOCUMENT_REL_TYPE, STYLES_PART, STYLES_REL_TYPE,
};
use crate::parser::wml::{
    text_element, W_BODY, W_P, W_PPR, W_R, W_RPR, W_SECT_PR, W_TBL, W_TC, W_TR, W_VAL,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const MAIN_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

/// Extent used for images that declare none: 6in x 4in.
const DEFAULT_EXTENT: (i64, i64) = (5_486_400, 3_657_600);

/// Existing caption numbering, removed before renumbering.
static CAPTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:图|表|Fig\.|Figure|Table)\s*\d+(?:[.\-]\d+)*\s*[.:：、]?\s*")
        .expect("valid caption prefix regex")
});

/// Build a new package from `document`, applying each role's style.
pub(super) fn recreate(
    document: &Document,
    styles: &BTreeMap<ParagraphRole, RoleStyle>,
    page: Option<&PageTarget>,
    violations: &[Violation],
    options: &ReconstructOptions,
) -> Result<(Package, ReconstructSummary)> {
    let flagged: HashSet<usize> = violations.iter().filter_map(|v| v.paragraph).collect();
    let captions = pair_captions(&document.records);
    let consumed: HashSet<usize> = captions.values().copied().collect();

    let mut rels = Relationships::default();
    rels.add(STYLES_REL_TYPE, "styles.xml");
    let mut media: Vec<(String, Vec<u8>)> = Vec::new();
    let mut extensions = BTreeSet::new();

    let mut body = XmlElement::new(W_BODY);
    let mut summary = ReconstructSummary::default();
    let mut figure_number = 0u32;
    let mut table_number = 0u32;

    for (index, record) in document.records.iter().enumerate() {
        if consumed.contains(&index) {
            continue;
        }
        let caption = captions
            .get(&index)
            .and_then(|&c| document.records.get(c))
            .map(|r| r.text.as_str());

        match &record.element {
            ElementContent::Image(image) => {
                figure_number += 1;
                if image.has_data() {
                    let file_name = format!("image{}.{}", figure_number, image.extension());
                    let rel_id = rels.add(IMAGE_REL_TYPE, &format!("media/{}", file_name));
                    extensions.insert((image.extension(), image.mime_type()));
                    media.push((format!("word/media/{}", file_name), image.data.clone()));
                    body = body.with_child(image_paragraph(image, &rel_id, figure_number));
                } else {
                    log::warn!(
                        "image {} has no data; writing a placeholder for figure {}",
                        image.rel_id,
                        figure_number
                    );
                    body = body.with_child(placeholder_paragraph(image));
                }
                summary.special += 1;
                if let Some(text) = caption {
                    let label = caption_text("图", figure_number, text, options);
                    body = body.with_child(caption_paragraph(&label, styles.get(&ParagraphRole::Figure)));
                    summary.special += 1;
                }
            }
            ElementContent::Table(table) => {
                table_number += 1;
                if let Some(text) = caption {
                    let label = caption_text("表", table_number, text, options);
                    body = body.with_child(caption_paragraph(&label, styles.get(&ParagraphRole::Table)));
                    summary.special += 1;
                }
                let cell_style = options
                    .format_table_cells
                    .then(|| styles.get(&ParagraphRole::Body))
                    .flatten();
                body = body.with_child(table_element(table, cell_style));
                summary.special += 1;
            }
            ElementContent::Text => {
                let highlight = options.highlight && flagged.contains(&index);
                let mut paragraph = text_paragraph(&record.text);
                let style = styles.get(&record.role).filter(|_| record.role != ParagraphRole::Equation);
                match style {
                    Some(style) => match format_isolated(&mut paragraph, style, highlight) {
                        Ok(()) => summary.formatted += 1,
                        Err(e) => {
                            log::warn!("record {} kept unformatted: {}", index, e);
                            summary.failed += 1;
                        }
                    },
                    None => {
                        if highlight {
                            for run in paragraph.elements_mut().filter(|e| e.is(W_R)) {
                                highlight_run(run.ensure_first_child(W_RPR));
                            }
                        }
                        summary.skipped += 1;
                    }
                }
                if highlight {
                    summary.highlighted += 1;
                }
                body = body.with_child(paragraph);
            }
        }
    }

    let mut sect_pr = XmlElement::new(W_SECT_PR);
    PageTarget::from_settings(&document.page).apply(&mut sect_pr);
    if options.apply_page_settings {
        if let Some(target) = page {
            target.apply(&mut sect_pr);
        }
    }
    body = body.with_child(sect_pr);
    summary.sections = 1;
    summary.blocks = body.elements().filter(|e| e.is(W_P) || e.is(W_TBL)).count();

    let root = XmlElement::new("w:document")
        .with_attr("xmlns:w", NS_W)
        .with_attr("xmlns:r", NS_R)
        .with_attr("xmlns:wp", NS_WP)
        .with_attr("xmlns:a", NS_A)
        .with_attr("xmlns:pic", NS_PIC)
        .with_child(body);

    let mut package = Package::new();
    package.set_xml_part(CONTENT_TYPES_PART, &content_types(&extensions))?;
    let mut root_rels = Relationships::default();
    root_rels.add(OFFICE_DOCUMENT_REL_TYPE, DOCUMENT_PART);
    package.set_xml_part(ROOT_RELS_PART, &root_rels.to_xml())?;
    package.set_xml_part(DOCUMENT_PART, &XmlDocument::new(root))?;
    package.set_xml_part(STYLES_PART, &default_styles())?;
    package.set_xml_part(DOCUMENT_RELS_PART, &rels.to_xml())?;
    for (name, data) in media {
        package.set_part(name, data);
    }

    log::info!(
        "recreated document with {} figures and {} tables",
        figure_number,
        table_number
    );
    Ok((package, summary))
}

/// Map image and table record indices to the index of their caption record.
///
/// Figure captions are looked for below the image first, table captions above
/// the table first. A caption is used once, and only by a record of its kind.
fn pair_captions(records: &[ParagraphRecord]) -> BTreeMap<usize, usize> {
    let mut pairs = BTreeMap::new();
    let mut used = HashSet::new();
    // An explicit prefix decides the kind; the role only counts without one.
    let is_caption = |index: usize, role: ParagraphRole| {
        records.get(index).is_some_and(|r| {
            r.is_text()
                && match caption_kind(r.text.trim()) {
                    Some(kind) => kind == role,
                    None => r.role == role,
                }
        })
    };

    for (index, record) in records.iter().enumerate() {
        let (role, candidates) = match record.element {
            ElementContent::Image(_) => (ParagraphRole::Figure, [index + 1, index.wrapping_sub(1)]),
            ElementContent::Table(_) => (ParagraphRole::Table, [index.wrapping_sub(1), index + 1]),
            ElementContent::Text => continue,
        };
        if let Some(found) = candidates
            .into_iter()
            .find(|&c| !used.contains(&c) && is_caption(c, role))
        {
            used.insert(found);
            pairs.insert(index, found);
        }
    }
    pairs
}

fn caption_text(kind: &str, number: u32, original: &str, options: &ReconstructOptions) -> String {
    if !options.number_captions {
        return original.trim().to_string();
    }
    let title = CAPTION_PREFIX.replace(original.trim(), "");
    format!("{} {} {}", kind, number, title.trim()).trim_end().to_string()
}

fn text_paragraph(text: &str) -> XmlElement {
    XmlElement::new(W_P).with_child(XmlElement::new(W_R).with_child(text_element(text)))
}

fn centered() -> XmlElement {
    XmlElement::new(W_PPR).with_child(XmlElement::new("w:jc").with_attr(W_VAL, "center"))
}

fn caption_paragraph(text: &str, style: Option<&RoleStyle>) -> XmlElement {
    let mut paragraph = text_paragraph(text);
    paragraph.children.insert(0, XmlNode::Element(centered()));
    if let Some(style) = style {
        if let Err(e) = format_isolated(&mut paragraph, style, false) {
            log::warn!("caption '{}' kept unformatted: {}", text, e);
        }
    }
    paragraph
}

/// Stand-in for an image whose data could not be read: its description or
/// its source name, centered where the picture was.
fn placeholder_paragraph(image: &ImageData) -> XmlElement {
    let label = image
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| (!image.part_name.is_empty()).then_some(image.part_name.as_str()))
        .unwrap_or(image.rel_id.as_str());
    let mut paragraph = text_paragraph(&format!("[{}]", label.trim()));
    paragraph.children.insert(0, XmlNode::Element(centered()));
    paragraph
}

fn image_paragraph(image: &ImageData, rel_id: &str, number: u32) -> XmlElement {
    let (cx, cy) = image.extent.unwrap_or(DEFAULT_EXTENT);
    let (cx, cy) = (cx.to_string(), cy.to_string());
    let name = format!("Picture {}", number);

    let mut doc_pr = XmlElement::new("wp:docPr")
        .with_attr("id", number.to_string())
        .with_attr("name", name.as_str());
    if let Some(description) = &image.description {
        doc_pr.set_attr("descr", description.as_str());
    }

    let picture = XmlElement::new("pic:pic")
        .with_child(
            XmlElement::new("pic:nvPicPr")
                .with_child(
                    XmlElement::new("pic:cNvPr")
                        .with_attr("id", number.to_string())
                        .with_attr("name", name.as_str()),
                )
                .with_child(XmlElement::new("pic:cNvPicPr")),
        )
        .with_child(
            XmlElement::new("pic:blipFill")
                .with_child(XmlElement::new("a:blip").with_attr("r:embed", rel_id))
                .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect"))),
        )
        .with_child(
            XmlElement::new("pic:spPr")
                .with_child(
                    XmlElement::new("a:xfrm")
                        .with_child(XmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            XmlElement::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    XmlElement::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(XmlElement::new("a:avLst")),
                ),
        );

    let inline = XmlElement::new("wp:inline")
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            XmlElement::new("wp:extent")
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(doc_pr)
        .with_child(
            XmlElement::new("a:graphic").with_child(
                XmlElement::new("a:graphicData")
                    .with_attr("uri", NS_PIC)
                    .with_child(picture),
            ),
        );

    XmlElement::new(W_P).with_child(centered()).with_child(
        XmlElement::new(W_R).with_child(XmlElement::new("w:drawing").with_child(inline)),
    )
}

fn table_element(table: &TableData, cell_style: Option<&RoleStyle>) -> XmlElement {
    let columns = table.column_count().max(1);
    let border = |name: &str| {
        XmlElement::new(name)
            .with_attr(W_VAL, "single")
            .with_attr("w:sz", "4")
            .with_attr("w:space", "0")
            .with_attr("w:color", "auto")
    };
    let borders = ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"]
        .into_iter()
        .fold(XmlElement::new("w:tblBorders"), |b, name| b.with_child(border(name)));

    let properties = XmlElement::new("w:tblPr")
        .with_child(XmlElement::new("w:tblW").with_attr("w:w", "0").with_attr("w:type", "auto"))
        .with_child(XmlElement::new("w:jc").with_attr(W_VAL, Alignment::Center.to_wml()))
        .with_child(borders);
    let grid = (0..columns).fold(XmlElement::new("w:tblGrid"), |g, _| {
        g.with_child(XmlElement::new("w:gridCol"))
    });

    let mut element = XmlElement::new(W_TBL).with_child(properties).with_child(grid);
    for row in &table.rows {
        let mut tr = XmlElement::new(W_TR);
        for column in 0..columns {
            let text = row.get(column).map(String::as_str).unwrap_or_default();
            let mut paragraph = text_paragraph(text);
            if let Some(style) = cell_style {
                if let Err(e) = format_isolated(&mut paragraph, style, false) {
                    log::warn!("table cell kept unformatted: {}", e);
                }
            }
            tr = tr.with_child(
                XmlElement::new(W_TC)
                    .with_child(
                        XmlElement::new("w:tcPr").with_child(
                            XmlElement::new("w:tcW").with_attr("w:w", "0").with_attr("w:type", "auto"),
                        ),
                    )
                    .with_child(paragraph),
            );
        }
        element = element.with_child(tr);
    }
    element
}

fn content_types(images: &BTreeSet<(String, &'static str)>) -> XmlDocument {
    let default = |extension: &str, content_type: &str| {
        XmlElement::new("Default")
            .with_attr("Extension", extension)
            .with_attr("ContentType", content_type)
    };
    let overriding = |part: &str, content_type: &str| {
        XmlElement::new("Override")
            .with_attr("PartName", format!("/{}", part))
            .with_attr("ContentType", content_type)
    };

    let mut root = XmlElement::new("Types")
        .with_attr("xmlns", NS_CONTENT_TYPES)
        .with_child(default(
            "rels",
            "application/vnd.openxmlformats-package.relationships+xml",
        ))
        .with_child(default("xml", "application/xml"));
    for (extension, mime) in images {
        root = root.with_child(default(extension, mime));
    }
    XmlDocument::new(
        root.with_child(overriding(DOCUMENT_PART, MAIN_CONTENT_TYPE))
            .with_child(overriding(STYLES_PART, STYLES_CONTENT_TYPE)),
    )
}

/// Style part with document defaults: SimSun / Times New Roman, 10.5pt.
fn default_styles() -> XmlDocument {
    let fonts = XmlElement::new("w:rFonts")
        .with_attr("w:ascii", "Times New Roman")
        .with_attr("w:hAnsi", "Times New Roman")
        .with_attr("w:eastAsia", "宋体")
        .with_attr("w:cs", "Times New Roman");
    let defaults = XmlElement::new("w:docDefaults")
        .with_child(
            XmlElement::new("w:rPrDefault").with_child(
                XmlElement::new(W_RPR)
                    .with_child(fonts)
                    .with_child(XmlElement::new("w:sz").with_attr(W_VAL, "21"))
                    .with_child(XmlElement::new("w:szCs").with_attr(W_VAL, "21")),
            ),
        )
        .with_child(XmlElement::new("w:pPrDefault").with_child(XmlElement::new(W_PPR)));
    let normal = XmlElement::new("w:style")
        .with_attr("w:type", "paragraph")
        .with_attr("w:default", "1")
        .with_attr("w:styleId", "Normal")
        .with_child(XmlElement::new("w:name").with_attr(W_VAL, "Normal"));

    XmlDocument::new(
        XmlElement::new("w:styles")
            .with_attr("xmlns:w", NS_W)
            .with_child(defaults)
            .with_child(normal),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(sequence: u32) -> ImageData {
        ImageData {
            rel_id: "rId5".into(),
            part_name: "word/media/image1.png".into(),
            data: vec![0x89, b'P', b'N', b'G'],
            extent: Some((914_400, 914_400)),
            description: None,
            sequence,
        }
    }

    #[test]
    fn test_pair_captions() {
        let records = vec![
            ParagraphRecord::text("正文", 0),
            ParagraphRecord::image(image(1), 1),
            ParagraphRecord::text("图1 系统结构", 2),
            ParagraphRecord::text("表1 实验结果", 3),
            ParagraphRecord::table(TableData::default(), 4),
        ];
        let pairs = pair_captions(&records);
        assert_eq!(pairs.get(&1), Some(&2));
        assert_eq!(pairs.get(&4), Some(&3));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_table_caption_not_taken_by_uncaptioned_image() {
        let records = vec![
            ParagraphRecord::image(image(1), 0),
            ParagraphRecord::text("表1 实验结果", 1).with_role(ParagraphRole::Table),
            ParagraphRecord::table(TableData::default(), 2),
            ParagraphRecord::text("Fig. 2 Layout", 3).with_role(ParagraphRole::Table),
        ];
        let pairs = pair_captions(&records);
        assert_eq!(pairs.get(&0), None);
        assert_eq!(pairs.get(&2), Some(&1));
        assert_eq!(pairs.len(), 1);
    }

    fn body_texts(package: &Package) -> Vec<String> {
        let document = package.xml_part(DOCUMENT_PART).unwrap().unwrap();
        document
            .root
            .child(W_BODY)
            .unwrap()
            .children_named(W_P)
            .map(crate::parser::wml::paragraph_text)
            .collect()
    }

    #[test]
    fn test_image_without_data_keeps_its_place() {
        let linked = ImageData {
            data: Vec::new(),
            description: Some("系统结构图".into()),
            ..image(1)
        };
        let mut document = Document::new();
        document.add_record(ParagraphRecord::image(linked, 0));
        document.add_record(ParagraphRecord::text("图1 系统结构", 1));
        document.add_record(ParagraphRecord::image(image(2), 2));
        document.add_record(ParagraphRecord::text("图2 流程", 3));

        let (package, summary) = recreate(
            &document,
            &BTreeMap::new(),
            None,
            &[],
            &ReconstructOptions::default(),
        )
        .unwrap();

        assert_eq!(
            body_texts(&package),
            vec!["[系统结构图]", "图 1 系统结构", "", "图 2 流程"]
        );
        assert_eq!(summary.special, 4);
        assert!(package.has_part("word/media/image2.png"));
        assert!(!package.has_part("word/media/image1.png"));
    }

    #[test]
    fn test_caption_renumbering() {
        let options = ReconstructOptions::default();
        assert_eq!(caption_text("图", 3, "图2.1 系统结构", &options), "图 3 系统结构");
        assert_eq!(caption_text("表", 1, "Table 4: Results", &options), "表 1 Results");
        assert_eq!(caption_text("图", 2, "图5", &options), "图 2");

        let keep = ReconstructOptions::default().with_caption_numbers(false);
        assert_eq!(caption_text("图", 3, " 图2 结构 ", &keep), "图2 结构");
    }

    #[test]
    fn test_table_rows_padded() {
        let table = TableData {
            rows: vec![vec!["a".into(), "b".into()], vec!["c".into()]],
            sequence: 1,
        };
        let element = table_element(&table, None);
        let rows: Vec<_> = element.children_named(W_TR).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].children_named(W_TC).count(), 2);
        assert_eq!(element.path(&["w:tblGrid"]).unwrap().elements().count(), 2);
    }

    #[test]
    fn test_image_paragraph_references_relationship() {
        let paragraph = image_paragraph(&image(1), "rId2", 1);
        let blip = paragraph.find("a:blip").unwrap();
        assert_eq!(blip.attr("r:embed"), Some("rId2"));
        assert_eq!(paragraph.find("wp:extent").unwrap().attr("cx"), Some("914400"));
    }
}
