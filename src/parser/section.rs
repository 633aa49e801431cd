//! Section properties (`w:sectPr`).

use super::wml::{attr_i64, W_SECT_PR};
use crate::model::{Length, Margins, Orientation, PageSettings};
use crate::package::XmlElement;

/// The section properties that govern the end of the document.
///
/// Word stores them as the last child of `w:body`; documents assembled by
/// other tools sometimes only carry them in paragraph properties.
pub fn final_section(body: &XmlElement) -> Option<&XmlElement> {
    if let Some(sect) = body.child(W_SECT_PR) {
        return Some(sect);
    }
    let mut all = Vec::new();
    body.find_all(W_SECT_PR, &mut all);
    all.pop()
}

/// Read page settings from the final section, defaulting to A4 portrait.
pub fn read_page_settings(body: &XmlElement) -> PageSettings {
    let mut page = PageSettings::default();
    let Some(sect) = final_section(body) else {
        log::debug!("document has no section properties; assuming A4");
        return page;
    };

    if let Some(size) = sect.child("w:pgSz") {
        if let Some(w) = attr_i64(size, "w:w") {
            page.width = Length::from_twips(w);
        }
        if let Some(h) = attr_i64(size, "w:h") {
            page.height = Length::from_twips(h);
        }
        page.orientation = match size.attr("w:orient") {
            Some(o) => Orientation::parse(o).unwrap_or_default(),
            None if page.width.0 > page.height.0 => Orientation::Landscape,
            None => Orientation::Portrait,
        };
    }

    if let Some(margins) = sect.child("w:pgMar") {
        let read = |key: &str, fallback: Length| {
            attr_i64(margins, key)
                .map(|t| Length::from_twips(t.abs()))
                .unwrap_or(fallback)
        };
        let defaults = Margins::default();
        page.margins = Margins {
            top: read("w:top", defaults.top),
            bottom: read("w:bottom", defaults.bottom),
            left: read("w:left", defaults.left),
            right: read("w:right", defaults.right),
        };
        page.header = attr_i64(margins, "w:header").map(Length::from_twips);
        page.footer = attr_i64(margins, "w:footer").map(Length::from_twips);
    }

    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::XmlDocument;

    #[test]
    fn test_read_page_settings() {
        let body = XmlDocument::parse(
            br#"<w:body><w:p/><w:sectPr><w:pgSz w:w="16838" w:h="11906" w:orient="landscape"/><w:pgMar w:top="-1417" w:right="1134" w:bottom="1417" w:left="1701" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr></w:body>"#,
            "d",
        )
        .unwrap()
        .root;
        let page = read_page_settings(&body);
        assert_eq!(page.orientation, Orientation::Landscape);
        assert_eq!(page.paper_name(0.2), Some("A4"));
        assert!((page.margins.top.cm() - 2.5).abs() < 0.01);
        assert!((page.margins.left.cm() - 3.0).abs() < 0.01);
        assert!(page.header.is_some());
    }

    #[test]
    fn test_section_in_paragraph_properties() {
        let body = XmlDocument::parse(
            br#"<w:body><w:p><w:pPr><w:sectPr><w:pgSz w:w="9979" w:h="14173"/></w:sectPr></w:pPr></w:p></w:body>"#,
            "d",
        )
        .unwrap()
        .root;
        let page = read_page_settings(&body);
        assert_eq!(page.paper_name(0.2), Some("B5"));
        assert_eq!(page.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_missing_section_defaults_to_a4() {
        let body = XmlDocument::parse(b"<w:body/>", "d").unwrap().root;
        assert_eq!(read_page_settings(&body), PageSettings::default());
    }
}
