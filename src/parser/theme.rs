//! Theme font scheme (`word/theme/theme1.xml`).

use crate::package::XmlElement;

/// Major (headings) and minor (body) theme fonts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeFonts {
    pub major_latin: Option<String>,
    pub major_east_asia: Option<String>,
    pub minor_latin: Option<String>,
    pub minor_east_asia: Option<String>,
}

impl ThemeFonts {
    /// Read the `a:fontScheme` of a theme part root.
    pub fn from_theme(root: &XmlElement) -> Self {
        let Some(scheme) = root.find("a:fontScheme") else {
            return Self::default();
        };
        let (major_latin, major_east_asia) = read_collection(scheme.child("a:majorFont"));
        let (minor_latin, minor_east_asia) = read_collection(scheme.child("a:minorFont"));
        Self {
            major_latin,
            major_east_asia,
            minor_latin,
            minor_east_asia,
        }
    }

    /// Resolve a theme reference such as `minorEastAsia` or `majorHAnsi`.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        let font = match reference {
            "majorEastAsia" => &self.major_east_asia,
            "minorEastAsia" => &self.minor_east_asia,
            "majorAscii" | "majorHAnsi" | "majorBidi" => &self.major_latin,
            "minorAscii" | "minorHAnsi" | "minorBidi" => &self.minor_latin,
            _ => return None,
        };
        font.as_deref()
    }

    /// Body East Asian font.
    pub fn body_east_asia(&self) -> Option<&str> {
        self.minor_east_asia.as_deref()
    }

    /// Body Latin font.
    pub fn body_latin(&self) -> Option<&str> {
        self.minor_latin.as_deref()
    }
}

fn typeface(element: Option<&XmlElement>) -> Option<String> {
    element
        .and_then(|e| e.attr("typeface"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn read_collection(collection: Option<&XmlElement>) -> (Option<String>, Option<String>) {
    let Some(collection) = collection else {
        return (None, None);
    };
    let latin = typeface(collection.child("a:latin"));
    // Western themes leave a:ea empty and list the Simplified Chinese face per script.
    let east_asia = typeface(collection.child("a:ea")).or_else(|| {
        typeface(
            collection
                .children_named("a:font")
                .find(|f| f.attr("script") == Some("Hans")),
        )
    });
    (latin, east_asia)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::XmlDocument;

    const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
<a:themeElements><a:fontScheme name="Office">
<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:font script="Hans" typeface="等线 Light"/></a:majorFont>
<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface="宋体"/></a:minorFont>
</a:fontScheme></a:themeElements></a:theme>"#;

    #[test]
    fn test_theme_fonts() {
        let doc = XmlDocument::parse(THEME.as_bytes(), "theme").unwrap();
        let fonts = ThemeFonts::from_theme(&doc.root);
        assert_eq!(fonts.major_latin.as_deref(), Some("Calibri Light"));
        assert_eq!(fonts.major_east_asia.as_deref(), Some("等线 Light"));
        assert_eq!(fonts.resolve("minorEastAsia"), Some("宋体"));
        assert_eq!(fonts.resolve("minorHAnsi"), Some("Calibri"));
        assert_eq!(fonts.resolve("bogus"), None);
    }

    #[test]
    fn test_missing_scheme() {
        let doc = XmlDocument::parse(b"<a:theme/>", "theme").unwrap();
        assert_eq!(ThemeFonts::from_theme(&doc.root), ThemeFonts::default());
    }
}
