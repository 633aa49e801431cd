//! Parsing options and configuration.

/// Options for parsing DOCX documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode for auxiliary parts (styles, theme, relationships)
    pub error_mode: ErrorMode,

    /// Split paragraphs that embed a section keyword label
    pub split_keywords: bool,

    /// Whether to extract image paragraphs and media bytes
    pub extract_images: bool,

    /// Whether to extract tables as records
    pub extract_tables: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip unreadable auxiliary parts).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable keyword splitting.
    pub fn with_keyword_split(mut self, split: bool) -> Self {
        self.split_keywords = split;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Extract text paragraphs only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self.extract_tables = false;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            split_keywords: true,
            extract_images: true,
            extract_tables: true,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail when an auxiliary part is malformed
    #[default]
    Strict,
    /// Skip malformed auxiliary parts and continue with defaults
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .text_only()
            .with_keyword_split(false);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.extract_images);
        assert!(!options.extract_tables);
        assert!(!options.split_keywords);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.split_keywords);
        assert!(options.extract_images);
        assert!(options.extract_tables);
    }
}
