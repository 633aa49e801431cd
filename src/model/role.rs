//! Structural paragraph roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The structural role of a paragraph inside a thesis.
///
/// Labels are the snake-case names used in requirement files and in oracle
/// responses (`title_zh`, `abstract_content_en`, `heading2`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParagraphRole {
    #[serde(rename = "title_zh")]
    TitleZh,
    #[serde(rename = "title_en")]
    TitleEn,
    #[serde(rename = "abstract_zh")]
    AbstractZh,
    #[serde(rename = "abstract_content_zh")]
    AbstractContentZh,
    #[serde(rename = "abstract_en")]
    AbstractEn,
    #[serde(rename = "abstract_content_en")]
    AbstractContentEn,
    #[serde(rename = "keywords_zh")]
    KeywordsZh,
    #[serde(rename = "keywords_content_zh")]
    KeywordsContentZh,
    #[serde(rename = "keywords_en")]
    KeywordsEn,
    #[serde(rename = "keywords_content_en")]
    KeywordsContentEn,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "body")]
    Body,
    /// Figures and figure captions
    #[serde(rename = "figures")]
    Figure,
    /// Tables and table captions
    #[serde(rename = "tables")]
    Table,
    #[serde(rename = "references")]
    References,
    #[serde(rename = "references_content")]
    ReferencesContent,
    #[serde(rename = "acknowledgments")]
    Acknowledgments,
    #[serde(rename = "acknowledgments_content")]
    AcknowledgmentsContent,
    #[serde(rename = "equation")]
    Equation,
    #[serde(rename = "others")]
    Others,
}

impl ParagraphRole {
    /// Every role, in document-typical order.
    pub const ALL: [ParagraphRole; 22] = [
        ParagraphRole::TitleZh,
        ParagraphRole::TitleEn,
        ParagraphRole::AbstractZh,
        ParagraphRole::AbstractContentZh,
        ParagraphRole::AbstractEn,
        ParagraphRole::AbstractContentEn,
        ParagraphRole::KeywordsZh,
        ParagraphRole::KeywordsContentZh,
        ParagraphRole::KeywordsEn,
        ParagraphRole::KeywordsContentEn,
        ParagraphRole::Heading1,
        ParagraphRole::Heading2,
        ParagraphRole::Heading3,
        ParagraphRole::Body,
        ParagraphRole::Figure,
        ParagraphRole::Table,
        ParagraphRole::References,
        ParagraphRole::ReferencesContent,
        ParagraphRole::Acknowledgments,
        ParagraphRole::AcknowledgmentsContent,
        ParagraphRole::Equation,
        ParagraphRole::Others,
    ];

    /// Canonical label.
    pub fn label(self) -> &'static str {
        match self {
            ParagraphRole::TitleZh => "title_zh",
            ParagraphRole::TitleEn => "title_en",
            ParagraphRole::AbstractZh => "abstract_zh",
            ParagraphRole::AbstractContentZh => "abstract_content_zh",
            ParagraphRole::AbstractEn => "abstract_en",
            ParagraphRole::AbstractContentEn => "abstract_content_en",
            ParagraphRole::KeywordsZh => "keywords_zh",
            ParagraphRole::KeywordsContentZh => "keywords_content_zh",
            ParagraphRole::KeywordsEn => "keywords_en",
            ParagraphRole::KeywordsContentEn => "keywords_content_en",
            ParagraphRole::Heading1 => "heading1",
            ParagraphRole::Heading2 => "heading2",
            ParagraphRole::Heading3 => "heading3",
            ParagraphRole::Body => "body",
            ParagraphRole::Figure => "figures",
            ParagraphRole::Table => "tables",
            ParagraphRole::References => "references",
            ParagraphRole::ReferencesContent => "references_content",
            ParagraphRole::Acknowledgments => "acknowledgments",
            ParagraphRole::AcknowledgmentsContent => "acknowledgments_content",
            ParagraphRole::Equation => "equation",
            ParagraphRole::Others => "others",
        }
    }

    /// Chinese display name, used in reports and oracle prompts.
    pub fn display_name_zh(self) -> &'static str {
        match self {
            ParagraphRole::TitleZh => "中文标题",
            ParagraphRole::TitleEn => "英文标题",
            ParagraphRole::AbstractZh => "中文摘要",
            ParagraphRole::AbstractContentZh => "中文摘要内容",
            ParagraphRole::AbstractEn => "英文摘要",
            ParagraphRole::AbstractContentEn => "英文摘要内容",
            ParagraphRole::KeywordsZh => "中文关键词",
            ParagraphRole::KeywordsContentZh => "中文关键词内容",
            ParagraphRole::KeywordsEn => "英文关键词",
            ParagraphRole::KeywordsContentEn => "英文关键词内容",
            ParagraphRole::Heading1 => "一级标题",
            ParagraphRole::Heading2 => "二级标题",
            ParagraphRole::Heading3 => "三级标题",
            ParagraphRole::Body => "正文",
            ParagraphRole::Figure => "图片",
            ParagraphRole::Table => "表格",
            ParagraphRole::References => "参考文献",
            ParagraphRole::ReferencesContent => "参考文献内容",
            ParagraphRole::Acknowledgments => "致谢",
            ParagraphRole::AcknowledgmentsContent => "致谢内容",
            ParagraphRole::Equation => "公式",
            ParagraphRole::Others => "其他",
        }
    }

    /// Parse a label leniently.
    ///
    /// Accepts canonical labels, a few common aliases, and decorated labels
    /// such as `"others (其他)"` where only the first word counts.
    pub fn from_label(label: &str) -> Option<Self> {
        let cleaned = label
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == ',')
            .to_ascii_lowercase();

        let role = match cleaned.as_str() {
            "title_zh" => ParagraphRole::TitleZh,
            "title_en" => ParagraphRole::TitleEn,
            "abstract_zh" => ParagraphRole::AbstractZh,
            "abstract_content_zh" => ParagraphRole::AbstractContentZh,
            "abstract_en" => ParagraphRole::AbstractEn,
            "abstract_content_en" => ParagraphRole::AbstractContentEn,
            "keywords_zh" => ParagraphRole::KeywordsZh,
            "keywords_content_zh" => ParagraphRole::KeywordsContentZh,
            "keywords_en" => ParagraphRole::KeywordsEn,
            "keywords_content_en" => ParagraphRole::KeywordsContentEn,
            "heading1" | "heading_1" => ParagraphRole::Heading1,
            "heading2" | "heading_2" => ParagraphRole::Heading2,
            "heading3" | "heading_3" => ParagraphRole::Heading3,
            "body" => ParagraphRole::Body,
            "figures" | "figure" => ParagraphRole::Figure,
            "tables" | "table" => ParagraphRole::Table,
            "references" | "reference" => ParagraphRole::References,
            "references_content" | "reference_content" => ParagraphRole::ReferencesContent,
            "acknowledgments" | "acknowledgements" => ParagraphRole::Acknowledgments,
            "acknowledgments_content" | "acknowledgements_content" => {
                ParagraphRole::AcknowledgmentsContent
            }
            "equation" | "equations" => ParagraphRole::Equation,
            "others" | "other" => ParagraphRole::Others,
            _ => return None,
        };
        Some(role)
    }

    /// Roles whose rule-pass decision is authoritative and skips inference.
    pub fn is_special(self) -> bool {
        matches!(
            self,
            ParagraphRole::AbstractZh
                | ParagraphRole::AbstractEn
                | ParagraphRole::AbstractContentZh
                | ParagraphRole::AbstractContentEn
                | ParagraphRole::KeywordsZh
                | ParagraphRole::KeywordsEn
                | ParagraphRole::KeywordsContentZh
                | ParagraphRole::KeywordsContentEn
                | ParagraphRole::References
                | ParagraphRole::ReferencesContent
                | ParagraphRole::Acknowledgments
                | ParagraphRole::AcknowledgmentsContent
        )
    }

    /// The content role that follows a section heading role.
    pub fn content_role(self) -> Option<Self> {
        match self {
            ParagraphRole::AbstractZh => Some(ParagraphRole::AbstractContentZh),
            ParagraphRole::AbstractEn => Some(ParagraphRole::AbstractContentEn),
            ParagraphRole::KeywordsZh => Some(ParagraphRole::KeywordsContentZh),
            ParagraphRole::KeywordsEn => Some(ParagraphRole::KeywordsContentEn),
            ParagraphRole::References => Some(ParagraphRole::ReferencesContent),
            ParagraphRole::Acknowledgments => Some(ParagraphRole::AcknowledgmentsContent),
            _ => None,
        }
    }

    /// Whether this role's paragraph content is shared as context.
    pub fn is_heading_like(self) -> bool {
        matches!(
            self,
            ParagraphRole::TitleZh
                | ParagraphRole::TitleEn
                | ParagraphRole::AbstractZh
                | ParagraphRole::AbstractEn
                | ParagraphRole::KeywordsZh
                | ParagraphRole::KeywordsEn
                | ParagraphRole::Heading1
                | ParagraphRole::Heading2
                | ParagraphRole::Heading3
                | ParagraphRole::References
                | ParagraphRole::Acknowledgments
        )
    }

    /// Abstract or keyword content roles.
    pub fn is_front_matter_content(self) -> bool {
        matches!(
            self,
            ParagraphRole::AbstractContentZh
                | ParagraphRole::AbstractContentEn
                | ParagraphRole::KeywordsContentZh
                | ParagraphRole::KeywordsContentEn
        )
    }

    /// Roles whose requirement fonts apply to captions of figures and tables.
    pub fn is_caption_role(self) -> bool {
        matches!(self, ParagraphRole::Figure | ParagraphRole::Table)
    }
}

impl fmt::Display for ParagraphRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParagraphRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParagraphRole::from_label(s).ok_or_else(|| format!("unknown paragraph role: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for role in ParagraphRole::ALL {
            assert_eq!(ParagraphRole::from_label(role.label()), Some(role));
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ParagraphRole::Heading2).unwrap();
        assert_eq!(json, "\"heading2\"");
        let role: ParagraphRole = serde_json::from_str("\"keywords_content_en\"").unwrap();
        assert_eq!(role, ParagraphRole::KeywordsContentEn);
        let role: ParagraphRole = serde_json::from_str("\"figures\"").unwrap();
        assert_eq!(role, ParagraphRole::Figure);
    }

    #[test]
    fn test_decorated_labels() {
        assert_eq!(
            ParagraphRole::from_label("others (其他)"),
            Some(ParagraphRole::Others)
        );
        assert_eq!(ParagraphRole::from_label("  Body "), Some(ParagraphRole::Body));
        assert_eq!(ParagraphRole::from_label("cover"), None);
        assert_eq!(ParagraphRole::from_label(""), None);
    }

    #[test]
    fn test_content_roles() {
        assert_eq!(
            ParagraphRole::KeywordsZh.content_role(),
            Some(ParagraphRole::KeywordsContentZh)
        );
        assert_eq!(ParagraphRole::Body.content_role(), None);
        assert!(ParagraphRole::ReferencesContent.is_special());
        assert!(!ParagraphRole::Heading1.is_special());
    }
}
