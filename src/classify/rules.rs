//! Deterministic rule pass.
//!
//! Each decision depends only on the paragraph text, the role of the
//! previous text paragraph, and whether abstract or keyword content has been
//! seen so far.

use super::config::ClassifierConfig;
use crate::model::ParagraphRole;
use crate::parser::SECTION_LABEL;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)*)\.?\s+\S").expect("valid numbered heading regex")
});

static CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*第\s*[一二三四五六七八九十百零〇\d]+\s*章").expect("valid chapter regex")
});

/// Caption prefix: 图/表/Fig./Table followed by a number.
pub static CAPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(图|表|Fig\.|Figure|Table)\s*\d+").expect("valid caption regex")
});

/// `Figure` or `Table` when the text opens with a numbered caption prefix.
pub fn caption_kind(text: &str) -> Option<ParagraphRole> {
    let found = CAPTION.captures(text)?;
    let kind = found.get(1)?.as_str().to_lowercase();
    Some(if kind == "图" || kind.starts_with("fig") {
        ParagraphRole::Figure
    } else {
        ParagraphRole::Table
    })
}

static EQUATION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(（]\d+(?:[.\-]\d+)?[)）]\s*$").expect("valid equation regex"));

static REFERENCE_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\[［]\d+[\]］]").expect("valid reference entry regex"));

/// Numbered headings longer than this are treated as list items.
const MAX_HEADING_CHARS: usize = 60;

const EQUATION_OPERATORS: &[char] = &['=', '+', '-', '×', '÷', '≤', '≥', '≈'];

/// Sequential state carried from one text paragraph to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleContext {
    /// Role of the previous text paragraph
    pub previous: Option<ParagraphRole>,
    /// Whether abstract or keyword content appeared earlier
    pub front_matter_seen: bool,
}

impl RuleContext {
    /// Advance past a paragraph that received `role`.
    pub fn advance(&mut self, role: ParagraphRole) {
        self.previous = Some(role);
        self.front_matter_seen |= role.is_front_matter_content();
    }
}

/// Outcome of the rule pass for one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDecision {
    pub role: ParagraphRole,
    /// False when no rule fired and `role` is the body default
    pub matched: bool,
}

impl RuleDecision {
    fn matched(role: ParagraphRole) -> Self {
        Self {
            role,
            matched: true,
        }
    }

    /// Authoritative decisions skip the oracle.
    pub fn is_authoritative(&self) -> bool {
        self.matched && self.role.is_special()
    }
}

/// Run the rule pass on one paragraph.
pub fn apply_rules(text: &str, context: &RuleContext, config: &ClassifierConfig) -> RuleDecision {
    let trimmed = text.trim();
    let label = section_label(trimmed);

    if let Some(previous) = context.previous {
        if let Some(content) = previous.content_role() {
            if !trimmed.is_empty() && label.is_none() {
                return RuleDecision::matched(content);
            }
        }
        if previous == ParagraphRole::ReferencesContent && REFERENCE_ENTRY.is_match(trimmed) {
            return RuleDecision::matched(ParagraphRole::ReferencesContent);
        }
    }

    if context.front_matter_seen && trimmed.chars().count() > config.long_body_threshold {
        return RuleDecision::matched(ParagraphRole::Body);
    }

    if let Some(role) = label {
        return RuleDecision::matched(role);
    }

    if let Some(role) = heading_role(trimmed) {
        return RuleDecision::matched(role);
    }

    let lowered = trimmed.to_lowercase();
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if lowered.starts_with("references") || compact.starts_with("参考文献") {
        return RuleDecision::matched(ParagraphRole::References);
    }
    if lowered.starts_with("acknowledgment")
        || lowered.starts_with("acknowledgement")
        || compact.starts_with("致谢")
    {
        return RuleDecision::matched(ParagraphRole::Acknowledgments);
    }

    if let Some(role) = caption_kind(trimmed) {
        return RuleDecision::matched(role);
    }

    if is_equation(trimmed) {
        return RuleDecision::matched(ParagraphRole::Equation);
    }

    RuleDecision {
        role: ParagraphRole::Body,
        matched: false,
    }
}

/// Heading role for a section label, with or without a trailing colon.
pub fn section_label(text: &str) -> Option<ParagraphRole> {
    let keyword = match SECTION_LABEL.captures(text) {
        Some(found) => found.get(1)?.as_str().to_lowercase(),
        None => {
            // A bare label on its own line, possibly letter-spaced ("摘  要").
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let compact = compact.to_lowercase();
            if !matches!(compact.as_str(), "摘要" | "abstract" | "关键词" | "keywords") {
                return None;
            }
            compact
        }
    };

    match keyword.as_str() {
        "摘要" => Some(ParagraphRole::AbstractZh),
        "abstract" => Some(ParagraphRole::AbstractEn),
        "关键词" => Some(ParagraphRole::KeywordsZh),
        "keywords" => Some(ParagraphRole::KeywordsEn),
        _ => None,
    }
}

/// Heading level from a numbered or chapter prefix.
pub fn heading_role(text: &str) -> Option<ParagraphRole> {
    if text.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    if CHAPTER_HEADING.is_match(text) {
        return Some(ParagraphRole::Heading1);
    }
    let found = NUMBERED_HEADING.captures(text)?;
    let depth = found.get(1)?.as_str().split('.').count();
    Some(match depth {
        1 => ParagraphRole::Heading1,
        2 => ParagraphRole::Heading2,
        _ => ParagraphRole::Heading3,
    })
}

/// Text ending in an equation number and holding an operator.
pub fn is_equation(text: &str) -> bool {
    EQUATION_NUMBER.is_match(text) && text.contains(EQUATION_OPERATORS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(text: &str, previous: Option<ParagraphRole>) -> RuleDecision {
        let context = RuleContext {
            previous,
            front_matter_seen: false,
        };
        apply_rules(text, &context, &ClassifierConfig::default())
    }

    // ==================== Label Tests ====================

    #[test]
    fn test_section_labels() {
        assert_eq!(decide("摘要：", None).role, ParagraphRole::AbstractZh);
        assert_eq!(decide("Abstract:", None).role, ParagraphRole::AbstractEn);
        assert_eq!(decide("关键词：", None).role, ParagraphRole::KeywordsZh);
        assert_eq!(decide("KEYWORDS:", None).role, ParagraphRole::KeywordsEn);
        assert_eq!(decide("摘  要", None).role, ParagraphRole::AbstractZh);
        assert!(decide("Keywords:", None).is_authoritative());
    }

    #[test]
    fn test_keywords_after_abstract_content() {
        let decision = decide("Keywords:", Some(ParagraphRole::AbstractContentEn));
        assert_eq!(decision.role, ParagraphRole::KeywordsEn);
        assert!(decision.is_authoritative());

        let decision = decide("关键词：", Some(ParagraphRole::AbstractContentZh));
        assert_eq!(decision.role, ParagraphRole::KeywordsZh);
    }

    // ==================== Continuation Tests ====================

    #[test]
    fn test_continuation() {
        assert_eq!(
            decide("本文研究了格式检查。", Some(ParagraphRole::AbstractZh)).role,
            ParagraphRole::AbstractContentZh
        );
        assert_eq!(
            decide("格式；检查；论文", Some(ParagraphRole::KeywordsZh)).role,
            ParagraphRole::KeywordsContentZh
        );
        assert_eq!(
            decide("[1] 张三. 论文格式[J]. 学报, 2020.", Some(ParagraphRole::References)).role,
            ParagraphRole::ReferencesContent
        );
        assert_eq!(
            decide("[2] 李四. 排版[M]. 北京: 出版社, 2019.", Some(ParagraphRole::ReferencesContent)).role,
            ParagraphRole::ReferencesContent
        );
        // A label right after a heading is not its content.
        assert_eq!(
            decide("Keywords:", Some(ParagraphRole::AbstractEn)).role,
            ParagraphRole::KeywordsEn
        );
    }

    #[test]
    fn test_long_body_override() {
        let context = RuleContext {
            previous: Some(ParagraphRole::KeywordsContentZh),
            front_matter_seen: true,
        };
        let long = "研".repeat(250);
        let decision = apply_rules(&long, &context, &ClassifierConfig::default());
        assert_eq!(decision.role, ParagraphRole::Body);
        assert!(decision.matched);
        assert!(!decision.is_authoritative());
    }

    // ==================== Structure Tests ====================

    #[test]
    fn test_headings() {
        assert_eq!(decide("1 引言", None).role, ParagraphRole::Heading1);
        assert_eq!(decide("2.1 研究背景", None).role, ParagraphRole::Heading2);
        assert_eq!(decide("3.2.1 实验设置", None).role, ParagraphRole::Heading3);
        assert_eq!(decide("第一章 绪论", None).role, ParagraphRole::Heading1);
        assert_eq!(decide("2019年以来，研究不断深入。", None).role, ParagraphRole::Body);
    }

    #[test]
    fn test_back_matter() {
        assert_eq!(decide("参考文献", None).role, ParagraphRole::References);
        assert_eq!(decide("References", None).role, ParagraphRole::References);
        assert_eq!(decide("致  谢", None).role, ParagraphRole::Acknowledgments);
        assert_eq!(
            decide("本论文得到了导师的悉心指导。", Some(ParagraphRole::Acknowledgments)).role,
            ParagraphRole::AcknowledgmentsContent
        );
    }

    #[test]
    fn test_captions_and_equations() {
        assert_eq!(decide("图1 系统架构", None).role, ParagraphRole::Figure);
        assert_eq!(decide("Fig. 2 Results", None).role, ParagraphRole::Figure);
        assert_eq!(decide("表 3 实验结果", None).role, ParagraphRole::Table);
        assert_eq!(decide("E = mc^2 (1)", None).role, ParagraphRole::Equation);
        assert_eq!(decide("见文献（1）", None).role, ParagraphRole::Body);
    }

    #[test]
    fn test_default_is_unmatched_body() {
        let decision = decide("这是一个普通的正文段落。", None);
        assert_eq!(decision.role, ParagraphRole::Body);
        assert!(!decision.matched);
    }
}
