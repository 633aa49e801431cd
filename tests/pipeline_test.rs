//! End-to-end tests: check, fix, recreate, derive and cite.

mod common;

use common::{sample_thesis, DocxBuilder};
use serde_json::json;
use thesisfmt::model::ElementContent;
use thesisfmt::render::{self, JsonFormat};
use thesisfmt::{
    parse_bytes, Alignment, CitationStyle, CompareOptions, ParagraphRole, RequirementSpec,
    Thesisfmt, ViolationKind,
};

fn abstract_spec() -> RequirementSpec {
    RequirementSpec::from_value(json!({
        "abstract_content_zh": {
            "paragraph_format": {"alignment": "justify"}
        },
        "body": {
            "fonts": {"size": "小四"},
            "paragraph_format": {"alignment": "justify"}
        }
    }))
    .unwrap()
}

fn kinds(data: &[u8]) -> Vec<String> {
    parse_bytes(data)
        .unwrap()
        .records
        .iter()
        .map(|r| match &r.element {
            ElementContent::Text => format!("text:{}", r.text),
            ElementContent::Image(_) => "image".to_string(),
            ElementContent::Table(t) => format!("table:{}", t.rows.len()),
        })
        .collect()
}

// ==================== Check Tests ====================

#[test]
fn test_centered_abstract_is_reported() {
    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    let report = thesis.check(&abstract_spec());

    let alignment: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.location == "abstract_content_zh.paragraph_format.alignment")
        .collect();
    assert_eq!(alignment.len(), 1);
    assert_eq!(alignment[0].expected, json!("justify"));
    assert_eq!(alignment[0].actual, json!("center"));
    assert_eq!(alignment[0].paragraph, Some(1));
    assert!(!report.is_clean());
    assert_eq!(report.stats.paragraph_count, 6);
}

#[test]
fn test_structure_checks_follow_requirements() {
    let data = DocxBuilder::new()
        .paragraph("摘要：")
        .paragraph("太短。")
        .paragraph("关键词：格式")
        .build();
    let spec = RequirementSpec::from_value(json!({
        "title_zh": {"fonts": {"bold": true}},
        "abstract_content_zh": {"fonts": {"bold": false}}
    }))
    .unwrap();

    let report = Thesisfmt::new().open_bytes(&data).unwrap().check(&spec);
    let structure: Vec<&str> = report
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::Structure)
        .map(|v| v.location.as_str())
        .collect();
    assert!(structure.contains(&"document.title_zh"));
    assert!(structure.contains(&"document.abstract_content_zh"));
    assert!(structure.contains(&"document.keywords_content_zh"));

    let quiet = Thesisfmt::new()
        .with_compare_options(CompareOptions::default().with_structural_checks(false))
        .open_bytes(&data)
        .unwrap()
        .check(&spec);
    assert!(quiet.violations.iter().all(|v| v.kind != ViolationKind::Structure));
}

#[test]
fn test_paper_violation() {
    let spec = RequirementSpec::from_value(json!({
        "paper": {"size": "A4", "margins": {"left": "3cm"}}
    }))
    .unwrap();
    let report = Thesisfmt::new()
        .open_bytes(&sample_thesis().build())
        .unwrap()
        .check(&spec);

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].location, "paper.margins.left");
}

#[test]
fn test_reports_render() {
    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    let report = thesis.check(&abstract_spec());

    let text = render::to_text(&report);
    assert!(text.contains("[abstract_content_zh] 1"));
    assert!(text.contains("[body]"));

    let json = render::to_json(&report, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value["violations"].as_array().unwrap().len(),
        report.violations.len()
    );
    assert!(!json.contains('\n'));
}

// ==================== Fix Tests ====================

#[test]
fn test_fix_in_place_resolves_violations() {
    let spec = abstract_spec();
    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    assert!(!thesis.violations(&spec).is_empty());

    let (package, summary) = thesis.fix(&spec).unwrap();
    assert!(summary.formatted >= 2);
    assert_eq!(summary.failed, 0);

    let fixed = Thesisfmt::new().open_bytes(&package.to_bytes().unwrap()).unwrap();
    let records = &fixed.document().records;
    assert_eq!(records[1].role, ParagraphRole::AbstractContentZh);
    assert_eq!(records[1].format.alignment, Alignment::Justify);
    assert_eq!(records[5].fonts.size.first(), Some(&12.0));
    assert!(fixed.violations(&spec).is_empty(), "{:?}", fixed.violations(&spec));
}

#[test]
fn test_fix_preserves_order_and_content() {
    let data = DocxBuilder::new()
        .paragraph("摘要：本文研究论文格式的自动检查方法。")
        .paragraph("1 引言")
        .paragraph("系统结构如下。")
        .image()
        .centered("图1 系统结构")
        .empty()
        .centered("表1 实验结果")
        .table(&[&["方法", "准确率"], &["规则", "0.9"]])
        .paragraph("结论段落。")
        .build();
    let thesis = Thesisfmt::new().open_bytes(&data).unwrap();
    let before = kinds(&data);

    let (package, summary) = thesis.fix(&abstract_spec()).unwrap();
    let after = kinds(&package.to_bytes().unwrap());

    assert_eq!(before, after);
    assert!(summary.special >= 4);
}

#[test]
fn test_fix_leaves_source_untouched() {
    let data = sample_thesis().build();
    let thesis = Thesisfmt::new().open_bytes(&data).unwrap();
    thesis.fix(&abstract_spec()).unwrap();
    assert_eq!(
        thesis.package().part("word/document.xml"),
        parse_source_part(&data).as_deref()
    );
}

fn parse_source_part(data: &[u8]) -> Option<Vec<u8>> {
    thesisfmt::Package::from_bytes(data.to_vec())
        .unwrap()
        .part("word/document.xml")
        .map(<[u8]>::to_vec)
}

#[test]
fn test_highlight_marks_violating_paragraphs() {
    let spec = RequirementSpec::from_value(json!({
        "abstract_content_zh": {"paragraph_format": {"alignment": "justify"}}
    }))
    .unwrap();
    let thesis = Thesisfmt::new()
        .with_highlight(true)
        .open_bytes(&sample_thesis().build())
        .unwrap();

    let (package, summary) = thesis.fix(&spec).unwrap();
    assert_eq!(summary.highlighted, 1);

    let fixed = parse_bytes(&package.to_bytes().unwrap()).unwrap();
    assert_eq!(fixed.records[1].fonts.color.first().map(String::as_str), Some("#FF0000"));
    assert_ne!(fixed.records[5].fonts.color.first().map(String::as_str), Some("#FF0000"));
}

#[test]
fn test_fix_applies_page_settings() {
    let spec = RequirementSpec::from_value(json!({
        "paper": {"size": "A4", "margins": {"left": "3cm", "right": "2.5cm"}}
    }))
    .unwrap();
    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    let (package, summary) = thesis.fix(&spec).unwrap();
    assert_eq!(summary.sections, 1);

    let fixed = parse_bytes(&package.to_bytes().unwrap()).unwrap();
    assert!((fixed.page.margins.left.cm() - 3.0).abs() < 0.01);
    assert!((fixed.page.margins.right.cm() - 2.5).abs() < 0.01);
}

#[test]
fn test_fix_to_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("fixed.docx");

    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    thesis.fix_to(&abstract_spec(), &output).unwrap();

    let reopened = Thesisfmt::new().open(&output).unwrap();
    assert_eq!(reopened.document().len(), 6);
    assert!(reopened.violations(&abstract_spec()).is_empty());
}

// ==================== Recreate Tests ====================

#[test]
fn test_recreate_keeps_content_order() {
    let data = DocxBuilder::new()
        .paragraph("摘要：本文研究论文格式的自动检查方法。")
        .paragraph("系统结构如下。")
        .image()
        .centered("图1 系统结构")
        .centered("表1 实验结果")
        .table(&[&["方法", "准确率"], &["规则", "0.9"]])
        .paragraph("结论段落。")
        .build();
    let thesis = Thesisfmt::new().open_bytes(&data).unwrap();

    let (package, summary) = thesis.recreate(&abstract_spec()).unwrap();
    let recreated = kinds(&package.to_bytes().unwrap());

    assert_eq!(recreated.len(), 8);
    assert_eq!(recreated[0], "text:摘要：");
    assert_eq!(recreated[2], "text:系统结构如下。");
    assert_eq!(recreated[3], "image");
    assert!(recreated[4].starts_with("text:图") && recreated[4].contains("系统结构"));
    assert!(recreated[5].starts_with("text:表") && recreated[5].contains("实验结果"));
    assert_eq!(recreated[6], "table:2");
    assert_eq!(recreated[7], "text:结论段落。");
    assert_eq!(summary.special, 4);
}

#[test]
fn test_recreated_document_satisfies_requirements() {
    let spec = abstract_spec();
    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    let (package, _) = thesis.recreate(&spec).unwrap();

    let recreated = Thesisfmt::new()
        .open_bytes(&package.to_bytes().unwrap())
        .unwrap();
    assert!(recreated.violations(&spec).is_empty(), "{:?}", recreated.violations(&spec));
    assert!(package.has_part("word/styles.xml"));
    assert!(package.has_part("[Content_Types].xml"));
}

// ==================== Derive and Cite Tests ====================

#[test]
fn test_reference_document_satisfies_derived_requirements() {
    let thesis = Thesisfmt::new().open_bytes(&sample_thesis().build()).unwrap();
    let spec = thesis.derive();

    assert!(spec.role(ParagraphRole::AbstractContentZh).is_some());
    assert_eq!(spec.paper().unwrap()["size"], json!("A4"));

    let reparsed = RequirementSpec::from_json_str(&spec.to_json_pretty().unwrap()).unwrap();
    assert!(thesis.check(&reparsed).is_clean(), "{:?}", thesis.check(&reparsed).violations);
}

#[test]
fn test_citation_check() {
    let data = DocxBuilder::new()
        .paragraph("正文内容。")
        .paragraph("参考文献")
        .paragraph("[1] 张三, 李四. 论文格式研究[J]. 计算机学报, 2020, 43(5): 1-10.")
        .paragraph("王五 排版原理")
        .build();
    let thesis = Thesisfmt::new().open_bytes(&data).unwrap();

    let violations = thesis.cite(CitationStyle::GbT7714);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::Citation);
    assert_eq!(violations[0].paragraph, Some(3));
}
