//! Benchmarks for thesisfmt pipeline performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks build synthetic DOCX packages in memory.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use thesisfmt::{Package, RequirementSpec, Thesisfmt};

/// Creates a DOCX with a front matter block and `chapters` numbered chapters.
fn create_test_docx(chapters: usize) -> Vec<u8> {
    let mut body = String::new();
    let mut paragraph = |text: &str| {
        body.push_str(&format!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
            text
        ));
    };

    paragraph("摘要：本文研究论文格式的自动检查与修正方法。");
    paragraph("关键词：格式；论文；检查");
    for chapter in 1..=chapters {
        paragraph(&format!("{} 第{}章", chapter, chapter));
        for line in 0..20 {
            paragraph(&format!(
                "第{}章第{}段正文内容，用于测量提取、分类、比较与修正的性能。",
                chapter, line
            ));
        }
    }

    let document = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800"/></w:sectPr>"#,
            r#"</w:body></w:document>"#
        ),
        body
    );

    let mut package = Package::new();
    package.set_part("word/document.xml", document.into_bytes());
    package.to_bytes().expect("synthetic package serializes")
}

fn requirements() -> RequirementSpec {
    RequirementSpec::from_value(json!({
        "abstract_content_zh": {"paragraph_format": {"alignment": "justify"}},
        "heading1": {"fonts": {"size": "三号", "bold": true}},
        "body": {
            "fonts": {"zh_family": "宋体", "size": "小四"},
            "paragraph_format": {"alignment": "justify", "indentation": {"first_line": "2字符"}}
        },
        "paper": {"size": "A4", "margins": {"left": "3cm", "right": "3cm"}}
    }))
    .expect("valid requirements")
}

/// Benchmark DOCX format detection.
fn bench_format_detection(c: &mut Criterion) {
    let docx = create_test_docx(1);
    let non_docx = b"Not a DOCX file at all, just random text content";

    c.bench_function("detect_valid_docx", |b| {
        b.iter(|| thesisfmt::detect_format_from_bytes(black_box(&docx)).unwrap());
    });

    c.bench_function("detect_non_docx", |b| {
        b.iter(|| thesisfmt::detect_format_from_bytes(black_box(non_docx)).is_err());
    });
}

/// Benchmark extraction and rule classification at various sizes.
fn bench_parse_and_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_classify");

    for chapters in [1, 5, 20].iter() {
        let data = create_test_docx(*chapters);

        group.bench_function(format!("{}_chapters", chapters), |b| {
            b.iter(|| Thesisfmt::new().open_bytes(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark comparison and in-place correction on a parsed document.
fn bench_check_and_fix(c: &mut Criterion) {
    let data = create_test_docx(10);
    let spec = requirements();
    let thesis = Thesisfmt::new().open_bytes(&data).unwrap();

    c.bench_function("check_10_chapters", |b| {
        b.iter(|| thesis.check(black_box(&spec)));
    });

    c.bench_function("fix_10_chapters", |b| {
        b.iter(|| thesis.fix(black_box(&spec)).unwrap());
    });

    c.bench_function("recreate_10_chapters", |b| {
        b.iter(|| thesis.recreate(black_box(&spec)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_parse_and_classify,
    bench_check_and_fix,
);
criterion_main!(benches);
