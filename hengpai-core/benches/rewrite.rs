//! Rewrite benchmarks

use criterion::{criterion_group, criterion_main, Criterion};
use hengpai_core::punctuation::remap_punctuation;
use hengpai_core::rewriter::{rewrite_content, strip_spine_direction};
use std::hint::black_box;

fn chapter_text() -> String {
    let paragraph =
        "<p>\u{FE41}山不在高\u{FE10}有仙則名\u{FE12}水不在深\u{FE10}有龍則靈\u{FE12}\u{FE42}</p>\n";
    format!(
        "<html><head><style>body {{ writing-mode: vertical-rl; }}</style></head><body>{}</body></html>",
        paragraph.repeat(500)
    )
}

fn rewrite_benchmark(c: &mut Criterion) {
    let chapter = chapter_text();
    let plain = chapter.replace("vertical-rl", "horizontal-tb");
    let package = format!(
        r#"<package><manifest>{}</manifest><spine page-progression-direction="rtl" toc="ncx"/></package>"#,
        "<item id=\"x\" href=\"x.xhtml\"/>".repeat(200)
    );

    c.bench_function("rewrite_content", |b| {
        b.iter(|| rewrite_content(black_box(&chapter)).len())
    });
    c.bench_function("remap_punctuation", |b| {
        b.iter(|| remap_punctuation(black_box(&plain)).len())
    });
    c.bench_function("strip_spine_direction", |b| {
        b.iter(|| strip_spine_direction(black_box(&package)).len())
    });
}

criterion_group!(benches, rewrite_benchmark);
criterion_main!(benches);
