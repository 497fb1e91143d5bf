//! Benchmarks for page layout analysis and sectioning.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfblocks::segment::{BlockOptions, BlockSectionBuilder, TextSectionBuilder};
use pdfblocks::{HeadingRules, PdfReader, ReaderOptions};

fn text_op(y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(11.0)]),
        Operation::new("Td", vec![Object::Real(72.0), Object::Real(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// A document whose every page opens a numbered section followed by 40
/// body lines.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in 1..=page_count {
        let mut operations = text_op(740.0, &format!("{} Section Heading Number {}", page, page));
        for line in 0..40 {
            let y = 720.0 - line as f32 * 15.0;
            operations.extend(text_op(
                y,
                &format!("Line {} of page {} describes a step of the procedure.", line, page),
            ));
        }
        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn bench_page_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_layouts");

    for page_count in [1, 10, 50] {
        let data = create_test_pdf(page_count);

        group.bench_function(format!("{}_pages_parallel", page_count), |b| {
            b.iter(|| {
                let reader = PdfReader::from_bytes(black_box(&data)).unwrap();
                reader.page_layouts().unwrap()
            });
        });

        group.bench_function(format!("{}_pages_sequential", page_count), |b| {
            b.iter(|| {
                let options = ReaderOptions::new().sequential();
                let reader = PdfReader::from_bytes_with_options(black_box(&data), options).unwrap();
                reader.page_layouts().unwrap()
            });
        });
    }

    group.finish();
}

fn bench_sectioning(c: &mut Criterion) {
    let data = create_test_pdf(20);
    let reader = PdfReader::from_bytes(&data).unwrap();
    let layouts = reader.page_layouts().unwrap();

    c.bench_function("text_sections", |b| {
        b.iter(|| {
            let mut builder = TextSectionBuilder::default();
            for layout in &layouts {
                builder.add_page(layout.page_number, &layout.text(), &[]);
            }
            builder.finish()
        });
    });

    c.bench_function("block_sections_paragraphs", |b| {
        b.iter(|| {
            let mut builder =
                BlockSectionBuilder::new(HeadingRules::strict(), BlockOptions::new().paragraphs());
            for layout in &layouts {
                builder.begin_page(layout.page_number);
                for line in &layout.lines {
                    builder.push_line(&line.text(), layout.line_bbox(line));
                }
            }
            builder.finish()
        });
    });
}

criterion_group!(benches, bench_page_layouts, bench_sectioning);
criterion_main!(benches);
