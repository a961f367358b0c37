use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use textdoc_core::{DocumentFragment, DocumentSelection, MoveMode, TextCursor, TextDocument};

fn large_html(paragraphs: usize) -> String {
    let mut out = String::with_capacity(paragraphs * 96);
    out.push_str("<html><body>");
    for i in 0..paragraphs {
        if i % 50 == 0 {
            out.push_str("<ul><li>first item</li><li>second <i>item</i></li></ul>");
        }
        if i % 200 == 0 {
            out.push_str("<table border=\"1\"><tr><td>a</td><td colspan=\"2\">b</td></tr><tr><td>c</td><td>d</td><td>e</td></tr></table>");
        }
        out.push_str(&format!(
            "<p>{i:06} the quick <b>brown</b> fox &amp; the <span style=\"color: #336699\">lazy</span> dog</p>"
        ));
    }
    out.push_str("</body></html>");
    out
}

fn bench_set_html(c: &mut Criterion) {
    let html = large_html(2_000);
    c.bench_function("set_html/2k_paragraphs", |b| {
        b.iter(|| {
            let mut doc = TextDocument::new();
            doc.set_html(black_box(&html));
            black_box(doc.len());
        })
    });
}

fn bench_fragment_copy(c: &mut Criterion) {
    let mut doc = TextDocument::new();
    doc.set_html(&large_html(2_000));
    c.bench_function("fragment/copy_whole_document", |b| {
        b.iter(|| {
            let selection = DocumentSelection::whole_document(&doc);
            let fragment = DocumentFragment::from_selection(selection);
            black_box(fragment.is_empty());
        })
    });
}

fn bench_fragment_paste(c: &mut Criterion) {
    let mut source = TextDocument::new();
    source.set_html(&large_html(500));
    let fragment = DocumentFragment::from_document(&source);
    c.bench_function("fragment/paste_into_middle", |b| {
        b.iter_batched(
            || TextDocument::from_plain_text("before after"),
            |mut doc| {
                let mut cursor = TextCursor::new(&mut doc);
                let _ = cursor.set_position(7, MoveMode::MoveAnchor);
                fragment.insert(&mut cursor);
                black_box(doc.len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_export(c: &mut Criterion) {
    let mut doc = TextDocument::new();
    doc.set_html(&large_html(2_000));
    c.bench_function("to_html/2k_paragraphs", |b| {
        b.iter(|| black_box(doc.to_html().len()))
    });
}

criterion_group!(
    benches,
    bench_set_html,
    bench_fragment_copy,
    bench_fragment_paste,
    bench_export
);
criterion_main!(benches);
