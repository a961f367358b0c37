//! Fragment properties
//!
//! Behaviour the clipboard pipeline must keep across copy, import and paste:
//! 1. Copying a whole document into an empty one reproduces text, blocks and char formats.
//! 2. HTML whitespace and margins collapse the way browsers do.
//! 3. Shared objects (lists, tables) are rebuilt, not referenced.
//! 4. Tables and lists survive a whole-document copy.
//! 5. Copying never mutates the source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use textdoc_core::{
    DocumentFragment, DocumentSelection, Format, MoveMode, PARAGRAPH_SEPARATOR, TextCursor,
    TextDocument,
};

/// Random lines of short words; some lines are empty.
fn random_text(rng: &mut StdRng) -> String {
    let lines = rng.gen_range(1..8);
    let mut out = Vec::new();
    for _ in 0..lines {
        let words = rng.gen_range(0..5);
        let line: Vec<String> = (0..words)
            .map(|_| {
                let len = rng.gen_range(1..6);
                (0..len)
                    .map(|_| char::from(b'a' + rng.gen_range(0..26u8)))
                    .collect()
            })
            .collect();
        out.push(line.join(" "));
    }
    out.join("\n")
}

fn is_bold_at(doc: &TextDocument, position: usize) -> bool {
    let run = doc.fragment_at(position).unwrap();
    doc.formats().format(run.format).is_bold()
}

#[test]
fn test_whole_document_copy_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut bold = Format::char();
    bold.set_font_weight(700);

    for _ in 0..50 {
        let text = random_text(&mut rng);
        let mut src = TextDocument::from_plain_text(&text);
        let content = src.len() - 1;
        if content > 0 {
            for _ in 0..rng.gen_range(0..4) {
                let start = rng.gen_range(0..content);
                let end = rng.gen_range(start..=content);
                src.merge_char_format(start..end, &bold).unwrap();
            }
        }

        let fragment = DocumentFragment::from_document(&src);
        let mut dst = TextDocument::new();
        {
            let mut cursor = TextCursor::new(&mut dst);
            fragment.insert(&mut cursor);
        }

        assert_eq!(dst.to_plain_text(), src.to_plain_text(), "text of {text:?}");
        assert_eq!(dst.block_count(), src.block_count(), "blocks of {text:?}");
        for position in 0..content {
            if src.char_at(position) == Some(PARAGRAPH_SEPARATOR) {
                continue;
            }
            assert_eq!(
                is_bold_at(&dst, position),
                is_bold_at(&src, position),
                "weight at {position} of {text:?}"
            );
        }
    }
}

#[test]
fn test_structured_document_copy_round_trip() {
    let documents = [
        "<p>head</p><ul><li>a</li><li>b</li></ul><table><tr><td>c</td><td>d</td></tr></table><p>tail</p>",
        "<table><tr><td><table><tr><td>x</td></tr></table></td><td>y</td></tr></table>z",
        r#"<table><tr><td rowspan="2">a</td><td>b</td></tr><tr><td>c</td></tr></table>after"#,
        "<ol><li>one</li><li>two</li></ol><table><tr><td>cell</td></tr></table><p>end</p>",
    ];
    for html in documents {
        let mut src = TextDocument::new();
        src.set_html(html);

        let fragment = DocumentFragment::from_document(&src);
        let mut dst = TextDocument::new();
        {
            let mut cursor = TextCursor::new(&mut dst);
            fragment.insert(&mut cursor);
        }

        assert_eq!(dst.to_raw_text(), src.to_raw_text(), "text of {html}");
        assert_eq!(dst.block_count(), src.block_count(), "blocks of {html}");
        assert_eq!(dst.frames().len(), src.frames().len(), "frames of {html}");
        assert_eq!(dst.lists().len(), src.lists().len(), "lists of {html}");
    }
}

#[test]
fn test_whitespace_runs_are_equivalent() {
    let spaced = DocumentFragment::from_html("a   b");
    let single = DocumentFragment::from_html("a b");
    assert_eq!(spaced.to_plain_text(), "a b");
    assert_eq!(single.to_plain_text(), "a b");

    let runs = |fragment: &DocumentFragment| fragment.document().unwrap().fragments().count();
    assert_eq!(runs(&spaced), runs(&single));
}

#[test]
fn test_paragraph_margins_collapse() {
    let mut doc = TextDocument::new();
    doc.set_html("<p>A</p><p>B</p>");
    assert_eq!(doc.block_count(), 2);
    assert_eq!(doc.collapsed_margin_before(1), Some(12.0));

    doc.set_html(r#"<p style="margin-bottom: 8px">A</p><p style="margin-top: 20px">B</p>"#);
    assert_eq!(doc.block(1).unwrap().format().top_margin(), 20.0);
    assert_eq!(doc.collapsed_margin_before(1), Some(20.0));
}

#[test]
fn test_list_is_reconstructed_once() {
    let fragment = DocumentFragment::from_html("<ul><li>x<li>y</ul>");
    let doc = fragment.document().unwrap();
    let lists = doc.lists();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].count(), 2);

    let first = doc.block(0).unwrap().format().object_index();
    let second = doc.block(1).unwrap().format().object_index();
    assert!(first.is_some());
    assert_eq!(first, second);

    // Pasting twice creates two independent lists.
    let mut dst = TextDocument::new();
    {
        let mut cursor = TextCursor::new(&mut dst);
        fragment.insert(&mut cursor);
        cursor.insert_block();
        fragment.insert(&mut cursor);
    }
    assert_eq!(dst.lists().len(), 2);
}

#[test]
fn test_cell_rectangle_clamps_spans() {
    let mut doc = TextDocument::new();
    let table = doc.insert_table(0, 3, 4, &Format::table(4)).unwrap();
    doc.merge_cells(table, 1, 1, 1, 3).unwrap();

    let (start, end) = {
        let view = doc.table(table).unwrap();
        (
            view.cell_at(1, 1).unwrap().first_position,
            view.cell_at(2, 2).unwrap().first_position,
        )
    };
    let selection = DocumentSelection::new(&doc, start, end);
    assert!(selection.has_complex_selection());

    let fragment = DocumentFragment::from_selection(selection);
    let copy = fragment.document().unwrap();
    let frames = copy.frames();
    assert_eq!(frames.len(), 1);
    let copied = frames[0].as_table().unwrap();
    assert_eq!(copied.rows(), 2);
    assert_eq!(copied.columns(), 2);
    assert_eq!(copied.cell_at(0, 0).unwrap().column_span, 2);
    assert_eq!(copied.cells().len(), 3);
}

#[test]
fn test_formats_are_interned_across_documents() {
    let mut src = TextDocument::from_plain_text("one two");
    let mut bold = Format::char();
    bold.set_font_weight(700);
    src.merge_char_format(0..3, &bold).unwrap();
    let fragment = DocumentFragment::from_document(&src);

    let mut dst = TextDocument::new();
    let mut cursor = TextCursor::new(&mut dst);
    fragment.insert(&mut cursor);
    let after_first = cursor.document().formats().len();
    fragment.insert(&mut cursor);
    assert_eq!(cursor.document().formats().len(), after_first);
    assert_eq!(dst.to_plain_text(), "one twoone two");
}

#[test]
fn test_named_anchor_marks_first_char_only() {
    let fragment = DocumentFragment::from_html(r#"<a name="top">title</a> rest"#);
    let doc = fragment.document().unwrap();
    let first = doc.formats().format(doc.fragment_at(0).unwrap().format);
    assert_eq!(first.anchor_names(), ["top".to_string()]);
    for position in 1..doc.len() - 1 {
        let format = doc.formats().format(doc.fragment_at(position).unwrap().format);
        assert!(format.anchor_names().is_empty(), "name repeated at {position}");
    }
}

#[test]
fn test_empty_selection_is_empty_fragment() {
    let mut doc = TextDocument::from_plain_text("untouched");
    let revision = doc.revision();
    let fragment = {
        let mut cursor = TextCursor::at(&mut doc, 3).unwrap();
        cursor.set_position(3, MoveMode::KeepAnchor).unwrap();
        DocumentFragment::from_cursor(&cursor)
    };
    assert!(fragment.is_empty());
    assert_eq!(fragment.to_plain_text(), "");
    assert_eq!(doc.revision(), revision);

    // Inserting an empty fragment is a no-op.
    let mut cursor = TextCursor::at(&mut doc, 3).unwrap();
    fragment.insert(&mut cursor);
    assert_eq!(doc.revision(), revision);
    assert_eq!(doc.to_plain_text(), "untouched");
}

#[test]
fn test_copy_leaves_source_unchanged() {
    let mut src = TextDocument::new();
    src.set_html("<p>head</p><ul><li>a</li><li>b</li></ul><table><tr><td>c</td></tr></table>");
    let revision = src.revision();
    let raw = src.to_raw_text();

    let fragment = DocumentFragment::from_document(&src);
    assert!(!fragment.is_empty());
    assert_eq!(src.revision(), revision);
    assert_eq!(src.to_raw_text(), raw);
}
