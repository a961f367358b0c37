//! HTML round trips
//!
//! Exported HTML must read back into the same document: text, block structure,
//! lists, tables and character formats survive `to_html` followed by `set_html`,
//! both for whole documents and for clipboard fragments.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use textdoc_core::{
    Color, DocumentFragment, Format, ListStyle, Resource, ResourceProvider, TextCursor,
    TextDocument,
};

const ALPHABET: &[char] = &['a', 'b', 'z', '&', '<', '>', '"', '\'', 'é'];

fn random_lines(rng: &mut StdRng) -> String {
    let lines = rng.gen_range(1..6);
    let mut out = Vec::new();
    for _ in 0..lines {
        let words = rng.gen_range(0..4);
        let line: Vec<String> = (0..words)
            .map(|_| {
                let len = rng.gen_range(1..5);
                (0..len)
                    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                    .collect()
            })
            .collect();
        out.push(line.join(" "));
    }
    out.join("\n")
}

fn reimport(doc: &TextDocument) -> TextDocument {
    let mut copy = TextDocument::new();
    copy.set_html(&doc.to_html());
    copy
}

#[test]
fn test_random_plain_text_survives_export() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let text = random_lines(&mut rng);
        let doc = TextDocument::from_plain_text(&text);
        let copy = reimport(&doc);
        assert_eq!(copy.to_plain_text(), text, "html: {}", doc.to_html());
        assert_eq!(copy.block_count(), doc.block_count());
    }
}

#[test]
fn test_fragment_html_round_trip() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let text = random_lines(&mut rng);
        let fragment = DocumentFragment::from_document(&TextDocument::from_plain_text(&text));
        let html = fragment.to_html();
        let back = DocumentFragment::from_html(&html);
        assert_eq!(back.to_plain_text(), fragment.to_plain_text(), "html: {html}");
    }
}

#[test]
fn test_char_formats_survive_export() {
    let mut doc = TextDocument::from_plain_text("bold italic plain");
    let mut bold = Format::char();
    bold.set_font_weight(700);
    bold.set_foreground(Color::rgb(255, 0, 0));
    doc.merge_char_format(0..4, &bold).unwrap();
    let mut italic = Format::char();
    italic.set_font_italic(true);
    italic.set_font_underline(true);
    doc.merge_char_format(5..11, &italic).unwrap();

    let copy = reimport(&doc);
    assert_eq!(copy.to_plain_text(), "bold italic plain");
    let format_at =
        |position: usize| copy.formats().format(copy.fragment_at(position).unwrap().format);

    assert!(format_at(0).is_bold());
    assert_eq!(format_at(0).foreground(), Some(Color::rgb(255, 0, 0)));
    assert!(format_at(5).font_italic());
    assert!(format_at(5).font_underline());
    assert!(!format_at(5).is_bold());
    assert!(!format_at(12).is_bold());
    assert!(!format_at(12).font_italic());
}

#[test]
fn test_list_survives_export() {
    let mut doc = TextDocument::new();
    doc.set_html("<ol><li>one</li><li>two</li></ol><p>after</p>");
    let copy = reimport(&doc);

    assert_eq!(copy.to_plain_text(), "one\ntwo\nafter");
    let lists = copy.lists();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].count(), 2);
    assert_eq!(lists[0].format().list_style(), ListStyle::Decimal);
    assert!(copy.block(2).unwrap().list().is_none());
}

#[test]
fn test_table_survives_export() {
    let mut doc = TextDocument::new();
    let table = doc.insert_table(0, 2, 3, &Format::table(3)).unwrap();
    doc.merge_cells(table, 0, 0, 1, 2).unwrap();
    let first = doc.table(table).unwrap().cell_at(1, 2).unwrap().first_position;
    doc.insert_text(first, "x & y", &Format::char()).unwrap();

    let copy = reimport(&doc);
    assert_eq!(copy.to_plain_text(), doc.to_plain_text());

    let frames = copy.frames();
    assert_eq!(frames.len(), 1);
    let table = frames[0].as_table().unwrap();
    assert_eq!(table.rows(), 2);
    assert_eq!(table.columns(), 3);
    assert_eq!(table.cell_at(0, 0).unwrap().column_span, 2);
    assert_eq!(table.cells().len(), 5);

    // A second pass is stable.
    assert_eq!(reimport(&copy).to_raw_text(), copy.to_raw_text());
}

#[test]
fn test_title_survives_document_export_only() {
    let mut doc = TextDocument::from_plain_text("body");
    doc.set_title("Notes & more");
    assert_eq!(reimport(&doc).title(), "Notes & more");

    let fragment = DocumentFragment::from_document(&doc);
    let back = DocumentFragment::from_html(&fragment.to_html());
    assert_eq!(back.document().unwrap().title(), "");
}

#[test]
fn test_rich_text_header_keeps_whitespace() {
    let mut doc = TextDocument::new();
    doc.set_html(
        r#"<html><head><meta name="qrichtext" content="1" /></head><body><p>a  b</p></body></html>"#,
    );
    assert_eq!(doc.to_plain_text(), "a  b");

    doc.set_html("<html><body><p>a  b</p></body></html>");
    assert_eq!(doc.to_plain_text(), "a b");

    // Exported HTML carries the header, so repeated spaces survive.
    let spaced = TextDocument::from_plain_text("x   y");
    assert_eq!(reimport(&spaced).to_plain_text(), "x   y");
}

#[test]
fn test_clipboard_markers_limit_import() {
    let html = "<html><body>before<!--StartFragment--><b>inside</b><!--EndFragment-->after</body></html>";
    let fragment = DocumentFragment::from_html(html);
    assert_eq!(fragment.to_plain_text(), "inside");
    let doc = fragment.document().unwrap();
    assert!(doc.formats().format(doc.fragment_at(0).unwrap().format).is_bold());
}

#[test]
fn test_image_resources_travel_with_fragment() {
    struct Images;
    impl ResourceProvider for Images {
        fn resource(&self, name: &str) -> Option<Resource> {
            (name == "logo.png").then_some(Resource::Image {
                width: 16.0,
                height: 16.0,
            })
        }
    }

    let fragment = DocumentFragment::from_html_with_provider(
        r#"<p>see <img src="logo.png"></p>"#,
        Some(&Images),
    );
    assert_eq!(fragment.to_raw_text(), "see \u{FFFC}");

    let mut doc = TextDocument::new();
    {
        let mut cursor = TextCursor::new(&mut doc);
        fragment.insert(&mut cursor);
    }
    assert!(doc.resources().contains_key("logo.png"));
    let image = doc.formats().format(doc.fragment_at(4).unwrap().format);
    assert_eq!(image.image_name(), Some("logo.png"));
    assert!(doc.to_html().contains(r#"<img src="logo.png""#));
}
