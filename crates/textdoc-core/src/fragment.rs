//! Document fragments: the clipboard value type.
//!
//! A [`DocumentFragment`] owns a private [`TextDocument`] (with undo
//! bookkeeping disabled) built once from a selection, from HTML or from plain
//! text, and replayed into another document with
//! [`DocumentFragment::insert`]. Cloning a fragment shares the private
//! document.
//!
//! # Example
//!
//! ```rust
//! use textdoc_core::{DocumentFragment, TextCursor, TextDocument};
//!
//! let fragment = DocumentFragment::from_html("<p>Hello <b>World</b></p>");
//! let mut doc = TextDocument::new();
//! let mut cursor = TextCursor::new(&mut doc);
//! fragment.insert(&mut cursor);
//! assert_eq!(doc.to_plain_text(), "Hello World");
//! ```

use std::rc::Rc;

use tracing::debug;

use crate::copy::CopyHelper;
use crate::cursor::{DocumentSelection, TextCursor};
use crate::document::{ResourceProvider, TextDocument};
use crate::html::exporter::{ExportMode, HtmlExporter};
use crate::html::importer::{HtmlImporter, ImportMode};

#[derive(Debug)]
struct FragmentData {
    doc: TextDocument,
    imported_from_plain_text: bool,
}

impl FragmentData {
    fn new() -> Self {
        let mut doc = TextDocument::new();
        doc.set_undo_redo_enabled(false);
        Self {
            doc,
            imported_from_plain_text: false,
        }
    }
}

/// A piece of formatted text that can be inserted into any document.
#[derive(Debug, Clone, Default)]
pub struct DocumentFragment {
    data: Option<Rc<FragmentData>>,
}

impl DocumentFragment {
    /// An empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment holding `text` without formatting. When inserted, the text
    /// takes the char format of the destination cursor.
    pub fn from_plain_text(text: &str) -> Self {
        let mut data = FragmentData::new();
        {
            let mut cursor = TextCursor::new(&mut data.doc);
            cursor.insert_text(text);
        }
        data.imported_from_plain_text = true;
        Self {
            data: Some(Rc::new(data)),
        }
    }

    /// Fragment imported from HTML.
    pub fn from_html(html: &str) -> Self {
        Self::from_html_with_provider(html, None)
    }

    /// Fragment imported from HTML, resolving images through `provider`.
    pub fn from_html_with_provider(html: &str, provider: Option<&dyn ResourceProvider>) -> Self {
        let mut data = FragmentData::new();
        data.doc.edit_block(|doc| {
            HtmlImporter::new(doc, html, ImportMode::Fragment, provider).import();
        });
        debug!(len = data.doc.len(), "fragment from html");
        Self {
            data: Some(Rc::new(data)),
        }
    }

    /// Copy of the selection of `cursor`; empty if nothing is selected.
    pub fn from_cursor(cursor: &TextCursor<'_>) -> Self {
        Self::from_selection(cursor.selection())
    }

    /// Copy of `selection`; empty if nothing is selected.
    pub fn from_selection(selection: DocumentSelection<'_>) -> Self {
        if !selection.has_selection() {
            return Self::new();
        }
        let mut data = FragmentData::new();
        {
            let mut cursor = TextCursor::new(&mut data.doc);
            CopyHelper::new(selection, &mut cursor, false, &crate::format::Format::char()).copy();
        }
        data.doc.merge_cached_resources(selection.document());
        Self {
            data: Some(Rc::new(data)),
        }
    }

    /// Copy of a whole document.
    pub fn from_document(doc: &TextDocument) -> Self {
        Self::from_selection(DocumentSelection::whole_document(doc))
    }

    /// Returns `true` if the fragment holds no content.
    pub fn is_empty(&self) -> bool {
        self.data.as_ref().is_none_or(|data| data.doc.len() <= 1)
    }

    /// The private document, if any.
    pub fn document(&self) -> Option<&TextDocument> {
        self.data.as_ref().map(|data| &data.doc)
    }

    /// Replace the selection of `cursor` with the fragment's content and
    /// leave the cursor after it.
    pub fn insert(&self, cursor: &mut TextCursor<'_>) {
        let Some(data) = &self.data else {
            return;
        };
        if data.doc.len() <= 1 {
            return;
        }
        cursor.edit_block(|cursor| {
            cursor.remove_selected_text();
            let char_format = cursor.char_format();
            CopyHelper::new(
                DocumentSelection::whole_document(&data.doc),
                cursor,
                data.imported_from_plain_text,
                &char_format,
            )
            .copy();
            if !data.imported_from_plain_text {
                cursor.document_mut().merge_cached_resources(&data.doc);
            }
        });
    }

    /// Plain text (structural characters mapped to newlines).
    pub fn to_plain_text(&self) -> String {
        self.document()
            .map(TextDocument::to_plain_text)
            .unwrap_or_default()
    }

    /// Raw text (structural characters kept).
    pub fn to_raw_text(&self) -> String {
        self.document()
            .map(TextDocument::to_raw_text)
            .unwrap_or_default()
    }

    /// HTML wrapped in clipboard fragment markers.
    pub fn to_html(&self) -> String {
        match self.document() {
            Some(doc) => HtmlExporter::new(doc).to_html(ExportMode::Fragment),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MoveMode;
    use crate::format::Format;

    #[test]
    fn test_default_is_empty() {
        let fragment = DocumentFragment::new();
        assert!(fragment.is_empty());
        assert_eq!(fragment.to_plain_text(), "");
        assert_eq!(fragment.to_html(), "");
    }

    #[test]
    fn test_plain_text_fragment() {
        let fragment = DocumentFragment::from_plain_text("a\nb");
        assert!(!fragment.is_empty());
        assert_eq!(fragment.to_plain_text(), "a\nb");
        assert_eq!(fragment.to_raw_text(), "a\u{2029}b");
        assert_eq!(fragment.document().unwrap().available_undo_steps(), 0);
    }

    #[test]
    fn test_clone_shares_document() {
        let fragment = DocumentFragment::from_plain_text("shared");
        let copy = fragment.clone();
        let a = fragment.document().unwrap() as *const TextDocument;
        let b = copy.document().unwrap() as *const TextDocument;
        assert_eq!(a, b);
    }

    #[test]
    fn test_selection_fragment_does_not_touch_source() {
        let mut src = TextDocument::from_plain_text("hello world");
        let revision = src.revision();
        let fragment = {
            let mut cursor = TextCursor::new(&mut src);
            cursor.set_position(6, MoveMode::KeepAnchor).unwrap();
            DocumentFragment::from_cursor(&cursor)
        };
        assert_eq!(fragment.to_plain_text(), "hello ");
        assert_eq!(src.revision(), revision);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let fragment = DocumentFragment::from_plain_text("XY");
        let mut doc = TextDocument::from_plain_text("abcd");
        let mut cursor = TextCursor::at(&mut doc, 1).unwrap();
        cursor.set_position(3, MoveMode::KeepAnchor).unwrap();
        fragment.insert(&mut cursor);
        assert_eq!(cursor.position(), 3);
        assert_eq!(doc.to_plain_text(), "aXYd");
    }

    #[test]
    fn test_plain_text_takes_cursor_format() {
        let fragment = DocumentFragment::from_plain_text("xy");
        let mut doc = TextDocument::new();
        let mut bold = Format::char();
        bold.set_font_weight(700);
        doc.insert_text(0, "B", &bold).unwrap();
        let mut cursor = TextCursor::at(&mut doc, 1).unwrap();
        fragment.insert(&mut cursor);
        for run in doc.fragments().filter(|r| r.end() < doc.len()) {
            assert!(doc.formats().format(run.format).is_bold());
        }
        assert_eq!(doc.to_plain_text(), "Bxy");
    }
}
