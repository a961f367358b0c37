#![warn(missing_docs)]
//! Textdoc Core - Headless Rich-Text Document Engine
//!
//! # Overview
//!
//! `textdoc-core` models formatted text the way rich-text editors do: a piece
//! table of formatted fragments split into blocks, with lists, tables and
//! frames as shared objects referenced from interned formats. On top of that
//! model it implements the clipboard pipeline: copying a selection into a
//! standalone [`DocumentFragment`], building fragments from HTML, and pasting
//! fragments back through a [`TextCursor`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DocumentFragment                           │  ← Clipboard value
//! ├─────────────────────────────────────────────┤
//! │  CopyHelper          │  HtmlImporter/Export │  ← Replay
//! ├─────────────────────────────────────────────┤
//! │  TextCursor (editing, format application)   │  ← Mutation API
//! ├─────────────────────────────────────────────┤
//! │  Blocks / Lists / Frames / Tables views     │  ← Structure
//! ├─────────────────────────────────────────────┤
//! │  FormatCollection (interned formats)        │  ← Formats
//! ├─────────────────────────────────────────────┤
//! │  FragmentStore (rope + fragment runs)       │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use textdoc_core::{DocumentFragment, MoveMode, TextCursor, TextDocument};
//!
//! let mut source = TextDocument::new();
//! source.set_html("<p>Hello <b>rich</b> text</p><ul><li>one</li><li>two</li></ul>");
//!
//! // Copy "rich text" and the first list item.
//! let mut cursor = TextCursor::new(&mut source);
//! cursor.set_position(6, MoveMode::MoveAnchor).unwrap();
//! cursor.set_position(19, MoveMode::KeepAnchor).unwrap();
//! let fragment = DocumentFragment::from_cursor(&cursor);
//! assert_eq!(fragment.to_plain_text(), "rich text\none");
//!
//! let mut target = TextDocument::from_plain_text("> ");
//! let mut cursor = TextCursor::at(&mut target, 2).unwrap();
//! fragment.insert(&mut cursor);
//! assert_eq!(target.to_plain_text(), "> rich text\none");
//! ```
//!
//! # Module Description
//!
//! - [`storage`] - Rope-backed fragment store
//! - [`format`] / [`format_table`] - Property-bag formats and their interning
//! - [`document`] - The document model, edit blocks and change notifications
//! - [`structure`] - Read-only block, list, frame and table views
//! - [`cursor`] - Editing cursor and selections
//! - [`copy`] - Selection replay between documents
//! - [`html`] - HTML parsing, import and export
//! - [`fragment`] - The clipboard value type
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`debug` at operation boundaries,
//! `trace` per node and fragment, `warn` for recovered malformed input) and
//! never installs a subscriber.

mod block_index;
pub mod copy;
pub mod cursor;
pub mod document;
pub mod error;
pub mod format;
pub mod format_table;
pub mod fragment;
pub mod html;
pub mod storage;
pub mod structure;
mod text;

pub use copy::CopyHelper;
pub use cursor::{CellRange, DocumentSelection, MoveMode, MoveOperation, TextCursor};
pub use document::{
    DEFAULT_BLOCK_FORMAT, DEFAULT_CHAR_FORMAT, DocumentChange, Resource, ResourceProvider,
    TextDocument,
};
pub use error::{Result, TextDocumentError};
pub use format::{
    Alignment, BorderStyle, Color, Edge, Format, FormatKind, FramePosition, LayoutDirection,
    ListStyle, ObjectIndex, PageBreak, Property, TextLength, Value, VerticalAlignment,
};
pub use format_table::FormatCollection;
pub use fragment::DocumentFragment;
pub use html::exporter::{ExportMode, HtmlExporter};
pub use html::importer::{HtmlImportOptions, HtmlImporter, ImportMode};
pub use html::parser::NodeStream;
pub use storage::{Fragment, FragmentRun, FragmentStore};
pub use structure::{Block, Frame, TableCell, TextList, TextTable};
pub use text::{
    FRAME_BEGIN, FRAME_END, LINE_SEPARATOR, NBSP, OBJECT_REPLACEMENT, PARAGRAPH_SEPARATOR,
};
