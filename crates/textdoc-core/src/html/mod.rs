//! HTML interchange.
//!
//! - [`parser`] flattens markup into a [`NodeStream`](parser::NodeStream)
//!   with resolved formats ([`node`], [`css`])
//! - [`importer`] replays the node stream into a document through a cursor
//! - [`exporter`] writes a document back out in the same dialect

pub mod css;
pub mod exporter;
pub mod importer;
pub mod node;
pub mod parser;
