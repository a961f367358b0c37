//! Format interning.
//!
//! Every document owns one [`FormatCollection`]. Formats are stored once and
//! referred to by a small integer index; shared objects (lists, tables,
//! frames) are registered with [`FormatCollection::create_object_index`] and
//! identified by an [`ObjectIndex`] that points at the object's own format.

use std::collections::HashMap;

use crate::format::{Format, FormatKind, ObjectIndex};

/// Interning table for one document.
#[derive(Debug, Clone)]
pub struct FormatCollection {
    formats: Vec<Format>,
    lookup: HashMap<(Format, Option<ObjectIndex>), usize>,
    objects: Vec<usize>,
}

impl Default for FormatCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatCollection {
    /// Create a collection holding the default char (index 0) and block (index 1) formats.
    pub fn new() -> Self {
        let mut collection = Self {
            formats: Vec::new(),
            lookup: HashMap::new(),
            objects: Vec::new(),
        };
        collection.intern(&Format::char());
        collection.intern(&Format::block());
        collection
    }

    /// Index of `format`, adding it if it is not present yet.
    ///
    /// Two formats share an index when kind, properties and object index all
    /// agree.
    pub fn intern(&mut self, format: &Format) -> usize {
        let key = (format.clone(), format.object_index());
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.formats.len();
        self.formats.push(format.clone());
        self.lookup.insert(key, index);
        index
    }

    /// Index of `format` if it was interned before.
    pub fn lookup(&self, format: &Format) -> Option<usize> {
        self.lookup
            .get(&(format.clone(), format.object_index()))
            .copied()
    }

    /// Format at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not handed out by this collection.
    pub fn format(&self, index: usize) -> &Format {
        &self.formats[index]
    }

    /// Format at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&Format> {
        self.formats.get(index)
    }

    /// Number of distinct formats.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Always `false`: the default formats are present from construction.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Register a new shared object defined by `format` and return its index.
    pub fn create_object_index(&mut self, format: &Format) -> ObjectIndex {
        let definition = format.clone().with_object_index(None);
        let format_index = self.intern(&definition);
        self.objects.push(format_index);
        ObjectIndex(self.objects.len() - 1)
    }

    /// Definition format of an object.
    pub fn object_format(&self, object: ObjectIndex) -> Option<&Format> {
        self.objects.get(object.0).map(|&index| &self.formats[index])
    }

    /// Kind of an object (list, table or frame).
    pub fn object_kind(&self, object: ObjectIndex) -> Option<FormatKind> {
        self.object_format(object).map(Format::kind)
    }

    /// Replace the definition of an existing object.
    pub fn set_object_format(&mut self, object: ObjectIndex, format: &Format) {
        let definition = format.clone().with_object_index(None);
        let index = self.intern(&definition);
        if let Some(slot) = self.objects.get_mut(object.0) {
            *slot = index;
        }
    }

    /// Number of registered objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Color, ListStyle};

    #[test]
    fn test_defaults_are_preinterned() {
        let collection = FormatCollection::new();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.format(0).kind(), FormatKind::Char);
        assert_eq!(collection.format(1).kind(), FormatKind::Block);
        assert_eq!(collection.lookup(&Format::char()), Some(0));
    }

    #[test]
    fn test_intern_deduplicates() {
        let mut collection = FormatCollection::new();
        let mut bold_red = Format::char();
        bold_red.set_font_weight(700);
        bold_red.set_foreground(Color::rgb(255, 0, 0));

        let a = collection.intern(&bold_red);
        let b = collection.intern(&bold_red.clone());
        assert_eq!(a, b);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_object_index_separates_entries() {
        let mut collection = FormatCollection::new();
        let first = collection.create_object_index(&Format::table(2));
        let second = collection.create_object_index(&Format::table(2));
        assert_ne!(first, second);

        let cell_a = collection.intern(&Format::char().with_object_index(Some(first)));
        let cell_b = collection.intern(&Format::char().with_object_index(Some(second)));
        assert_ne!(cell_a, cell_b);
        assert_eq!(collection.format(cell_a), collection.format(cell_b));
    }

    #[test]
    fn test_object_format_and_kind() {
        let mut collection = FormatCollection::new();
        let list = collection.create_object_index(&Format::list(ListStyle::Decimal));
        assert_eq!(collection.object_kind(list), Some(FormatKind::List));
        assert_eq!(
            collection.object_format(list).map(Format::list_style),
            Some(ListStyle::Decimal)
        );
        assert!(collection.object_format(ObjectIndex(9)).is_none());

        collection.set_object_format(list, &Format::list(ListStyle::Square));
        assert_eq!(
            collection.object_format(list).map(Format::list_style),
            Some(ListStyle::Square)
        );
    }
}
