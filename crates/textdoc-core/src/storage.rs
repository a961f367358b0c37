//! Fragment storage.
//!
//! A piece table over an append-only [`Rope`] buffer. Each piece is a
//! [`Fragment`]: a run of characters sharing one char format index. Inserted
//! text is appended to the buffer and spliced into the fragment list; removed
//! text only drops fragments, and [`FragmentStore::gc`] compacts the buffer
//! once enough operations have accumulated.
//!
//! Block separators are always kept in fragments of their own, so a fragment
//! of length one holding a separator marks a structural boundary.

use std::ops::Range;

use ropey::Rope;

use crate::text::is_block_separator;

/// A run of characters in the buffer sharing one char format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    /// Start in the buffer (char offset).
    pub buffer_start: usize,
    /// Length in characters.
    pub len: usize,
    /// Char format index.
    pub format: usize,
}

/// A fragment located in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRun {
    /// Document position of the first character.
    pub position: usize,
    /// Length in characters.
    pub len: usize,
    /// Char format index.
    pub format: usize,
}

impl FragmentRun {
    /// Position one past the last character.
    pub fn end(&self) -> usize {
        self.position + self.len
    }
}

/// Ordered formatted runs over an append-only buffer.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    buffer: Rope,
    fragments: Vec<Fragment>,
    operation_count: usize,
    gc_threshold: usize,
}

impl Default for FragmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            buffer: Rope::new(),
            fragments: Vec::new(),
            operation_count: 0,
            gc_threshold: 1000,
        }
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(|f| f.len).sum()
    }

    /// Returns `true` if no characters are stored.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Size of the backing buffer in characters (live and dead text).
    pub fn buffer_len(&self) -> usize {
        self.buffer.len_chars()
    }

    /// Insert `text` at `position` with char format `format`.
    pub fn insert(&mut self, position: usize, text: &str, format: usize) {
        if text.is_empty() {
            return;
        }
        let buffer_start = self.buffer.len_chars();
        self.buffer.insert(buffer_start, text);
        let fragment = Fragment {
            buffer_start,
            len: self.buffer.len_chars() - buffer_start,
            format,
        };

        let index = self.split_at(position);
        self.fragments.insert(index, fragment);

        self.try_merge_adjacent_fragments();
        self.check_gc();
    }

    /// Remove `len` characters starting at `position`.
    pub fn remove(&mut self, position: usize, len: usize) {
        if len == 0 {
            return;
        }
        let first = self.split_at(position);
        let last = self.split_at(position + len);
        self.fragments.drain(first..last);

        self.try_merge_adjacent_fragments();
        self.check_gc();
    }

    /// Set the char format of every character in `range`.
    pub fn set_format(&mut self, range: Range<usize>, format: usize) {
        if range.is_empty() {
            return;
        }
        let first = self.split_at(range.start);
        let last = self.split_at(range.end);
        for fragment in &mut self.fragments[first..last] {
            fragment.format = format;
        }
        self.try_merge_adjacent_fragments();
    }

    /// Rewrite the char format of every character in `range` through `map`.
    pub fn map_formats(&mut self, range: Range<usize>, mut map: impl FnMut(usize) -> usize) {
        if range.is_empty() {
            return;
        }
        let first = self.split_at(range.start);
        let last = self.split_at(range.end);
        for fragment in &mut self.fragments[first..last] {
            fragment.format = map(fragment.format);
        }
        self.try_merge_adjacent_fragments();
    }

    /// Text in `range`.
    pub fn text(&self, range: Range<usize>) -> String {
        let mut result = String::new();
        let mut offset = 0;
        for fragment in &self.fragments {
            let end = offset + fragment.len;
            if offset >= range.end {
                break;
            }
            if end > range.start {
                let from = range.start.max(offset) - offset;
                let to = range.end.min(end) - offset;
                let slice = self
                    .buffer
                    .slice(fragment.buffer_start + from..fragment.buffer_start + to);
                for chunk in slice.chunks() {
                    result.push_str(chunk);
                }
            }
            offset = end;
        }
        result
    }

    /// Character at `position`.
    pub fn char_at(&self, position: usize) -> Option<char> {
        let (index, offset) = self.find_fragment_at_offset(position)?;
        let fragment = &self.fragments[index];
        Some(self.buffer.char(fragment.buffer_start + offset))
    }

    /// Char format index of the character at `position`.
    pub fn format_at(&self, position: usize) -> Option<usize> {
        self.find_fragment_at_offset(position)
            .map(|(index, _)| self.fragments[index].format)
    }

    /// The run containing the character at `position`.
    pub fn run_at(&self, position: usize) -> Option<FragmentRun> {
        let (index, offset) = self.find_fragment_at_offset(position)?;
        let fragment = &self.fragments[index];
        Some(FragmentRun {
            position: position - offset,
            len: fragment.len,
            format: fragment.format,
        })
    }

    /// All runs in document order.
    pub fn runs(&self) -> impl Iterator<Item = FragmentRun> + '_ {
        let mut position = 0;
        self.fragments.iter().map(move |fragment| {
            let run = FragmentRun {
                position,
                len: fragment.len,
                format: fragment.format,
            };
            position += fragment.len;
            run
        })
    }

    /// Positions and characters of every block separator, in order.
    pub fn separators(&self) -> Vec<(usize, char, usize)> {
        let mut result = Vec::new();
        let mut position = 0;
        for fragment in &self.fragments {
            if fragment.len == 1 {
                let c = self.buffer.char(fragment.buffer_start);
                if is_block_separator(c) {
                    result.push((position, c, fragment.format));
                }
            }
            position += fragment.len;
        }
        result
    }

    /// Locate the fragment holding the character at `offset`.
    /// Returns `(fragment_index, offset_in_fragment)`.
    fn find_fragment_at_offset(&self, offset: usize) -> Option<(usize, usize)> {
        let mut current = 0;
        for (index, fragment) in self.fragments.iter().enumerate() {
            let next = current + fragment.len;
            if offset < next {
                return Some((index, offset - current));
            }
            current = next;
        }
        None
    }

    /// Make sure a fragment boundary exists at `position` and return the index
    /// of the first fragment starting there (or the fragment count at the end).
    fn split_at(&mut self, position: usize) -> usize {
        let Some((index, offset)) = self.find_fragment_at_offset(position) else {
            return self.fragments.len();
        };
        if offset == 0 {
            return index;
        }
        let fragment = self.fragments[index];
        let left = Fragment {
            len: offset,
            ..fragment
        };
        let right = Fragment {
            buffer_start: fragment.buffer_start + offset,
            len: fragment.len - offset,
            format: fragment.format,
        };
        self.fragments.splice(index..=index, [left, right]);
        index + 1
    }

    fn is_separator_fragment(&self, fragment: &Fragment) -> bool {
        fragment.len == 1 && is_block_separator(self.buffer.char(fragment.buffer_start))
    }

    /// Two fragments merge when they share a format, follow each other in the
    /// buffer and neither is a separator.
    fn can_merge(&self, left: &Fragment, right: &Fragment) -> bool {
        left.format == right.format
            && left.buffer_start + left.len == right.buffer_start
            && !self.is_separator_fragment(left)
            && !self.is_separator_fragment(right)
    }

    fn try_merge_adjacent_fragments(&mut self) {
        let mut i = 0;
        while i + 1 < self.fragments.len() {
            if self.can_merge(&self.fragments[i], &self.fragments[i + 1]) {
                self.fragments[i].len += self.fragments[i + 1].len;
                self.fragments.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    /// Compact the buffer so it holds only live text, in document order.
    pub fn gc(&mut self) {
        let mut compacted = Rope::new();
        for fragment in &mut self.fragments {
            let start = compacted.len_chars();
            let slice = self
                .buffer
                .slice(fragment.buffer_start..fragment.buffer_start + fragment.len);
            for chunk in slice.chunks() {
                compacted.insert(compacted.len_chars(), chunk);
            }
            fragment.buffer_start = start;
        }
        self.buffer = compacted;
        self.operation_count = 0;
        self.try_merge_adjacent_fragments();
    }

    fn check_gc(&mut self) {
        self.operation_count += 1;
        if self.operation_count >= self.gc_threshold {
            self.gc();
        }
    }

    /// Set the number of operations between automatic compactions.
    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.gc_threshold = threshold.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(text: &str) -> FragmentStore {
        let mut store = FragmentStore::new();
        store.insert(0, text, 0);
        store
    }

    #[test]
    fn test_insert_positions() {
        let mut s = store("World");
        s.insert(0, "Hello, ", 0);
        s.insert(12, "!", 0);
        s.insert(5, "X", 0);
        assert_eq!(s.text(0..s.len()), "HelloX, World!");
        assert_eq!(s.len(), 14);
    }

    #[test]
    fn test_remove_across_fragments() {
        let mut s = store("Hello");
        s.insert(5, " World", 1);
        s.remove(3, 4);
        assert_eq!(s.text(0..s.len()), "Helorld");
        assert_eq!(s.fragment_count(), 2);
    }

    #[test]
    fn test_formats_split_runs() {
        let mut s = store("abcdef");
        s.set_format(2..4, 7);
        let runs: Vec<_> = s.runs().map(|r| (r.position, r.len, r.format)).collect();
        assert_eq!(runs, vec![(0, 2, 0), (2, 2, 7), (4, 2, 0)]);
        assert_eq!(s.format_at(3), Some(7));
        assert_eq!(s.run_at(3).map(|r| r.position), Some(2));
    }

    #[test]
    fn test_adjacent_appends_merge() {
        let mut s = store("ab");
        s.insert(2, "cd", 0);
        s.insert(4, "ef", 0);
        assert_eq!(s.fragment_count(), 1);
    }

    #[test]
    fn test_separators_never_merge() {
        let mut s = FragmentStore::new();
        s.insert(0, "a", 0);
        s.insert(1, "\u{2029}", 0);
        s.insert(2, "b", 0);
        assert_eq!(s.fragment_count(), 3);
        assert_eq!(s.separators(), vec![(1, '\u{2029}', 0)]);
    }

    #[test]
    fn test_utf8() {
        let mut s = store("你好");
        s.insert(1, "们", 0);
        assert_eq!(s.text(0..3), "你们好");
        assert_eq!(s.char_at(2), Some('好'));
        assert_eq!(s.char_at(3), None);
    }

    #[test]
    fn test_gc_compacts_buffer() {
        let mut s = store("Hello");
        s.insert(5, " World", 0);
        s.insert(11, "!", 0);
        s.remove(5, 6);
        let before = s.buffer_len();
        s.gc();
        assert_eq!(s.text(0..s.len()), "Hello!");
        assert!(s.buffer_len() < before);
    }

    #[test]
    fn test_auto_gc_trigger() {
        let mut s = store("Test");
        s.set_gc_threshold(5);
        for i in 0..6 {
            s.insert(4 + i, "x", 0);
        }
        assert!(s.operation_count < 6);
        assert_eq!(s.text(0..s.len()), "Testxxxxxx");
    }
}
