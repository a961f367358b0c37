//! Block Start Index
//!
//! Prefix sums of block lengths, so a position maps to its block in
//! O(log N). Edits shift only the entries after the edited block, which keeps
//! appending at the end of a document cheap.

/// Start positions of every block, in order.
#[derive(Debug, Clone)]
pub(crate) struct BlockIndex {
    starts: Vec<usize>,
    total: usize,
}

impl BlockIndex {
    /// Index for a document holding one block of `len` characters.
    pub(crate) fn single(len: usize) -> Self {
        Self {
            starts: vec![0],
            total: len,
        }
    }

    /// Number of blocks.
    pub(crate) fn len(&self) -> usize {
        self.starts.len()
    }

    /// Start of block `number`; one past the end is the document length.
    pub(crate) fn start(&self, number: usize) -> usize {
        self.starts.get(number).copied().unwrap_or(self.total)
    }

    /// `(block number, block start)` of the block holding `position`.
    /// Positions past the end resolve to the last block.
    pub(crate) fn locate(&self, position: usize) -> (usize, usize) {
        let number = self
            .starts
            .partition_point(|&start| start <= position)
            .saturating_sub(1);
        (number, self.starts[number])
    }

    /// Block `number` grew by `added` characters.
    pub(crate) fn grow(&mut self, number: usize, added: usize) {
        for start in &mut self.starts[number + 1..] {
            *start += added;
        }
        self.total += added;
    }

    /// A separator was inserted into block `number`; the new block after it
    /// starts at `start`.
    pub(crate) fn split(&mut self, number: usize, start: usize) {
        self.grow(number, 1);
        self.starts.insert(number + 1, start);
    }

    /// `len` characters were removed from block `first` onwards, joining
    /// blocks `first..=last` into one.
    pub(crate) fn join(&mut self, first: usize, last: usize, len: usize) {
        self.starts.drain(first + 1..=last);
        for start in &mut self.starts[first + 1..] {
            *start -= len;
        }
        self.total -= len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_after_splits() {
        // "ab|cd|e|" as three blocks of lengths 3, 3, 2.
        let mut index = BlockIndex::single(1);
        index.grow(0, 2);
        index.split(0, 3);
        index.grow(1, 3);
        index.split(1, 6);
        assert_eq!(index.len(), 3);
        assert_eq!(index.locate(0), (0, 0));
        assert_eq!(index.locate(2), (0, 0));
        assert_eq!(index.locate(3), (1, 3));
        assert_eq!(index.locate(7), (2, 6));
        assert_eq!(index.locate(50), (2, 6));
        assert_eq!(index.start(3), 8);
    }

    #[test]
    fn test_join_shifts_following_blocks() {
        let mut index = BlockIndex::single(1);
        index.grow(0, 9);
        index.split(0, 3);
        index.split(1, 6);
        index.split(2, 9);
        // Remove positions 2..7, joining blocks 0..=2.
        index.join(0, 2, 5);
        assert_eq!(index.len(), 2);
        assert_eq!(index.start(1), 4);
        assert_eq!(index.locate(5), (1, 4));
        assert_eq!(index.start(2), 8);
    }
}
