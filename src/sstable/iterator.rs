//! Ordered scan over every entry of one table.
//!
//! Blocks are decoded lazily and sequentially; block ordering plus
//! in-block ordering makes the overall stream ascending. Decode errors
//! are yielded in place and end the scan.

use crate::status::{Result, Status};

use super::{BlockReader, TableReader};

/// Forward iterator over all entries of a table, in key order.
///
/// Yields owned `(key, value)` pairs; stored values are exposed verbatim,
/// tombstone encoding included, so a merging reader above can apply
/// shadowing.
pub struct TableIterator<'a> {
    table: &'a TableReader,
    /// Next block to load.
    next_block: usize,
    current: Option<BlockReader>,
    /// Error detected while advancing past an already-yielded entry.
    pending: Option<Status>,
}

impl<'a> TableIterator<'a> {
    pub(crate) fn new(table: &'a TableReader) -> TableIterator<'a> {
        TableIterator {
            table,
            next_block: 0,
            current: None,
            pending: None,
        }
    }

    /// Loads the next non-empty block, if any.
    fn load_block(&mut self) -> Result<bool> {
        while self.next_block < self.table.num_blocks() {
            let mut reader = self.table.block_at(self.next_block)?;
            self.next_block += 1;
            reader.seek_to_first()?;
            if reader.valid() {
                self.current = Some(reader);
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }
}

impl Iterator for TableIterator<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(mut block) = self.current.take() {
                if block.valid() {
                    let item = (block.key().to_vec(), block.value().to_vec());
                    match block.next() {
                        Ok(()) => self.current = Some(block),
                        Err(e) => {
                            // Surface the damage after the entry before it.
                            self.next_block = self.table.num_blocks();
                            self.pending = Some(e);
                        }
                    }
                    return Some(Ok(item));
                }
            }
            if let Some(e) = self.pending.take() {
                return Some(Err(e));
            }
            match self.load_block() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => {
                    self.next_block = self.table.num_blocks();
                    return Some(Err(e));
                }
            }
        }
    }
}
