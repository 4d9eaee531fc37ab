//! Ordered write batches.
//!
//! A [`WriteBatch`] buffers Put and Delete operations and hands them to
//! the engine for atomic application: after `Engine::write` returns `Ok`,
//! every operation is reflected in both the WAL and the memtable; after
//! an error, none of them touched the memtable.
//!
//! Operations are replayed in the exact order they were appended, so a
//! Put followed by a Delete of the same key nets out to a delete.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

use crate::status::Result;

/// One buffered mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Visitor interface invoked by [`WriteBatch::iterate`] in append order.
///
/// An error from either callback aborts the traversal and is returned to
/// the caller of `iterate`.
pub trait BatchHandler {
    /// A buffered Put operation.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// A buffered Delete operation.
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// Ordered buffer of Put and Delete operations.
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> WriteBatch {
        WriteBatch::default()
    }

    /// Buffer an insertion or overwrite of `key`.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push(BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    /// Buffer a deletion of `key`.
    pub fn delete(&mut self, key: &[u8]) {
        self.ops.push(BatchOp::Delete { key: key.to_vec() });
    }

    /// Discard every buffered operation.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Number of buffered operations.
    pub fn count(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` when no operations are buffered.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Traverse the buffered operations in append order, invoking the
    /// visitor's callbacks.
    pub fn iterate<H: BatchHandler>(&self, handler: &mut H) -> Result<()> {
        for op in &self.ops {
            match op {
                BatchOp::Put { key, value } => handler.put(key, value)?,
                BatchOp::Delete { key } => handler.delete(key)?,
            }
        }
        Ok(())
    }
}
