//! Public ordered cursor over the merged database state.

use crate::status::Result;

/// Ordered cursor over a point-in-time view of the whole database: live
/// memtable, sealed memtable, and every table, merged newest-first with
/// tombstones applied.
///
/// Created by [`Engine::new_iterator`](super::Engine::new_iterator). A
/// fresh cursor is not positioned; call one of the seek methods first.
///
/// Position rules match the memtable cursor:
///
/// - `next` past the final entry leaves the cursor invalid.
/// - `prev` at the first entry saturates there.
/// - `prev` from past-the-end re-enters at the final entry.
/// - `key`/`value` on an invalid cursor return empty slices.
/// - `seek("")` is undefined.
pub struct DbIterator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
}

impl DbIterator {
    pub(crate) fn new(entries: Vec<(Vec<u8>, Vec<u8>)>) -> DbIterator {
        let pos = entries.len();
        DbIterator { entries, pos }
    }

    /// Returns `true` iff the cursor is positioned at an entry.
    pub fn valid(&self) -> bool {
        self.pos < self.entries.len()
    }

    /// Position at the first entry; invalid when the database view is
    /// empty.
    pub fn seek_to_first(&mut self) {
        self.pos = 0;
    }

    /// Position at the last entry; invalid when the database view is
    /// empty.
    pub fn seek_to_last(&mut self) {
        self.pos = self.entries.len().saturating_sub(1);
    }

    /// Position at the first entry with key >= `target`, or invalid when
    /// no such entry exists.
    pub fn seek(&mut self, target: &[u8]) {
        self.pos = self
            .entries
            .partition_point(|(key, _)| key.as_slice() < target);
    }

    /// Advance to the next entry; invalid past the end.
    pub fn next(&mut self) {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
    }

    /// Step back one entry, saturating at the first.
    pub fn prev(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    /// Key at the cursor; empty when invalid.
    pub fn key(&self) -> &[u8] {
        if self.valid() {
            &self.entries[self.pos].0
        } else {
            &[]
        }
    }

    /// Value at the cursor; empty when invalid.
    pub fn value(&self) -> &[u8] {
        if self.valid() {
            &self.entries[self.pos].1
        } else {
            &[]
        }
    }

    /// Always `Ok`; errors are reported when the cursor is created.
    pub fn status(&self) -> Result<()> {
        Ok(())
    }
}
