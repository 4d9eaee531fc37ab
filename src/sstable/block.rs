//! One table block: prefix-compressed builder and seeking reader.
//!
//! # Block body layout
//!
//! ```text
//! [entry]*
//! [restart_offset: LE32]{restart_count}
//! [restart_count:  LE32]
//! ```
//!
//! Entry: `varint(shared_len) varint(non_shared_len) varint(value_len)
//! key_suffix(non_shared_len) value(value_len)`.
//!
//! Keys between restart points are delta-encoded against the previous
//! key. Every `restart_interval` entries a *restart point* is emitted
//! whose entry stores the full key (`shared_len == 0`), so a reader can
//! begin decoding at any restart offset without prior context. The first
//! entry is always a restart point.

use crate::coding;
use crate::status::{Result, Status};

// ------------------------------------------------------------------------------------------------
// Builder
// ------------------------------------------------------------------------------------------------

/// Accumulates ascending key/value pairs into a serialized block body.
///
/// The caller is responsible for feeding keys in strictly ascending
/// order; the builder delta-encodes against whatever arrived last.
pub struct BlockBuilder {
    buffer: Vec<u8>,
    restarts: Vec<u32>,
    restart_interval: usize,
    /// Entries since the last restart point.
    counter: usize,
    last_key: Vec<u8>,
    finished: bool,
}

impl BlockBuilder {
    /// Creates a builder emitting a restart point every
    /// `restart_interval` entries.
    pub fn new(restart_interval: usize) -> BlockBuilder {
        BlockBuilder {
            buffer: Vec::new(),
            restarts: vec![0],
            restart_interval,
            counter: 0,
            last_key: Vec::new(),
            finished: false,
        }
    }

    /// Appends an entry. Calls after [`BlockBuilder::finish`] are no-ops.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        if self.finished {
            return;
        }

        let shared = if self.counter >= self.restart_interval {
            // Restart entries carry the full key.
            self.restarts.push(self.buffer.len() as u32);
            self.counter = 0;
            0
        } else {
            shared_prefix_len(&self.last_key, key)
        };

        coding::encode_varint32(&mut self.buffer, shared as u32);
        coding::encode_varint32(&mut self.buffer, (key.len() - shared) as u32);
        coding::encode_varint32(&mut self.buffer, value.len() as u32);
        self.buffer.extend_from_slice(&key[shared..]);
        self.buffer.extend_from_slice(value);

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.counter += 1;
    }

    /// The most recently added key; empty before the first `add`.
    pub fn last_key(&self) -> &[u8] {
        &self.last_key
    }

    /// Returns `true` when no entry has been added since creation or the
    /// last [`BlockBuilder::reset`].
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Upper bound on the serialized length of the finished block.
    pub fn current_size_estimate(&self) -> usize {
        self.buffer.len() + self.restarts.len() * 4 + 4
    }

    /// Appends the restart array and count, returning the finished body.
    /// Idempotent; the builder stops accepting entries afterwards.
    pub fn finish(&mut self) -> &[u8] {
        if !self.finished {
            for i in 0..self.restarts.len() {
                let offset = self.restarts[i];
                coding::encode_fixed32(&mut self.buffer, offset);
            }
            coding::encode_fixed32(&mut self.buffer, self.restarts.len() as u32);
            self.finished = true;
        }
        &self.buffer
    }

    /// Clears all state for reuse.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.restarts.clear();
        self.restarts.push(0);
        self.last_key.clear();
        self.counter = 0;
        self.finished = false;
    }
}

fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    let limit = a.len().min(b.len());
    let mut i = 0;
    while i < limit && a[i] == b[i] {
        i += 1;
    }
    i
}

// ------------------------------------------------------------------------------------------------
// Reader
// ------------------------------------------------------------------------------------------------

/// Decodes a block body and positions a cursor within it.
///
/// The reader validates the restart trailer at construction and
/// bounds-checks every entry decode against the entry region, reporting
/// any overflow as `Corruption`.
///
/// Seek contract: after `seek(target)`, either the cursor is valid with
/// `key() >= target`, or it is invalid because no such key exists in the
/// block.
pub struct BlockReader {
    data: Vec<u8>,
    /// Length of the entry region; the restart trailer lives past it.
    data_size: usize,
    restarts: Vec<u32>,
    /// Next decode position within the entry region.
    offset: usize,
    key: Vec<u8>,
    /// Byte range of the current value within `data`.
    value: (usize, usize),
    valid: bool,
}

impl BlockReader {
    /// Parses the restart trailer of `data`.
    pub fn new(data: Vec<u8>) -> Result<BlockReader> {
        if data.len() < 4 {
            return Err(Status::corruption("block too small"));
        }
        let count_offset = data.len() - 4;
        let num_restarts = coding::decode_fixed32(&data[count_offset..])
            .ok_or_else(|| Status::corruption("block too small"))?
            as usize;
        if num_restarts == 0 {
            return Err(Status::corruption("block has no restart points"));
        }
        let restart_bytes = num_restarts
            .checked_mul(4)
            .ok_or_else(|| Status::corruption("restart count out of range"))?;
        if data.len() < 4 + restart_bytes {
            return Err(Status::corruption("restart count out of range"));
        }
        let data_size = data.len() - 4 - restart_bytes;

        let mut restarts = Vec::with_capacity(num_restarts);
        for i in 0..num_restarts {
            let offset = coding::decode_fixed32(&data[data_size + i * 4..])
                .ok_or_else(|| Status::corruption("restart array truncated"))?;
            if offset as usize > data_size {
                return Err(Status::corruption("restart offset out of range"));
            }
            restarts.push(offset);
        }

        Ok(BlockReader {
            data,
            data_size,
            restarts,
            offset: 0,
            key: Vec::new(),
            value: (0, 0),
            valid: false,
        })
    }

    /// Returns `true` iff the cursor is positioned at an entry.
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Key at the cursor; empty when invalid.
    pub fn key(&self) -> &[u8] {
        if self.valid {
            &self.key
        } else {
            &[]
        }
    }

    /// Value at the cursor; empty when invalid.
    pub fn value(&self) -> &[u8] {
        if self.valid {
            &self.data[self.value.0..self.value.1]
        } else {
            &[]
        }
    }

    /// Position at the first entry; invalid when the block holds none.
    pub fn seek_to_first(&mut self) -> Result<()> {
        self.offset = self.restarts[0] as usize;
        self.key.clear();
        self.decode_entry()
    }

    /// Position at the first entry with key >= `target`, or invalid when
    /// no such entry exists.
    pub fn seek(&mut self, target: &[u8]) -> Result<()> {
        if self.data_size == 0 {
            self.valid = false;
            return Ok(());
        }

        // Last restart point whose full key is <= target; runs are sorted
        // so the answer can only live in that restart's run or later.
        let mut left = 0usize;
        let mut right = self.restarts.len() - 1;
        while left < right {
            let mid = (left + right + 1) / 2;
            let mid_key = self.restart_key(mid)?;
            if mid_key.as_slice() <= target {
                left = mid;
            } else {
                right = mid - 1;
            }
        }

        self.offset = self.restarts[left] as usize;
        self.key.clear();
        self.decode_entry()?;
        while self.valid && self.key.as_slice() < target {
            self.decode_entry()?;
        }
        Ok(())
    }

    /// Advance to the next entry; invalid past the end of the block.
    pub fn next(&mut self) -> Result<()> {
        self.decode_entry()
    }

    /// Decode the full key stored at restart point `index`.
    fn restart_key(&self, index: usize) -> Result<Vec<u8>> {
        let mut offset = self.restarts[index] as usize;
        let region = &self.data[..self.data_size];

        let (shared, n) = coding::decode_varint32(&region[offset..])
            .ok_or_else(|| Status::corruption("bad restart entry header"))?;
        offset += n;
        if shared != 0 {
            return Err(Status::corruption("restart entry with shared prefix"));
        }
        let (non_shared, n) = coding::decode_varint32(&region[offset..])
            .ok_or_else(|| Status::corruption("bad restart entry header"))?;
        offset += n;
        let (_value_len, n) = coding::decode_varint32(&region[offset..])
            .ok_or_else(|| Status::corruption("bad restart entry header"))?;
        offset += n;

        let non_shared = non_shared as usize;
        if offset + non_shared > region.len() {
            return Err(Status::corruption("restart entry exceeds block bounds"));
        }
        Ok(region[offset..offset + non_shared].to_vec())
    }

    /// Decode the entry at `self.offset`, rebuilding the key from the
    /// shared prefix of the previously decoded key.
    fn decode_entry(&mut self) -> Result<()> {
        if self.offset >= self.data_size {
            self.valid = false;
            return Ok(());
        }

        let mut offset = self.offset;

        let (shared, n) = match coding::decode_varint32(&self.data[offset..self.data_size]) {
            Some(v) => v,
            None => {
                self.valid = false;
                return Err(Status::corruption("bad entry header"));
            }
        };
        offset += n;
        let (non_shared, n) = match coding::decode_varint32(&self.data[offset..self.data_size]) {
            Some(v) => v,
            None => {
                self.valid = false;
                return Err(Status::corruption("bad entry header"));
            }
        };
        offset += n;
        let (value_len, n) = match coding::decode_varint32(&self.data[offset..self.data_size]) {
            Some(v) => v,
            None => {
                self.valid = false;
                return Err(Status::corruption("bad entry header"));
            }
        };
        offset += n;

        let shared = shared as usize;
        let non_shared = non_shared as usize;
        let value_len = value_len as usize;

        if non_shared > self.data_size - offset || value_len > self.data_size - offset - non_shared
        {
            self.valid = false;
            return Err(Status::corruption("entry exceeds block bounds"));
        }
        if shared > self.key.len() {
            self.valid = false;
            return Err(Status::corruption("shared prefix exceeds previous key"));
        }

        self.key.truncate(shared);
        self.key
            .extend_from_slice(&self.data[offset..offset + non_shared]);
        offset += non_shared;
        self.value = (offset, offset + value_len);
        self.offset = offset + value_len;
        self.valid = true;
        Ok(())
    }
}
