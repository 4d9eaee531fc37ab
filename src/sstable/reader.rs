//! Opens and verifies a table file; serves point lookups.
//!
//! The file is mapped read-only and never copied wholesale: a lookup
//! touches the parsed index (decoded once at open) plus a single data
//! block, which is CRC-verified as it is sliced out of the mapping.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, trace};

use crate::coding;
use crate::memtable::{is_tombstone, LookupResult};
use crate::status::{Result, Status};

use super::{
    BlockHandle, BlockReader, Footer, TableIterator, BLOCK_TRAILER_LEN, COMPRESSION_NONE,
    FOOTER_LEN, HANDLE_LEN,
};

/// One decoded index entry: the last key of a data block and the block's
/// location.
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    pub(crate) last_key: Vec<u8>,
    pub(crate) handle: BlockHandle,
}

/// Read handle on one immutable table file.
///
/// Multiple readers may open the same file concurrently; the file is
/// never written after [`super::TableBuilder::finish`].
#[derive(Debug)]
pub struct TableReader {
    path: PathBuf,
    mmap: Mmap,
    /// Index entries in block order, decoded and CRC-verified at open.
    index: Vec<IndexEntry>,
}

impl TableReader {
    /// Opens `path`, verifying the footer magic and the index block CRC.
    ///
    /// The mapping is read-only over an immutable file and every block
    /// access is bounds-checked against the mapping length, so the
    /// `unsafe` mmap cannot observe mutation or read out of bounds.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TableReader> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < FOOTER_LEN {
            return Err(Status::corruption("table file too small"));
        }
        let footer = Footer::decode_from(&mmap[mmap.len() - FOOTER_LEN..])?;

        let index_body = read_block(&mmap, &footer.index_handle)?;
        let mut index_reader = BlockReader::new(index_body)?;
        let mut index = Vec::new();
        index_reader.seek_to_first()?;
        while index_reader.valid() {
            if index_reader.value().len() != HANDLE_LEN {
                return Err(Status::corruption("bad handle length in index"));
            }
            let handle = BlockHandle::decode_from(index_reader.value())?;
            index.push(IndexEntry {
                last_key: index_reader.key().to_vec(),
                handle,
            });
            index_reader.next()?;
        }

        debug!(path = %path.display(), blocks = index.len(), "table opened");
        Ok(TableReader { path, mmap, index })
    }

    /// Path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point lookup.
    ///
    /// Index keys are the *last* key of each block, so the candidate
    /// block is the first whose index key is >= `key`; past-the-end falls
    /// back to the final block. A tombstone hit reports
    /// [`LookupResult::Tombstone`] so the caller can shadow older layers.
    pub fn get(&self, key: &[u8]) -> Result<LookupResult> {
        if self.index.is_empty() {
            return Ok(LookupResult::Miss);
        }
        let mut block_idx = self
            .index
            .partition_point(|entry| entry.last_key.as_slice() < key);
        if block_idx == self.index.len() {
            block_idx = self.index.len() - 1;
        }

        let mut block = self.block_at(block_idx)?;
        block.seek(key)?;
        if !block.valid() || block.key() != key {
            trace!(block = block_idx, "table lookup miss");
            return Ok(LookupResult::Miss);
        }
        if is_tombstone(block.value()) {
            return Ok(LookupResult::Tombstone);
        }
        Ok(LookupResult::Value(block.value().to_vec()))
    }

    /// Ordered scan over every entry in the file, tombstones included.
    pub fn iter(&self) -> TableIterator<'_> {
        TableIterator::new(self)
    }

    /// Number of data blocks in the table.
    pub(crate) fn num_blocks(&self) -> usize {
        self.index.len()
    }

    /// Reads, verifies, and parses data block `index`.
    pub(crate) fn block_at(&self, index: usize) -> Result<BlockReader> {
        let body = read_block(&self.mmap, &self.index[index].handle)?;
        BlockReader::new(body)
    }
}

/// Slices a block body out of the mapping, verifying bounds, the
/// compression tag, and the body CRC32.
fn read_block(mmap: &Mmap, handle: &BlockHandle) -> Result<Vec<u8>> {
    let start = usize::try_from(handle.offset)
        .map_err(|_| Status::corruption("block offset out of range"))?;
    let size =
        usize::try_from(handle.size).map_err(|_| Status::corruption("block size out of range"))?;
    let end = start
        .checked_add(size)
        .and_then(|e| e.checked_add(BLOCK_TRAILER_LEN))
        .ok_or_else(|| Status::corruption("block extends past end of file"))?;
    if end > mmap.len() {
        return Err(Status::corruption("block extends past end of file"));
    }

    let body = &mmap[start..start + size];
    let tag = mmap[start + size];
    if tag != COMPRESSION_NONE {
        return Err(Status::not_supported(format!("compression tag {tag}")));
    }
    let expected = coding::decode_fixed32(&mmap[start + size + 1..end])
        .ok_or_else(|| Status::corruption("block trailer truncated"))?;
    if coding::crc32(body) != expected {
        return Err(Status::corruption("block checksum mismatch"));
    }
    Ok(body.to_vec())
}
