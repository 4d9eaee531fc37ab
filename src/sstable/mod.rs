//! Immutable sorted tables: the on-disk format and its access paths.
//!
//! An SSTable is a sequence of prefix-compressed data blocks, followed by
//! an index block mapping each data block's last key to its location,
//! followed by a fixed-size footer anchoring the index.
//!
//! # File layout
//!
//! ```text
//! | data block 1 body | tag(1) | crc32(4) |
//! | data block 2 body | tag(1) | crc32(4) |
//! ...
//! | index block body  | tag(1) | crc32(4) |
//! | footer (48 bytes):                    |
//! |   index handle (16: off LE64, sz LE64)|
//! |   meta  handle (16, zeros)            |
//! |   padding (8, zeros)                  |
//! |   magic  (8 LE = 0xdb4775248b80fb57)  |
//! ```
//!
//! Each block body is trailed by a one-byte compression tag (`0` means
//! uncompressed; every other value is reserved and rejected on read) and
//! a CRC32 of the body bytes. The tag is not covered by the checksum.
//!
//! # Ordering invariants
//!
//! - Entries within a data block are in ascending key order.
//! - Blocks are globally ordered: the last key of block *i* is strictly
//!   less than the first key of block *i + 1*.
//! - The index block holds one entry per data block whose key is that
//!   block's last key and whose value is the 16-byte block handle.
//!
//! # Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`block`] | One block: prefix-compressed builder and seeking reader |
//! | [`builder`] | Streams sorted entries into a complete table file |
//! | [`reader`] | Opens and verifies a table; point lookups |
//! | [`iterator`] | Ordered scan over every entry of a table |

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

pub mod block;
pub mod builder;
pub mod iterator;
pub mod reader;

pub use block::{BlockBuilder, BlockReader};
pub use builder::TableBuilder;
pub use iterator::TableIterator;
pub use reader::TableReader;

use crate::coding;
use crate::status::{Result, Status};

/// Target serialized size of a data-block body (4 KiB).
pub const BLOCK_SIZE_TARGET: usize = 4 * 1024;

/// Restart interval for data blocks.
pub const DATA_RESTART_INTERVAL: usize = 16;

/// Restart interval for the index block: every entry restarts, so index
/// keys are never prefix-compressed.
pub const INDEX_RESTART_INTERVAL: usize = 1;

/// Compression tag for an uncompressed block body. All other tag values
/// are reserved and rejected as `NotSupported` on read.
pub const COMPRESSION_NONE: u8 = 0;

/// Bytes trailing every block body: the compression tag and the body CRC.
pub const BLOCK_TRAILER_LEN: usize = 1 + 4;

/// Serialized length of a [`BlockHandle`].
pub const HANDLE_LEN: usize = 16;

/// Serialized length of the [`Footer`].
pub const FOOTER_LEN: usize = 48;

/// Magic number closing every table file.
pub const TABLE_MAGIC: u64 = 0xdb47_7524_8b80_fb57;

// ------------------------------------------------------------------------------------------------
// Block handle
// ------------------------------------------------------------------------------------------------

/// File offset and byte length of a block body. The trailing tag and CRC
/// are not included in `size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockHandle {
    /// Byte offset of the block body within the file.
    pub offset: u64,
    /// Length of the block body in bytes.
    pub size: u64,
}

impl BlockHandle {
    /// Creates a handle from an offset/size pair.
    pub fn new(offset: u64, size: u64) -> BlockHandle {
        BlockHandle { offset, size }
    }

    /// Appends the 16-byte encoding: offset then size, both LE64.
    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        coding::encode_fixed64(dst, self.offset);
        coding::encode_fixed64(dst, self.size);
    }

    /// Decodes a handle from the first 16 bytes of `src`.
    pub fn decode_from(src: &[u8]) -> Result<BlockHandle> {
        let offset = coding::decode_fixed64(src)
            .ok_or_else(|| Status::corruption("block handle too short"))?;
        let size = src
            .get(8..)
            .and_then(coding::decode_fixed64)
            .ok_or_else(|| Status::corruption("block handle too short"))?;
        Ok(BlockHandle { offset, size })
    }
}

// ------------------------------------------------------------------------------------------------
// Footer
// ------------------------------------------------------------------------------------------------

/// Fixed-size trailer anchoring the index block.
///
/// The meta handle is reserved (always zero) and the 8 padding bytes keep
/// the footer at 48 bytes with the magic number in the final 8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Footer {
    /// Location of the index block body.
    pub index_handle: BlockHandle,
    /// Reserved; written as zeros.
    pub meta_handle: BlockHandle,
}

impl Footer {
    /// Appends the 48-byte encoding.
    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        self.index_handle.encode_to(dst);
        self.meta_handle.encode_to(dst);
        dst.extend_from_slice(&[0u8; 8]);
        coding::encode_fixed64(dst, TABLE_MAGIC);
    }

    /// Decodes and validates a footer from the first 48 bytes of `src`.
    pub fn decode_from(src: &[u8]) -> Result<Footer> {
        if src.len() < FOOTER_LEN {
            return Err(Status::corruption("footer too short"));
        }
        let magic = coding::decode_fixed64(&src[40..])
            .ok_or_else(|| Status::corruption("footer too short"))?;
        if magic != TABLE_MAGIC {
            return Err(Status::corruption("bad table magic number"));
        }
        let index_handle = BlockHandle::decode_from(src)?;
        let meta_handle = BlockHandle::decode_from(&src[16..])?;
        Ok(Footer {
            index_handle,
            meta_handle,
        })
    }
}
