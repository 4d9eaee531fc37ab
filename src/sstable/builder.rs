//! Streams sorted entries into a complete table file.
//!
//! The builder keeps one data-block builder (restart interval 16) and one
//! index-block builder (restart interval 1, so index keys stay whole).
//! When the current data block reaches the 4 KiB target it is written out
//! behind a tag + CRC trailer and its last key is recorded in the index.
//!
//! # Atomicity
//!
//! Everything is written to `<path>.tmp`; [`TableBuilder::finish`]
//! flushes, fsyncs, and renames into place. A crash mid-build can never
//! leave a partially written table at the final path.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::coding;
use crate::status::{Result, Status};

use super::{
    BlockBuilder, BlockHandle, Footer, BLOCK_SIZE_TARGET, BLOCK_TRAILER_LEN, COMPRESSION_NONE,
    DATA_RESTART_INTERVAL, FOOTER_LEN, HANDLE_LEN, INDEX_RESTART_INTERVAL,
};

/// Writes one immutable table from a stream of ascending key/value pairs.
///
/// Consuming [`TableBuilder::finish`] seals the file; the type system
/// rules out adding entries to a finished table.
pub struct TableBuilder {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: BufWriter<File>,
    /// Bytes handed to the writer so far; the next block lands here.
    offset: u64,
    data_block: BlockBuilder,
    index_block: BlockBuilder,
    num_entries: u64,
}

impl TableBuilder {
    /// Creates the temporary file for a table at `path`, creating parent
    /// directories as needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<TableBuilder> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        trace!(path = %path.display(), "table builder started");
        Ok(TableBuilder {
            path,
            tmp_path,
            writer: BufWriter::new(file),
            offset: 0,
            data_block: BlockBuilder::new(DATA_RESTART_INTERVAL),
            index_block: BlockBuilder::new(INDEX_RESTART_INTERVAL),
            num_entries: 0,
        })
    }

    /// Appends an entry. Keys must arrive in strictly ascending order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.data_block.current_size_estimate() >= BLOCK_SIZE_TARGET
            && !self.data_block.is_empty()
        {
            self.flush_data_block()?;
        }
        self.data_block.add(key, value);
        self.num_entries += 1;
        Ok(())
    }

    /// Number of entries added so far.
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Writes the pending data block and records its index entry.
    fn flush_data_block(&mut self) -> Result<()> {
        if self.data_block.is_empty() {
            return Ok(());
        }
        let last_key = self.data_block.last_key().to_vec();
        let handle = Self::write_block(
            &mut self.writer,
            &mut self.offset,
            self.data_block.finish(),
        )?;

        let mut handle_enc = Vec::with_capacity(HANDLE_LEN);
        handle.encode_to(&mut handle_enc);
        self.index_block.add(&last_key, &handle_enc);

        self.data_block.reset();
        Ok(())
    }

    /// Writes `body ++ tag ++ crc32(body)`; the CRC covers the body only.
    fn write_block(
        writer: &mut BufWriter<File>,
        offset: &mut u64,
        body: &[u8],
    ) -> Result<BlockHandle> {
        let handle = BlockHandle::new(*offset, body.len() as u64);
        writer.write_all(body)?;
        writer.write_all(&[COMPRESSION_NONE])?;
        let mut crc = Vec::with_capacity(4);
        coding::encode_fixed32(&mut crc, coding::crc32(body));
        writer.write_all(&crc)?;
        *offset += body.len() as u64 + BLOCK_TRAILER_LEN as u64;
        Ok(handle)
    }

    /// Flushes pending data, writes the index block and footer, fsyncs,
    /// and atomically moves the table into place.
    pub fn finish(mut self) -> Result<()> {
        self.flush_data_block()?;

        let index_handle = Self::write_block(
            &mut self.writer,
            &mut self.offset,
            self.index_block.finish(),
        )?;

        let footer = Footer {
            index_handle,
            meta_handle: BlockHandle::default(),
        };
        let mut footer_enc = Vec::with_capacity(FOOTER_LEN);
        footer.encode_to(&mut footer_enc);
        self.writer.write_all(&footer_enc)?;

        self.writer.flush()?;
        let file = self
            .writer
            .into_inner()
            .map_err(|e| Status::io_error(format!("flush table file: {e}")))?;
        file.sync_all()?;
        fs::rename(&self.tmp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            entries = self.num_entries,
            bytes = self.offset + FOOTER_LEN as u64,
            "table written"
        );
        Ok(())
    }
}
