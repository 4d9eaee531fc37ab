//! Write-ahead log: append, sync, replay.
//!
//! Every mutation is appended here **before** the corresponding memtable
//! update. On reopen the log is fully replayed to reconstruct unflushed
//! state, and after a successful flush it is truncated so recovery only
//! ever sees data that is not yet in an SSTable.
//!
//! # On-disk layout
//!
//! The log is a headerless sequence of records:
//!
//! ```text
//! +--------+-----------+-------------+------+-------+----------+
//! | type   | key_len   | value_len   | key  | value | crc32    |
//! | 1 byte | 4 LE      | 4 LE        | ...  | ...   | 4 LE     |
//! +--------+-----------+-------------+------+-------+----------+
//! ```
//!
//! The checksum covers `type ‖ key ‖ value` (not the length fields).
//! Delete records carry an empty value. Record types: `Put = 1`,
//! `Delete = 2`, `Sync = 3` (a marker, skipped during replay),
//! `Eof = 4` (terminates replay).
//!
//! # Failure reporting
//!
//! Replay distinguishes a clean end of file (`Ok`) from a damaged tail:
//! a record cut short mid-way, a checksum mismatch, or an unrecognized
//! type byte are all reported as `Corruption` rather than silently
//! dropped. Genuine filesystem failures surface as `IOError`.
//!
//! # Concurrency
//!
//! The writer is single-owner; the engine serializes callers under its
//! own lock.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher as Crc32;
use tracing::{debug, trace};

use crate::coding;
use crate::status::{Result, Status};

/// Largest key or value length accepted when decoding a record (256 MiB).
/// A corrupted length field must not turn into an allocation bomb.
const MAX_PAYLOAD_LEN: u32 = 256 * 1024 * 1024;

// ------------------------------------------------------------------------------------------------
// Record types
// ------------------------------------------------------------------------------------------------

/// Type tag of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// Key/value insertion.
    Put = 1,
    /// Key deletion; the value field is empty.
    Delete = 2,
    /// Sync marker; carries no state and is skipped during replay.
    Sync = 3,
    /// End-of-log marker; terminates replay.
    Eof = 4,
}

impl RecordType {
    fn from_u8(byte: u8) -> Option<RecordType> {
        match byte {
            1 => Some(RecordType::Put),
            2 => Some(RecordType::Delete),
            3 => Some(RecordType::Sync),
            4 => Some(RecordType::Eof),
            _ => None,
        }
    }
}

/// A fully decoded log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    /// The record's type tag.
    pub record_type: RecordType,
    /// The key bytes.
    pub key: Vec<u8>,
    /// The value bytes; empty for deletes.
    pub value: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// Writer
// ------------------------------------------------------------------------------------------------

/// Append-only log writer.
///
/// Each record is serialized into a reusable scratch buffer and handed to
/// the file in a single `write_all`, so a record is never interleaved
/// with a partial sibling. Durability is explicit: [`WalWriter::sync`]
/// forces the record stream to stable storage.
#[derive(Debug)]
pub struct WalWriter {
    file: File,
    path: PathBuf,
    /// Reusable scratch buffer; an append costs one write call.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens the log at `path` in append mode, creating it when absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalWriter> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        trace!(path = %path.display(), "log opened for append");
        Ok(WalWriter {
            file,
            path,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes one record into `dst`.
    ///
    /// Exposed so a caller can stage several records and append them with
    /// a single [`WalWriter::append_encoded`] call, making a multi-record
    /// write all-or-nothing with respect to the in-memory state above.
    pub fn encode_record(
        dst: &mut Vec<u8>,
        record_type: RecordType,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        let key_len = u32::try_from(key.len())
            .map_err(|_| Status::invalid_argument("key length exceeds 32 bits"))?;
        let value_len = u32::try_from(value.len())
            .map_err(|_| Status::invalid_argument("value length exceeds 32 bits"))?;

        dst.push(record_type as u8);
        coding::encode_fixed32(dst, key_len);
        coding::encode_fixed32(dst, value_len);
        dst.extend_from_slice(key);
        dst.extend_from_slice(value);

        let mut hasher = Crc32::new();
        hasher.update(&[record_type as u8]);
        hasher.update(key);
        hasher.update(value);
        coding::encode_fixed32(dst, hasher.finalize());
        Ok(())
    }

    /// Appends one record to the log.
    pub fn add_record(&mut self, record_type: RecordType, key: &[u8], value: &[u8]) -> Result<()> {
        self.buf.clear();
        Self::encode_record(&mut self.buf, record_type, key, value)?;
        self.file.write_all(&self.buf)?;
        trace!(
            ?record_type,
            key_len = key.len(),
            value_len = value.len(),
            "log record appended"
        );
        Ok(())
    }

    /// Appends a pre-encoded run of records with a single write.
    pub fn append_encoded(&mut self, records: &[u8]) -> Result<()> {
        self.file.write_all(records)?;
        Ok(())
    }

    /// Forces all appended records to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Discards every record.
    ///
    /// Valid only once all logged state has been persisted elsewhere; the
    /// engine calls this after a flush registers its SSTable.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        debug!(path = %self.path.display(), "log truncated");
        Ok(())
    }

    /// Syncs and closes the log file.
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }
}

// ------------------------------------------------------------------------------------------------
// Reader
// ------------------------------------------------------------------------------------------------

/// Callback interface driven by [`WalReader::replay`].
///
/// A handler error aborts the replay and is returned to the caller.
pub trait ReplayHandler {
    /// A Put record was recovered.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// A Delete record was recovered.
    fn delete(&mut self, key: Vec<u8>) -> Result<()>;
}

/// Sequential log reader.
pub struct WalReader {
    reader: BufReader<File>,
}

impl WalReader {
    /// Opens an existing log for sequential reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader> {
        let file = File::open(path.as_ref())?;
        Ok(WalReader {
            reader: BufReader::new(file),
        })
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` on a clean end of file or an `Eof` record.
    /// A record cut short, an out-of-range length field, an unrecognized
    /// type byte, or a checksum mismatch are `Corruption`; other I/O
    /// failures are `IOError`.
    pub fn read_record(&mut self) -> Result<Option<WalRecord>> {
        let mut type_buf = [0u8; 1];
        match self.reader.read_exact(&mut type_buf) {
            Ok(()) => {}
            // No bytes at all: the previous record was the last one.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let record_type = RecordType::from_u8(type_buf[0]).ok_or_else(|| {
            Status::corruption(format!("unknown record type {}", type_buf[0]))
        })?;
        if record_type == RecordType::Eof {
            return Ok(None);
        }

        let mut word = [0u8; 4];
        self.read_exact_or(&mut word, "key length")?;
        let key_len = u32::from_le_bytes(word);
        self.read_exact_or(&mut word, "value length")?;
        let value_len = u32::from_le_bytes(word);

        if key_len > MAX_PAYLOAD_LEN || value_len > MAX_PAYLOAD_LEN {
            return Err(Status::corruption(format!(
                "record length out of range (key {key_len}, value {value_len})"
            )));
        }

        let mut key = vec![0u8; key_len as usize];
        self.read_exact_or(&mut key, "key")?;
        let mut value = vec![0u8; value_len as usize];
        self.read_exact_or(&mut value, "value")?;

        self.read_exact_or(&mut word, "checksum")?;
        let expected = u32::from_le_bytes(word);

        let mut hasher = Crc32::new();
        hasher.update(&[record_type as u8]);
        hasher.update(&key);
        hasher.update(&value);
        if hasher.finalize() != expected {
            return Err(Status::corruption("checksum mismatch in log record"));
        }

        Ok(Some(WalRecord {
            record_type,
            key,
            value,
        }))
    }

    /// Replays every record, dispatching Put and Delete to `handler`.
    ///
    /// Sync markers are skipped; an Eof record or a clean end of file
    /// terminates the replay. Damage anywhere in the log, including a
    /// trailing partial record, aborts with the decoding error.
    pub fn replay<H: ReplayHandler>(&mut self, handler: &mut H) -> Result<()> {
        let mut count: u64 = 0;
        while let Some(record) = self.read_record()? {
            match record.record_type {
                RecordType::Put => handler.put(record.key, record.value)?,
                RecordType::Delete => handler.delete(record.key)?,
                RecordType::Sync => {}
                // read_record maps Eof to None.
                RecordType::Eof => break,
            }
            count += 1;
        }
        debug!(records = count, "log replay complete");
        Ok(())
    }

    /// `read_exact` with truncation reported as `Corruption`: a record
    /// that starts but does not finish is damage, not a clean end.
    fn read_exact_or(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Status::corruption(format!("truncated record: missing {what}"))
            } else {
                Status::from(e)
            }
        })
    }
}
