//! Core storage engine: open/recover, write path, read path, flush.
//!
//! ## Design Overview
//!
//! The engine organizes data across three layers, queried newest-first:
//!
//! 1. **Live memtable**: the in-memory sorted write buffer.
//! 2. **Sealed memtable**: a read-only former live table awaiting flush.
//!    At most one exists at a time.
//! 3. **Tables**: immutable sorted files under `<dir>/0/`, searched from
//!    newest to oldest.
//!
//! Every mutation is appended to the write-ahead log at `<dir>/LOG`
//! before the live memtable changes. When the live table's approximate
//! size reaches [`Options::write_buffer_size`] it is sealed, a fresh live
//! table is installed, and the sealed table is flushed inline into
//! `<dir>/0/<n>.sst`. Once the new table is registered the log is
//! truncated, so recovery replays only unflushed data.
//!
//! ## Recovery
//!
//! [`Engine::open`] replays a non-empty log into the live memtable and
//! then registers every existing `<dir>/0/*.sst` in creation order
//! (ascending file number). Replay damage fails the open: a log that
//! cannot be trusted is not silently truncated.
//!
//! ## Concurrency Model
//!
//! All engine state lives behind one coarse mutex. Mutating operations
//! hold it for their full duration, including inline flush I/O; reads
//! take it to consult the layered state. The result is a single-writer,
//! serialized engine: simple, and exactly as strong as the guarantees
//! the write path needs.
//!
//! ## Shadowing
//!
//! Tombstones are first-class entries: a delete in a newer layer hides
//! any older value of the key, whether that value lives in the sealed
//! table or in an older file. Lookups stop at the newest layer that has
//! an opinion about the key.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

pub mod iterator;
pub mod options;

pub use iterator::DbIterator;
pub use options::{Options, ReadOptions, WriteOptions};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, trace, warn};

use crate::batch::{BatchHandler, WriteBatch};
use crate::memtable::{is_tombstone, LookupResult, MemTable};
use crate::sstable::{TableBuilder, TableReader};
use crate::status::{Result, Status};
use crate::wal::{RecordType, ReplayHandler, WalReader, WalWriter};

/// Name of the write-ahead log inside the database directory.
pub const LOG_FILE: &str = "LOG";

/// Subdirectory holding flushed tables.
pub const TABLE_DIR: &str = "0";

// ------------------------------------------------------------------------------------------------
// Engine state
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
struct EngineInner {
    options: Options,
    dir: PathBuf,
    wal: WalWriter,
    /// Live write buffer.
    mem: MemTable,
    /// Former live table being flushed; at most one.
    sealed: Option<MemTable>,
    /// Monotonic counter naming the next table file.
    next_file_number: u64,
    /// Open tables in creation order; newest last.
    tables: Vec<TableReader>,
}

/// Snapshot of engine size counters returned by [`Engine::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    /// Approximate size of the live memtable in bytes.
    pub memtable_size: usize,
    /// Whether a sealed memtable is currently held.
    pub sealed: bool,
    /// Number of tables in the catalog.
    pub table_count: usize,
}

/// A persistent ordered map from byte-string keys to byte-string values.
///
/// Safe for concurrent use from multiple threads; all public operations
/// serialize on an internal lock.
#[derive(Debug)]
pub struct Engine {
    inner: Mutex<EngineInner>,
}

impl Engine {
    /// Opens the database at `path`.
    ///
    /// Behavior at the directory level follows the options: an existing
    /// directory with `error_if_exists` fails `InvalidArgument`; a
    /// missing directory without `create_if_missing` fails `NotFound`.
    /// A non-empty log is fully replayed and existing tables are
    /// registered in creation order before the engine is returned.
    pub fn open(options: Options, path: impl AsRef<Path>) -> Result<Engine> {
        let dir = path.as_ref().to_path_buf();
        if dir.exists() {
            if options.error_if_exists {
                return Err(Status::invalid_argument("database already exists"));
            }
        } else if options.create_if_missing {
            fs::create_dir_all(dir.join(TABLE_DIR))?;
        } else {
            return Err(Status::not_found("database does not exist"));
        }
        info!(path = %dir.display(), "opening database");

        let wal_path = dir.join(LOG_FILE);
        let wal = WalWriter::open(&wal_path)?;

        let mut mem = MemTable::new();
        let log_len = fs::metadata(&wal_path).map(|m| m.len()).unwrap_or(0);
        if log_len > 0 {
            let mut reader = WalReader::open(&wal_path)?;
            let mut replay = MemTableReplay { mem: &mut mem };
            reader.replay(&mut replay)?;
            info!(entries = mem.len(), "log replayed into memtable");
        }

        let (tables, next_file_number) = Self::load_tables(&dir)?;
        if !tables.is_empty() {
            info!(count = tables.len(), next_file_number, "tables registered");
        }

        let engine = Engine {
            inner: Mutex::new(EngineInner {
                options,
                dir,
                wal,
                mem,
                sealed: None,
                next_file_number,
                tables,
            }),
        };

        // A recovered memtable may already be over budget.
        {
            let mut inner = engine.lock()?;
            Self::maybe_seal_and_flush(&mut inner)?;
        }
        Ok(engine)
    }

    /// Scans `<dir>/0/*.sst`, opening each table in creation order
    /// (ascending file number), and derives the next file number.
    fn load_tables(dir: &Path) -> Result<(Vec<TableReader>, u64)> {
        let table_dir = dir.join(TABLE_DIR);
        let mut numbered: Vec<(u64, PathBuf)> = Vec::new();
        if table_dir.is_dir() {
            for entry in fs::read_dir(&table_dir)? {
                let path = entry?.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("sst") {
                    continue;
                }
                match path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u64>().ok())
                {
                    Some(number) => numbered.push((number, path)),
                    None => {
                        warn!(path = %path.display(), "ignoring table file with non-numeric name");
                    }
                }
            }
        }
        numbered.sort_by_key(|(number, _)| *number);

        let next_file_number = numbered.last().map(|(n, _)| n + 1).unwrap_or(1);
        let mut tables = Vec::with_capacity(numbered.len());
        for (_, path) in numbered {
            tables.push(TableReader::open(&path)?);
        }
        Ok((tables, next_file_number))
    }

    // --------------------------------------------------------------------------------------------
    // Write path
    // --------------------------------------------------------------------------------------------

    /// Sets `key` to `value`. Overwrites silently.
    pub fn put(&self, options: &WriteOptions, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        let mut inner = self.lock()?;
        inner.wal.add_record(RecordType::Put, key, value)?;
        if options.sync {
            inner.wal.sync()?;
        }
        inner.mem.put(key, value);
        Self::maybe_seal_and_flush(&mut inner)
    }

    /// Removes `key`. Deleting an absent key is not an error.
    pub fn delete(&self, options: &WriteOptions, key: &[u8]) -> Result<()> {
        check_key(key)?;
        let mut inner = self.lock()?;
        inner.wal.add_record(RecordType::Delete, key, b"")?;
        if options.sync {
            inner.wal.sync()?;
        }
        inner.mem.delete(key);
        Self::maybe_seal_and_flush(&mut inner)
    }

    /// Applies every operation in `batch` atomically: the whole batch is
    /// staged and appended to the log in one write before any memtable
    /// change, so a log failure leaves memory untouched.
    pub fn write(&self, options: &WriteOptions, batch: &WriteBatch) -> Result<()> {
        let mut inner = self.lock()?;

        let mut staged = Vec::new();
        batch.iterate(&mut WalStage { buf: &mut staged })?;
        inner.wal.append_encoded(&staged)?;
        if options.sync {
            inner.wal.sync()?;
        }

        batch.iterate(&mut MemApply {
            mem: &mut inner.mem,
        })?;
        trace!(count = batch.count(), "batch applied");
        Self::maybe_seal_and_flush(&mut inner)
    }

    // --------------------------------------------------------------------------------------------
    // Read path
    // --------------------------------------------------------------------------------------------

    /// Returns the value stored for `key`, or `NotFound` when the key is
    /// absent or deleted.
    ///
    /// Layers are consulted newest-first; the first layer with an opinion
    /// wins, so a tombstone in a newer layer hides older values. Damage
    /// in any table is surfaced, not skipped.
    pub fn get(&self, _options: &ReadOptions, key: &[u8]) -> Result<Vec<u8>> {
        let inner = self.lock()?;

        match inner.mem.lookup(key) {
            LookupResult::Value(value) => return Ok(value),
            LookupResult::Tombstone => return Err(Status::not_found("key deleted")),
            LookupResult::Miss => {}
        }

        if let Some(sealed) = &inner.sealed {
            match sealed.lookup(key) {
                LookupResult::Value(value) => return Ok(value),
                LookupResult::Tombstone => return Err(Status::not_found("key deleted")),
                LookupResult::Miss => {}
            }
        }

        for table in inner.tables.iter().rev() {
            match table.get(key)? {
                LookupResult::Value(value) => return Ok(value),
                LookupResult::Tombstone => return Err(Status::not_found("key deleted")),
                LookupResult::Miss => {}
            }
        }

        Err(Status::not_found("key not found"))
    }

    /// Returns an ordered cursor over a point-in-time view of the whole
    /// database: live memtable, sealed memtable, and every table, merged
    /// newest-first with tombstones applied.
    pub fn new_iterator(&self, _options: &ReadOptions) -> Result<DbIterator> {
        let inner = self.lock()?;

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        merge_memtable(&mut merged, &inner.mem);
        if let Some(sealed) = &inner.sealed {
            merge_memtable(&mut merged, sealed);
        }
        for table in inner.tables.iter().rev() {
            for item in table.iter() {
                let (key, value) = item?;
                merged.entry(key).or_insert(value);
            }
        }

        let entries: Vec<(Vec<u8>, Vec<u8>)> = merged
            .into_iter()
            .filter(|(_, value)| !is_tombstone(value))
            .collect();
        Ok(DbIterator::new(entries))
    }

    /// Snapshot of the engine's size counters.
    pub fn stats(&self) -> Result<EngineStats> {
        let inner = self.lock()?;
        Ok(EngineStats {
            memtable_size: inner.mem.approximate_size(),
            sealed: inner.sealed.is_some(),
            table_count: inner.tables.len(),
        })
    }

    /// Syncs and closes the log, consuming the engine.
    pub fn close(self) -> Result<()> {
        let inner = self
            .inner
            .into_inner()
            .map_err(|_| Status::io_error("engine mutex poisoned"))?;
        inner.wal.close()
    }

    // --------------------------------------------------------------------------------------------
    // Flush
    // --------------------------------------------------------------------------------------------

    /// Seals the live memtable once it reaches the write-buffer budget
    /// and flushes it inline.
    ///
    /// When a sealed table is already held (only possible if its flush
    /// failed), the write is accepted without relieving the pressure.
    fn maybe_seal_and_flush(inner: &mut EngineInner) -> Result<()> {
        if inner.mem.approximate_size() < inner.options.write_buffer_size {
            return Ok(());
        }
        if inner.sealed.is_some() {
            trace!("seal deferred: a sealed memtable is still pending");
            return Ok(());
        }
        let full = std::mem::take(&mut inner.mem);
        debug!(
            size = full.approximate_size(),
            entries = full.len(),
            "memtable sealed"
        );
        inner.sealed = Some(full);
        Self::flush_sealed(inner)
    }

    /// Converts the sealed memtable into a table file, registers it, and
    /// truncates the log.
    ///
    /// On failure the sealed table is retained: its records are still in
    /// the log, so nothing is lost and reads keep seeing it.
    fn flush_sealed(inner: &mut EngineInner) -> Result<()> {
        let Some(sealed) = inner.sealed.take() else {
            return Ok(());
        };
        if sealed.is_empty() {
            return Ok(());
        }

        let number = inner.next_file_number;
        let path = inner.dir.join(TABLE_DIR).join(format!("{number}.sst"));
        let written = Self::write_table(&path, &sealed)
            .and_then(|entries| Ok((entries, TableReader::open(&path)?)));

        match written {
            Ok((entries, reader)) => {
                inner.next_file_number = number + 1;
                inner.tables.push(reader);
                // Everything the log holds is now in a registered table.
                inner.wal.truncate()?;
                info!(path = %path.display(), entries, "memtable flushed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "flush failed; sealed memtable retained");
                inner.sealed = Some(sealed);
                Err(e)
            }
        }
    }

    /// Streams every entry of `mem`, tombstones included, into a new
    /// table at `path`.
    fn write_table(path: &Path, mem: &MemTable) -> Result<u64> {
        let mut builder = TableBuilder::new(path)?;
        let mut it = mem.new_iter();
        it.seek_to_first();
        while it.valid() {
            // Tombstones are written through so they shadow older tables.
            builder.add(it.key(), it.value())?;
            it.next();
        }
        let entries = builder.num_entries();
        builder.finish()?;
        Ok(entries)
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineInner>> {
        self.inner
            .lock()
            .map_err(|_| Status::io_error("engine mutex poisoned"))
    }
}

/// Destroys the database at `path`, removing its directory tree.
/// Destroying a database that does not exist is not an error.
pub fn destroy_db(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_dir_all(path)?;
        info!(path = %path.display(), "database destroyed");
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Handlers
// ------------------------------------------------------------------------------------------------

/// Applies replayed log records to the recovering memtable.
struct MemTableReplay<'a> {
    mem: &'a mut MemTable,
}

impl ReplayHandler for MemTableReplay<'_> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.mem.put(&key, &value);
        Ok(())
    }

    fn delete(&mut self, key: Vec<u8>) -> Result<()> {
        self.mem.delete(&key);
        Ok(())
    }
}

/// Stages a batch as encoded log records.
struct WalStage<'a> {
    buf: &'a mut Vec<u8>,
}

impl BatchHandler for WalStage<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        WalWriter::encode_record(self.buf, RecordType::Put, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        WalWriter::encode_record(self.buf, RecordType::Delete, key, b"")
    }
}

/// Applies a batch to the live memtable.
struct MemApply<'a> {
    mem: &'a mut MemTable,
}

impl BatchHandler for MemApply<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.mem.put(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.mem.delete(key);
        Ok(())
    }
}

/// Merge `mem`'s entries into `dst`, keeping whatever a newer layer
/// already placed there.
fn merge_memtable(dst: &mut BTreeMap<Vec<u8>, Vec<u8>>, mem: &MemTable) {
    let mut it = mem.new_iter();
    it.seek_to_first();
    while it.valid() {
        dst.entry(it.key().to_vec())
            .or_insert_with(|| it.value().to_vec());
        it.next();
    }
}

/// Empty keys are unsupported across the engine.
fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(Status::invalid_argument("empty key"));
    }
    Ok(())
}
