//! # stratumdb
//!
//! An embeddable, persistent, ordered key/value storage engine built on a
//! **Log-Structured Merge Tree (LSM-tree)** write path. Designed for fast
//! writes, cheap ordered iteration, and crash-safe operation.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                       Engine                           │
//! │  ┌────────────┐   ┌────────────┐   ┌───────────────┐   │
//! │  │   Live     │   │   Sealed   │   │   SSTables    │   │
//! │  │  MemTable  │   │  MemTable  │   │  (on disk)    │   │
//! │  │            │   │            │   │  0/<n>.sst    │   │
//! │  └─────┬──────┘   └─────┬──────┘   └──────┬────────┘   │
//! │        │    seal        │    flush        │            │
//! │        └──────────►     └──────────►      │            │
//! │                                           │            │
//! │  ┌────────────────────────────────────────┴─────────┐  │
//! │  │           Write-ahead log (LOG)                  │  │
//! │  │  appended before every memtable mutation,        │  │
//! │  │  replayed on open, truncated after a flush       │  │
//! │  └──────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Core storage engine: open, read, write, batch, iterate, flush |
//! | [`memtable`] | In-memory ordered write buffer with tombstones |
//! | [`wal`] | CRC-protected write-ahead log: append, sync, replay |
//! | [`sstable`] | Immutable sorted tables: prefix-compressed blocks, index, footer |
//! | [`batch`] | Ordered write batches applied atomically |
//! | [`coding`] | Little-endian fixed/varint primitives and CRC32 |
//! | [`status`] | The closed error taxonomy threaded through every layer |
//!
//! ## Guarantees
//!
//! - **Durability.** Every mutation is appended to the WAL before the
//!   in-memory state changes; the WAL is fully replayed on reopen.
//! - **Ordering.** Keys are ordered by unsigned lexicographic byte
//!   comparison everywhere: memtable, blocks, tables, iterators.
//! - **Integrity.** Every WAL record and every table block carries a
//!   CRC32 that is verified on read; corruption is surfaced, never
//!   silently skipped.
//! - **Atomic batches.** A [`WriteBatch`] is reflected in both the WAL
//!   and the memtable entirely or not at all.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use stratumdb::{Engine, Options, ReadOptions, WriteOptions};
//!
//! let mut options = Options::default();
//! options.create_if_missing = true;
//!
//! let engine = Engine::open(options, "/tmp/my_db").unwrap();
//!
//! let wopts = WriteOptions::default();
//! let ropts = ReadOptions::default();
//!
//! engine.put(&wopts, b"hello", b"world").unwrap();
//! assert_eq!(engine.get(&ropts, b"hello").unwrap(), b"world".to_vec());
//!
//! engine.delete(&wopts, b"hello").unwrap();
//! assert!(engine.get(&ropts, b"hello").unwrap_err().is_not_found());
//!
//! engine.close().unwrap();
//! ```

pub mod batch;
pub mod coding;
pub mod engine;
pub mod memtable;
pub mod sstable;
pub mod status;
pub mod wal;

pub use batch::{BatchHandler, WriteBatch};
pub use engine::{destroy_db, DbIterator, Engine, EngineStats, Options, ReadOptions, WriteOptions};
pub use status::{Result, Status};
