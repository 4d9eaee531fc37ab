//! Shared helpers for the WAL test suites.

use std::path::Path;

use tracing::Level;
use tracing_subscriber::fmt::Subscriber;

use crate::status::Result;
use crate::wal::{RecordType, WalRecord, WalReader, WalWriter};

/// Initialize a trace-level subscriber.
/// Safe to call multiple times; only the first call takes effect.
pub fn init_tracing() {
    let _ = Subscriber::builder()
        .with_max_level(Level::TRACE)
        .try_init();
}

/// Append a Put record for each `(key, value)` pair.
pub fn write_puts(path: &Path, pairs: &[(&[u8], &[u8])]) -> Result<()> {
    let mut writer = WalWriter::open(path)?;
    for (key, value) in pairs {
        writer.add_record(RecordType::Put, key, value)?;
    }
    writer.sync()
}

/// Read every record from the log into a `Vec`.
pub fn collect_records(path: &Path) -> Result<Vec<WalRecord>> {
    let mut reader = WalReader::open(path)?;
    let mut records = Vec::new();
    while let Some(record) = reader.read_record()? {
        records.push(record);
    }
    Ok(records)
}
