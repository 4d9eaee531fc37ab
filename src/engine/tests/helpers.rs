//! Shared helpers for the engine test suites.

use std::path::Path;

use tracing::Level;
use tracing_subscriber::fmt::Subscriber;

use crate::engine::{Engine, Options, ReadOptions, WriteOptions};
use crate::status::Result;

/// Initialize a trace-level subscriber.
/// Safe to call multiple times; only the first call takes effect.
pub fn init_tracing() {
    let _ = Subscriber::builder()
        .with_max_level(Level::TRACE)
        .try_init();
}

/// Open (creating if needed) a database with the default 4 MiB buffer.
pub fn open_default(path: &Path) -> Result<Engine> {
    let mut options = Options::default();
    options.create_if_missing = true;
    Engine::open(options, path)
}

/// Open (creating if needed) a database with a small write buffer so
/// seals and flushes happen quickly.
pub fn open_small_buffer(path: &Path, write_buffer_size: usize) -> Result<Engine> {
    let mut options = Options::default();
    options.create_if_missing = true;
    options.write_buffer_size = write_buffer_size;
    Engine::open(options, path)
}

/// Default write options (no sync).
pub fn wopts() -> WriteOptions {
    WriteOptions::default()
}

/// Default read options.
pub fn ropts() -> ReadOptions {
    ReadOptions::default()
}

/// Collect every `(key, value)` pair an iterator yields front to back.
pub fn collect_iter(engine: &Engine) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut it = engine.new_iterator(&ropts()).unwrap();
    it.seek_to_first();
    let mut out = Vec::new();
    while it.valid() {
        out.push((it.key().to_vec(), it.value().to_vec()));
        it.next();
    }
    out
}
