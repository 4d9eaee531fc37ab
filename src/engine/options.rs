//! Engine configuration.

/// Options controlling how a database is opened and run.
///
/// Passed to [`Engine::open`](super::Engine::open).
#[derive(Debug, Clone)]
pub struct Options {
    /// Create the directory and a fresh log on open when absent.
    pub create_if_missing: bool,

    /// Fail open when the directory already exists.
    pub error_if_exists: bool,

    /// Reserved for extra integrity checking. Block checksums are always
    /// verified regardless of this flag.
    pub paranoid_checks: bool,

    /// Live memtable size threshold, in bytes, that triggers sealing and
    /// a flush to an on-disk table.
    pub write_buffer_size: usize,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            create_if_missing: false,
            error_if_exists: false,
            paranoid_checks: false,
            write_buffer_size: 4 * 1024 * 1024,
        }
    }
}

/// Options for read operations.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Reserved; the read path always verifies block checksums.
    pub verify_checksums: bool,

    /// Reserved for a block cache.
    pub fill_cache: bool,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            verify_checksums: false,
            fill_cache: true,
        }
    }
}

/// Options for write operations.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Force the log to stable storage before the operation returns.
    pub sync: bool,
}
