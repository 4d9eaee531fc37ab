//! The error taxonomy threaded through every layer of the engine.
//!
//! Every fallible operation in the crate returns [`Result<T>`], whose
//! error side is the closed [`Status`] set below. The kinds are frozen:
//! on-disk formats and external callers rely on the numeric codes, so new
//! failure modes must map onto an existing kind rather than grow the set.
//!
//! [`Status::NotFound`] is the only kind that participates in the normal
//! read API (a missing key, a deleted key). Every other kind is a genuine
//! failure.
//!
//! # Rendering
//!
//! A status renders as `"<KindName>: <message>"`, e.g.
//! `Corruption: checksum mismatch in log record`. Success has no `Status`
//! value; it is the `Ok` side of [`Result`].

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Status>;

/// Closed set of failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Status {
    /// The requested key, file, or database does not exist.
    #[error("NotFound: {0}")]
    NotFound(String),

    /// On-disk data failed an integrity check: bad checksum, truncated
    /// record, invalid magic number, or an out-of-bounds structure.
    #[error("Corruption: {0}")]
    Corruption(String),

    /// A recognized but unimplemented format feature, e.g. a reserved
    /// block compression tag.
    #[error("NotSupported: {0}")]
    NotSupported(String),

    /// The caller supplied an unusable argument or option combination.
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    /// An underlying filesystem operation failed.
    #[error("IOError: {0}")]
    Io(String),

    /// Round-trip carrier for codes this version does not recognize.
    #[error("Unknown: {0}")]
    Unknown(String),
}

impl Status {
    /// Build a [`Status::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Status {
        Status::NotFound(msg.into())
    }

    /// Build a [`Status::Corruption`].
    pub fn corruption(msg: impl Into<String>) -> Status {
        Status::Corruption(msg.into())
    }

    /// Build a [`Status::NotSupported`].
    pub fn not_supported(msg: impl Into<String>) -> Status {
        Status::NotSupported(msg.into())
    }

    /// Build a [`Status::InvalidArgument`].
    pub fn invalid_argument(msg: impl Into<String>) -> Status {
        Status::InvalidArgument(msg.into())
    }

    /// Build a [`Status::Io`].
    pub fn io_error(msg: impl Into<String>) -> Status {
        Status::Io(msg.into())
    }

    /// Returns `true` for [`Status::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Status::NotFound(_))
    }

    /// Returns `true` for [`Status::Corruption`].
    pub fn is_corruption(&self) -> bool {
        matches!(self, Status::Corruption(_))
    }

    /// Returns `true` for [`Status::NotSupported`].
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Status::NotSupported(_))
    }

    /// Returns `true` for [`Status::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Status::InvalidArgument(_))
    }

    /// Returns `true` for [`Status::Io`].
    pub fn is_io_error(&self) -> bool {
        matches!(self, Status::Io(_))
    }

    /// The human-readable message carried by this status.
    pub fn message(&self) -> &str {
        match self {
            Status::NotFound(m)
            | Status::Corruption(m)
            | Status::NotSupported(m)
            | Status::InvalidArgument(m)
            | Status::Io(m)
            | Status::Unknown(m) => m,
        }
    }

    /// Numeric code for this kind. Code 0 is reserved for success and is
    /// never produced by a `Status` value.
    pub fn code(&self) -> u32 {
        match self {
            Status::NotFound(_) => 1,
            Status::Corruption(_) => 2,
            Status::NotSupported(_) => 3,
            Status::InvalidArgument(_) => 4,
            Status::Io(_) => 5,
            Status::Unknown(_) => 6,
        }
    }

    /// Rebuild a status from a numeric code. Unrecognized codes (including
    /// the success code 0, which has no `Status` representation) map to
    /// [`Status::Unknown`] so they survive a round trip instead of being
    /// dropped.
    pub fn from_code(code: u32, msg: impl Into<String>) -> Status {
        let msg = msg.into();
        match code {
            1 => Status::NotFound(msg),
            2 => Status::Corruption(msg),
            3 => Status::NotSupported(msg),
            4 => Status::InvalidArgument(msg),
            5 => Status::Io(msg),
            _ => Status::Unknown(msg),
        }
    }
}

impl From<io::Error> for Status {
    fn from(err: io::Error) -> Status {
        Status::Io(err.to_string())
    }
}
