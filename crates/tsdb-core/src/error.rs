//! Error types for `tsdb-core`.
//!
//! The fatal conditions described in the storage contract (bad magic,
//! truncated files, unsupported hosts, stride mismatches, ...) are not
//! recoverable by a caller of this crate — they indicate a corrupt file or
//! a programming error, not a condition a time-series store can repair
//! locally. Public entry points that can hit one of these surface them as
//! a panic built from this type rather than returning a `Result`; the
//! `Result` form stays available on the private, fully-fallible helpers so
//! the failure paths themselves are unit-testable without unwinding.

use std::path::PathBuf;

/// Result type alias for fallible internal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or growing a file-mapped vector.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The backing file could not be opened or created.
    #[error("could not open table file {path:?}: {source}")]
    Open {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is shorter than one header page.
    #[error("table file {path:?} is truncated: {len} bytes, header requires {header_size}")]
    Truncated {
        /// Path of the offending file.
        path: PathBuf,
        /// Observed file length.
        len: u64,
        /// Required header size.
        header_size: u64,
    },

    /// The header magic value did not match.
    #[error("table file {path:?} has a bad magic value (expected {expected:#x}, found {found:#x})")]
    BadMagic {
        /// Path of the offending file.
        path: PathBuf,
        /// Expected magic constant.
        expected: u64,
        /// Magic value actually read from the file.
        found: u64,
    },

    /// The data region length is not a multiple of the element stride.
    #[error(
        "table file {path:?} data region ({data_len} bytes) is not a multiple of stride ({stride})"
    )]
    Misaligned {
        /// Path of the offending file.
        path: PathBuf,
        /// Length of the data region (file length minus header size).
        data_len: u64,
        /// Element stride in bytes.
        stride: usize,
    },

    /// The header's recorded `size` exceeds what the data region can hold.
    #[error(
        "table file {path:?} header claims {size} elements but the data region only holds {capacity}"
    )]
    SizeOverflow {
        /// Path of the offending file.
        path: PathBuf,
        /// Header's recorded element count.
        size: u64,
        /// Capacity computed from the data region.
        capacity: u64,
    },

    /// The host page size is not the one this format is defined for.
    #[error("unsupported host page size {actual}, this format requires {expected}")]
    UnsupportedPageSize {
        /// Page size reported by the host.
        actual: usize,
        /// Page size the on-disk format requires.
        expected: usize,
    },

    /// A `fallocate`/`ftruncate`/`mmap`/`msync` syscall failed.
    #[error("{operation} failed on {path:?}: {source}")]
    Syscall {
        /// Name of the failing operation, for diagnostics.
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A table was reopened under a different element type than the one it
    /// was created with.
    #[error(
        "table {name:?} was opened with a different element type: expected stride {expected}, got {actual}"
    )]
    TypeMismatch {
        /// Table name.
        name: String,
        /// Stride the table was created with.
        expected: usize,
        /// Stride requested by this retrieval.
        actual: usize,
    },
}
