//! Tunables for [`crate::fmv::FileMappedVector`] and [`crate::table::Table`].
//!
//! These are passed explicitly to `open` rather than loaded from a config
//! file: this crate is an embedded library with no ambient environment of
//! its own. A host application that wants file/env-driven configuration
//! (the demonstration CLI does) builds one of these from its own config
//! layer and passes it down.

/// Page size this on-disk format is defined for (4 KiB, the header size).
pub const HEADER_SIZE: u64 = 4096;

/// ASCII tag `"FMAPVEC\0"` read as a little-endian `u64`.
pub const MAGIC: u64 = u64::from_le_bytes(*b"FMAPVEC\0");

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("tsdb-core only supports x86_64 and aarch64 hosts");

#[cfg(not(unix))]
compile_error!("tsdb-core requires a unix host (mmap/fallocate-based storage)");

/// Returns the host's page size in bytes.
///
/// This crate's on-disk format fixes the header to one 4 KiB page; hosts
/// with a different page size cannot safely open a table file (the header
/// would not occupy a whole page, and page-fault granularity assumptions
/// in the mapping strategy would not hold). Use [`assert_supported_host`]
/// to turn a mismatch into the documented fatal error instead of silently
/// misbehaving.
#[cfg(target_os = "linux")]
#[must_use]
pub fn host_page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE takes no pointers and always
    // returns a valid (or -1 on error, which cannot happen for this name).
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size).expect("sysconf(_SC_PAGESIZE) returned a negative value")
}

/// Fallback page-size probe for non-Linux unix hosts that still satisfy
/// the architecture gate above and are assumed to run with 4 KiB pages.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn host_page_size() -> usize {
    4096
}

/// Verifies the host page size matches what this format requires.
pub(crate) fn assert_supported_host() -> crate::error::Result<()> {
    let actual = host_page_size();
    if actual as u64 != HEADER_SIZE {
        return Err(crate::error::Error::UnsupportedPageSize {
            actual,
            expected: HEADER_SIZE as usize,
        });
    }
    Ok(())
}

/// Construction-time tunables for a [`crate::fmv::FileMappedVector`].
#[derive(Debug, Clone, Copy)]
pub struct FmvOptions {
    /// Size, in bytes, of the virtual address reservation mapped up front.
    /// Growth never remaps past this; it bounds the maximum table size.
    pub reservation_bytes: u64,
    /// Number of elements to preallocate when a file is created fresh.
    pub initial_elements: u64,
    /// Minimum multiplicative growth factor applied on each resize.
    pub growth_factor: u64,
    /// Unix file permission bits used when creating a new table file.
    pub file_mode: u32,
}

impl Default for FmvOptions {
    fn default() -> Self {
        Self {
            reservation_bytes: 1 << 40, // 1 TiB
            initial_elements: 1024,
            growth_factor: 2,
            file_mode: 0o644,
        }
    }
}
