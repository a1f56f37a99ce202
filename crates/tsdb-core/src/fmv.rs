//! File-mapped growable vector — the storage substrate every table sits on.
//!
//! A `FileMappedVector<E>` reserves a single large virtual address range up
//! front (see [`FmvOptions::reservation_bytes`]) and never remaps it. Growth
//! only ever extends the backing file; because the reservation already
//! covers the new region, every pointer previously returned by [`get`]
//! stays valid for the vector's entire lifetime.
//!
//! [`get`]: FileMappedVector::get

use crate::config::{assert_supported_host, FmvOptions, HEADER_SIZE, MAGIC};
use crate::error::{Error, Result};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

/// Offset of the `size` field within the header page.
const SIZE_FIELD_OFFSET: usize = 8;

/// A typed, growable, disk-backed array with O(1) indexed access.
///
/// `E` must behave as plain old data: no interior pointers, no `Drop` side
/// effects, stable layout for as long as a table file is reused. This is
/// the caller's contract; `FileMappedVector` requires only `Copy` and never
/// inspects the bytes it moves.
pub struct FileMappedVector<E> {
    path: PathBuf,
    file: File,
    mmap: MmapMut,
    stride: usize,
    capacity: u64,
    options: FmvOptions,
    _marker: PhantomData<E>,
}

impl<E: Copy> FileMappedVector<E> {
    /// Opens or creates a file-mapped vector at `path`.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message if the host is unsupported, the
    /// file cannot be created or opened, or an existing file fails any
    /// validation check (short file, bad magic, misaligned data length,
    /// size overflow). Per this crate's error-handling policy these are
    /// all non-recoverable: a corrupt table file is never silently
    /// repaired or truncated.
    #[must_use]
    pub fn open<P: AsRef<Path>>(path: P, options: FmvOptions) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::try_open(path.clone(), options)
            .unwrap_or_else(|e| panic!("fmv: failed to open {path:?}: {e}"))
    }

    pub(crate) fn try_open(path: PathBuf, options: FmvOptions) -> Result<Self> {
        assert_supported_host()?;

        let stride = std::mem::size_of::<E>();
        assert!(
            stride > 0 && stride % 8 == 0,
            "fmv: element type must be non-zero-sized and 8-byte aligned, got {stride}"
        );

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .mode(options.file_mode)
            .open(&path)
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;

        let len = file_len(&file, &path)?;
        if len == 0 {
            Self::initialize(&file, &path, stride, options.initial_elements)?;
        }

        let (_size, capacity) = validate(&file, &path, stride)?;

        // SAFETY: `options.reservation_bytes` is a fixed virtual address
        // range mapped over `file` at offset 0. The file may currently be
        // shorter than the reservation; pages beyond end-of-file are never
        // dereferenced because every index access is bounds-checked
        // against `capacity`, which tracks exactly how much of the file has
        // been preallocated. This is the whole point of the design: growth
        // never needs to remap, so earlier pointers stay valid.
        let mmap = unsafe {
            MmapOptions::new()
                .len(options.reservation_bytes as usize)
                .map_mut(&file)
        }
        .map_err(|source| Error::Syscall {
            operation: "mmap",
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            file,
            mmap,
            stride,
            capacity,
            options,
            _marker: PhantomData,
        })
    }

    fn initialize(file: &File, path: &Path, stride: usize, initial_elements: u64) -> Result<()> {
        file.set_len(HEADER_SIZE).map_err(|source| Error::Syscall {
            operation: "ftruncate",
            path: path.to_path_buf(),
            source,
        })?;

        // `set_len` zero-fills the new region, so `size` (offset 8) already
        // reads as 0; only the magic needs writing.
        file.write_all_at(&MAGIC.to_le_bytes(), 0)
            .map_err(|source| Error::Syscall {
                operation: "write header",
                path: path.to_path_buf(),
                source,
            })?;

        preallocate(file, path, HEADER_SIZE, initial_elements.saturating_mul(stride as u64))
    }

    /// Returns the logical element count, read live from the mapped header.
    #[must_use]
    pub fn size(&self) -> u64 {
        // SAFETY: the header's first page is always resident and mapped
        // for the lifetime of `self`; the size field lives at a fixed
        // offset within it.
        unsafe {
            std::ptr::read_volatile(self.mmap.as_ptr().add(SIZE_FIELD_OFFSET).cast::<u64>())
        }
    }

    fn set_size(&mut self, size: u64) {
        // SAFETY: see `size()`.
        unsafe {
            std::ptr::write_volatile(
                self.mmap.as_mut_ptr().add(SIZE_FIELD_OFFSET).cast::<u64>(),
                size,
            );
        }
    }

    /// Returns the current capacity, in elements.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns a raw pointer to element `index`.
    ///
    /// # Contract
    ///
    /// `index` must be `< capacity()`. This does not bounds-check against
    /// `size()` — that is the caller's responsibility, exactly as for a raw
    /// slice index. The returned pointer is valid for as long as `self` is
    /// not dropped, including across subsequent [`append`](Self::append)
    /// calls: the vector's reservation never moves.
    #[must_use]
    pub fn get(&self, index: u64) -> *const E {
        debug_assert!(
            index < self.capacity,
            "fmv: index {index} out of capacity {cap}",
            cap = self.capacity
        );
        let offset = (HEADER_SIZE + index * self.stride as u64) as usize;
        // SAFETY: offset falls within the mapped reservation: capacity was
        // computed from a file length that fits within reservation_bytes
        // (checked in `grow`), and `index < capacity` is the caller's
        // contract above.
        unsafe { self.mmap.as_ptr().add(offset).cast::<E>() }
    }

    /// Appends `elem`, growing the backing file first if the vector is at
    /// capacity.
    ///
    /// # Panics
    ///
    /// Panics if the required filesystem growth operation fails, or if
    /// growth would exceed the vector's virtual address reservation.
    pub fn append(&mut self, elem: &E) {
        self.try_append(elem)
            .unwrap_or_else(|e| panic!("fmv: append failed on {:?}: {e}", self.path));
    }

    fn try_append(&mut self, elem: &E) -> Result<()> {
        let size = self.size();
        if size == self.capacity {
            self.grow()?;
        }

        let offset = (HEADER_SIZE + size * self.stride as u64) as usize;
        // SAFETY: `grow` guarantees capacity > size at this point, so
        // `offset..offset+stride` lies within the preallocated, mapped
        // region. `elem` is `Copy`, so copying its bytes is sound.
        unsafe {
            let dest = self.mmap.as_mut_ptr().add(offset);
            std::ptr::copy_nonoverlapping((elem as *const E).cast::<u8>(), dest, self.stride);
        }
        self.set_size(size + 1);
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let new_capacity = if self.capacity == 0 {
            1
        } else {
            self.capacity.saturating_mul(self.options.growth_factor)
        };

        let new_len = HEADER_SIZE + new_capacity * self.stride as u64;
        if new_len > self.options.reservation_bytes {
            panic!(
                "fmv: growing {:?} to {new_capacity} elements would exceed the {} byte \
                 virtual reservation; open with a larger FmvOptions::reservation_bytes",
                self.path, self.options.reservation_bytes
            );
        }

        let additional = (new_capacity - self.capacity) * self.stride as u64;
        let offset = HEADER_SIZE + self.capacity * self.stride as u64;
        preallocate(&self.file, &self.path, offset, additional)?;

        self.capacity = new_capacity;
        Ok(())
    }

    /// Schedules an asynchronous flush of the header and all live elements.
    /// Does not block for completion; see the module-level durability note.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `msync` call itself fails (not if it simply
    /// hasn't completed yet — `MS_ASYNC` never waits for that).
    pub fn sync(&self) {
        self.try_sync()
            .unwrap_or_else(|e| panic!("fmv: sync failed on {:?}: {e}", self.path));
    }

    fn try_sync(&self) -> Result<()> {
        let live_len = (HEADER_SIZE + self.size() * self.stride as u64) as usize;
        self.mmap
            .flush_async_range(0, live_len)
            .map_err(|source| Error::Syscall {
                operation: "msync",
                path: self.path.clone(),
                source,
            })
    }
}

impl<E> Drop for FileMappedVector<E> {
    fn drop(&mut self) {
        // Best-effort only: the destructor cannot propagate a failure, and
        // durability beyond this is the OS's write-back policy, not ours.
        let live_len = (HEADER_SIZE + self.size() * self.stride as u64) as usize;
        if let Err(source) = self.mmap.flush_async_range(0, live_len) {
            tracing::error!(?source, path = ?self.path, "fmv: async msync failed during drop");
        }
    }
}

fn file_len(file: &File, path: &Path) -> Result<u64> {
    file.metadata()
        .map(|m| m.len())
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Validates an opened file against the on-disk format and returns
/// `(size, capacity)` in elements.
fn validate(file: &File, path: &Path, stride: usize) -> Result<(u64, u64)> {
    let len = file_len(file, path)?;
    if len < HEADER_SIZE {
        return Err(Error::Truncated {
            path: path.to_path_buf(),
            len,
            header_size: HEADER_SIZE,
        });
    }

    let mut header = [0u8; 16];
    file.read_exact_at(&mut header, 0)
        .map_err(|source| Error::Syscall {
            operation: "read header",
            path: path.to_path_buf(),
            source,
        })?;

    let magic = u64::from_le_bytes(header[0..8].try_into().expect("8 bytes"));
    if magic != MAGIC {
        return Err(Error::BadMagic {
            path: path.to_path_buf(),
            expected: MAGIC,
            found: magic,
        });
    }
    let size = u64::from_le_bytes(header[8..16].try_into().expect("8 bytes"));

    let data_len = len - HEADER_SIZE;
    if data_len % stride as u64 != 0 {
        return Err(Error::Misaligned {
            path: path.to_path_buf(),
            data_len,
            stride,
        });
    }

    let capacity = data_len / stride as u64;
    if size > capacity {
        return Err(Error::SizeOverflow {
            path: path.to_path_buf(),
            size,
            capacity,
        });
    }

    Ok((size, capacity))
}

/// Extends `file` by `len` bytes starting at `offset`, without touching the
/// existing mapping. Uses `fallocate` on Linux (true preallocation, no
/// sparse holes); falls back to `ftruncate` (lazy allocation) elsewhere,
/// per the design note that either is acceptable since the mapping is
/// already sized to the full reservation.
fn preallocate(file: &File, path: &Path, offset: u64, len: u64) -> Result<()> {
    if len == 0 {
        return Ok(());
    }

    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        let offset = i64::try_from(offset).expect("offset fits in i64 on supported hosts");
        let len = i64::try_from(len).expect("len fits in i64 on supported hosts");
        // SAFETY: `file` is a valid, open file descriptor for the lifetime
        // of this call; offset/len were validated to fit the libc types.
        let ret = unsafe { libc::fallocate(file.as_raw_fd(), 0, offset, len) };
        if ret != 0 {
            return Err(Error::Syscall {
                operation: "fallocate",
                path: path.to_path_buf(),
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    {
        file.set_len(offset + len).map_err(|source| Error::Syscall {
            operation: "ftruncate",
            path: path.to_path_buf(),
            source,
        })
    }
}
