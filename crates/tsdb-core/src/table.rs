//! A timestamp-ordered, append-only table layered on a [`FileMappedVector`].

use crate::config::FmvOptions;
use crate::fmv::FileMappedVector;
use std::path::Path;

/// One stored row: a caller-defined timestamp paired with a caller-defined
/// value. The timestamp unit is up to the caller (tests in this crate use
/// nanoseconds since an arbitrary epoch) — only ordering matters here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Entry<T> {
    /// Caller-defined timestamp. Strictly increasing within a table.
    pub timestamp: u64,
    /// The stored value.
    pub value: T,
}

/// A strictly time-ordered, append-only sequence of `T` values.
///
/// `append` silently drops any row whose timestamp does not strictly
/// exceed the table's current last timestamp — see the crate-level error
/// policy for why this is a silent no-op rather than a recoverable error.
pub struct Table<T: Copy> {
    fmv: FileMappedVector<Entry<T>>,
    last_timestamp: Option<u64>,
}

impl<T: Copy> Table<T> {
    /// Opens or creates a table at `path`.
    #[must_use]
    pub fn open<P: AsRef<Path>>(path: P, options: FmvOptions) -> Self {
        let fmv = FileMappedVector::open(path, options);
        let last_timestamp = if fmv.size() > 0 {
            // SAFETY: size() > 0 guarantees index size()-1 holds an
            // initialized entry.
            Some(unsafe { (*fmv.get(fmv.size() - 1)).timestamp })
        } else {
            None
        };
        Self { fmv, last_timestamp }
    }

    /// Number of rows currently stored.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.fmv.size()
    }

    /// Returns a raw pointer to row `index`.
    ///
    /// # Contract
    ///
    /// `index` must be `< size()`. See [`FileMappedVector::get`] for the
    /// address-stability guarantee this pointer carries.
    #[must_use]
    pub fn get(&self, index: u64) -> *const Entry<T> {
        self.fmv.get(index)
    }

    /// Appends `(timestamp, value)` if `timestamp` strictly exceeds the
    /// table's current last timestamp; otherwise silently does nothing.
    pub fn append(&mut self, timestamp: u64, value: T) {
        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                return;
            }
        }

        self.fmv.append(&Entry { timestamp, value });
        self.last_timestamp = Some(timestamp);
    }

    /// Returns the leftmost index whose timestamp is `>= timestamp`, with
    /// clamped endpoints: a query at or below the first timestamp returns
    /// `0`; a query at or above the last returns `size() - 1`.
    ///
    /// # Panics
    ///
    /// Not defined on an empty table; debug builds assert this.
    #[must_use]
    pub fn locate(&self, timestamp: u64) -> u64 {
        let size = self.size();
        debug_assert!(size > 0, "locate is not defined on an empty table");

        // SAFETY: size > 0, so indices 0 and size-1 are valid.
        let first_ts = unsafe { (*self.get(0)).timestamp };
        if timestamp <= first_ts {
            return 0;
        }
        let last_ts = unsafe { (*self.get(size - 1)).timestamp };
        if timestamp >= last_ts {
            return size - 1;
        }

        self.locate_between(timestamp, 0, size - 1)
    }

    /// Tail-prefetched binary search over `[lo, hi]`, maintaining the
    /// invariant that the answer lies in this range. At each step, the
    /// midpoints of both candidate child ranges are prefetched before the
    /// timestamp comparisons that decide which child to recurse into —
    /// overlapping the memory latency of the next probe with this one.
    fn locate_between(&self, timestamp: u64, mut lo: u64, mut hi: u64) -> u64 {
        loop {
            if lo == hi {
                return lo;
            }

            let mid = lo + (hi - lo) / 2;
            let left_mid = lo + (mid - lo) / 2;
            let right_mid = (mid + 1) + (hi - (mid + 1)) / 2;
            prefetch_read(self.get(left_mid));
            prefetch_read(self.get(right_mid));

            // SAFETY: lo <= mid <= hi < size(), all valid indices. mid == 0
            // can only occur on a step that takes the `lo = mid + 1` branch
            // (timestamp[0] < timestamp is guaranteed by the caller-level
            // clamp), so before_ts is never read on the branch that returns.
            let mid_ts = unsafe { (*self.get(mid)).timestamp };
            let before_ts = unsafe { (*self.get(mid.saturating_sub(1))).timestamp };

            if mid_ts >= timestamp && before_ts < timestamp {
                return mid;
            }
            if mid_ts < timestamp {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
    }

    /// Returns a thinned, order-preserving subsequence of rows covering
    /// `[t_start, t_end]`, such that adjacent returned rows are separated
    /// by strictly more than `dt` timestamp units. Always non-empty on a
    /// non-empty table; its first row is `get(locate(t_start))`.
    ///
    /// # Panics
    ///
    /// Not defined on an empty table; debug builds assert this via
    /// `locate`.
    #[must_use]
    pub fn reduce(&self, t_start: u64, t_end: u64, dt: u64) -> Vec<Entry<T>> {
        let size = self.size();
        let start = self.locate(t_start);
        let end = (self.locate(t_end) + 1).min(size);

        // SAFETY: start < size (locate's postcondition, and start < end is
        // guaranteed because end > locate(t_start) whenever t_end >= t_start).
        let first = unsafe { *self.get(start) };
        let mut threshold = first.timestamp + dt;
        let mut reduced = vec![first];

        for i in (start + 1)..end {
            // SAFETY: i < end <= size().
            let entry = unsafe { *self.get(i) };
            if entry.timestamp > threshold {
                threshold = entry.timestamp + dt;
                reduced.push(entry);
            }
        }

        reduced
    }

    /// Schedules an asynchronous flush of this table's backing storage.
    pub fn sync(&self) {
        self.fmv.sync();
    }
}

#[inline(always)]
fn prefetch_read<E>(ptr: *const E) {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: `_mm_prefetch` is a hint; it is defined for any address,
        // valid or not, and never faults.
        unsafe {
            std::arch::x86_64::_mm_prefetch(ptr.cast::<i8>(), std::arch::x86_64::_MM_HINT_T0);
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: `prfm` is a hint instruction; it never faults regardless
        // of whether `ptr` is mapped.
        unsafe {
            std::arch::asm!(
                "prfm pldl1keep, [{0}]",
                in(reg) ptr,
                options(nostack, preserves_flags, readonly),
            );
        }
    }
}
