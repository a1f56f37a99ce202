//! Tests for `fmv` module.

use crate::config::{FmvOptions, HEADER_SIZE, MAGIC};
use crate::error::Error;
use crate::fmv::FileMappedVector;
use tempfile::tempdir;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
struct Elem {
    a: u64,
    b: u64,
}

fn opts() -> FmvOptions {
    FmvOptions {
        reservation_bytes: 64 * 1024 * 1024,
        initial_elements: 4,
        growth_factor: 2,
        file_mode: 0o644,
    }
}

#[test]
fn fresh_create_append_reopen_roundtrips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");

    {
        let mut fmv = FileMappedVector::<Elem>::open(&path, opts());
        fmv.append(&Elem { a: 1, b: 8 });
        fmv.sync();
    }

    let fmv = FileMappedVector::<Elem>::open(&path, opts());
    assert_eq!(fmv.size(), 1);
    // SAFETY: index 0 < size() == 1.
    let got = unsafe { *fmv.get(0) };
    assert_eq!(got, Elem { a: 1, b: 8 });
}

#[test]
fn header_integrity_after_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    let mut fmv = FileMappedVector::<Elem>::open(&path, opts());

    for i in 0..5u64 {
        fmv.append(&Elem { a: i, b: i });
    }

    let bytes = std::fs::read(&path).unwrap();
    let magic = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let size = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    assert_eq!(magic, MAGIC);
    assert_eq!(size, 5);
}

#[test]
fn growth_preserves_earlier_pointers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    let mut fmv = FileMappedVector::<Elem>::open(&path, opts());

    fmv.append(&Elem { a: 0, b: 0 });
    // Captured before the vector grows past its initial capacity.
    let early_ptr = fmv.get(0);

    for i in 1..10_000u64 {
        fmv.append(&Elem { a: i, b: i * 2 });
    }

    assert_eq!(fmv.size(), 10_000);
    for i in 0..10_000u64 {
        // SAFETY: i < size().
        let got = unsafe { *fmv.get(i) };
        assert_eq!(got, Elem { a: i, b: i * 2 });
    }

    // SAFETY: the reservation never remaps, so the earlier pointer is
    // still valid and still reads the value appended through it.
    let still_there = unsafe { *early_ptr };
    assert_eq!(still_there, Elem { a: 0, b: 0 });
}

#[test]
fn capacity_doubles_from_initial_batch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    let mut fmv = FileMappedVector::<Elem>::open(&path, opts());

    assert_eq!(fmv.capacity(), 4);
    for i in 0..4u64 {
        fmv.append(&Elem { a: i, b: i });
    }
    assert_eq!(fmv.capacity(), 4);

    fmv.append(&Elem { a: 4, b: 4 });
    assert_eq!(fmv.capacity(), 8);
}

#[test]
fn file_length_is_always_at_least_header_plus_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    let mut fmv = FileMappedVector::<Elem>::open(&path, opts());

    for i in 0..20u64 {
        fmv.append(&Elem { a: i, b: i });
    }
    drop(fmv);

    let len = std::fs::metadata(&path).unwrap().len();
    assert!(len >= HEADER_SIZE + 20 * std::mem::size_of::<Elem>() as u64);
}

#[test]
fn corrupt_magic_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    {
        let mut fmv = FileMappedVector::<Elem>::open(&path, opts());
        fmv.append(&Elem { a: 1, b: 1 });
    }

    // Zero out the magic bytes to simulate corruption.
    {
        use std::io::{Seek, SeekFrom, Write};
        let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(&[0u8; 8]).unwrap();
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        FileMappedVector::<Elem>::open(&path, opts())
    }));
    assert!(result.is_err(), "opening a file with a bad magic must panic");
}

#[test]
fn try_open_reports_bad_magic_without_panicking() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    {
        let mut fmv = FileMappedVector::<Elem>::open(&path, opts());
        fmv.append(&Elem { a: 1, b: 1 });
    }

    {
        use std::io::{Seek, SeekFrom, Write};
        let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(&[0u8; 8]).unwrap();
    }

    let err = FileMappedVector::<Elem>::try_open(path, opts()).unwrap_err();
    assert!(matches!(err, Error::BadMagic { .. }));
}

#[test]
fn truncated_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t");
    std::fs::write(&path, [0u8; 10]).unwrap();

    let err = FileMappedVector::<Elem>::try_open(path, opts()).unwrap_err();
    assert!(matches!(err, Error::Truncated { .. }));
}
