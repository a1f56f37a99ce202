//! A directory of named, independently-typed tables.

use crate::config::FmvOptions;
use crate::error::Error;
use crate::table::Table;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A type-erased handle to one table, stored in [`Database::tables`].
///
/// Only `sync` needs to be callable without knowing `T`; retrieving the
/// typed handle back out goes through `Any` downcasting in
/// [`Database::get_table`].
trait ErasedTable: Any + Send + Sync {
    fn sync(&self);
    fn as_any(&self) -> &dyn Any;
    fn element_stride(&self) -> usize;
}

struct TableSlot<T: Copy> {
    inner: Arc<Mutex<Table<T>>>,
}

impl<T: Copy + Send + 'static> ErasedTable for TableSlot<T> {
    fn sync(&self) {
        self.inner.lock().sync();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn element_stride(&self) -> usize {
        std::mem::size_of::<T>()
    }
}

/// An embeddable store of named, strictly time-ordered tables.
///
/// Each table is backed by its own file under `dir`, named after the
/// table. Tables are created lazily on first [`get_table`](Self::get_table)
/// call and cached for the database's lifetime; requesting the same name
/// again with a different element type is a programming error and panics,
/// exactly as reopening a [`crate::fmv::FileMappedVector`] under the wrong
/// stride does.
pub struct Database {
    dir: PathBuf,
    options: FmvOptions,
    tables: RwLock<HashMap<String, Box<dyn ErasedTable>>>,
}

impl Database {
    /// Opens a database directory, creating it if necessary, using
    /// default table options.
    #[must_use]
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_options(dir, FmvOptions::default())
    }

    /// Opens a database directory with explicit table options applied to
    /// every table it creates.
    #[must_use]
    pub fn with_options<P: AsRef<Path>>(dir: P, options: FmvOptions) -> Self {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .unwrap_or_else(|e| panic!("database: could not create directory {dir:?}: {e}"));

        Self {
            dir,
            options,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a shared handle to the named table, opening its backing
    /// file on first use.
    ///
    /// # Panics
    ///
    /// Panics if `name` already names a table of a different element
    /// type — a table file's stride is fixed for its lifetime, and mixing
    /// element types under one name is a caller bug, not a recoverable
    /// runtime condition.
    #[must_use]
    pub fn get_table<T: Copy + Send + 'static>(&self, name: &str) -> Arc<Mutex<Table<T>>> {
        if let Some(handle) = self.lookup::<T>(name) {
            return handle;
        }

        let mut tables = self.tables.write();
        // Another thread may have created it while we waited for the lock.
        if let Some(erased) = tables.get(name) {
            return Self::downcast::<T>(erased.as_ref(), name);
        }

        let path = self.dir.join(name);
        let table = Table::<T>::open(&path, self.options);
        let slot = TableSlot {
            inner: Arc::new(Mutex::new(table)),
        };
        let handle = Arc::clone(&slot.inner);
        tables.insert(name.to_string(), Box::new(slot));
        handle
    }

    fn lookup<T: Copy + Send + 'static>(&self, name: &str) -> Option<Arc<Mutex<Table<T>>>> {
        let tables = self.tables.read();
        tables
            .get(name)
            .map(|erased| Self::downcast::<T>(erased.as_ref(), name))
    }

    fn downcast<T: Copy + Send + 'static>(
        erased: &dyn ErasedTable,
        name: &str,
    ) -> Arc<Mutex<Table<T>>> {
        erased
            .as_any()
            .downcast_ref::<TableSlot<T>>()
            .unwrap_or_else(|| {
                let err = Error::TypeMismatch {
                    name: name.to_string(),
                    expected: erased.element_stride(),
                    actual: std::mem::size_of::<T>(),
                };
                panic!("database: {err}");
            })
            .inner
            .clone()
    }

    /// Schedules an asynchronous flush of every table currently open.
    pub fn sync(&self) {
        let tables = self.tables.read();
        for erased in tables.values() {
            erased.sync();
        }
    }
}
