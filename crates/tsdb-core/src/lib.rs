//! # tsdb-core
//!
//! An embeddable, memory-mapped time-series store.
//!
//! A [`Database`] owns a directory of named [`Table`]s, each an
//! append-only, strictly time-ordered sequence of fixed-size rows backed
//! by a single memory-mapped file. Tables never remap on growth: the
//! backing file's virtual address range is reserved up front, so a
//! pointer returned by [`Table::get`] stays valid for the table's entire
//! lifetime, including across later appends.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tsdb_core::Database;
//!
//! let db = Database::open("./data");
//! let readings = db.get_table::<f64>("readings");
//! readings.lock().append(1, 98.6);
//! let recent = readings.lock().reduce(0, 100, 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod database;
pub mod error;
pub mod fmv;
pub mod table;

#[cfg(test)]
mod fmv_tests;

pub use config::FmvOptions;
pub use database::Database;
pub use error::{Error, Result};
pub use table::{Entry, Table};
