//! The example record type the CLI stores — a tagged floating-point reading.
//!
//! This is demonstration glue, not part of the storage engine: any
//! `Copy` type can be a table's element type, and a real embedder defines
//! its own.

/// A single sensor reading: a value with a small numeric tag (e.g. sensor
/// id, channel number).
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Reading {
    /// Caller-defined tag, e.g. a sensor or channel id.
    pub tag: u32,
    /// The measured value.
    pub value: f64,
}
