//! CSV export for a table.

use crate::record::Reading;
use std::path::Path;
use tsdb_core::Table;

/// Writes every row of `table` to `path` as CSV with columns
/// `timestamp,tag,value`.
pub fn write_csv(table: &Table<Reading>, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["timestamp", "tag", "value"])?;

    for i in 0..table.size() {
        // SAFETY: i < table.size().
        let entry = unsafe { *table.get(i) };
        writer.write_record(&[
            entry.timestamp.to_string(),
            entry.value.tag.to_string(),
            entry.value.value.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
