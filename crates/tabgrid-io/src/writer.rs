//! Table and JSON file writers.

use crate::error::{ExportError, ExportResult};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tabgrid_core::{Record, Value};

/// Write `records` as CSV to `path` with exactly the columns in `fields`.
///
/// The header is always written, so an empty batch yields a header-only
/// file. Fields that are absent or null get `placeholder`; fields a record
/// carries beyond `fields` are ignored.
///
/// # Errors
///
/// Returns [`ExportError::DataIntegrity`] when a schema field still holds a
/// non-scalar value (a quantity, reference, map or list).
pub fn write_table<S: AsRef<str>>(
    records: &[Record],
    path: &Path,
    fields: &[S],
    placeholder: &str,
) -> ExportResult<()> {
    let file = File::create(path)?;
    write_rows(records, io::BufWriter::new(file), fields, placeholder)
}

/// Write `records` as CSV to any writer.
pub fn write_rows<S: AsRef<str>>(
    records: &[Record],
    writer: impl Write,
    fields: &[S],
    placeholder: &str,
) -> ExportResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let header: Vec<&str> = fields.iter().map(|f| f.as_ref()).collect();
    wtr.write_record(&header)?;

    for record in records {
        let mut row = Vec::with_capacity(fields.len());
        for field in fields {
            row.push(cell(record, field.as_ref(), placeholder)?);
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn cell(record: &Record, field: &str, placeholder: &str) -> ExportResult<String> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(placeholder.to_string()),
        Some(value) => value.to_cell().ok_or_else(|| {
            ExportError::DataIntegrity(format!(
                "field '{field}' of '{}' holds a {} and cannot be written to a table",
                record.get("name").and_then(Value::as_str).unwrap_or("<unnamed>"),
                value.type_name()
            ))
        }),
    }
}

/// Serialize `value` to `path` as JSON indented with four spaces.
pub fn write_json_pretty<T: Serialize + ?Sized>(value: &T, path: &Path) -> ExportResult<()> {
    let file = File::create(path)?;
    let mut buf = io::BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.flush()?;
    Ok(())
}
