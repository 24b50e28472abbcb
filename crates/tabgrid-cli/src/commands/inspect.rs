//! `tabgrid inspect`: component counts of a system file.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tabgrid_cli::InspectFormat;
use tabgrid_core::{System, SystemStats};
use tabwriter::TabWriter;

pub fn handle(system: &Path, format: InspectFormat) -> Result<()> {
    let path = system;
    let system = System::from_json_file(path)
        .with_context(|| format!("loading system from {}", path.display()))?;
    let stats = system.stats();
    match format {
        InspectFormat::Plain => print_table(&system, &stats),
        InspectFormat::Json => print_json(&system, &stats),
    }
}

fn print_table(system: &System, stats: &SystemStats) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "System: {}", system.name)?;
    writeln!(writer, "KIND\tCOUNT")?;
    for (kind, count) in &stats.per_kind {
        writeln!(writer, "{kind}\t{count}")?;
    }
    writeln!(writer, "TOTAL\t{}", stats.total())?;
    writeln!(writer, "time series\t{}", stats.num_time_series)?;
    writer.flush()?;
    Ok(())
}

fn print_json(system: &System, stats: &SystemStats) -> Result<()> {
    let per_kind: serde_json::Map<String, serde_json::Value> = stats
        .per_kind
        .iter()
        .map(|(kind, count)| (kind.to_string(), json!(count)))
        .collect();
    let summary = json!({
        "name": system.name,
        "components": stats.total(),
        "per_kind": per_kind,
        "time_series": stats.num_time_series,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
