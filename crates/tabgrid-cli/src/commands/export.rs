//! `tabgrid export`: system file + scenario file to a table data set.

use anyhow::{Context, Result};
use std::path::Path;
use tabgrid_core::System;
use tabgrid_io::{load_scenario, SiennaExporter};
use tracing::info;

pub fn handle(system: &Path, scenario: &Path, output: Option<&Path>) -> Result<()> {
    let system = System::from_json_file(system)
        .with_context(|| format!("loading system from {}", system.display()))?;
    let scenario_file = scenario;
    let scenario = load_scenario(scenario_file)
        .with_context(|| format!("loading scenario from {}", scenario_file.display()))?;
    info!(
        "Exporting system '{}' ({} components) for scenario '{}'",
        system.name,
        system.len(),
        scenario.name
    );

    let mut exporter =
        SiennaExporter::new(&scenario, &system).context("preparing table export")?;
    if let Some(folder) = output {
        exporter = exporter.with_output_folder(folder);
    }
    let report = exporter.run().context("exporting tables")?;

    println!(
        "Exported scenario '{}' (year {}) to {}",
        scenario.name,
        exporter.reference_year(),
        exporter.output_folder().display()
    );
    print!("{report}");
    Ok(())
}
