//! `export`: write the filtered records to CSV.

use crate::args::SourceArgs;
use anyhow::Context;
use blast_core::filter::apply_filter;
use blast_data::export::write_records_csv;
use log::info;
use std::fs::File;
use std::path::Path;

pub async fn run_export(source: &SourceArgs, output: &Path) -> anyhow::Result<()> {
    let records = source.load_records().await?;
    let filtered = apply_filter(&records, &source.selection());
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_records_csv(file, &filtered)?;
    info!(
        "Exported {} of {} records to {}",
        filtered.len(),
        records.len(),
        output.display()
    );
    Ok(())
}
