//! `options`: list the valid choices for every filter dimension.

use crate::args::SourceArgs;
use blast_core::filter::resolve_options;
use log::info;

pub async fn run_options(source: &SourceArgs) -> anyhow::Result<()> {
    let records = source.load_records().await?;
    let selection = source.selection();
    let options = resolve_options(&records, &selection);
    info!(
        "Options: {} mines, {} pits, {} zones, {} benches, {} rock types",
        options.mines.len(),
        options.pits.len(),
        options.zones.len(),
        options.benches.len(),
        options.rocks.len()
    );
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}
