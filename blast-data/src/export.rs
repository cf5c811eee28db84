//! CSV export of aggregated series and filtered records.
//!
//! # CSV Formats
//!
//! - **Series**: `bucket,label,<measure...>,count`, null values as empty cells
//! - **Records**: `date,mine_name,pit_name,zone_name,bench_name,rock_name,<measures...>`

use crate::aggregate::{AggregatedPoint, MeasureSpec};
use blast_core::record::{BlastRecord, Measure};
use csv::Writer;
use std::io::Write;

fn number_cell(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

/// Write an aggregated series, one row per point.
pub fn write_points_csv<W: Write>(
    writer: W,
    specs: &[MeasureSpec],
    points: &[AggregatedPoint],
) -> csv::Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let mut header = vec!["bucket".to_string(), "label".to_string()];
    header.extend(specs.iter().map(|s| s.measure.name().to_string()));
    header.push("count".to_string());
    wtr.write_record(&header)?;

    for point in points {
        let mut row = vec![point.key.to_string(), point.label.clone()];
        row.extend((0..specs.len()).map(|i| number_cell(point.value_at(i))));
        row.push(point.count.to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records with a fixed column order.
pub fn write_records_csv<W: Write>(writer: W, records: &[BlastRecord]) -> csv::Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let mut header = vec![
        "date",
        "mine_name",
        "pit_name",
        "zone_name",
        "bench_name",
        "rock_name",
    ];
    header.extend(Measure::ALL.iter().map(|m| m.name()));
    wtr.write_record(&header)?;

    for record in records {
        let mut row: Vec<String> = [
            &record.date,
            &record.mine_name,
            &record.pit_name,
            &record.zone_name,
            &record.bench_name,
            &record.rock_name,
        ]
        .iter()
        .map(|v| v.as_deref().unwrap_or_default().to_string())
        .collect();
        row.extend(Measure::ALL.iter().map(|m| number_cell(record.measure(*m))));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}
