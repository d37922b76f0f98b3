use anyhow::Context;
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::data_types::species::{SpeciesHit, SpeciesPrediction};

/// One row of a Bracken abundance table
#[derive(Debug, Deserialize)]
struct BrackenRow {
    name: String,
    taxonomy_id: u64,
    taxonomy_lvl: Option<String>,
    kraken_assigned_reads: u64,
    added_reads: u64,
    fraction_total_reads: f64
}

/// Parses a Bracken abundance table, most abundant species first
/// # Errors
/// * if the file cannot be read or a row is malformed
pub fn parse_bracken(filename: &Path) -> anyhow::Result<SpeciesPrediction> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;

    let mut hits = vec![];
    for (row_index, result) in csv_reader.deserialize().enumerate() {
        let row: BrackenRow = result
            .with_context(|| format!("Error while parsing row {} of {filename:?}:", row_index + 1))?;
        hits.push(SpeciesHit {
            scientific_name: row.name.trim().to_string(),
            taxonomy_id: row.taxonomy_id,
            taxonomy_lvl: row.taxonomy_lvl,
            kraken_assigned_reads: row.kraken_assigned_reads,
            added_reads: row.added_reads,
            fraction_total_reads: row.fraction_total_reads
        });
    }
    hits.sort_by(|a, b| b.fraction_total_reads.total_cmp(&a.fraction_total_reads));
    debug!("Loaded {} species hits from {filename:?}", hits.len());

    Ok(SpeciesPrediction {
        software: "bracken".to_string(),
        hits
    })
}
