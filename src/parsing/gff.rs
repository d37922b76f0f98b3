use anyhow::Context;
use log::debug;
use rustc_hash::FxHashMap as HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parsing::DecodeError;

/// Reference genome identity from a GFF annotation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomeVersion {
    /// Sequence accession, e.g. NC_000962.3
    pub accession: String,
    /// Strain or genome name
    pub name: String
}

/// Reads the reference accession and genome name from a GFF file.
/// The accession comes from `##sequence-region`, the name from the `strain` (or `Name`) attribute of the `region` feature.
/// # Arguments
/// * `filename` - the GFF file
/// # Errors
/// * if the file cannot be read
/// * if neither a sequence region nor a region feature is present
pub fn load_genome_version(filename: &Path) -> anyhow::Result<GenomeVersion> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader = BufReader::new(file);

    let mut accession: Option<String> = None;
    let mut name: Option<String> = None;
    for line in reader.lines() {
        let line = line.with_context(|| format!("Error while reading {filename:?}:"))?;
        if line.starts_with("##sequence-region") {
            if accession.is_none() {
                accession = line.split_whitespace().nth(1).map(|s| s.to_string());
            }
            continue;
        }
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 || fields[2] != "region" {
            continue;
        }
        let attributes = parse_attributes(fields[8]);
        name = attributes.get("strain")
            .or_else(|| attributes.get("Name"))
            .map(|s| s.to_string());
        if accession.is_none() {
            accession = Some(fields[0].to_string());
        }
        // the first region describes the genome
        break;
    }

    let accession = accession.ok_or_else(|| DecodeError::MissingField { field: "##sequence-region".to_string() })
        .with_context(|| format!("Error while parsing {filename:?}:"))?;
    let name = name.unwrap_or_else(|| accession.clone());
    debug!("Found reference genome {name} ({accession}) in {filename:?}");
    Ok(GenomeVersion { accession, name })
}

/// Splits a GFF3 attribute column into key/value pairs
fn parse_attributes(column: &str) -> HashMap<&str, &str> {
    column.split(';')
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}
