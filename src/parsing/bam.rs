use anyhow::{anyhow, Context};
use log::debug;
use std::path::Path;

/// Returns the name of the first reference sequence (`@SQ`) in a BAM header.
/// # Arguments
/// * `filename` - the read mapping
/// # Errors
/// * if the file cannot be opened or the header is malformed
/// * if the header has no reference sequences
pub fn reference_accession(filename: &Path) -> anyhow::Result<String> {
    #[allow(clippy::default_constructed_unit_structs)]
    let mut bam_reader = noodles::bam::io::reader::Builder::default()
        .build_from_path(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let header = bam_reader.read_header()
        .with_context(|| format!("Error while reading header of {filename:?}:"))?;

    let accession = header.reference_sequences()
        .keys()
        .next()
        .ok_or(anyhow!("No reference sequences found in the header of {filename:?}"))?
        .to_string();
    debug!("Read mapping {filename:?} uses reference {accession}");
    Ok(accession)
}
