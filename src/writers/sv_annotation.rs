use anyhow::Context;
use log::{debug, info};
use noodles::bgzf;
use noodles::vcf;
use noodles::vcf::header::record::value::{Map, map};
use noodles::vcf::variant::io::Write as VcfWrite;
use noodles::vcf::variant::record_buf::info::field::Value as InfoValue;
use rustc_hash::FxHashSet as HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::parsing::sv_annotation::GeneAnnotationIndex;
use crate::parsing::variant_loader::{open_vcf, record_span};

/// INFO key for the overlapping gene names
pub const INFO_KEY_GENE: &str = "gene";
/// INFO key for the overlapping locus tags
pub const INFO_KEY_LOCUS_TAG: &str = "locus_tag";

/// Annotates every record of a structural variant VCF with the genes it overlaps.
/// The output is fully built in memory before anything is written, so a failure never leaves a partial file.
/// A `.gz` output is bgzip compressed and tabix indexed.
/// # Arguments
/// * `vcf_fn` - the structural variant calls
/// * `annotation` - the gene lookup
/// * `out_fn` - the output VCF
/// # Errors
/// * if the VCF cannot be read or the output cannot be written
/// * if a chromosome is missing from a multi-chromosome annotation
pub fn annotate_sv_vcf(vcf_fn: &Path, annotation: &GeneAnnotationIndex, out_fn: &Path) -> anyhow::Result<usize> {
    let (mut vcf_reader, mut vcf_header) = open_vcf(vcf_fn)?;

    let ver: &str = crate::cli::core::FULL_VERSION.as_str();
    let cli_version = format!("\"{ver}\"");
    let cli_string = format!("\"{}\"", std::env::args().collect::<Vec<String>>().join(" "));
    vcf_header.insert("prp_version".parse()?, vcf::header::record::Value::from(cli_version))?;
    vcf_header.insert("prp_command".parse()?, vcf::header::record::Value::from(cli_string))?;

    let info_header = [
        (
            INFO_KEY_GENE.to_string(),
            Map::<map::Info>::new(map::info::Number::Unknown, map::info::Type::String, "Overlapping gene")
        ),
        (
            INFO_KEY_LOCUS_TAG.to_string(),
            Map::<map::Info>::new(map::info::Number::Unknown, map::info::Type::String, "Overlapping locus tag")
        )
    ];
    for (header_key, header_value) in info_header.iter() {
        vcf_header.infos_mut().insert(header_key.clone(), header_value.clone());
    }

    let mut vcf_writer = vcf::io::Writer::new(Vec::new());
    vcf_writer.write_header(&vcf_header)?;

    let mut checked_chroms: HashSet<String> = Default::default();
    let mut num_records = 0;
    let mut num_annotated = 0;
    for result in vcf_reader.records(&vcf_header) {
        let record = result.with_context(|| format!("Error while reading {vcf_fn:?}:"))?;
        let mut record_buf = vcf::variant::RecordBuf::try_from_variant_record(&vcf_header, record.as_ref())
            .with_context(|| format!("Error while reading {vcf_fn:?}:"))?;

        let chrom = record_buf.reference_sequence_name().to_string();
        if !checked_chroms.contains(&chrom) {
            annotation.check_chromosome(&chrom)?;
            checked_chroms.insert(chrom.clone());
        }

        let (first, last) = record_span(&record_buf)
            .with_context(|| format!("Error while parsing {record_buf:?}:"))?;
        let overlaps = annotation.overlaps(&chrom, first, last)?;
        if !overlaps.is_empty() {
            let genes: Vec<Option<String>> = overlaps.iter().map(|f| Some(f.gene.clone())).collect();
            let locus_tags: Vec<Option<String>> = overlaps.iter().map(|f| Some(f.locus_tag.clone())).collect();
            let info = record_buf.info_mut();
            info.insert(INFO_KEY_GENE.to_string(), Some(InfoValue::from(genes)));
            info.insert(INFO_KEY_LOCUS_TAG.to_string(), Some(InfoValue::from(locus_tags)));
            num_annotated += 1;
        }

        vcf_writer.write_variant_record(&vcf_header, &record_buf)?;
        num_records += 1;
    }
    debug!("Annotated {num_annotated} of {num_records} records from {vcf_fn:?}");

    write_output(&vcf_writer.into_inner(), out_fn)?;
    info!("Wrote {num_records} annotated structural variants to {out_fn:?}");
    Ok(num_annotated)
}

/// Writes a finished VCF, bgzip compressing and indexing it if the filename ends in .gz
fn write_output(buffer: &[u8], out_fn: &Path) -> anyhow::Result<()> {
    let is_compressed = out_fn.extension().unwrap_or_default() == "gz";
    if is_compressed {
        let file = File::create(out_fn)
            .with_context(|| format!("Error while creating {out_fn:?}:"))?;
        let mut bgzf_writer = bgzf::io::Writer::new(file);
        bgzf_writer.write_all(buffer)
            .with_context(|| format!("Error while writing {out_fn:?}:"))?;
        bgzf_writer.finish()
            .with_context(|| format!("Error while finishing {out_fn:?}:"))?;
        crate::writers::noodles_idx::index_vcf(out_fn)
            .with_context(|| format!("Error while indexing {out_fn:?}:"))?;
    } else {
        std::fs::write(out_fn, buffer)
            .with_context(|| format!("Error while writing {out_fn:?}:"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_annotate_single_chromosome() {
        let annotation = GeneAnnotationIndex::from_bed(&PathBuf::from("test_data/annotation/single_chrom.bed")).unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let out_fn = out_dir.path().join("annotated.vcf");

        let num_annotated = annotate_sv_vcf(&PathBuf::from("test_data/vcf/sv.vcf"), &annotation, &out_fn).unwrap();
        assert_eq!(num_annotated, 2);

        let contents = std::fs::read_to_string(&out_fn).unwrap();
        assert!(contents.contains("##INFO=<ID=gene,"));
        assert!(contents.contains("##INFO=<ID=locus_tag,"));
        assert!(contents.contains("gene=dnaA,dnaN;locus_tag=Rv0001,Rv0002"));
        assert!(contents.contains("gene=gyrB;locus_tag=Rv0005"));
    }

    #[test]
    fn test_annotate_compressed() {
        let annotation = GeneAnnotationIndex::from_bed(&PathBuf::from("test_data/annotation/multi_chrom.bed")).unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let out_fn = out_dir.path().join("annotated.vcf.gz");

        // only the deletion overlaps a gene on the matching chromosome
        let num_annotated = annotate_sv_vcf(&PathBuf::from("test_data/vcf/sv.vcf"), &annotation, &out_fn).unwrap();
        assert_eq!(num_annotated, 1);
        assert!(out_dir.path().join("annotated.vcf.gz.tbi").exists());
    }

    #[test]
    fn test_annotate_missing_chromosome() {
        let annotation = GeneAnnotationIndex::from_bed(&PathBuf::from("test_data/annotation/unrelated.bed")).unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let out_fn = out_dir.path().join("annotated.vcf");

        let result = annotate_sv_vcf(&PathBuf::from("test_data/vcf/sv.vcf"), &annotation, &out_fn);
        assert!(result.is_err());
        assert!(!out_fn.exists());
    }
}
