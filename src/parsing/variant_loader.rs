use anyhow::Context;
use log::{debug, warn};
use noodles::vcf;
use noodles::vcf::header::record::value::Collection;
use noodles::vcf::variant::record_buf::info::field::Value as InfoValue;
use noodles::vcf::variant::record_buf::samples::sample::value::Array as SampleArray;
use noodles::vcf::variant::record_buf::samples::sample::Value as SampleValue;
use noodles_util::variant::io::Reader as VcfReader;
use noodles_util::variant::io::reader::Builder as VcfBuilder;
use std::io::BufRead;
use std::path::Path;

use crate::data_types::records::{VariantDetails, VariantRecord, VariantSubtype, VariantType};
use crate::parsing::mutation_notation::depth_and_frequency;
use crate::parsing::DecodeError;

/// Opens a VCF or BCF file, compressed or not, and reads the header
pub(crate) fn open_vcf(filename: &Path) -> anyhow::Result<(VcfReader<Box<dyn BufRead>>, vcf::Header)> {
    #[allow(clippy::default_constructed_unit_structs)]
    let mut vcf_reader = VcfBuilder::default()
        .build_from_path(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let vcf_header = vcf_reader.read_header()
        .with_context(|| format!("Error while reading header of {filename:?}:"))?;
    Ok((vcf_reader, vcf_header))
}

/// Loads all variants from a VCF file.
/// Returns `None` if the file has a header but no records.
/// # Arguments
/// * `filename` - the VCF file to load
/// # Errors
/// * if the file cannot be opened or parsed
/// * if a record has a variant type that cannot be mapped, see `classify_variant`
pub fn load_variants(filename: &Path) -> anyhow::Result<Option<Vec<VariantRecord>>> {
    let (mut vcf_reader, vcf_header) = open_vcf(filename)?;
    let first_record = vcf_reader.records(&vcf_header)
        .next()
        .transpose()
        .with_context(|| format!("Error while reading {filename:?}:"))?;
    if first_record.is_none() {
        warn!("Variant file {filename:?} does not include any variants");
        return Ok(None);
    }

    // reopen so the first record is included
    let (mut vcf_reader, vcf_header) = open_vcf(filename)?;
    let caller = variant_caller(&vcf_header);
    debug!("Variant caller for {filename:?}: {caller:?}");

    let mut variants = vec![];
    for result in vcf_reader.records(&vcf_header) {
        let record = result.with_context(|| format!("Error while reading {filename:?}:"))?;
        let record_buf = vcf::variant::RecordBuf::try_from_variant_record(&vcf_header, record.as_ref())
            .with_context(|| format!("Error while reading {filename:?}:"))?;
        let variant = convert_record(&record_buf, caller.as_deref())
            .with_context(|| format!("Error while parsing {record_buf:?}:"))?;
        variants.push(variant);
    }
    debug!("Loaded {} variants from {filename:?}", variants.len());
    Ok(Some(variants))
}

/// The variant caller named by the `##source` header line
fn variant_caller(vcf_header: &vcf::Header) -> Option<String> {
    vcf_header.other_records()
        .iter()
        .find(|(key, _)| key.as_ref() == "source")
        .and_then(|(_, collection)| match collection {
            Collection::Unstructured(values) => values.first().cloned(),
            Collection::Structured(_) => None
        })
}

/// Maps an SV type tag (SVTYPE, or a symbolic ALT such as `<DEL>`) to a subtype
fn sv_subtype(field: &str, tag: &str) -> Result<VariantSubtype, DecodeError> {
    let subtype = match tag.to_ascii_uppercase().as_str() {
        "DEL" => VariantSubtype::Deletion,
        "INS" => VariantSubtype::Insertion,
        "DUP" => VariantSubtype::Duplication,
        "INV" => VariantSubtype::Inversion,
        "BND" | "TRA" => VariantSubtype::Translocation,
        _ => return Err(DecodeError::UnknownVariantType { field: field.to_string(), value: tag.to_string() })
    };
    Ok(subtype)
}

/// Classifies a record by its SV type, or by its alleles for small variants.
/// # Arguments
/// * `ref_allele` - REF
/// * `alt_allele` - the first ALT
/// * `sv_type` - the SVTYPE INFO field, if any
/// # Errors
/// * if the SV type or the symbolic ALT is not a known structural variant type
pub fn classify_variant(ref_allele: &str, alt_allele: &str, sv_type: Option<&str>) -> Result<(VariantType, Option<VariantSubtype>), DecodeError> {
    if let Some(tag) = sv_type {
        return Ok((VariantType::Sv, Some(sv_subtype("SVTYPE", tag)?)));
    }
    if let Some(symbolic) = alt_allele.strip_prefix('<').and_then(|a| a.strip_suffix('>')) {
        // e.g. <DUP:TANDEM>
        let tag = symbolic.split(':').next().unwrap_or_default();
        return Ok((VariantType::Sv, Some(sv_subtype("ALT", tag)?)));
    }
    if ref_allele.is_empty() || alt_allele.is_empty() || alt_allele == "." {
        return Err(DecodeError::UnknownVariantType { field: "ALT".to_string(), value: alt_allele.to_string() });
    }

    let classified = match (ref_allele.len(), alt_allele.len()) {
        (1, 1) => {
            let subtype = if is_transition(ref_allele, alt_allele) {
                VariantSubtype::Transition
            } else {
                VariantSubtype::Transversion
            };
            (VariantType::Snv, Some(subtype))
        },
        (r, a) if r == a => (VariantType::Mnv, Some(VariantSubtype::Substitution)),
        (r, a) if r > a => (VariantType::Deletion, Some(VariantSubtype::Deletion)),
        _ => (VariantType::Insertion, Some(VariantSubtype::Insertion))
    };
    Ok(classified)
}

/// Purine to purine or pyrimidine to pyrimidine
fn is_transition(ref_allele: &str, alt_allele: &str) -> bool {
    matches!(
        (ref_allele.to_ascii_uppercase().as_str(), alt_allele.to_ascii_uppercase().as_str()),
        ("A", "G") | ("G", "A") | ("C", "T") | ("T", "C")
    )
}

/// `None` if no filters were applied, otherwise whether the record passed them
fn passed_filters(record: &vcf::variant::RecordBuf) -> Option<bool> {
    let filters = record.filters().as_ref();
    if filters.is_empty() {
        None
    } else {
        Some(filters.contains("PASS"))
    }
}

fn info_string(record: &vcf::variant::RecordBuf, key: &str) -> Option<String> {
    match record.info().get(key) {
        Some(Some(InfoValue::String(s))) => Some(s.clone()),
        _ => None
    }
}

fn info_integer(record: &vcf::variant::RecordBuf, key: &str) -> Option<i64> {
    match record.info().get(key) {
        Some(Some(InfoValue::Integer(i))) => Some(i64::from(*i)),
        _ => None
    }
}

/// Read counts can not be negative, a negative value makes the whole field unusable
fn read_count(key: &str, value: i32) -> Option<u64> {
    match u64::try_from(value) {
        Ok(count) => Some(count),
        Err(_) => {
            warn!("Ignoring FORMAT/{key} with negative value {value}");
            None
        }
    }
}

/// Integer FORMAT values of the first sample, missing entries are skipped
fn sample_integers(record: &vcf::variant::RecordBuf, key: &str) -> Option<Vec<u64>> {
    let sample = record.samples().get_index(0)?;
    match sample.get(key) {
        Some(Some(SampleValue::Integer(i))) => read_count(key, *i).map(|count| vec![count]),
        Some(Some(SampleValue::Array(SampleArray::Integer(values)))) => values.iter()
            .flatten()
            .map(|i| read_count(key, *i))
            .collect(),
        _ => None
    }
}

/// A numeric FORMAT value of the first sample; for arrays the first value is used
fn sample_float(record: &vcf::variant::RecordBuf, key: &str) -> Option<f64> {
    let sample = record.samples().get_index(0)?;
    match sample.get(key) {
        Some(Some(SampleValue::Float(f))) => Some(f64::from(*f)),
        Some(Some(SampleValue::Integer(i))) => Some(f64::from(*i)),
        Some(Some(SampleValue::Array(SampleArray::Float(values)))) => values.iter().flatten().next().map(|f| f64::from(*f)),
        _ => None
    }
}

/// Read support from allele depths (AD) or, for paired-end SV callers, reference/variant pair counts (DR/DV)
fn depth_and_frequency_from_samples(record: &vcf::variant::RecordBuf) -> (Option<f64>, Option<f64>) {
    let allele_counts = sample_integers(record, "AD")
        .filter(|counts| !counts.is_empty())
        .map(|counts| (counts[0], counts[1..].iter().sum()))
        .or_else(|| {
            let ref_pairs = sample_integers(record, "DR")?.first().copied()?;
            let alt_pairs = sample_integers(record, "DV")?.first().copied()?;
            Some((ref_pairs, alt_pairs))
        });

    let (counted_depth, counted_frequency) = match allele_counts {
        Some((ref_count, alt_count)) => {
            let (depth, frequency) = depth_and_frequency(ref_count, alt_count);
            (Some(depth), frequency)
        },
        None => (None, None)
    };

    let depth = sample_integers(record, "DP")
        .and_then(|dp| dp.first().map(|d| *d as f64))
        .or(counted_depth);
    let frequency = sample_float(record, "AF").or(counted_frequency);
    (depth, frequency)
}

/// The 1-based inclusive span of a record; INFO/END when present, otherwise the extent of REF
/// # Errors
/// * if the record has no position
pub fn record_span(record: &vcf::variant::RecordBuf) -> Result<(i64, i64), DecodeError> {
    let position = record.variant_start()
        .ok_or_else(|| DecodeError::MissingField { field: "POS".to_string() })?
        .get() as i64;
    let end = info_integer(record, "END")
        .unwrap_or(position + record.reference_bases().len().max(1) as i64 - 1)
        .max(position);
    Ok((position, end))
}

/// Converts a parsed VCF record into a canonical variant
/// # Arguments
/// * `record` - the parsed record
/// * `caller` - the variant caller from the file header, used when the record has no SVMETHOD
pub fn convert_record(record: &vcf::variant::RecordBuf, caller: Option<&str>) -> Result<VariantRecord, DecodeError> {
    let (position, end) = record_span(record)?;
    let ref_nt = record.reference_bases().to_string();
    let alt_nt = record.alternate_bases().as_ref()
        .first()
        .cloned()
        .unwrap_or_default();

    let sv_type = info_string(record, "SVTYPE");
    let (variant_type, variant_subtype) = classify_variant(&ref_nt, &alt_nt, sv_type.as_deref())?;

    let (depth, frequency) = depth_and_frequency_from_samples(record);
    let method = info_string(record, "SVMETHOD")
        .or_else(|| caller.map(|c| c.to_string()));

    Ok(VariantRecord {
        variant_type,
        variant_subtype,
        phenotypes: vec![],
        gene_symbol: record.reference_sequence_name().to_string(),
        accession: None,
        position,
        end: Some(end),
        ref_nt,
        alt_nt,
        ref_aa: None,
        alt_aa: None,
        depth,
        frequency,
        method,
        passed_qc: passed_filters(record),
        details: VariantDetails::Vcf {
            quality: record.quality_score().map(f64::from),
            genotype_confidence: sample_float(record, "GQ")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use std::path::PathBuf;

    use crate::data_types::validation::{validate_all, Validate};

    #[test]
    fn test_load_snv() {
        let variants = load_variants(&PathBuf::from("test_data/vcf/snv.vcf")).unwrap().unwrap();
        assert!(validate_all("snv_variants", &variants).is_ok());
        assert_eq!(variants.len(), 4);

        let first = &variants[0];
        assert_eq!(first.gene_symbol, "NC_000962.3");
        assert_eq!(first.position, 7362);
        assert_eq!(first.variant_type, VariantType::Snv);
        assert_eq!(first.variant_subtype, Some(VariantSubtype::Transversion));
        assert_eq!(first.passed_qc, Some(true));
        assert_eq!(first.method.as_deref(), Some("freeBayes v1.3.6"));

        // no filter information at all
        let second = &variants[1];
        assert_eq!(second.passed_qc, None);
        assert_eq!(second.variant_subtype, Some(VariantSubtype::Transition));
        assert_approx_eq!(second.depth.unwrap(), 40.0);
        assert_approx_eq!(second.frequency.unwrap(), 0.95);
        match &second.details {
            VariantDetails::Vcf { genotype_confidence, .. } => { assert_approx_eq!(genotype_confidence.unwrap(), 155.0); }
            other => panic!("unexpected details: {other:?}")
        }

        let third = &variants[2];
        assert_eq!(third.variant_type, VariantType::Mnv);
        assert_eq!(third.passed_qc, Some(false));

        let fourth = &variants[3];
        assert_eq!(fourth.variant_type, VariantType::Deletion);
        assert_eq!(fourth.end, Some(4247431));
    }

    #[test]
    fn test_load_sv() {
        let variants = load_variants(&PathBuf::from("test_data/vcf/sv.vcf")).unwrap().unwrap();
        assert!(validate_all("sv_variants", &variants).is_ok());
        assert_eq!(variants.len(), 2);

        let deletion = &variants[0];
        assert_eq!(deletion.variant_type, VariantType::Sv);
        assert_eq!(deletion.variant_subtype, Some(VariantSubtype::Deletion));
        assert_eq!(deletion.end, Some(2500));
        assert_eq!(deletion.method.as_deref(), Some("EMBL.DELLYv1.1.6"));
        assert_approx_eq!(deletion.depth.unwrap(), 20.0);
        assert_approx_eq!(deletion.frequency.unwrap(), 0.75);

        // no supporting pairs, frequency is undefined
        let inversion = &variants[1];
        assert_eq!(inversion.variant_subtype, Some(VariantSubtype::Inversion));
        assert_eq!(inversion.passed_qc, Some(false));
        assert_eq!(inversion.frequency, None);
        assert!(inversion.validate("sv_variants[1]").is_ok());
    }

    #[test]
    fn test_negative_read_counts() {
        let variants = load_variants(&PathBuf::from("test_data/vcf/negative_counts.vcf")).unwrap().unwrap();
        // negative DP falls back to the allele depths
        assert_approx_eq!(variants[0].depth.unwrap(), 40.0);
        assert_approx_eq!(variants[0].frequency.unwrap(), 0.95);
        // negative AD leaves only DP
        assert_approx_eq!(variants[1].depth.unwrap(), 12.0);
        assert_eq!(variants[1].frequency, None);
        assert_eq!(read_count("DP", -1), None);
        assert_eq!(read_count("DP", 3), Some(3));
    }

    #[test]
    fn test_empty_vcf() {
        assert_eq!(load_variants(&PathBuf::from("test_data/vcf/empty.vcf")).unwrap(), None);
    }

    #[test]
    fn test_unknown_sv_type() {
        let err = load_variants(&PathBuf::from("test_data/vcf/unknown_svtype.vcf")).unwrap_err();
        let decode_err = err.downcast_ref::<DecodeError>().unwrap();
        assert_eq!(decode_err, &DecodeError::UnknownVariantType { field: "SVTYPE".to_string(), value: "XYZ".to_string() });
    }

    #[test]
    fn test_classify_variant() {
        assert_eq!(classify_variant("A", "G", None).unwrap(), (VariantType::Snv, Some(VariantSubtype::Transition)));
        assert_eq!(classify_variant("A", "ATT", None).unwrap(), (VariantType::Insertion, Some(VariantSubtype::Insertion)));
        assert_eq!(classify_variant("N", "<DUP:TANDEM>", None).unwrap(), (VariantType::Sv, Some(VariantSubtype::Duplication)));
        assert!(classify_variant("N", "<CNV>", None).is_err());
        assert!(classify_variant("A", ".", None).is_err());
    }
}
