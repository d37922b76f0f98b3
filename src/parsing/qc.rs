use anyhow::Context;
use log::debug;
use rustc_hash::FxHashMap as HashMap;
use std::path::Path;

use crate::data_types::qc::{PostAlignQcResult, QcMethodResult, QcResult, QcSoftware, QuastQcResult};
use crate::parsing::DecodeError;
use crate::util::json_io::load_json;

/// QUAST report rows keyed by their label, e.g. `Total length` or `GC (%)`
struct QuastRows {
    rows: HashMap<String, String>
}

impl QuastRows {
    fn required<T: std::str::FromStr>(&self, label: &str) -> Result<T, DecodeError> {
        self.optional(label)?
            .ok_or_else(|| DecodeError::MissingField { field: label.to_string() })
    }

    fn optional<T: std::str::FromStr>(&self, label: &str) -> Result<Option<T>, DecodeError> {
        match self.rows.get(label) {
            Some(value) => value.parse::<T>()
                .map(Some)
                .map_err(|_| DecodeError::InvalidValue { field: label.to_string(), value: value.clone() }),
            None => Ok(None)
        }
    }
}

/// Parses a QUAST `report.tsv` with a single assembly column
/// # Errors
/// * if the file cannot be read
/// * if a required row is missing or not numeric
pub fn parse_quast(filename: &Path) -> anyhow::Result<QcMethodResult> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;

    let mut rows: HashMap<String, String> = Default::default();
    for result in csv_reader.records() {
        let row = result.with_context(|| format!("Error while reading {filename:?}:"))?;
        if let (Some(label), Some(value)) = (row.get(0), row.get(1)) {
            rows.insert(label.trim().to_string(), value.trim().to_string());
        }
    }
    let rows = QuastRows { rows };

    let decode = || -> Result<QuastQcResult, DecodeError> {
        Ok(QuastQcResult {
            total_length: rows.required("Total length")?,
            reference_length: rows.optional("Reference length")?,
            largest_contig: rows.required("Largest contig")?,
            n_contigs: rows.required("# contigs")?,
            n50: rows.required("N50")?,
            ng50: rows.optional("NG50")?,
            assembly_gc: rows.required("GC (%)")?,
            reference_gc: rows.optional("Reference GC (%)")?,
            duplication_ratio: rows.optional("Duplication ratio")?
        })
    };
    let result = decode().with_context(|| format!("Error while parsing {filename:?}:"))?;
    debug!("Loaded QUAST metrics from {filename:?}: {result:?}");

    Ok(QcMethodResult {
        software: QcSoftware::Quast,
        version: None,
        result: QcResult::Quast(result)
    })
}

/// Parses the JSON written by the post-alignment QC step
/// # Errors
/// * if the file cannot be read or is missing required fields
pub fn parse_postalignqc(filename: &Path) -> anyhow::Result<QcMethodResult> {
    let result: PostAlignQcResult = load_json(filename)?;
    debug!("Loaded post-alignment metrics from {filename:?}");
    Ok(QcMethodResult {
        software: QcSoftware::Postalignqc,
        version: None,
        result: QcResult::PostAlign(result)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use std::path::PathBuf;

    use crate::data_types::validation::Validate;

    #[test]
    fn test_quast() {
        let qc = parse_quast(&PathBuf::from("test_data/qc/quast.tsv")).unwrap();
        assert!(qc.validate("qc[0]").is_ok());
        let result = match qc.result {
            QcResult::Quast(r) => r,
            other => panic!("unexpected result: {other:?}")
        };
        // "# contigs (>= 0 bp)" must not be confused with "# contigs"
        assert_eq!(result.n_contigs, 38);
        assert_eq!(result.total_length, 2801234);
        assert_eq!(result.reference_length, Some(2821361));
        assert_approx_eq!(result.assembly_gc, 32.78);
        assert_approx_eq!(result.duplication_ratio.unwrap(), 1.001);
    }

    #[test]
    fn test_quast_without_reference() {
        let qc = parse_quast(&PathBuf::from("test_data/qc/quast_no_reference.tsv")).unwrap();
        let result = match qc.result {
            QcResult::Quast(r) => r,
            other => panic!("unexpected result: {other:?}")
        };
        assert_eq!(result.reference_length, None);
        assert_eq!(result.ng50, None);
        assert_eq!(result.reference_gc, None);
    }

    #[test]
    fn test_quast_malformed() {
        let err = parse_quast(&PathBuf::from("test_data/qc/quast_missing_n50.tsv")).unwrap_err();
        assert_eq!(err.downcast_ref::<DecodeError>(), Some(&DecodeError::MissingField { field: "N50".to_string() }));

        let err = parse_quast(&PathBuf::from("test_data/qc/quast_bad_gc.tsv")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::InvalidValue { field: "GC (%)".to_string(), value: "high".to_string() })
        );
    }

    #[test]
    fn test_postalignqc() {
        let qc = parse_postalignqc(&PathBuf::from("test_data/qc/postalignqc.json")).unwrap();
        assert!(qc.validate("qc[1]").is_ok());
        let result = match qc.result {
            QcResult::PostAlign(r) => r,
            other => panic!("unexpected result: {other:?}")
        };
        assert_eq!(result.pct_above_x.keys().collect::<Vec<_>>(), vec!["1", "10", "30", "100"]);
        assert_eq!(result.n_mapped_reads, 2401877);
    }
}
