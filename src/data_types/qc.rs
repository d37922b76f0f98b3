use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data_types::validation::{check_optional_range, check_range, join_path, SchemaError, Validate};

/// Tools reporting QC metrics
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QcSoftware {
    Quast,
    Postalignqc,
    /// Missing loci of the cgMLST profile
    Chewbbaca
}

/// Assembly metrics from QUAST
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuastQcResult {
    pub total_length: u64,
    pub reference_length: Option<u64>,
    pub largest_contig: u64,
    pub n_contigs: u64,
    pub n50: u64,
    pub ng50: Option<u64>,
    /// GC content of the assembly, percent
    pub assembly_gc: f64,
    pub reference_gc: Option<f64>,
    pub duplication_ratio: Option<f64>
}

impl Validate for QuastQcResult {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.largest_contig > self.total_length {
            return Err(SchemaError::InvalidField {
                path: join_path(path, "largest_contig"),
                reason: format!("largest contig ({}) is longer than the assembly ({})", self.largest_contig, self.total_length)
            });
        }
        check_range(&join_path(path, "assembly_gc"), self.assembly_gc, 0.0, 100.0)?;
        check_optional_range(&join_path(path, "reference_gc"), self.reference_gc, 0.0, 100.0)?;
        check_optional_range(&join_path(path, "duplication_ratio"), self.duplication_ratio, 0.0, f64::MAX)
    }
}

/// Read mapping metrics computed against the reference genome
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PostAlignQcResult {
    pub ins_size: Option<f64>,
    pub ins_size_dev: Option<f64>,
    pub mean_cov: f64,
    /// Percent of the reference covered above each depth threshold, keyed by threshold
    pub pct_above_x: IndexMap<String, f64>,
    pub n_reads: u64,
    pub n_mapped_reads: u64,
    pub n_read_pairs: u64,
    pub coverage_uniformity: Option<f64>,
    pub quartile1: f64,
    pub median_cov: f64,
    pub quartile3: f64
}

impl Validate for PostAlignQcResult {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.n_mapped_reads > self.n_reads {
            return Err(SchemaError::InvalidField {
                path: join_path(path, "n_mapped_reads"),
                reason: format!("more mapped reads ({}) than reads ({})", self.n_mapped_reads, self.n_reads)
            });
        }
        check_range(&join_path(path, "mean_cov"), self.mean_cov, 0.0, f64::MAX)?;
        for (threshold, pct) in self.pct_above_x.iter() {
            check_range(&join_path(path, &format!("pct_above_x.{threshold}")), *pct, 0.0, 100.0)?;
        }
        check_optional_range(&join_path(path, "coverage_uniformity"), self.coverage_uniformity, 0.0, 100.0)?;
        if !(self.quartile1 <= self.median_cov && self.median_cov <= self.quartile3) {
            return Err(SchemaError::InvalidField {
                path: join_path(path, "median_cov"),
                reason: "coverage quartiles are not ordered".to_string()
            });
        }
        Ok(())
    }
}

/// Number of cgMLST loci without an allele call
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MissingLociQcResult {
    pub n_missing: u64
}

/// Tool specific QC payload
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QcResult {
    Quast(QuastQcResult),
    PostAlign(PostAlignQcResult),
    MissingLoci(MissingLociQcResult)
}

/// One QC entry of the sample result
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QcMethodResult {
    pub software: QcSoftware,
    pub version: Option<String>,
    pub result: QcResult
}

impl QcMethodResult {
    /// chewBBACA entry with the number of loci that got no allele call
    pub fn missing_loci(n_missing: u64) -> Self {
        Self {
            software: QcSoftware::Chewbbaca,
            version: None,
            result: QcResult::MissingLoci(MissingLociQcResult { n_missing })
        }
    }
}

impl Validate for QcMethodResult {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        let result_path = join_path(path, "result");
        match (&self.software, &self.result) {
            (QcSoftware::Quast, QcResult::Quast(r)) => r.validate(&result_path),
            (QcSoftware::Postalignqc, QcResult::PostAlign(r)) => r.validate(&result_path),
            (QcSoftware::Chewbbaca, QcResult::MissingLoci(_)) => Ok(()),
            (software, _) => Err(SchemaError::InvalidField {
                path: result_path,
                reason: format!("result does not match the {software} output format")
            })
        }
    }
}
