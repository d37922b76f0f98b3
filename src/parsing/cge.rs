use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::data_types::metadata::SoupVersion;
use crate::data_types::phenotype::{ElementSubtype, ElementType, PhenotypeInfo};
use crate::data_types::records::{GeneDetails, GeneRecord};
use crate::parsing::DecodeError;
use crate::util::json_io::load_json;

/// A database entry of a CGE report
#[derive(Clone, Debug, Deserialize)]
pub struct CgeDatabase {
    pub database_name: String,
    pub database_version: String,
    pub database_commit: Option<String>
}

/// An aligned region (gene hit) of a CGE report
#[derive(Clone, Debug, Deserialize)]
pub struct CgeSeqRegion {
    pub name: String,
    #[serde(default)]
    pub ref_database: Vec<String>,
    pub ref_id: String,
    pub ref_acc: Option<String>,
    pub identity: f64,
    pub alignment_length: Option<u64>,
    pub ref_seq_length: Option<u64>,
    pub coverage: f64,
    pub depth: Option<f64>,
    pub ref_start_pos: Option<u64>,
    pub ref_end_pos: Option<u64>,
    pub query_id: Option<String>,
    pub query_start_pos: Option<u64>,
    pub query_end_pos: Option<u64>,
    #[serde(default)]
    pub phenotypes: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>
}

impl CgeSeqRegion {
    /// True if any of the reference databases starts with `database_name`
    pub fn from_database(&self, database_name: &str) -> bool {
        self.ref_database.iter().any(|db| db.starts_with(database_name))
    }

    /// Converts the hit into a gene record with the given classification
    pub fn to_gene(&self, element_subtype: ElementSubtype, phenotypes: Vec<PhenotypeInfo>, details: GeneDetails) -> GeneRecord {
        GeneRecord {
            gene_symbol: Some(self.name.clone()),
            accession: self.ref_acc.clone(),
            sequence_name: Some(self.ref_id.clone()),
            element_type: element_subtype.element_type(),
            element_subtype,
            ref_start_pos: self.ref_start_pos,
            ref_end_pos: self.ref_end_pos,
            ref_gene_length: self.ref_seq_length,
            contig_id: self.query_id.clone(),
            query_start_pos: self.query_start_pos,
            query_end_pos: self.query_end_pos,
            strand: None,
            identity: Some(self.identity),
            coverage: Some(self.coverage),
            method: None,
            phenotypes,
            details
        }
    }
}

/// A point mutation of a CGE report (PointFinder)
#[derive(Clone, Debug, Deserialize)]
pub struct CgeSeqVariation {
    pub ref_id: String,
    pub seq_var: Option<String>,
    pub codon_change: Option<String>,
    pub nuc_change: Option<String>,
    pub ref_aa: Option<String>,
    pub var_aa: Option<String>,
    pub ref_start_pos: i64,
    pub ref_end_pos: Option<i64>,
    #[serde(default)]
    pub ref_database: Vec<String>,
    #[serde(default)]
    pub genes: Vec<String>,
    #[serde(default)]
    pub phenotypes: Vec<String>
}

/// A phenotype call of a CGE report
#[derive(Clone, Debug, Deserialize)]
pub struct CgePhenotype {
    pub category: Option<String>,
    pub key: String,
    #[serde(default)]
    pub amr_classes: Vec<String>,
    pub amr_resistant: bool,
    #[serde(default)]
    pub ref_database: Vec<String>,
    #[serde(default)]
    pub seq_regions: Vec<String>,
    #[serde(default)]
    pub seq_variations: Vec<String>
}

impl CgePhenotype {
    pub fn from_database(&self, database_name: &str) -> bool {
        self.ref_database.iter().any(|db| db.starts_with(database_name))
    }
}

/// The standardized JSON written by the CGE tools (ResFinder, VirulenceFinder, SerotypeFinder)
#[derive(Clone, Debug, Deserialize)]
pub struct CgeReport {
    pub software_name: String,
    pub software_version: Option<String>,
    #[serde(default)]
    pub databases: IndexMap<String, CgeDatabase>,
    #[serde(default)]
    pub seq_regions: IndexMap<String, CgeSeqRegion>,
    #[serde(default)]
    pub seq_variations: IndexMap<String, CgeSeqVariation>,
    #[serde(default)]
    pub phenotypes: IndexMap<String, CgePhenotype>
}

impl CgeReport {
    /// Loads a CGE report and checks that it was written by the expected tool
    /// # Errors
    /// * if the file cannot be read or parsed
    /// * if `software_name` is not `expected_software` (case-insensitive)
    pub fn from_json(filename: &Path, expected_software: &str) -> anyhow::Result<Self> {
        let report: CgeReport = load_json(filename)?;
        if !report.software_name.eq_ignore_ascii_case(expected_software) {
            return Err(DecodeError::InvalidValue { field: "software_name".to_string(), value: report.software_name.clone() }.into());
        }
        debug!(
            "Loaded {} report from {filename:?}: {} regions, {} variations, {} phenotypes",
            report.software_name, report.seq_regions.len(), report.seq_variations.len(), report.phenotypes.len()
        );
        Ok(report)
    }

    /// Database versions, the commit is preferred over the release number when present
    pub fn database_versions(&self) -> Vec<SoupVersion> {
        self.databases.values()
            .map(|db| {
                let version = match &db.database_commit {
                    Some(commit) if !commit.is_empty() => commit.clone(),
                    _ => db.database_version.clone()
                };
                SoupVersion::database(db.database_name.clone(), version)
            })
            .collect()
    }

    /// The drug classes of a phenotype, if it was reported
    pub fn phenotype_group(&self, name: &str) -> Option<String> {
        self.phenotypes.get(name)
            .and_then(|p| p.amr_classes.first().cloned())
    }

    /// Phenotype records for a list of names, with the drug class as the group
    pub fn phenotype_infos(&self, names: &[String], element_type: ElementType) -> Vec<PhenotypeInfo> {
        names.iter()
            .map(|name| PhenotypeInfo {
                group: self.phenotype_group(name),
                ..PhenotypeInfo::new(name.to_lowercase(), element_type)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_report() {
        let report = CgeReport::from_json(&PathBuf::from("test_data/cge/resfinder.json"), "resfinder").unwrap();
        assert_eq!(report.software_version.as_deref(), Some("4.3.3"));
        assert_eq!(report.seq_regions.len(), 3);
        assert!(report.seq_regions["qacA;;1;;AB566410"].from_database("DisinFinder"));
        assert_eq!(report.phenotype_group("oxacillin").as_deref(), Some("beta-lactam"));
        assert_eq!(report.phenotype_group("vancomycin"), None);
    }

    #[test]
    fn test_database_versions() {
        let report = CgeReport::from_json(&PathBuf::from("test_data/cge/resfinder.json"), "ResFinder").unwrap();
        let versions = report.database_versions();
        assert_eq!(versions[0], SoupVersion::database("ResFinder", "2a3e6d2"));
        // no commit, fall back to the release
        assert_eq!(versions[1], SoupVersion::database("PointFinder", "4.0.1"));
    }

    #[test]
    fn test_wrong_software() {
        let err = CgeReport::from_json(&PathBuf::from("test_data/cge/serotypefinder.json"), "ResFinder").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::InvalidValue { field: "software_name".to_string(), value: "SerotypeFinder".to_string() })
        );
    }
}
