use log::{info, warn};
use serde::Deserialize;
use std::path::Path;

use crate::data_types::metadata::SoupVersion;
use crate::data_types::method_result::MethodResult;
use crate::data_types::phenotype::{ElementType, PhenotypeInfo, PhenotypeProfile, PredictionSoftware};
use crate::data_types::records::{ElementTypeResult, VariantDetails, VariantRecord, VariantSubtype, VariantType};
use crate::data_types::typing::{LineageInformation, LineageResult, TypingMethod, TypingMethodResult, TypingResult, TypingSoftware};
use crate::parsing::mutation_notation::classify_by_length;
use crate::parsing::DecodeError;
use crate::util::json_io::load_json;

/// Drugs covered by the TBProfiler database; anything not called resistant is reported as susceptible
const TBPROFILER_DRUGS: [&str; 15] = [
    "ofloxacin",
    "moxifloxacin",
    "isoniazid",
    "delamanid",
    "kanamycin",
    "amikacin",
    "ethambutol",
    "ethionamide",
    "streptomycin",
    "ciprofloxacin",
    "levofloxacin",
    "pyrazinamide",
    "linezolid",
    "rifampicin",
    "capreomycin"
];

#[derive(Clone, Debug, Deserialize)]
struct PipelineStep {
    #[serde(rename = "Analysis")]
    analysis: String,
    #[serde(rename = "Program")]
    program: String
}

#[derive(Clone, Debug, Deserialize)]
struct DatabaseVersion {
    name: String,
    commit: Option<String>,
    #[serde(rename = "Date")]
    date: Option<String>
}

#[derive(Clone, Debug, Deserialize)]
struct DrugAssociation {
    #[serde(rename = "type")]
    kind: String,
    drug: String,
    confers: Option<String>,
    literature: Option<String>,
    #[serde(rename = "who confidence")]
    who_confidence: Option<String>
}

#[derive(Clone, Debug, Deserialize)]
struct TbProfilerVariant {
    genome_pos: i64,
    #[serde(rename = "ref")]
    ref_nt: String,
    #[serde(rename = "alt")]
    alt_nt: String,
    depth: Option<f64>,
    freq: Option<f64>,
    feature_id: Option<String>,
    #[serde(rename = "type")]
    variant_effect: Option<String>,
    nucleotide_change: Option<String>,
    protein_change: Option<String>,
    gene: String,
    #[serde(default)]
    gene_associated_drugs: Vec<String>,
    #[serde(default)]
    drugs: Vec<DrugAssociation>
}

#[derive(Clone, Debug, Deserialize)]
struct TbProfilerLineage {
    #[serde(alias = "lin")]
    lineage: String,
    family: Option<String>,
    spoligotype: Option<String>,
    rd: Option<String>,
    #[serde(alias = "frac")]
    fraction: Option<f64>
}

/// A loaded TBProfiler JSON report
#[derive(Clone, Debug, Deserialize)]
pub struct TbProfilerReport {
    #[serde(default)]
    pipeline: Vec<PipelineStep>,
    db_version: DatabaseVersion,
    #[serde(alias = "main_lin")]
    main_lineage: Option<String>,
    #[serde(alias = "sub_lin")]
    sub_lineage: Option<String>,
    #[serde(default)]
    lineage: Vec<TbProfilerLineage>,
    /// Known resistance variants
    #[serde(default)]
    dr_variants: Vec<TbProfilerVariant>,
    /// Variants in resistance genes that are not in the database
    #[serde(default)]
    other_variants: Vec<TbProfilerVariant>,
    /// Known resistance variants that failed QC
    #[serde(default)]
    qc_fail_variants: Vec<TbProfilerVariant>
}

impl TbProfilerReport {
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        load_json(filename)
    }

    /// The database version: the commit if reported, otherwise `<name>_<ISO date>`
    /// # Errors
    /// * if neither a commit nor a parseable date is reported
    pub fn database_version(&self) -> Result<SoupVersion, DecodeError> {
        let version = match self.db_version.commit.as_ref() {
            Some(commit) => commit.clone(),
            None => {
                let date = self.db_version.date.as_deref()
                    .ok_or_else(|| DecodeError::MissingField { field: "db_version.Date".to_string() })?;
                format!("{}_{}", self.db_version.name, reformat_date(date)?)
            }
        };
        Ok(SoupVersion::database(self.db_version.name.clone(), version))
    }

    /// Program used for variant calling, as reported in the pipeline steps
    fn variant_caller(&self) -> Option<String> {
        self.pipeline.iter()
            .rev()
            .find(|step| step.analysis.eq_ignore_ascii_case("variant calling"))
            .map(|step| step.program.clone())
    }

    /// Resistant drugs are those associated with known resistance variants, all other database drugs are susceptible
    pub fn phenotype_profile(&self) -> PhenotypeProfile {
        let resistant: Vec<String> = self.dr_variants.iter()
            .flat_map(|v| v.gene_associated_drugs.iter().cloned())
            .collect();
        let susceptible: Vec<String> = TBPROFILER_DRUGS.iter()
            .filter(|drug| !resistant.iter().any(|r| r == *drug))
            .map(|drug| drug.to_string())
            .collect();
        PhenotypeProfile::new(susceptible, resistant)
    }

    /// Merges all variant partitions into one resistance prediction, sorted by gene and position
    pub fn resistance_prediction(&self, category: ElementType) -> MethodResult {
        info!("Parsing TBProfiler {category} prediction");
        let caller = self.variant_caller();
        let partitions = [
            (&self.dr_variants, true),
            (&self.other_variants, true),
            (&self.qc_fail_variants, false)
        ];

        let mut variants: Vec<VariantRecord> = vec![];
        for (hits, passed_qc) in partitions {
            variants.extend(hits.iter().map(|hit| convert_variant(hit, passed_qc, caller.clone())));
        }
        variants.sort_by(|a, b| (&a.gene_symbol, a.position).cmp(&(&b.gene_symbol, b.position)));

        MethodResult::new(
            category,
            PredictionSoftware::Tbprofiler,
            ElementTypeResult {
                phenotypes: self.phenotype_profile(),
                genes: vec![],
                variants
            }
        )
    }

    pub fn lineage_typing(&self) -> TypingMethodResult {
        let lineages = self.lineage.iter()
            .map(|l| LineageInformation {
                lineage: l.lineage.clone(),
                family: l.family.clone(),
                spoligotype: l.spoligotype.clone(),
                rd: l.rd.clone(),
                fraction: l.fraction
            })
            .collect();
        TypingMethodResult {
            method: TypingMethod::Lineage,
            software: TypingSoftware::Tbprofiler,
            result: TypingResult::Lineage(LineageResult {
                main_lineage: self.main_lineage.clone(),
                sub_lineage: self.sub_lineage.clone(),
                lineages
            })
        }
    }
}

fn convert_variant(hit: &TbProfilerVariant, passed_qc: bool, caller: Option<String>) -> VariantRecord {
    let variant_type = classify_by_length(hit.ref_nt.len(), hit.alt_nt.len());
    let variant_subtype = match variant_type {
        VariantType::Deletion => VariantSubtype::Deletion,
        VariantType::Insertion => VariantSubtype::Insertion,
        _ => VariantSubtype::Substitution
    };
    VariantRecord {
        variant_type,
        variant_subtype: Some(variant_subtype),
        phenotypes: hit.drugs.iter().map(drug_phenotype).collect(),
        gene_symbol: hit.gene.clone(),
        accession: hit.feature_id.clone(),
        position: hit.genome_pos,
        end: Some(hit.genome_pos + hit.ref_nt.len().max(1) as i64 - 1),
        ref_nt: hit.ref_nt.clone(),
        alt_nt: hit.alt_nt.clone(),
        ref_aa: None,
        alt_aa: None,
        depth: hit.depth,
        frequency: hit.freq,
        method: caller,
        passed_qc: Some(passed_qc),
        details: VariantDetails::Tbprofiler {
            variant_effect: hit.variant_effect.clone(),
            hgvs_nt_change: hit.nucleotide_change.clone(),
            hgvs_aa_change: hit.protein_change.clone()
        }
    }
}

/// Unknown association categories are kept as AMR phenotypes
fn drug_phenotype(drug: &DrugAssociation) -> PhenotypeInfo {
    let confers_resistance = drug.kind == "drug" && drug.confers.as_deref() == Some("resistance");
    if !confers_resistance {
        warn!(
            "Unknown TBProfiler drug association; type: {}, confers: {:?}; defaulting to {}",
            drug.kind, drug.confers, ElementType::Amr
        );
    }
    PhenotypeInfo {
        name: drug.drug.clone(),
        group: None,
        element_type: ElementType::Amr,
        reference: drug.literature.iter().cloned().collect(),
        note: drug.who_confidence.clone()
    }
}

/// Converts a database date to an ISO date (YYYY-MM-DD).
/// Accepts `2023-10-02 14:58:46.123456` and git style `Mon Oct 2 14:58:46 2023 +0100` dates.
pub fn reformat_date(date: &str) -> Result<String, DecodeError> {
    let date = date.trim();
    let parsed = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| chrono::DateTime::parse_from_str(date, "%a %b %d %H:%M:%S %Y %z").map(|dt| dt.date_naive()))
        .map_err(|_| DecodeError::InvalidValue { field: "db_version.Date".to_string(), value: date.to_string() })?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::data_types::validation::Validate;

    fn load_report() -> TbProfilerReport {
        TbProfilerReport::from_json(&PathBuf::from("test_data/tbprofiler/tbprofiler.json")).unwrap()
    }

    #[test]
    fn test_variant_partitions() {
        let prediction = load_report().resistance_prediction(ElementType::Amr);
        assert!(prediction.validate("element_type_result[0]").is_ok());

        // sorted by gene and position
        let variants = &prediction.result.variants;
        let genes: Vec<&str> = variants.iter().map(|v| v.gene_symbol.as_str()).collect();
        assert_eq!(genes, vec!["embB", "gyrA", "katG", "rpoB"]);

        let qc: Vec<Option<bool>> = variants.iter().map(|v| v.passed_qc).collect();
        assert_eq!(qc, vec![Some(false), Some(true), Some(true), Some(true)]);

        let embb = &variants[0];
        assert_eq!(embb.variant_type, VariantType::Deletion);
        assert_eq!(embb.variant_subtype, Some(VariantSubtype::Deletion));
        assert_eq!(embb.end, Some(4247431));

        let rpob = &variants[3];
        assert_eq!(rpob.variant_type, VariantType::Substitution);
        assert_eq!(rpob.position, 761155);
        assert_eq!(rpob.end, Some(761155));
        assert_eq!(rpob.method.as_deref(), Some("freebayes"));
        assert_eq!(rpob.accession.as_deref(), Some("Rv0667"));
        assert_eq!(rpob.phenotypes[0].reference, vec!["10.1128/AAC.01093-18".to_string()]);
        assert_eq!(rpob.phenotypes[0].note.as_deref(), Some("Assoc w R"));

        // unknown association types still produce an AMR phenotype
        let katg = &variants[2];
        assert_eq!(katg.phenotypes.len(), 2);
        assert!(katg.phenotypes.iter().all(|p| p.element_type == ElementType::Amr));
    }

    #[test]
    fn test_phenotype_profile() {
        let profile = load_report().phenotype_profile();
        let resistant: Vec<&str> = profile.resistant.iter().map(|s| s.as_str()).collect();
        assert_eq!(resistant, vec!["isoniazid", "rifampicin"]);
        assert_eq!(profile.susceptible.len(), 13);
        assert!(profile.susceptible.contains("ethambutol"));
    }

    #[test]
    fn test_database_version() {
        let mut report = load_report();
        assert_eq!(report.database_version().unwrap(), SoupVersion::database("tbdb", "e25540b"));

        report.db_version.commit = None;
        assert_eq!(report.database_version().unwrap().version, "tbdb_2023-10-02");

        report.db_version.date = None;
        assert!(report.database_version().is_err());
    }

    #[test]
    fn test_reformat_date() {
        assert_eq!(reformat_date("2024-03-11 09:12:45.381221").unwrap(), "2024-03-11");
        assert_eq!(reformat_date("Mon Oct 2 14:58:46 2023 +0100").unwrap(), "2023-10-02");
        assert!(reformat_date("yesterday").is_err());
    }

    #[test]
    fn test_lineage() {
        let typing = load_report().lineage_typing();
        assert!(!typing.is_empty());
        match typing.result {
            TypingResult::Lineage(lineage) => {
                assert_eq!(lineage.main_lineage.as_deref(), Some("lineage4"));
                assert_eq!(lineage.lineages.len(), 2);
                assert_eq!(lineage.lineages[1].fraction, Some(0.98));
            },
            other => panic!("unexpected typing result: {other:?}")
        }
    }
}
