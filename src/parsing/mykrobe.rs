use anyhow::Context;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

use crate::data_types::metadata::SoupVersion;
use crate::data_types::method_result::MethodResult;
use crate::data_types::phenotype::{ElementType, PhenotypeInfo, PhenotypeProfile, PredictionSoftware};
use crate::data_types::records::{ElementTypeResult, VariantDetails, VariantRecord};
use crate::data_types::typing::{LineageInformation, LineageResult, TypingMethod, TypingMethodResult, TypingResult, TypingSoftware};
use crate::parsing::mutation_notation::{decode_mutation, depth_and_frequency, normalize_alleles};
use crate::parsing::{ConsistencyError, DecodeError};

lazy_static! {
    /// `<gene>_<aa change>-<nt change>:<ref depth>:<alt depth>:<confidence>`
    static ref VARIANT_PATTERN: Regex = Regex::new(r"^(.+?)_(.+)-([^-]+):(\d+):(\d+):(\d+)$")
        .expect("valid regex");
}

/// Name of the database entry Mykrobe versions are reported under
pub const MYKROBE_DB_NAME: &str = "mykrobe-predictor";

/// Column positions in a Mykrobe CSV report.
/// Mykrobe appends format hints to some headers, e.g. `variants (dna_variant-AA_variant:...)`; only the part before ` (` is matched.
struct MykrobeColumns {
    sample: usize,
    drug: usize,
    susceptibility: usize,
    variants: usize,
    version: usize,
    lineage: usize
}

impl MykrobeColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DecodeError> {
        let find = |name: &str| -> Result<usize, DecodeError> {
            headers.iter()
                .position(|h| column_key(h) == name)
                .ok_or_else(|| DecodeError::MissingColumn { column: name.to_string() })
        };
        Ok(Self {
            sample: find("sample")?,
            drug: find("drug")?,
            susceptibility: find("susceptibility")?,
            variants: find("variants")?,
            version: find("mykrobe_version")?,
            lineage: find("lineage")?
        })
    }
}

fn column_key(header: &str) -> &str {
    header.split_once(" (")
        .map_or(header, |(key, _hint)| key)
        .trim()
}

/// Mykrobe writes missing values as empty strings or NA
fn optional_field(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("na") {
        None
    } else {
        Some(value.to_string())
    }
}

/// One drug row of the report
#[derive(Clone, Debug)]
struct MykrobeRow {
    sample: String,
    drug: String,
    susceptibility: String,
    variants: Option<String>,
    version: Option<String>,
    lineage: Option<String>
}

/// A loaded Mykrobe CSV report
#[derive(Clone, Debug)]
pub struct MykrobeReport {
    rows: Vec<MykrobeRow>
}

impl MykrobeReport {
    /// Loads a Mykrobe CSV report, resolving columns by name.
    /// # Arguments
    /// * `filename` - the report to load
    /// # Errors
    /// * if the file cannot be read
    /// * if a required column is missing
    pub fn from_csv(filename: &Path) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .from_path(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?;
        let headers = csv_reader.headers()
            .with_context(|| format!("Error while reading header of {filename:?}:"))?
            .clone();
        let columns = MykrobeColumns::from_headers(&headers)
            .with_context(|| format!("Error while parsing header of {filename:?}:"))?;

        let mut rows = vec![];
        for result in csv_reader.records() {
            let record = result.with_context(|| format!("Error while reading {filename:?}:"))?;
            let get = |index: usize| record.get(index).unwrap_or_default();
            rows.push(MykrobeRow {
                sample: get(columns.sample).trim().to_string(),
                drug: get(columns.drug).trim().to_lowercase(),
                susceptibility: get(columns.susceptibility).trim().to_uppercase(),
                variants: optional_field(get(columns.variants)),
                version: optional_field(get(columns.version)),
                lineage: optional_field(get(columns.lineage))
            });
        }
        debug!("Loaded {} drug rows from {filename:?}", rows.len());
        Ok(Self { rows })
    }

    /// Verifies that the report belongs to the given sample.
    /// # Errors
    /// * if any row reports a sample name that does not contain `sample_id`
    pub fn check_sample(&self, sample_id: &str) -> Result<(), ConsistencyError> {
        match self.rows.iter().find(|r| !r.sample.contains(sample_id)) {
            Some(row) => Err(ConsistencyError::SampleMismatch {
                sample_id: sample_id.to_string(),
                software: PredictionSoftware::Mykrobe.to_string(),
                found: row.sample.clone()
            }),
            None => Ok(())
        }
    }

    /// The version of the Mykrobe probe sets, if reported
    pub fn version(&self) -> Option<SoupVersion> {
        self.rows.iter()
            .find_map(|r| r.version.as_ref())
            .map(|v| SoupVersion::database(MYKROBE_DB_NAME, v.clone()))
    }

    /// Susceptible/resistant drug sets; rows with any other call are skipped
    pub fn phenotype_profile(&self) -> PhenotypeProfile {
        let mut susceptible = BTreeSet::new();
        let mut resistant = BTreeSet::new();
        for row in self.rows.iter() {
            match row.susceptibility.as_str() {
                "R" => { resistant.insert(row.drug.clone()); },
                "S" => { susceptible.insert(row.drug.clone()); },
                other => debug!("Skipping {} with susceptibility {other:?}", row.drug)
            }
        }
        PhenotypeProfile { susceptible, resistant }
    }

    /// Builds the resistance prediction for the given category.
    /// Variants reported for several drugs are merged into one record carrying all drug phenotypes.
    /// # Errors
    /// * if a variant entry does not follow the Mykrobe variant layout
    pub fn resistance_prediction(&self, category: ElementType) -> Result<MethodResult, DecodeError> {
        info!("Parsing Mykrobe {category} prediction");
        let mut variants: Vec<VariantRecord> = vec![];
        for row in self.rows.iter().filter(|r| r.susceptibility == "R") {
            let Some(entries) = row.variants.as_deref() else {
                continue;
            };
            for entry in entries.split(';').map(str::trim).filter(|e| !e.is_empty()) {
                let Some(mut variant) = parse_variant_entry(entry)? else {
                    warn!("Skipping Mykrobe variant with an undecodable nucleotide change: {entry:?}");
                    continue;
                };
                let phenotype = PhenotypeInfo::new(row.drug.clone(), category);
                let existing = variants.iter_mut().find(|v| {
                    v.gene_symbol == variant.gene_symbol && v.position == variant.position &&
                        v.ref_nt == variant.ref_nt && v.alt_nt == variant.alt_nt
                });
                match existing {
                    Some(v) => {
                        if !v.phenotypes.iter().any(|p| p.name == phenotype.name) {
                            v.phenotypes.push(phenotype);
                        }
                    },
                    None => {
                        variant.phenotypes.push(phenotype);
                        variants.push(variant);
                    }
                }
            }
        }

        Ok(MethodResult::new(
            category,
            PredictionSoftware::Mykrobe,
            ElementTypeResult {
                phenotypes: self.phenotype_profile(),
                genes: vec![],
                variants
            }
        ))
    }

    /// Lineage typing, `None` if no lineage was called
    pub fn lineage_typing(&self) -> Option<TypingMethodResult> {
        let lineage = self.rows.iter().find_map(|r| r.lineage.clone())?;
        let main_lineage = lineage.split('.').next().unwrap_or_default().to_string();
        Some(TypingMethodResult {
            method: TypingMethod::Lineage,
            software: TypingSoftware::Mykrobe,
            result: TypingResult::Lineage(LineageResult {
                main_lineage: Some(main_lineage),
                sub_lineage: Some(lineage.clone()),
                lineages: vec![LineageInformation {
                    lineage,
                    family: None,
                    spoligotype: None,
                    rd: None,
                    fraction: None
                }]
            })
        })
    }
}

/// Parses one `<gene>_<aa>-<nt>:<ref>:<alt>:<conf>` entry.
/// Returns `Ok(None)` if the nucleotide change cannot be decoded.
fn parse_variant_entry(entry: &str) -> Result<Option<VariantRecord>, DecodeError> {
    let captures = VARIANT_PATTERN.captures(entry)
        .ok_or_else(|| DecodeError::PatternMismatch { field: "variants".to_string(), value: entry.to_string() })?;
    let parse_count = |index: usize| -> Result<u64, DecodeError> {
        captures[index].parse()
            .map_err(|_| DecodeError::InvalidValue { field: "variants".to_string(), value: entry.to_string() })
    };
    let ref_depth = parse_count(4)?;
    let alt_depth = parse_count(5)?;
    let confidence = u32::try_from(parse_count(6)?)
        .map_err(|_| DecodeError::InvalidValue { field: "variants".to_string(), value: entry.to_string() })?;

    let Some(nt_change) = decode_mutation(&captures[3]) else {
        return Ok(None);
    };
    // promoter changes are reported relative to the gene start in the amino acid slot
    let aa_change = decode_mutation(&captures[2]).filter(|aa| aa.position > 0);

    let (variant_type, ref_nt, alt_nt) = normalize_alleles(&nt_change.ref_allele, &nt_change.alt_allele);

    let (depth, frequency) = depth_and_frequency(ref_depth, alt_depth);
    Ok(Some(VariantRecord {
        variant_type,
        variant_subtype: None,
        phenotypes: vec![],
        gene_symbol: captures[1].to_string(),
        accession: None,
        position: nt_change.position,
        end: None,
        ref_nt,
        alt_nt,
        ref_aa: aa_change.as_ref().map(|aa| aa.ref_allele.clone()),
        alt_aa: aa_change.as_ref().map(|aa| aa.alt_allele.clone()),
        depth: Some(depth),
        frequency,
        method: Some(PredictionSoftware::Mykrobe.to_string()),
        // Mykrobe only reports calls that passed its own genotyping filters
        passed_qc: Some(true),
        details: VariantDetails::Mykrobe { confidence: Some(confidence) }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use std::path::PathBuf;

    use crate::data_types::records::VariantType;
    use crate::data_types::validation::Validate;

    fn load_report() -> MykrobeReport {
        MykrobeReport::from_csv(&PathBuf::from("test_data/mykrobe/mykrobe.csv")).unwrap()
    }

    #[test]
    fn test_phenotype_profile() {
        let profile = load_report().phenotype_profile();
        let resistant: Vec<&str> = profile.resistant.iter().map(|s| s.as_str()).collect();
        let susceptible: Vec<&str> = profile.susceptible.iter().map(|s| s.as_str()).collect();
        assert_eq!(resistant, vec!["ethionamide", "isoniazid", "pyrazinamide", "rifampicin"]);
        assert_eq!(susceptible, vec!["amikacin", "ethambutol"]);
    }

    #[test]
    fn test_resistance_variants() {
        let prediction = load_report().resistance_prediction(ElementType::Amr).unwrap();
        assert!(prediction.validate("element_type_result[0]").is_ok());

        let variants = &prediction.result.variants;
        assert_eq!(variants.len(), 3);

        // fabG1 is reported for both ethionamide and isoniazid
        let fabg1 = &variants[0];
        assert_eq!(fabg1.gene_symbol, "fabG1");
        assert_eq!(fabg1.position, 1673425);
        assert_eq!((fabg1.ref_nt.as_str(), fabg1.alt_nt.as_str()), ("C", "T"));
        assert_eq!(fabg1.ref_aa, None);
        let drugs: Vec<&str> = fabg1.phenotypes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(drugs, vec!["ethionamide", "isoniazid"]);

        let katg = &variants[1];
        assert_eq!(katg.gene_symbol, "katG");
        assert_eq!((katg.ref_nt.as_str(), katg.alt_nt.as_str()), ("C", "G"));
        assert_eq!(katg.ref_aa.as_deref(), Some("S"));
        assert_eq!(katg.alt_aa.as_deref(), Some("T"));

        let rpob = &variants[2];
        assert_eq!(rpob.gene_symbol, "rpoB");
        assert_eq!(rpob.variant_type, VariantType::Substitution);
        assert_eq!(rpob.position, 761154);
        assert_approx_eq!(rpob.depth.unwrap(), 40.0);
        assert_approx_eq!(rpob.frequency.unwrap(), 0.95);
        assert_eq!(rpob.passed_qc, Some(true));
        assert_eq!(rpob.details, VariantDetails::Mykrobe { confidence: Some(155) });
    }

    #[test]
    fn test_sample_and_version() {
        let report = load_report();
        assert!(report.check_sample("test_mtuberculosis_1").is_ok());
        assert!(matches!(
            report.check_sample("other_sample"),
            Err(ConsistencyError::SampleMismatch { .. })
        ));
        assert_eq!(report.version(), Some(SoupVersion::database("mykrobe-predictor", "v0.12.1")));
    }

    #[test]
    fn test_lineage() {
        let typing = load_report().lineage_typing().unwrap();
        match typing.result {
            TypingResult::Lineage(lineage) => {
                assert_eq!(lineage.main_lineage.as_deref(), Some("lineage4"));
                assert_eq!(lineage.sub_lineage.as_deref(), Some("lineage4.9"));
            },
            other => panic!("unexpected typing result: {other:?}")
        }
    }

    #[test]
    fn test_variant_entry_errors() {
        assert!(matches!(
            parse_variant_entry("katG_S315T"),
            Err(DecodeError::PatternMismatch { .. })
        ));
        assert_eq!(parse_variant_entry("katG_S315T-NOCHANGE:0:48:210"), Ok(None));
    }

    #[test]
    fn test_missing_column() {
        let err = MykrobeReport::from_csv(&PathBuf::from("test_data/mykrobe/missing_column.csv")).unwrap_err();
        let decode_err = err.downcast_ref::<DecodeError>().unwrap();
        assert_eq!(decode_err, &DecodeError::MissingColumn { column: "susceptibility".to_string() });
    }
}
