use log::warn;
use std::path::Path;

use crate::data_types::metadata::SoupVersion;
use crate::data_types::method_result::MethodResult;
use crate::data_types::phenotype::{ElementSubtype, ElementType, PhenotypeProfile, PredictionSoftware};
use crate::data_types::records::{ElementTypeResult, GeneDetails, GeneRecord, VariantDetails, VariantRecord};
use crate::parsing::cge::{CgeReport, CgeSeqRegion, CgeSeqVariation};
use crate::parsing::mutation_notation::normalize_alleles;
use crate::parsing::DecodeError;

/// Database whose hits are biocide (stress) rather than antimicrobial resistance
const DISINFINDER_DB: &str = "DisinFinder";

/// A ResFinder report, including the PointFinder and DisinFinder results it bundles
#[derive(Clone, Debug)]
pub struct ResfinderReport {
    report: CgeReport
}

/// Element type of a hit, determined by the database it came from
fn element_type_of(from_disinfinder: bool) -> ElementType {
    if from_disinfinder {
        ElementType::Stress
    } else {
        ElementType::Amr
    }
}

impl ResfinderReport {
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            report: CgeReport::from_json(filename, "ResFinder")?
        })
    }

    pub fn software_version(&self) -> Option<SoupVersion> {
        self.report.software_version.as_ref()
            .map(|v| SoupVersion::software("resfinder", v.clone()))
    }

    pub fn database_versions(&self) -> Vec<SoupVersion> {
        self.report.database_versions()
    }

    fn convert_region(&self, region: &CgeSeqRegion, element_type: ElementType) -> GeneRecord {
        let element_subtype = match element_type {
            ElementType::Stress => ElementSubtype::Biocide,
            _ => ElementSubtype::Amr
        };
        region.to_gene(
            element_subtype,
            self.report.phenotype_infos(&region.phenotypes, element_type),
            GeneDetails::Resfinder {
                depth: region.depth,
                ref_database: region.ref_database.clone()
            }
        )
    }

    /// Converts a PointFinder mutation; the codon change is preferred over the nucleotide change.
    /// The gene comes from `genes`, else from the first part of `ref_id`.
    fn convert_variation(&self, variation: &CgeSeqVariation) -> Result<VariantRecord, DecodeError> {
        let change = variation.codon_change.as_deref()
            .or(variation.nuc_change.as_deref())
            .ok_or_else(|| DecodeError::MissingField { field: format!("{}.codon_change", variation.ref_id) })?;
        let (ref_allele, alt_allele) = change.split_once('>')
            .ok_or_else(|| DecodeError::PatternMismatch { field: "codon_change".to_string(), value: change.to_string() })?;
        let (variant_type, ref_nt, alt_nt) = normalize_alleles(ref_allele, alt_allele);

        let gene_symbol = variation.genes.iter()
            .map(|s| s.as_str())
            .chain(variation.ref_id.split(";;").next())
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .ok_or_else(|| DecodeError::MissingField { field: format!("{}.genes", variation.ref_id) })?
            .to_string();

        Ok(VariantRecord {
            variant_type,
            variant_subtype: None,
            phenotypes: self.report.phenotype_infos(&variation.phenotypes, ElementType::Amr),
            gene_symbol,
            accession: None,
            position: variation.ref_start_pos,
            end: variation.ref_end_pos,
            ref_nt,
            alt_nt,
            ref_aa: variation.ref_aa.as_ref().map(|aa| aa.to_uppercase()),
            alt_aa: variation.var_aa.as_ref().map(|aa| aa.to_uppercase()),
            depth: None,
            frequency: None,
            method: None,
            passed_qc: None,
            details: VariantDetails::Resfinder { ref_database: variation.ref_database.clone() }
        })
    }

    /// Genes, point mutations, and phenotype profile for one element type.
    /// AMR takes the ResFinder and PointFinder results, STRESS the DisinFinder results.
    /// # Errors
    /// * if a point mutation has no parseable codon or nucleotide change
    /// * if a point mutation does not name its gene
    pub fn prediction(&self, element_type: ElementType) -> Result<MethodResult, DecodeError> {
        if element_type == ElementType::Virulence {
            warn!("ResFinder does not report virulence genes");
            return Ok(MethodResult::new(element_type, PredictionSoftware::Resfinder, ElementTypeResult::default()));
        }

        let genes: Vec<GeneRecord> = self.report.seq_regions.values()
            .filter(|r| element_type_of(r.from_database(DISINFINDER_DB)) == element_type)
            .map(|r| self.convert_region(r, element_type))
            .collect();

        let variants: Vec<VariantRecord> = if element_type == ElementType::Amr {
            self.report.seq_variations.values()
                .map(|v| self.convert_variation(v))
                .collect::<Result<_, _>>()?
        } else {
            vec![]
        };

        let mut susceptible = vec![];
        let mut resistant = vec![];
        for phenotype in self.report.phenotypes.values() {
            if element_type_of(phenotype.from_database(DISINFINDER_DB)) != element_type {
                continue;
            }
            let name = phenotype.key.to_lowercase();
            if phenotype.amr_resistant {
                resistant.push(name);
            } else {
                susceptible.push(name);
            }
        }

        Ok(MethodResult::new(
            element_type,
            PredictionSoftware::Resfinder,
            ElementTypeResult {
                phenotypes: PhenotypeProfile::new(susceptible, resistant),
                genes,
                variants
            }
        ))
    }
}
