use std::path::Path;

use crate::data_types::metadata::SoupVersion;
use crate::data_types::method_result::MethodResult;
use crate::data_types::phenotype::{ElementSubtype, ElementType, PhenotypeProfile, PredictionSoftware};
use crate::data_types::records::{ElementTypeResult, GeneDetails, GeneRecord};
use crate::data_types::typing::{TypingMethod, TypingMethodResult, TypingResult, TypingSoftware};
use crate::parsing::cge::{CgeReport, CgeSeqRegion};

/// Prefix of Shiga toxin genes
const STX_PREFIX: &str = "stx";

#[derive(Clone, Debug)]
pub struct VirulencefinderReport {
    report: CgeReport
}

fn convert_region(region: &CgeSeqRegion) -> GeneRecord {
    let element_subtype = if region.name.starts_with(STX_PREFIX) {
        ElementSubtype::Toxin
    } else {
        ElementSubtype::Virulence
    };
    region.to_gene(
        element_subtype,
        vec![],
        GeneDetails::Virulencefinder {
            depth: region.depth,
            note: region.notes.first().cloned()
        }
    )
}

impl VirulencefinderReport {
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            report: CgeReport::from_json(filename, "VirulenceFinder")?
        })
    }

    pub fn software_version(&self) -> Option<SoupVersion> {
        self.report.software_version.as_ref()
            .map(|v| SoupVersion::software("virulencefinder", v.clone()))
    }

    pub fn database_versions(&self) -> Vec<SoupVersion> {
        self.report.database_versions()
    }

    /// All virulence genes; VirulenceFinder has no phenotype calls so the profile is empty
    pub fn prediction(&self) -> MethodResult {
        let genes = self.report.seq_regions.values()
            .map(convert_region)
            .collect();
        MethodResult::new(
            ElementType::Virulence,
            PredictionSoftware::Virulencefinder,
            ElementTypeResult {
                phenotypes: PhenotypeProfile::default(),
                genes,
                variants: vec![]
            }
        )
    }

    /// Shiga toxin typing from the best `stx` hit, ranked by identity and then coverage.
    /// Returns `None` if there are no `stx` hits.
    pub fn stx_typing(&self) -> Option<TypingMethodResult> {
        let best_hit = self.report.seq_regions.values()
            .filter(|r| r.name.starts_with(STX_PREFIX))
            .max_by(|a, b| {
                a.identity.total_cmp(&b.identity)
                    .then(a.coverage.total_cmp(&b.coverage))
            })?;
        Some(TypingMethodResult {
            method: TypingMethod::Stx,
            software: TypingSoftware::Virulencefinder,
            result: TypingResult::Gene(Box::new(convert_region(best_hit)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::data_types::validation::Validate;

    fn load_report() -> VirulencefinderReport {
        VirulencefinderReport::from_json(&PathBuf::from("test_data/cge/virulencefinder.json")).unwrap()
    }

    #[test]
    fn test_virulence_genes() {
        let prediction = load_report().prediction();
        assert!(prediction.validate("element_type_result[0]").is_ok());
        assert_eq!(prediction.result.genes.len(), 3);
        assert_eq!(prediction.result.genes[0].element_subtype, ElementSubtype::Virulence);
        assert_eq!(prediction.result.genes[1].element_subtype, ElementSubtype::Toxin);
        match &prediction.result.genes[0].details {
            GeneDetails::Virulencefinder { note, .. } => assert_eq!(note.as_deref(), Some("intimin")),
            other => panic!("unexpected details: {other:?}")
        }
    }

    #[test]
    fn test_stx_typing() {
        let typing = load_report().stx_typing().unwrap();
        assert!(typing.validate("typing_result[0]").is_ok());
        match typing.result {
            TypingResult::Gene(gene) => assert_eq!(gene.gene_symbol.as_deref(), Some("stx2B")),
            other => panic!("unexpected result: {other:?}")
        }
    }
}
