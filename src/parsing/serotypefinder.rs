use log::debug;
use std::path::Path;

use crate::data_types::metadata::SoupVersion;
use crate::data_types::phenotype::ElementSubtype;
use crate::data_types::records::GeneDetails;
use crate::data_types::typing::{TypingMethod, TypingMethodResult, TypingResult, TypingSoftware};
use crate::parsing::cge::CgeReport;

#[derive(Clone, Debug)]
pub struct SerotypefinderReport {
    report: CgeReport
}

impl SerotypefinderReport {
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            report: CgeReport::from_json(filename, "SerotypeFinder")?
        })
    }

    pub fn software_version(&self) -> Option<SoupVersion> {
        self.report.software_version.as_ref()
            .map(|v| SoupVersion::software("serotypefinder", v.clone()))
    }

    pub fn database_versions(&self) -> Vec<SoupVersion> {
        self.report.database_versions()
    }

    /// Typing from the first hit whose serotype starts with `prefix` (`O` or `H`)
    fn antigen_typing(&self, method: TypingMethod, prefix: char) -> Option<TypingMethodResult> {
        let (region, serotype) = self.report.seq_regions.values()
            .find_map(|r| {
                r.phenotypes.iter()
                    .find(|p| p.starts_with(prefix))
                    .map(|p| (r, p.clone()))
            })?;
        debug!("{method} {serotype} from {}", region.name);

        let gene = region.to_gene(
            ElementSubtype::Antigen,
            vec![],
            GeneDetails::Serotypefinder { serotype: Some(serotype) }
        );
        Some(TypingMethodResult {
            method,
            software: TypingSoftware::Serotypefinder,
            result: TypingResult::Gene(Box::new(gene))
        })
    }

    /// O antigen typing, `None` if no O antigen gene was found
    pub fn o_typing(&self) -> Option<TypingMethodResult> {
        self.antigen_typing(TypingMethod::OType, 'O')
    }

    /// H antigen typing, `None` if no H antigen gene was found
    pub fn h_typing(&self) -> Option<TypingMethodResult> {
        self.antigen_typing(TypingMethod::HType, 'H')
    }
}
