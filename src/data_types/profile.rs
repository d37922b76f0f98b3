use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::data_types::phenotype::ElementType;

/// Every upstream output that `create-output` can decode
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display)]
pub enum Decoder {
    #[strum(serialize = "QUAST")]
    Quast,
    #[strum(serialize = "post-alignment QC")]
    PostAlignQc,
    #[strum(serialize = "Bracken")]
    Bracken,
    #[strum(serialize = "MLST")]
    Mlst,
    #[strum(serialize = "chewBBACA")]
    Cgmlst,
    #[strum(serialize = "AMRFinderPlus")]
    Amrfinder,
    #[strum(serialize = "ResFinder")]
    Resfinder,
    #[strum(serialize = "VirulenceFinder")]
    Virulencefinder,
    #[strum(serialize = "SerotypeFinder")]
    Serotypefinder,
    #[strum(serialize = "Mykrobe")]
    Mykrobe,
    #[strum(serialize = "TBProfiler")]
    Tbprofiler,
    #[strum(serialize = "SNV VCF")]
    SnvVcf,
    #[strum(serialize = "SV VCF")]
    SvVcf,
    #[strum(serialize = "reference genome")]
    ReferenceGenome,
    #[strum(serialize = "read mapping")]
    ReadMapping,
    #[strum(serialize = "annotation track")]
    AnnotationTrack
}

/// Organism specific capabilities of the aggregator
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, strum_macros::Display, EnumString, Serialize, Deserialize, clap::ValueEnum, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum OrganismProfile {
    /// Staphylococcus aureus
    #[strum(ascii_case_insensitive, serialize = "staphylococcus")]
    #[clap(name = "staphylococcus")]
    Staphylococcus,
    /// Escherichia coli, adds serotyping and Shiga toxin typing
    #[strum(ascii_case_insensitive, serialize = "escherichia")]
    #[clap(name = "escherichia")]
    Escherichia,
    /// Klebsiella pneumoniae
    #[strum(ascii_case_insensitive, serialize = "klebsiella")]
    #[clap(name = "klebsiella")]
    Klebsiella,
    /// Mycobacterium tuberculosis, variant based resistance prediction
    #[strum(ascii_case_insensitive, serialize = "mycobacterium")]
    #[clap(name = "mycobacterium")]
    Mycobacterium
}

impl OrganismProfile {
    /// Returns true if outputs of `decoder` can be included in results for this profile
    pub fn accepts(&self, decoder: Decoder) -> bool {
        match decoder {
            // shared by all profiles
            Decoder::Quast |
            Decoder::PostAlignQc |
            Decoder::Bracken |
            Decoder::ReferenceGenome |
            Decoder::ReadMapping |
            Decoder::AnnotationTrack => true,

            Decoder::Mlst |
            Decoder::Cgmlst |
            Decoder::Amrfinder |
            Decoder::Resfinder |
            Decoder::Virulencefinder => *self != OrganismProfile::Mycobacterium,

            Decoder::Serotypefinder => *self == OrganismProfile::Escherichia,

            Decoder::Mykrobe |
            Decoder::Tbprofiler |
            Decoder::SnvVcf |
            Decoder::SvVcf => *self == OrganismProfile::Mycobacterium
        }
    }

    /// Element types that may appear in results for this profile
    pub fn element_types(&self) -> &'static [ElementType] {
        match self {
            OrganismProfile::Staphylococcus |
            OrganismProfile::Escherichia |
            OrganismProfile::Klebsiella => &[ElementType::Amr, ElementType::Stress, ElementType::Virulence],
            OrganismProfile::Mycobacterium => &[ElementType::Amr]
        }
    }

    /// True if Shiga toxin typing is reported from VirulenceFinder hits
    pub fn reports_stx_typing(&self) -> bool {
        *self == OrganismProfile::Escherichia
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_capabilities() {
        assert!(OrganismProfile::Staphylococcus.accepts(Decoder::Amrfinder));
        assert!(!OrganismProfile::Staphylococcus.accepts(Decoder::Serotypefinder));
        assert!(OrganismProfile::Escherichia.accepts(Decoder::Serotypefinder));
        assert!(!OrganismProfile::Mycobacterium.accepts(Decoder::Mlst));
        assert!(OrganismProfile::Mycobacterium.accepts(Decoder::SvVcf));
        assert!(OrganismProfile::Klebsiella.accepts(Decoder::Bracken));

        assert_eq!(OrganismProfile::Mycobacterium.element_types(), &[ElementType::Amr]);
        assert_eq!(OrganismProfile::Klebsiella.element_types().len(), 3);
    }

    #[test]
    fn test_profile_strings() {
        assert_eq!(OrganismProfile::from_str("Mycobacterium").unwrap(), OrganismProfile::Mycobacterium);
        assert_eq!(OrganismProfile::Escherichia.to_string(), "escherichia");
        assert_eq!(serde_json::to_string(&OrganismProfile::Klebsiella).unwrap(), "\"klebsiella\"");
    }
}
