use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data_types::validation::{join_path, check_not_empty, SchemaError, Validate};

/// Top-level categories of resistance and virulence elements
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ElementType {
    /// Antimicrobial resistance
    Amr,
    /// Stress tolerance; e.g., metals and biocides
    Stress,
    /// Virulence factors
    Virulence
}

/// Finer classification of an element, each subtype belongs to exactly one `ElementType`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ElementSubtype {
    Amr,
    /// Known resistance point mutation in a reference gene
    Point,
    Acid,
    Biocide,
    Metal,
    Heat,
    Virulence,
    Antigen,
    Toxin
}

impl ElementSubtype {
    /// The element type this subtype is a member of
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementSubtype::Amr |
            ElementSubtype::Point => ElementType::Amr,

            ElementSubtype::Acid |
            ElementSubtype::Biocide |
            ElementSubtype::Metal |
            ElementSubtype::Heat => ElementType::Stress,

            ElementSubtype::Virulence |
            ElementSubtype::Antigen |
            ElementSubtype::Toxin => ElementType::Virulence
        }
    }
}

/// DNA strand of a hit
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum_macros::EnumIter)]
pub enum SequenceStrand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse
}

/// Tools that produce gene, variant, or phenotype predictions
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize, strum_macros::Display, strum_macros::AsRefStr, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionSoftware {
    Amrfinder,
    Resfinder,
    Virulencefinder,
    Serotypefinder,
    Mykrobe,
    Tbprofiler
}

/// A drug or trait associated with a gene or variant
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PhenotypeInfo {
    /// Name of the drug or trait, lower case
    pub name: String,
    /// Name of the group the trait belongs to, e.g. the drug class
    pub group: Option<String>,
    /// Trait category
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// References supporting the trait
    #[serde(default)]
    pub reference: Vec<String>,
    /// Free text, commonly a confidence grading
    pub note: Option<String>
}

impl PhenotypeInfo {
    /// Minimal constructor for a trait without group, references, or notes
    pub fn new(name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            group: None,
            element_type,
            reference: vec![],
            note: None
        }
    }
}

impl Validate for PhenotypeInfo {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "name"), &self.name)
    }
}

/// Susceptible/resistant partition of drug or trait names
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PhenotypeProfile {
    pub susceptible: BTreeSet<String>,
    pub resistant: BTreeSet<String>
}

impl PhenotypeProfile {
    /// Builds a profile from two name collections
    pub fn new<S, R>(susceptible: S, resistant: R) -> Self
    where
        S: IntoIterator<Item = String>,
        R: IntoIterator<Item = String>
    {
        Self {
            susceptible: susceptible.into_iter().collect(),
            resistant: resistant.into_iter().collect()
        }
    }
}

impl Validate for PhenotypeProfile {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if let Some(name) = self.susceptible.intersection(&self.resistant).next() {
            return Err(SchemaError::ConflictingPhenotype { path: path.to_string(), name: name.clone() });
        }
        Ok(())
    }
}
