use serde::{Deserialize, Serialize};

use crate::data_types::validation::{check_not_empty, check_range, join_path, SchemaError, Validate};

/// One species abundance estimate
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpeciesHit {
    pub scientific_name: String,
    pub taxonomy_id: u64,
    /// Taxonomic rank code, e.g. S for species
    pub taxonomy_lvl: Option<String>,
    pub kraken_assigned_reads: u64,
    pub added_reads: u64,
    pub fraction_total_reads: f64
}

impl Validate for SpeciesHit {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "scientific_name"), &self.scientific_name)?;
        check_range(&join_path(path, "fraction_total_reads"), self.fraction_total_reads, 0.0, 1.0)
    }
}

/// Species composition of a sample, most abundant first
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpeciesPrediction {
    pub software: String,
    pub hits: Vec<SpeciesHit>
}

impl Validate for SpeciesPrediction {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        let hits_path = join_path(path, "hits");
        for (i, hit) in self.hits.iter().enumerate() {
            hit.validate(&format!("{hits_path}[{i}]"))?;
        }
        if let Some(i) = self.hits.windows(2).position(|w| w[0].fraction_total_reads < w[1].fraction_total_reads) {
            return Err(SchemaError::InvalidField {
                path: format!("{hits_path}[{}]", i + 1),
                reason: "hits must be sorted by fraction_total_reads, descending".to_string()
            });
        }
        Ok(())
    }
}
