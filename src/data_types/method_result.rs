use serde::{Deserialize, Serialize};

use crate::data_types::phenotype::{ElementType, PredictionSoftware};
use crate::data_types::records::ElementTypeResult;
use crate::data_types::validation::{join_path, SchemaError, Validate};

/// Prediction for one element type, as reported by one tool
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MethodResult {
    /// The element type this prediction targets
    #[serde(rename = "type")]
    pub category: ElementType,
    pub software: PredictionSoftware,
    pub result: ElementTypeResult
}

impl MethodResult {
    pub fn new(category: ElementType, software: PredictionSoftware, result: ElementTypeResult) -> Self {
        Self { category, software, result }
    }

    /// See `ElementTypeResult::is_empty`
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

impl Validate for MethodResult {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        let result_path = join_path(path, "result");
        self.result.validate(&result_path)?;

        // every gene must belong to the targeted category
        let genes_path = join_path(&result_path, "genes");
        for (i, gene) in self.result.genes.iter().enumerate() {
            if gene.element_type != self.category {
                return Err(SchemaError::InvalidField {
                    path: format!("{genes_path}[{i}].element_type"),
                    reason: format!("{} gene in a {} result", gene.element_type, self.category)
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::records::tests::mock_gene;

    #[test]
    fn test_category_mismatch() {
        let result = ElementTypeResult {
            genes: vec![mock_gene()],
            ..Default::default()
        };
        let amr = MethodResult::new(ElementType::Amr, PredictionSoftware::Amrfinder, result.clone());
        assert!(amr.validate("element_type_result[0]").is_ok());

        let stress = MethodResult::new(ElementType::Stress, PredictionSoftware::Amrfinder, result);
        assert_eq!(
            stress.validate("element_type_result[0]").unwrap_err(),
            SchemaError::InvalidField {
                path: "element_type_result[0].result.genes[0].element_type".to_string(),
                reason: "AMR gene in a STRESS result".to_string()
            }
        );
    }
}
