use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data_types::records::GeneRecord;
use crate::data_types::validation::{check_not_empty, check_optional_range, join_path, SchemaError, Validate};

/// Typing schemes
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumIter)]
pub enum TypingMethod {
    #[serde(rename = "mlst")]
    Mlst,
    #[serde(rename = "cgmlst")]
    Cgmlst,
    #[serde(rename = "lineage")]
    Lineage,
    /// Shiga toxin typing
    #[serde(rename = "stx")]
    Stx,
    #[serde(rename = "O_type")]
    OType,
    #[serde(rename = "H_type")]
    HType
}

/// Tools reporting typing results
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TypingSoftware {
    Mlst,
    Chewbbaca,
    Mykrobe,
    Tbprofiler,
    Virulencefinder,
    Serotypefinder
}

/// A single allele call; numbered alleles are integers, anything else (novel, partial, ambiguous) is kept verbatim
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AlleleCall {
    Allele(u64),
    Label(String)
}

/// 7-gene MLST
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MlstResult {
    pub scheme: String,
    /// `None` if no sequence type could be assigned
    pub sequence_type: Option<u64>,
    /// Allele calls by locus, `None` if the report has no call for the locus
    pub alleles: IndexMap<String, Option<AlleleCall>>
}

/// Core-genome MLST
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CgmlstResult {
    pub n_novel: u64,
    pub n_missing: u64,
    pub alleles: IndexMap<String, Option<AlleleCall>>
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LineageInformation {
    pub lineage: String,
    pub family: Option<String>,
    pub spoligotype: Option<String>,
    pub rd: Option<String>,
    /// Fraction of reads supporting the lineage
    pub fraction: Option<f64>
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LineageResult {
    pub main_lineage: Option<String>,
    pub sub_lineage: Option<String>,
    pub lineages: Vec<LineageInformation>
}

/// Typing payloads. Variant order matters for untagged parsing, the most specific shapes go first.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TypingResult {
    Gene(Box<GeneRecord>),
    Mlst(MlstResult),
    Cgmlst(CgmlstResult),
    Lineage(LineageResult)
}

impl TypingResult {
    /// True if the result carries no typing information
    pub fn is_empty(&self) -> bool {
        match self {
            TypingResult::Gene(_) => false,
            TypingResult::Mlst(r) => r.sequence_type.is_none() && r.alleles.is_empty(),
            TypingResult::Cgmlst(r) => r.alleles.is_empty(),
            TypingResult::Lineage(r) => r.main_lineage.is_none() && r.sub_lineage.is_none() && r.lineages.is_empty()
        }
    }
}

/// One typing entry of the sample result
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TypingMethodResult {
    #[serde(rename = "type")]
    pub method: TypingMethod,
    pub software: TypingSoftware,
    pub result: TypingResult
}

impl TypingMethodResult {
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

impl Validate for TypingMethodResult {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        let result_path = join_path(path, "result");
        match (self.method, &self.result) {
            (TypingMethod::Mlst, TypingResult::Mlst(r)) => {
                check_not_empty(&join_path(&result_path, "scheme"), &r.scheme)
            },
            (TypingMethod::Cgmlst, TypingResult::Cgmlst(r)) => {
                let n_called = r.alleles.len() as u64;
                if r.n_missing + r.n_novel > n_called {
                    return Err(SchemaError::InvalidField {
                        path: join_path(&result_path, "n_missing"),
                        reason: format!("{} missing + {} novel alleles exceed {n_called} loci", r.n_missing, r.n_novel)
                    });
                }
                Ok(())
            },
            (TypingMethod::Lineage, TypingResult::Lineage(r)) => {
                let lineage_path = join_path(&result_path, "lineages");
                for (i, lin) in r.lineages.iter().enumerate() {
                    let entry_path = format!("{lineage_path}[{i}]");
                    check_not_empty(&join_path(&entry_path, "lineage"), &lin.lineage)?;
                    check_optional_range(&join_path(&entry_path, "fraction"), lin.fraction, 0.0, 1.0)?;
                }
                Ok(())
            },
            (TypingMethod::Stx, TypingResult::Gene(gene)) |
            (TypingMethod::OType, TypingResult::Gene(gene)) |
            (TypingMethod::HType, TypingResult::Gene(gene)) => {
                gene.validate(&result_path)
            },
            (method, _) => Err(SchemaError::InvalidField {
                path: result_path,
                reason: format!("result does not match the {method} typing method")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_typing_results() {
        let mlst = TypingResult::Mlst(MlstResult {
            scheme: "saureus".to_string(),
            sequence_type: Some(8),
            alleles: [("arcC".to_string(), Some(AlleleCall::Allele(3))), ("aroE".to_string(), Some(AlleleCall::Label("~3".to_string())))]
                .into_iter().collect()
        });
        let text = serde_json::to_string(&mlst).unwrap();
        assert_eq!(serde_json::from_str::<TypingResult>(&text).unwrap(), mlst);

        let lineage = TypingResult::Lineage(LineageResult {
            main_lineage: Some("lineage4".to_string()),
            sub_lineage: Some("lineage4.9".to_string()),
            lineages: vec![]
        });
        let text = serde_json::to_string(&lineage).unwrap();
        assert_eq!(serde_json::from_str::<TypingResult>(&text).unwrap(), lineage);
    }

    #[test]
    fn test_method_mismatch() {
        let entry = TypingMethodResult {
            method: TypingMethod::Cgmlst,
            software: TypingSoftware::Mlst,
            result: TypingResult::Lineage(LineageResult { main_lineage: None, sub_lineage: None, lineages: vec![] })
        };
        assert!(entry.is_empty());
        assert!(entry.validate("typing_result[0]").is_err());
    }

    #[test]
    fn test_cgmlst_counts() {
        let entry = TypingMethodResult {
            method: TypingMethod::Cgmlst,
            software: TypingSoftware::Chewbbaca,
            result: TypingResult::Cgmlst(CgmlstResult {
                n_novel: 1,
                n_missing: 1,
                alleles: [("l1".to_string(), None)].into_iter().collect()
            })
        };
        assert!(entry.validate("t").is_err());
    }
}
