use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::data_types::typing::{AlleleCall, MlstResult, TypingMethod, TypingMethodResult, TypingResult, TypingSoftware};
use crate::parsing::DecodeError;
use crate::util::json_io::load_json;

/// One entry of the `mlst --json` output
#[derive(Debug, Deserialize)]
struct MlstEntry {
    scheme: String,
    sequence_type: String,
    #[serde(default)]
    alleles: IndexMap<String, String>
}

/// Converts an mlst allele call; missing (`-`), novel (`~3`), partial (`3?`) and multiple (`4,5`) calls are kept as labels.
/// Only an empty cell has no call.
fn parse_allele(value: &str) -> Option<AlleleCall> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<u64>() {
        Ok(allele) => Some(AlleleCall::Allele(allele)),
        Err(_) => Some(AlleleCall::Label(value.to_string()))
    }
}

/// Parses the JSON report of `mlst`; the first entry is the sample.
/// A sequence type of `-` means no sequence type could be assigned.
/// # Errors
/// * if the file cannot be read
/// * if the report has no entries or the sequence type is neither `-` nor a number
pub fn parse_mlst(filename: &Path) -> anyhow::Result<TypingMethodResult> {
    let entries: Vec<MlstEntry> = load_json(filename)?;
    let entry = entries.into_iter()
        .next()
        .ok_or_else(|| DecodeError::MissingField { field: "sequence_type".to_string() })
        .with_context(|| format!("Error while parsing {filename:?}:"))?;

    let sequence_type = match entry.sequence_type.trim() {
        "-" | "" => None,
        st => Some(st.parse::<u64>()
            .map_err(|_| DecodeError::InvalidValue { field: "sequence_type".to_string(), value: st.to_string() })
            .with_context(|| format!("Error while parsing {filename:?}:"))?)
    };
    let alleles: IndexMap<String, Option<AlleleCall>> = entry.alleles.iter()
        .map(|(locus, value)| (locus.clone(), parse_allele(value)))
        .collect();
    debug!("MLST scheme {} with sequence type {sequence_type:?} from {filename:?}", entry.scheme);

    Ok(TypingMethodResult {
        method: TypingMethod::Mlst,
        software: TypingSoftware::Mlst,
        result: TypingResult::Mlst(MlstResult {
            scheme: entry.scheme,
            sequence_type,
            alleles
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unwrap_mlst(result: TypingMethodResult) -> MlstResult {
        match result.result {
            TypingResult::Mlst(r) => r,
            other => panic!("unexpected result: {other:?}")
        }
    }

    #[test]
    fn test_parse_mlst() {
        let mlst = unwrap_mlst(parse_mlst(&PathBuf::from("test_data/mlst/mlst.json")).unwrap());
        assert_eq!(mlst.scheme, "saureus");
        assert_eq!(mlst.sequence_type, Some(239));
        assert_eq!(mlst.alleles.len(), 7);
        assert_eq!(mlst.alleles["arcC"], Some(AlleleCall::Allele(2)));
    }

    #[test]
    fn test_parse_allele() {
        assert_eq!(parse_allele("12"), Some(AlleleCall::Allele(12)));
        assert_eq!(parse_allele(" - "), Some(AlleleCall::Label("-".to_string())));
        assert_eq!(parse_allele(""), None);
    }

    #[test]
    fn test_unknown_sequence_type() {
        let mlst = unwrap_mlst(parse_mlst(&PathBuf::from("test_data/mlst/mlst_novel.json")).unwrap());
        assert_eq!(mlst.sequence_type, None);
        assert_eq!(mlst.alleles["aroE"], Some(AlleleCall::Label("~3".to_string())));
        assert_eq!(mlst.alleles["glpF"], Some(AlleleCall::Label("1?".to_string())));
        assert_eq!(mlst.alleles["gmk"], Some(AlleleCall::Label("-".to_string())));
        assert_eq!(mlst.alleles["tpi"], Some(AlleleCall::Label("4,5".to_string())));
    }
}
