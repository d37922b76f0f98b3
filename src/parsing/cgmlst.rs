use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

use crate::data_types::typing::{AlleleCall, CgmlstResult, TypingMethod, TypingMethodResult, TypingResult, TypingSoftware};
use crate::parsing::DecodeError;

/// chewBBACA classifications that mean no allele was called
const MISSING_EXACT: [&str; 4] = ["LNF", "ALM", "ASM", "EXC"];
/// Prefixes of chewBBACA classifications that mean no allele was called, e.g. PLOT3, NIPHEM, LOTSC
const MISSING_PREFIXES: [&str; 3] = ["PLOT", "NIPH", "LOTSC"];
/// Prefix of inferred (novel) alleles
const NOVEL_PREFIX: &str = "INF-";

/// Classified call of one locus
#[derive(Debug, PartialEq)]
enum ChewbbacaCall {
    Missing,
    Novel(AlleleCall),
    Called(AlleleCall)
}

fn classify_call(value: &str, correct_alleles: bool) -> ChewbbacaCall {
    let value = value.trim();
    if value.is_empty()
        || MISSING_EXACT.contains(&value)
        || MISSING_PREFIXES.iter().any(|p| value.starts_with(p)) {
        return ChewbbacaCall::Missing;
    }
    if let Some(allele) = value.strip_prefix(NOVEL_PREFIX) {
        let call = match (correct_alleles, allele.parse::<u64>()) {
            (true, Ok(number)) => AlleleCall::Allele(number),
            _ => AlleleCall::Label(value.to_string())
        };
        return ChewbbacaCall::Novel(call);
    }
    match value.parse::<u64>() {
        Ok(number) => ChewbbacaCall::Called(AlleleCall::Allele(number)),
        Err(_) => ChewbbacaCall::Called(AlleleCall::Label(value.to_string()))
    }
}

/// Parses a chewBBACA `results_alleles.tsv` with a single sample row.
/// # Arguments
/// * `filename` - the allele profile
/// * `correct_alleles` - if true, novel `INF-<n>` alleles are reported as the integer `<n>`
/// # Errors
/// * if the file cannot be read or has no sample row
/// * if the sample row and the header have a different number of columns
pub fn parse_cgmlst(filename: &Path, correct_alleles: bool) -> anyhow::Result<TypingMethodResult> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let headers = csv_reader.headers()
        .with_context(|| format!("Error while reading header of {filename:?}:"))?
        .clone();
    let row = csv_reader.records()
        .next()
        .transpose()
        .with_context(|| format!("Error while reading {filename:?}:"))?
        .ok_or_else(|| DecodeError::MissingField { field: "sample row".to_string() })
        .with_context(|| format!("Error while parsing {filename:?}:"))?;
    if row.len() != headers.len() {
        return Err(DecodeError::ColumnCount { expected: headers.len(), found: row.len() })
            .with_context(|| format!("Error while parsing {filename:?}:"));
    }

    let mut alleles: IndexMap<String, Option<AlleleCall>> = Default::default();
    let (mut n_missing, mut n_novel) = (0, 0);
    // first column is the sample file name
    for (locus, value) in headers.iter().zip(row.iter()).skip(1) {
        let locus = locus.strip_suffix(".fasta").unwrap_or(locus).to_string();
        let call = match classify_call(value, correct_alleles) {
            ChewbbacaCall::Missing => {
                n_missing += 1;
                None
            },
            ChewbbacaCall::Novel(call) => {
                n_novel += 1;
                Some(call)
            },
            ChewbbacaCall::Called(call) => Some(call)
        };
        alleles.insert(locus, call);
    }
    debug!("cgMLST profile from {filename:?}: {} loci, {n_missing} missing, {n_novel} novel", alleles.len());

    Ok(TypingMethodResult {
        method: TypingMethod::Cgmlst,
        software: TypingSoftware::Chewbbaca,
        result: TypingResult::Cgmlst(CgmlstResult {
            n_novel,
            n_missing,
            alleles
        })
    })
}
