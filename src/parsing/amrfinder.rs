use anyhow::Context;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use crate::data_types::method_result::MethodResult;
use crate::data_types::phenotype::{ElementSubtype, ElementType, PhenotypeInfo, PhenotypeProfile, PredictionSoftware, SequenceStrand};
use crate::data_types::records::{ElementTypeResult, GeneDetails, GeneRecord};
use crate::parsing::DecodeError;

/// Columns that must be present in the report; the serde renames below map them onto `AmrfinderRow`
const REQUIRED_COLUMNS: [&str; 16] = [
    "Contig id", "Start", "Stop", "Strand", "Gene symbol", "Sequence name", "Element type", "Element subtype",
    "Class", "Subclass", "Method", "Reference sequence length", "% Coverage of reference sequence",
    "% Identity to reference sequence", "Accession of closest sequence", "Name of closest sequence"
];

/// One row of an AMRFinderPlus report; `NA` cells become `None`
#[derive(Debug, Deserialize)]
struct AmrfinderRow {
    #[serde(rename = "Contig id")]
    contig_id: String,
    #[serde(rename = "Start")]
    start: String,
    #[serde(rename = "Stop")]
    stop: String,
    #[serde(rename = "Strand")]
    strand: String,
    #[serde(rename = "Gene symbol")]
    gene_symbol: String,
    #[serde(rename = "Sequence name")]
    sequence_name: String,
    #[serde(rename = "Element type")]
    element_type: String,
    #[serde(rename = "Element subtype")]
    element_subtype: String,
    #[serde(rename = "Class")]
    class: String,
    #[serde(rename = "Subclass")]
    subclass: String,
    #[serde(rename = "Method")]
    method: String,
    #[serde(rename = "Reference sequence length")]
    ref_length: String,
    #[serde(rename = "% Coverage of reference sequence")]
    coverage: String,
    #[serde(rename = "% Identity to reference sequence")]
    identity: String,
    #[serde(rename = "Accession of closest sequence")]
    accession: String,
    #[serde(rename = "Name of closest sequence")]
    closest_sequence_name: String
}

/// `NA` and empty cells are missing values
fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "NA" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Numeric cell where `NA` and empty cells are missing values; anything else must parse
fn optional_number<T: FromStr>(field: &str, value: &str) -> Result<Option<T>, DecodeError> {
    match optional_text(value) {
        Some(text) => text.parse::<T>()
            .map(Some)
            .map_err(|_| DecodeError::InvalidValue { field: field.to_string(), value: text }),
        None => Ok(None)
    }
}

/// Lower-cased subclasses, AMRFinder joins several with `/`
fn subclass_names(subclass: Option<&str>) -> Vec<String> {
    subclass.map(|s| {
        s.split('/')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }).unwrap_or_default()
}

impl AmrfinderRow {
    fn into_gene(self) -> Result<GeneRecord, DecodeError> {
        let element_type = ElementType::from_str(self.element_type.trim())
            .map_err(|_| DecodeError::InvalidValue { field: "Element type".to_string(), value: self.element_type.clone() })?;
        let element_subtype = ElementSubtype::from_str(self.element_subtype.trim())
            .map_err(|_| DecodeError::InvalidValue { field: "Element subtype".to_string(), value: self.element_subtype.clone() })?;
        let strand = match self.strand.trim() {
            "+" => Some(SequenceStrand::Forward),
            "-" => Some(SequenceStrand::Reverse),
            _ => None
        };

        let res_class = optional_text(&self.class);
        let res_subclass = optional_text(&self.subclass);
        let phenotypes = match element_type {
            ElementType::Virulence => vec![],
            _ => subclass_names(res_subclass.as_deref()).into_iter()
                .map(|name| PhenotypeInfo {
                    group: res_class.as_ref().map(|c| c.to_lowercase()),
                    ..PhenotypeInfo::new(name, element_type)
                })
                .collect()
        };

        // point mutation and partial hits may only name the closest reference sequence
        let sequence_name = optional_text(&self.sequence_name)
            .or_else(|| optional_text(&self.closest_sequence_name));

        Ok(GeneRecord {
            gene_symbol: optional_text(&self.gene_symbol),
            accession: optional_text(&self.accession),
            sequence_name,
            element_type,
            element_subtype,
            ref_start_pos: None,
            ref_end_pos: None,
            ref_gene_length: optional_number("Reference sequence length", &self.ref_length)?,
            contig_id: optional_text(&self.contig_id),
            query_start_pos: optional_number("Start", &self.start)?,
            query_end_pos: optional_number("Stop", &self.stop)?,
            strand,
            identity: optional_number("% Identity to reference sequence", &self.identity)?,
            coverage: optional_number("% Coverage of reference sequence", &self.coverage)?,
            method: optional_text(&self.method),
            phenotypes,
            details: GeneDetails::Amrfinder { res_class, res_subclass }
        })
    }
}

/// All hits from one AMRFinderPlus report
#[derive(Clone, Debug)]
pub struct AmrfinderReport {
    genes: Vec<GeneRecord>
}

impl AmrfinderReport {
    /// Loads an AMRFinderPlus TSV report; point mutation rows are kept as genes with the POINT subtype.
    /// # Errors
    /// * if the file cannot be read
    /// * if a required column is missing, see `REQUIRED_COLUMNS`
    /// * if an element type or subtype is not recognized
    /// * if a position, length, coverage, or identity cell is neither `NA` nor a number
    pub fn from_tsv(filename: &Path) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?;

        let headers = csv_reader.headers()
            .with_context(|| format!("Error while reading header of {filename:?}:"))?;
        if let Some(column) = REQUIRED_COLUMNS.iter().find(|c| !headers.iter().any(|h| h == **c)) {
            return Err(DecodeError::MissingColumn { column: column.to_string() })
                .with_context(|| format!("Error while parsing {filename:?}:"));
        }

        let mut genes = vec![];
        for (row_index, result) in csv_reader.deserialize().enumerate() {
            let row: AmrfinderRow = result
                .with_context(|| format!("Error while parsing row {} of {filename:?}:", row_index + 1))?;
            let gene = row.into_gene()
                .with_context(|| format!("Error while parsing row {} of {filename:?}:", row_index + 1))?;
            genes.push(gene);
        }
        debug!("Loaded {} AMRFinder hits from {filename:?}", genes.len());
        Ok(Self { genes })
    }

    /// Genes and phenotype profile for one element type.
    /// The resistant set holds the lower-cased subclasses of the hits; AMRFinder does not report susceptibility.
    pub fn prediction(&self, element_type: ElementType) -> MethodResult {
        let genes: Vec<GeneRecord> = self.genes.iter()
            .filter(|g| g.element_type == element_type)
            .cloned()
            .collect();
        let resistant: BTreeSet<String> = genes.iter()
            .flat_map(|g| g.phenotypes.iter().map(|p| p.name.clone()))
            .collect();

        MethodResult::new(
            element_type,
            PredictionSoftware::Amrfinder,
            ElementTypeResult {
                phenotypes: PhenotypeProfile::new(vec![], resistant),
                genes,
                variants: vec![]
            }
        )
    }
}
