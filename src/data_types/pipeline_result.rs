use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_types::metadata::RunMetadata;
use crate::data_types::method_result::MethodResult;
use crate::data_types::profile::OrganismProfile;
use crate::data_types::qc::QcMethodResult;
use crate::data_types::records::VariantRecord;
use crate::data_types::species::SpeciesPrediction;
use crate::data_types::typing::TypingMethodResult;
use crate::data_types::validation::{check_not_empty, join_path, validate_all, SchemaError, Validate};

/// Version of the output format written by this crate; readers reject anything else
pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

/// Reference genome the reads were mapped to
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ReferenceGenome {
    pub name: String,
    pub accession: String,
    /// FASTA file name
    pub fasta: String,
    /// FASTA index file name, if one exists
    pub fasta_index: Option<String>,
    /// Gene annotation (GFF) file name
    pub genes: String
}

impl Validate for ReferenceGenome {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "name"), &self.name)?;
        check_not_empty(&join_path(path, "accession"), &self.accession)?;
        check_not_empty(&join_path(path, "fasta"), &self.fasta)?;
        check_not_empty(&join_path(path, "genes"), &self.genes)
    }
}

/// A file that can be displayed as a track on the reference genome
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnnotationTrack {
    pub name: String,
    pub file: String
}

impl Validate for AnnotationTrack {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "name"), &self.name)?;
        check_not_empty(&join_path(path, "file"), &self.file)
    }
}

/// Unvalidated contents of a `PipelineResult`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PipelineResultParts {
    pub sample_id: String,
    pub schema_version: u32,
    pub profile: OrganismProfile,
    pub run_metadata: RunMetadata,
    #[serde(default)]
    pub qc: Vec<QcMethodResult>,
    #[serde(default)]
    pub species_prediction: Option<SpeciesPrediction>,
    #[serde(default)]
    pub typing_result: Vec<TypingMethodResult>,
    #[serde(default)]
    pub element_type_result: Vec<MethodResult>,
    #[serde(default)]
    pub reference_genome: Option<ReferenceGenome>,
    /// Read mapping file name
    #[serde(default)]
    pub read_mapping: Option<String>,
    #[serde(default)]
    pub genome_annotation: Option<Vec<AnnotationTrack>>,
    #[serde(default)]
    pub snv_variants: Option<Vec<VariantRecord>>,
    #[serde(default)]
    pub sv_variants: Option<Vec<VariantRecord>>
}

impl Validate for PipelineResultParts {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "sample_id"), &self.sample_id)?;
        if self.schema_version != OUTPUT_SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedSchemaVersion {
                found: self.schema_version.into(),
                expected: OUTPUT_SCHEMA_VERSION
            });
        }
        self.run_metadata.validate(&join_path(path, "run_metadata"))?;
        validate_all(&join_path(path, "qc"), &self.qc)?;
        if let Some(species) = self.species_prediction.as_ref() {
            species.validate(&join_path(path, "species_prediction"))?;
        }
        validate_all(&join_path(path, "typing_result"), &self.typing_result)?;

        let etr_path = join_path(path, "element_type_result");
        validate_all(&etr_path, &self.element_type_result)?;
        let allowed = self.profile.element_types();
        for (i, method) in self.element_type_result.iter().enumerate() {
            if !allowed.contains(&method.category) {
                return Err(SchemaError::UnsupportedElementType {
                    path: format!("{etr_path}[{i}].type"),
                    element_type: method.category,
                    profile: self.profile
                });
            }
        }

        if let Some(reference) = self.reference_genome.as_ref() {
            reference.validate(&join_path(path, "reference_genome"))?;
            if self.read_mapping.is_none() {
                return Err(SchemaError::InvalidField {
                    path: join_path(path, "read_mapping"),
                    reason: "a reference genome requires the read mapping".to_string()
                });
            }
        }
        if let Some(tracks) = self.genome_annotation.as_ref() {
            validate_all(&join_path(path, "genome_annotation"), tracks)?;
        }
        if let Some(variants) = self.snv_variants.as_ref() {
            validate_all(&join_path(path, "snv_variants"), variants)?;
        }
        if let Some(variants) = self.sv_variants.as_ref() {
            validate_all(&join_path(path, "sv_variants"), variants)?;
        }
        Ok(())
    }
}

/// The validated result for one sample.
/// Can only be obtained through `PipelineResult::new` or deserialization, both of which validate the full graph.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "PipelineResultParts")]
pub struct PipelineResult {
    sample_id: String,
    schema_version: u32,
    profile: OrganismProfile,
    run_metadata: RunMetadata,
    qc: Vec<QcMethodResult>,
    species_prediction: Option<SpeciesPrediction>,
    typing_result: Vec<TypingMethodResult>,
    element_type_result: Vec<MethodResult>,
    reference_genome: Option<ReferenceGenome>,
    read_mapping: Option<String>,
    genome_annotation: Option<Vec<AnnotationTrack>>,
    snv_variants: Option<Vec<VariantRecord>>,
    sv_variants: Option<Vec<VariantRecord>>
}

impl PipelineResult {
    /// Validates all parts and builds the result, nothing is constructed if any nested record is invalid.
    /// # Arguments
    /// * `parts` - the collected sample results
    /// # Errors
    /// * the first `SchemaError` found, with the full path to the failing field
    pub fn new(parts: PipelineResultParts) -> Result<Self, SchemaError> {
        parts.validate("")?;
        let PipelineResultParts {
            sample_id, schema_version, profile, run_metadata, qc, species_prediction, typing_result,
            element_type_result, reference_genome, read_mapping, genome_annotation, snv_variants, sv_variants
        } = parts;
        Ok(Self {
            sample_id, schema_version, profile, run_metadata, qc, species_prediction, typing_result,
            element_type_result, reference_genome, read_mapping, genome_annotation, snv_variants, sv_variants
        })
    }

    /// Parses a result document, rejecting unknown schema versions before looking at anything else
    pub fn from_value(value: Value) -> Result<Self, PipelineParseError> {
        check_schema_version(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn profile(&self) -> OrganismProfile {
        self.profile
    }

    pub fn run_metadata(&self) -> &RunMetadata {
        &self.run_metadata
    }

    pub fn qc(&self) -> &[QcMethodResult] {
        &self.qc
    }

    pub fn species_prediction(&self) -> Option<&SpeciesPrediction> {
        self.species_prediction.as_ref()
    }

    pub fn typing_result(&self) -> &[TypingMethodResult] {
        &self.typing_result
    }

    pub fn element_type_result(&self) -> &[MethodResult] {
        &self.element_type_result
    }

    pub fn reference_genome(&self) -> Option<&ReferenceGenome> {
        self.reference_genome.as_ref()
    }

    pub fn read_mapping(&self) -> Option<&str> {
        self.read_mapping.as_deref()
    }

    pub fn genome_annotation(&self) -> Option<&[AnnotationTrack]> {
        self.genome_annotation.as_deref()
    }

    pub fn snv_variants(&self) -> Option<&[VariantRecord]> {
        self.snv_variants.as_deref()
    }

    pub fn sv_variants(&self) -> Option<&[VariantRecord]> {
        self.sv_variants.as_deref()
    }
}

impl TryFrom<PipelineResultParts> for PipelineResult {
    type Error = SchemaError;

    fn try_from(parts: PipelineResultParts) -> Result<Self, Self::Error> {
        Self::new(parts)
    }
}

/// Failure to read a result document
#[derive(thiserror::Error, Debug)]
pub enum PipelineParseError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("invalid result document: {0}")]
    Json(#[from] serde_json::Error)
}

/// Checks the `schema_version` of a raw result document
pub fn check_schema_version(value: &Value) -> Result<(), SchemaError> {
    let found = value.get("schema_version")
        .and_then(|v| v.as_i64())
        .ok_or(SchemaError::MissingSchemaVersion)?;
    if found != i64::from(OUTPUT_SCHEMA_VERSION) {
        return Err(SchemaError::UnsupportedSchemaVersion { found, expected: OUTPUT_SCHEMA_VERSION });
    }
    Ok(())
}
