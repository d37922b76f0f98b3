use serde::{Deserialize, Serialize};

use crate::data_types::validation::{check_not_empty, join_path, validate_all, SchemaError, Validate};

/// Kind of a versioned third-party component
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum_macros::EnumIter)]
pub enum SoupType {
    #[serde(rename = "database")]
    Database,
    #[serde(rename = "software")]
    Software
}

/// Software Of Unknown Provenance; any database or tool whose version affects reproducibility
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct SoupVersion {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: SoupType
}

impl SoupVersion {
    pub fn database(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind: SoupType::Database
        }
    }

    pub fn software(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind: SoupType::Software
        }
    }
}

impl Validate for SoupVersion {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "name"), &self.name)?;
        check_not_empty(&join_path(path, "version"), &self.version)
    }
}

/// Information about the pipeline run that produced the sample results
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RunInformation {
    pub pipeline: String,
    pub version: String,
    pub commit: Option<String>,
    pub analysis_profile: Option<String>,
    #[serde(default)]
    pub configuration_files: Vec<String>,
    pub workflow_name: Option<String>,
    pub sample_name: String,
    pub lims_id: Option<String>,
    pub sequencing_run: Option<String>,
    pub sequencing_platform: Option<String>,
    pub sequencing_type: Option<String>,
    pub command: Option<String>,
    pub date: String
}

impl Validate for RunInformation {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "pipeline"), &self.pipeline)?;
        check_not_empty(&join_path(path, "version"), &self.version)?;
        check_not_empty(&join_path(path, "sample_name"), &self.sample_name)?;
        check_not_empty(&join_path(path, "date"), &self.date)
    }
}

/// Run information plus every database/software version reported while decoding
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RunMetadata {
    pub run: RunInformation,
    pub databases: Vec<SoupVersion>
}

impl Validate for RunMetadata {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        self.run.validate(&join_path(path, "run"))?;
        validate_all(&join_path(path, "databases"), &self.databases)
    }
}
