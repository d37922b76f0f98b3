use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::data_types::metadata::{RunInformation, RunMetadata, SoupVersion};
use crate::util::json_io::load_json;

/// A process metadata file holds either one version entry or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum ProcessMetadata {
    Many(Vec<SoupVersion>),
    One(SoupVersion)
}

/// Loads the run information written by the pipeline
/// # Errors
/// * if the file cannot be read or is missing required fields
pub fn load_run_information(filename: &Path) -> anyhow::Result<RunInformation> {
    let run: RunInformation = load_json(filename)?;
    debug!("Loaded run information for {} from {filename:?}", run.sample_name);
    Ok(run)
}

/// Loads the software and database versions from process metadata files, in the order given
/// # Errors
/// * if any file cannot be read or parsed
pub fn load_process_metadata(filenames: &[PathBuf]) -> anyhow::Result<Vec<SoupVersion>> {
    let mut versions = vec![];
    for filename in filenames.iter() {
        match load_json::<ProcessMetadata>(filename)? {
            ProcessMetadata::Many(entries) => versions.extend(entries),
            ProcessMetadata::One(entry) => versions.push(entry)
        };
    }
    debug!("Loaded {} software versions from {} process metadata files", versions.len(), filenames.len());
    Ok(versions)
}

/// Builds the run metadata block from the run information and any process metadata files
pub fn load_run_metadata(run_filename: &Path, process_filenames: &[PathBuf]) -> anyhow::Result<RunMetadata> {
    Ok(RunMetadata {
        run: load_run_information(run_filename)?,
        databases: load_process_metadata(process_filenames)?
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::metadata::SoupType;

    #[test]
    fn test_run_metadata() {
        let metadata = load_run_metadata(
            &PathBuf::from("test_data/metadata/run_metadata.json"),
            &[
                PathBuf::from("test_data/metadata/process_metadata.json"),
                PathBuf::from("test_data/metadata/single_process_metadata.json")
            ]
        ).unwrap();
        assert_eq!(metadata.run.pipeline, "JASEN");
        assert_eq!(metadata.run.configuration_files.len(), 2);
        assert_eq!(metadata.run.sequencing_type.as_deref(), Some("PE"));

        let names: Vec<&str> = metadata.databases.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["bwa", "freebayes", "kraken-database"]);
        assert_eq!(metadata.databases[2].kind, SoupType::Database);
    }

    #[test]
    fn test_missing_required_field() {
        // the process metadata is not run information
        assert!(load_run_information(&PathBuf::from("test_data/metadata/single_process_metadata.json")).is_err());
    }
}
