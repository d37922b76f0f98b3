use anyhow::bail;
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use std::path::Path;

use crate::cli::annotate_sv::AnnotateSvSettings;
use crate::cli::create_cdm_input::CreateCdmInputSettings;
use crate::cli::create_output::CreateOutputSettings;
use crate::cli::print_schema::PrintSchemaSettings;
use crate::cli::validate::ValidateSettings;
use crate::data_types::pipeline_result::PipelineParseError;
use crate::data_types::validation::SchemaError;
use crate::parsing::{ConsistencyError, DecodeError};

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.3.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.3.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string containing the legalese.
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2023-{}     The PRP developers
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// PRP, pipeline result processing for bacterial genomics.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Combines the tool outputs of one sample into a validated result file
    CreateOutput(Box<CreateOutputSettings>),
    /// Validates an existing result file
    Validate(Box<ValidateSettings>),
    /// Annotates a structural variant VCF with the genes it overlaps
    AnnotateSv(Box<AnnotateSvSettings>),
    /// Exports the QC metrics of one sample for the sample database
    CreateCdmInput(Box<CreateCdmInputSettings>),
    /// Prints the JSON Schema of the result file
    PrintSchema(Box<PrintSchemaSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_optional_filename(opt_filename: Option<&Path>, label: &str) -> anyhow::Result<()> {
    if let Some(filename) = opt_filename {
        check_required_filename(filename, label)?;
    }

    // file either was not specified OR it exists
    Ok(())
}

/// Picks the process exit code for a failed run.
/// Conflicting inputs are usage errors, malformed inputs and invalid results are data errors.
pub fn error_exit_code(error: &anyhow::Error) -> exitcode::ExitCode {
    if error.downcast_ref::<ConsistencyError>().is_some() {
        exitcode::USAGE
    } else if error.downcast_ref::<DecodeError>().is_some() ||
        error.downcast_ref::<SchemaError>().is_some() ||
        error.downcast_ref::<PipelineParseError>().is_some() {
        exitcode::DATAERR
    } else if error.chain().any(|e| e.downcast_ref::<std::io::Error>().is_some()) {
        exitcode::IOERR
    } else {
        // csv and serde failures on otherwise readable files
        exitcode::DATAERR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn test_check_filenames() {
        assert!(check_required_filename(&PathBuf::from("test_data/vcf/snv.vcf"), "SNV VCF").is_ok());
        let err = check_required_filename(&PathBuf::from("test_data/vcf/missing.vcf"), "SNV VCF").unwrap_err();
        assert_eq!(err.to_string(), "SNV VCF does not exist: \"test_data/vcf/missing.vcf\"");
        assert!(check_optional_filename(None, "SV VCF").is_ok());
    }

    #[test]
    fn test_error_exit_code() {
        let consistency: anyhow::Error = ConsistencyError::MissingReferenceContig { accession: "NC_000962.3".to_string() }.into();
        assert_eq!(error_exit_code(&consistency), exitcode::USAGE);

        let decode = Err::<(), _>(DecodeError::MissingColumn { column: "Class".to_string() })
            .context("Error while parsing amrfinder.tsv:")
            .unwrap_err();
        assert_eq!(error_exit_code(&decode), exitcode::DATAERR);

        let io = Err::<(), _>(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
            .context("Error while opening sample.json:")
            .unwrap_err();
        assert_eq!(error_exit_code(&io), exitcode::IOERR);
    }
}
