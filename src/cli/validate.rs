use anyhow::Context;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::data_types::pipeline_result::PipelineResult;
use crate::util::json_io::load_json_value;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ValidateSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    prp_version: String,

    /// Result file to validate (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_filename: PathBuf,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_validate_settings(mut settings: ValidateSettings) -> anyhow::Result<ValidateSettings> {
    // hard code the version in
    settings.prp_version = FULL_VERSION.clone();
    info!("PRP version: {:?}", &settings.prp_version);
    info!("Sub-command: validate");
    info!("Inputs:");

    check_required_filename(&settings.input_filename, "Result file")?;
    info!("\tResult file: {:?}", &settings.input_filename);

    Ok(settings)
}

/// Loads a result file and runs the full validation on it.
/// # Errors
/// * if the file cannot be read or is not JSON
/// * if the schema version is missing or unsupported
/// * the first validation failure, with the path of the failing field
pub fn validate_result_file(filename: &Path) -> anyhow::Result<PipelineResult> {
    let value = load_json_value(filename)?;
    let result = PipelineResult::from_value(value)
        .with_context(|| format!("Error while validating {filename:?}:"))?;
    Ok(result)
}
