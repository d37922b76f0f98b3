use clap::Args;
use serde::Serialize;

use crate::cli::core::AFTER_HELP;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct PrintSchemaSettings {
    /// Print the schema on a single line
    #[clap(long = "compact")]
    pub compact: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

/// Renders the result schema for printing
/// # Errors
/// * if the schema can not be serialized
pub fn render_schema(settings: &PrintSchemaSettings) -> anyhow::Result<String> {
    let schema = crate::data_types::schema::result_schema();
    let text = if settings.compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };
    Ok(text)
}
