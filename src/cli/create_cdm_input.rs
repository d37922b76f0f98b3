use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::aggregator::{SampleInputs, SampleInputsBuilder};
use crate::cli::core::{check_optional_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Debug, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CreateCdmInputSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    prp_version: String,

    /// Output QC list (JSON), gzipped if it ends with .gz
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Assembly QC from QUAST (TSV)
    #[clap(long = "quast")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("QC inputs"))]
    pub quast: Option<PathBuf>,

    /// Read mapping QC (JSON)
    #[clap(long = "postalignqc")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("QC inputs"))]
    pub postalignqc: Option<PathBuf>,

    /// cgMLST allele calls from chewBBACA (TSV), only the number of missing loci is exported
    #[clap(long = "cgmlst")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("QC inputs"))]
    pub cgmlst: Option<PathBuf>,

    /// Reports inferred chewBBACA alleles (INF-<n>) as allele numbers
    #[clap(long = "correct-alleles")]
    #[clap(help_heading = Some("QC inputs"))]
    pub correct_alleles: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

impl CreateCdmInputSettings {
    /// The QC inputs described by these settings
    pub fn sample_inputs(&self) -> anyhow::Result<SampleInputs> {
        Ok(SampleInputsBuilder::default()
            .quast(self.quast.clone())
            .postalignqc(self.postalignqc.clone())
            .cgmlst(self.cgmlst.clone())
            .correct_alleles(self.correct_alleles)
            .build()?)
    }
}

pub fn check_create_cdm_input_settings(mut settings: CreateCdmInputSettings) -> anyhow::Result<CreateCdmInputSettings> {
    // hard code the version in
    settings.prp_version = FULL_VERSION.clone();
    info!("PRP version: {:?}", &settings.prp_version);
    info!("Sub-command: create-cdm-input");
    info!("Inputs:");

    let optional_inputs = [
        (settings.quast.as_deref(), "QUAST"),
        (settings.postalignqc.as_deref(), "Post-alignment QC"),
        (settings.cgmlst.as_deref(), "cgMLST")
    ];
    for (opt_filename, label) in optional_inputs {
        check_optional_filename(opt_filename, label)?;
        if let Some(filename) = opt_filename {
            info!("\t{label}: {filename:?}");
        }
    }
    if settings.correct_alleles {
        info!("\tInferred cgMLST alleles: CORRECTED");
    }
    let inputs = [settings.quast.as_ref(), settings.postalignqc.as_ref(), settings.cgmlst.as_ref()];
    ensure!(!inputs.contains(&Some(&settings.output_filename)), "--output must differ from the inputs");

    info!("Outputs:");
    info!("\tQC list: {:?}", &settings.output_filename);

    Ok(settings)
}
