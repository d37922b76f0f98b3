use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Debug, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct AnnotateSvSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    prp_version: String,

    /// Structural variant calls (VCF)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub vcf_filename: PathBuf,

    /// Gene annotation with chrom, start, end, locus tag, and gene columns (BED)
    #[clap(required = true)]
    #[clap(short = 'b')]
    #[clap(long = "bed")]
    #[clap(value_name = "BED")]
    #[clap(help_heading = Some("Input/Output"))]
    pub bed_filename: PathBuf,

    /// Annotated output (VCF), bgzipped and indexed if it ends with .gz
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

pub fn check_annotate_sv_settings(mut settings: AnnotateSvSettings) -> anyhow::Result<AnnotateSvSettings> {
    // hard code the version in
    settings.prp_version = FULL_VERSION.clone();
    info!("PRP version: {:?}", &settings.prp_version);
    info!("Sub-command: annotate-sv");
    info!("Inputs:");

    check_required_filename(&settings.vcf_filename, "Structural variant VCF")?;
    info!("\tVCF: {:?}", &settings.vcf_filename);
    check_required_filename(&settings.bed_filename, "Gene annotation BED")?;
    info!("\tBED: {:?}", &settings.bed_filename);

    ensure!(settings.output_filename != settings.vcf_filename, "--output must differ from --vcf");
    info!("Outputs:");
    info!("\tAnnotated VCF: {:?}", &settings.output_filename);

    Ok(settings)
}
