use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::aggregator::{SampleInputs, SampleInputsBuilder};
use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::data_types::profile::OrganismProfile;

#[derive(Args, Clone, Debug, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CreateOutputSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    prp_version: String,

    /// Sample identifier
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "sample-id")]
    #[clap(value_name = "ID")]
    #[clap(help_heading = Some("Input/Output"))]
    pub sample_id: String,

    /// Organism profile, selects the accepted inputs and element types
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "profile")]
    #[clap(value_name = "PROFILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub profile: OrganismProfile,

    /// Pipeline run metadata (JSON)
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "run-metadata")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub run_metadata: PathBuf,

    /// Output result file (JSON), gzipped if it ends with .gz
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Database and software versions (JSON), can be specified multiple times
    #[clap(long = "process-metadata")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Metadata"))]
    pub process_metadata: Vec<PathBuf>,

    /// Assembly QC from QUAST (TSV)
    #[clap(long = "quast")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("QC and species"))]
    pub quast: Option<PathBuf>,

    /// Read mapping QC (JSON)
    #[clap(long = "postalignqc")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("QC and species"))]
    pub postalignqc: Option<PathBuf>,

    /// Species abundance from Bracken (TSV)
    #[clap(long = "bracken")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("QC and species"))]
    pub bracken: Option<PathBuf>,

    /// 7-gene MLST (JSON)
    #[clap(long = "mlst")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Typing"))]
    pub mlst: Option<PathBuf>,

    /// cgMLST allele calls from chewBBACA (TSV)
    #[clap(long = "cgmlst")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Typing"))]
    pub cgmlst: Option<PathBuf>,

    /// Reports inferred chewBBACA alleles (INF-<n>) as allele numbers
    #[clap(long = "correct-alleles")]
    #[clap(help_heading = Some("Typing"))]
    pub correct_alleles: bool,

    /// SerotypeFinder results (JSON)
    #[clap(long = "serotypefinder")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Typing"))]
    pub serotypefinder: Option<PathBuf>,

    /// AMRFinderPlus results (TSV)
    #[clap(long = "amrfinder")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Gene predictions"))]
    pub amrfinder: Option<PathBuf>,

    /// ResFinder results (JSON)
    #[clap(long = "resfinder")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Gene predictions"))]
    pub resfinder: Option<PathBuf>,

    /// VirulenceFinder results (JSON)
    #[clap(long = "virulencefinder")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Gene predictions"))]
    pub virulencefinder: Option<PathBuf>,

    /// Mykrobe results (CSV)
    #[clap(long = "mykrobe")]
    #[clap(value_name = "CSV")]
    #[clap(help_heading = Some("Variant predictions"))]
    pub mykrobe: Option<PathBuf>,

    /// TBProfiler results (JSON)
    #[clap(long = "tbprofiler")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Variant predictions"))]
    pub tbprofiler: Option<PathBuf>,

    /// Small variant calls (VCF)
    #[clap(long = "snv-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Variant predictions"))]
    pub snv_vcf: Option<PathBuf>,

    /// Structural variant calls (VCF)
    #[clap(long = "sv-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Variant predictions"))]
    pub sv_vcf: Option<PathBuf>,

    /// Reference genome (FASTA)
    #[clap(long = "reference-fasta")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Reference genome"))]
    pub reference_fasta: Option<PathBuf>,

    /// Reference gene annotation (GFF)
    #[clap(long = "reference-gff")]
    #[clap(value_name = "GFF")]
    #[clap(help_heading = Some("Reference genome"))]
    pub reference_gff: Option<PathBuf>,

    /// Read mapping to the reference genome (BAM)
    #[clap(long = "bam")]
    #[clap(value_name = "BAM")]
    #[clap(help_heading = Some("Reference genome"))]
    pub bam: Option<PathBuf>,

    /// Extra annotation track (BED), can be specified multiple times
    #[clap(long = "annotation-track")]
    #[clap(value_name = "BED")]
    #[clap(help_heading = Some("Reference genome"))]
    pub annotation_tracks: Vec<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

impl CreateOutputSettings {
    /// The decoder inputs described by these settings
    pub fn sample_inputs(&self) -> anyhow::Result<SampleInputs> {
        Ok(SampleInputsBuilder::default()
            .sample_id(self.sample_id.clone())
            .run_metadata(self.run_metadata.clone())
            .process_metadata(self.process_metadata.clone())
            .quast(self.quast.clone())
            .postalignqc(self.postalignqc.clone())
            .bracken(self.bracken.clone())
            .mlst(self.mlst.clone())
            .cgmlst(self.cgmlst.clone())
            .amrfinder(self.amrfinder.clone())
            .resfinder(self.resfinder.clone())
            .virulencefinder(self.virulencefinder.clone())
            .serotypefinder(self.serotypefinder.clone())
            .mykrobe(self.mykrobe.clone())
            .tbprofiler(self.tbprofiler.clone())
            .snv_vcf(self.snv_vcf.clone())
            .sv_vcf(self.sv_vcf.clone())
            .reference_fasta(self.reference_fasta.clone())
            .reference_gff(self.reference_gff.clone())
            .bam(self.bam.clone())
            .annotation_tracks(self.annotation_tracks.clone())
            .correct_alleles(self.correct_alleles)
            .build()?)
    }
}

pub fn check_create_output_settings(mut settings: CreateOutputSettings) -> anyhow::Result<CreateOutputSettings> {
    // hard code the version in
    settings.prp_version = FULL_VERSION.clone();
    info!("PRP version: {:?}", &settings.prp_version);
    info!("Sub-command: create-output");
    info!("Sample: {:?}", settings.sample_id);
    info!("Profile: {}", settings.profile);
    info!("Inputs:");

    check_required_filename(&settings.run_metadata, "Run metadata")?;
    info!("\tRun metadata: {:?}", &settings.run_metadata);
    for (i, filename) in settings.process_metadata.iter().enumerate() {
        check_required_filename(filename, format!("Process metadata #{i}").as_str())?;
        info!("\tProcess metadata #{i}: {filename:?}");
    }

    let optional_inputs = [
        (settings.quast.as_deref(), "QUAST"),
        (settings.postalignqc.as_deref(), "Post-alignment QC"),
        (settings.bracken.as_deref(), "Bracken"),
        (settings.mlst.as_deref(), "MLST"),
        (settings.cgmlst.as_deref(), "cgMLST"),
        (settings.serotypefinder.as_deref(), "SerotypeFinder"),
        (settings.amrfinder.as_deref(), "AMRFinderPlus"),
        (settings.resfinder.as_deref(), "ResFinder"),
        (settings.virulencefinder.as_deref(), "VirulenceFinder"),
        (settings.mykrobe.as_deref(), "Mykrobe"),
        (settings.tbprofiler.as_deref(), "TBProfiler"),
        (settings.snv_vcf.as_deref(), "SNV VCF"),
        (settings.sv_vcf.as_deref(), "SV VCF"),
        (settings.reference_fasta.as_deref(), "Reference FASTA"),
        (settings.reference_gff.as_deref(), "Reference GFF"),
        (settings.bam.as_deref(), "Read mapping")
    ];
    for (opt_filename, label) in optional_inputs {
        check_optional_filename(opt_filename, label)?;
        if let Some(filename) = opt_filename {
            info!("\t{label}: {filename:?}");
        }
    }
    for (i, filename) in settings.annotation_tracks.iter().enumerate() {
        check_required_filename(filename, format!("Annotation track #{i}").as_str())?;
        info!("\tAnnotation track #{i}: {filename:?}");
    }
    if settings.correct_alleles {
        info!("\tInferred cgMLST alleles: CORRECTED");
    }

    // make sure the profile can use everything we were given
    settings.sample_inputs()?.check_profile(settings.profile)?;

    info!("Outputs:");
    info!("\tResult: {:?}", &settings.output_filename);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::core::{Cli, Commands};

    fn parse_settings(args: &[&str]) -> CreateOutputSettings {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::CreateOutput(settings) => *settings,
            _ => panic!("expected create-output")
        }
    }

    #[test]
    fn test_check_settings() {
        let settings = parse_settings(&[
            "prp", "create-output",
            "--sample-id", "test_mtuberculosis_1",
            "--profile", "mycobacterium",
            "--run-metadata", "test_data/metadata/run_metadata.json",
            "--mykrobe", "test_data/mykrobe/mykrobe.csv",
            "--output", "result.json"
        ]);
        let settings = check_create_output_settings(settings).unwrap();
        assert_eq!(settings.profile, OrganismProfile::Mycobacterium);
        assert!(!settings.prp_version.is_empty());
        let inputs = settings.sample_inputs().unwrap();
        assert_eq!(inputs.mykrobe, Some(PathBuf::from("test_data/mykrobe/mykrobe.csv")));
    }

    #[test]
    fn test_unsupported_input() {
        let settings = parse_settings(&[
            "prp", "create-output",
            "--sample-id", "sample_1",
            "--profile", "staphylococcus",
            "--run-metadata", "test_data/metadata/run_metadata.json",
            "--tbprofiler", "test_data/tbprofiler/tbprofiler.json",
            "--output", "result.json"
        ]);
        let err = check_create_output_settings(settings).unwrap_err();
        assert_eq!(err.to_string(), "TBProfiler output is not supported by the staphylococcus profile");
    }

    #[test]
    fn test_missing_input() {
        let settings = parse_settings(&[
            "prp", "create-output",
            "--sample-id", "sample_1",
            "--profile", "staphylococcus",
            "--run-metadata", "test_data/metadata/run_metadata.json",
            "--quast", "test_data/qc/missing.tsv",
            "--output", "result.json"
        ]);
        let err = check_create_output_settings(settings).unwrap_err();
        assert_eq!(err.to_string(), "QUAST does not exist: \"test_data/qc/missing.tsv\"");
    }
}
