use log::{LevelFilter, error, info};
use std::time::Instant;

use prp::aggregator::{aggregate_sample, collect_cdm_qc};
use prp::cli::annotate_sv::{AnnotateSvSettings, check_annotate_sv_settings};
use prp::cli::core::{Commands, error_exit_code, get_cli};
use prp::cli::create_cdm_input::{CreateCdmInputSettings, check_create_cdm_input_settings};
use prp::cli::create_output::{CreateOutputSettings, check_create_output_settings};
use prp::cli::print_schema::{PrintSchemaSettings, render_schema};
use prp::cli::validate::{ValidateSettings, check_validate_settings, validate_result_file};
use prp::parsing::sv_annotation::GeneAnnotationIndex;
use prp::util::json_io::save_json;
use prp::writers::sv_annotation::annotate_sv_vcf;

fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

fn run_create_output(settings: CreateOutputSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);
    let settings = match check_create_output_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let inputs = match settings.sample_inputs() {
        Ok(i) => i,
        Err(e) => {
            error!("Error while collecting inputs: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // nothing is written unless the full result validates
    let result = match aggregate_sample(settings.profile, &inputs) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while creating result for {}: {e:#}", settings.sample_id);
            std::process::exit(error_exit_code(&e));
        }
    };

    info!("Saving result to {:?}...", settings.output_filename);
    if let Err(e) = save_json(&result, &settings.output_filename) {
        error!("Error while saving result: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Process finished successfully in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_validate(settings: ValidateSettings) {
    init_logging(settings.verbosity);
    let settings = match check_validate_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    match validate_result_file(&settings.input_filename) {
        Ok(result) => {
            info!(
                "{:?} is a valid result for sample {:?} (schema version {})",
                settings.input_filename, result.sample_id(), result.schema_version()
            );
        },
        Err(e) => {
            error!("Validation failed: {e:#}");
            std::process::exit(error_exit_code(&e));
        }
    }
}

fn run_annotate_sv(settings: AnnotateSvSettings) {
    let start_time = Instant::now();

    init_logging(settings.verbosity);
    let settings = match check_annotate_sv_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    info!("Loading gene annotation into memory...");
    let annotation = match GeneAnnotationIndex::from_bed(&settings.bed_filename) {
        Ok(a) => a,
        Err(e) => {
            error!("Error while loading gene annotation: {e:#}");
            std::process::exit(error_exit_code(&e));
        }
    };

    match annotate_sv_vcf(&settings.vcf_filename, &annotation, &settings.output_filename) {
        Ok(num_annotated) => {
            info!("Annotated {num_annotated} variants in {:?}", settings.output_filename);
        },
        Err(e) => {
            error!("Error while annotating structural variants: {e:#}");
            std::process::exit(error_exit_code(&e));
        }
    }

    info!("Process finished successfully in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_create_cdm_input(settings: CreateCdmInputSettings) {
    let start_time = Instant::now();

    init_logging(settings.verbosity);
    let settings = match check_create_cdm_input_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let qc = match settings.sample_inputs().and_then(|inputs| collect_cdm_qc(&inputs)) {
        Ok(q) => q,
        Err(e) => {
            error!("Error while collecting QC results: {e:#}");
            std::process::exit(error_exit_code(&e));
        }
    };

    info!("Saving {} QC entries to {:?}...", qc.len(), settings.output_filename);
    if let Err(e) = save_json(&qc, &settings.output_filename) {
        error!("Error while saving QC results: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Process finished successfully in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_print_schema(settings: PrintSchemaSettings) {
    init_logging(settings.verbosity);
    match render_schema(&settings) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            error!("Error while rendering the result schema: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::CreateOutput(settings) => {
            run_create_output(*settings);
        },
        Commands::Validate(settings) => {
            run_validate(*settings);
        },
        Commands::AnnotateSv(settings) => {
            run_annotate_sv(*settings);
        },
        Commands::CreateCdmInput(settings) => {
            run_create_cdm_input(*settings);
        },
        Commands::PrintSchema(settings) => {
            run_print_schema(*settings);
        }
    }
}
