/*!
Per-sample aggregation of decoded tool outputs into one validated `PipelineResult`.
Inputs are decoded one at a time; empty typing and element type results are dropped, versions are collected as they are reported, and the final record is validated as a whole.
*/

use anyhow::{anyhow, bail, Context};
use derive_builder::Builder;
use log::{debug, info, warn};
use rust_lib_reference_genome::reference_genome::ReferenceGenome as FastaReference;
use std::path::{Path, PathBuf};

use crate::data_types::metadata::{RunMetadata, SoupVersion};
use crate::data_types::method_result::MethodResult;
use crate::data_types::phenotype::ElementType;
use crate::data_types::pipeline_result::{AnnotationTrack, PipelineResult, PipelineResultParts, ReferenceGenome, OUTPUT_SCHEMA_VERSION};
use crate::data_types::profile::{Decoder, OrganismProfile};
use crate::data_types::qc::QcMethodResult;
use crate::data_types::records::VariantRecord;
use crate::data_types::species::SpeciesPrediction;
use crate::data_types::typing::{TypingMethodResult, TypingResult};
use crate::data_types::validation::{validate_all, SchemaError};
use crate::parsing::amrfinder::AmrfinderReport;
use crate::parsing::bam::reference_accession;
use crate::parsing::bracken::parse_bracken;
use crate::parsing::cgmlst::parse_cgmlst;
use crate::parsing::gff::load_genome_version;
use crate::parsing::metadata::load_run_metadata;
use crate::parsing::mlst::parse_mlst;
use crate::parsing::mykrobe::MykrobeReport;
use crate::parsing::qc::{parse_postalignqc, parse_quast};
use crate::parsing::resfinder::ResfinderReport;
use crate::parsing::serotypefinder::SerotypefinderReport;
use crate::parsing::tbprofiler::TbProfilerReport;
use crate::parsing::variant_loader::load_variants;
use crate::parsing::virulencefinder::VirulencefinderReport;
use crate::parsing::ConsistencyError;

/// Track names used for the variant files
pub const SNV_TRACK_NAME: &str = "snv_variants";
pub const SV_TRACK_NAME: &str = "sv_variants";

/// Every file that can go into the result for one sample; everything except the run metadata is optional.
#[derive(Builder, Clone, Debug, Default)]
#[builder(default)]
pub struct SampleInputs {
    pub sample_id: String,
    /// Pipeline run information, required
    pub run_metadata: PathBuf,
    /// Database and software versions reported by the pipeline
    pub process_metadata: Vec<PathBuf>,
    pub quast: Option<PathBuf>,
    pub postalignqc: Option<PathBuf>,
    pub bracken: Option<PathBuf>,
    pub mlst: Option<PathBuf>,
    pub cgmlst: Option<PathBuf>,
    pub amrfinder: Option<PathBuf>,
    pub resfinder: Option<PathBuf>,
    pub virulencefinder: Option<PathBuf>,
    pub serotypefinder: Option<PathBuf>,
    pub mykrobe: Option<PathBuf>,
    pub tbprofiler: Option<PathBuf>,
    pub snv_vcf: Option<PathBuf>,
    pub sv_vcf: Option<PathBuf>,
    pub reference_fasta: Option<PathBuf>,
    pub reference_gff: Option<PathBuf>,
    pub bam: Option<PathBuf>,
    /// BED files shown as extra tracks on the reference genome
    pub annotation_tracks: Vec<PathBuf>,
    /// Convert inferred chewBBACA alleles (`INF-<n>`) to plain allele numbers
    pub correct_alleles: bool
}

impl SampleInputs {
    /// The decoders that will be run for these inputs
    pub fn provided_decoders(&self) -> Vec<Decoder> {
        let optional_inputs = [
            (self.quast.is_some(), Decoder::Quast),
            (self.postalignqc.is_some(), Decoder::PostAlignQc),
            (self.bracken.is_some(), Decoder::Bracken),
            (self.mlst.is_some(), Decoder::Mlst),
            (self.cgmlst.is_some(), Decoder::Cgmlst),
            (self.amrfinder.is_some(), Decoder::Amrfinder),
            (self.resfinder.is_some(), Decoder::Resfinder),
            (self.virulencefinder.is_some(), Decoder::Virulencefinder),
            (self.serotypefinder.is_some(), Decoder::Serotypefinder),
            (self.mykrobe.is_some(), Decoder::Mykrobe),
            (self.tbprofiler.is_some(), Decoder::Tbprofiler),
            (self.snv_vcf.is_some(), Decoder::SnvVcf),
            (self.sv_vcf.is_some(), Decoder::SvVcf),
            (self.reference_fasta.is_some() || self.reference_gff.is_some(), Decoder::ReferenceGenome),
            (self.bam.is_some(), Decoder::ReadMapping),
            (!self.annotation_tracks.is_empty(), Decoder::AnnotationTrack)
        ];
        optional_inputs.into_iter()
            .filter_map(|(provided, decoder)| provided.then_some(decoder))
            .collect()
    }

    /// Verifies that every provided input can be used with `profile`.
    /// # Errors
    /// * if an input is given that the profile does not accept
    pub fn check_profile(&self, profile: OrganismProfile) -> anyhow::Result<()> {
        if let Some(decoder) = self.provided_decoders().into_iter().find(|d| !profile.accepts(*d)) {
            bail!("{decoder} output is not supported by the {profile} profile");
        }
        Ok(())
    }
}

/// Collects the decoded results of one sample
#[derive(Debug)]
pub struct ResultAggregator {
    sample_id: String,
    profile: OrganismProfile,
    run_metadata: RunMetadata,
    qc: Vec<QcMethodResult>,
    species_prediction: Option<SpeciesPrediction>,
    typing_result: Vec<TypingMethodResult>,
    element_type_result: Vec<MethodResult>,
    reference_genome: Option<ReferenceGenome>,
    read_mapping: Option<String>,
    genome_annotation: Vec<AnnotationTrack>,
    snv_variants: Option<Vec<VariantRecord>>,
    sv_variants: Option<Vec<VariantRecord>>
}

impl ResultAggregator {
    pub fn new(sample_id: String, profile: OrganismProfile, run_metadata: RunMetadata) -> Self {
        Self {
            sample_id,
            profile,
            run_metadata,
            qc: vec![],
            species_prediction: None,
            typing_result: vec![],
            element_type_result: vec![],
            reference_genome: None,
            read_mapping: None,
            genome_annotation: vec![],
            snv_variants: None,
            sv_variants: None
        }
    }

    /// QC results are always kept
    pub fn add_qc(&mut self, qc: QcMethodResult) {
        self.qc.push(qc);
    }

    pub fn set_species_prediction(&mut self, prediction: SpeciesPrediction) {
        self.species_prediction = Some(prediction);
    }

    /// Adds a typing result, returns false if it was dropped for being empty
    pub fn add_typing(&mut self, typing: TypingMethodResult) -> bool {
        if typing.is_empty() {
            info!("No {} result from {}, skipping", typing.method, typing.software);
            return false;
        }
        self.typing_result.push(typing);
        true
    }

    /// Adds an element type prediction, returns false if it was dropped for being empty
    pub fn add_element_type(&mut self, prediction: MethodResult) -> bool {
        if prediction.is_empty() {
            info!("No {} result from {}, skipping", prediction.category, prediction.software);
            return false;
        }
        self.element_type_result.push(prediction);
        true
    }

    /// Appends a database or software version unless it was already reported
    pub fn add_software_version(&mut self, version: SoupVersion) {
        if !self.run_metadata.databases.contains(&version) {
            debug!("Adding {} version {}", version.name, version.version);
            self.run_metadata.databases.push(version);
        }
    }

    pub fn set_reference(&mut self, reference_genome: ReferenceGenome, read_mapping: String) {
        self.reference_genome = Some(reference_genome);
        self.read_mapping = Some(read_mapping);
    }

    pub fn add_annotation_track(&mut self, track: AnnotationTrack) {
        self.genome_annotation.push(track);
    }

    pub fn set_snv_variants(&mut self, variants: Option<Vec<VariantRecord>>) {
        self.snv_variants = variants;
    }

    pub fn set_sv_variants(&mut self, variants: Option<Vec<VariantRecord>>) {
        self.sv_variants = variants;
    }

    /// Builds the validated result.
    /// # Errors
    /// * the first `SchemaError` found anywhere in the collected results
    pub fn finalize(self) -> Result<PipelineResult, SchemaError> {
        let genome_annotation = if self.genome_annotation.is_empty() {
            None
        } else {
            Some(self.genome_annotation)
        };
        PipelineResult::new(PipelineResultParts {
            sample_id: self.sample_id,
            schema_version: OUTPUT_SCHEMA_VERSION,
            profile: self.profile,
            run_metadata: self.run_metadata,
            qc: self.qc,
            species_prediction: self.species_prediction,
            typing_result: self.typing_result,
            element_type_result: self.element_type_result,
            reference_genome: self.reference_genome,
            read_mapping: self.read_mapping,
            genome_annotation,
            snv_variants: self.snv_variants,
            sv_variants: self.sv_variants
        })
    }
}

/// File name of a path, falling back to the full path
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Track name for a BED file, its file stem
fn track_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name(path))
}

/// FASTA headers may carry a description after the accession
fn contig_matches(contig_key: &str, accession: &str) -> bool {
    contig_key.split_whitespace().next() == Some(accession)
}

/// Builds the reference genome block, verifying that the read mapping, the annotation, and the FASTA agree.
/// # Errors
/// * if any of the files cannot be read
/// * `ConsistencyError::ReferenceMismatch` if the mapping and annotation accessions differ
/// * `ConsistencyError::MissingReferenceContig` if the FASTA has no contig for the accession
pub fn build_reference_genome(bam: &Path, fasta: &Path, gff: &Path) -> anyhow::Result<ReferenceGenome> {
    let mapping_accession = reference_accession(bam)?;
    let genome_version = load_genome_version(gff)?;
    if mapping_accession != genome_version.accession {
        return Err(ConsistencyError::ReferenceMismatch {
            mapping: mapping_accession,
            annotation: genome_version.accession
        }.into());
    }

    let fasta_reference = FastaReference::from_fasta(fasta)
        .map_err(|e| anyhow!("Error while loading reference genome {fasta:?}: {e:?}"))?;
    if !fasta_reference.contig_keys().iter().any(|k| contig_matches(k, &genome_version.accession)) {
        return Err(ConsistencyError::MissingReferenceContig { accession: genome_version.accession }.into());
    }

    let mut index_path = fasta.as_os_str().to_owned();
    index_path.push(".fai");
    let index_path = PathBuf::from(index_path);
    let fasta_index = index_path.exists().then(|| file_name(&index_path));

    Ok(ReferenceGenome {
        name: genome_version.name,
        accession: genome_version.accession,
        fasta: file_name(fasta),
        fasta_index,
        genes: file_name(gff)
    })
}

/// Decodes every provided input of one sample and builds the validated result.
/// # Arguments
/// * `profile` - the organism capability profile of the sample
/// * `inputs` - the files to decode
/// # Errors
/// * if an input is not accepted by the profile
/// * if any input cannot be read or is malformed
/// * if inputs disagree with each other, see `ConsistencyError`
/// * if the combined result fails validation
pub fn aggregate_sample(profile: OrganismProfile, inputs: &SampleInputs) -> anyhow::Result<PipelineResult> {
    inputs.check_profile(profile)?;

    info!("Loading run metadata from {:?}...", inputs.run_metadata);
    let run_metadata = load_run_metadata(&inputs.run_metadata, &inputs.process_metadata)?;
    let mut aggregator = ResultAggregator::new(inputs.sample_id.clone(), profile, run_metadata);

    // QC and species
    if let Some(filename) = inputs.quast.as_deref() {
        info!("Loading QUAST results from {filename:?}...");
        aggregator.add_qc(parse_quast(filename)?);
    }
    if let Some(filename) = inputs.postalignqc.as_deref() {
        info!("Loading post-alignment QC from {filename:?}...");
        aggregator.add_qc(parse_postalignqc(filename)?);
    }
    if let Some(filename) = inputs.bracken.as_deref() {
        info!("Loading species prediction from {filename:?}...");
        aggregator.set_species_prediction(parse_bracken(filename)?);
    }

    // typing
    if let Some(filename) = inputs.mlst.as_deref() {
        info!("Loading MLST results from {filename:?}...");
        aggregator.add_typing(parse_mlst(filename)?);
    }
    if let Some(filename) = inputs.cgmlst.as_deref() {
        info!("Loading cgMLST results from {filename:?}...");
        aggregator.add_typing(parse_cgmlst(filename, inputs.correct_alleles)?);
    }

    // gene based predictions
    if let Some(filename) = inputs.amrfinder.as_deref() {
        info!("Loading AMRFinderPlus results from {filename:?}...");
        let report = AmrfinderReport::from_tsv(filename)?;
        for &element_type in profile.element_types() {
            aggregator.add_element_type(report.prediction(element_type));
        }
    }
    if let Some(filename) = inputs.resfinder.as_deref() {
        info!("Loading ResFinder results from {filename:?}...");
        let report = ResfinderReport::from_json(filename)?;
        add_versions(&mut aggregator, report.software_version(), report.database_versions());
        for &element_type in profile.element_types().iter().filter(|&&et| et != ElementType::Virulence) {
            let prediction = report.prediction(element_type)
                .with_context(|| format!("Error while parsing {filename:?}:"))?;
            aggregator.add_element_type(prediction);
        }
    }
    if let Some(filename) = inputs.virulencefinder.as_deref() {
        info!("Loading VirulenceFinder results from {filename:?}...");
        let report = VirulencefinderReport::from_json(filename)?;
        add_versions(&mut aggregator, report.software_version(), report.database_versions());
        aggregator.add_element_type(report.prediction());
        if profile.reports_stx_typing() {
            match report.stx_typing() {
                Some(typing) => { aggregator.add_typing(typing); },
                None => info!("No Shiga toxin genes found")
            }
        }
    }
    if let Some(filename) = inputs.serotypefinder.as_deref() {
        info!("Loading SerotypeFinder results from {filename:?}...");
        let report = SerotypefinderReport::from_json(filename)?;
        add_versions(&mut aggregator, report.software_version(), report.database_versions());
        for typing in [report.o_typing(), report.h_typing()].into_iter().flatten() {
            aggregator.add_typing(typing);
        }
    }

    // variant based predictions
    if let Some(filename) = inputs.mykrobe.as_deref() {
        info!("Loading Mykrobe results from {filename:?}...");
        let report = MykrobeReport::from_csv(filename)?;
        report.check_sample(&inputs.sample_id)?;
        if let Some(version) = report.version() {
            aggregator.add_software_version(version);
        }
        let prediction = report.resistance_prediction(ElementType::Amr)
            .with_context(|| format!("Error while parsing {filename:?}:"))?;
        aggregator.add_element_type(prediction);
        if let Some(typing) = report.lineage_typing() {
            aggregator.add_typing(typing);
        }
    }
    if let Some(filename) = inputs.tbprofiler.as_deref() {
        info!("Loading TBProfiler results from {filename:?}...");
        let report = TbProfilerReport::from_json(filename)?;
        let version = report.database_version()
            .with_context(|| format!("Error while parsing {filename:?}:"))?;
        aggregator.add_software_version(version);
        aggregator.add_element_type(report.resistance_prediction(ElementType::Amr));
        aggregator.add_typing(report.lineage_typing());
    }
    if let Some(filename) = inputs.snv_vcf.as_deref() {
        info!("Loading SNVs from {filename:?}...");
        aggregator.set_snv_variants(load_variants(filename)?);
        aggregator.add_annotation_track(AnnotationTrack { name: SNV_TRACK_NAME.to_string(), file: file_name(filename) });
    }
    if let Some(filename) = inputs.sv_vcf.as_deref() {
        info!("Loading structural variants from {filename:?}...");
        aggregator.set_sv_variants(load_variants(filename)?);
        aggregator.add_annotation_track(AnnotationTrack { name: SV_TRACK_NAME.to_string(), file: file_name(filename) });
    }

    // reference genome
    match (inputs.bam.as_deref(), inputs.reference_fasta.as_deref(), inputs.reference_gff.as_deref()) {
        (Some(bam), Some(fasta), Some(gff)) => {
            info!("Verifying reference genome...");
            let reference_genome = build_reference_genome(bam, fasta, gff)?;
            aggregator.set_reference(reference_genome, file_name(bam));
        },
        (None, None, None) => {},
        _ => warn!("The read mapping, reference FASTA, and GFF annotation are all required for the reference genome, skipping")
    }
    for filename in inputs.annotation_tracks.iter() {
        aggregator.add_annotation_track(AnnotationTrack { name: track_name(filename), file: file_name(filename) });
    }

    info!("Validating results for {}...", inputs.sample_id);
    Ok(aggregator.finalize()?)
}

fn add_versions(aggregator: &mut ResultAggregator, software: Option<SoupVersion>, databases: Vec<SoupVersion>) {
    for version in software.into_iter().chain(databases) {
        aggregator.add_software_version(version);
    }
}

/// QC entries for the sample database export, in the order post-alignment QC, QUAST, missing cgMLST loci.
/// Only the QC inputs and the cgMLST profile of `inputs` are used; absent inputs are left out.
/// # Errors
/// * if any of the inputs cannot be read or is malformed
/// * if an entry fails validation
pub fn collect_cdm_qc(inputs: &SampleInputs) -> anyhow::Result<Vec<QcMethodResult>> {
    let mut qc = vec![];
    if let Some(filename) = inputs.postalignqc.as_deref() {
        info!("Loading post-alignment QC from {filename:?}...");
        qc.push(parse_postalignqc(filename)?);
    }
    if let Some(filename) = inputs.quast.as_deref() {
        info!("Loading QUAST results from {filename:?}...");
        qc.push(parse_quast(filename)?);
    }
    if let Some(filename) = inputs.cgmlst.as_deref() {
        info!("Counting missing cgMLST loci in {filename:?}...");
        if let TypingResult::Cgmlst(profile) = parse_cgmlst(filename, inputs.correct_alleles)?.result {
            debug!("{} of {} loci are missing", profile.n_missing, profile.alleles.len());
            qc.push(QcMethodResult::missing_loci(profile.n_missing));
        }
    }
    validate_all("qc", &qc)?;
    Ok(qc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::qc::QcSoftware;
    use crate::data_types::typing::TypingMethod;
    use crate::util::json_io::{load_json_value, save_json};

    fn mycobacterium_inputs() -> SampleInputsBuilder {
        let mut builder = SampleInputsBuilder::default();
        builder
            .sample_id("test_mtuberculosis_1".to_string())
            .run_metadata(PathBuf::from("test_data/metadata/run_metadata.json"))
            .process_metadata(vec![PathBuf::from("test_data/metadata/process_metadata.json")])
            .mykrobe(Some(PathBuf::from("test_data/mykrobe/mykrobe.csv")))
            .tbprofiler(Some(PathBuf::from("test_data/tbprofiler/tbprofiler.json")))
            .snv_vcf(Some(PathBuf::from("test_data/vcf/snv.vcf")))
            .sv_vcf(Some(PathBuf::from("test_data/vcf/sv.vcf")))
            .bam(Some(PathBuf::from("test_data/reference/mapping.bam")))
            .reference_fasta(Some(PathBuf::from("test_data/reference/NC_000962.3.fasta")))
            .reference_gff(Some(PathBuf::from("test_data/reference/NC_000962.3.gff")));
        builder
    }

    #[test]
    fn test_mycobacterium_sample() {
        let inputs = mycobacterium_inputs().build().unwrap();
        let result = aggregate_sample(OrganismProfile::Mycobacterium, &inputs).unwrap();

        assert_eq!(result.sample_id(), "test_mtuberculosis_1");
        assert_eq!(result.element_type_result().len(), 2);
        assert!(result.element_type_result().iter().all(|r| r.category == ElementType::Amr));
        assert!(result.typing_result().iter().all(|t| t.method == TypingMethod::Lineage));
        assert_eq!(result.snv_variants().map(|v| v.len()), Some(4));
        assert_eq!(result.sv_variants().map(|v| v.len()), Some(2));

        let databases = &result.run_metadata().databases;
        assert!(databases.contains(&SoupVersion::database("mykrobe-predictor", "v0.12.1")));
        assert!(databases.iter().any(|d| d.name == "tbdb"));

        let reference = result.reference_genome().unwrap();
        assert_eq!(reference.accession, "NC_000962.3");
        assert_eq!(reference.fasta, "NC_000962.3.fasta");
        assert_eq!(reference.fasta_index.as_deref(), Some("NC_000962.3.fasta.fai"));
        assert_eq!(result.read_mapping(), Some("mapping.bam"));

        let tracks: Vec<&str> = result.genome_annotation().unwrap().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tracks, vec![SNV_TRACK_NAME, SV_TRACK_NAME]);
        assert_eq!(result.genome_annotation().unwrap()[1].file, "sv.vcf");

        // the written document reads back to the same result
        let temp_dir = tempfile::tempdir().unwrap();
        let output_fn = temp_dir.path().join("result.json");
        save_json(&result, &output_fn).unwrap();
        let reloaded = PipelineResult::from_value(load_json_value(&output_fn).unwrap()).unwrap();
        assert_eq!(reloaded, result);
    }

    #[test]
    fn test_reference_mismatch() {
        let inputs = mycobacterium_inputs()
            .reference_gff(Some(PathBuf::from("test_data/reference/NC_002951.2.gff")))
            .build().unwrap();
        let err = aggregate_sample(OrganismProfile::Mycobacterium, &inputs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConsistencyError>(),
            Some(&ConsistencyError::ReferenceMismatch {
                mapping: "NC_000962.3".to_string(),
                annotation: "NC_002951.2".to_string()
            })
        );
    }

    #[test]
    fn test_partial_reference() {
        // without the GFF the reference block is skipped
        let inputs = mycobacterium_inputs()
            .reference_gff(None)
            .build().unwrap();
        let result = aggregate_sample(OrganismProfile::Mycobacterium, &inputs).unwrap();
        assert!(result.reference_genome().is_none());
        assert!(result.read_mapping().is_none());
    }

    #[test]
    fn test_sample_mixup() {
        let inputs = mycobacterium_inputs()
            .sample_id("test_mtuberculosis_2".to_string())
            .build().unwrap();
        let err = aggregate_sample(OrganismProfile::Mycobacterium, &inputs).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConsistencyError>(), Some(ConsistencyError::SampleMismatch { .. })));
    }

    #[test]
    fn test_profile_check() {
        let inputs = mycobacterium_inputs()
            .mlst(Some(PathBuf::from("test_data/mlst/mlst.json")))
            .build().unwrap();
        assert!(inputs.provided_decoders().contains(&Decoder::Mlst));
        let err = aggregate_sample(OrganismProfile::Mycobacterium, &inputs).unwrap_err();
        assert_eq!(err.to_string(), "MLST output is not supported by the mycobacterium profile");

        let inputs = mycobacterium_inputs().build().unwrap();
        assert!(inputs.check_profile(OrganismProfile::Staphylococcus).is_err());
        assert!(inputs.check_profile(OrganismProfile::Mycobacterium).is_ok());
    }

    #[test]
    fn test_escherichia_sample() {
        let inputs = SampleInputsBuilder::default()
            .sample_id("test_ecoli_1".to_string())
            .run_metadata(PathBuf::from("test_data/metadata/run_metadata.json"))
            .quast(Some(PathBuf::from("test_data/qc/quast.tsv")))
            .postalignqc(Some(PathBuf::from("test_data/qc/postalignqc.json")))
            .bracken(Some(PathBuf::from("test_data/bracken/bracken.tsv")))
            .mlst(Some(PathBuf::from("test_data/mlst/mlst.json")))
            .cgmlst(Some(PathBuf::from("test_data/cgmlst/chewbbaca.tsv")))
            .amrfinder(Some(PathBuf::from("test_data/amrfinder/amrfinder.tsv")))
            .resfinder(Some(PathBuf::from("test_data/cge/resfinder.json")))
            .virulencefinder(Some(PathBuf::from("test_data/cge/virulencefinder.json")))
            .serotypefinder(Some(PathBuf::from("test_data/cge/serotypefinder.json")))
            .annotation_tracks(vec![PathBuf::from("test_data/annotation/single_chrom.bed")])
            .build().unwrap();
        let result = aggregate_sample(OrganismProfile::Escherichia, &inputs).unwrap();

        assert_eq!(result.qc().len(), 2);
        assert!(result.species_prediction().is_some());

        // AMRFinder: AMR, STRESS, VIRULENCE; ResFinder: AMR, STRESS; VirulenceFinder: VIRULENCE
        assert_eq!(result.element_type_result().len(), 6);

        let methods: Vec<TypingMethod> = result.typing_result().iter().map(|t| t.method).collect();
        assert_eq!(methods, vec![TypingMethod::Mlst, TypingMethod::Cgmlst, TypingMethod::Stx, TypingMethod::OType, TypingMethod::HType]);

        let versions = &result.run_metadata().databases;
        assert!(versions.contains(&SoupVersion::software("resfinder", "4.3.3")));
        assert!(versions.contains(&SoupVersion::software("serotypefinder", "2.0.2")));

        let tracks = result.genome_annotation().unwrap();
        assert_eq!(tracks[0], AnnotationTrack { name: "single_chrom".to_string(), file: "single_chrom.bed".to_string() });
        assert!(result.reference_genome().is_none());
    }

    #[test]
    fn test_empty_results_dropped() {
        let inputs = SampleInputsBuilder::default()
            .sample_id("sample_1".to_string())
            .run_metadata(PathBuf::from("test_data/metadata/run_metadata.json"))
            .amrfinder(Some(PathBuf::from("test_data/amrfinder/empty.tsv")))
            .serotypefinder(Some(PathBuf::from("test_data/cge/serotypefinder_empty.json")))
            .build().unwrap();
        let result = aggregate_sample(OrganismProfile::Escherichia, &inputs).unwrap();
        assert!(result.element_type_result().is_empty());
        assert!(result.typing_result().is_empty());
        assert!(result.genome_annotation().is_none());
    }

    #[test]
    fn test_cdm_qc() {
        let inputs = SampleInputsBuilder::default()
            .quast(Some(PathBuf::from("test_data/qc/quast.tsv")))
            .postalignqc(Some(PathBuf::from("test_data/qc/postalignqc.json")))
            .cgmlst(Some(PathBuf::from("test_data/cgmlst/chewbbaca.tsv")))
            .build().unwrap();
        let qc = collect_cdm_qc(&inputs).unwrap();
        let software: Vec<QcSoftware> = qc.iter().map(|q| q.software).collect();
        assert_eq!(software, vec![QcSoftware::Postalignqc, QcSoftware::Quast, QcSoftware::Chewbbaca]);
        assert_eq!(qc[2], QcMethodResult::missing_loci(4));

        let value = serde_json::to_value(&qc).unwrap();
        assert_eq!(value[2]["result"], serde_json::json!({"n_missing": 4}));

        // nothing given, nothing exported
        assert!(collect_cdm_qc(&SampleInputs::default()).unwrap().is_empty());
    }
}
