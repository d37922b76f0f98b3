/*!
# Parsing module
Contains the decoders that turn upstream tool outputs into canonical records.
*/

/// Reference accession lookup from read mappings
pub mod bam;
/// Species abundance from Bracken
pub mod bracken;
/// Hit tables shared by the CGE tools (ResFinder, VirulenceFinder, SerotypeFinder)
pub mod cge;
/// cgMLST allele profiles from chewBBACA
pub mod cgmlst;
/// Gene, variant, and phenotype predictions from AMRFinderPlus
pub mod amrfinder;
/// Reference genome accession and name from GFF annotations
pub mod gff;
/// Run and process metadata from the pipeline
pub mod metadata;
/// 7-gene MLST
pub mod mlst;
/// Compact mutation strings such as `GCG7569GTG`
pub mod mutation_notation;
/// Resistance and lineage predictions from Mykrobe
pub mod mykrobe;
/// Helper functions for noodles
pub mod noodles_helper;
/// QUAST and post-alignment QC metrics
pub mod qc;
/// Resistance predictions from ResFinder
pub mod resfinder;
/// O and H typing from SerotypeFinder
pub mod serotypefinder;
/// BED based gene lookups for structural variants
pub mod sv_annotation;
/// Resistance and lineage predictions from TBProfiler
pub mod tbprofiler;
/// Variant loading from VCF files
pub mod variant_loader;
/// Virulence genes and Shiga toxin typing from VirulenceFinder
pub mod virulencefinder;

/// Malformed upstream output
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum DecodeError {
    #[error("required column {column:?} is missing")]
    MissingColumn { column: String },
    #[error("required field {field:?} is missing")]
    MissingField { field: String },
    #[error("{field}: could not parse {value:?}")]
    InvalidValue { field: String, value: String },
    #[error("{field}: {value:?} does not match the expected pattern")]
    PatternMismatch { field: String, value: String },
    #[error("{field}: unknown variant type {value:?}")]
    UnknownVariantType { field: String, value: String },
    #[error("row has {found} columns but the header has {expected}")]
    ColumnCount { expected: usize, found: usize }
}

/// Inputs that are individually valid but disagree with each other
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ConsistencyError {
    #[error("read mapping and genome annotation use different reference genomes; mapping accession: {mapping}, annotation accession: {annotation}")]
    ReferenceMismatch { mapping: String, annotation: String },
    #[error("reference FASTA does not contain the accession {accession}")]
    MissingReferenceContig { accession: String },
    #[error("sample id {sample_id:?} is not in the {software} result (found {found:?}), possible sample mixup")]
    SampleMismatch { sample_id: String, software: String, found: String },
    #[error("chromosome {chrom:?} is not in the BED file and the file contains {num_chroms} chromosomes")]
    AnnotationChromosome { chrom: String, num_chroms: usize }
}
