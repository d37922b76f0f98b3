/// Run information and database/software versions
pub mod metadata;
/// Prediction results for a single element type
pub mod method_result;
/// Element types, subtypes, and phenotype profiles
pub mod phenotype;
/// The per-sample root record and its reference genome block
pub mod pipeline_result;
/// Organism capability profiles
pub mod profile;
/// Assembly and read mapping QC metrics
pub mod qc;
/// Gene and variant records
pub mod records;
/// JSON Schema of the result document
pub mod schema;
/// Species abundance predictions
pub mod species;
/// MLST, cgMLST, lineage, and gene based typing
pub mod typing;
/// Schema errors and the shared validation helpers
pub mod validation;
