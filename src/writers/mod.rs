/*!
# Writers module
Contains the logic for writing annotated variant files.
*/
/// Helper functions for indexing files
pub mod noodles_idx;
/// Writes structural variant VCFs annotated with overlapping genes
pub mod sv_annotation;
