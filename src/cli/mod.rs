/*!
# CLI module
Command line interface functionality that is specific to PRP.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The annotate-sv CLI subcommand
pub mod annotate_sv;
/// The create-cdm-input CLI subcommand
pub mod create_cdm_input;
/// The create-output CLI subcommand
pub mod create_output;
/// The print-schema CLI subcommand
pub mod print_schema;
/// The validate CLI subcommand
pub mod validate;
