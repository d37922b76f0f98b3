/// Per-sample aggregation of decoded results
pub mod aggregator;
/// Command line interface functionality
pub mod cli;
/// The canonical result model and its validation
pub mod data_types;
/// Decoders for upstream tool outputs
pub mod parsing;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
