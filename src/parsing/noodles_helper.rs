use anyhow::Context;
use std::io::BufReader;
use std::path::Path;

/// Wrapper function that handles both bgzip compressed and uncompressed text files (BED, TSV)
/// # Arguments
/// * `filename` - path to the file to open, compressed if it ends in .gz
pub fn open_text_file(filename: &Path) -> anyhow::Result<BufReader<Box<dyn std::io::Read>>> {
    let is_compressed = match filename.extension() {
        Some(extension) => {
            extension == "gz"
        },
        None => false
    };

    let reader: Box<dyn std::io::Read> = if is_compressed {
        #[allow(clippy::default_constructed_unit_structs)]
        let bgzf_reader = noodles::bgzf::io::reader::Builder::default()
            .build_from_path(filename)
            .with_context(|| format!("Error while loading {filename:?}:"))?;
        Box::new(bgzf_reader)
    } else {
        Box::new(std::fs::File::open(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?)
    };
    Ok(BufReader::new(reader))
}
