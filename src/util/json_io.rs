use anyhow::Context;
use std::io::Write;
use std::fs::File;
use std::path::Path;

/// Opens a file for reading, transparently decompressing it if the filename ends in .gz
fn open_reader(filename: &Path) -> anyhow::Result<Box<dyn std::io::Read>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::read::MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(fp)
}

/// Helper function that loads a file into some type, helpful generic
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let fp = std::io::BufReader::new(open_reader(filename)?);
    let result: T = serde_json::from_reader(fp)
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

/// Loads a file as an untyped JSON value, for callers that inspect the document before deserializing it
/// # Arguments
/// * `filename` - the file path to open and parse
pub fn load_json_value(filename: &Path) -> anyhow::Result<serde_json::Value> {
    load_json(filename)
}

/// This will save a generic serializable struct to JSON.
/// The document is serialized in memory first, so a serialization failure never leaves a partial file.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to, gzip compressed if it ends in .gz
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let buffer = serde_json::to_vec_pretty(data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;

    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    if out_filename.extension().unwrap_or_default() == "gz" {
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::best());
        encoder.write_all(&buffer)
            .with_context(|| format!("Error while writing {out_filename:?}:"))?;
        encoder.finish()
            .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    } else {
        let mut writer = std::io::BufWriter::new(file);
        writer.write_all(&buffer)
            .with_context(|| format!("Error while writing {out_filename:?}:"))?;
        writer.flush()
            .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_gz_round_trip() {
        let out_dir = tempfile::tempdir().unwrap();
        let out_fn = out_dir.path().join("counts.json.gz");
        let data: BTreeMap<String, u64> = [("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();

        save_json(&data, &out_fn).unwrap();
        let loaded: BTreeMap<String, u64> = load_json(&out_fn).unwrap();
        assert_eq!(loaded, data);

        let value = load_json_value(&out_fn).unwrap();
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_json::<serde_json::Value>(Path::new("test_data/does_not_exist.json")).unwrap_err();
        assert!(format!("{err:#}").contains("does_not_exist.json"));
    }
}
