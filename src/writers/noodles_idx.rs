use std::path::{Path, PathBuf};

/// Indexes a bgzipped VCF file with the noodles indexer, writing `<vcf_fn>.tbi` next to it.
/// # Arguments
/// * `vcf_fn` - the filename to index
/// # Errors
/// * if the VCF is not bgzipped or not sorted
pub fn index_vcf(vcf_fn: &Path) -> anyhow::Result<()> {
    let index = noodles::vcf::fs::index(vcf_fn)?;

    let mut tbi_fn = vcf_fn.to_owned().into_os_string();
    tbi_fn.push(".tbi");
    noodles::tabix::fs::write(PathBuf::from(tbi_fn), &index)?;
    Ok(())
}
