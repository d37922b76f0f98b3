use anyhow::{bail, Context};
use coitrees::{COITree, Interval, IntervalTree};
use indexmap::IndexMap;
use log::{debug, warn};
use std::path::Path;

use crate::parsing::noodles_helper::open_text_file;
use crate::parsing::ConsistencyError;

/// A gene feature from the annotation BED file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneFeature {
    pub locus_tag: String,
    pub gene: String
}

/// Gene lookup for structural variants, built from a BED file with the columns
/// chrom, start, end, locus tag, gene.
pub struct GeneAnnotationIndex {
    /// Lookup from a chromosome to a COITree with 1-based inclusive ranges; metadata indexes into `features`
    lookup_trees: IndexMap<String, COITree<usize, usize>>,
    /// All loaded features, in file order
    features: Vec<GeneFeature>
}

impl std::fmt::Debug for GeneAnnotationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lookup_counts: IndexMap<&String, usize> = self.lookup_trees.iter()
            .map(|(s, c)| (s, c.len()))
            .collect();
        f.debug_struct("GeneAnnotationIndex").field("lookup_trees_len", &lookup_counts).finish()
    }
}

impl GeneAnnotationIndex {
    /// Loads a BED file (optionally bgzipped) into per-chromosome interval trees.
    /// # Arguments
    /// * `bed_fn` - the BED file, 0-based half-open intervals
    /// # Errors
    /// * if the file cannot be read or a row has fewer than 5 columns
    pub fn from_bed(bed_fn: &Path) -> anyhow::Result<Self> {
        debug!("Loading gene annotations from {bed_fn:?}...");
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(open_text_file(bed_fn)?);

        let mut features: Vec<GeneFeature> = vec![];
        let mut intervals: IndexMap<String, Vec<Interval<usize>>> = Default::default();
        for result in csv_reader.records() {
            let row = result.with_context(|| format!("Error while reading {bed_fn:?}:"))?;
            if row.len() < 5 {
                bail!("Expected at least 5 columns, found {}: {row:?}", row.len());
            }
            let start: i32 = row[1].parse()
                .with_context(|| format!("Error while parsing start for row: {row:?}"))?;
            let end: i32 = row[2].parse()
                .with_context(|| format!("Error while parsing end for row: {row:?}"))?;

            // BED is 0-based half-open; convert to 1-based inclusive
            let feature_index = features.len();
            intervals.entry(row[0].to_string())
                .or_default()
                .push(Interval::new(start + 1, end, feature_index));
            features.push(GeneFeature {
                locus_tag: row[3].to_string(),
                gene: row[4].to_string()
            });
        }

        let lookup_trees = intervals.into_iter()
            .map(|(chrom, chrom_intervals)| (chrom, COITree::new(&chrom_intervals)))
            .collect();
        let index = Self { lookup_trees, features };
        debug!("Loaded {index:?}");
        Ok(index)
    }

    /// Number of chromosomes in the annotation
    pub fn num_chromosomes(&self) -> usize {
        self.lookup_trees.len()
    }

    /// Resolves the tree used for a chromosome.
    /// If the chromosome is missing and the index has a single chromosome, that one is used instead.
    /// # Errors
    /// * if the chromosome is missing and the index has several chromosomes
    fn tree_for(&self, chrom: &str) -> Result<Option<&COITree<usize, usize>>, ConsistencyError> {
        if let Some(tree) = self.lookup_trees.get(chrom) {
            return Ok(Some(tree));
        }
        match self.lookup_trees.len() {
            0 => Ok(None),
            1 => Ok(self.lookup_trees.get_index(0).map(|(_, tree)| tree)),
            num_chroms => Err(ConsistencyError::AnnotationChromosome { chrom: chrom.to_string(), num_chroms })
        }
    }

    /// Checks that variants on a chromosome can be annotated, warning if only position-based matching is possible.
    /// # Errors
    /// * if the chromosome is missing and the index has several chromosomes
    pub fn check_chromosome(&self, chrom: &str) -> Result<(), ConsistencyError> {
        self.tree_for(chrom)?;
        if !self.lookup_trees.contains_key(chrom) {
            if let Some((annot_chrom, _)) = self.lookup_trees.get_index(0) {
                warn!("Chromosome {chrom:?} is not in the annotation, matching by position against {annot_chrom:?}");
            }
        }
        Ok(())
    }

    /// Returns the features overlapping a region, sorted by start position.
    /// # Arguments
    /// * `chrom` - the chromosome
    /// * `first` - first included base, 1-based
    /// * `last` - last included base, 1-based
    pub fn overlaps(&self, chrom: &str, first: i64, last: i64) -> Result<Vec<&GeneFeature>, ConsistencyError> {
        let tree = match self.tree_for(chrom)? {
            Some(tree) => tree,
            None => return Ok(vec![])
        };

        let first = i32::try_from(first).unwrap_or(i32::MAX);
        let last = i32::try_from(last).unwrap_or(i32::MAX);
        let mut hits: Vec<(i32, usize)> = vec![];
        tree.query(first, last, |i| {
            hits.push((i.first, i.metadata.clone()));
        });
        hits.sort_unstable();
        Ok(hits.into_iter()
            .map(|(_, feature_index)| &self.features[feature_index])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn genes(hits: Vec<&GeneFeature>) -> Vec<&str> {
        hits.iter().map(|f| f.gene.as_str()).collect()
    }

    #[test]
    fn test_single_chromosome() {
        let index = GeneAnnotationIndex::from_bed(&PathBuf::from("test_data/annotation/single_chrom.bed")).unwrap();
        assert_eq!(index.num_chromosomes(), 1);

        // the chromosome name differs, but there is only one to match against
        assert!(index.check_chromosome("NC_000962.3").is_ok());
        assert_eq!(genes(index.overlaps("NC_000962.3", 1000, 2500).unwrap()), vec!["dnaA", "dnaN"]);
        assert_eq!(genes(index.overlaps("NC_000962.3", 5000, 7200).unwrap()), vec!["gyrB"]);

        // half-open ends
        assert!(index.overlaps("Chromosome", 1501, 2000).unwrap().is_empty());
        assert_eq!(genes(index.overlaps("Chromosome", 1500, 1500).unwrap()), vec!["dnaA"]);
    }

    #[test]
    fn test_multi_chromosome() {
        let index = GeneAnnotationIndex::from_bed(&PathBuf::from("test_data/annotation/multi_chrom.bed")).unwrap();
        assert_eq!(index.num_chromosomes(), 2);
        let hits = index.overlaps("NC_000962.3", 1000, 2500).unwrap();
        assert_eq!(hits[0], &GeneFeature { locus_tag: "Rv0001".to_string(), gene: "dnaA".to_string() });
        assert_eq!(hits.len(), 2);
        assert!(index.overlaps("NC_000962.3", 5000, 7200).unwrap().is_empty());
    }

    #[test]
    fn test_missing_chromosome() {
        let index = GeneAnnotationIndex::from_bed(&PathBuf::from("test_data/annotation/unrelated.bed")).unwrap();
        assert_eq!(
            index.check_chromosome("NC_000962.3"),
            Err(ConsistencyError::AnnotationChromosome { chrom: "NC_000962.3".to_string(), num_chroms: 2 })
        );
        assert!(index.overlaps("NC_000962.3", 1, 100).is_err());
    }
}
