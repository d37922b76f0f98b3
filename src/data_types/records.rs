use serde::{Deserialize, Serialize};

use crate::data_types::phenotype::{ElementSubtype, ElementType, PhenotypeInfo, PhenotypeProfile, SequenceStrand};
use crate::data_types::validation::{
    check_interval, check_not_empty, check_optional_range, join_path, required_option, validate_all,
    SchemaError, Validate
};

/// Variant kinds; positions in all variant records are 1-based
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumIter)]
pub enum VariantType {
    /// Equal length change, reported at codon or gene level
    #[serde(rename = "substitution")]
    Substitution,
    /// ALT is longer than REF
    #[serde(rename = "insertion")]
    Insertion,
    /// REF is longer than ALT
    #[serde(rename = "deletion")]
    Deletion,
    /// REF and ALT are both length = 1
    #[serde(rename = "SNV")]
    Snv,
    /// REF and ALT are equal length > 1
    #[serde(rename = "MNV")]
    Mnv,
    /// Structural variant from an `SVTYPE` tag or a symbolic ALT, the subtype names the rearrangement
    #[serde(rename = "SV")]
    Sv
}

/// Secondary classification for variants
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize, strum_macros::Display, strum_macros::EnumIter)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariantSubtype {
    Insertion,
    Deletion,
    Substitution,
    Transition,
    Transversion,
    Inversion,
    Duplication,
    Translocation
}

/// Fields only some gene callers report, tagged by the producing software
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "software", rename_all = "lowercase")]
pub enum GeneDetails {
    Amrfinder {
        /// Drug class, e.g. BETA-LACTAM
        res_class: Option<String>,
        res_subclass: Option<String>
    },
    Resfinder {
        depth: Option<f64>,
        #[serde(default)]
        ref_database: Vec<String>
    },
    Virulencefinder {
        depth: Option<f64>,
        /// Protein function or free text from the database
        note: Option<String>
    },
    Serotypefinder {
        /// Serotype predicted from this hit, e.g. O157
        serotype: Option<String>
    }
}

/// A resistance, stress, or virulence gene hit
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GeneRecord {
    pub gene_symbol: Option<String>,
    pub accession: Option<String>,
    /// Reference sequence name
    pub sequence_name: Option<String>,
    pub element_type: ElementType,
    pub element_subtype: ElementSubtype,
    /// Alignment start in the reference, 1-based
    pub ref_start_pos: Option<u64>,
    /// Alignment end in the reference, 1-based inclusive
    pub ref_end_pos: Option<u64>,
    /// Length of the reference protein or gene
    pub ref_gene_length: Option<u64>,
    /// Assembly contig carrying the hit
    pub contig_id: Option<String>,
    pub query_start_pos: Option<u64>,
    pub query_end_pos: Option<u64>,
    pub strand: Option<SequenceStrand>,
    /// Percent identity to the reference
    pub identity: Option<f64>,
    /// Percent of the reference covered
    pub coverage: Option<f64>,
    /// Method used to predict the gene
    pub method: Option<String>,
    #[serde(default)]
    pub phenotypes: Vec<PhenotypeInfo>,
    pub details: GeneDetails
}

impl Validate for GeneRecord {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.element_subtype.element_type() != self.element_type {
            return Err(SchemaError::SubtypeMismatch {
                path: join_path(path, "element_subtype"),
                element_type: self.element_type,
                subtype: self.element_subtype
            });
        }
        check_interval(&join_path(path, "ref_start_pos"), self.ref_start_pos, self.ref_end_pos)?;
        check_interval(&join_path(path, "query_start_pos"), self.query_start_pos, self.query_end_pos)?;
        check_optional_range(&join_path(path, "identity"), self.identity, 0.0, 100.0)?;
        check_optional_range(&join_path(path, "coverage"), self.coverage, 0.0, 100.0)?;
        if let GeneDetails::Resfinder { depth, .. } | GeneDetails::Virulencefinder { depth, .. } = &self.details {
            check_optional_range(&join_path(path, "details.depth"), *depth, 0.0, f64::MAX)?;
        }
        validate_all(&join_path(path, "phenotypes"), &self.phenotypes)
    }
}

/// Fields only some variant callers report, tagged by the producing software
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "software", rename_all = "lowercase")]
pub enum VariantDetails {
    Mykrobe {
        /// Genotype confidence reported with the call
        confidence: Option<u32>
    },
    Tbprofiler {
        /// Consequence, e.g. missense_variant
        variant_effect: Option<String>,
        hgvs_nt_change: Option<String>,
        hgvs_aa_change: Option<String>
    },
    Resfinder {
        #[serde(default)]
        ref_database: Vec<String>
    },
    Vcf {
        /// QUAL column
        quality: Option<f64>,
        /// FORMAT/GQ of the first sample
        genotype_confidence: Option<f64>
    }
}

/// A point mutation or structural variant
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct VariantRecord {
    pub variant_type: VariantType,
    pub variant_subtype: Option<VariantSubtype>,
    #[serde(default)]
    pub phenotypes: Vec<PhenotypeInfo>,
    /// Gene symbol, or the chromosome for variants loaded from VCF files
    pub gene_symbol: String,
    pub accession: Option<String>,
    /// Start position, 1-based; negative positions are upstream of the gene start
    pub position: i64,
    /// End position, 1-based inclusive
    pub end: Option<i64>,
    pub ref_nt: String,
    pub alt_nt: String,
    pub ref_aa: Option<String>,
    pub alt_aa: Option<String>,
    /// Total depth, ref + alt
    pub depth: Option<f64>,
    /// Alternate allele frequency
    pub frequency: Option<f64>,
    /// Variant caller or prediction method
    pub method: Option<String>,
    /// `None` if the source did not report any filter information
    #[serde(deserialize_with = "required_option")]
    pub passed_qc: Option<bool>,
    pub details: VariantDetails
}

impl Validate for VariantRecord {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        check_not_empty(&join_path(path, "gene_symbol"), &self.gene_symbol)?;
        if self.position == 0 {
            return Err(SchemaError::InvalidField {
                path: join_path(path, "position"),
                reason: "positions are 1-based and must not be 0".to_string()
            });
        }
        if let Some(end) = self.end {
            if end < self.position {
                return Err(SchemaError::InvalidField {
                    path: join_path(path, "end"),
                    reason: format!("end ({end}) is before position ({})", self.position)
                });
            }
        }
        check_not_empty(&join_path(path, "ref_nt"), &self.ref_nt)?;
        check_not_empty(&join_path(path, "alt_nt"), &self.alt_nt)?;

        let (ref_len, alt_len) = (self.ref_nt.len(), self.alt_nt.len());
        let lengths_ok = match self.variant_type {
            VariantType::Snv => ref_len == 1 && alt_len == 1,
            VariantType::Substitution |
            VariantType::Mnv => ref_len == alt_len,
            VariantType::Insertion |
            VariantType::Deletion |
            VariantType::Sv => true
        };
        if !lengths_ok {
            return Err(SchemaError::InvalidField {
                path: join_path(path, "variant_type"),
                reason: format!("{} does not fit REF {:?} and ALT {:?}", self.variant_type, self.ref_nt, self.alt_nt)
            });
        }

        if self.variant_type == VariantType::Sv && !matches!(
            self.variant_subtype,
            Some(VariantSubtype::Deletion | VariantSubtype::Insertion | VariantSubtype::Duplication |
                 VariantSubtype::Inversion | VariantSubtype::Translocation)
        ) {
            return Err(SchemaError::InvalidField {
                path: join_path(path, "variant_subtype"),
                reason: format!("structural variants need a rearrangement subtype, found {:?}", self.variant_subtype)
            });
        }

        check_optional_range(&join_path(path, "depth"), self.depth, 0.0, f64::MAX)?;
        check_optional_range(&join_path(path, "frequency"), self.frequency, 0.0, 1.0)?;
        validate_all(&join_path(path, "phenotypes"), &self.phenotypes)
    }
}

/// Genes and variants backing a phenotype profile for one element type
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ElementTypeResult {
    pub phenotypes: PhenotypeProfile,
    pub genes: Vec<GeneRecord>,
    pub variants: Vec<VariantRecord>
}

impl ElementTypeResult {
    /// True if nothing actionable was found
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty() && self.variants.is_empty()
    }
}

impl Validate for ElementTypeResult {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        self.phenotypes.validate(&join_path(path, "phenotypes"))?;
        validate_all(&join_path(path, "genes"), &self.genes)?;
        validate_all(&join_path(path, "variants"), &self.variants)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A fully populated gene record shared by several test modules
    pub(crate) fn mock_gene() -> GeneRecord {
        GeneRecord {
            gene_symbol: Some("blaZ".to_string()),
            accession: Some("WP_000733283.1".to_string()),
            sequence_name: Some("penicillin-hydrolyzing class A beta-lactamase BlaZ".to_string()),
            element_type: ElementType::Amr,
            element_subtype: ElementSubtype::Amr,
            ref_start_pos: Some(1),
            ref_end_pos: Some(281),
            ref_gene_length: Some(281),
            contig_id: Some("contig_7".to_string()),
            query_start_pos: Some(1034),
            query_end_pos: Some(1879),
            strand: Some(SequenceStrand::Reverse),
            identity: Some(100.0),
            coverage: Some(100.0),
            method: Some("EXACTX".to_string()),
            phenotypes: vec![PhenotypeInfo::new("penicillin", ElementType::Amr)],
            details: GeneDetails::Amrfinder {
                res_class: Some("BETA-LACTAM".to_string()),
                res_subclass: Some("PENICILLIN".to_string())
            }
        }
    }

    pub(crate) fn mock_variant() -> VariantRecord {
        VariantRecord {
            variant_type: VariantType::Substitution,
            variant_subtype: None,
            phenotypes: vec![PhenotypeInfo::new("rifampicin", ElementType::Amr)],
            gene_symbol: "rpoB".to_string(),
            accession: Some("Rv0667".to_string()),
            position: 761155,
            end: Some(761155),
            ref_nt: "C".to_string(),
            alt_nt: "T".to_string(),
            ref_aa: Some("S".to_string()),
            alt_aa: Some("L".to_string()),
            depth: Some(40.0),
            frequency: Some(0.75),
            method: Some("mykrobe".to_string()),
            passed_qc: Some(true),
            details: VariantDetails::Mykrobe { confidence: Some(155) }
        }
    }

    #[test]
    fn test_gene_subtype_mismatch() {
        let mut gene = mock_gene();
        assert!(gene.validate("genes[0]").is_ok());

        gene.element_subtype = ElementSubtype::Toxin;
        assert_eq!(
            gene.validate("genes[0]").unwrap_err(),
            SchemaError::SubtypeMismatch {
                path: "genes[0].element_subtype".to_string(),
                element_type: ElementType::Amr,
                subtype: ElementSubtype::Toxin
            }
        );
    }

    #[test]
    fn test_gene_identity_range() {
        let mut gene = mock_gene();
        gene.identity = Some(100.5);
        assert!(matches!(gene.validate("g").unwrap_err(), SchemaError::OutOfRange { .. }));
    }

    #[test]
    fn test_variant_validation() {
        let mut variant = mock_variant();
        assert!(variant.validate("v").is_ok());

        variant.frequency = Some(1.5);
        assert!(variant.validate("v").is_err());

        let mut variant = mock_variant();
        variant.variant_type = VariantType::Snv;
        variant.alt_nt = "TT".to_string();
        assert!(variant.validate("v").is_err());

        let mut variant = mock_variant();
        variant.position = 0;
        assert!(variant.validate("v").is_err());
    }

    #[test]
    fn test_structural_variant_subtype() {
        let mut variant = mock_variant();
        variant.variant_type = VariantType::Sv;
        variant.alt_nt = "<DEL>".to_string();
        variant.variant_subtype = Some(VariantSubtype::Deletion);
        assert!(variant.validate("sv_variants[0]").is_ok());

        variant.variant_subtype = Some(VariantSubtype::Transition);
        let err = variant.validate("sv_variants[0]").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField { path, .. } if path == "sv_variants[0].variant_subtype"));

        variant.variant_subtype = None;
        assert!(variant.validate("sv_variants[0]").is_err());
    }

    #[test]
    fn test_variant_round_trip() {
        let variant = mock_variant();
        let text = serde_json::to_string(&variant).unwrap();
        let parsed: VariantRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, variant);

        let gene = mock_gene();
        let text = serde_json::to_string(&gene).unwrap();
        let parsed: GeneRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, gene);
    }

    #[test]
    fn test_passed_qc_must_be_explicit() {
        let mut value = serde_json::to_value(mock_variant()).unwrap();

        // null is allowed and means the source had no filter information
        value["passed_qc"] = serde_json::Value::Null;
        let parsed: VariantRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(parsed.passed_qc, None);

        // a missing key is not silently defaulted
        value.as_object_mut().unwrap().remove("passed_qc");
        assert!(serde_json::from_value::<VariantRecord>(value).is_err());
    }

    #[test]
    fn test_empty_result() {
        let mut result = ElementTypeResult::default();
        assert!(result.is_empty());
        result.variants.push(mock_variant());
        assert!(!result.is_empty());
    }
}
