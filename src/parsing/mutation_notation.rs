use crate::data_types::records::VariantType;

/// A decoded `<ref><position><alt>` string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationNotation {
    pub variant_type: VariantType,
    pub ref_allele: String,
    pub alt_allele: String,
    /// 1-based; negative positions are upstream of the gene, e.g. `C-15T`
    pub position: i64
}

/// Classifies a change by allele lengths: longer REF is a deletion, longer ALT is an insertion, otherwise a substitution
pub fn classify_by_length(ref_len: usize, alt_len: usize) -> VariantType {
    use std::cmp::Ordering;
    match ref_len.cmp(&alt_len) {
        Ordering::Greater => VariantType::Deletion,
        Ordering::Less => VariantType::Insertion,
        Ordering::Equal => VariantType::Substitution
    }
}

/// Decodes a compact mutation string into its parts.
/// The digit run between the first and the last digit is the position, the letters before and after are the alleles.
/// Returns `None` for anything that cannot be decoded; this is a normal outcome, not an error.
/// # Arguments
/// * `notation` - the change string, e.g. `GCG7569GTG` or `S450L`
/// # Examples
/// ```
/// use prp::data_types::records::VariantType;
/// use prp::parsing::mutation_notation::decode_mutation;
/// let decoded = decode_mutation("GCG7569GTG").unwrap();
/// assert_eq!(decoded.variant_type, VariantType::Substitution);
/// assert_eq!(decoded.position, 7569);
/// assert!(decode_mutation("no digits").is_none());
/// ```
pub fn decode_mutation(notation: &str) -> Option<MutationNotation> {
    let first_digit = notation.find(|c: char| c.is_ascii_digit())?;
    let last_digit = notation.rfind(|c: char| c.is_ascii_digit())?;

    // anything in between that is not a digit (e.g. `100_101`) makes this unparseable
    let mut position: i64 = notation[first_digit..=last_digit].parse().ok()?;
    let mut ref_allele = &notation[..first_digit];
    let alt_allele = &notation[last_digit + 1..];
    if let Some(stripped) = ref_allele.strip_suffix('-') {
        ref_allele = stripped;
        position = -position;
    }

    if position == 0 || (ref_allele.is_empty() && alt_allele.is_empty()) {
        return None;
    }

    Some(MutationNotation {
        variant_type: classify_by_length(ref_allele.len(), alt_allele.len()),
        ref_allele: ref_allele.to_string(),
        alt_allele: alt_allele.to_string(),
        position
    })
}

/// Reduces two equal-length alleles to the characters that differ, upper cased.
/// E.g. the codon change `TCG > TTG` becomes `C > T`.
pub fn reduce_codon_change(ref_codon: &str, alt_codon: &str) -> (String, String) {
    ref_codon.chars()
        .zip(alt_codon.chars())
        .filter(|(r, a)| r != a)
        .map(|(r, a)| (r.to_ascii_uppercase(), a.to_ascii_uppercase()))
        .unzip()
}

/// Classifies a ref/alt pair by length and, for substitutions, reduces it to the differing bases.
/// Identical alleles have nothing to reduce to and are kept whole.
/// E.g. `("tcg", "ttg")` becomes `(Substitution, "C", "T")`.
pub fn normalize_alleles(ref_allele: &str, alt_allele: &str) -> (VariantType, String, String) {
    let variant_type = classify_by_length(ref_allele.len(), alt_allele.len());
    let (ref_reduced, alt_reduced) = if variant_type == VariantType::Substitution {
        reduce_codon_change(ref_allele, alt_allele)
    } else {
        (String::new(), String::new())
    };
    if ref_reduced.is_empty() {
        (variant_type, ref_allele.to_uppercase(), alt_allele.to_uppercase())
    } else {
        (variant_type, ref_reduced, alt_reduced)
    }
}

/// Total depth and alternate allele frequency from per-allele read counts.
/// The frequency is undefined (`None`) when there are no reads.
pub fn depth_and_frequency(ref_depth: u64, alt_depth: u64) -> (f64, Option<f64>) {
    let depth = (ref_depth + alt_depth) as f64;
    let frequency = if depth > 0.0 {
        Some(alt_depth as f64 / depth)
    } else {
        None
    };
    (depth, frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_decode_codon_change() {
        assert_eq!(decode_mutation("GCG7569GTG"), Some(MutationNotation {
            variant_type: VariantType::Substitution,
            ref_allele: "GCG".to_string(),
            alt_allele: "GTG".to_string(),
            position: 7569
        }));
        assert_eq!(decode_mutation("S450L").unwrap().position, 450);
    }

    #[test]
    fn test_decode_indels() {
        let deletion = decode_mutation("CTA1673425C").unwrap();
        assert_eq!(deletion.variant_type, VariantType::Deletion);
        let insertion = decode_mutation("A1673425ATT").unwrap();
        assert_eq!(insertion.variant_type, VariantType::Insertion);
        assert_eq!(insertion.alt_allele, "ATT");
    }

    #[test]
    fn test_decode_upstream() {
        let upstream = decode_mutation("C-15T").unwrap();
        assert_eq!(upstream.position, -15);
        assert_eq!(upstream.ref_allele, "C");
        assert_eq!(upstream.alt_allele, "T");
    }

    #[test]
    fn test_not_decodable() {
        assert_eq!(decode_mutation(""), None);
        assert_eq!(decode_mutation("GCGGTG"), None);
        assert_eq!(decode_mutation("A100_101del"), None);
        assert_eq!(decode_mutation("1234"), None);
        assert_eq!(decode_mutation("A0T"), None);
    }

    #[test]
    fn test_reduce_codon_change() {
        assert_eq!(reduce_codon_change("TCG", "TTG"), ("C".to_string(), "T".to_string()));
        assert_eq!(reduce_codon_change("acg", "aTc"), ("CG".to_string(), "TC".to_string()));
        assert_eq!(reduce_codon_change("AAA", "AAA"), (String::new(), String::new()));
    }

    #[test]
    fn test_normalize_alleles() {
        assert_eq!(normalize_alleles("tcg", "ttg"), (VariantType::Substitution, "C".to_string(), "T".to_string()));
        assert_eq!(normalize_alleles("AGC", "A"), (VariantType::Deletion, "AGC".to_string(), "A".to_string()));
        assert_eq!(normalize_alleles("c", "c"), (VariantType::Substitution, "C".to_string(), "C".to_string()));
    }

    #[test]
    fn test_depth_and_frequency() {
        let (depth, frequency) = depth_and_frequency(10, 30);
        assert_approx_eq!(depth, 40.0);
        assert_approx_eq!(frequency.unwrap(), 0.75);

        assert_eq!(depth_and_frequency(0, 0), (0.0, None));
    }
}
