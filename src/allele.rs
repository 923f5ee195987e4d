//! HLA allele naming and row classification.
//!
//! Alleles are named `<locus>*<field>:<field>[:...]`, optionally followed by
//! an expression suffix (`N` = null, `Q` = questionable, `S` = secreted).
//! The classifier tags each fixed-width row of an alignment file before any
//! matrix assembly happens, so the regex check lives in exactly one place.

use regex::Regex;

/// Expression suffixes excluded by default: null, questionable, secreted.
pub const EXPRESSION_EXCLUSION: [char; 3] = ['N', 'Q', 'S'];

/// Loci with protein alignment files published by IMGT/HLA.
pub const HLA_LOCI: [&str; 22] = [
    "A", "B", "C", "ClassI", "DMA", "DMB", "DOA", "DOB", "DPA1", "DPB1", "DQA1", "DQB1", "DRA",
    "DRB", "E", "F", "G", "HFE", "MICA", "MICB", "TAP1", "TAP2",
];

/// Name of the protein alignment file for a locus, e.g. `A_prot.txt`.
pub fn prot_file_name(locus: &str) -> String {
    format!("{locus}_prot.txt")
}

/// Whether an allele name ends in one of the given expression suffixes.
pub fn has_exclusion_suffix(allele: &str, exclusion: &[char]) -> bool {
    allele.chars().last().is_some_and(|c| exclusion.contains(&c))
}

/// Classification of one physical row of an alignment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// A data row carrying residues for the named allele.
    Allele {
        /// The full allele name, suffix included.
        name: String,
        /// The matched expression suffix, if any.
        suffix: Option<char>,
    },
    /// Headers, rulers, tick lines, blank separators, footers.
    Ignored,
}

/// Tags rows by matching the allele-name field against an HLA-allele-like
/// pattern: word characters, `*`, 2-3 digits, more fields, `:`, 2-3 digits,
/// optionally a single expression suffix.
#[derive(Debug, Clone)]
pub struct AlleleClassifier {
    pattern: Regex,
}

impl AlleleClassifier {
    /// Builds a classifier whose suffix group is drawn from `exclusion`.
    ///
    /// An empty exclusion set means no suffix is ever captured.
    pub fn new(exclusion: &[char]) -> Self {
        let class: String = exclusion.iter().filter(|c| c.is_ascii_alphanumeric()).collect();
        // `[]` is not a valid character class, so an empty set drops the
        // suffix group entirely.
        let pattern = if class.is_empty() {
            Regex::new(r"(\w+\*\d{2,3}.*:\d{2,3})").expect("allele pattern is valid")
        } else {
            Regex::new(&format!(r"(\w+\*\d{{2,3}}.*:\d{{2,3}})([{class}]?)"))
                .expect("allele pattern is valid")
        };
        Self { pattern }
    }

    /// Classifies the (already trimmed) allele-name field of a row.
    pub fn classify(&self, field: &str) -> RowKind {
        match self.pattern.captures(field) {
            Some(caps) => {
                let suffix = caps.get(2).and_then(|m| m.as_str().chars().next());
                RowKind::Allele {
                    name: field.to_string(),
                    suffix,
                }
            }
            None => RowKind::Ignored,
        }
    }
}

impl Default for AlleleClassifier {
    fn default() -> Self {
        Self::new(&EXPRESSION_EXCLUSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_allele_names() {
        let classifier = AlleleClassifier::default();
        for name in ["DRB1*01:02", "A*01:01:01:01", "TAP1*01:01:01:01", "DPA1*01:03:01:01"] {
            assert!(
                matches!(classifier.classify(name), RowKind::Allele { .. }),
                "{name} should classify as an allele row"
            );
        }
    }

    #[test]
    fn test_rejects_non_allele_rows() {
        let classifier = AlleleClassifier::default();
        for text in [
            "",
            " Prot",
            "|",
            "Sequences Aligned: 2017",
            "HLA-A Protein Sequence Alignments",
            "Please see http://hla.alleles.org/terms.html for terms of use.",
        ] {
            assert_eq!(classifier.classify(text), RowKind::Ignored, "{text:?}");
        }
    }

    #[test]
    fn test_captures_expression_suffix() {
        let classifier = AlleleClassifier::default();
        match classifier.classify("A*01:01:01:01N") {
            RowKind::Allele { name, suffix } => {
                assert_eq!(name, "A*01:01:01:01N");
                assert_eq!(suffix, Some('N'));
            }
            other => panic!("expected allele row, got {other:?}"),
        }
        match classifier.classify("A*01:01:01:01") {
            RowKind::Allele { suffix, .. } => assert_eq!(suffix, None),
            other => panic!("expected allele row, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_exclusion_set_captures_no_suffix() {
        let classifier = AlleleClassifier::new(&[]);
        match classifier.classify("A*01:01:01:01N") {
            RowKind::Allele { name, suffix } => {
                assert_eq!(name, "A*01:01:01:01N");
                assert_eq!(suffix, None);
            }
            other => panic!("expected allele row, got {other:?}"),
        }
        assert_eq!(classifier.classify(" Prot"), RowKind::Ignored);
    }

    #[test]
    fn test_suffix_outside_exclusion_set_is_not_captured() {
        // 'L' (low expression) is not in the default exclusion set.
        let classifier = AlleleClassifier::default();
        match classifier.classify("A*30:14L") {
            RowKind::Allele { suffix, .. } => assert_eq!(suffix, None),
            other => panic!("expected allele row, got {other:?}"),
        }
    }

    #[test]
    fn test_has_exclusion_suffix() {
        assert!(has_exclusion_suffix("A*01:01:01:01N", &EXPRESSION_EXCLUSION));
        assert!(has_exclusion_suffix("DQB1*03:01:29Q", &EXPRESSION_EXCLUSION));
        assert!(!has_exclusion_suffix("A*01:01:01:01", &EXPRESSION_EXCLUSION));
        assert!(!has_exclusion_suffix("", &EXPRESSION_EXCLUSION));
    }

    #[test]
    fn test_prot_file_name() {
        assert_eq!(prot_file_name("DPB1"), "DPB1_prot.txt");
        assert!(HLA_LOCI.contains(&"DRB"));
    }
}
