//! IMGT/HLA alignment file parsing.
//!
//! One format is supported: the fixed-width protein alignment files
//! (`*_prot.txt`) published with each IPD-IMGT/HLA release. The layout is
//! not formally documented but has been stable across releases:
//!
//! ```text
//! [0] HLA-DPA1 Protein Sequence Alignments
//! [1] IPD-IMGT/HLA Release: 3.30.0
//! [2] Sequences Aligned: 2017 October 27
//! [3] <attribution>
//! [4] <terms of use>
//! [5]
//! [6]  Prot              -40                                         1
//! [7]                    |                                           |
//! [8]  DPA1*01:03:01:01  M RPEMIR AVLS FLLSLRGAGA ...
//! ```
//!
//! Body rows wrap: an allele's sequence may continue in later blocks under
//! the same name, to be concatenated in file order.

pub mod prot;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::AlignmentMatrix;
use prot::ProteinAlignment;

/// Errors that can occur while parsing alignment files.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Protein alignment error: {0}")]
    Prot(#[from] prot::ProtError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Checks whether content looks like a protein alignment file.
///
/// Only the title line is examined; full validation happens during parsing.
pub fn looks_like_prot_alignment(content: &str) -> bool {
    content
        .lines()
        .next()
        .map(|line| line.trim_end().ends_with("Protein Sequence Alignments"))
        .unwrap_or(false)
}

/// Parses a protein alignment file into a matrix with default options.
///
/// Convenience wrapper: open the file, extract metadata, build the matrix.
/// Use [`ProteinAlignment`] directly to keep the metadata around or to pass
/// options.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<AlignmentMatrix> {
    ProteinAlignment::open(path)?.aligned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prot_alignment() {
        assert!(looks_like_prot_alignment(
            "HLA-DPA1 Protein Sequence Alignments\nIPD-IMGT/HLA Release: 3.30.0\n"
        ));
        assert!(looks_like_prot_alignment("A Protein Sequence Alignments\n"));
    }

    #[test]
    fn test_detect_rejects_other_content() {
        assert!(!looks_like_prot_alignment(""));
        assert!(!looks_like_prot_alignment(">seq1\nACGT\n"));
        assert!(!looks_like_prot_alignment("HLA-A Nucleotide Sequence Alignments\n"));
    }

    #[test]
    fn test_parse_file_missing_path() {
        let result = parse_file("no/such/file_prot.txt");
        assert!(matches!(result, Err(ParseError::FileNotFound(_))));
    }
}
