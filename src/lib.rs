//! # proline - HLA protein alignment utilities
//!
//! Parses the fixed-width protein alignment files (`*_prot.txt`) published
//! with each IPD-IMGT/HLA release into position-indexed matrices. The files
//! can be retrieved from <https://github.com/ANHIG/IMGTHLA/tree/Latest/alignments>;
//! retrieval itself is out of scope, this crate only reads local files.
//!
//! ## Architecture
//!
//! - `model`: metadata, alignment matrix, unique-sequence tables
//! - `allele`: HLA allele naming, expression suffixes, row classification
//! - `formats`: the fixed-width file parser and its errors
//!
//! ## Example
//!
//! ```no_run
//! use proline::{PositionSelection, ProteinAlignment};
//!
//! let alignment = ProteinAlignment::open("DPB1_prot.txt")?;
//! let matrix = alignment.aligned()?;
//! let variants = alignment.unique_seq(&PositionSelection::Range(9, 90))?;
//! println!(
//!     "{}: {} alleles, {} distinct sequences over 9..=90",
//!     alignment.meta().locus,
//!     matrix.allele_count(),
//!     variants.len(),
//! );
//! # Ok::<(), proline::ParseError>(())
//! ```

pub mod allele;
pub mod formats;
pub mod model;

pub use allele::{AlleleClassifier, RowKind, EXPRESSION_EXCLUSION, HLA_LOCI};
pub use formats::prot::{FieldWidths, ParseOptions, ProtError, ProteinAlignment};
pub use formats::{ParseError, ParseResult};
pub use model::{AlignmentMatrix, Metadata, PositionSelection, Release, SequenceTable};
