//! Data model for HLA protein alignments.
//!
//! This module contains the data structures produced by the parser:
//! - File metadata (locus, release, alignment date, mature-protein start)
//! - The position-indexed alignment matrix
//! - Unique-sequence tables and position selections
//!
//! Positions are signed and skip zero: the mature protein starts at `1`,
//! leader-peptide residues are numbered `-1, -2, ...` going left, matching
//! the ruler line of the IMGT/HLA alignment files.

use std::fmt;

use chrono::NaiveDate;

use crate::formats::prot::ProtError;

/// An IPD-IMGT/HLA release version, e.g. `3.30.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Release(pub u16, pub u16, pub u16);

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

/// Metadata extracted from the header of an alignment file.
///
/// Computed once per parser instance and reused by derived operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Locus name from the title line, e.g. `HLA-DPA1`.
    pub locus: String,
    /// Database release the alignment was built from.
    pub release: Release,
    /// Date the sequences were aligned. `None` when the date line could not
    /// be parsed; consumers must tolerate the degraded value.
    pub date: Option<NaiveDate>,
    /// Number of leader-peptide residues preceding mature-protein position 1
    /// in the reference sequence.
    pub prot_start: usize,
}

/// Computes the signed position labels for `columns` alignment columns.
///
/// Column `i` (0-based) maps to `i - prot_start`, except that the label `0`
/// does not exist: numbering skips from `-1` straight to `1`.
pub fn position_labels(prot_start: usize, columns: usize) -> Vec<i32> {
    let start = -(prot_start as i32);
    let end = columns as i32 - prot_start as i32;
    (start..=end).filter(|&p| p != 0).collect()
}

/// One aligned allele: its full name and one residue per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRow {
    /// Allele name, e.g. `DPA1*01:03:01:01`.
    pub allele: String,
    residues: Vec<u8>,
}

impl AlignedRow {
    pub(crate) fn new(allele: String, residues: Vec<u8>) -> Self {
        Self { allele, residues }
    }

    /// The residues as raw bytes, one per column.
    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    /// The residues rendered as a string.
    ///
    /// Residues come from an ASCII fixed-width file; if the row somehow
    /// holds invalid UTF-8, this returns `""` rather than panicking. Use
    /// [`residues`](Self::residues) to inspect the raw bytes.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.residues).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub(crate) fn residues_mut(&mut self) -> &mut [u8] {
        &mut self.residues
    }
}

/// A rectangular protein alignment.
///
/// Rows are alleles in file order; the first row is the reference sequence.
/// Columns are labelled with signed amino-acid positions that never include
/// zero. Gap placeholders (`-`) in non-reference rows have already been
/// resolved against the reference.
#[derive(Debug, Clone)]
pub struct AlignmentMatrix {
    positions: Vec<i32>,
    rows: Vec<AlignedRow>,
}

impl AlignmentMatrix {
    pub(crate) fn new(positions: Vec<i32>, rows: Vec<AlignedRow>) -> Self {
        Self { positions, rows }
    }

    /// The signed position labels, strictly increasing, zero excluded.
    pub fn positions(&self) -> &[i32] {
        &self.positions
    }

    /// All rows in file order. The first row is the reference.
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    /// The reference row the gap placeholders were resolved against.
    pub fn reference(&self) -> Option<&AlignedRow> {
        self.rows.first()
    }

    /// Iterates over the allele names in file order.
    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.allele.as_str())
    }

    /// Number of alleles.
    pub fn allele_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of alignment columns.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Maps a signed position label to its column index.
    pub fn position_index(&self, position: i32) -> Option<usize> {
        // Labels are strictly increasing.
        self.positions.binary_search(&position).ok()
    }

    /// Looks up a row by allele name.
    pub fn row(&self, allele: &str) -> Option<&AlignedRow> {
        self.rows.iter().find(|r| r.allele == allele)
    }

    /// The residue of `allele` at signed `position`.
    pub fn get(&self, allele: &str, position: i32) -> Option<char> {
        let col = self.position_index(position)?;
        self.row(allele)
            .and_then(|r| r.residues().get(col))
            .map(|&b| b as char)
    }
}

/// Selects a subset of alignment positions for the unique-sequence reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSelection {
    /// Every column of the matrix.
    All,
    /// An inclusive signed range; the non-existent position 0 is skipped.
    Range(i32, i32),
    /// An explicit ordered list of positions.
    Explicit(Vec<i32>),
}

impl PositionSelection {
    /// Builds a selection from a loose position list:
    /// empty means all columns, two elements are a start/end pair, three or
    /// more are taken verbatim. A single element is ambiguous and rejected.
    pub fn from_positions(positions: &[i32]) -> Result<Self, ProtError> {
        match positions {
            [] => Ok(Self::All),
            [_] => Err(ProtError::InvalidRange(
                "a single position is ambiguous, give a start and end or an explicit list"
                    .to_string(),
            )),
            [start, end] => Ok(Self::Range(*start, *end)),
            more => Ok(Self::Explicit(more.to_vec())),
        }
    }
}

/// Distinct sequences observed over a position selection.
///
/// Allele identity is discarded; rows are just the distinct variants and
/// their order is unspecified.
#[derive(Debug, Clone)]
pub struct SequenceTable {
    positions: Vec<i32>,
    rows: Vec<Vec<u8>>,
}

impl SequenceTable {
    pub(crate) fn new(positions: Vec<i32>, rows: Vec<Vec<u8>>) -> Self {
        Self { positions, rows }
    }

    /// The selected position labels, one per column.
    pub fn positions(&self) -> &[i32] {
        &self.positions
    }

    /// The distinct sequences, one byte per selected column.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Number of distinct sequences.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `sequence` is one of the distinct variants.
    pub fn contains(&self, sequence: &str) -> bool {
        self.rows.iter().any(|r| r.as_slice() == sequence.as_bytes())
    }
}
