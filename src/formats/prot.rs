//! Fixed-width IMGT/HLA protein alignment parser.
//!
//! The header layout is hard coded by line number. It is not specified in
//! any official IMGT document, but it has not changed for at least ten
//! years of releases:
//!
//! ```text
//! [0] <locus> Protein Sequence Alignments
//! [1] IPD-IMGT/HLA Release: <major>.<minor>.<patch>
//! [2] Sequences Aligned: <year> <month name> <day>
//! [6]  Prot              -40                                         1
//! [8]  <first allele row, the reference sequence>
//! ```
//!
//! Body rows are two fixed-width fields: the allele name (default 18
//! columns) and a chunk of residues (default 122 columns). Long alignments
//! wrap into further blocks repeating the same allele names; fragments
//! concatenate in file order. A `-` in a non-reference row means "same as
//! the reference at this position" and is resolved after concatenation.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use thiserror::Error;

use crate::allele::{has_exclusion_suffix, AlleleClassifier, RowKind, EXPRESSION_EXCLUSION};
use crate::formats::{ParseError, ParseResult};
use crate::model::{
    position_labels, AlignedRow, AlignmentMatrix, Metadata, PositionSelection, Release,
    SequenceTable,
};

/// Header lines needed for metadata extraction.
const HEADER_ROWS: usize = 9;
const LOCUS_LINE: usize = 0;
const RELEASE_LINE: usize = 1;
const DATE_LINE: usize = 2;
const RULER_LINE: usize = 6;
const FIRST_DATA_LINE: usize = 8;

/// Date format of the `Sequences Aligned` line, e.g. `2017 October 27`.
const DATE_FORMAT: &str = "%Y %B %d";

/// Errors specific to the protein alignment format.
#[derive(Error, Debug)]
pub enum ProtError {
    #[error("Not a protein alignment file or it is corrupted: {0:?}")]
    NotAnAlignment(String),

    #[error("Truncated header: expected {expected} lines, found {found}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("Sequence length mismatch for '{allele}': expected {expected} columns, found {found}")]
    RaggedMatrix {
        allele: String,
        expected: usize,
        found: usize,
    },

    #[error("No allele rows found")]
    NoAlleles,

    #[error("Invalid position range: {0}")]
    InvalidRange(String),

    #[error("Position {0} is not in the alignment")]
    UnknownPosition(i32),
}

/// Widths of the two fixed-width fields of a body row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWidths {
    /// Allele-name field width in columns.
    pub allele: usize,
    /// Sequence field width in columns.
    pub seq: usize,
}

impl Default for FieldWidths {
    fn default() -> Self {
        Self { allele: 18, seq: 122 }
    }
}

/// Options controlling row selection and field decoding.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Limit the matrix to these alleles. The reference row (first data row
    /// in the file) is always kept even if the list omits it.
    pub alleles: Option<Vec<String>>,
    /// Drop alleles carrying an expression suffix from the exclusion set.
    pub ignore_non_expressed: bool,
    /// Fixed-width field layout.
    pub widths: FieldWidths,
    /// Expression suffixes treated as non-expressed. Default: N, Q, S.
    pub exclusion: Vec<char>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            alleles: None,
            ignore_non_expressed: false,
            widths: FieldWidths::default(),
            exclusion: EXPRESSION_EXCLUSION.to_vec(),
        }
    }
}

/// A protein alignment file opened for parsing.
///
/// Metadata is extracted once at construction. [`aligned`](Self::aligned)
/// and [`unique_seq`](Self::unique_seq) re-read the file on every call;
/// callers needing repeated access to the matrix should keep the result.
///
/// # Examples
///
/// ```no_run
/// use proline::ProteinAlignment;
///
/// let alignment = ProteinAlignment::open("DPB1_prot.txt").unwrap();
/// println!("{} release {}", alignment.meta().locus, alignment.meta().release);
/// let matrix = alignment.aligned().unwrap();
/// println!("{} alleles", matrix.allele_count());
/// ```
#[derive(Debug)]
pub struct ProteinAlignment {
    path: PathBuf,
    options: ParseOptions,
    classifier: AlleleClassifier,
    meta: Metadata,
}

impl ProteinAlignment {
    /// Opens an alignment file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::with_options(path, ParseOptions::default())
    }

    /// Opens an alignment file with explicit options.
    ///
    /// Fails before any parsing if the path does not exist; fails with a
    /// format error if the header does not look like a protein alignment.
    pub fn with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> ParseResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ParseError::FileNotFound(path));
        }
        let classifier = AlleleClassifier::new(&options.exclusion);
        let header = read_header(&path)?;
        let meta = parse_metadata(&header, options.widths.allele)?;
        Ok(Self {
            path,
            options,
            classifier,
            meta,
        })
    }

    /// The metadata extracted at construction.
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Builds the full alignment matrix, re-reading the file.
    pub fn aligned(&self) -> ParseResult<AlignmentMatrix> {
        let content = fs::read_to_string(&self.path)?;
        self.build_matrix(&content).map_err(ParseError::from)
    }

    /// Reduces the alignment to the distinct sequences observed over the
    /// selected positions, discarding allele identity.
    ///
    /// Alleles with an exclusion suffix (N, Q, S) are always dropped here,
    /// regardless of the `ignore_non_expressed` parse option. Row order of
    /// the result is unspecified.
    pub fn unique_seq(&self, selection: &PositionSelection) -> ParseResult<SequenceTable> {
        let matrix = self.aligned()?;
        let positions = resolve_selection(&matrix, selection).map_err(ParseError::from)?;
        let columns: Vec<usize> = positions
            .iter()
            .map(|&p| {
                matrix
                    .position_index(p)
                    .ok_or(ProtError::UnknownPosition(p))
            })
            .collect::<Result<_, _>>()
            .map_err(ParseError::from)?;

        let mut distinct: HashSet<Vec<u8>> = HashSet::new();
        for row in matrix.rows() {
            if has_exclusion_suffix(&row.allele, &self.options.exclusion) {
                continue;
            }
            let residues = row.residues();
            distinct.insert(columns.iter().map(|&c| residues[c]).collect());
        }

        Ok(SequenceTable::new(positions, distinct.into_iter().collect()))
    }

    fn build_matrix(&self, content: &str) -> Result<AlignmentMatrix, ProtError> {
        let mut rows: Vec<(String, Vec<u8>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let allow: Option<HashSet<&str>> = self
            .options
            .alleles
            .as_ref()
            .map(|list| list.iter().map(String::as_str).collect());

        for line in content.lines() {
            let (name_field, seq_field) = split_fixed(line, &self.options.widths);
            let RowKind::Allele { name, suffix } = self.classifier.classify(name_field) else {
                continue;
            };
            if self.options.ignore_non_expressed && suffix.is_some() {
                continue;
            }
            // The first retained row is the reference; gap resolution needs
            // it, so it is kept even when the allow-list omits it.
            if let Some(allow) = &allow {
                let is_reference = rows.is_empty() || rows[0].0 == name;
                if !is_reference && !allow.contains(name.as_str()) {
                    continue;
                }
            }
            let fragment = seq_field.bytes().filter(|&b| b != b' ');
            match index.get(&name) {
                Some(&i) => rows[i].1.extend(fragment),
                None => {
                    index.insert(name.clone(), rows.len());
                    rows.push((name, fragment.collect()));
                }
            }
        }

        if rows.is_empty() {
            return Err(ProtError::NoAlleles);
        }

        let expected = rows[0].1.len();
        for (allele, residues) in rows.iter().skip(1) {
            if residues.len() != expected {
                return Err(ProtError::RaggedMatrix {
                    allele: allele.clone(),
                    expected,
                    found: residues.len(),
                });
            }
        }

        // Only cells still `-` after fragment concatenation are filled from
        // the reference; everything else is preserved verbatim.
        let reference = rows[0].1.clone();
        let mut aligned: Vec<AlignedRow> = rows
            .into_iter()
            .map(|(allele, residues)| AlignedRow::new(allele, residues))
            .collect();
        for row in aligned.iter_mut().skip(1) {
            for (col, residue) in row.residues_mut().iter_mut().enumerate() {
                if *residue == b'-' {
                    *residue = reference[col];
                }
            }
        }

        let positions = position_labels(self.meta.prot_start, expected);
        Ok(AlignmentMatrix::new(positions, aligned))
    }
}

/// Reads the header lines used for metadata extraction.
fn read_header(path: &Path) -> ParseResult<Vec<String>> {
    let file = File::open(path)?;
    let mut lines = Vec::with_capacity(HEADER_ROWS);
    for line in BufReader::new(file).lines() {
        lines.push(line?);
        if lines.len() == HEADER_ROWS {
            break;
        }
    }
    if lines.len() < HEADER_ROWS {
        return Err(ProtError::TruncatedHeader {
            expected: HEADER_ROWS,
            found: lines.len(),
        }
        .into());
    }
    Ok(lines)
}

fn parse_metadata(header: &[String], allele_width: usize) -> Result<Metadata, ProtError> {
    let locus_re =
        Regex::new(r"^(.+) Protein Sequence Alignments").expect("locus pattern is valid");
    let release_re =
        Regex::new(r"^IPD-IMGT/HLA Release: (\d+)\.(\d+)\.(\d+)").expect("release pattern is valid");
    let date_re = Regex::new(r"^Sequences Aligned: (.+)").expect("date pattern is valid");

    let locus = locus_re
        .captures(&header[LOCUS_LINE])
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ProtError::NotAnAlignment(header[LOCUS_LINE].clone()))?;

    let release = release_re
        .captures(&header[RELEASE_LINE])
        .and_then(|caps| {
            Some(Release(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            ))
        })
        .ok_or_else(|| ProtError::NotAnAlignment(header[RELEASE_LINE].clone()))?;

    // The date is non-fatal: a malformed line degrades to `None` and the
    // rest of the metadata stays usable.
    let date = match date_re.captures(&header[DATE_LINE]) {
        Some(caps) => match NaiveDate::parse_from_str(caps[1].trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(err) => {
                warn!("Failed to parse alignment date {:?}: {err}", &caps[1]);
                None
            }
        },
        None => {
            warn!(
                "Missing 'Sequences Aligned' line, got {:?}",
                header[DATE_LINE]
            );
            None
        }
    };

    let prot_start = protein_start(
        &header[RULER_LINE],
        &header[FIRST_DATA_LINE],
        allele_width,
    );

    Ok(Metadata {
        locus,
        release,
        date,
        prot_start,
    })
}

/// Counts the leader-peptide residues of the reference sequence.
///
/// The ruler line's visual width up to its terminator bounds the region
/// preceding the `1` label; the residue directly under the label is
/// position 1, so non-space characters strictly before that column are the
/// leader peptide.
fn protein_start(ruler: &str, first_row: &str, allele_width: usize) -> usize {
    let ruler_rest = strip_field(ruler, allele_width);
    let seq_rest = strip_field(first_row, allele_width);
    let bound = ruler_rest.len();
    seq_rest
        .bytes()
        .take(bound.saturating_sub(1))
        .filter(|&b| b != b' ')
        .count()
}

/// Drops the first `width` characters (the allele-name field) of a line.
fn strip_field(line: &str, width: usize) -> &str {
    line.char_indices()
        .nth(width)
        .map(|(i, _)| &line[i..])
        .unwrap_or("")
}

/// Splits a body row into its trimmed allele-name field and raw sequence
/// field, clamped to the configured widths.
fn split_fixed<'a>(line: &'a str, widths: &FieldWidths) -> (&'a str, &'a str) {
    let name_end = line
        .char_indices()
        .nth(widths.allele)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    let (name, rest) = line.split_at(name_end);
    let seq_end = rest
        .char_indices()
        .nth(widths.seq)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    (name.trim(), &rest[..seq_end])
}

fn resolve_selection(
    matrix: &AlignmentMatrix,
    selection: &PositionSelection,
) -> Result<Vec<i32>, ProtError> {
    match selection {
        PositionSelection::All => Ok(matrix.positions().to_vec()),
        PositionSelection::Range(start, end) => {
            if start > end {
                return Err(ProtError::InvalidRange(format!(
                    "start {start} is after end {end}"
                )));
            }
            // Position 0 never exists, the range simply skips it.
            Ok((*start..=*end).filter(|&p| p != 0).collect())
        }
        PositionSelection::Explicit(positions) => {
            if positions.is_empty() {
                return Err(ProtError::InvalidRange("empty position list".to_string()));
            }
            Ok(positions.clone())
        }
    }
}
