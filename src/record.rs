/*!
# Citation Records

A citation record is a single semicolon-delimited line with at least 15 fields:

| field            | content                                            |
|------------------|----------------------------------------------------|
| `0`              | node key (exactly 9 digits)                        |
| `1`              | publication year (exactly 4 digits)                |
| `9`              | title (non-empty)                                  |
| second-to-last   | references: concatenated 9-digit keys, no separator |
| last             | citations: concatenated 9-digit keys, no separator  |

All other fields (document type, doi, subject, journal, authors, ...) are ignored here.

Parsing never allocates: [`CitationRecord`] borrows all fields from the line and the reference and
citation blobs are decoded lazily, 9 characters at a time, by [`NodeKeys`].

# Examples
```
use citemap::record::*;
use itertools::Itertools;

let line = "000000007;1999;J;;PH;;1;2;3;A title;1;X;0;;000000001000000002;000000003";
let record = CitationRecord::parse(line).unwrap();

assert_eq!(record.id(), 7);
assert_eq!(record.year(), 1999);
assert_eq!(record.title(), "A title");
assert_eq!(record.neighbors().collect_vec(), vec![1, 2, 3]);
```
*/

use std::{iter::Chain, slice::ChunksExact};

use thiserror::Error;

use crate::node::*;

/// Minimum number of `;`-separated fields in a record
pub const MIN_FIELDS: usize = 15;

/// Field delimiter
pub const DELIMITER: char = ';';

const ID_FIELD: usize = 0;
const YEAR_FIELD: usize = 1;
const TITLE_FIELD: usize = 9;
const YEAR_DIGITS: usize = 4;

/// Reasons a record is rejected.
///
/// Only the first failing field is reported, parsing stops there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected at least 15 fields, found {0}")]
    TooFewFields(usize),
    #[error("id is not a 9-digit key")]
    InvalidId,
    #[error("year is not a 4-digit number")]
    InvalidYear,
    #[error("empty title")]
    EmptyTitle,
    #[error("references are not a sequence of 9-digit keys")]
    InvalidReferences,
    #[error("citations are not a sequence of 9-digit keys")]
    InvalidCitations,
}

/// Returns `Err(error)` early when a field does not validate
macro_rules! ensure_field {
    ($cond : expr, $error : expr) => {
        if !($cond) {
            return Err($error);
        }
    };
}

/// A validated citation record borrowing from its input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationRecord<'a> {
    id: Node,
    key: &'a str,
    year: &'a str,
    title: &'a str,
    references: &'a str,
    citations: &'a str,
}

impl<'a> CitationRecord<'a> {
    /// Parses and validates a single line (a trailing line break is ignored).
    ///
    /// # Errors
    /// Returns the [`RecordError`] of the first field that fails validation. An invalid record
    /// yields no data at all.
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(['\n', '\r']);

        let mut number_of_fields = 0;
        let (mut key, mut year, mut title) = ("", "", "");
        let (mut second_to_last, mut last) = ("", "");

        for (index, field) in line.split(DELIMITER).enumerate() {
            match index {
                ID_FIELD => key = field,
                YEAR_FIELD => year = field,
                TITLE_FIELD => title = field,
                _ => {}
            }
            second_to_last = last;
            last = field;
            number_of_fields += 1;
        }

        ensure_field!(
            number_of_fields >= MIN_FIELDS,
            RecordError::TooFewFields(number_of_fields)
        );

        let id = parse_key(key).ok_or(RecordError::InvalidId)?;
        ensure_field!(
            year.len() == YEAR_DIGITS && year.bytes().all(|b| b.is_ascii_digit()),
            RecordError::InvalidYear
        );
        ensure_field!(!title.is_empty(), RecordError::EmptyTitle);
        ensure_field!(is_key_blob(second_to_last), RecordError::InvalidReferences);
        ensure_field!(is_key_blob(last), RecordError::InvalidCitations);

        Ok(Self {
            id,
            key,
            year,
            title,
            references: second_to_last,
            citations: last,
        })
    }

    /// Node of this record
    #[inline(always)]
    pub fn id(&self) -> Node {
        self.id
    }

    /// Raw 9-digit key of this record
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// Publication year
    pub fn year(&self) -> u16 {
        // Validated to be exactly 4 digits
        self.year
            .bytes()
            .fold(0, |acc, d| acc * 10 + (d - b'0') as u16)
    }

    /// Raw year field
    pub fn year_str(&self) -> &'a str {
        self.year
    }

    /// Title of the publication
    pub fn title(&self) -> &'a str {
        self.title
    }

    /// Raw reference blob (concatenated 9-digit keys)
    pub fn reference_blob(&self) -> &'a str {
        self.references
    }

    /// Raw citation blob (concatenated 9-digit keys)
    pub fn citation_blob(&self) -> &'a str {
        self.citations
    }

    /// Number of referenced publications
    pub fn number_of_references(&self) -> usize {
        self.references.len() / KEY_DIGITS
    }

    /// Number of citing publications
    pub fn number_of_citations(&self) -> usize {
        self.citations.len() / KEY_DIGITS
    }

    /// Iterates over all referenced nodes
    pub fn references(&self) -> NodeKeys<'a> {
        NodeKeys::new(self.references)
    }

    /// Iterates over all citing nodes
    pub fn citations(&self) -> NodeKeys<'a> {
        NodeKeys::new(self.citations)
    }

    /// Iterates over references followed by citations.
    ///
    /// A node can appear more than once if it is both referenced and citing.
    pub fn neighbors(&self) -> Chain<NodeKeys<'a>, NodeKeys<'a>> {
        self.references().chain(self.citations())
    }
}

/// Returns *true* if `blob` is a (possibly empty) sequence of 9-digit keys
fn is_key_blob(blob: &str) -> bool {
    blob.len() % KEY_DIGITS == 0 && blob.bytes().all(|b| b.is_ascii_digit())
}

/// Lazily decodes a validated blob of concatenated 9-digit keys
#[derive(Debug, Clone)]
pub struct NodeKeys<'a>(ChunksExact<'a, u8>);

impl<'a> NodeKeys<'a> {
    fn new(blob: &'a str) -> Self {
        Self(blob.as_bytes().chunks_exact(KEY_DIGITS))
    }
}

impl Iterator for NodeKeys<'_> {
    type Item = Node;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(decode_key_digits)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for NodeKeys<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record_line;
    use itertools::Itertools;

    #[test]
    fn parse_valid_record() {
        let line = record_line("000000042", "2003", "Quantum dots", "000000001000000002", "");
        let record = CitationRecord::parse(&line).unwrap();

        assert_eq!(record.id(), 42);
        assert_eq!(record.key(), "000000042");
        assert_eq!(record.year(), 2003);
        assert_eq!(record.title(), "Quantum dots");
        assert_eq!(record.number_of_references(), 2);
        assert_eq!(record.number_of_citations(), 0);
        assert_eq!(record.references().collect_vec(), vec![1, 2]);
        assert_eq!(record.citations().count(), 0);
    }

    #[test]
    fn trailing_line_break_is_ignored() {
        let line = record_line("000000042", "2003", "T", "", "000000005") + "\r\n";
        let record = CitationRecord::parse(&line).unwrap();
        assert_eq!(record.citations().collect_vec(), vec![5]);
    }

    #[test]
    fn neighbors_keep_order_and_duplicates() {
        let line = record_line("000000001", "1990", "T", "000000003000000002", "000000003");
        let record = CitationRecord::parse(&line).unwrap();
        assert_eq!(record.neighbors().collect_vec(), vec![3, 2, 3]);
        assert_eq!(record.references().len(), 2);
    }

    #[test]
    fn reject_invalid_fields() {
        let cases = [
            (
                record_line("00000004", "2003", "T", "", ""),
                RecordError::InvalidId,
            ),
            (
                record_line("0000000042", "2003", "T", "", ""),
                RecordError::InvalidId,
            ),
            (
                record_line("00000004a", "2003", "T", "", ""),
                RecordError::InvalidId,
            ),
            (
                record_line("000000042", "203", "T", "", ""),
                RecordError::InvalidYear,
            ),
            (
                record_line("000000042", "2003", "", "", ""),
                RecordError::EmptyTitle,
            ),
            (
                record_line("000000042", "2003", "T", "00000000100", ""),
                RecordError::InvalidReferences,
            ),
            (
                record_line("000000042", "2003", "T", "", "0000000010"),
                RecordError::InvalidCitations,
            ),
            (
                record_line("000000042", "2003", "T", "", "00000000x"),
                RecordError::InvalidCitations,
            ),
        ];

        for (line, error) in cases {
            assert_eq!(CitationRecord::parse(&line), Err(error), "{line}");
        }
    }

    #[test]
    fn reject_short_lines() {
        assert_eq!(
            CitationRecord::parse("000000042;2003;T"),
            Err(RecordError::TooFewFields(3))
        );
        assert_eq!(
            CitationRecord::parse(""),
            Err(RecordError::TooFewFields(1))
        );
    }

    #[test]
    fn first_error_wins() {
        // invalid id and invalid year: id is checked first
        let line = record_line("x", "x", "", "1", "1");
        assert_eq!(CitationRecord::parse(&line), Err(RecordError::InvalidId));
    }

    #[test]
    fn extra_author_fields_shift_blobs() {
        // blobs are always the last two fields, regardless of the number of authors
        let line = "000000042;2003;J;;;;;;;T;3;A;B;C;0;;;000000001;000000002";
        let record = CitationRecord::parse(line).unwrap();
        assert_eq!(record.neighbors().collect_vec(), vec![1, 2]);
    }
}
