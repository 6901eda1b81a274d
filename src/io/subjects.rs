//! # Subjects
//!
//! Nodes can be coloured by a coarse **category** derived from their subject codes.
//!
//! Two inputs are involved:
//! - a **subject map** CSV with a header row, mapping a two-letter subject code (column `0`) to a
//!   category digit (first character of column `5`), and
//! - a **subject file** with lines `<id>;<codes>` where `<codes>` is a run of upper-case letters
//!   read as consecutive two-letter subject codes.
//!
//! The main category of a node is the category with the strictly highest number of codes. Ties
//! between the top categories leave the node unclassified, see [`main_category`].

use std::{fs::File, io::BufReader, path::Path};

use fxhash::FxHashMap;
use tracing::debug;

use super::*;
use crate::node::*;

/// A node category, `0` is unclassified
pub type Category = u8;

/// Category of nodes without a unique main subject
pub const UNCLASSIFIED: Category = 0;

/// Number of categories including [`UNCLASSIFIED`]
pub const NUMBER_OF_CATEGORIES: usize = 7;

const CODE_COLUMN: usize = 0;
const CATEGORY_COLUMN: usize = 5;
const CODE_LENGTH: usize = 2;

/// Maps two-letter subject codes to categories
#[derive(Debug, Clone, Default)]
pub struct SubjectMap(FxHashMap<String, Category>);

impl SubjectMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `category` to `code`
    pub fn insert<S: Into<String>>(&mut self, code: S, category: Category) {
        debug_assert!((category as usize) < NUMBER_OF_CATEGORIES);
        self.0.insert(code.into(), category);
    }

    /// Category of `code` if known
    pub fn get(&self, code: &str) -> Option<Category> {
        self.0.get(code).copied()
    }

    /// Number of known codes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns *true* if no code is known
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads a subject map CSV (the first row is a header and skipped).
///
/// Rows without a code or without a valid category digit in column `5` are skipped.
pub fn try_read_subject_map<R: std::io::Read>(reader: R) -> Result<SubjectMap> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut map = SubjectMap::new();
    for record in csv_reader.records() {
        let record = record?;

        let code = record.get(CODE_COLUMN).unwrap_or_default();
        let category = record
            .get(CATEGORY_COLUMN)
            .and_then(|c| c.chars().next())
            .and_then(|c| c.to_digit(10))
            .filter(|&c| (c as usize) < NUMBER_OF_CATEGORIES);

        match category {
            Some(category) if !code.is_empty() => map.insert(code, category as Category),
            _ => debug!(row = ?record, "Skipping invalid subject map row"),
        }
    }

    Ok(map)
}

/// Reads a subject map CSV from a file, see [`try_read_subject_map`]
pub fn try_read_subject_map_file<P: AsRef<Path>>(path: P) -> Result<SubjectMap> {
    let path = path.as_ref();
    let file = File::open(path).with_path(path)?;
    try_read_subject_map(BufReader::with_capacity(READ_BUFFER_SIZE, file))
}

/// Picks the main category from per-category code counts.
///
/// Scanning categories `1..=6` in order, a strictly larger count takes over while an equal count
/// resets the result to [`UNCLASSIFIED`] (keeping the count). Hence equal top counts yield
/// [`UNCLASSIFIED`], as does a node without any known code.
///
/// # Examples
/// ```
/// use citemap::io::*;
///
/// assert_eq!(main_category(&[0, 3, 1, 0, 0, 0, 0]), 1);
/// assert_eq!(main_category(&[0, 2, 0, 2, 0, 0, 0]), UNCLASSIFIED);
/// assert_eq!(main_category(&[0, 2, 2, 3, 0, 0, 0]), 3);
/// ```
pub fn main_category(counts: &[u32; NUMBER_OF_CATEGORIES]) -> Category {
    let mut main = UNCLASSIFIED;
    let mut main_count = 0;
    for (category, &count) in counts.iter().enumerate().skip(1) {
        if count > main_count {
            main_count = count;
            main = category as Category;
        } else if count == main_count {
            main = UNCLASSIFIED;
        }
    }
    main
}

/// Marks nodes without any assignment; reads as [`UNCLASSIFIED`]
const UNASSIGNED: Category = Category::MAX;

/// Dense per-node categories
#[derive(Debug, Clone)]
pub struct Categories {
    values: Vec<Category>,
    totals: [u64; NUMBER_OF_CATEGORIES],
}

impl Categories {
    /// Creates categories for nodes `0..capacity`, all unclassified
    pub fn new(capacity: NumNodes) -> Self {
        Self {
            values: vec![UNASSIGNED; capacity as usize],
            totals: [0; NUMBER_OF_CATEGORIES],
        }
    }

    /// Number of nodes covered
    pub fn capacity(&self) -> NumNodes {
        self.values.len() as NumNodes
    }

    /// Category of `u` ([`UNCLASSIFIED`] if out of range)
    #[inline(always)]
    pub fn get(&self, u: Node) -> Category {
        match self.values.get(u as usize) {
            Some(&category) if category != UNASSIGNED => category,
            _ => UNCLASSIFIED,
        }
    }

    /// Assigns a category to `u`, replacing an earlier assignment
    pub fn set(&mut self, u: Node, category: Category) {
        let previous = std::mem::replace(&mut self.values[u as usize], category);
        if previous != UNASSIGNED {
            self.totals[previous as usize] -= 1;
        }
        self.totals[category as usize] += 1;
    }

    /// Number of assigned nodes per category
    pub fn totals(&self) -> &[u64; NUMBER_OF_CATEGORIES] {
        &self.totals
    }
}

/// Reads a subject file and assigns each listed node its [`main_category`].
///
/// Lines not matching `<digits>;<UPPER-CASE letters>` and ids outside `categories` are skipped.
pub fn try_read_categories<R: BufRead>(
    mut reader: R,
    subjects: &SubjectMap,
    categories: &mut Categories,
) -> Result<u64> {
    let mut skipped = 0;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        let Some((node, codes)) = parse_subject_line(line.trim_end_matches(['\n', '\r'])) else {
            skipped += 1;
            continue;
        };
        if node >= categories.capacity() {
            debug!(node, "Subject line for node outside capacity");
            skipped += 1;
            continue;
        }

        let mut counts = [0u32; NUMBER_OF_CATEGORIES];
        for code in codes.as_bytes().chunks_exact(CODE_LENGTH) {
            // `codes` is ASCII, so every chunk is valid UTF-8
            let code = std::str::from_utf8(code).unwrap_or_default();
            if let Some(category) = subjects.get(code) {
                counts[category as usize] += 1;
            }
        }
        categories.set(node, main_category(&counts));
    }

    Ok(skipped)
}

/// Reads a subject file from disk, see [`try_read_categories`]
pub fn try_read_categories_file<P: AsRef<Path>>(
    path: P,
    subjects: &SubjectMap,
    categories: &mut Categories,
) -> Result<u64> {
    let path = path.as_ref();
    let file = File::open(path).with_path(path)?;
    try_read_categories(
        BufReader::with_capacity(READ_BUFFER_SIZE, file),
        subjects,
        categories,
    )
}

fn parse_subject_line(line: &str) -> Option<(Node, &str)> {
    let (id, codes) = line.split_once(';')?;
    if id.is_empty()
        || codes.is_empty()
        || !id.bytes().all(|b| b.is_ascii_digit())
        || !codes.bytes().all(|b| b.is_ascii_uppercase())
    {
        return None;
    }
    Some((id.parse().ok()?, codes))
}
