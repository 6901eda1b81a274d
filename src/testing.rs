//! Helpers shared by unit tests.

/// Builds a record line with the given id, year, title, reference blob and citation blob.
/// All other fields are filled with plausible values.
pub(crate) fn record_line(id: &str, year: &str, title: &str, refs: &str, cits: &str) -> String {
    format!("{id};{year};J;;PH;JOURNAL;1;2;3;{title};1;AUTHOR;0;;{refs};{cits}")
}
