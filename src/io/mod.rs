/*!
# IO

Streaming readers and writers for everything that enters or leaves a run.

## Inputs
- **Citation records**: directories of `*.txt` files with one [`CitationRecord`] per line,
  abstracted by the [`RecordSource`] trait so that every pass can re-stream all records without
  holding them in memory.
- **Seed layouts**: a line-oriented node/position text format (see [`base_points`]).
- **Layouts**: the `id,x,y` CSV written by the layout engine (see [`layout_csv`]).
- **Subjects**: per-node subject codes used to colour nodes (see [`subjects`]).

## Outputs
- The streamed `id,x,y` layout CSV ([`LayoutCsvWriter`]).
- Images are written by [`render`](crate::render).

All readers buffer with [`READ_BUFFER_SIZE`] bytes and reuse a single line buffer.
*/

pub mod base_points;
pub mod layout_csv;
pub mod subjects;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::WalkDir;

use crate::{
    error::{IoContext, Result},
    record::*,
};

pub use base_points::*;
pub use layout_csv::*;
pub use subjects::*;

/// Buffer size of all line readers
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default extension of record files
pub const RECORD_FILE_EXTENSION: &str = "txt";

/// Counters of one complete pass over a [`RecordSource`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    /// Records handed to the visitor
    pub valid: u64,
    /// Lines that failed to parse (including lines that are not UTF-8)
    pub malformed: u64,
}

impl std::ops::AddAssign for RecordStats {
    fn add_assign(&mut self, rhs: Self) {
        self.valid += rhs.valid;
        self.malformed += rhs.malformed;
    }
}

/// Anything that can stream all citation records, possibly many times.
///
/// Malformed records are skipped and counted, they never end the stream.
pub trait RecordSource {
    /// Calls `visitor` on every valid record in a deterministic order.
    ///
    /// # Errors
    /// Returns the first I/O error of the underlying input or the first error of `visitor`.
    fn try_for_each_record<F>(&self, visitor: F) -> Result<RecordStats>
    where
        F: FnMut(&CitationRecord<'_>) -> Result<()>;
}

/// A directory tree of record files.
///
/// Files are discovered recursively (following symbolic links) and visited in file-name order.
#[derive(Debug, Clone)]
pub struct RecordDirectory {
    root: PathBuf,
    extension: String,
}

impl RecordDirectory {
    /// Creates a source over all `*.txt` files below `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            extension: RECORD_FILE_EXTENSION.to_string(),
        }
    }

    /// Updates the extension of record files
    pub fn extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory of this source
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists all record files below the root
    ///
    /// # Errors
    /// Returns an error if the root does not exist or cannot be traversed.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy() == self.extension)
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl RecordSource for RecordDirectory {
    fn try_for_each_record<F>(&self, mut visitor: F) -> Result<RecordStats>
    where
        F: FnMut(&CitationRecord<'_>) -> Result<()>,
    {
        let mut stats = RecordStats::default();
        let mut buffer = Vec::new();

        for path in self.files()? {
            debug!(path = %path.display(), "Reading record file");
            let file = File::open(&path).with_path(&path)?;
            let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

            let file_stats = visit_record_lines(reader, &mut buffer, &mut visitor)
                .map_err(|err| match err {
                    crate::Error::Stream(source) => crate::Error::Io {
                        path: path.clone(),
                        source,
                    },
                    other => other,
                })?;

            debug!(
                path = %path.display(),
                malformed = file_stats.malformed,
                "Finished record file"
            );
            stats += file_stats;
        }

        Ok(stats)
    }
}

/// In-memory lines, mostly useful for tests and small inputs
impl<S: AsRef<str>> RecordSource for [S] {
    fn try_for_each_record<F>(&self, mut visitor: F) -> Result<RecordStats>
    where
        F: FnMut(&CitationRecord<'_>) -> Result<()>,
    {
        let mut stats = RecordStats::default();
        for line in self {
            visit_line(line.as_ref(), &mut visitor, &mut stats)?;
        }
        Ok(stats)
    }
}

impl<S: AsRef<str>> RecordSource for Vec<S> {
    fn try_for_each_record<F>(&self, visitor: F) -> Result<RecordStats>
    where
        F: FnMut(&CitationRecord<'_>) -> Result<()>,
    {
        self.as_slice().try_for_each_record(visitor)
    }
}

/// Streams all lines of `reader` through `visitor`, reusing `buffer` for every line
pub fn visit_record_lines<R, F>(
    mut reader: R,
    buffer: &mut Vec<u8>,
    visitor: &mut F,
) -> Result<RecordStats>
where
    R: BufRead,
    F: FnMut(&CitationRecord<'_>) -> Result<()>,
{
    let mut stats = RecordStats::default();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', buffer)? == 0 {
            break;
        }

        match std::str::from_utf8(buffer.as_slice()) {
            Ok(line) => visit_line(line, visitor, &mut stats)?,
            Err(_) => {
                debug!("Skipping record line that is not valid UTF-8");
                stats.malformed += 1;
            }
        }
    }
    Ok(stats)
}

fn visit_line<F>(line: &str, visitor: &mut F, stats: &mut RecordStats) -> Result<()>
where
    F: FnMut(&CitationRecord<'_>) -> Result<()>,
{
    match CitationRecord::parse(line) {
        Ok(record) => {
            stats.valid += 1;
            visitor(&record)
        }
        Err(error) => {
            debug!(%error, line = line.trim_end(), "Skipping malformed record");
            stats.malformed += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record_line;
    use std::{fs, io::Cursor};

    #[test]
    fn visit_lines_counts_malformed() {
        let input = format!(
            "{}\nnot a record\n{}\n;;;\n",
            record_line("000000001", "2000", "A", "", ""),
            record_line("000000002", "2001", "B", "000000001", ""),
        );

        let mut ids = Vec::new();
        let mut visitor = |r: &CitationRecord<'_>| {
            ids.push(r.id());
            Ok(())
        };
        let stats =
            visit_record_lines(Cursor::new(input.into_bytes()), &mut Vec::new(), &mut visitor)
                .unwrap();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(stats.valid, 2);
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let mut bytes = record_line("000000001", "2000", "A", "", "").into_bytes();
        bytes.extend_from_slice(b"\n000000002;\xc3\x28\n");

        let mut visitor = |_: &CitationRecord<'_>| Ok(());
        let stats = visit_record_lines(Cursor::new(bytes), &mut Vec::new(), &mut visitor).unwrap();
        assert_eq!(stats, RecordStats { valid: 1, malformed: 1 });
    }

    #[test]
    fn directory_is_walked_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(
            dir.path().join("b").join("part.txt"),
            record_line("000000003", "2003", "C", "", "") + "\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.txt"),
            record_line("000000001", "2001", "A", "", "") + "\n" + "garbage\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ignored.csv"),
            record_line("000000002", "2002", "B", "", "") + "\n",
        )
        .unwrap();

        let source = RecordDirectory::new(dir.path());
        assert_eq!(source.files().unwrap().len(), 2);

        let mut ids = Vec::new();
        let stats = source
            .try_for_each_record(|r| {
                ids.push(r.id());
                Ok(())
            })
            .unwrap();

        assert_eq!(ids, vec![1, 3]);
        assert_eq!(stats, RecordStats { valid: 2, malformed: 1 });
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordDirectory::new(dir.path().join("does-not-exist"));
        assert!(source.try_for_each_record(|_| Ok(())).is_err());
    }
}
