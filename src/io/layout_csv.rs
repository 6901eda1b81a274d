//! # Layout CSV
//!
//! A layout is a header-less CSV with one `id,x,y` row per placed node, where `id` is the
//! zero-padded 9-digit key. The layout engine streams rows as soon as a node is placed, so a
//! truncated file is still a valid partial layout that can be replayed into a new run.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::debug;

use super::*;
use crate::{layout::PlacementSink, node::*};

/// Streams placements as `id,x,y` rows
#[derive(Debug)]
pub struct LayoutCsvWriter<W: Write> {
    writer: W,
    rows: u64,
}

impl LayoutCsvWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`
    pub fn try_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).with_path(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> LayoutCsvWriter<W> {
    /// Wraps an existing writer
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    /// Number of rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Writes a single row
    pub fn write_row(&mut self, node: Node, position: Position) -> Result<()> {
        writeln!(self.writer, "{},{},{}", Key(node), position.x, position.y)?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes and returns the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> PlacementSink for LayoutCsvWriter<W> {
    fn place(&mut self, node: Node, position: Position) -> Result<()> {
        self.write_row(node, position)
    }
}

/// Counters of reading one layout
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LayoutReadStats {
    /// Rows handed to the handler
    pub rows: u64,
    /// Rows with the wrong number of fields, an invalid id or invalid coordinates
    pub malformed: u64,
}

/// Streams all rows of a layout CSV into `handler`.
///
/// Ids may be zero-padded keys or plain integers. Rows at the unplaced sentinel `(0, 0)` and rows
/// with infinite or NaN coordinates are treated as malformed.
///
/// # Errors
/// Returns an error if reading fails or `handler` fails.
pub fn try_read_layout<R, F>(reader: R, mut handler: F) -> Result<LayoutReadStats>
where
    R: std::io::Read,
    F: FnMut(Node, Position) -> Result<()>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .buffer_capacity(READ_BUFFER_SIZE)
        .from_reader(reader);

    let mut stats = LayoutReadStats::default();
    let mut record = csv::StringRecord::new();

    while csv_reader.read_record(&mut record)? {
        match parse_layout_row(&record) {
            Some((node, position)) => {
                handler(node, position)?;
                stats.rows += 1;
            }
            None => {
                debug!(row = ?record, "Skipping malformed layout row");
                stats.malformed += 1;
            }
        }
    }

    Ok(stats)
}

/// Reads a layout from a file, see [`try_read_layout`]
pub fn try_read_layout_file<P, F>(path: P, handler: F) -> Result<LayoutReadStats>
where
    P: AsRef<Path>,
    F: FnMut(Node, Position) -> Result<()>,
{
    let path = path.as_ref();
    let file = File::open(path).with_path(path)?;
    try_read_layout(file, handler)
}

/// Loads a layout into a dense array of `capacity` positions.
///
/// Rows of nodes outside the capacity are counted as malformed. If a node occurs more than once,
/// its first row wins.
pub fn try_load_layout<R: std::io::Read>(
    reader: R,
    capacity: NumNodes,
) -> Result<(Vec<Position>, LayoutReadStats)> {
    let mut positions = vec![Position::UNPLACED; capacity as usize];
    let mut outside = 0;

    let mut stats = try_read_layout(reader, |u, position| {
        match positions.get_mut(u as usize) {
            Some(slot) if !slot.is_placed() => *slot = position,
            Some(_) => debug!(node = %Key(u), "Duplicate layout row"),
            None => outside += 1,
        }
        Ok(())
    })?;

    stats.rows -= outside;
    stats.malformed += outside;
    Ok((positions, stats))
}

/// Loads a layout from a file, see [`try_load_layout`]
pub fn try_load_layout_file<P: AsRef<Path>>(
    path: P,
    capacity: NumNodes,
) -> Result<(Vec<Position>, LayoutReadStats)> {
    let path = path.as_ref();
    let file = File::open(path).with_path(path)?;
    try_load_layout(file, capacity)
}

fn parse_layout_row(record: &csv::StringRecord) -> Option<(Node, Position)> {
    if record.len() != 3 {
        return None;
    }

    let node = record[0].trim().parse::<Node>().ok()?;
    let x = record[1].trim().parse::<f32>().ok().filter(|x| x.is_finite())?;
    let y = record[2].trim().parse::<f32>().ok().filter(|y| y.is_finite())?;

    let position = Position::new(x, y);
    position.is_placed().then_some((node, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rows_are_zero_padded() {
        let mut writer = LayoutCsvWriter::new(Vec::new());
        writer.write_row(42, Position::new(10005.5, 10000.0)).unwrap();
        writer.place(7, Position::new(-1.25, 3.0)).unwrap();
        assert_eq!(writer.rows(), 2);

        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(output, "000000042,10005.5,10000\n000000007,-1.25,3\n");
    }

    #[test]
    fn read_written_rows() {
        let input = "000000042,10005.5,10000\n7,-1.25,3\n";

        let mut rows = Vec::new();
        let stats = try_read_layout(Cursor::new(input), |u, p| {
            rows.push((u, p));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            rows,
            vec![
                (42, Position::new(10005.5, 10000.0)),
                (7, Position::new(-1.25, 3.0))
            ]
        );
        assert_eq!(stats, LayoutReadStats { rows: 2, malformed: 0 });
    }

    #[test]
    fn malformed_rows_are_counted() {
        let input = "1,2\nx,1,1\n3,a,1\n4,0,0\n5,1,1,1\n6,1.5,2.5\n7,inf,1\n8,1,NaN\n9,1e39,1\n";

        let mut rows = Vec::new();
        let stats = try_read_layout(Cursor::new(input), |u, _| {
            rows.push(u);
            Ok(())
        })
        .unwrap();

        assert_eq!(rows, vec![6]);
        assert_eq!(stats, LayoutReadStats { rows: 1, malformed: 8 });
    }

    #[test]
    fn load_dense_positions() {
        let input = "1,1,1\n3,3,3\n1,9,9\n12,2,2\n";
        let (positions, stats) = try_load_layout(Cursor::new(input), 4).unwrap();

        assert_eq!(
            positions,
            vec![
                Position::UNPLACED,
                Position::new(1.0, 1.0),
                Position::UNPLACED,
                Position::new(3.0, 3.0)
            ]
        );
        assert_eq!(stats, LayoutReadStats { rows: 3, malformed: 1 });
    }
}
