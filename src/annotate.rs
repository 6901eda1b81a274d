/*!
# Annotate

Joins a finished layout with the titles and years of its records.

Titles of all records are collected into a single [`CompactStringStore`] and years into a dense
`u16` array, so that annotating a layout with `10^8` nodes needs no per-node allocation. The
annotated output is a header-less CSV with rows `id,x,y,year,title` in the order of the layout;
nodes without a record get empty `year` and `title` fields.
*/

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use tracing::{debug, info};

use crate::{
    error::{IoContext, Result},
    io::{RecordSource, RecordStats, try_read_layout},
    node::*,
    utils::string_store::CompactStringStore,
};

/// Titles and years of all records, indexed by node
#[derive(Debug)]
pub struct RecordIndex {
    titles: CompactStringStore,
    years: Vec<u16>,
}

impl RecordIndex {
    /// Streams all records of `source` into a new index for nodes `0..capacity`.
    ///
    /// Records of nodes outside the capacity are counted as malformed. If a node has more than
    /// one record, the last one wins.
    pub fn try_build<T: RecordSource + ?Sized>(
        source: &T,
        capacity: NumNodes,
    ) -> Result<(Self, RecordStats)> {
        let mut titles = CompactStringStore::new(capacity);
        let mut years = vec![0; capacity as usize];
        let mut outside = 0;

        let mut stats = source.try_for_each_record(|record| {
            let u = record.id();
            if u >= capacity {
                debug!(node = record.key(), "Record outside capacity");
                outside += 1;
                return Ok(());
            }
            titles.put(u, record.title());
            years[u as usize] = record.year();
            Ok(())
        })?;
        titles.freeze();

        stats.valid -= outside;
        stats.malformed += outside;
        info!(
            titles = titles.len(),
            chunks = titles.number_of_chunks(),
            malformed = stats.malformed,
            "Indexed records"
        );

        Ok((Self { titles, years }, stats))
    }

    /// Number of nodes with a record
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Returns *true* if no record was indexed
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Title of `u` if it has a record
    pub fn title(&self, u: Node) -> Option<&str> {
        self.titles.get(u)
    }

    /// Publication year of `u` if it has a record
    pub fn year(&self, u: Node) -> Option<u16> {
        self.title(u).map(|_| self.years[u as usize])
    }
}

/// Counters of one annotation run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateStats {
    /// Rows written
    pub rows: u64,
    /// Rows of nodes without a record
    pub unknown: u64,
    /// Malformed layout rows
    pub malformed: u64,
}

/// Writes one annotated row per layout row of `layout` into `output`
pub fn try_annotate<R: Read, W: Write>(
    index: &RecordIndex,
    layout: R,
    output: W,
) -> Result<AnnotateStats> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    let mut stats = AnnotateStats::default();
    let layout_stats = try_read_layout(layout, |u, position| {
        let key = Key(u).to_string();
        let (x, y) = (position.x.to_string(), position.y.to_string());

        match (index.year(u), index.title(u)) {
            (Some(year), Some(title)) => {
                let year = format!("{year:04}");
                writer.write_record([key.as_str(), x.as_str(), y.as_str(), year.as_str(), title])?;
            }
            _ => {
                writer.write_record([key.as_str(), x.as_str(), y.as_str(), "", ""])?;
                stats.unknown += 1;
            }
        }
        stats.rows += 1;
        Ok(())
    })?;
    writer.flush()?;

    stats.malformed = layout_stats.malformed;
    info!(
        rows = stats.rows,
        unknown = stats.unknown,
        malformed = stats.malformed,
        "Annotated layout"
    );
    Ok(stats)
}

/// Annotates the layout file at `layout` into a new file at `output`, see [`try_annotate`]
pub fn try_annotate_file<P: AsRef<Path>, Q: AsRef<Path>>(
    index: &RecordIndex,
    layout: P,
    output: Q,
) -> Result<AnnotateStats> {
    let (layout, output) = (layout.as_ref(), output.as_ref());
    let input = File::open(layout).with_path(layout)?;
    let file = File::create(output).with_path(output)?;
    try_annotate(index, input, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record_line;
    use std::io::Cursor;

    fn index() -> RecordIndex {
        let records = vec![
            record_line("000000001", "1999", "Graphene, revisited", "", ""),
            record_line("000000002", "2005", "Second \"quoted\" title", "000000001", ""),
            record_line("000000099", "2010", "Outside", "", ""),
            "not a record".to_string(),
        ];
        let (index, stats) = RecordIndex::try_build(&records, 10).unwrap();
        assert_eq!(stats, RecordStats { valid: 2, malformed: 2 });
        index
    }

    #[test]
    fn index_records() {
        let index = index();
        assert_eq!(index.len(), 2);
        assert_eq!(index.title(1), Some("Graphene, revisited"));
        assert_eq!(index.year(2), Some(2005));
        assert_eq!(index.title(3), None);
        assert_eq!(index.year(3), None);
        assert_eq!(index.title(99), None);
    }

    #[test]
    fn annotate_layout() {
        let index = index();
        let layout = "000000002,10.5,-3\n000000003,1,1\nbroken\n000000001,7,8\n";

        let mut output = Vec::new();
        let stats = try_annotate(&index, Cursor::new(layout), &mut output).unwrap();
        assert_eq!(
            stats,
            AnnotateStats {
                rows: 3,
                unknown: 1,
                malformed: 1
            }
        );

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "000000002,10.5,-3,2005,\"Second \"\"quoted\"\" title\"\n\
             000000003,1,1,,\n\
             000000001,7,8,1999,\"Graphene, revisited\"\n"
        );
    }
}
