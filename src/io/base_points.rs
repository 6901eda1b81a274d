//! # Base Points
//!
//! Seed layouts are read from a line-oriented node/position text format (as written by common
//! graph-drawing tools for GEXF files). Only two kinds of lines matter, everything else is skipped:
//!
//! ```text
//! <node id="000012345" label="...">
//!   <viz:position x="-120.5" y="33.25" z="0.0"/>
//! ```
//!
//! An id line opens a node, the next coordinate line closes it. An id line without coordinates,
//! coordinates without a preceding id line, and unparsable numbers are counted as errors and the
//! affected node is skipped.

use std::{fs::File, io::BufRead, io::BufReader, path::Path, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use super::*;
use crate::node::*;

static ID_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<node id="([0-9]{9})""#).expect("id pattern is a valid regex")
});

static POSITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<viz:position x="([^"]*)" y="([^"]*)""#)
        .expect("position pattern is a valid regex")
});

/// Counters of reading one seed layout
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BasePointStats {
    /// Nodes with an id and a coordinate
    pub points: u64,
    /// Inconsistent or unparsable lines
    pub errors: u64,
}

/// Streams `(node, x, y)` triples of a seed layout into `handler`.
///
/// # Errors
/// Returns an error if reading fails or `handler` fails. Format problems are only counted.
pub fn try_read_base_points<R, F>(mut reader: R, mut handler: F) -> Result<BasePointStats>
where
    R: BufRead,
    F: FnMut(Node, f64, f64) -> Result<()>,
{
    let mut stats = BasePointStats::default();
    let mut pending: Option<Node> = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        if let Some(caps) = ID_LINE.captures(&line) {
            if let Some(node) = pending {
                debug!(node = %Key(node), "No coordinates found");
                stats.errors += 1;
            }
            pending = parse_key(&caps[1]);
        } else if let Some(caps) = POSITION_LINE.captures(&line) {
            let Some(node) = pending.take() else {
                debug!(line = line.trim(), "No id found for coordinates");
                stats.errors += 1;
                continue;
            };

            match (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
                (Ok(x), Ok(y)) => {
                    handler(node, x, y)?;
                    stats.points += 1;
                }
                _ => {
                    debug!(node = %Key(node), line = line.trim(), "Invalid coordinates");
                    stats.errors += 1;
                }
            }
        }
    }

    if let Some(node) = pending {
        debug!(node = %Key(node), "No coordinates found");
        stats.errors += 1;
    }

    Ok(stats)
}

/// Reads a seed layout from a file, see [`try_read_base_points`]
pub fn try_read_base_points_file<P, F>(path: P, handler: F) -> Result<BasePointStats>
where
    P: AsRef<Path>,
    F: FnMut(Node, f64, f64) -> Result<()>,
{
    let path = path.as_ref();
    let file = File::open(path).with_path(path)?;
    try_read_base_points(BufReader::with_capacity(READ_BUFFER_SIZE, file), handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(input: &str) -> (Vec<(Node, f64, f64)>, BasePointStats) {
        let mut points = Vec::new();
        let stats = try_read_base_points(Cursor::new(input), |u, x, y| {
            points.push((u, x, y));
            Ok(())
        })
        .unwrap();
        (points, stats)
    }

    #[test]
    fn read_nodes_with_positions() {
        let input = r#"<gexf>
  <nodes>
    <node id="000000005" label="five">
      <viz:size value="3.0"/>
      <viz:position x="-1.5" y="2.25" z="0.0"/>
    </node>
    <node id="000000007">
      <viz:position x="100" y="-4e2"/>
    </node>
  </nodes>
</gexf>
"#;
        let (points, stats) = read(input);
        assert_eq!(points, vec![(5, -1.5, 2.25), (7, 100.0, -400.0)]);
        assert_eq!(stats, BasePointStats { points: 2, errors: 0 });
    }

    #[test]
    fn inconsistent_lines_are_counted() {
        let input = r#"<viz:position x="1" y="1"/>
<node id="000000001">
<node id="000000002">
<viz:position x="abc" y="1"/>
<node id="000000003">
<viz:position x="3" y="4"/>
<node id="12345">
<viz:position x="5" y="6"/>
<node id="000000004">
"#;
        let (points, stats) = read(input);
        // 1: position without id, 2: node 1 without position, 3: invalid x of node 2,
        // 4: position after invalid key, 5: node 4 at end of input
        assert_eq!(points, vec![(3, 3.0, 4.0)]);
        assert_eq!(stats, BasePointStats { points: 1, errors: 5 });
    }
}
