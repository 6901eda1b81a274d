/*!
# Layout

Computes 2-D positions for all nodes of a citation graph by repeatedly placing unplaced nodes at
the centroid of their already placed neighbors.

1. **Seeding**: positions of an existing sub-layout are loaded via
   [`LayoutEngine::seed_position`] (which adds the configured offset) or
   [`LayoutEngine::resume_position`] (which keeps the position verbatim).
2. **Expansion passes**: for each threshold `t` of [`LayoutConfig::thresholds`], every unplaced
   node with at least `t` distinct placed neighbors is placed at their (refined) centroid plus
   Gaussian jitter. Each pass only sees the placements of previous passes.
3. **Final passes**: [`LayoutConfig::final_threshold`] is repeated until a pass places nothing.

Every placement (including seeds) is streamed into a [`PlacementSink`] the moment it happens, so
the output of an aborted run is a valid partial layout that can be resumed.

# Examples
```
use citemap::{layout::*, node::*};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

let records = vec![
    "000000003;2001;J;;PH;;1;2;3;Between;1;X;0;;000000001000000002;",
];

let config = LayoutConfig::default().capacity(10).noise(0.0);
let mut engine = LayoutEngine::new(config, Pcg64Mcg::seed_from_u64(0)).unwrap();

let mut output: Vec<(Node, Position)> = Vec::new();
engine.seed_position(1, 0.0, 0.0, &mut output).unwrap();
engine.seed_position(2, 10.0, 0.0, &mut output).unwrap();

let summary = engine.run(&records, &mut output).unwrap();
assert_eq!(summary.placed(), 1);
assert_eq!(engine.position(3), Position::new(10005.0, 10000.0));
assert_eq!(output.len(), 3);
```
*/

pub mod centroid;
pub mod positions;

pub use centroid::*;
pub use positions::*;

use itertools::Itertools;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::{
    error::{Result, config_error_unless},
    io::RecordSource,
    node::*,
    record::CitationRecord,
};

/// Default thresholds of the expansion passes
pub const DEFAULT_THRESHOLDS: [u32; 6] = [10, 8, 6, 4, 3, 2];

/// Default threshold repeated until nothing changes
pub const DEFAULT_FINAL_THRESHOLD: u32 = 1;

/// Default standard deviation of the jitter per axis
pub const DEFAULT_NOISE: f64 = 5.0;

/// Default offset added to seed coordinates
pub const DEFAULT_OFFSET: f64 = 10_000.0;

/// Receives every placement as soon as it happens
pub trait PlacementSink {
    /// Records that `node` has been placed at `position`
    fn place(&mut self, node: Node, position: Position) -> Result<()>;
}

impl PlacementSink for Vec<(Node, Position)> {
    fn place(&mut self, node: Node, position: Position) -> Result<()> {
        self.push((node, position));
        Ok(())
    }
}

impl<S: PlacementSink + ?Sized> PlacementSink for &mut S {
    fn place(&mut self, node: Node, position: Position) -> Result<()> {
        (**self).place(node, position)
    }
}

/// Configuration of a [`LayoutEngine`] using the builder pattern
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    capacity: NumNodes,
    offset: f64,
    noise: f64,
    thresholds: Vec<u32>,
    final_threshold: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            offset: DEFAULT_OFFSET,
            noise: DEFAULT_NOISE,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            final_threshold: DEFAULT_FINAL_THRESHOLD,
        }
    }
}

impl LayoutConfig {
    /// Updates the number of nodes positions are kept for
    pub fn capacity(mut self, capacity: NumNodes) -> Self {
        self.capacity = capacity;
        self
    }

    /// Updates the offset added to seed coordinates
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Updates the standard deviation of the jitter; `0` disables it
    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Updates the thresholds of the expansion passes (each run once, in order)
    pub fn thresholds<I: IntoIterator<Item = u32>>(mut self, thresholds: I) -> Self {
        self.thresholds = thresholds.into_iter().collect();
        self
    }

    /// Updates the threshold repeated until a pass places nothing
    pub fn final_threshold(mut self, threshold: u32) -> Self {
        self.final_threshold = threshold;
        self
    }

    /// Checks that all values are in range
    pub fn validate(&self) -> Result<()> {
        config_error_unless!(self.capacity > 0, "capacity must be positive");
        config_error_unless!(
            self.noise.is_finite() && self.noise >= 0.0,
            "noise must be finite and non-negative, got {}",
            self.noise
        );
        config_error_unless!(
            self.offset.is_finite(),
            "offset must be finite, got {}",
            self.offset
        );
        config_error_unless!(
            self.thresholds.iter().all(|&t| t > 0),
            "thresholds must be positive, got {:?}",
            self.thresholds
        );
        config_error_unless!(
            self.final_threshold > 0,
            "final threshold must be positive"
        );
        Ok(())
    }
}

/// Counters of one expansion pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    /// Minimum number of placed neighbors
    pub threshold: u32,
    /// Nodes placed in this pass
    pub placed: u64,
    /// Records of unplaced nodes with too few placed neighbors
    pub missing: u64,
    /// Unparsable records and records of nodes outside the capacity
    pub malformed: u64,
    /// Records of nodes that were already placed earlier in this pass
    pub duplicates: u64,
}

/// Result of [`LayoutEngine::run`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayoutSummary {
    /// Seeds loaded before the first pass
    pub seeds: u64,
    /// All passes in order
    pub passes: Vec<PassStats>,
}

impl LayoutSummary {
    /// Total number of nodes placed by passes
    pub fn placed(&self) -> u64 {
        self.passes.iter().map(|p| p.placed).sum()
    }

    /// Nodes still missing after the last pass
    pub fn missing(&self) -> u64 {
        self.passes.last().map_or(0, |p| p.missing)
    }
}

/// Neighbor scratch list of a single record
type Neighbors = SmallVec<[Node; 64]>;

/// Placed neighbors of a single record
type PlacedNeighbors = SmallVec<[(Node, Position); 64]>;

/// The iterative neighbor-centroid layout
pub struct LayoutEngine<R: Rng> {
    config: LayoutConfig,
    positions: PositionBuffer,
    jitter: Normal<f64>,
    rng: R,
    seeds: u64,
}

impl<R: Rng> LayoutEngine<R> {
    /// Creates an engine with all nodes unplaced
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if `config` is invalid.
    pub fn new(config: LayoutConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let jitter = Normal::new(0.0, config.noise).map_err(|err| {
            crate::Error::InvalidConfig(format!("noise {}: {err}", config.noise))
        })?;

        Ok(Self {
            positions: PositionBuffer::new(config.capacity),
            config,
            jitter,
            rng,
            seeds: 0,
        })
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Current position of `u`
    pub fn position(&self, u: Node) -> Position {
        self.positions.get(u)
    }

    /// All positions
    pub fn positions(&self) -> &PositionBuffer {
        &self.positions
    }

    /// Number of seeds loaded so far
    pub fn number_of_seeds(&self) -> u64 {
        self.seeds
    }

    /// Seeds `u` at `(x, y)` plus the configured offset.
    ///
    /// Returns *false* if `u` is outside the capacity, already placed, or would land on the
    /// unplaced sentinel.
    pub fn seed_position<S: PlacementSink>(
        &mut self,
        u: Node,
        x: f64,
        y: f64,
        sink: &mut S,
    ) -> Result<bool> {
        let position = Position::new(
            (x + self.config.offset) as f32,
            (y + self.config.offset) as f32,
        );
        self.resume_position(u, position, sink)
    }

    /// Seeds `u` at `position` without adding the offset (e.g. when replaying a layout).
    ///
    /// Returns *false* if `u` is outside the capacity, already placed, or `position` is the
    /// unplaced sentinel.
    pub fn resume_position<S: PlacementSink>(
        &mut self,
        u: Node,
        position: Position,
        sink: &mut S,
    ) -> Result<bool> {
        if !self.positions.contains(u) {
            debug!(node = %Key(u), "Seed outside capacity");
            return Ok(false);
        }
        if !position.is_placed() {
            debug!(node = %Key(u), "Seed at the unplaced sentinel");
            return Ok(false);
        }
        if !self.positions.place(u, position) {
            debug!(node = %Key(u), "Duplicate seed");
            return Ok(false);
        }

        self.seeds += 1;
        sink.place(u, position)?;
        Ok(true)
    }

    /// Runs all expansion passes and final passes until nothing changes
    pub fn run<T, S>(&mut self, source: &T, sink: &mut S) -> Result<LayoutSummary>
    where
        T: RecordSource + ?Sized,
        S: PlacementSink,
    {
        info!(
            seeds = self.seeds,
            thresholds = %self.config.thresholds.iter().join(","),
            final_threshold = self.config.final_threshold,
            "Starting layout"
        );

        let mut summary = LayoutSummary {
            seeds: self.seeds,
            passes: Vec::new(),
        };

        for threshold in self.config.thresholds.clone() {
            summary.passes.push(self.run_pass(source, threshold, sink)?);
        }

        loop {
            let stats = self.run_pass(source, self.config.final_threshold, sink)?;
            summary.passes.push(stats);
            if stats.placed == 0 {
                break;
            }
        }

        info!(
            placed = summary.placed(),
            missing = summary.missing(),
            passes = summary.passes.len(),
            "Finished layout"
        );
        Ok(summary)
    }

    /// Runs a single pass placing every unplaced node with at least `threshold` placed neighbors.
    /// Placements become visible to later passes only.
    pub fn run_pass<T, S>(&mut self, source: &T, threshold: u32, sink: &mut S) -> Result<PassStats>
    where
        T: RecordSource + ?Sized,
        S: PlacementSink,
    {
        let mut stats = PassStats {
            threshold,
            ..Default::default()
        };

        let record_stats = source.try_for_each_record(|record| {
            self.visit(record, threshold, &mut *sink, &mut stats)
        })?;
        stats.malformed += record_stats.malformed;

        let merged = self.positions.merge();
        debug_assert_eq!(merged as u64, stats.placed);

        info!(
            threshold,
            placed = stats.placed,
            missing = stats.missing,
            malformed = stats.malformed,
            duplicates = stats.duplicates,
            "Finished pass"
        );
        Ok(stats)
    }

    fn visit<S: PlacementSink>(
        &mut self,
        record: &CitationRecord<'_>,
        threshold: u32,
        sink: &mut S,
        stats: &mut PassStats,
    ) -> Result<()> {
        let u = record.id();
        if !self.positions.contains(u) {
            debug!(node = record.key(), "Record outside capacity");
            stats.malformed += 1;
            return Ok(());
        }
        if self.positions.is_placed(u) {
            return Ok(());
        }
        if self.positions.is_pending(u) {
            debug!(node = record.key(), "Duplicate record in pass");
            stats.duplicates += 1;
            return Ok(());
        }

        let mut neighbors: Neighbors = record
            .neighbors()
            .filter(|&v| self.positions.contains(v))
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();

        let mut placed: PlacedNeighbors = neighbors
            .into_iter()
            .map(|v| (v, self.positions.get(v)))
            .filter(|(_, p)| p.is_placed())
            .collect();

        if (placed.len() as u64) < threshold as u64 {
            stats.missing += 1;
            return Ok(());
        }

        let Some((cx, cy)) = refined_centroid(&mut placed) else {
            stats.missing += 1;
            return Ok(());
        };

        let position = Position::new(
            (cx + self.jitter.sample(&mut self.rng)) as f32,
            (cy + self.jitter.sample(&mut self.rng)) as f32,
        );
        if !position.is_placed() {
            debug!(node = record.key(), "Placement hit the unplaced sentinel");
            stats.missing += 1;
            return Ok(());
        }

        self.positions.place_pending(u, position);
        stats.placed += 1;
        sink.place(u, position)
    }
}
