/*!
# Render

Draws a finished layout as a density image.

- **Edges** are not drawn as lines but accumulated into a [`DensityMap`]: every pixel visited by
  an edge blends in the edge alpha. The final grey level of a pixel only depends on how many edges
  cross it, not on their order.
- **Nodes** are painted as filled disks, coloured by category if available.

The world coordinate `(x, y)` maps to pixel `(x · scale, H − y · scale)` (truncated), so the
y axis points up. The [`ZOrder`] decides whether node disks are painted over the shaded density
map or darkened by it.

# Examples
```
use citemap::{node::*, render::*};

let config = RenderConfig::default().size(100).scale(1.0);
let mut renderer = Renderer::new(config).unwrap();

let mut positions = vec![Position::UNPLACED; 3];
positions[1] = Position::new(10.0, 10.0);
positions[2] = Position::new(60.0, 10.0);
renderer.draw_edge(positions[1], positions[2]);

let image = renderer.compose(&positions, None);
assert_eq!(image.dimensions(), (100, 100));
assert_eq!(image.get_pixel(30, 90).0, [254, 254, 254]);
assert_eq!(image.get_pixel(30, 50).0, [255, 255, 255]);
```
*/

pub mod canvas;
pub mod density;

pub use canvas::*;
pub use density::*;

use std::path::Path;

use image::{ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::{
    error::{Result, config_error_unless},
    io::{Categories, RecordSource},
    node::*,
};

/// Default width and height in pixels
pub const DEFAULT_SIZE: u32 = 10_000;

/// Default factor from world coordinates to pixels
pub const DEFAULT_SCALE: f64 = 0.5;

/// Default diameter of node disks in pixels
pub const DEFAULT_DOT_SIZE: f32 = 4.0;

/// Default opacity of node disks
pub const DEFAULT_NODE_ALPHA: f32 = 0.065;

/// Default opacity of a single edge
pub const DEFAULT_EDGE_ALPHA: f32 = 0.002;

/// Which layer ends up on top
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    /// Node disks are blended over the shaded density map
    #[default]
    NodesOverEdges,
    /// Node disks are painted on white, then every pixel is darkened by its density
    EdgesOverNodes,
}

/// Configuration of a [`Renderer`] using the builder pattern
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    width: u32,
    height: u32,
    scale: f64,
    dot_size: f32,
    node_alpha: f32,
    edge_alpha: f32,
    z_order: ZOrder,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            scale: DEFAULT_SCALE,
            dot_size: DEFAULT_DOT_SIZE,
            node_alpha: DEFAULT_NODE_ALPHA,
            edge_alpha: DEFAULT_EDGE_ALPHA,
            z_order: ZOrder::default(),
        }
    }
}

impl RenderConfig {
    /// Updates width and height to `size`
    pub fn size(self, size: u32) -> Self {
        self.dimensions(size, size)
    }

    /// Updates width and height
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Updates the factor from world coordinates to pixels
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Updates the diameter of node disks
    pub fn dot_size(mut self, dot_size: f32) -> Self {
        self.dot_size = dot_size;
        self
    }

    /// Updates the opacity of node disks
    pub fn node_alpha(mut self, alpha: f32) -> Self {
        self.node_alpha = alpha;
        self
    }

    /// Updates the opacity of a single edge
    pub fn edge_alpha(mut self, alpha: f32) -> Self {
        self.edge_alpha = alpha;
        self
    }

    /// Updates the layer order
    pub fn z_order(mut self, z_order: ZOrder) -> Self {
        self.z_order = z_order;
        self
    }

    /// Checks that all values are in range
    pub fn validate(&self) -> Result<()> {
        config_error_unless!(
            self.width > 0 && self.height > 0,
            "canvas must not be empty, got {}x{}",
            self.width,
            self.height
        );
        config_error_unless!(
            self.scale.is_finite() && self.scale > 0.0,
            "scale must be positive, got {}",
            self.scale
        );
        config_error_unless!(
            self.dot_size.is_finite() && self.dot_size >= 0.0,
            "dot size must be non-negative, got {}",
            self.dot_size
        );
        for (name, alpha) in [("node", self.node_alpha), ("edge", self.edge_alpha)] {
            config_error_unless!(
                (0.0..=1.0).contains(&alpha),
                "{name} alpha must be in [0, 1], got {alpha}"
            );
        }
        Ok(())
    }
}

/// Counters of drawing all edges
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeStats {
    /// Edges with two placed endpoints
    pub drawn: u64,
    /// References to unplaced or unknown nodes
    pub skipped: u64,
    /// Unparsable records
    pub malformed: u64,
}

/// Accumulates edges and composes the final image
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    density: DensityMap,
}

impl Renderer {
    /// Creates a renderer with an empty density map
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if `config` is invalid.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            density: DensityMap::new(config.width, config.height),
            config,
        })
    }

    /// The configuration this renderer runs with
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The accumulated edge density
    pub fn density(&self) -> &DensityMap {
        &self.density
    }

    /// Pixel of a world coordinate (possibly outside the canvas)
    #[inline(always)]
    pub fn to_pixel(&self, position: Position) -> Pixel {
        let x = position.x as f64 * self.config.scale;
        let y = self.config.height as f64 - position.y as f64 * self.config.scale;
        (x as i64, y as i64)
    }

    /// Accumulates the edge between two placed positions
    pub fn draw_edge(&mut self, a: Position, b: Position) {
        let (a, b) = (self.to_pixel(a), self.to_pixel(b));
        self.density.draw_line(a, b, self.config.edge_alpha);
    }

    /// Draws the reference edges of all records whose endpoints are both placed in `positions`
    pub fn draw_edges<T>(&mut self, source: &T, positions: &[Position]) -> Result<EdgeStats>
    where
        T: RecordSource + ?Sized,
    {
        let position = |u: Node| {
            positions
                .get(u as usize)
                .copied()
                .filter(Position::is_placed)
        };

        let mut stats = EdgeStats::default();
        let record_stats = source.try_for_each_record(|record| {
            let Some(pu) = position(record.id()) else {
                return Ok(());
            };
            for v in record.references() {
                match position(v) {
                    Some(pv) => {
                        self.draw_edge(pu, pv);
                        stats.drawn += 1;
                    }
                    None => stats.skipped += 1,
                }
            }
            Ok(())
        })?;
        stats.malformed = record_stats.malformed;

        info!(
            drawn = stats.drawn,
            skipped = stats.skipped,
            malformed = stats.malformed,
            "Finished drawing edges"
        );
        Ok(stats)
    }

    /// Composes density map and node disks into an image.
    ///
    /// Nodes are painted in increasing order; without `categories` all nodes use
    /// [`DEFAULT_NODE_COLOR`].
    pub fn compose(&self, positions: &[Position], categories: Option<&Categories>) -> RgbImage {
        let (width, height) = (self.config.width, self.config.height);

        let mut image = match self.config.z_order {
            ZOrder::NodesOverEdges => RgbImage::from_fn(width, height, |x, y| {
                grey(self.density.get((x as i64, y as i64)))
            }),
            ZOrder::EdgesOverNodes => RgbImage::from_pixel(width, height, WHITE),
        };

        let mut nodes = 0u64;
        for (u, &position) in positions.iter().enumerate() {
            if !position.is_placed() {
                continue;
            }
            let color = categories.map_or(DEFAULT_NODE_COLOR, |c| category_color(c.get(u as Node)));
            paint_disk(
                &mut image,
                self.to_pixel(position),
                self.config.dot_size,
                color,
                self.config.node_alpha,
            );
            nodes += 1;
        }
        debug!(nodes, "Painted nodes");

        if self.config.z_order == ZOrder::EdgesOverNodes {
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                darken(pixel, self.density.get((x as i64, y as i64)));
            }
        }

        image
    }
}

/// Writes `image` as PNG to `path`
pub fn save_png<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    image.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), "Saved image");
    Ok(())
}
