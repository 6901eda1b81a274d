/*!
# Density Map

One saturating `f32` accumulator per pixel. Every edge passing a pixel updates it via
`new = old + α − old·α`, i.e. `1 − new = (1 − old)(1 − α)`. Hence the result does not depend on
the order in which edges are drawn and never reaches `1`.
*/

/// Pixel coordinate, may lie outside the canvas
pub type Pixel = (i64, i64);

/// Per-pixel edge density of a `width × height` canvas
#[derive(Debug, Clone)]
pub struct DensityMap {
    width: u32,
    height: u32,
    cells: Vec<f32>,
}

impl DensityMap {
    /// Creates an empty map
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width as usize * height as usize],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns *true* if `(x, y)` lies on the canvas
    #[inline(always)]
    pub fn contains(&self, (x, y): Pixel) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Density at `(x, y)`, `0` outside the canvas
    #[inline(always)]
    pub fn get(&self, pixel: Pixel) -> f32 {
        self.index(pixel).map_or(0.0, |i| self.cells[i])
    }

    /// Blends `alpha` into `(x, y)`; pixels outside the canvas are skipped.
    /// Returns *true* if the pixel was on the canvas.
    #[inline(always)]
    pub fn accumulate(&mut self, pixel: Pixel, alpha: f32) -> bool {
        let Some(i) = self.index(pixel) else {
            return false;
        };
        let old = self.cells[i];
        self.cells[i] = old + alpha - old * alpha;
        true
    }

    /// Walks the segment from `a` to `b` along its major axis and accumulates `alpha` into every
    /// visited pixel. Returns the number of visited pixels on the canvas.
    ///
    /// The walk always runs from the smaller to the larger major coordinate, the minor coordinate
    /// is interpolated and truncated. If both endpoints are the same pixel, only that pixel is
    /// visited. The major range is clipped to the canvas first, so endpoints far outside the
    /// canvas cost no more than a segment across it.
    pub fn draw_line(&mut self, a: Pixel, b: Pixel, alpha: f32) -> u64 {
        let columns = (0, self.width as i64 - 1);
        let rows = (0, self.height as i64 - 1);

        let mut visited = 0;
        for pixel in walk(a, b, columns, rows) {
            visited += self.accumulate(pixel, alpha) as u64;
        }
        visited
    }

    /// Iterates over all densities in row-major order
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.iter().copied()
    }

    fn index(&self, pixel: Pixel) -> Option<usize> {
        self.contains(pixel)
            .then(|| pixel.1 as usize * self.width as usize + pixel.0 as usize)
    }
}

/// Pixels of the segment from `a` to `b` as walked by [`DensityMap::draw_line`] on an unbounded
/// canvas
pub fn line_pixels(a: Pixel, b: Pixel) -> impl Iterator<Item = Pixel> {
    let unbounded = (i64::MIN, i64::MAX);
    walk(a, b, unbounded, unbounded)
}

/// Walks the segment from `a` to `b`, restricted to major coordinates within the inclusive
/// `columns` (if x is the major axis) or `rows` range
fn walk(
    a: Pixel,
    b: Pixel,
    columns: (i64, i64),
    rows: (i64, i64),
) -> impl Iterator<Item = Pixel> {
    let x_major = a.0.abs_diff(b.0) >= a.1.abs_diff(b.1);

    // (major, minor) coordinates ordered by major coordinate
    let (mut from, mut to, (lo, hi)) = if x_major {
        ((a.0, a.1), (b.0, b.1), columns)
    } else {
        ((a.1, a.0), (b.1, b.0), rows)
    };
    if from.0 > to.0 {
        std::mem::swap(&mut from, &mut to);
    }

    // differences in f64, they may exceed the i64 range
    let slope = if from.0 == to.0 {
        0.0
    } else {
        (to.1 as f64 - from.1 as f64) / (to.0 as f64 - from.0 as f64)
    };

    (from.0.max(lo)..=to.0.min(hi)).map(move |major| {
        let i = major.abs_diff(from.0) as f64;
        let minor = (from.1 as f64 + slope * i) as i64;
        if x_major { (major, minor) } else { (minor, major) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn accumulation_saturates() {
        let mut map = DensityMap::new(2, 2);
        assert!(map.accumulate((1, 1), 0.5));
        assert!((map.get((1, 1)) - 0.5).abs() < 1e-6);
        assert!(map.accumulate((1, 1), 0.5));
        assert!((map.get((1, 1)) - 0.75).abs() < 1e-6);

        for _ in 0..1000 {
            map.accumulate((0, 0), 0.002);
        }
        let v = map.get((0, 0));
        assert!(v > 0.8 && v < 1.0);
    }

    #[test]
    fn accumulation_is_order_independent() {
        let rng = &mut Pcg64Mcg::seed_from_u64(5);
        let alphas = (0..200).map(|_| rng.random_range(0.0..0.1)).collect_vec();

        let mut forward = DensityMap::new(1, 1);
        let mut backward = DensityMap::new(1, 1);
        for &alpha in &alphas {
            forward.accumulate((0, 0), alpha);
        }
        for &alpha in alphas.iter().rev() {
            backward.accumulate((0, 0), alpha);
        }
        assert!((forward.get((0, 0)) - backward.get((0, 0))).abs() < 1e-5);
    }

    #[test]
    fn reversed_edges_hit_the_same_pixels() {
        let mut ab = DensityMap::new(20, 20);
        let mut ba = DensityMap::new(20, 20);
        ab.draw_line((2, 3), (15, 9), 0.3);
        ab.draw_line((15, 9), (2, 3), 0.1);
        ba.draw_line((15, 9), (2, 3), 0.1);
        ba.draw_line((2, 3), (15, 9), 0.3);

        for (x, y) in ab.values().zip(ba.values()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn walks_along_major_axis() {
        assert_eq!(
            line_pixels((0, 0), (4, 2)).collect_vec(),
            vec![(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)]
        );
        assert_eq!(
            line_pixels((1, 5), (0, 0)).collect_vec(),
            vec![(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 5)]
        );
        assert_eq!(
            line_pixels((3, 3), (0, 0)).collect_vec(),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)]
        );
        assert_eq!(line_pixels((7, 7), (7, 7)).collect_vec(), vec![(7, 7)]);
    }

    #[test]
    fn off_canvas_pixels_are_skipped() {
        let mut map = DensityMap::new(5, 5);
        assert_eq!(map.draw_line((-3, 2), (7, 2), 0.5), 5);
        assert!(!map.accumulate((5, 0), 0.5));
        assert!(!map.accumulate((0, -1), 0.5));

        for x in 0..5 {
            assert!((map.get((x, 2)) - 0.5).abs() < 1e-6);
            assert_eq!(map.get((x, 1)), 0.0);
        }
    }

    #[test]
    fn far_endpoints_are_clipped() {
        let far = 1_000_000_000_000;

        let mut map = DensityMap::new(5, 5);
        assert_eq!(map.draw_line((-far, 2), (3, 2), 0.5), 4);
        assert_eq!(map.get((4, 2)), 0.0);

        let mut map = DensityMap::new(5, 5);
        assert_eq!(map.draw_line((far, far), (0, 0), 0.5), 5);
        for z in 0..5 {
            assert!((map.get((z, z)) - 0.5).abs() < 1e-6);
        }

        let mut map = DensityMap::new(5, 5);
        assert_eq!(map.draw_line((i64::MIN, 1), (i64::MAX, 1), 0.5), 5);
        assert_eq!(map.draw_line((2, i64::MAX), (2, i64::MIN), 0.5), 5);
        assert!((map.get((2, 1)) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn degenerate_edge_hits_one_pixel() {
        let mut map = DensityMap::new(5, 5);
        assert_eq!(map.draw_line((2, 2), (2, 2), 0.5), 1);
        assert_eq!(map.values().filter(|&v| v > 0.0).count(), 1);
    }
}
