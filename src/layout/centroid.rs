//! Centroids of placed neighbors.

use std::cmp::Ordering;

use crate::node::*;

/// Number of neighbors the refined centroid is taken over
pub const NEAREST_NEIGHBORS: usize = 3;

/// Mean of all positions, `None` if `points` is empty
pub fn centroid(points: &[(Node, Position)]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }

    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), (_, p)| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    let n = points.len() as f64;
    Some((sx / n, sy / n))
}

/// Centroid of the [`NEAREST_NEIGHBORS`] points closest to the centroid of all `points`.
///
/// With at most [`NEAREST_NEIGHBORS`] points this is the plain [`centroid`]. Equal distances are
/// broken by the smaller node. `points` is reordered.
///
/// # Examples
/// ```
/// use citemap::{layout::refined_centroid, node::*};
///
/// let mut points = [
///     (1, Position::new(0.0, 0.0)),
///     (2, Position::new(3.0, 0.0)),
///     (3, Position::new(0.0, 3.0)),
///     (4, Position::new(100.0, 100.0)),
/// ];
/// assert_eq!(refined_centroid(&mut points), Some((1.0, 1.0)));
/// ```
pub fn refined_centroid(points: &mut [(Node, Position)]) -> Option<(f64, f64)> {
    let coarse = centroid(points)?;
    if points.len() <= NEAREST_NEIGHBORS {
        return Some(coarse);
    }

    let (cx, cy) = coarse;
    points.select_nth_unstable_by(NEAREST_NEIGHBORS - 1, by_distance(cx, cy));

    centroid(&points[..NEAREST_NEIGHBORS])
}

/// Orders by distance to `(cx, cy)`, then by node
fn by_distance(cx: f64, cy: f64) -> impl Fn(&(Node, Position), &(Node, Position)) -> Ordering {
    move |(u, pu), (v, pv)| {
        pu.squared_distance_to(cx, cy)
            .total_cmp(&pv.squared_distance_to(cx, cy))
            .then_with(|| u.cmp(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn plain_centroid() {
        assert_eq!(centroid(&[]), None);
        assert_eq!(
            centroid(&[(0, Position::new(10000.0, 10000.0)), (1, Position::new(10010.0, 10000.0))]),
            Some((10005.0, 10000.0))
        );
    }

    #[test]
    fn few_points_are_not_refined() {
        let mut points = [
            (7, Position::new(1.0, 1.0)),
            (8, Position::new(2.0, 1.0)),
            (9, Position::new(1000.0, 1.0)),
        ];
        assert_eq!(refined_centroid(&mut points), Some((1003.0 / 3.0, 1.0)));
    }

    #[test]
    fn ties_prefer_smaller_nodes() {
        // all four points are at distance 1 of the coarse centroid (1, 1)
        let mut points = [
            (4, Position::new(2.0, 1.0)),
            (3, Position::new(0.0, 1.0)),
            (2, Position::new(1.0, 2.0)),
            (1, Position::new(1.0, 0.0)),
        ];
        let (x, y) = refined_centroid(&mut points).unwrap();
        assert!((x - 2.0 / 3.0).abs() < 1e-9);
        assert!((y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn refinement_is_order_independent() {
        let rng = &mut Pcg64Mcg::seed_from_u64(11);
        for _ in 0..100 {
            let mut points = (0..rng.random_range(4..20))
                .map(|u| {
                    (
                        u,
                        Position::new(rng.random_range(1.0..50.0), rng.random_range(1.0..50.0)),
                    )
                })
                .collect_vec();
            let (ex, ey) = refined_centroid(&mut points.clone()).unwrap();

            points.reverse();
            let (x, y) = refined_centroid(&mut points).unwrap();
            assert!((x - ex).abs() < 1e-9 && (y - ey).abs() < 1e-9);
        }
    }
}
