//! Edge stitching: turns the unordered segments produced per quad into
//! closed loops.

use std::collections::BTreeMap;

use glam::Vec2;

/// A lattice edge between two neighboring samples, identified exactly so
/// that the two quads sharing it agree on the key.
///
/// `vertical == false` is the edge from `(x, y)` to `(x + 1, y)`,
/// `vertical == true` the edge from `(x, y)` to `(x, y + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub x: i32,
    pub y: i32,
    pub vertical: bool,
}

impl EdgeKey {
    pub fn horizontal(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            vertical: false,
        }
    }

    pub fn vertical(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            vertical: true,
        }
    }

    /// The two lattice points the edge connects, in canonical order.
    pub fn endpoints(&self) -> ((i32, i32), (i32, i32)) {
        if self.vertical {
            ((self.x, self.y), (self.x, self.y + 1))
        } else {
            ((self.x, self.y), (self.x + 1, self.y))
        }
    }
}

/// Chain directed segments (start edge → end edge) into closed loops.
///
/// Each start key maps to its end key; a loop is read off by following the
/// map from any remaining start until it comes back around. A chain that
/// runs out before closing is discarded.
pub fn stitch_loops(segments: &[(EdgeKey, EdgeKey)]) -> Vec<Vec<EdgeKey>> {
    let mut next: BTreeMap<EdgeKey, EdgeKey> = BTreeMap::new();
    for &(from, to) in segments {
        if let Some(previous) = next.insert(from, to) {
            log::warn!("contour edge {from:?} leaves twice ({previous:?}, {to:?})");
        }
    }

    let mut loops = Vec::new();
    while let Some((&start, _)) = next.first_key_value() {
        let mut chain = vec![start];
        let mut current = start;
        let closed = loop {
            match next.remove(&current) {
                Some(to) if to == start => break true,
                Some(to) => {
                    chain.push(to);
                    current = to;
                }
                None => break false,
            }
        };
        if closed {
            loops.push(chain);
        } else {
            log::warn!("discarding open contour of {} points", chain.len());
        }
    }
    loops
}

/// Merge consecutive points (including last → first) closer than
/// `epsilon`. Loops left with fewer than three points come back empty.
pub fn collapse_coincident(points: &[Vec2], epsilon: f32) -> Vec<Vec2> {
    let eps_sq = epsilon * epsilon;
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for &p in points {
        match out.last() {
            Some(&last) if last.distance_squared(p) < eps_sq => {}
            _ => out.push(p),
        }
    }
    while out.len() > 1 && out[0].distance_squared(out[out.len() - 1]) < eps_sq {
        out.pop();
    }
    if out.len() < 3 {
        out.clear();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stitch_single_loop() {
        let a = EdgeKey::horizontal(0, 0);
        let b = EdgeKey::vertical(1, 0);
        let c = EdgeKey::horizontal(0, 1);
        let loops = stitch_loops(&[(b, c), (a, b), (c, a)]);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 3);
    }

    #[test]
    fn test_stitch_two_loops() {
        let k = |x| EdgeKey::horizontal(x, 0);
        let loops = stitch_loops(&[(k(0), k(1)), (k(1), k(0)), (k(5), k(6)), (k(6), k(5))]);
        assert_eq!(loops.len(), 2);
    }

    #[test]
    fn test_open_chain_discarded() {
        let k = |x| EdgeKey::vertical(x, 0);
        let loops = stitch_loops(&[(k(0), k(1)), (k(1), k(2))]);
        assert!(loops.is_empty());
    }

    #[test]
    fn test_collapse_merges_neighbors_and_wrap() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1e-5),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1e-5, 0.0),
        ];
        let out = collapse_coincident(&pts, 1e-3);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_collapse_drops_degenerate_loops() {
        let pts = [Vec2::ZERO, Vec2::new(1e-4, 0.0), Vec2::X];
        assert!(collapse_coincident(&pts, 1e-3).is_empty());
    }
}
