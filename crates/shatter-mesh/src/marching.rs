//! Marching squares over a sampled density field.
//!
//! Samples sit on integer lattice points `(x, y)`; the field is treated as
//! zero outside its bounds, so every contour closes on its own. Each
//! emitted segment is oriented with the inside on its right, which makes
//! outer boundaries clockwise and holes counter-clockwise (y up).

use glam::Vec2;

use crate::contour::{collapse_coincident, stitch_loops, EdgeKey};

/// A rectangular window of density samples, row-major, row 0 at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl ScalarField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.values[x + y * self.width] = value;
        }
    }

    /// Sample at a lattice point. Anything outside the window reads as 0.
    #[inline]
    pub fn sample(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.values[x as usize + y as usize * self.width]
    }
}

// Quad edges: 0 bottom, 1 right, 2 top, 3 left.
const NONE: [[u8; 2]; 0] = [];

/// Edge pairs crossed for each corner mask (bit 0 bottom-left, then
/// counter-clockwise). Saddles 5 and 10 are resolved separately.
fn case_edges(case: u8) -> &'static [[u8; 2]] {
    match case {
        1 | 14 => &[[3, 0]],
        2 | 13 => &[[0, 1]],
        3 | 12 => &[[3, 1]],
        4 | 11 => &[[1, 2]],
        6 | 9 => &[[0, 2]],
        7 | 8 => &[[3, 2]],
        _ => &NONE,
    }
}

fn saddle_edges(case: u8, center_inside: bool) -> &'static [[u8; 2]] {
    // Joining the two inside corners through the center cuts off the
    // outside ones instead.
    match (case, center_inside) {
        (5, false) | (10, true) => &[[3, 0], [1, 2]],
        (5, true) | (10, false) => &[[0, 1], [2, 3]],
        _ => &NONE,
    }
}

fn quad_edge_key(qx: i32, qy: i32, edge: u8) -> EdgeKey {
    match edge {
        0 => EdgeKey::horizontal(qx, qy),
        1 => EdgeKey::vertical(qx + 1, qy),
        2 => EdgeKey::horizontal(qx, qy + 1),
        _ => EdgeKey::vertical(qx, qy),
    }
}

/// Where the isoline crosses a lattice edge, by linear interpolation.
fn crossing(field: &ScalarField, key: EdgeKey, isolevel: f32) -> Vec2 {
    let ((ax, ay), (bx, by)) = key.endpoints();
    let fa = field.sample(ax, ay);
    let fb = field.sample(bx, by);
    let denom = fb - fa;
    let t = if denom.abs() <= f32::EPSILON {
        0.5
    } else {
        ((isolevel - fa) / denom).clamp(0.0, 1.0)
    };
    let a = Vec2::new(ax as f32, ay as f32);
    let b = Vec2::new(bx as f32, by as f32);
    a.lerp(b, t)
}

/// All oriented boundary segments of the field, as lattice edge pairs.
///
/// The field is padded by one ring of zero samples on every side.
pub fn marching_segments(field: &ScalarField, isolevel: f32) -> Vec<(EdgeKey, EdgeKey)> {
    let mut segments = Vec::new();
    let w = field.width() as i32;
    let h = field.height() as i32;

    for qy in -1..h {
        for qx in -1..w {
            let corners = [
                (qx, qy),
                (qx + 1, qy),
                (qx + 1, qy + 1),
                (qx, qy + 1),
            ];
            let values = corners.map(|(x, y)| field.sample(x, y));
            let mut case = 0u8;
            for (bit, &v) in values.iter().enumerate() {
                if v > isolevel {
                    case |= 1 << bit;
                }
            }
            if case == 0 || case == 15 {
                continue;
            }

            let pairs = if case == 5 || case == 10 {
                let mean = values.iter().sum::<f32>() * 0.25;
                saddle_edges(case, mean > isolevel)
            } else {
                case_edges(case)
            };

            for &[ea, eb] in pairs {
                let ka = quad_edge_key(qx, qy, ea);
                let kb = quad_edge_key(qx, qy, eb);
                let pa = crossing(field, ka, isolevel);
                let pb = crossing(field, kb, isolevel);
                if orient_inside_right(pa, pb, [ea, eb], &corners, &values, isolevel) {
                    segments.push((ka, kb));
                } else {
                    segments.push((kb, ka));
                }
            }
        }
    }
    segments
}

/// True when `a -> b` already has the inside of the quad on its right.
///
/// A segment between adjacent edges cuts off the corner they share, which
/// decides the side. Between opposite edges both sides are uniform, so the
/// corner farthest from the line is used.
fn orient_inside_right(
    a: Vec2,
    b: Vec2,
    edges: [u8; 2],
    corners: &[(i32, i32); 4],
    values: &[f32; 4],
    isolevel: f32,
) -> bool {
    let dir = b - a;
    let cross_at = |i: usize| {
        let (x, y) = corners[i];
        dir.perp_dot(Vec2::new(x as f32, y as f32) - a)
    };

    // Edge e runs from corner e to corner e + 1.
    let [ea, eb] = edges;
    let shared = if (ea + 1) % 4 == eb {
        Some(eb as usize)
    } else if (eb + 1) % 4 == ea {
        Some(ea as usize)
    } else {
        None
    };

    let mut pick = shared.filter(|&i| cross_at(i).abs() > f32::EPSILON);
    if pick.is_none() {
        pick = (0..4).max_by(|&i, &j| cross_at(i).abs().total_cmp(&cross_at(j).abs()));
    }
    let Some(corner) = pick else {
        return true;
    };
    // Inside corners belong on the right (negative cross), outside on the left.
    (cross_at(corner) < 0.0) == (values[corner] > isolevel)
}

/// Extract closed contour loops in lattice units.
///
/// Outer boundaries come back clockwise, holes counter-clockwise. Points
/// closer than `epsilon` are merged and loops with fewer than three points
/// are dropped.
pub fn extract_contours(field: &ScalarField, isolevel: f32, epsilon: f32) -> Vec<Vec<Vec2>> {
    let segments = marching_segments(field, isolevel);
    stitch_loops(&segments)
        .into_iter()
        .map(|keys| {
            let points: Vec<Vec2> = keys
                .iter()
                .map(|&k| crossing(field, k, isolevel))
                .collect();
            collapse_coincident(&points, epsilon)
        })
        .filter(|points| !points.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shatter_core::math::signed_area;

    fn solid(width: usize, height: usize) -> ScalarField {
        ScalarField::from_fn(width, height, |_, _| 1.0)
    }

    #[test]
    fn test_empty_field_has_no_contours() {
        let field = ScalarField::new(4, 4);
        assert!(extract_contours(&field, 0.5, 1e-3).is_empty());
    }

    #[test]
    fn test_single_sample_is_clockwise_diamond() {
        let field = solid(1, 1);
        let loops = extract_contours(&field, 0.5, 1e-3);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
        let area = signed_area(&loops[0]);
        assert!((area + 0.5).abs() < 1e-5, "expected clockwise area -0.5, got {area}");
    }

    #[test]
    fn test_rectangle_area_has_chamfered_corners() {
        let field = solid(6, 4);
        let loops = extract_contours(&field, 0.5, 1e-3);
        assert_eq!(loops.len(), 1);
        let area = -signed_area(&loops[0]);
        let expected = 6.0 * 4.0 - 4.0 * 0.125;
        assert!((area - expected).abs() < 1e-4, "area {area} != {expected}");
    }

    #[test]
    fn test_ring_yields_outer_and_hole() {
        let field = ScalarField::from_fn(5, 5, |x, y| {
            if (1..=3).contains(&x) && (1..=3).contains(&y) && !(x == 2 && y == 2) {
                1.0
            } else {
                0.0
            }
        });
        let mut loops = extract_contours(&field, 0.5, 1e-3);
        assert_eq!(loops.len(), 2);
        loops.sort_by(|a, b| signed_area(a).total_cmp(&signed_area(b)));
        assert!(signed_area(&loops[0]) < 0.0, "outer boundary is clockwise");
        assert!(signed_area(&loops[1]) > 0.0, "hole is counter-clockwise");
    }

    #[test]
    fn test_disjoint_blobs_are_separate_loops() {
        let field = ScalarField::from_fn(7, 3, |x, _| if x < 2 || x > 4 { 1.0 } else { 0.0 });
        let loops = extract_contours(&field, 0.5, 1e-3);
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(signed_area(l) < 0.0);
        }
    }

    #[test]
    fn test_partial_density_moves_the_boundary() {
        let mut field = solid(3, 1);
        field.set(2, 0, 0.75);
        let full = -signed_area(&extract_contours(&solid(3, 1), 0.5, 1e-3)[0]);
        let partial = -signed_area(&extract_contours(&field, 0.5, 1e-3)[0]);
        assert!(partial < full, "a weaker end sample shrinks the contour");
    }

    #[test]
    fn test_saddle_resolves_consistently() {
        // Two diagonal samples: the quad between them is a saddle.
        let field = ScalarField::from_fn(2, 2, |x, y| if x == y { 1.0 } else { 0.0 });
        let loops = extract_contours(&field, 0.5, 1e-3);
        // Mean of the shared quad is 0.5, not above the isolevel: separated.
        assert_eq!(loops.len(), 2);

        let joined = ScalarField::from_fn(2, 2, |x, y| if x == y { 1.0 } else { 0.4 });
        let loops = extract_contours(&joined, 0.5, 1e-3);
        assert_eq!(loops.len(), 1, "center above isolevel joins the diagonal");
    }
}
