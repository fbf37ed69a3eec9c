//! Triangulation of contour loops, holes included.
//!
//! Loops are classified by winding: clockwise loops are outer boundaries,
//! counter-clockwise loops are holes. Each hole is assigned to the smallest
//! outer loop that contains it and spliced in with a bridge edge, then the
//! merged polygon is ear clipped.

use glam::Vec2;
use shatter_core::math::{point_in_polygon, signed_area, triangle_area};

/// Counter-clockwise triangle.
pub type Triangle = [Vec2; 3];

struct Outer {
    points: Vec<Vec2>,
    area: f32,
    holes: Vec<Vec<Vec2>>,
}

/// Triangulate a set of closed loops as produced by contour extraction.
///
/// Triangles with an area below `min_area` are dropped. All returned
/// triangles wind counter-clockwise.
pub fn triangulate_loops(loops: &[Vec<Vec2>], min_area: f32) -> Vec<Triangle> {
    let mut outers: Vec<Outer> = Vec::new();
    let mut holes: Vec<Vec<Vec2>> = Vec::new();

    for points in loops.iter().filter(|l| l.len() >= 3) {
        let area = signed_area(points);
        if area < 0.0 {
            let mut ccw = points.clone();
            ccw.reverse();
            outers.push(Outer {
                points: ccw,
                area: -area,
                holes: Vec::new(),
            });
        } else if area > 0.0 {
            let mut cw = points.clone();
            cw.reverse();
            holes.push(cw);
        }
    }

    for hole in holes {
        let probe = hole[0];
        let parent = outers
            .iter_mut()
            .filter(|o| point_in_polygon(probe, &o.points))
            .min_by(|a, b| a.area.total_cmp(&b.area));
        match parent {
            Some(outer) => outer.holes.push(hole),
            None => log::debug!("hole of {} points has no enclosing boundary", hole.len()),
        }
    }

    let mut triangles = Vec::new();
    for outer in outers {
        let polygon = bridge_holes(outer.points, outer.holes);
        ear_clip(&polygon, &mut triangles);
    }
    triangles.retain(|t| triangle_area(t[0], t[1], t[2]) >= min_area);
    triangles
}

fn max_x_index(points: &[Vec2]) -> usize {
    points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.x.total_cmp(&b.x))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Proper crossing test: touching at an endpoint does not count.
fn segments_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = (b - a).perp_dot(c - a);
    let d2 = (b - a).perp_dot(d - a);
    let d3 = (d - c).perp_dot(a - c);
    let d4 = (d - c).perp_dot(b - c);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn ring_blocks(ring: &[Vec2], from: Vec2, to: Vec2) -> bool {
    (0..ring.len()).any(|i| {
        let (c, d) = (ring[i], ring[(i + 1) % ring.len()]);
        if c == from || c == to || d == from || d == to {
            return false;
        }
        segments_cross(from, to, c, d)
    })
}

/// Splice clockwise holes into a counter-clockwise outer ring.
///
/// Holes are handled rightmost first. Each one is joined from its
/// rightmost vertex to the nearest outer vertex the bridge can see.
fn bridge_holes(outer: Vec<Vec2>, mut holes: Vec<Vec<Vec2>>) -> Vec<Vec2> {
    holes.sort_by(|a, b| {
        let ax = a[max_x_index(a)].x;
        let bx = b[max_x_index(b)].x;
        bx.total_cmp(&ax)
    });

    let mut polygon = outer;
    for h in 0..holes.len() {
        let hole = &holes[h];
        let hi = max_x_index(hole);
        let m = hole[hi];

        let mut candidates: Vec<usize> = (0..polygon.len()).collect();
        candidates.sort_by(|&i, &j| {
            polygon[i]
                .distance_squared(m)
                .total_cmp(&polygon[j].distance_squared(m))
        });

        let visible = candidates.into_iter().find(|&vi| {
            let v = polygon[vi];
            !ring_blocks(&polygon, m, v) && !holes.iter().any(|other| ring_blocks(other, m, v))
        });

        let Some(vi) = visible else {
            log::debug!("no visible bridge for hole of {} points", hole.len());
            continue;
        };

        let mut merged = Vec::with_capacity(polygon.len() + hole.len() + 2);
        merged.extend_from_slice(&polygon[..=vi]);
        merged.extend_from_slice(&hole[hi..]);
        merged.extend_from_slice(&hole[..=hi]);
        merged.extend_from_slice(&polygon[vi..]);
        polygon = merged;
    }
    polygon
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    (b - a).perp_dot(p - a) >= 0.0 && (c - b).perp_dot(p - b) >= 0.0 && (a - c).perp_dot(p - c) >= 0.0
}

fn is_ear(polygon: &[Vec2], ring: &[usize], prev: usize, cur: usize, next: usize) -> bool {
    let (a, b, c) = (polygon[prev], polygon[cur], polygon[next]);
    if (b - a).perp_dot(c - b) <= 0.0 {
        return false;
    }
    !ring.iter().any(|&i| {
        let p = polygon[i];
        i != prev && i != cur && i != next && p != a && p != b && p != c && point_in_triangle(p, a, b, c)
    })
}

/// Ear clip a simple counter-clockwise polygon (bridged holes allowed).
fn ear_clip(polygon: &[Vec2], out: &mut Vec<Triangle>) {
    let mut ring: Vec<usize> = (0..polygon.len()).collect();
    let mut cursor = 0usize;
    let mut misses = 0usize;

    while ring.len() > 3 {
        let n = ring.len();
        let i = cursor % n;
        let prev = ring[(i + n - 1) % n];
        let cur = ring[i];
        let next = ring[(i + 1) % n];

        if is_ear(polygon, &ring, prev, cur, next) {
            out.push([polygon[prev], polygon[cur], polygon[next]]);
            ring.remove(i);
            cursor = i;
            misses = 0;
            continue;
        }

        cursor = i + 1;
        misses += 1;
        if misses > n {
            // No ear in a full pass: the remaining ring is degenerate.
            // Drop its flattest vertex and keep going.
            let flattest = (0..n)
                .min_by(|&x, &y| {
                    let turn = |k: usize| {
                        let (a, b, c) = (
                            polygon[ring[(k + n - 1) % n]],
                            polygon[ring[k]],
                            polygon[ring[(k + 1) % n]],
                        );
                        (b - a).perp_dot(c - b).abs()
                    };
                    turn(x).total_cmp(&turn(y))
                })
                .unwrap_or(0);
            ring.remove(flattest);
            misses = 0;
        }
    }

    if ring.len() == 3 {
        let tri = [polygon[ring[0]], polygon[ring[1]], polygon[ring[2]]];
        if (tri[1] - tri[0]).perp_dot(tri[2] - tri[0]) > 0.0 {
            out.push(tri);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: Vec2, size: f32, clockwise: bool) -> Vec<Vec2> {
        let mut pts = vec![
            min,
            min + Vec2::new(size, 0.0),
            min + Vec2::new(size, size),
            min + Vec2::new(0.0, size),
        ];
        if clockwise {
            pts.reverse();
        }
        pts
    }

    fn total_area(tris: &[Triangle]) -> f32 {
        tris.iter().map(|t| triangle_area(t[0], t[1], t[2])).sum()
    }

    fn all_ccw(tris: &[Triangle]) -> bool {
        tris.iter()
            .all(|t| (t[1] - t[0]).perp_dot(t[2] - t[0]) > 0.0)
    }

    #[test]
    fn test_square_becomes_two_triangles() {
        let tris = triangulate_loops(&[square(Vec2::ZERO, 2.0, true)], 1e-6);
        assert_eq!(tris.len(), 2);
        assert!((total_area(&tris) - 4.0).abs() < 1e-5);
        assert!(all_ccw(&tris), "triangles must wind counter-clockwise");
    }

    #[test]
    fn test_concave_polygon_area() {
        // Clockwise L shape.
        let l = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 3.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(3.0, 1.0),
            Vec2::new(3.0, 0.0),
        ];
        let tris = triangulate_loops(&[l], 1e-6);
        assert_eq!(tris.len(), 4);
        assert!((total_area(&tris) - 5.0).abs() < 1e-5);
        assert!(all_ccw(&tris));
    }

    #[test]
    fn test_hole_is_subtracted() {
        let outer = square(Vec2::ZERO, 6.0, true);
        let hole = square(Vec2::new(2.0, 2.0), 2.0, false);
        let tris = triangulate_loops(&[outer, hole], 1e-6);
        let area = total_area(&tris);
        assert!((area - 32.0).abs() < 1e-4, "expected 36 - 4, got {area}");
        assert!(all_ccw(&tris));
        for t in &tris {
            let c = (t[0] + t[1] + t[2]) / 3.0;
            let in_hole = c.x > 2.0 && c.x < 4.0 && c.y > 2.0 && c.y < 4.0;
            assert!(!in_hole, "triangle centroid {c:?} inside the hole");
        }
    }

    #[test]
    fn test_two_holes() {
        let outer = square(Vec2::ZERO, 10.0, true);
        let h1 = square(Vec2::new(1.0, 1.0), 2.0, false);
        let h2 = square(Vec2::new(6.0, 5.0), 3.0, false);
        let tris = triangulate_loops(&[outer, h1, h2], 1e-6);
        let area = total_area(&tris);
        assert!((area - (100.0 - 4.0 - 9.0)).abs() < 1e-3, "area {area}");
    }

    #[test]
    fn test_separate_outers() {
        let a = square(Vec2::ZERO, 1.0, true);
        let b = square(Vec2::new(5.0, 0.0), 1.0, true);
        let tris = triangulate_loops(&[a, b], 1e-6);
        assert_eq!(tris.len(), 4);
    }

    #[test]
    fn test_orphan_hole_ignored() {
        let hole = square(Vec2::ZERO, 1.0, false);
        assert!(triangulate_loops(&[hole], 1e-6).is_empty());
    }

    #[test]
    fn test_sliver_triangles_filtered() {
        let thin = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 1e-6),
            Vec2::new(10.0, 0.0),
        ];
        assert!(triangulate_loops(&[thin], 1e-4).is_empty());
    }
}
