//! Contour simplification.

use glam::Vec2;
use shatter_core::math::{distance_to_segment, signed_area};

/// Ramer-Douglas-Peucker on an open polyline. Both endpoints are kept.
pub fn douglas_peucker(points: &[Vec2], tolerance: f32) -> Vec<Vec2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (a, b) = (points[first], points[last]);
        let mut worst = 0.0f32;
        let mut worst_index = first;
        for (i, &p) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = distance_to_segment(p, a, b);
            if d > worst {
                worst = d;
                worst_index = i;
            }
        }
        if worst > tolerance {
            keep[worst_index] = true;
            stack.push((first, worst_index));
            stack.push((worst_index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Simplify a closed loop.
///
/// The loop is cut at the vertex farthest from its first point and each
/// half is simplified as an open polyline, so both anchors survive.
pub fn simplify_loop(points: &[Vec2], tolerance: f32) -> Vec<Vec2> {
    if points.len() < 4 || tolerance <= 0.0 {
        return points.to_vec();
    }

    let origin = points[0];
    let split = points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.distance_squared(origin)
                .total_cmp(&b.distance_squared(origin))
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    if split == 0 {
        return points.to_vec();
    }

    let first = douglas_peucker(&points[..=split], tolerance);
    let mut second_half: Vec<Vec2> = points[split..].to_vec();
    second_half.push(origin);
    let second = douglas_peucker(&second_half, tolerance);

    let mut out = first;
    // `second` starts at the split vertex and ends back at the origin.
    out.extend_from_slice(&second[1..second.len() - 1]);
    out
}

/// Drop vertices closer than `min_spacing` to the previously kept one,
/// including across the closing edge.
pub fn enforce_min_spacing(points: &[Vec2], min_spacing: f32) -> Vec<Vec2> {
    if min_spacing <= 0.0 || points.len() < 3 {
        return points.to_vec();
    }
    let limit = min_spacing * min_spacing;
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for &p in points {
        match out.last() {
            Some(&last) if last.distance_squared(p) < limit => {}
            _ => out.push(p),
        }
    }
    while out.len() > 3 && out[0].distance_squared(out[out.len() - 1]) < limit {
        out.pop();
    }
    out
}

/// Simplify every loop and drop the ones that collapse.
///
/// `tolerance` and `min_spacing` are in the same units as the points.
/// Loops whose area falls to `min_area` or below are removed.
pub fn simplify_loops(
    loops: &[Vec<Vec2>],
    tolerance: f32,
    min_spacing: f32,
    min_area: f32,
) -> Vec<Vec<Vec2>> {
    loops
        .iter()
        .filter_map(|points| {
            let simplified = enforce_min_spacing(&simplify_loop(points, tolerance), min_spacing);
            if simplified.len() < 3 || signed_area(&simplified).abs() <= min_area {
                log::trace!("loop of {} points collapsed in simplification", points.len());
                None
            } else {
                Some(simplified)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_rectangle(w: f32, h: f32, steps: usize) -> Vec<Vec2> {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, h),
            Vec2::new(w, h),
            Vec2::new(w, 0.0),
        ];
        let mut out = Vec::new();
        for i in 0..4 {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            for s in 0..steps {
                out.push(a.lerp(b, s as f32 / steps as f32));
            }
        }
        out
    }

    #[test]
    fn test_straight_polyline_collapses_to_endpoints() {
        let line: Vec<Vec2> = (0..10).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let out = douglas_peucker(&line, 0.01);
        assert_eq!(out, vec![Vec2::ZERO, Vec2::new(9.0, 0.0)]);
    }

    #[test]
    fn test_bump_above_tolerance_survives() {
        let line = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(4.0, 0.0),
        ];
        let out = douglas_peucker(&line, 0.5);
        assert!(out.contains(&Vec2::new(2.0, 1.0)));
        let flat = douglas_peucker(&line, 2.0);
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn test_loop_keeps_rectangle_corners() {
        let rect = dense_rectangle(6.0, 4.0, 8);
        let out = simplify_loop(&rect, 0.1);
        assert_eq!(out.len(), 4, "only corners remain: {out:?}");
        let before = signed_area(&rect);
        let after = signed_area(&out);
        assert!((before - after).abs() < 1e-4, "area preserved");
    }

    #[test]
    fn test_min_spacing_drops_close_points() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.01, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert_eq!(enforce_min_spacing(&pts, 0.05).len(), 4);
    }

    #[test]
    fn test_tiny_loops_are_dropped() {
        let tiny = vec![
            Vec2::ZERO,
            Vec2::new(0.01, 0.0),
            Vec2::new(0.01, 0.01),
            Vec2::new(0.0, 0.01),
        ];
        let big = dense_rectangle(3.0, 3.0, 3);
        let out = simplify_loops(&[tiny, big], 0.1, 0.0, 1e-3);
        assert_eq!(out.len(), 1);
    }
}
