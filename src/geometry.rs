//! Geometric agreement for location values.
//!
//! Location annotations carry GeoJSON-style geometries. Bounding boxes arrive
//! as a flat ring of `[x, y]` positions directly under `coordinates` (the
//! corpus convention — not the nested GeoJSON `Polygon` ring list), points as
//! `{"type": "Point", "coordinates": [x, y]}`.
//!
//! Scoring: two rings with more than two positions each are compared as
//! polygons via intersect-over-union; two equal `Point` geometries score 1;
//! every other combination scores 0. The polygon intersection is a
//! Sutherland-Hodgman clip with shoelace areas, which is exact for the convex
//! query footprints the pipelines emit.

use serde_json::Value;

type Point = (f64, f64);

/// Intersect-over-union of two geometry values, in `[0, 1]`.
///
/// Degenerate geometries (missing or malformed `coordinates`, zero-area
/// union) score 0 rather than failing.
#[must_use]
pub fn intersect_over_union(test: &Value, gold: &Value) -> f64 {
    if let (Some(test_ring), Some(gold_ring)) = (ring(test), ring(gold)) {
        if test_ring.len() > 2 && gold_ring.len() > 2 {
            return polygon_iou(&test_ring, &gold_ring);
        }
    }
    let is_point = |geometry: &Value| geometry.get("type").and_then(Value::as_str) == Some("Point");
    if is_point(test)
        && is_point(gold)
        && test.get("coordinates").is_some()
        && test.get("coordinates") == gold.get("coordinates")
    {
        return 1.0;
    }
    0.0
}

/// Read `coordinates` as a ring of `[x, y]` positions.
fn ring(geometry: &Value) -> Option<Vec<Point>> {
    geometry
        .get("coordinates")?
        .as_array()?
        .iter()
        .map(|position| {
            let pair = position.as_array()?;
            if pair.len() < 2 {
                return None;
            }
            Some((pair[0].as_f64()?, pair[1].as_f64()?))
        })
        .collect()
}

/// Shoelace signed area; positive for counter-clockwise rings.
fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        sum += x1 * y2 - x2 * y1;
    }
    sum / 2.0
}

fn inside(edge_start: Point, edge_end: Point, point: Point) -> bool {
    (edge_end.0 - edge_start.0) * (point.1 - edge_start.1)
        - (edge_end.1 - edge_start.1) * (point.0 - edge_start.0)
        >= 0.0
}

/// Intersection of segment direction (p1, p2) with the line through (a, b).
fn line_intersection(p1: Point, p2: Point, a: Point, b: Point) -> Option<Point> {
    let d1 = (p2.0 - p1.0, p2.1 - p1.1);
    let d2 = (b.0 - a.0, b.1 - a.1);
    let denominator = d1.0 * d2.1 - d1.1 * d2.0;
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    let t = ((a.0 - p1.0) * d2.1 - (a.1 - p1.1) * d2.0) / denominator;
    Some((p1.0 + t * d1.0, p1.1 + t * d1.1))
}

/// Sutherland-Hodgman: clip `subject` against convex `clip`.
fn clip_polygon(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let mut clip = clip.to_vec();
    // The inside test assumes a counter-clockwise clip ring.
    if signed_area(&clip) < 0.0 {
        clip.reverse();
    }
    let mut output = subject.to_vec();
    let clip_len = clip.len();
    for i in 0..clip_len {
        if output.is_empty() {
            break;
        }
        let edge_start = clip[i];
        let edge_end = clip[(i + 1) % clip_len];
        let input = std::mem::take(&mut output);
        let input_len = input.len();
        for j in 0..input_len {
            let current = input[j];
            let previous = input[(j + input_len - 1) % input_len];
            let current_inside = inside(edge_start, edge_end, current);
            let previous_inside = inside(edge_start, edge_end, previous);
            if current_inside {
                if !previous_inside {
                    if let Some(point) = line_intersection(previous, current, edge_start, edge_end)
                    {
                        output.push(point);
                    }
                }
                output.push(current);
            } else if previous_inside {
                if let Some(point) = line_intersection(previous, current, edge_start, edge_end) {
                    output.push(point);
                }
            }
        }
    }
    output
}

fn polygon_iou(test: &[Point], gold: &[Point]) -> f64 {
    let clipped = clip_polygon(test, gold);
    let intersection = if clipped.len() < 3 {
        0.0
    } else {
        signed_area(&clipped).abs()
    };
    let union = signed_area(test).abs() + signed_area(gold).abs() - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [
                [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
            ]
        })
    }

    #[test]
    fn identical_boxes_score_one() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        assert!((intersect_over_union(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn half_overlapping_boxes() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150.
        assert!((intersect_over_union(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_boxes_score_zero() {
        let a = bbox(0.0, 0.0, 1.0, 1.0);
        let b = bbox(5.0, 5.0, 6.0, 6.0);
        assert_eq!(intersect_over_union(&a, &b), 0.0);
    }

    #[test]
    fn contained_box() {
        let outer = bbox(0.0, 0.0, 10.0, 10.0);
        let inner = bbox(2.0, 2.0, 4.0, 4.0);
        assert!((intersect_over_union(&inner, &outer) - 0.04).abs() < 1e-9);
    }

    #[test]
    fn clockwise_rings_are_handled() {
        let ccw = bbox(0.0, 0.0, 10.0, 10.0);
        let cw = json!({
            "type": "Polygon",
            "coordinates": [
                [0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0], [0.0, 0.0]
            ]
        });
        assert!((intersect_over_union(&ccw, &cw) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn points_score_one_only_when_equal() {
        let a = json!({"type": "Point", "coordinates": [4.5, 50.1]});
        let b = json!({"type": "Point", "coordinates": [4.5, 50.1]});
        let c = json!({"type": "Point", "coordinates": [4.5, 51.0]});
        assert_eq!(intersect_over_union(&a, &b), 1.0);
        assert_eq!(intersect_over_union(&a, &c), 0.0);
    }

    #[test]
    fn mixed_and_malformed_geometries_score_zero() {
        let polygon = bbox(0.0, 0.0, 10.0, 10.0);
        let point = json!({"type": "Point", "coordinates": [1.0, 1.0]});
        assert_eq!(intersect_over_union(&polygon, &point), 0.0);
        assert_eq!(intersect_over_union(&json!({}), &polygon), 0.0);
        assert_eq!(intersect_over_union(&json!(null), &json!(null)), 0.0);
        let garbage = json!({"type": "Polygon", "coordinates": "oops"});
        assert_eq!(intersect_over_union(&garbage, &polygon), 0.0);
    }

    #[test]
    fn degenerate_ring_scores_zero() {
        // A two-position "ring" is below the polygon threshold.
        let line = json!({"type": "Polygon", "coordinates": [[0.0, 0.0], [1.0, 1.0]]});
        assert_eq!(intersect_over_union(&line, &line), 0.0);
    }
}
