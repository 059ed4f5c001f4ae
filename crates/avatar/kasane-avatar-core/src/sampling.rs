//! Motion track sampling.
//!
//! Model:
//! - Each MotionTrack has ordered Keypoints with normalized stamps in [0,1].
//! - Segment [Pi -> P(i+1)] timing is a cubic-bezier determined by:
//!   cp0 = Pi.transitions.out or default {x:0.42, y:0.0}
//!   cp1 = P(i+1).transitions.in or default {x:0.58, y:1.0}
//! - Outside the keyed range the track holds its end values.

use crate::data::{Keypoint, MotionTrack};
use crate::interp::{bezier_ease_t, lerp_f32};

const DEFAULT_OUT_X: f32 = 0.42;
const DEFAULT_OUT_Y: f32 = 0.0;
const DEFAULT_IN_X: f32 = 0.58;
const DEFAULT_IN_Y: f32 = 1.0;

/// Find the segment [i, i+1] that contains normalized time u, and return
/// (i, i+1, local_t) with local_t normalized between the two stamps.
/// Edge cases mirror `interp::piecewise_segment`: ends clamp to the boundary
/// keypoint.
fn find_segment(points: &[Keypoint], u: f32) -> (usize, usize, f32) {
    let n = points.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if n == 1 || u <= points[0].stamp {
        return (0, 0, 0.0);
    }
    if u >= points[n - 1].stamp {
        return (n - 1, n - 1, 0.0);
    }
    for i in 0..(n - 1) {
        let t0 = points[i].stamp;
        let t1 = points[i + 1].stamp;
        if u >= t0 && u <= t1 {
            let denom = (t1 - t0).max(f32::EPSILON);
            let lt = (u - t0) / denom;
            return (i, i + 1, lt.clamp(0.0, 1.0));
        }
    }
    (n - 1, n - 1, 0.0)
}

/// Sample a single track at normalized time u in [0,1].
/// An empty track samples to 0.0 (fail-soft); the motion player skips empty
/// tracks so this value never reaches a parameter.
pub fn sample_track(track: &MotionTrack, u: f32) -> f32 {
    let points = &track.points;
    match points.len() {
        0 => 0.0,
        1 => points[0].value,
        _ => {
            let (i0, i1, lt) = find_segment(points, u.clamp(0.0, 1.0));
            if i0 == i1 {
                return points[i0].value;
            }
            let left = &points[i0];
            let right = &points[i1];

            // Derive per-segment cubic-bezier control points from keypoint transitions.
            let (x1, y1) = left
                .transitions
                .as_ref()
                .and_then(|t| t.r#out.as_ref())
                .map(|v| (v.x, v.y))
                .unwrap_or((DEFAULT_OUT_X, DEFAULT_OUT_Y));

            let (x2, y2) = right
                .transitions
                .as_ref()
                .and_then(|t| t.r#in.as_ref())
                .map(|v| (v.x, v.y))
                .unwrap_or((DEFAULT_IN_X, DEFAULT_IN_Y));

            let eased = bezier_ease_t(lt, x1, y1, x2, y2);
            lerp_f32(left.value, right.value, eased)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Transitions, Vec2};

    fn linear_track(keys: &[(f32, f32)]) -> MotionTrack {
        // Per-segment linear timing: left.out=(0,0), right.in=(1,1)
        let points = keys
            .iter()
            .map(|&(stamp, value)| Keypoint {
                stamp,
                value,
                transitions: Some(Transitions {
                    r#in: Some(Vec2 { x: 1.0, y: 1.0 }),
                    r#out: Some(Vec2 { x: 0.0, y: 0.0 }),
                }),
            })
            .collect();
        MotionTrack {
            param: "P".into(),
            points,
        }
    }

    #[test]
    fn linear_midpoint() {
        let t = linear_track(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!((sample_track(&t, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn holds_ends_outside_range() {
        let t = linear_track(&[(0.25, 2.0), (0.75, 4.0)]);
        assert_eq!(sample_track(&t, 0.0), 2.0);
        assert_eq!(sample_track(&t, 1.0), 4.0);
    }

    #[test]
    fn single_key_is_constant() {
        let t = MotionTrack {
            param: "P".into(),
            points: vec![Keypoint {
                stamp: 0.5,
                value: 7.0,
                transitions: None,
            }],
        };
        assert_eq!(sample_track(&t, 0.0), 7.0);
        assert_eq!(sample_track(&t, 1.0), 7.0);
    }

    #[test]
    fn default_bezier_is_near_half_at_midpoint() {
        let t = MotionTrack {
            param: "P".into(),
            points: vec![
                Keypoint {
                    stamp: 0.0,
                    value: 0.0,
                    transitions: None,
                },
                Keypoint {
                    stamp: 1.0,
                    value: 1.0,
                    transitions: None,
                },
            ],
        };
        let v = sample_track(&t, 0.5);
        assert!(v > 0.4 && v < 0.6, "ease-in-out mid expected near 0.5 got {v}");
    }
}
