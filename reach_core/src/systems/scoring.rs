use glam::Vec2;

use crate::params::Params;

/// Score for a normalised end-point error. Full marks inside the error
/// ellipse, exponential decay outside it.
pub fn score_from_error(error: f32, slope: f32) -> i32 {
    if error < 1.0 {
        Params::FULL_SCORE
    } else {
        (Params::FULL_SCORE as f32 * (-(error - 1.0) * slope).exp()).round() as i32
    }
}

/// Squared end-point error per axis, scaled by twice the target variance.
/// Cursor size does not enter.
pub fn end_error(cursor: Vec2, target: Vec2, target_size: Vec2) -> f32 {
    let d = cursor - target;
    let denom = 2.0 * target_size * target_size;
    (d * d / denom).element_sum()
}

/// End-of-trial score for a click at `cursor`
pub fn compute_end_score(cursor: Vec2, target: Vec2, target_size: Vec2, slope: f32) -> i32 {
    score_from_error(end_error(cursor, target, target_size), slope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_at_reference_errors() {
        let slope = Params::SCORE_SLOPE;
        assert_eq!(score_from_error(0.0, slope), 100);
        assert_eq!(score_from_error(0.99, slope), 100);
        assert_eq!(score_from_error(1.0, slope), 100);
        assert_eq!(score_from_error(2.0, slope), 82);
        assert_eq!(score_from_error(6.0, slope), 37);
    }

    #[test]
    fn test_score_decreases_with_error() {
        let mut last = score_from_error(1.0, 0.2);
        for i in 1..100 {
            let s = score_from_error(1.0 + i as f32, 0.2);
            assert!(s <= last, "Monotonic decay");
            last = s;
        }
        assert_eq!(last, 0, "Far misses score nothing");
    }

    #[test]
    fn test_end_error_scales_by_target_size() {
        let target = Vec2::new(0.0, 240.0);
        let size = Vec2::new(10.0, 10.0);
        assert_eq!(end_error(target, target, size), 0.0);
        // One axis off by 20 px: 400 / 200 = 2
        assert_eq!(end_error(Vec2::new(20.0, 240.0), target, size), 2.0);
        assert_eq!(compute_end_score(Vec2::new(20.0, 240.0), target, size, 0.2), 82);
        // Both axes contribute
        let wide = Vec2::new(20.0, 10.0);
        assert_eq!(end_error(Vec2::new(20.0, 250.0), target, wide), 0.5 + 0.5);
    }

    #[test]
    fn test_hit_inside_ellipse_scores_full() {
        let target = Vec2::new(0.0, 240.0);
        let size = Vec2::new(10.0, 10.0);
        assert_eq!(compute_end_score(Vec2::new(7.0, 245.0), target, size, 0.2), 100);
    }
}
