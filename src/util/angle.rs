//! Angle helpers shared by movement, AI, rendering and interpolation.

use std::f32::consts::{PI, TAU};

/// Wrap an angle into `(-π, π]`
pub fn wrap(angle: f32) -> f32 {
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    a
}

/// Signed shortest difference `to - from`, in `(-π, π]`
#[inline]
pub fn delta(from: f32, to: f32) -> f32 {
    wrap(to - from)
}

/// Blend `from` toward `to` along the shortest arc
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + delta(from, to) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_range() {
        for raw in [-10.0f32, -PI, -1.0, 0.0, 1.0, PI, 4.0, 13.0] {
            let w = wrap(raw);
            assert!(w > -PI - 1e-5 && w <= PI + 1e-5, "{} wrapped to {}", raw, w);
            assert!((w.sin() - raw.sin()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_lerp_takes_short_arc() {
        // 3.0 -> -3.0 is 0.28 rad through π, not 6 rad the long way round
        let mid = lerp(3.0, -3.0, 0.5);
        assert!((wrap(mid).abs() - PI).abs() < 0.01, "got {}", mid);
    }

    #[test]
    fn test_delta_sign() {
        assert!(delta(0.0, 0.5) > 0.0);
        assert!(delta(0.5, 0.0) < 0.0);
    }
}
