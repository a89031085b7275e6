//! Easing curves.
//!
//! Every curve maps `[0, 1]` onto `[0, 1]`, is continuous and
//! non-decreasing, and hits both endpoints exactly. Inputs outside the unit
//! interval are clamped.

use std::f64::consts::PI;
use std::str::FromStr;

use glider_common::error::GliderError;
use serde::{Deserialize, Serialize};

/// Shape of the interpolation between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingKind {
    Linear = 1,
    Quadratic = 2,
    Sinusoidal = 3,
    Cubic = 4,
    Exponential = 5,
}

impl EasingKind {
    pub const ALL: [EasingKind; 5] = [
        EasingKind::Linear,
        EasingKind::Quadratic,
        EasingKind::Sinusoidal,
        EasingKind::Cubic,
        EasingKind::Exponential,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EasingKind::Linear => "linear",
            EasingKind::Quadratic => "quadratic",
            EasingKind::Sinusoidal => "sinusoidal",
            EasingKind::Cubic => "cubic",
            EasingKind::Exponential => "exponential",
        }
    }

    /// Evaluate the curve at `t`.
    pub fn apply(self, t: f64) -> f64 {
        ease(self, t)
    }
}

impl TryFrom<i32> for EasingKind {
    type Error = GliderError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(EasingKind::Linear),
            2 => Ok(EasingKind::Quadratic),
            3 => Ok(EasingKind::Sinusoidal),
            4 => Ok(EasingKind::Cubic),
            5 => Ok(EasingKind::Exponential),
            other => Err(GliderError::validation(
                "easing",
                format!("expected an id in 1..=5, got {other}"),
            )),
        }
    }
}

impl FromStr for EasingKind {
    type Err = GliderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if let Some(kind) = EasingKind::ALL.iter().find(|k| k.name() == needle) {
            return Ok(*kind);
        }
        match needle.parse::<i32>() {
            Ok(id) => EasingKind::try_from(id),
            Err(_) => Err(GliderError::validation(
                "easing",
                format!("unknown easing '{s}'"),
            )),
        }
    }
}

impl std::fmt::Display for EasingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of exponential ease-in-out just inside the endpoints, used to
/// renormalise the curve so it is continuous at 0 and 1.
const EXPO_EDGE: f64 = 1.0 / 2048.0;

/// Evaluate an easing curve.
pub fn ease(kind: EasingKind, t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let v = match kind {
        EasingKind::Linear => t,
        EasingKind::Quadratic => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
            }
        }
        EasingKind::Sinusoidal => -((PI * t).cos() - 1.0) / 2.0,
        EasingKind::Cubic => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
        EasingKind::Exponential => {
            let raw = if t < 0.5 {
                2f64.powf(20.0 * t - 10.0) / 2.0
            } else {
                (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
            };
            (raw - EXPO_EDGE) / (1.0 - 2.0 * EXPO_EDGE)
        }
    };
    v.clamp(0.0, 1.0)
}

/// Easing curve blended with linear by `strength` (1..=100).
///
/// At full strength this is the configured curve; at the bottom of the range
/// it is almost a straight line. Duration is not affected.
pub fn shaped(kind: EasingKind, strength: u8, t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let s = f64::from(strength.min(100)) / 100.0;
    let f = ease(kind, t);
    (t + (f - t) * s).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_endpoints_exact() {
        for kind in EasingKind::ALL {
            assert_eq!(ease(kind, 0.0), 0.0, "{kind} at 0");
            assert_eq!(ease(kind, 1.0), 1.0, "{kind} at 1");
        }
    }

    #[test]
    fn test_midpoint_symmetry() {
        for kind in EasingKind::ALL {
            assert!((ease(kind, 0.5) - 0.5).abs() < 1e-12, "{kind} at 0.5");
        }
    }

    #[test]
    fn test_known_values() {
        assert!((ease(EasingKind::Quadratic, 0.25) - 0.125).abs() < 1e-12);
        assert!((ease(EasingKind::Cubic, 0.25) - 0.0625).abs() < 1e-12);
        assert!((ease(EasingKind::Quadratic, 0.75) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_exponential_is_continuous_at_edges() {
        assert!(ease(EasingKind::Exponential, 1e-9) < 1e-6);
        assert!(ease(EasingKind::Exponential, 1.0 - 1e-9) > 1.0 - 1e-6);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(ease(EasingKind::Cubic, -3.0), 0.0);
        assert_eq!(ease(EasingKind::Cubic, 7.0), 1.0);
        assert_eq!(ease(EasingKind::Cubic, f64::NAN), 0.0);
    }

    #[test]
    fn test_strength_blends_toward_linear() {
        let weak = shaped(EasingKind::Cubic, 1, 0.25);
        let strong = shaped(EasingKind::Cubic, 100, 0.25);
        assert!((strong - ease(EasingKind::Cubic, 0.25)).abs() < 1e-12);
        assert!((weak - 0.25).abs() < 0.01);
        assert_eq!(shaped(EasingKind::Linear, 40, 0.3), 0.3);
    }

    #[test]
    fn test_ids_and_names() {
        assert_eq!(EasingKind::try_from(3).unwrap(), EasingKind::Sinusoidal);
        assert!(EasingKind::try_from(6).unwrap_err().is_validation());
        assert!(EasingKind::try_from(0).is_err());
        assert_eq!("cubic".parse::<EasingKind>().unwrap(), EasingKind::Cubic);
        assert_eq!("5".parse::<EasingKind>().unwrap(), EasingKind::Exponential);
        assert!("bounce".parse::<EasingKind>().is_err());
    }

    fn any_kind() -> impl Strategy<Value = EasingKind> {
        prop::sample::select(EasingKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_monotonic(kind in any_kind(), a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ease(kind, hi) + 1e-12 >= ease(kind, lo));
        }

        #[test]
        fn prop_in_unit_range(kind in any_kind(), t in -1.0f64..2.0) {
            let v = ease(kind, t);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_shaped_monotonic(
            kind in any_kind(),
            strength in 1u8..=100,
            a in 0.0f64..=1.0,
            b in 0.0f64..=1.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(shaped(kind, strength, hi) + 1e-12 >= shaped(kind, strength, lo));
            prop_assert_eq!(shaped(kind, strength, 0.0), 0.0);
            prop_assert_eq!(shaped(kind, strength, 1.0), 1.0);
        }
    }
}
