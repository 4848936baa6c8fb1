use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::Extents;

/// Pointer distance (surface units) below which the target counts as reached
pub const HIT_RADIUS: f64 = 30.0;
/// Weakest proximity pulse; keeps feedback perceptible at the far edge
pub const INTENSITY_FLOOR: f64 = 0.16;
/// Delay from a hit to the confirmation cue, so the consumed marker renders first
pub const SUCCESS_DELAY_SECS: f64 = 0.1;
/// Delay from a hit to the next target placement
pub const RESPAWN_DELAY_SECS: f64 = 0.7;
/// Length of one proximity pulse
pub const PULSE_DURATION_SECS: f64 = 0.1;
/// Horizontal keep-out from the surface edge for target placement
pub const MARGIN_X: f64 = 40.0;
/// Vertical keep-out from the surface edge for target placement
pub const MARGIN_Y: f64 = 70.0;

/// Placement keep-out on each side of the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub x: f64,
    pub y: f64,
}

impl Margins {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Largest surface that still leaves no room to place a target
    pub fn min_extents(&self) -> Extents {
        Extents::new(self.x * 2.0, self.y * 2.0)
    }

    /// Whether `bounds` leaves a non-degenerate placement box
    pub fn fits(&self, bounds: Extents) -> bool {
        let min = self.min_extents();
        bounds.width > min.width && bounds.height > min.height
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::new(MARGIN_X, MARGIN_Y)
    }
}

/// Game feel knobs, persisted as part of the config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub hit_radius: f64,
    pub intensity_floor: f64,
    pub success_delay_secs: f64,
    pub respawn_delay_secs: f64,
    pub pulse_duration_secs: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hit_radius: HIT_RADIUS,
            intensity_floor: INTENSITY_FLOOR,
            success_delay_secs: SUCCESS_DELAY_SECS,
            respawn_delay_secs: RESPAWN_DELAY_SECS,
            pulse_duration_secs: PULSE_DURATION_SECS,
            margin_x: MARGIN_X,
            margin_y: MARGIN_Y,
        }
    }
}

impl Tuning {
    pub fn margins(&self) -> Margins {
        Margins::new(self.margin_x, self.margin_y)
    }

    pub fn success_delay(&self) -> Duration {
        secs(self.success_delay_secs)
    }

    pub fn respawn_delay(&self) -> Duration {
        secs(self.respawn_delay_secs)
    }

    pub fn pulse_duration(&self) -> Duration {
        secs(self.pulse_duration_secs)
    }

    /// Replace values a hand-edited config file can push out of range.
    ///
    /// Non-finite or negative values fall back to the defaults; the
    /// intensity floor is clamped into `[0, 1]`.
    pub fn sanitized(self) -> Self {
        let d = Tuning::default();
        let floor = match checked("intensity_floor", self.intensity_floor, d.intensity_floor) {
            f if f > 1.0 => {
                log::warn!("intensity_floor {f} clamped to 1");
                1.0
            }
            f => f,
        };
        Self {
            hit_radius: checked("hit_radius", self.hit_radius, d.hit_radius),
            intensity_floor: floor,
            success_delay_secs: checked(
                "success_delay_secs",
                self.success_delay_secs,
                d.success_delay_secs,
            ),
            respawn_delay_secs: checked(
                "respawn_delay_secs",
                self.respawn_delay_secs,
                d.respawn_delay_secs,
            ),
            pulse_duration_secs: checked(
                "pulse_duration_secs",
                self.pulse_duration_secs,
                d.pulse_duration_secs,
            ),
            margin_x: checked("margin_x", self.margin_x, d.margin_x),
            margin_y: checked("margin_y", self.margin_y, d.margin_y),
        }
    }
}

fn checked(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("{name} {value} out of range, using {default}");
        default
    }
}

// Negative or NaN values from a hand-edited config collapse to zero.
fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_matches_constants() {
        let t = Tuning::default();
        assert_eq!(t.hit_radius, 30.0);
        assert_eq!(t.intensity_floor, 0.16);
        assert!((t.success_delay().as_secs_f64() - 0.1).abs() < 1e-9);
        assert!((t.respawn_delay().as_secs_f64() - 0.7).abs() < 1e-9);
        assert!((t.pulse_duration().as_secs_f64() - 0.1).abs() < 1e-9);
        assert_eq!(t.margins(), Margins::new(40.0, 70.0));
    }

    #[test]
    fn test_bad_delays_collapse_to_zero() {
        let t = Tuning {
            success_delay_secs: -1.0,
            respawn_delay_secs: f64::NAN,
            ..Tuning::default()
        };
        assert_eq!(t.success_delay(), Duration::ZERO);
        assert_eq!(t.respawn_delay(), Duration::ZERO);
    }

    #[test]
    fn test_sanitized_repairs_out_of_range_values() {
        let t = Tuning {
            hit_radius: f64::NAN,
            intensity_floor: 1.5,
            respawn_delay_secs: -0.7,
            margin_x: f64::INFINITY,
            ..Tuning::default()
        }
        .sanitized();
        assert_eq!(t.hit_radius, HIT_RADIUS);
        assert_eq!(t.intensity_floor, 1.0);
        assert_eq!(t.respawn_delay_secs, RESPAWN_DELAY_SECS);
        assert_eq!(t.margin_x, MARGIN_X);
        assert_eq!(t.margin_y, MARGIN_Y);

        let floor = Tuning {
            intensity_floor: f64::NEG_INFINITY,
            ..Tuning::default()
        }
        .sanitized()
        .intensity_floor;
        assert_eq!(floor, INTENSITY_FLOOR);
    }

    #[test]
    fn test_sanitized_keeps_valid_tuning() {
        let t = Tuning {
            hit_radius: 12.0,
            intensity_floor: 0.0,
            ..Tuning::default()
        };
        assert_eq!(t.sanitized(), t);
    }

    #[test]
    fn test_margins_fit_strictly_larger_surfaces() {
        let m = Margins::default();
        assert_eq!(m.min_extents(), Extents::new(80.0, 140.0));
        assert!(m.fits(Extents::new(81.0, 141.0)));
        assert!(!m.fits(Extents::new(80.0, 600.0)));
        assert!(!m.fits(Extents::new(300.0, 140.0)));
    }

    #[test]
    fn test_partial_tuning_deserializes_with_defaults() {
        let t: Tuning = serde_json::from_str(r#"{ "hit_radius": 12.5 }"#).unwrap();
        assert_eq!(t.hit_radius, 12.5);
        assert_eq!(t.margin_y, MARGIN_Y);
    }
}
