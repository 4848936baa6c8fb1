use rand::{rngs::StdRng, rngs::ThreadRng, Rng, SeedableRng};
use thiserror::Error;

use crate::geometry::{Extents, Point};
use crate::tuning::Margins;

/// Source of uniformly distributed numbers for target placement
pub trait RandomSource {
    /// Uniform sample from the closed range `[low, high]`; callers pass `low <= high`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Production random source backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng>(pub R);

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::thread_rng())
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.0.gen_range(low..=high)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlacementError {
    #[error("surface {width}x{height} is smaller than the playable minimum {min_width}x{min_height}")]
    SurfaceTooSmall {
        width: f64,
        height: f64,
        min_width: f64,
        min_height: f64,
    },
}

/// Whether the current target can still be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TargetState {
    /// Proximity feedback and hit detection are live
    Armed,
    /// Reached; waiting for the next placement
    #[strum(serialize = "Hit")]
    HitPending,
}

/// The target the player is hunting for.
///
/// Only [`TargetSession::hit`] and [`TargetSession::respawn`] change its state.
#[derive(Debug)]
pub struct TargetSession<R: RandomSource> {
    position: Point,
    state: TargetState,
    margins: Margins,
    rng: R,
}

impl<R: RandomSource> TargetSession<R> {
    /// Start a session with a freshly placed, armed target
    pub fn new(bounds: Extents, margins: Margins, rng: R) -> Result<Self, PlacementError> {
        let mut session = Self {
            position: Point::OFFSCREEN,
            state: TargetState::HitPending,
            margins,
            rng,
        };
        session.respawn(bounds)?;
        Ok(session)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == TargetState::Armed
    }

    pub fn fits(&self, bounds: Extents) -> bool {
        self.margins.fits(bounds)
    }

    /// True when `p` lies inside the placement box for `bounds`
    pub fn in_placement_box(&self, p: Point, bounds: Extents) -> bool {
        p.x >= self.margins.x
            && p.x <= bounds.width - self.margins.x
            && p.y >= self.margins.y
            && p.y <= bounds.height - self.margins.y
    }

    /// Move the target somewhere new inside `bounds` and arm it.
    ///
    /// Leaves the session untouched when the surface is too small.
    pub fn respawn(&mut self, bounds: Extents) -> Result<Point, PlacementError> {
        if !self.fits(bounds) {
            let min = self.margins.min_extents();
            return Err(PlacementError::SurfaceTooSmall {
                width: bounds.width,
                height: bounds.height,
                min_width: min.width,
                min_height: min.height,
            });
        }

        let x = self
            .rng
            .uniform(self.margins.x, bounds.width - self.margins.x);
        let y = self
            .rng
            .uniform(self.margins.y, bounds.height - self.margins.y);

        self.position = Point::new(x, y);
        self.state = TargetState::Armed;
        Ok(self.position)
    }

    /// Mark the target as reached. Returns false (and does nothing) unless armed.
    pub fn hit(&mut self) -> bool {
        match self.state {
            TargetState::Armed => {
                self.state = TargetState::HitPending;
                true
            }
            TargetState::HitPending => false,
        }
    }

    pub fn distance_to(&self, point: Point) -> f64 {
        self.position.distance_to(point)
    }
}

/// Replays a fixed list of unit-interval fractions, cycling when exhausted.
///
/// Each fraction picks a spot within the requested range, so `0.0` and `1.0`
/// land exactly on the range ends.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    fractions: Vec<f64>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(fractions: Vec<f64>) -> Self {
        Self { fractions, next: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let f = match self.fractions.get(self.next) {
            Some(f) => *f,
            None => {
                self.next = 0;
                self.fractions.first().copied().unwrap_or(0.5)
            }
        };
        self.next += 1;
        low + (high - low) * f.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn scripted(fractions: &[f64]) -> ScriptedSource {
        ScriptedSource::new(fractions.to_vec())
    }

    #[test]
    fn test_new_session_is_armed_inside_margins() {
        let session =
            TargetSession::new(Extents::new(300.0, 600.0), Margins::default(), scripted(&[0.5]))
                .unwrap();
        assert_eq!(session.state(), TargetState::Armed);
        assert_eq!(session.position(), Point::new(150.0, 300.0));
    }

    #[test]
    fn test_respawn_hits_exact_range_ends() {
        let bounds = Extents::new(300.0, 600.0);
        let mut session =
            TargetSession::new(bounds, Margins::default(), scripted(&[0.0, 0.0, 1.0, 1.0]))
                .unwrap();
        assert_eq!(session.position(), Point::new(40.0, 70.0));

        let p = session.respawn(bounds).unwrap();
        assert_eq!(p, Point::new(260.0, 530.0));
    }

    #[test]
    fn test_respawn_rejects_degenerate_surfaces() {
        let mut session =
            TargetSession::new(Extents::new(300.0, 600.0), Margins::default(), scripted(&[0.5]))
                .unwrap();
        let before = session.position();
        session.hit();

        assert_matches!(
            session.respawn(Extents::new(80.0, 600.0)),
            Err(PlacementError::SurfaceTooSmall { .. })
        );
        assert_matches!(
            session.respawn(Extents::new(300.0, 140.0)),
            Err(PlacementError::SurfaceTooSmall { .. })
        );
        // failed placement leaves everything as it was
        assert_eq!(session.position(), before);
        assert_eq!(session.state(), TargetState::HitPending);

        assert_matches!(
            TargetSession::new(Extents::new(10.0, 10.0), Margins::default(), scripted(&[0.5])),
            Err(PlacementError::SurfaceTooSmall { .. })
        );
    }

    #[test]
    fn test_smallest_playable_surface() {
        let mut session =
            TargetSession::new(Extents::new(81.0, 141.0), Margins::default(), scripted(&[1.0]))
                .unwrap();
        assert_eq!(session.position(), Point::new(41.0, 71.0));
        assert!(session.respawn(Extents::new(81.0, 141.0)).is_ok());
    }

    #[test]
    fn test_hit_is_idempotent() {
        let mut session =
            TargetSession::new(Extents::new(300.0, 600.0), Margins::default(), scripted(&[0.5]))
                .unwrap();
        assert!(session.hit());
        assert_eq!(session.state(), TargetState::HitPending);
        assert!(!session.hit());
        assert_eq!(session.state(), TargetState::HitPending);
        assert!(!session.is_armed());
    }

    #[test]
    fn test_respawn_rearms() {
        let bounds = Extents::new(300.0, 600.0);
        let mut session =
            TargetSession::new(bounds, Margins::default(), scripted(&[0.5, 0.5, 0.25, 0.75]))
                .unwrap();
        session.hit();
        let p = session.respawn(bounds).unwrap();
        assert!(session.is_armed());
        assert_eq!(p, Point::new(95.0, 415.0));
    }

    #[test]
    fn test_respawn_always_within_margin_box() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = TargetSession::new(
            Extents::new(300.0, 600.0),
            Margins::default(),
            RngSource::seeded(42),
        )
        .unwrap();

        for _ in 0..1000 {
            let bounds = Extents::new(rng.gen_range(80.001..4000.0), rng.gen_range(140.001..4000.0));
            let p = session.respawn(bounds).unwrap();
            assert!(p.x >= 40.0 && p.x <= bounds.width - 40.0, "x={} bounds={:?}", p.x, bounds);
            assert!(p.y >= 70.0 && p.y <= bounds.height - 70.0, "y={} bounds={:?}", p.y, bounds);
            assert!(session.in_placement_box(p, bounds));
        }
    }

    #[test]
    fn test_seeded_sources_are_reproducible() {
        let bounds = Extents::new(500.0, 500.0);
        let a = TargetSession::new(bounds, Margins::default(), RngSource::seeded(3)).unwrap();
        let b = TargetSession::new(bounds, Margins::default(), RngSource::seeded(3)).unwrap();
        assert_eq!(a.position(), b.position());
    }

    #[test]
    fn test_distance_to_is_pure() {
        let session =
            TargetSession::new(Extents::new(300.0, 600.0), Margins::default(), scripted(&[0.5]))
                .unwrap();
        assert_eq!(session.distance_to(Point::new(150.0, 200.0)), 100.0);
        assert_eq!(session.distance_to(Point::new(150.0, 200.0)), 100.0);
        assert!(session.is_armed());
    }

    #[test]
    fn test_target_state_display() {
        assert_eq!(TargetState::Armed.to_string(), "Armed");
        assert_eq!(TargetState::HitPending.to_string(), "Hit");
    }
}
