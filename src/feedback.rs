use std::time::Duration;

use crate::geometry::{Extents, Point};
use crate::haptics::{HapticEvent, HapticSink, SuccessSignal};
use crate::scheduler::Scheduler;
use crate::target::{PlacementError, RandomSource, TargetSession, TargetState};
use crate::tuning::Tuning;

/// Where a pointer is in its gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Began,
    Changed,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub location: Point,
    pub phase: Phase,
}

impl PointerSample {
    pub fn new(location: Point, phase: Phase) -> Self {
        Self { location, phase }
    }
}

/// Map a distance to a haptic strength: linear falloff towards `max_distance`,
/// never weaker than `floor`, never stronger than 1.
///
/// A floor outside `[0, 1]` is pulled back into it; a NaN floor counts as 0.
pub fn intensity(distance: f64, max_distance: f64, floor: f64) -> f64 {
    let floor = if floor.is_nan() { 0.0 } else { floor.clamp(0.0, 1.0) };
    if max_distance.is_nan() || max_distance <= 0.0 {
        return floor;
    }
    (1.0 - distance / max_distance).clamp(floor, 1.0)
}

/// What a single pointer sample produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    /// Target already consumed; only the indicator moved
    Suppressed { distance: f64 },
    /// Proximity pulse requested; `played` is false when the sink refused it
    Proximity {
        distance: f64,
        intensity: f64,
        played: bool,
    },
    /// Target reached on this sample
    Hit { distance: f64 },
}

impl Feedback {
    pub fn distance(&self) -> f64 {
        match *self {
            Feedback::Suppressed { distance }
            | Feedback::Proximity { distance, .. }
            | Feedback::Hit { distance } => distance,
        }
    }
}

/// Work deferred after a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ConfirmHit,
    Respawn,
}

/// Turns pointer samples into proximity pulses and drives the target through
/// hit and respawn.
#[derive(Debug)]
pub struct ProximityFeedbackController<H: HapticSink, S: SuccessSignal, R: RandomSource> {
    target: TargetSession<R>,
    scheduler: Scheduler<Deferred>,
    haptics: H,
    signal: S,
    tuning: Tuning,
    extents: Extents,
    indicator: Point,
    last_feedback: Option<Feedback>,
    hits: u32,
    last_hit: Option<Point>,
    respawn_blocked: bool,
}

impl<H: HapticSink, S: SuccessSignal, R: RandomSource> ProximityFeedbackController<H, S, R> {
    pub fn new(
        extents: Extents,
        tuning: Tuning,
        rng: R,
        haptics: H,
        signal: S,
    ) -> Result<Self, PlacementError> {
        let target = TargetSession::new(extents, tuning.margins(), rng)?;
        let p = target.position();
        log::info!("target placed at ({:.0}, {:.0})", p.x, p.y);

        Ok(Self {
            target,
            scheduler: Scheduler::new(),
            haptics,
            signal,
            tuning,
            extents,
            indicator: Point::OFFSCREEN,
            last_feedback: None,
            hits: 0,
            last_hit: None,
            respawn_blocked: false,
        })
    }

    /// Handle one pointer movement event
    pub fn on_sample(&mut self, sample: PointerSample, extents: Extents) -> Feedback {
        self.extents = extents;

        let distance = self.target.distance_to(sample.location);
        let intensity = intensity(
            distance,
            extents.max_distance(),
            self.tuning.intensity_floor,
        );

        self.indicator = match sample.phase {
            Phase::Began | Phase::Changed => sample.location,
            Phase::Ended => Point::OFFSCREEN,
        };

        let feedback = if !self.target.is_armed() {
            Feedback::Suppressed { distance }
        } else if distance < self.tuning.hit_radius {
            if self.target.hit() {
                self.on_hit(distance);
            }
            Feedback::Hit { distance }
        } else {
            let played = self.play_proximity(intensity);
            Feedback::Proximity {
                distance,
                intensity,
                played,
            }
        };

        self.last_feedback = Some(feedback);
        feedback
    }

    fn on_hit(&mut self, distance: f64) {
        self.hits += 1;
        let p = self.target.position();
        self.last_hit = Some(p);
        log::info!(
            "target at ({:.0}, {:.0}) hit from {:.1} away (hit #{})",
            p.x,
            p.y,
            distance,
            self.hits
        );
        self.scheduler
            .schedule(self.tuning.success_delay(), Deferred::ConfirmHit);
        self.scheduler
            .schedule(self.tuning.respawn_delay(), Deferred::Respawn);
    }

    fn play_proximity(&mut self, intensity: f64) -> bool {
        let played = HapticEvent::continuous(intensity, self.tuning.pulse_duration())
            .and_then(|event| self.haptics.play(&event));
        match played {
            Ok(()) => true,
            Err(err) => {
                log::debug!("proximity pulse skipped: {err}");
                false
            }
        }
    }

    /// Run every deferred action due at or before `now`
    pub fn advance(&mut self, now: Duration) {
        while let Some(task) = self.scheduler.pop_due(now) {
            self.run(task);
        }
        self.scheduler.advance_to(now);
    }

    fn run(&mut self, task: Deferred) {
        match task {
            Deferred::ConfirmHit => self.signal.fire(),
            Deferred::Respawn => self.respawn(),
        }
    }

    fn respawn(&mut self) {
        match self.target.respawn(self.extents) {
            Ok(p) => {
                self.respawn_blocked = false;
                log::info!("target respawned at ({:.0}, {:.0})", p.x, p.y);
            }
            Err(err) => {
                self.respawn_blocked = true;
                log::warn!("respawn postponed: {err}");
            }
        }
    }

    /// Track a new surface size; re-places the target if it no longer fits
    pub fn on_resize(&mut self, extents: Extents) {
        self.extents = extents;
        if !self.target.fits(extents) {
            return;
        }

        match self.target.state() {
            TargetState::HitPending if self.respawn_blocked => self.respawn(),
            TargetState::Armed
                if !self
                    .target
                    .in_placement_box(self.target.position(), extents) =>
            {
                log::debug!("target fell outside the resized surface");
                self.respawn();
            }
            _ => {}
        }
    }

    pub fn target(&self) -> &TargetSession<R> {
        &self.target
    }

    pub fn indicator(&self) -> Point {
        self.indicator
    }

    pub fn extents(&self) -> Extents {
        self.extents
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    pub fn haptics_mut(&mut self) -> &mut H {
        &mut self.haptics
    }

    pub fn signal(&self) -> &S {
        &self.signal
    }

    pub fn signal_mut(&mut self) -> &mut S {
        &mut self.signal
    }

    pub fn last_feedback(&self) -> Option<Feedback> {
        self.last_feedback
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    /// Where the most recent hit landed
    pub fn last_hit(&self) -> Option<Point> {
        self.last_hit
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn is_respawn_blocked(&self) -> bool {
        self.respawn_blocked
    }
}
