use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::TAU;

use crate::geometry::{Extents, Point};

const SYMBOLS: [char; 6] = ['*', '+', '✦', '•', '·', 'o'];

/// Particle for the hit burst, in surface units
#[derive(Debug, Clone)]
pub struct BurstParticle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl BurstParticle {
    fn new<R: Rng>(origin: Point, rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..TAU);
        let speed = rng.gen_range(60.0..180.0);

        Self {
            x: origin.x,
            y: origin.y,
            vel_x: angle.cos() * speed,
            vel_y: angle.sin() * speed,
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(0.4..0.9),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        // surface y grows downwards, so gravity pulls towards larger y
        self.vel_y += 240.0 * dt;
        self.vel_x *= 0.9;

        self.age += dt;
        self.age < self.max_age
    }

    /// Remaining life in `[0, 1]`, used for fading
    pub fn alpha(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Short particle spray drawn where the target was hit
#[derive(Debug)]
pub struct HitBurst {
    pub particles: Vec<BurstParticle>,
    pub origin: Point,
    pub elapsed: f64,
    pub duration: f64, // seconds
    pub is_active: bool,
    pub extents: Extents,
}

impl HitBurst {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            origin: Point::OFFSCREEN,
            elapsed: 0.0,
            duration: 1.0,
            is_active: false,
            extents: Extents::default(),
        }
    }

    pub fn start(&mut self, origin: Point, extents: Extents) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.origin = origin;
        self.elapsed = 0.0;
        self.is_active = true;
        self.extents = extents;

        for _ in 0..24 {
            self.particles.push(BurstParticle::new(origin, &mut rng));
        }
    }

    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }

        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let buffer = 20.0;
        let (width, height) = (self.extents.width, self.extents.height);
        self.particles.retain_mut(|particle| {
            let still_alive = particle.update(dt);
            let off_screen = particle.x < -buffer
                || particle.y < -buffer
                || particle.x > width + buffer
                || particle.y > height + buffer;
            still_alive && !off_screen
        });

        if self.particles.is_empty() {
            self.is_active = false;
        }
    }
}

impl Default for HitBurst {
    fn default() -> Self {
        Self::new()
    }
}
