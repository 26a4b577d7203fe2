//! Decorative leaf particles floating over the visualizer.
//!
//! Two kinds live in the field: a fixed handful of ambient leaves that drift
//! forever, and burst leaves spawned while the music is intense. Burst leaves
//! carry an expiry and are swept each frame, so nothing outlives its
//! animation.

use rand::Rng;
use std::time::{Duration, Instant};

use crate::constants::EARTH_COLORS;

/// Cycle length of an ambient leaf's float animation
const AMBIENT_CYCLE: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Horizontal position, percent of the visualizer width
    pub x_percent: f32,
    /// Size in pixels; the terminal renderer maps it to a glyph
    pub size: f32,
    pub color: (u8, u8, u8),
    pub born: Instant,
    /// `None` for ambient leaves, which loop instead of expiring
    pub lifetime: Option<Duration>,
    /// Phase delay before an ambient leaf's first cycle
    pub delay: Duration,
}

impl Particle {
    pub fn expires_at(&self) -> Option<Instant> {
        self.lifetime.map(|lifetime| self.born + lifetime)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at().is_some_and(|expiry| now >= expiry)
    }

    /// Animation progress in 0.0..=1.0; 0 at the bottom, 1 at the top.
    pub fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.born);
        match self.lifetime {
            Some(lifetime) => {
                (elapsed.as_secs_f32() / lifetime.as_secs_f32().max(f32::EPSILON)).min(1.0)
            }
            None => {
                let Some(running) = elapsed.checked_sub(self.delay) else {
                    return 0.0;
                };
                (running.as_secs_f32() % AMBIENT_CYCLE.as_secs_f32()) / AMBIENT_CYCLE.as_secs_f32()
            }
        }
    }

    /// Horizontal sway while floating, in percent of the width.
    pub fn drift(&self, now: Instant) -> f32 {
        (self.progress(now) * std::f32::consts::TAU).sin() * 3.0
    }
}

pub fn random_earth_color<R: Rng + ?Sized>(rng: &mut R) -> (u8, u8, u8) {
    EARTH_COLORS[rng.random_range(0..EARTH_COLORS.len())]
}

pub struct ParticleField {
    particles: Vec<Particle>,
    spawn_probability: f64,
}

impl ParticleField {
    pub fn new(spawn_probability: f64) -> Self {
        Self {
            particles: Vec::new(),
            spawn_probability: spawn_probability.clamp(0.0, 1.0),
        }
    }

    /// Scatter the ambient leaves that drift regardless of the audio.
    pub fn seed_ambient<R: Rng + ?Sized>(&mut self, count: usize, now: Instant, rng: &mut R) {
        for _ in 0..count {
            self.particles.push(Particle {
                x_percent: rng.random_range(0.0..100.0),
                size: 8.0,
                color: random_earth_color(rng),
                born: now,
                lifetime: None,
                delay: Duration::from_secs_f32(rng.random_range(0.0..2.0)),
            });
        }
    }

    /// Roll for a burst leaf; returns true when one was spawned.
    pub fn maybe_spawn<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> bool {
        if rng.random::<f64>() >= self.spawn_probability {
            return false;
        }

        let particle = Particle {
            x_percent: rng.random_range(0.0..100.0),
            size: rng.random_range(6.0..10.0),
            color: random_earth_color(rng),
            born: now,
            lifetime: Some(Duration::from_secs_f32(rng.random_range(1.0..3.0))),
            delay: Duration::ZERO,
        };
        log::debug!(
            "Spawned particle at {:.1}% living {:?}",
            particle.x_percent,
            particle.lifetime
        );
        self.particles.push(particle);
        true
    }

    /// Drop every burst leaf whose animation has finished.
    pub fn sweep(&mut self, now: Instant) {
        self.particles.retain(|p| !p.is_expired(now));
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn burst_count(&self) -> usize {
        self.particles.iter().filter(|p| p.lifetime.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_spawn_probability_zero_never_spawns() {
        let mut field = ParticleField::new(0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        for _ in 0..1000 {
            assert!(!field.maybe_spawn(now, &mut rng));
        }
        assert!(field.is_empty());
    }

    #[test]
    fn test_spawn_probability_one_always_spawns() {
        let mut field = ParticleField::new(1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        for _ in 0..10 {
            assert!(field.maybe_spawn(now, &mut rng));
        }
        assert_eq!(field.burst_count(), 10);
    }

    #[test]
    fn test_spawn_rate_is_roughly_the_probability() {
        let mut field = ParticleField::new(0.2);
        let mut rng = StdRng::seed_from_u64(42);
        let now = Instant::now();

        let spawned = (0..10_000).filter(|_| field.maybe_spawn(now, &mut rng)).count();
        assert!((1700..2300).contains(&spawned), "spawned {spawned}");
    }

    #[test]
    fn test_burst_particle_attributes() {
        let mut field = ParticleField::new(1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let now = Instant::now();
        field.maybe_spawn(now, &mut rng);

        let particle = &field.particles()[0];
        assert!((0.0..100.0).contains(&particle.x_percent));
        assert!((6.0..10.0).contains(&particle.size));
        assert!(EARTH_COLORS.contains(&particle.color));
        let lifetime = particle.lifetime.unwrap();
        assert!(lifetime >= Duration::from_secs(1) && lifetime < Duration::from_secs(3));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let mut field = ParticleField::new(1.0);
        let mut rng = StdRng::seed_from_u64(11);
        let now = Instant::now();

        field.seed_ambient(12, now, &mut rng);
        for _ in 0..5 {
            field.maybe_spawn(now, &mut rng);
        }
        assert_eq!(field.len(), 17);

        field.sweep(now + Duration::from_millis(500));
        assert_eq!(field.burst_count(), 5);

        field.sweep(now + Duration::from_secs(3));
        assert_eq!(field.burst_count(), 0);
        assert_eq!(field.len(), 12);
    }

    #[test]
    fn test_progress() {
        let now = Instant::now();
        let particle = Particle {
            x_percent: 50.0,
            size: 8.0,
            color: EARTH_COLORS[0],
            born: now,
            lifetime: Some(Duration::from_secs(2)),
            delay: Duration::ZERO,
        };

        assert_eq!(particle.progress(now), 0.0);
        assert!((particle.progress(now + Duration::from_secs(1)) - 0.5).abs() < 1e-4);
        assert_eq!(particle.progress(now + Duration::from_secs(5)), 1.0);

        let ambient = Particle {
            lifetime: None,
            delay: Duration::from_secs(1),
            ..particle
        };
        assert_eq!(ambient.progress(now + Duration::from_millis(500)), 0.0);
        assert!(!ambient.is_expired(now + Duration::from_secs(3600)));
    }
}
