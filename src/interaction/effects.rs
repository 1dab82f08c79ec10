use crate::controller::transition::ease_out_quad;
use glam::Vec3;
use rand::Rng;

const BURST_PARTICLES: usize = 20;
const BURST_LIFETIME: f32 = 1.5;
const PARTICLE_RADIUS: f32 = 0.02;
const RIPPLE_LIFETIME: f32 = 0.5;
const RIPPLE_COLOR: [f32; 3] = [0.29, 0.565, 0.886];

#[derive(Debug, Clone, Copy)]
struct Particle {
    start: Vec3,
    end: Vec3,
    color: [f32; 3],
    age: f32,
}

#[derive(Debug, Clone, Copy)]
struct Ripple {
    center: Vec3,
    right: Vec3,
    up: Vec3,
    age: f32,
}

/// Renderable snapshot of one burst particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSprite {
    pub position: Vec3,
    pub radius: f32,
    pub color: [f32; 4],
}

/// Renderable snapshot of one ripple ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleRing {
    pub center: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub inner: f32,
    pub outer: f32,
    pub color: [f32; 4],
}

/// Short-lived cosmetic feedback for clicks. Nothing reads it back.
#[derive(Debug, Default)]
pub struct EffectSystem {
    particles: Vec<Particle>,
    ripples: Vec<Ripple>,
}

impl EffectSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scatters a burst of coloured particles around `point`.
    pub fn spawn_burst(&mut self, point: Vec3) {
        let mut rng = rand::thread_rng();
        for _ in 0..BURST_PARTICLES {
            let start = point
                + Vec3::new(
                    rng.gen_range(-0.25..0.25),
                    rng.gen_range(-0.25..0.25),
                    rng.gen_range(-0.25..0.25),
                );
            let end = start
                + Vec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(0.0..2.0),
                );
            self.particles.push(Particle {
                start,
                end,
                color: hsl_to_rgb(rng.gen_range(0.0..1.0), 0.7, 0.6),
                age: 0.0,
            });
        }
    }

    /// Expanding ring at `point`, facing the viewer.
    pub fn spawn_ripple(&mut self, point: Vec3, right: Vec3, up: Vec3) {
        self.ripples.push(Ripple {
            center: point,
            right,
            up,
            age: 0.0,
        });
    }

    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for particle in &mut self.particles {
            particle.age += dt;
        }
        for ripple in &mut self.ripples {
            ripple.age += dt;
        }
        self.particles.retain(|particle| particle.age < BURST_LIFETIME);
        self.ripples.retain(|ripple| ripple.age < RIPPLE_LIFETIME);
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.ripples.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.ripples.clear();
    }

    pub fn particles(&self) -> impl Iterator<Item = ParticleSprite> + '_ {
        self.particles.iter().map(|particle| {
            let t = ease_out_quad(particle.age / BURST_LIFETIME);
            ParticleSprite {
                position: particle.start.lerp(particle.end, t),
                radius: PARTICLE_RADIUS,
                color: [
                    particle.color[0],
                    particle.color[1],
                    particle.color[2],
                    0.8 * (1.0 - t),
                ],
            }
        })
    }

    pub fn ripples(&self) -> impl Iterator<Item = RippleRing> + '_ {
        self.ripples.iter().map(|ripple| {
            let t = ease_out_quad(ripple.age / RIPPLE_LIFETIME);
            let scale = 1.0 + 2.0 * t;
            RippleRing {
                center: ripple.center,
                right: ripple.right,
                up: ripple.up,
                inner: 0.1 * scale,
                outer: 0.3 * scale,
                color: [RIPPLE_COLOR[0], RIPPLE_COLOR[1], RIPPLE_COLOR[2], 0.8 * (1.0 - t)],
            }
        })
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_spawns_twenty_and_expires() {
        let mut effects = EffectSystem::new();
        effects.spawn_burst(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(effects.particles().count(), 20);
        for sprite in effects.particles() {
            assert!((sprite.position - Vec3::new(1.0, 2.0, 3.0)).abs().max_element() <= 0.25);
            assert!((sprite.color[3] - 0.8).abs() < 1e-6);
        }
        effects.update(1.0);
        assert_eq!(effects.particles().count(), 20);
        assert!(effects.particles().all(|sprite| sprite.color[3] < 0.8));
        effects.update(0.6);
        assert!(effects.is_empty());
    }

    #[test]
    fn ripple_grows_and_fades() {
        let mut effects = EffectSystem::new();
        effects.spawn_ripple(Vec3::ZERO, Vec3::X, Vec3::Z);
        let first = effects.ripples().next().unwrap();
        effects.update(0.25);
        let later = effects.ripples().next().unwrap();
        assert!(later.outer > first.outer);
        assert!(later.color[3] < first.color[3]);
        effects.update(0.3);
        assert_eq!(effects.ripples().count(), 0);
    }

    #[test]
    fn hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6 && red[2].abs() < 1e-6);
        let grey = hsl_to_rgb(0.3, 0.0, 0.25);
        assert!(grey.iter().all(|c| (c - 0.25).abs() < 1e-6));
    }
}
