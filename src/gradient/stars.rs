use std::f32::consts::TAU;

use glam::Vec3;

const FLOAT_SPEED: f32 = 0.18;
const FLOAT_AMPLITUDE: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub origin: Vec3,
    pub radius: f32,
    pub phase: f32,
}

impl Star {
    /// Position and opacity at `time`.
    pub fn at(&self, time: f64) -> (Vec3, f32) {
        let phase = (time * FLOAT_SPEED as f64 + self.phase as f64) as f32;
        let drift = Vec3::new(phase.sin(), phase.cos(), phase.sin()) * FLOAT_AMPLITUDE;
        (self.origin + drift, 0.8 + phase.sin() * 0.2)
    }
}

/// Small drifting points drawn over the gradient.
#[derive(Clone, Debug, Default)]
pub struct StarField {
    stars: Vec<Star>,
}

impl StarField {
    /// `random` must yield values in [0, 1).
    pub fn generate(count: usize, max_size: f32, mut random: impl FnMut() -> f32) -> Self {
        let stars = (0..count)
            .map(|_| {
                let radius = random() * max_size;
                let origin = Vec3::new(
                    random() * 2.0 - 1.0,
                    random() * 2.0 - 1.0,
                    random() * 2.0 - 1.0,
                );
                Star {
                    origin,
                    radius,
                    phase: random() * TAU,
                }
            })
            .collect();
        Self { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Interleaved `x, y, z, size_px, alpha` per star for the point program.
    pub fn write_vertices(&self, time: f64, viewport_height: f32, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.stars.len() * 5);
        for star in &self.stars {
            let (pos, alpha) = star.at(time);
            let size = (star.radius * viewport_height).max(1.0);
            out.extend_from_slice(&[pos.x, pos.y, pos.z, size, alpha]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg(mut state: u32) -> impl FnMut() -> f32 {
        move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32
        }
    }

    #[test]
    fn generated_stars_respect_bounds() {
        let field = StarField::generate(150, 0.006, lcg(7));
        assert_eq!(field.len(), 150);
        for star in field.stars() {
            assert!(star.radius >= 0.0 && star.radius < 0.006);
            assert!(star.origin.abs().max_element() <= 1.0);
            assert!((0.0..TAU).contains(&star.phase));
        }
    }

    #[test]
    fn drift_and_blink_are_bounded() {
        let field = StarField::generate(20, 0.006, lcg(3));
        for star in field.stars() {
            for step in 0..200 {
                let (pos, alpha) = star.at(step as f64 * 0.37);
                assert!(pos.distance(star.origin) <= FLOAT_AMPLITUDE * 3f32.sqrt() + 1e-6);
                assert!((0.6 - 1e-6..=1.0 + 1e-6).contains(&alpha));
            }
        }
    }

    #[test]
    fn vertices_are_interleaved() {
        let field = StarField::generate(3, 0.006, lcg(11));
        let mut out = vec![9.0; 4];
        field.write_vertices(1.0, 1000.0, &mut out);
        assert_eq!(out.len(), 15);
        for chunk in out.chunks(5) {
            assert!(chunk[3] >= 1.0);
        }
    }
}
