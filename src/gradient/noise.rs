//! CPU mirror of the fragment program in [`super::shader`].
//!
//! The GPU is the real renderer; this copy exists so the blend chain and the
//! lattice noise can be checked on the host. Keep both in step.

use glam::{Vec2, Vec3};

use super::GradientState;

const HASH_DOT: Vec2 = Vec2::new(12.9898, 78.233);
const HASH_SCALE: f32 = 43758.5453123;
/// The noise field is halved before it reaches the blend chain.
pub const NOISE_AMPLITUDE: f32 = 0.5;
pub const DITHER: f32 = 0.05;

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Seeded lattice hash in [0, 1).
pub fn hash(p: Vec2, seed: f32) -> f32 {
    fract((p.dot(HASH_DOT)).sin() * HASH_SCALE + seed)
}

/// Bilinear value noise with smoothstep weights.
pub fn value_noise(p: Vec2, seed: f32) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let a = hash(i, seed);
    let b = hash(i + Vec2::X, seed);
    let c = hash(i + Vec2::Y, seed);
    let d = hash(i + Vec2::ONE, seed);

    let lower = a + (b - a) * u.x;
    let upper = c + (d - c) * u.x;
    lower + (upper - lower) * u.y
}

/// Position fed to the noise lookup for normalised coordinate `st`.
pub fn sample_position(st: Vec2, state: &GradientState) -> Vec2 {
    let t = state.time as f32;
    let pointer_influence = state.pointer * 0.5 - Vec2::ONE;
    let wobble = Vec2::new((t * 0.1).sin(), (t * 0.15).cos()) * 0.2;
    let pos = st * 3.0 + state.noise_offset + wobble;
    pos + pointer_influence * 0.5 * (t * 0.5).sin()
}

/// Blend the four stops by the noise scalar.
pub fn blend(colors: &[Vec3; 4], n: f32) -> Vec3 {
    let color = mix(colors[0], colors[1], n);
    let color = mix(color, colors[2], n * 0.5);
    mix(color, colors[3], n * 0.25)
}

/// Colour of the fragment at `frag_coord` (pixels, origin bottom-left).
pub fn shade(frag_coord: Vec2, state: &GradientState) -> Vec3 {
    let st = frag_coord / state.resolution;
    let n = value_noise(sample_position(st, state), state.seed) * NOISE_AMPLITUDE;
    blend(&state.colors(), n) + Vec3::splat(hash(st, state.seed) * DITHER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradientConfig;

    #[test]
    fn hash_stays_in_unit_range() {
        for i in 0..500 {
            let p = Vec2::new(i as f32 * 0.37, i as f32 * -1.13);
            let h = hash(p, 0.731);
            assert!((0.0..1.0).contains(&h), "hash {h} at {p}");
        }
    }

    #[test]
    fn noise_hits_lattice_values_at_corners() {
        let seed = 0.42;
        for p in [Vec2::new(0.0, 0.0), Vec2::new(3.0, -2.0), Vec2::new(7.0, 11.0)] {
            assert!((value_noise(p, seed) - hash(p, seed)).abs() < 1e-6);
        }
    }

    #[test]
    fn noise_is_continuous_across_cells() {
        let seed = 0.1;
        let left = value_noise(Vec2::new(1.0 - 1e-4, 0.5), seed);
        let right = value_noise(Vec2::new(1.0 + 1e-4, 0.5), seed);
        assert!((left - right).abs() < 1e-2);
    }

    #[test]
    fn seed_changes_the_field() {
        let p = Vec2::new(2.3, 4.1);
        assert_ne!(value_noise(p, 0.1), value_noise(p, 0.6));
    }

    #[test]
    fn blend_weights_are_nested() {
        let colors = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        assert_eq!(blend(&colors, 0.0), Vec3::ZERO);

        // n = 1: c1 fully, then halfway to c2, then a quarter to c3.
        let c = blend(&colors, 1.0);
        let expected = Vec3::new(0.5 * 0.75, 0.5 * 0.75, 0.25);
        assert!((c - expected).length() < 1e-6, "{c}");
    }

    #[test]
    fn shaded_output_stays_near_palette() {
        let mut state =
            crate::gradient::GradientState::new(&GradientConfig::default(), 0.5, 64.0, 48.0)
                .unwrap();
        for _ in 0..30 {
            state.tick();
        }
        for y in (0..48).step_by(7) {
            for x in (0..64).step_by(9) {
                let c = shade(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), &state);
                // darkest palette stop is 0, brightest is 0x0f plus dither
                assert!(c.min_element() >= 0.0);
                assert!(c.max_element() <= 15.0 / 255.0 + DITHER);
            }
        }
    }

    #[test]
    fn pointer_bends_the_sample_position() {
        let mut state =
            crate::gradient::GradientState::new(&GradientConfig::default(), 0.5, 100.0, 100.0)
                .unwrap();
        let st = Vec2::new(0.3, 0.6);
        let before = sample_position(st, &state);
        state.pointer = Vec2::new(1.0, 0.0);
        let after = sample_position(st, &state);
        // influence moves by (+0.25, -0.25), scaled by 0.5·sin(t·0.5)
        let bend = 0.25 * 0.5 * (state.time as f32 * 0.5).sin();
        assert!((after.x - before.x - bend).abs() < 1e-5);
        assert!((after.y - before.y + bend).abs() < 1e-5);
    }
}
