//! Uniform state for the noise-gradient background.
//!
//! `GradientState` owns everything the fragment program reads. It has no GL
//! handles so it can be stepped, resized and inspected without a context.

pub mod noise;
pub mod shader;
pub mod stars;

use glam::{Vec2, Vec3};

use crate::config::{GradientConfig, Palette};
use crate::error::EffectResult;

pub use stars::{Star, StarField};

/// Value the time uniform starts from.
pub const INITIAL_TIME: f64 = 1.0;

/// Where the noise offset wants to be at `time`.
pub fn target_offset(time: f64) -> Vec2 {
    let ts = time * 0.05;
    Vec2::new(
        ((ts * 1.3).sin() * (ts * 0.8).cos() * 2.0) as f32,
        ((ts * 1.3).cos() * (ts * 0.9).sin() * 2.0) as f32,
    )
}

#[derive(Clone, Debug)]
pub struct GradientState {
    /// Kept in f64 so the per-frame step survives long sessions; narrowed on upload.
    pub time: f64,
    pub resolution: Vec2,
    pub pointer: Vec2,
    pub noise_offset: Vec2,
    pub seed: f32,
    time_step: f64,
    smoothing: f32,
    palettes: Vec<Palette>,
    palette_index: usize,
}

impl GradientState {
    pub fn new(config: &GradientConfig, seed: f32, width: f32, height: f32) -> EffectResult<Self> {
        config.validate()?;
        Ok(Self {
            time: INITIAL_TIME,
            resolution: Vec2::new(width, height),
            pointer: Vec2::splat(0.5),
            noise_offset: Vec2::ZERO,
            seed,
            time_step: config.time_step,
            smoothing: config.smoothing,
            palettes: config.palettes()?,
            palette_index: 0,
        })
    }

    /// Advance one frame: bump time and ease the noise offset toward its target.
    pub fn tick(&mut self) {
        self.time += self.time_step;
        self.smooth_toward(target_offset(self.time));
    }

    pub fn smooth_toward(&mut self, target: Vec2) {
        self.noise_offset = self.noise_offset.lerp(target, self.smoothing);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.resolution = Vec2::new(width, height);
    }

    /// Map a client-space pointer position into [0,1]² with Y pointing up.
    pub fn pointer_move(&mut self, client_x: f32, client_y: f32) {
        if self.resolution.x <= 0.0 || self.resolution.y <= 0.0 {
            return;
        }
        self.pointer = Vec2::new(
            client_x / self.resolution.x,
            1.0 - client_y / self.resolution.y,
        );
    }

    /// Switch to the next palette, wrapping at the end of the list.
    pub fn cycle_palette(&mut self) -> usize {
        self.palette_index = (self.palette_index + 1) % self.palettes.len();
        self.palette_index
    }

    pub fn palette(&self) -> &Palette {
        &self.palettes[self.palette_index]
    }

    pub fn colors(&self) -> [Vec3; 4] {
        self.palette().0
    }
}
