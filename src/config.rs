//! Tunables for both effects.
//!
//! Everything defaults to the values the site ships with; callers may pass a
//! partial JSON object and only override what they need.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{EffectError, EffectResult};

/// Four colour stops consumed by the gradient blend chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette(pub [Vec3; 4]);

impl Palette {
    pub fn from_hex(stops: &[String; 4]) -> EffectResult<Self> {
        let mut colors = [Vec3::ZERO; 4];
        for (slot, stop) in colors.iter_mut().zip(stops) {
            *slot = parse_hex(stop)?;
        }
        Ok(Self(colors))
    }

    /// Flattened `vec3[4]` layout for `uniform3fv`.
    pub fn to_uniform(&self) -> [f32; 12] {
        let mut out = [0.0; 12];
        for (i, c) in self.0.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(&c.to_array());
        }
        out
    }
}

fn parse_hex(raw: &str) -> EffectResult<Vec3> {
    let digits = raw.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return Err(EffectError::config(format!("colour '{raw}' is not #rrggbb")));
    }
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| EffectError::config(format!("colour '{raw}' is not hex")))?;
    let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
    Ok(Vec3::new(channel(16), channel(8), channel(0)))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    pub canvas_id: String,
    pub container_id: String,
    /// Added to the time uniform once per frame.
    pub time_step: f64,
    /// Fraction of the remaining distance the noise offset covers per frame.
    pub smoothing: f32,
    pub palettes: Vec<[String; 4]>,
    pub star_count: usize,
    pub max_star_size: f32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            canvas_id: "gradient".into(),
            container_id: "gradient-container".into(),
            time_step: 0.01,
            smoothing: 0.05,
            palettes: vec![[
                "#0a0a0a".into(),
                "#050505".into(),
                "#0f0f0f".into(),
                "#000000".into(),
            ]],
            star_count: 150,
            max_star_size: 0.006,
        }
    }
}

impl GradientConfig {
    pub fn from_json(raw: &str) -> EffectResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EffectResult<()> {
        if self.palettes.is_empty() {
            return Err(EffectError::config("at least one palette is required"));
        }
        if self.smoothing.is_nan() || self.smoothing <= 0.0 || self.smoothing > 1.0 {
            return Err(EffectError::config("smoothing must be in (0, 1]"));
        }
        if !self.time_step.is_finite() {
            return Err(EffectError::config("time_step must be finite"));
        }
        self.palettes()?;
        Ok(())
    }

    pub fn palettes(&self) -> EffectResult<Vec<Palette>> {
        self.palettes.iter().map(Palette::from_hex).collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub source_selector: String,
    pub overlay_id: String,
    /// Block edge at step 1; step `k` draws `base_sample_size * k`.
    pub base_sample_size: u32,
    pub duration_ms: f64,
    pub steps: u32,
    pub fade_in_delay_ms: f64,
    pub hide_delay_ms: f64,
    pub overlay_transition: String,
    pub overlay_z_index: i32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            source_selector: "#gradient".into(),
            overlay_id: "pixelCanvas".into(),
            base_sample_size: 10,
            duration_ms: 800.0,
            steps: 10,
            fade_in_delay_ms: 10.0,
            hide_delay_ms: 500.0,
            overlay_transition: "opacity 0.8s ease-in-out".into(),
            overlay_z_index: 1000,
        }
    }
}

impl TransitionConfig {
    pub fn from_json(raw: &str) -> EffectResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EffectResult<()> {
        if self.steps == 0 {
            return Err(EffectError::config("steps must be at least 1"));
        }
        if self.base_sample_size == 0 {
            return Err(EffectError::config("base_sample_size must be at least 1"));
        }
        if self.duration_ms.is_nan() || self.duration_ms <= 0.0 {
            return Err(EffectError::config("duration_ms must be positive"));
        }
        if self.fade_in_delay_ms < 0.0 || self.hide_delay_ms < 0.0 {
            return Err(EffectError::config("delays must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        GradientConfig::default().validate().unwrap();
        TransitionConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = TransitionConfig::from_json(r#"{"duration_ms": 400}"#).unwrap();
        assert_eq!(cfg.duration_ms, 400.0);
        assert_eq!(cfg.base_sample_size, 10);
        assert_eq!(cfg.overlay_id, "pixelCanvas");
    }

    #[test]
    fn rejects_zero_steps() {
        let err = TransitionConfig::from_json(r#"{"steps": 0}"#).unwrap_err();
        assert!(err.to_string().contains("steps"));
    }

    #[test]
    fn parses_hex_palettes() {
        let palette = Palette::from_hex(&[
            "#ff0000".into(),
            "00ff00".into(),
            "#0000ff".into(),
            "#000000".into(),
        ])
        .unwrap();
        assert_eq!(palette.0[0], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(palette.0[1], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(palette.to_uniform()[8], 1.0);
    }

    #[test]
    fn rejects_bad_colour() {
        let raw = r##"{"palettes": [["#12", "#000000", "#000000", "#000000"]]}"##;
        assert!(matches!(
            GradientConfig::from_json(raw),
            Err(EffectError::Config(_))
        ));
    }

    #[test]
    fn rejects_empty_palette_list() {
        assert!(GradientConfig::from_json(r#"{"palettes": []}"#).is_err());
    }
}
