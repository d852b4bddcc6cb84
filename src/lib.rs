#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Noise-gradient background and pixelation page transition for the browser.
//!
//! The effect logic (`gradient`, `pixelate`, `transition`) is plain Rust and
//! builds on any target. The DOM and WebGL glue lives in `wasm` and is only
//! compiled for wasm32.

pub mod config;
pub mod error;
pub mod gradient;
pub mod pixelate;
pub mod transition;

pub use config::{GradientConfig, Palette, TransitionConfig};
pub use error::{EffectError, EffectResult};
pub use gradient::GradientState;
pub use pixelate::Raster;
pub use transition::{Phase, TransitionMachine};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod dom;
    mod hooks;
    mod overlay;
    mod render;

    pub use hooks::PixelTransition;
    pub use render::GradientRenderer;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();
        log::info!("mosaic effects loaded");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{GradientRenderer, PixelTransition};
