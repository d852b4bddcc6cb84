use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use super::dom::set_style;
use crate::config::TransitionConfig;
use crate::error::{EffectError, EffectResult};
use crate::pixelate::{mosaic, Raster};
use crate::transition::Overlay;

/// The fixed full-viewport 2D canvas a transition draws its mosaic on.
pub struct CanvasOverlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasOverlay {
    /// Existing overlay, if one was created earlier.
    pub fn find(document: &Document, id: &str) -> EffectResult<Option<Self>> {
        match document.get_element_by_id(id) {
            Some(el) => {
                let canvas = el
                    .dyn_into::<HtmlCanvasElement>()
                    .map_err(|_| EffectError::dom(format!("#{id} is not a canvas")))?;
                Ok(Some(Self::wrap(canvas)?))
            }
            None => Ok(None),
        }
    }

    pub fn find_or_create(document: &Document, id: &str) -> EffectResult<Self> {
        if let Some(existing) = Self::find(document, id)? {
            return Ok(existing);
        }
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| EffectError::dom("created element is not a canvas"))?;
        canvas.set_id(id);
        document
            .body()
            .ok_or_else(|| EffectError::dom("no body"))?
            .append_child(&canvas)?;
        Self::wrap(canvas)
    }

    fn wrap(canvas: HtmlCanvasElement) -> EffectResult<Self> {
        let options = Object::new();
        Reflect::set(&options, &"willReadFrequently".into(), &JsValue::TRUE)?;
        let ctx = canvas
            .get_context_with_context_options("2d", &options)?
            .ok_or_else(|| EffectError::dom("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| EffectError::dom("2d context has the wrong type"))?;
        Ok(Self { canvas, ctx })
    }

    /// Copy `source` scaled to `width × height` and keep the pixels.
    pub fn capture(
        &mut self,
        source: &HtmlCanvasElement,
        width: u32,
        height: u32,
    ) -> EffectResult<Raster> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx
            .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                source,
                0.0,
                0.0,
                source.width() as f64,
                source.height() as f64,
                0.0,
                0.0,
                width as f64,
                height as f64,
            )?;
        let image = self
            .ctx
            .get_image_data(0.0, 0.0, width as f64, height as f64)?;
        Raster::new(width, height, image.data().0)
    }

    /// Pin the overlay above the page.
    pub fn show(&self, config: &TransitionConfig) -> EffectResult<()> {
        let el = &self.canvas;
        set_style(el, "display", "block")?;
        set_style(el, "position", "fixed")?;
        set_style(el, "top", "0")?;
        set_style(el, "left", "0")?;
        set_style(el, "width", "100%")?;
        set_style(el, "height", "100%")?;
        set_style(el, "z-index", &config.overlay_z_index.to_string())?;
        set_style(el, "transition", &config.overlay_transition)?;
        Ok(())
    }
}

impl Overlay for CanvasOverlay {
    fn draw_blocks(&mut self, snapshot: &Raster, size: u32) -> EffectResult<()> {
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        for block in mosaic(snapshot, size) {
            self.ctx.set_fill_style_str(&block.css_color());
            self.ctx.fill_rect(
                block.x as f64,
                block.y as f64,
                block.size as f64,
                block.size as f64,
            );
        }
        Ok(())
    }

    fn set_opacity(&mut self, opacity: f32) -> EffectResult<()> {
        set_style(&self.canvas, "opacity", &opacity.to_string())
    }

    fn hide(&mut self) -> EffectResult<()> {
        set_style(&self.canvas, "display", "none")
    }
}
