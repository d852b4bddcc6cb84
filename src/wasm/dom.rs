use js_sys::{Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement, Window};

use crate::error::{EffectError, EffectResult};
use crate::transition::PageContainer;

pub fn window() -> EffectResult<Window> {
    web_sys::window().ok_or_else(|| EffectError::dom("no window"))
}

pub fn document() -> EffectResult<Document> {
    window()?
        .document()
        .ok_or_else(|| EffectError::dom("no document"))
}

/// `innerWidth × innerHeight` in CSS pixels.
pub fn viewport(window: &Window) -> EffectResult<(f64, f64)> {
    let w = window.inner_width()?.as_f64().unwrap_or(0.0);
    let h = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok((w, h))
}

pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Resolve after `ms` via `setTimeout`; a zero delay still yields to the event loop.
pub async fn sleep(ms: f64) -> EffectResult<()> {
    let window = window()?;
    let delay = ms.max(0.0).ceil() as i32;
    let promise = Promise::new(&mut |resolve, _reject| {
        if let Err(err) =
            window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
        {
            log::warn!("setTimeout failed: {err:?}");
        }
    });
    JsFuture::from(promise).await?;
    Ok(())
}

pub fn set_style(element: &HtmlElement, property: &str, value: &str) -> EffectResult<()> {
    element.style().set_property(property, value)?;
    Ok(())
}

/// A barba-style page container, `data.<slot>.container`.
pub struct Container(pub HtmlElement);

impl Container {
    pub fn from_hook_data(data: &JsValue, slot: &str) -> Option<Self> {
        let entry = Reflect::get(data, &JsValue::from_str(slot)).ok()?;
        let element = Reflect::get(&entry, &JsValue::from_str("container")).ok()?;
        element.dyn_into::<HtmlElement>().ok().map(Self)
    }
}

impl PageContainer for Container {
    fn set_visible(&self, visible: bool) -> EffectResult<()> {
        set_style(&self.0, "display", if visible { "block" } else { "none" })
    }
}

/// Stand-in when the hook data carries no container.
pub struct NoContainer;

impl PageContainer for NoContainer {
    fn set_visible(&self, _visible: bool) -> EffectResult<()> {
        Ok(())
    }
}
