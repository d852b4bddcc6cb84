#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Document, Event, HtmlElement, MouseEvent};

use mosaic_wasm::{GradientRenderer, PixelTransition};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount(tag: &str, id: &str) -> HtmlElement {
    let doc = document();
    let el: HtmlElement = doc.create_element(tag).unwrap().dyn_into().unwrap();
    el.set_id(id);
    doc.body().unwrap().append_child(&el).unwrap();
    el
}

fn unmount(id: &str) {
    if let Some(el) = document().get_element_by_id(id) {
        el.remove();
    }
}

fn hook_data(slot: &str, container: &HtmlElement) -> JsValue {
    let entry = Object::new();
    Reflect::set(&entry, &"container".into(), container).unwrap();
    let data = Object::new();
    Reflect::set(&data, &slot.into(), &entry).unwrap();
    data.into()
}

fn display(el: &HtmlElement) -> String {
    el.style().get_property_value("display").unwrap()
}

fn config(source: &str, overlay: &str) -> Option<String> {
    Some(format!(
        r##"{{"source_selector": "#{source}", "overlay_id": "{overlay}", "duration_ms": 40, "hide_delay_ms": 0}}"##
    ))
}

#[wasm_bindgen_test]
fn capture_without_source_calls_back_synchronously() {
    unmount("gradient");
    let transition = PixelTransition::new(None).unwrap();
    let callback = Function::new_no_args("window.__captured = true;");

    let captured = transition.capture_and_render(Some(callback)).unwrap();

    assert!(!captured);
    let flag = Reflect::get(&web_sys::window().unwrap(), &"__captured".into()).unwrap();
    assert_eq!(flag.as_bool(), Some(true));
    assert!(document().get_element_by_id("pixelCanvas").is_none());
    assert_eq!(transition.phase(), "Idle");
}

#[wasm_bindgen_test]
fn gradient_is_a_no_op_without_mount_points() {
    unmount("gradient");
    unmount("gradient-container");
    assert!(GradientRenderer::init(None).unwrap().is_none());
}

#[wasm_bindgen_test]
fn overlay_id_taken_by_another_element_fails_cleanly() {
    mount("canvas", "grad-taken");
    mount("div", "overlay-taken");

    let transition = PixelTransition::new(config("grad-taken", "overlay-taken")).unwrap();
    let err = transition.capture_and_render(None).unwrap_err();

    assert!(err.as_string().unwrap().contains("is not a canvas"));
    assert_eq!(transition.phase(), "Idle");

    for id in ["grad-taken", "overlay-taken"] {
        unmount(id);
    }
}

#[wasm_bindgen_test]
fn dropped_renderer_stops_listening() {
    mount("div", "grad-drop-container");
    mount("canvas", "grad-drop");
    let config = r#"{"canvas_id": "grad-drop", "container_id": "grad-drop-container"}"#;

    // headless runners without WebGL2 cannot build the scene
    if let Ok(Some(renderer)) = GradientRenderer::init(Some(config.into())) {
        drop(renderer);
        let window = web_sys::window().unwrap();
        window
            .dispatch_event(&Event::new("resize").unwrap())
            .unwrap();
        window
            .dispatch_event(&MouseEvent::new("mousemove").unwrap())
            .unwrap();
    }

    for id in ["grad-drop", "grad-drop-container"] {
        unmount(id);
    }
}

#[wasm_bindgen_test(async)]
async fn enter_shows_page_when_depixelation_fails() {
    mount("canvas", "grad-fail");
    let next = mount("div", "next-fail");
    next.style().set_property("display", "none").unwrap();

    let transition = PixelTransition::new(config("grad-fail", "overlay-fail")).unwrap();
    // snapshot taken but never pixelated, so the enter side cannot depixelate
    assert!(transition.capture_and_render(None).unwrap());

    JsFuture::from(transition.enter(hook_data("next", &next)))
        .await
        .unwrap();

    assert_eq!(display(&next), "block");
    assert_eq!(transition.phase(), "Idle");
    let overlay: HtmlElement = document()
        .get_element_by_id("overlay-fail")
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(display(&overlay), "none");

    for id in ["grad-fail", "next-fail", "overlay-fail"] {
        unmount(id);
    }
}

#[wasm_bindgen_test(async)]
async fn leave_then_enter_round_trip() {
    mount("canvas", "grad-trip");
    let current = mount("div", "current-trip");
    let next = mount("div", "next-trip");
    next.style().set_property("display", "none").unwrap();

    let transition = PixelTransition::new(config("grad-trip", "overlay-trip")).unwrap();

    JsFuture::from(transition.leave(hook_data("current", &current)))
        .await
        .unwrap();
    assert_eq!(display(&current), "none");
    assert_eq!(transition.block_size(), Some(100));
    assert_eq!(transition.phase(), "Swapped");

    let overlay: HtmlElement = document()
        .get_element_by_id("overlay-trip")
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(display(&overlay), "block");
    assert_eq!(overlay.style().get_property_value("position").unwrap(), "fixed");

    JsFuture::from(transition.enter(hook_data("next", &next)))
        .await
        .unwrap();
    assert_eq!(display(&next), "block");
    assert_eq!(display(&overlay), "none");
    assert_eq!(transition.block_size(), Some(10));
    assert_eq!(transition.phase(), "Idle");

    for id in ["grad-trip", "current-trip", "next-trip", "overlay-trip"] {
        unmount(id);
    }
}
