//! Navigation hooks around the transition machine.
//!
//! `leave` and `enter` return promises for the navigation library. Neither ever
//! rejects: a failed or skipped effect degrades to an instant swap.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlCanvasElement;

use super::dom::{self, Container, NoContainer};
use super::overlay::CanvasOverlay;
use crate::config::TransitionConfig;
use crate::error::{EffectError, EffectResult};
use crate::pixelate::Raster;
use crate::transition::{
    apply_owned, finish_enter, finish_leave, Hook, Overlay, PageContainer, Phase, SweepParams,
    TransitionMachine,
};

struct Engine {
    config: TransitionConfig,
    machine: TransitionMachine,
    overlay: Option<CanvasOverlay>,
}

impl Engine {
    /// Snapshot the source canvas. `Ok(false)` when there is nothing to capture.
    fn capture(&mut self) -> EffectResult<bool> {
        self.machine.begin_capture()?;
        match self.snapshot_source() {
            Ok(Some(raster)) => {
                self.machine.capture_done(raster)?;
                Ok(true)
            }
            Ok(None) => {
                self.machine.capture_skipped();
                Ok(false)
            }
            Err(err) => {
                self.machine.abort();
                Err(err)
            }
        }
    }

    fn snapshot_source(&mut self) -> EffectResult<Option<Raster>> {
        let document = dom::document()?;
        let Some(source) = document.query_selector(&self.config.source_selector)? else {
            return Ok(None);
        };
        let Ok(source) = source.dyn_into::<HtmlCanvasElement>() else {
            debug!("{} is not a canvas", self.config.source_selector);
            return Ok(None);
        };
        let (w, h) = dom::viewport(&dom::window()?)?;
        let mut overlay = CanvasOverlay::find_or_create(&document, &self.config.overlay_id)?;
        let raster = overlay.capture(&source, w as u32, h as u32)?;
        overlay.show(&self.config)?;
        self.overlay = Some(overlay);
        Ok(Some(raster))
    }

    fn apply(&mut self, generation: u64, now_ms: f64) -> EffectResult<Vec<Hook>> {
        let overlay = self.overlay.as_mut().ok_or(EffectError::NoSnapshot)?;
        apply_owned(&mut self.machine, overlay, generation, now_ms)
    }

    fn reset(&mut self) {
        self.machine.abort();
        if let Some(overlay) = self.overlay.as_mut() {
            if let Err(err) = overlay.hide() {
                warn!("could not hide overlay: {err}");
            }
        }
    }
}

/// Poll the machine until `until` completes, sleeping between deadlines.
///
/// Stops with `Superseded` once the machine no longer belongs to `generation`.
async fn drive(inner: &Rc<RefCell<Engine>>, generation: u64, until: Hook) -> EffectResult<()> {
    loop {
        let deadline = {
            let mut engine = inner.borrow_mut();
            if engine.apply(generation, dom::now_ms())?.contains(&until) {
                return Ok(());
            }
            engine.machine.next_deadline()
        };
        let deadline = deadline.ok_or(EffectError::Interrupted)?;
        dom::sleep(deadline - dom::now_ms()).await?;
    }
}

async fn pixelate(inner: &Rc<RefCell<Engine>>, params: SweepParams) -> EffectResult<()> {
    let generation = {
        let mut engine = inner.borrow_mut();
        engine.machine.begin_pixelate(dom::now_ms(), params)?;
        engine.machine.generation()
    };
    drive(inner, generation, Hook::Leave).await
}

async fn depixelate(inner: &Rc<RefCell<Engine>>, params: SweepParams) -> EffectResult<()> {
    let generation = {
        let mut engine = inner.borrow_mut();
        engine.machine.begin_depixelate(dom::now_ms(), params)?;
        engine.machine.generation()
    };
    drive(inner, generation, Hook::Enter).await
}

/// A failure that belongs to this run, as opposed to one a newer run displaced.
fn owned_failure<T>(outcome: &EffectResult<T>) -> bool {
    outcome
        .as_ref()
        .is_err_and(|err| !matches!(err, EffectError::Superseded))
}

/// `Ok(true)` once the old page sits behind a full mosaic.
async fn run_leave(inner: &Rc<RefCell<Engine>>) -> EffectResult<bool> {
    let captured = inner.borrow_mut().capture()?;
    if !captured {
        return Ok(false);
    }
    let params = SweepParams::from(&inner.borrow().config);
    pixelate(inner, params).await?;
    Ok(true)
}

async fn run_enter(inner: &Rc<RefCell<Engine>>) -> EffectResult<()> {
    match inner.borrow().machine.phase() {
        Phase::Idle => {
            debug!("no transition in flight, showing page directly");
            return Ok(());
        }
        // captured but never pixelated: the leave side did not finish
        Phase::Capturing => return Err(EffectError::Interrupted),
        _ => {}
    }
    let params = SweepParams::from(&inner.borrow().config);
    depixelate(inner, params).await
}

fn settle<T>(outcome: EffectResult<T>) -> Result<JsValue, JsValue> {
    outcome.map(|_| JsValue::UNDEFINED).map_err(JsValue::from)
}

#[wasm_bindgen]
pub struct PixelTransition {
    inner: Rc<RefCell<Engine>>,
}

#[wasm_bindgen]
impl PixelTransition {
    /// `config_json` is an optional partial `TransitionConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<PixelTransition, JsValue> {
        let config = match config_json {
            Some(raw) => TransitionConfig::from_json(&raw)?,
            None => TransitionConfig::default(),
        };
        let machine = TransitionMachine::new(&config);
        Ok(Self {
            inner: Rc::new(RefCell::new(Engine {
                config,
                machine,
                overlay: None,
            })),
        })
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.inner.borrow().machine.phase())
    }

    #[wasm_bindgen(js_name = blockSize)]
    pub fn block_size(&self) -> Option<u32> {
        self.inner.borrow().machine.block_size()
    }

    /// Snapshot the gradient onto the overlay, then call `callback`.
    ///
    /// Without a source canvas the callback runs straight away and no overlay
    /// is created. Returns whether a snapshot was taken.
    #[wasm_bindgen(js_name = captureAndRender)]
    pub fn capture_and_render(&self, callback: Option<Function>) -> Result<bool, JsValue> {
        let captured = self.inner.borrow_mut().capture()?;
        if let Some(callback) = callback {
            callback.call0(&JsValue::NULL)?;
        }
        Ok(captured)
    }

    #[wasm_bindgen(js_name = fadeInAndPixelate)]
    pub fn fade_in_and_pixelate(&self, base_sample_size: u32, duration_ms: f64) -> Promise {
        let inner = self.inner.clone();
        let params = SweepParams {
            base: base_sample_size,
            duration_ms,
        };
        future_to_promise(async move { settle(pixelate(&inner, params).await) })
    }

    #[wasm_bindgen(js_name = fadeOutAndDePixelate)]
    pub fn fade_out_and_depixelate(&self, base_sample_size: u32, duration_ms: f64) -> Promise {
        let inner = self.inner.clone();
        let params = SweepParams {
            base: base_sample_size,
            duration_ms,
        };
        future_to_promise(async move { settle(depixelate(&inner, params).await) })
    }

    /// Navigation `leave` hook: pixelate, then hide `data.current.container`.
    pub fn leave(&self, data: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let current = Container::from_hook_data(&data, "current");
            let current: &dyn PageContainer = match &current {
                Some(c) => c,
                None => &NoContainer,
            };
            match run_leave(&inner).await {
                Ok(false) => {}
                Err(EffectError::Busy(phase)) => warn!("leave ignored, transition {phase:?}"),
                outcome => {
                    let mut engine = inner.borrow_mut();
                    let failed = owned_failure(&outcome);
                    if let Err(err) = finish_leave(outcome.map(|_| ()), &mut engine.machine, current)
                    {
                        warn!("could not hide outgoing page: {err}");
                    }
                    if failed {
                        engine.reset();
                    }
                }
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Navigation `enter` hook: depixelate, then show `data.next.container`.
    /// The page is shown even when depixelation fails.
    pub fn enter(&self, data: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let next = Container::from_hook_data(&data, "next");
            let next: &dyn PageContainer = match &next {
                Some(c) => c,
                None => &NoContainer,
            };
            let shown = match run_enter(&inner).await {
                Err(EffectError::Busy(phase)) => {
                    warn!("enter ignored, transition {phase:?}");
                    next.set_visible(true)
                }
                outcome => {
                    let mut engine = inner.borrow_mut();
                    let failed = owned_failure(&outcome);
                    let shown = finish_enter(outcome, &mut engine.machine, next);
                    if failed {
                        engine.reset();
                    }
                    shown
                }
            };
            if let Err(err) = shown {
                warn!("could not show incoming page: {err}");
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Drop any transition in flight and hide the overlay.
    pub fn cancel(&self) {
        self.inner.borrow_mut().reset();
    }
}
