//! Pixelation page transition as a pollable state machine.
//!
//! The machine holds no timers of its own. A driver calls [`TransitionMachine::poll`]
//! with the current time and applies the returned [`Cue`]s to an [`Overlay`],
//! then waits until [`TransitionMachine::next_deadline`]. Every scheduled event
//! chains from its own due time, so a fake clock replays the exact timeline.
//!
//! Each capture or abort starts a new generation. A driver remembers the
//! generation it started and stops as soon as the machine moves past it.

use log::{debug, warn};

use crate::config::TransitionConfig;
use crate::error::{EffectError, EffectResult};
use crate::pixelate::{Direction, Raster, Sweep};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Pixelating,
    /// Old page hidden behind a fully pixelated overlay.
    Swapped,
    Depixelating(Pass),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Refine while the overlay stays opaque.
    Opaque,
    /// Refine again while the overlay fades out.
    FadeOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    Leave,
    Enter,
}

/// Something the driver must do to the overlay or the navigation hooks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cue {
    /// Clear the overlay and redraw the snapshot as blocks of this edge.
    Draw(u32),
    Opacity(f32),
    /// `display: none` on the overlay.
    Hide,
    Complete(Hook),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Timed {
    Emit(Cue),
    StartFadeOutPass,
    Finish,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    at: f64,
    timed: Timed,
    /// Poll count when scheduled; a timer armed inside a poll waits for the next one.
    armed: u64,
}

/// Block size and duration for one pixelation or depixelation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepParams {
    pub base: u32,
    pub duration_ms: f64,
}

impl From<&TransitionConfig> for SweepParams {
    fn from(config: &TransitionConfig) -> Self {
        Self {
            base: config.base_sample_size,
            duration_ms: config.duration_ms,
        }
    }
}

#[derive(Debug)]
pub struct TransitionMachine {
    phase: Phase,
    steps: u32,
    fade_in_delay_ms: f64,
    hide_delay_ms: f64,
    params: SweepParams,
    snapshot: Option<Raster>,
    sweep: Option<Sweep>,
    timers: Vec<Timer>,
    polls: u64,
    generation: u64,
    block_size: Option<u32>,
    hidden: bool,
}

impl TransitionMachine {
    pub fn new(config: &TransitionConfig) -> Self {
        Self {
            phase: Phase::Idle,
            steps: config.steps,
            fade_in_delay_ms: config.fade_in_delay_ms,
            hide_delay_ms: config.hide_delay_ms,
            params: SweepParams::from(config),
            snapshot: None,
            sweep: None,
            timers: Vec::new(),
            polls: 0,
            generation: 0,
            block_size: None,
            hidden: true,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Edge length of the last block size drawn, if any.
    pub fn block_size(&self) -> Option<u32> {
        self.block_size
    }

    pub fn overlay_hidden(&self) -> bool {
        self.hidden
    }

    pub fn snapshot(&self) -> Option<&Raster> {
        self.snapshot.as_ref()
    }

    /// Token of the transition that currently owns the machine.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Claim the machine for a new leave. Fails while anything is in flight.
    pub fn begin_capture(&mut self) -> EffectResult<()> {
        if self.phase != Phase::Idle {
            return Err(EffectError::Busy(self.phase));
        }
        self.phase = Phase::Capturing;
        self.generation += 1;
        Ok(())
    }

    /// Nothing to capture; the transition degrades to an instant swap.
    pub fn capture_skipped(&mut self) {
        if self.phase == Phase::Capturing {
            debug!("no source canvas, skipping pixel transition");
            self.phase = Phase::Idle;
        }
    }

    /// Store the snapshot; the machine stays in `Capturing` until pixelation starts.
    pub fn capture_done(&mut self, snapshot: Raster) -> EffectResult<()> {
        if self.phase != Phase::Capturing {
            return Err(EffectError::Busy(self.phase));
        }
        self.snapshot = Some(snapshot);
        self.hidden = false;
        Ok(())
    }

    /// Start the fade-in pixelation from the stored snapshot.
    pub fn begin_pixelate(&mut self, now_ms: f64, params: SweepParams) -> EffectResult<()> {
        match self.phase {
            Phase::Capturing if self.snapshot.is_some() => {}
            Phase::Capturing | Phase::Idle => return Err(EffectError::NoSnapshot),
            busy => return Err(EffectError::Busy(busy)),
        }
        self.params = params;
        self.phase = Phase::Pixelating;
        self.timers.clear();
        self.schedule(now_ms, Timed::Emit(Cue::Opacity(0.0)));
        self.schedule(
            now_ms + self.fade_in_delay_ms,
            Timed::Emit(Cue::Opacity(1.0)),
        );
        self.sweep = Some(Sweep::new(
            params.base,
            self.steps,
            params.duration_ms,
            Direction::Coarsen,
            now_ms,
        ));
        Ok(())
    }

    /// Start the two-pass depixelation. Only valid once the old page is swapped out.
    pub fn begin_depixelate(&mut self, now_ms: f64, params: SweepParams) -> EffectResult<()> {
        match self.phase {
            Phase::Swapped if self.snapshot.is_some() => {}
            Phase::Swapped | Phase::Idle => return Err(EffectError::NoSnapshot),
            busy => return Err(EffectError::Busy(busy)),
        }
        self.params = params;
        self.phase = Phase::Depixelating(Pass::Opaque);
        self.sweep = Some(self.refine_sweep(now_ms));
        Ok(())
    }

    /// Drop any run in progress and return to idle with the overlay hidden.
    pub fn abort(&mut self) {
        if self.phase != Phase::Idle {
            warn!("aborting pixel transition in {:?}", self.phase);
        }
        self.phase = Phase::Idle;
        self.generation += 1;
        self.sweep = None;
        self.timers.clear();
        self.snapshot = None;
        self.hidden = true;
    }

    pub fn next_deadline(&self) -> Option<f64> {
        let sweep = self.sweep.as_ref().and_then(Sweep::next_due_ms);
        let timer = self.timers.iter().map(|t| t.at).reduce(f64::min);
        match (sweep, timer) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Everything due at or before `now`, in due-time order.
    pub fn poll(&mut self, now_ms: f64) -> Vec<Cue> {
        self.polls += 1;
        let mut cues = Vec::new();
        loop {
            let timer = self.ready_timer();
            let sweep_due = self.sweep.as_ref().and_then(Sweep::next_due_ms);
            match (timer, sweep_due) {
                // timers win ties so an opacity reset lands before the draw at the same instant
                (Some((idx, at)), due) if at <= now_ms && due.map_or(true, |d| at <= d) => {
                    let timer = self.timers.remove(idx);
                    self.fire(timer.at, timer.timed, &mut cues);
                }
                (_, Some(due)) if due <= now_ms => self.step_sweep(due, &mut cues),
                _ => break,
            }
        }
        cues
    }

    fn ready_timer(&self) -> Option<(usize, f64)> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.armed < self.polls)
            .map(|(idx, t)| (idx, t.at))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn step_sweep(&mut self, due: f64, cues: &mut Vec<Cue>) {
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        let Some((size, at)) = sweep.advance(due) else {
            return;
        };
        let finished = sweep.is_done();
        self.block_size = Some(size);
        cues.push(Cue::Draw(size));
        if finished {
            self.sweep = None;
            self.sweep_finished(at, cues);
        }
    }

    fn schedule(&mut self, at: f64, timed: Timed) {
        self.timers.push(Timer {
            at,
            timed,
            armed: self.polls,
        });
    }

    fn refine_sweep(&self, start_ms: f64) -> Sweep {
        Sweep::new(
            self.params.base,
            self.steps,
            self.params.duration_ms,
            Direction::Refine,
            start_ms,
        )
    }

    fn fire(&mut self, at: f64, timed: Timed, cues: &mut Vec<Cue>) {
        match timed {
            Timed::Emit(cue) => cues.push(cue),
            Timed::StartFadeOutPass => {
                self.phase = Phase::Depixelating(Pass::FadeOut);
                cues.push(Cue::Opacity(0.0));
                self.sweep = Some(self.refine_sweep(at));
            }
            Timed::Finish => {
                self.hidden = true;
                self.snapshot = None;
                self.phase = Phase::Idle;
                cues.push(Cue::Hide);
                cues.push(Cue::Complete(Hook::Enter));
            }
        }
    }

    fn sweep_finished(&mut self, at: f64, cues: &mut Vec<Cue>) {
        match self.phase {
            Phase::Pixelating => {
                self.phase = Phase::Swapped;
                cues.push(Cue::Complete(Hook::Leave));
            }
            Phase::Depixelating(Pass::Opaque) => self.schedule(at, Timed::StartFadeOutPass),
            Phase::Depixelating(Pass::FadeOut) => {
                self.schedule(at + self.hide_delay_ms, Timed::Finish)
            }
            other => debug!("sweep finished in unexpected phase {other:?}"),
        }
    }
}

/// The raster surface a transition draws on.
pub trait Overlay {
    fn draw_blocks(&mut self, snapshot: &Raster, size: u32) -> EffectResult<()>;
    fn set_opacity(&mut self, opacity: f32) -> EffectResult<()>;
    fn hide(&mut self) -> EffectResult<()>;
}

/// A page container the navigation library hands to the hooks.
pub trait PageContainer {
    fn set_visible(&self, visible: bool) -> EffectResult<()>;
}

/// Poll `machine` at `now` and apply the cues to `overlay`.
///
/// Returns the hooks that completed during this poll.
pub fn apply_due<O: Overlay + ?Sized>(
    machine: &mut TransitionMachine,
    overlay: &mut O,
    now_ms: f64,
) -> EffectResult<Vec<Hook>> {
    let mut completed = Vec::new();
    for cue in machine.poll(now_ms) {
        match cue {
            Cue::Draw(size) => {
                let snapshot = machine.snapshot().ok_or(EffectError::NoSnapshot)?;
                overlay.draw_blocks(snapshot, size)?;
            }
            Cue::Opacity(value) => overlay.set_opacity(value)?,
            Cue::Hide => overlay.hide()?,
            Cue::Complete(hook) => completed.push(hook),
        }
    }
    Ok(completed)
}

/// [`apply_due`] on behalf of the transition started at `generation`.
///
/// Fails with [`EffectError::Superseded`] once a newer transition owns the
/// machine; the machine is left untouched.
pub fn apply_owned<O: Overlay + ?Sized>(
    machine: &mut TransitionMachine,
    overlay: &mut O,
    generation: u64,
    now_ms: f64,
) -> EffectResult<Vec<Hook>> {
    if machine.generation() != generation {
        return Err(EffectError::Superseded);
    }
    apply_due(machine, overlay, now_ms)
}

/// Settle an enter hook: the incoming page is shown whatever happened to the overlay.
pub fn finish_enter<C: PageContainer + ?Sized>(
    outcome: EffectResult<()>,
    machine: &mut TransitionMachine,
    next: &C,
) -> EffectResult<()> {
    match outcome {
        Ok(()) => {}
        Err(EffectError::Superseded) => debug!("depixelation superseded, showing page"),
        Err(err) => {
            warn!("depixelation failed, showing page anyway: {err}");
            machine.abort();
        }
    }
    next.set_visible(true)
}

/// Settle a leave hook: the outgoing page is hidden once pixelation is done.
pub fn finish_leave<C: PageContainer + ?Sized>(
    outcome: EffectResult<()>,
    machine: &mut TransitionMachine,
    current: &C,
) -> EffectResult<()> {
    match outcome {
        Ok(()) => current.set_visible(false),
        Err(EffectError::Superseded) => {
            debug!("pixelation superseded, leaving the newer run alone");
            Ok(())
        }
        Err(err) => {
            warn!("pixelation failed, swapping without effect: {err}");
            machine.abort();
            Ok(())
        }
    }
}
