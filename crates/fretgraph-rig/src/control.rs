//! Control channel: a single-producer, single-consumer queue carrying graph
//! edits from the control thread to the audio thread, plus epoch-based
//! retirement of replaced plans (spec §4.8).
//!
//! Swapping a plan transfers sole ownership of a `Box<ExecutionPlan>` across
//! the ring buffer, the same "drop channel" idiom the pack's sibling
//! graph-audio project uses to keep a real-time thread from ever running a
//! destructor: the audio thread never frees a plan itself. Instead it ships
//! the plan it just replaced back down a second, audio-to-control ring
//! buffer. The control thread holds each returned plan in a small retirement
//! list until an "epoch" counter — bumped once by the audio thread at the
//! end of every completed callback — has advanced past the point the plan
//! was retired, then drops it (after calling `release` on every node).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use thiserror::Error;

use crate::plan::ExecutionPlan;

/// One edit sent from the control thread to the audio thread. Every variant
/// but `SwapPlan` is `Copy`-friendly data only (plan index, `&'static str`
/// parameter id, `f32`/`bool` value) so draining and dropping a message on
/// the audio thread never allocates or deallocates.
pub enum ControlMessage {
    /// Replaces the live plan. The plan it displaces is shipped back to the
    /// control thread through the retirement channel, never freed here.
    SwapPlan(Box<ExecutionPlan>),
    /// Writes a node's live parameter target by plan index and stable
    /// string id (already resolved and clamped by the control thread).
    SetParameter {
        /// Index into the live plan's node list.
        node_idx: usize,
        /// Stable parameter string id.
        param_id: &'static str,
        /// New target value.
        value: f32,
    },
    /// Toggles a node's engine-level bypass.
    SetBypass {
        /// Index into the live plan's node list.
        node_idx: usize,
        /// New bypass state.
        bypassed: bool,
    },
    /// Clears one node's transient state.
    ResetNode {
        /// Index into the live plan's node list.
        node_idx: usize,
    },
    /// Clears every node's transient state.
    ResetAll,
}

/// Failures writing to the control channel.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The named node isn't present in the currently live plan.
    #[error("no node named `{0}` in the live plan")]
    UnknownNode(String),
    /// The queue to the audio thread stayed full through every retry.
    #[error("control channel is full")]
    QueueFull,
}

const MESSAGES_PER_CALLBACK: usize = 64;
const PUSH_SPIN_ATTEMPTS: u32 = 8;
const PUSH_TOTAL_ATTEMPTS: u32 = 64;
const PUSH_BACKOFF: Duration = Duration::from_micros(50);

/// Creates a linked pair: a [`ControlHandle`] for the control thread and an
/// [`AudioPort`] for the audio thread. `capacity` bounds the edit queue;
/// the retirement queue is sized generously relative to it since plan swaps
/// happen far less often than parameter edits.
pub fn control_channel(capacity: usize) -> (ControlHandle, AudioPort) {
    let (to_audio_tx, to_audio_rx) = HeapRb::<ControlMessage>::new(capacity).split();
    let (retired_tx, retired_rx) = HeapRb::<Box<ExecutionPlan>>::new(capacity.max(8)).split();
    let epoch = Arc::new(AtomicU64::new(0));

    let handle = ControlHandle {
        to_audio: to_audio_tx,
        retired: retired_rx,
        epoch: Arc::clone(&epoch),
        node_index: HashMap::new(),
        pending_retirement: Vec::new(),
    };
    let port = AudioPort {
        messages: to_audio_rx,
        retired: retired_tx,
        epoch,
        current: None,
    };
    (handle, port)
}

/// The control thread's end of the channel: sends edits, resolves node ids
/// against the plan it last swapped in, and reclaims retired plans.
pub struct ControlHandle {
    to_audio: HeapProd<ControlMessage>,
    retired: HeapCons<Box<ExecutionPlan>>,
    epoch: Arc<AtomicU64>,
    /// Mirrors the currently-live plan's id → index map. Refreshed on every
    /// `swap_plan`, since the plan itself is no longer reachable from here
    /// once it's been sent across.
    node_index: HashMap<String, usize>,
    /// Plans returned by the audio thread, waiting for at least one
    /// completed callback with their replacement live before they're freed.
    pending_retirement: Vec<(u64, Box<ExecutionPlan>)>,
}

impl ControlHandle {
    /// Installs a newly compiled plan as the live one. Caches its node id
    /// map for subsequent parameter/bypass/reset calls.
    pub fn swap_plan(&mut self, plan: Box<ExecutionPlan>) -> Result<(), ControlError> {
        self.node_index = plan.node_ids().clone();
        self.push(ControlMessage::SwapPlan(plan))
    }

    /// Writes a node's live parameter target by rig id and stable string id.
    pub fn set_parameter(&mut self, node_id: &str, param_id: &'static str, value: f32) -> Result<(), ControlError> {
        let node_idx = self.resolve(node_id)?;
        self.push(ControlMessage::SetParameter { node_idx, param_id, value })
    }

    /// Toggles a node's engine-level bypass by rig id.
    pub fn set_bypass(&mut self, node_id: &str, bypassed: bool) -> Result<(), ControlError> {
        let node_idx = self.resolve(node_id)?;
        self.push(ControlMessage::SetBypass { node_idx, bypassed })
    }

    /// Clears one node's transient state by rig id.
    pub fn reset_node(&mut self, node_id: &str) -> Result<(), ControlError> {
        let node_idx = self.resolve(node_id)?;
        self.push(ControlMessage::ResetNode { node_idx })
    }

    /// Clears every node's transient state.
    pub fn reset_all(&mut self) -> Result<(), ControlError> {
        self.push(ControlMessage::ResetAll)
    }

    /// Drains plans the audio thread has handed back and frees the ones
    /// whose replacement has survived at least one full callback. Call this
    /// periodically from the control thread (e.g. once per UI tick); it is
    /// never called from the audio thread.
    pub fn poll_retirement(&mut self) {
        while let Some(plan) = self.retired.try_pop() {
            let epoch_at_return = self.epoch.load(Ordering::Acquire);
            self.pending_retirement.push((epoch_at_return, plan));
        }
        let current_epoch = self.epoch.load(Ordering::Acquire);
        self.pending_retirement.retain_mut(|(epoch_at_return, plan)| {
            if current_epoch > *epoch_at_return {
                plan.release_all();
                false
            } else {
                true
            }
        });
    }

    /// Number of plans still waiting out their retirement epoch. Exposed for
    /// tests and diagnostics.
    pub fn pending_retirement_count(&self) -> usize {
        self.pending_retirement.len()
    }

    fn resolve(&self, node_id: &str) -> Result<usize, ControlError> {
        self.node_index.get(node_id).copied().ok_or_else(|| ControlError::UnknownNode(node_id.to_string()))
    }

    /// Per spec: the control thread never lets a full queue fall back to
    /// the audio thread blocking. It retries with a short spin, then a few
    /// sleeping backoffs, before giving up.
    fn push(&mut self, mut message: ControlMessage) -> Result<(), ControlError> {
        for attempt in 0..PUSH_TOTAL_ATTEMPTS {
            match self.to_audio.try_push(message) {
                Ok(()) => return Ok(()),
                Err(rejected) => {
                    message = rejected;
                    if attempt < PUSH_SPIN_ATTEMPTS {
                        std::hint::spin_loop();
                    } else {
                        std::thread::sleep(PUSH_BACKOFF);
                    }
                }
            }
        }
        Err(ControlError::QueueFull)
    }
}

/// The audio thread's end of the channel: drains pending edits and owns the
/// live plan outright, so `render` never shares it with anything.
pub struct AudioPort {
    messages: HeapCons<ControlMessage>,
    retired: HeapProd<Box<ExecutionPlan>>,
    epoch: Arc<AtomicU64>,
    current: Option<Box<ExecutionPlan>>,
}

impl AudioPort {
    /// Applies up to [`MESSAGES_PER_CALLBACK`] pending edits. Called once at
    /// the top of every audio callback, before `render` (spec §4.5 step 2).
    /// Bounded so a burst of control-thread edits can never make one block
    /// take unbounded time.
    pub fn drain_and_apply(&mut self) {
        for _ in 0..MESSAGES_PER_CALLBACK {
            let Some(message) = self.messages.try_pop() else {
                break;
            };
            match message {
                ControlMessage::SwapPlan(new_plan) => {
                    if let Some(old_plan) = self.current.replace(new_plan) {
                        // A full retirement queue would force a drop (and
                        // therefore a deallocation) right here; it is sized
                        // well above plausible swap rates so this should
                        // never happen in practice.
                        let _ = self.retired.try_push(old_plan);
                    }
                }
                ControlMessage::SetParameter { node_idx, param_id, value } => {
                    if let Some(plan) = &mut self.current {
                        plan.node_mut(node_idx).set_param(param_id, value);
                    }
                }
                ControlMessage::SetBypass { node_idx, bypassed } => {
                    if let Some(plan) = &mut self.current {
                        plan.set_bypassed(node_idx, bypassed);
                    }
                }
                ControlMessage::ResetNode { node_idx } => {
                    if let Some(plan) = &mut self.current {
                        plan.node_mut(node_idx).reset();
                    }
                }
                ControlMessage::ResetAll => {
                    if let Some(plan) = &mut self.current {
                        plan.reset_all();
                    }
                }
            }
        }
    }

    /// Renders `frames` samples through the live plan, if one has arrived
    /// yet, and bumps the epoch counter once. Returns the fault count (`0`
    /// when no plan is live — nothing ran, nothing faulted).
    pub fn render(&mut self, frames: usize) -> u32 {
        let faults = self.current.as_mut().map_or(0, |plan| plan.render(frames));
        self.epoch.fetch_add(1, Ordering::Release);
        faults
    }

    /// Shared read access to the live plan, for the block scheduler to feed
    /// sources and drain sinks between `drain_and_apply` and `render`.
    pub fn current(&self) -> Option<&ExecutionPlan> {
        self.current.as_deref()
    }

    /// Mutable access to the live plan, for the same purpose.
    pub fn current_mut(&mut self) -> Option<&mut ExecutionPlan> {
        self.current.as_deref_mut()
    }
}
