//! `setTimeout` / `setInterval` for the sandbox.
//!
//! Timers are queued on the engine worker and fired by the settle loop in
//! [`script`](super::script) in due-time order. Nothing here touches a host
//! timer: when an execution ends, its queue is dropped with the context.

use std::time::{Duration, Instant};

use boa_engine::{Context, JsNativeError, JsObject, JsResult, JsValue, NativeFunction};
use boa_gc::{Finalize, Gc, GcRefCell, Trace};

/// Largest delay hosts honour, in milliseconds.
const MAX_DELAY_MS: f64 = i32::MAX as f64;

#[derive(Trace, Finalize)]
struct Timer {
    id: u32,
    seq: u64,
    callback: JsObject,
    args: Vec<JsValue>,
    #[unsafe_ignore_trace]
    due: Instant,
    #[unsafe_ignore_trace]
    repeat: Option<Duration>,
}

#[derive(Trace, Finalize)]
struct TimerState {
    next_id: u32,
    next_seq: u64,
    #[unsafe_ignore_trace]
    min_interval: Duration,
    pending: Vec<Timer>,
}

/// A timer that is due, detached from the queue.
pub struct DueTimer {
    callback: JsObject,
    args: Vec<JsValue>,
}

impl DueTimer {
    /// Run the callback with its extra arguments.
    pub fn fire(&self, context: &mut Context) -> JsResult<JsValue> {
        self.callback.call(&JsValue::undefined(), &self.args, context)
    }
}

/// Per-execution timer queue.
#[derive(Clone, Trace, Finalize)]
pub struct TimerQueue {
    state: Gc<GcRefCell<TimerState>>,
}

impl TimerQueue {
    /// Create an empty queue; delays shorter than `min_interval` are clamped.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Gc::new(GcRefCell::new(TimerState {
                next_id: 1,
                next_seq: 0,
                min_interval,
                pending: Vec::new(),
            })),
        }
    }

    fn schedule(
        &self,
        callback: JsObject,
        delay_ms: f64,
        args: Vec<JsValue>,
        repeating: bool,
    ) -> u32 {
        let mut state = self.state.borrow_mut();
        // Delays that overflow a signed 32-bit millisecond count fire right
        // away, as they do in browsers and Node.
        let delay = if delay_ms.is_finite() && delay_ms > 0.0 && delay_ms <= MAX_DELAY_MS {
            Duration::from_secs_f64(delay_ms / 1000.0)
        } else {
            Duration::ZERO
        };
        let delay = delay.max(state.min_interval);

        let id = state.next_id;
        state.next_id = state.next_id.wrapping_add(1);
        let seq = state.next_seq;
        state.next_seq += 1;

        state.pending.push(Timer {
            id,
            seq,
            callback,
            args,
            due: Instant::now() + delay,
            repeat: repeating.then_some(delay),
        });
        id
    }

    fn clear(&self, id: u32) {
        self.state.borrow_mut().pending.retain(|timer| timer.id != id);
    }

    /// Number of timers still waiting to fire.
    pub fn len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Check if no timer is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Instant at which the earliest timer is due.
    pub fn next_due(&self) -> Option<Instant> {
        self.state.borrow().pending.iter().map(|t| t.due).min()
    }

    /// Remove the earliest timer, re-arming it first if it repeats.
    pub fn pop_due(&self) -> Option<DueTimer> {
        let mut state = self.state.borrow_mut();
        let index = state
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        let timer = state.pending.swap_remove(index);
        let due = DueTimer {
            callback: timer.callback.clone(),
            args: timer.args.clone(),
        };

        if let Some(every) = timer.repeat {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(Timer {
                id: timer.id,
                seq,
                callback: timer.callback.clone(),
                args: timer.args.clone(),
                due: timer.due + every,
                repeat: timer.repeat,
            });
        }
        Some(due)
    }

    /// Native `setTimeout`.
    pub fn set_timeout_fn(&self) -> NativeFunction {
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, queue: &TimerQueue, context| queue.register(args, false, context),
            self.clone(),
        )
    }

    /// Native `setInterval`.
    pub fn set_interval_fn(&self) -> NativeFunction {
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, queue: &TimerQueue, context| queue.register(args, true, context),
            self.clone(),
        )
    }

    /// Native `clearTimeout` / `clearInterval`.
    pub fn clear_fn(&self) -> NativeFunction {
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, queue: &TimerQueue, context| {
                let id = args.first().cloned().unwrap_or_default();
                if !id.is_undefined() && !id.is_null() {
                    let id = id.to_number(context)?;
                    if id.is_finite() && id >= 0.0 {
                        queue.clear(id as u32);
                    }
                }
                Ok(JsValue::undefined())
            },
            self.clone(),
        )
    }

    fn register(&self, args: &[JsValue], repeating: bool, context: &mut Context) -> JsResult<JsValue> {
        let callback = args
            .first()
            .and_then(JsValue::as_callable)
            .cloned()
            .ok_or_else(|| {
                JsNativeError::typ().with_message("timer callback must be a function")
            })?;
        let delay_ms = match args.get(1) {
            Some(delay) => delay.to_number(context)?,
            None => 0.0,
        };
        let extra = args.iter().skip(2).cloned().collect();

        let id = self.schedule(callback, delay_ms, extra, repeating);
        Ok(JsValue::from(id))
    }
}
