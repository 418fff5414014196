//! Countdown scheduler driving an [`Execution`] in real time.
//!
//! A `WorkoutRunner` is the single owner of one execution session. Its
//! mutable state sits behind one mutex, so user commands and ticks are
//! serialized and never interleave. State is published as immutable
//! snapshots through a `watch` channel.
//!
//! At most one ticker task exists per runner. Starting a ticker aborts the
//! previous one and bumps a generation counter under the lock; a ticker that
//! wakes up with a stale generation exits without touching state, so a tick
//! can never land after `stop()` or double-decrement after a restart.

use crate::machine::{Effect, Event, Execution};
use crate::{FlattenedStep, StepListener, TimerState, Workout};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Runner parameters
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Wall-clock length of one countdown second
    pub tick_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

struct Inner {
    execution: Execution,
    ticker: Option<JoinHandle<()>>,
    generation: u64,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<TimerState>,
    listener: Arc<dyn StepListener>,
    handle: Handle,
    tick_interval: Duration,
}

/// Runs one workout session against a caller-supplied tokio runtime
pub struct WorkoutRunner {
    shared: Arc<Shared>,
}

impl WorkoutRunner {
    /// Create a runner whose ticker is spawned on `handle`
    pub fn new(handle: Handle, config: RunnerConfig, listener: Arc<dyn StepListener>) -> Self {
        let (state_tx, _) = watch::channel(TimerState::Idle);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    execution: Execution::new(),
                    ticker: None,
                    generation: 0,
                }),
                state_tx,
                listener,
                handle,
                tick_interval: config.tick_interval,
            }),
        }
    }

    /// Load a workout; cancels any countdown and returns to `Idle`
    pub fn load(&self, workout: impl Into<Arc<Workout>>) {
        self.shared.dispatch(Event::Load(workout.into()));
    }

    pub fn start(&self) {
        self.shared.dispatch(Event::Start);
    }

    pub fn pause(&self) {
        self.shared.dispatch(Event::Pause);
    }

    pub fn resume(&self) {
        self.shared.dispatch(Event::Resume);
    }

    pub fn skip(&self) {
        self.shared.dispatch(Event::Skip);
    }

    pub fn stop(&self) {
        self.shared.dispatch(Event::Stop);
    }

    /// Jump to a step by global index; out-of-range indices are ignored
    pub fn jump_to(&self, index: usize) {
        self.shared.dispatch(Event::JumpTo(index));
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> TimerState {
        self.shared.state_tx.borrow().clone()
    }

    /// A receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.shared.state_tx.subscribe()
    }

    /// The flattened steps of the loaded workout
    pub fn steps(&self) -> Vec<FlattenedStep> {
        self.shared.lock().execution.steps().to_vec()
    }

    pub fn workout(&self) -> Option<Arc<Workout>> {
        self.shared.lock().execution.workout().cloned()
    }

    /// Seconds played or skipped past in the current session
    pub fn elapsed_seconds(&self) -> u64 {
        self.shared.lock().execution.elapsed_seconds()
    }
}

impl Drop for WorkoutRunner {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        cancel_ticker(&mut inner);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(self: &Arc<Self>, event: Event) {
        let mut inner = self.lock();
        self.apply_locked(&mut inner, event);
    }

    /// Apply an event and perform its effects; the caller holds the lock
    fn apply_locked(self: &Arc<Self>, inner: &mut Inner, event: Event) {
        let name = event.name();
        let is_tick = matches!(event, Event::Tick);
        let effects = inner.execution.apply(event);

        for effect in effects {
            match effect {
                Effect::CancelTicker => cancel_ticker(inner),
                Effect::StartTicker => {
                    cancel_ticker(inner);
                    let generation = inner.generation;
                    inner.ticker = Some(self.spawn_ticker(generation));
                }
                Effect::StepStarted(step) => {
                    if let Err(e) = self.listener.step_started(&step) {
                        tracing::warn!("Step start listener failed: {}", e);
                    }
                }
                Effect::StepCompleted(step) => {
                    if let Err(e) = self.listener.step_completed(&step) {
                        tracing::warn!(
                            "Completion listener failed for step {}: {}",
                            step.global_index,
                            e
                        );
                    }
                }
                Effect::WorkoutCompleted => {
                    if let Err(e) = self.listener.workout_completed() {
                        tracing::warn!("Workout completion listener failed: {}", e);
                    }
                }
            }
        }

        let state = inner.execution.state();
        if is_tick {
            tracing::trace!("{} -> {}", name, state.label());
        } else {
            tracing::debug!("{} -> {}", name, state.label());
        }
        self.publish(state);
    }

    fn publish(&self, state: &TimerState) {
        self.state_tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
    }

    fn spawn_ticker(self: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let weak: Weak<Shared> = Arc::downgrade(self);
        let interval = self.tick_interval;

        self.handle.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let keep_ticking = {
                    let mut inner = shared.lock();
                    if inner.generation != generation {
                        false
                    } else {
                        shared.apply_locked(&mut inner, Event::Tick);
                        inner.generation == generation && inner.execution.state().is_running()
                    }
                };
                if !keep_ticking {
                    break;
                }
            }
        })
    }
}

fn cancel_ticker(inner: &mut Inner) {
    if let Some(handle) = inner.ticker.take() {
        handle.abort();
    }
    inner.generation = inner.generation.wrapping_add(1);
}
