//! Execution state machine.
//!
//! `Execution` owns the flattened step sequence and the current position.
//! Every transition goes through [`Execution::apply`], which mutates the
//! machine and returns the side effects (ticker control, listener
//! notifications) for the caller to perform. The machine knows nothing
//! about time; the runner feeds it `Tick` events.
//!
//! Illegal transitions are silent no-ops and return no effects.

use crate::{
    flatten, ActiveStep, FlattenedStep, SectionProgress, TimerState, Workout, WorkoutProgress,
};
use std::sync::Arc;

/// Inputs to the state machine
#[derive(Clone, Debug)]
pub enum Event {
    Load(Arc<Workout>),
    Start,
    Pause,
    Resume,
    Skip,
    Stop,
    JumpTo(usize),
    Tick,
}

impl Event {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Load(_) => "load",
            Event::Start => "start",
            Event::Pause => "pause",
            Event::Resume => "resume",
            Event::Skip => "skip",
            Event::Stop => "stop",
            Event::JumpTo(_) => "jump",
            Event::Tick => "tick",
        }
    }
}

/// Side effects requested by a transition, in the order they must happen
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Cancel any ticker, then start a fresh one
    StartTicker,
    CancelTicker,
    StepStarted(FlattenedStep),
    /// The step counted down to zero (never emitted for skipped steps)
    StepCompleted(FlattenedStep),
    WorkoutCompleted,
}

/// A loaded workout and everything derived from it at load time
#[derive(Debug)]
struct Plan {
    workout: Arc<Workout>,
    steps: Vec<FlattenedStep>,
    /// `offsets[i]` = seconds in all steps before step `i`
    offsets: Vec<u64>,
    total_seconds: u64,
}

impl Plan {
    fn new(workout: Arc<Workout>) -> Self {
        let steps = flatten(&workout);
        let mut offsets = Vec::with_capacity(steps.len() + 1);
        let mut acc = 0u64;
        offsets.push(acc);
        for step in &steps {
            acc += u64::from(step.duration_seconds());
            offsets.push(acc);
        }
        let total_seconds = workout.calculate_total_duration();
        Self {
            workout,
            steps,
            offsets,
            total_seconds,
        }
    }
}

/// The execution state machine for one session
#[derive(Debug, Default)]
pub struct Execution {
    plan: Option<Plan>,
    position: usize,
    remaining: u32,
    state: TimerState,
}

impl Execution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn workout(&self) -> Option<&Arc<Workout>> {
        self.plan.as_ref().map(|p| &p.workout)
    }

    /// The flattened sequence of the loaded workout (empty if none)
    pub fn steps(&self) -> &[FlattenedStep] {
        self.plan.as_ref().map(|p| p.steps.as_slice()).unwrap_or(&[])
    }

    /// 0-based index of the current step
    pub fn position(&self) -> usize {
        self.position
    }

    /// Seconds of the workout already played or skipped past
    pub fn elapsed_seconds(&self) -> u64 {
        match (&self.plan, self.state.step()) {
            (Some(plan), Some(step)) => {
                plan.offsets[self.position]
                    + u64::from(step.duration_seconds().saturating_sub(self.remaining))
            }
            _ => 0,
        }
    }

    /// Apply one event and return the effects the caller must perform
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            Event::Load(workout) => {
                effects.push(Effect::CancelTicker);
                self.plan = Some(Plan::new(workout));
                self.reset();
            }

            Event::Start => {
                if !matches!(self.state, TimerState::Idle) {
                    return effects;
                }
                let Some(plan) = &self.plan else {
                    return effects;
                };
                if plan.steps.is_empty() {
                    self.complete(&mut effects);
                } else {
                    self.begin_step(0, &mut effects);
                }
            }

            Event::Pause => {
                if let TimerState::Running(active) = &self.state {
                    let paused = TimerState::Paused(active.clone());
                    effects.push(Effect::CancelTicker);
                    self.state = paused;
                }
            }

            Event::Resume => {
                if let TimerState::Paused(active) = &self.state {
                    let running = TimerState::Running(active.clone());
                    self.state = running;
                    effects.push(Effect::StartTicker);
                }
            }

            Event::Skip => {
                if self.state.is_active() {
                    effects.push(Effect::CancelTicker);
                    self.begin_step(self.position + 1, &mut effects);
                }
            }

            Event::JumpTo(index) => {
                if index < self.steps().len() {
                    effects.push(Effect::CancelTicker);
                    self.begin_step(index, &mut effects);
                }
            }

            Event::Stop => {
                effects.push(Effect::CancelTicker);
                self.reset();
            }

            Event::Tick => {
                if !self.state.is_running() {
                    return effects;
                }
                self.remaining = self.remaining.saturating_sub(1);
                if self.remaining > 0 {
                    self.state = self.running_snapshot();
                    return effects;
                }
                if let Some(step) = self.state.step().cloned() {
                    effects.push(Effect::StepCompleted(step));
                }
                self.begin_step(self.position + 1, &mut effects);
            }
        }

        effects
    }

    /// Back to `Idle` at the first step, keeping the loaded workout
    fn reset(&mut self) {
        self.position = 0;
        self.remaining = 0;
        self.state = TimerState::Idle;
    }

    /// Enter `Running` at `index` with a full countdown, or complete past the end
    fn begin_step(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(step) = self.steps().get(index).cloned() else {
            self.complete(effects);
            return;
        };

        self.position = index;
        self.remaining = step.duration_seconds();
        self.state = self.running_snapshot();
        effects.push(Effect::StepStarted(step));
        effects.push(Effect::StartTicker);
    }

    fn complete(&mut self, effects: &mut Vec<Effect>) {
        self.position = 0;
        self.remaining = 0;
        self.state = TimerState::Completed;
        effects.push(Effect::CancelTicker);
        effects.push(Effect::WorkoutCompleted);
    }

    /// Build a `Running` snapshot for the current position
    fn running_snapshot(&self) -> TimerState {
        let Some(plan) = &self.plan else {
            return TimerState::Idle;
        };
        let Some(step) = plan.steps.get(self.position) else {
            return TimerState::Idle;
        };

        let active = ActiveStep {
            step: step.clone(),
            remaining_seconds: self.remaining,
            section_progress: SectionProgress::for_step(step),
            overall_progress: WorkoutProgress {
                current_section_index: step.root_section_index,
                total_sections: plan.workout.sections.len(),
                current_step: self.position + 1,
                total_steps: plan.steps.len(),
                elapsed_seconds: plan.offsets[self.position]
                    + u64::from(step.duration_seconds().saturating_sub(self.remaining)),
                total_seconds: plan.total_seconds,
            },
        };

        TimerState::Running(active)
    }
}
