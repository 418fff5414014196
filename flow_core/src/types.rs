//! Core domain types for Flowtimer.
//!
//! This module defines the fundamental types used throughout the system:
//! - The workout hierarchy (workouts, sections, timers)
//! - Flattened execution steps and their repeat context
//! - Progress metrics and the execution state snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Hierarchy Model
// ============================================================================

/// A leaf step: one timed pose/exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_seconds: u32,
}

impl Timer {
    pub fn new(name: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            duration_seconds,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A timer is valid when it has a name and a positive duration
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.duration_seconds > 0
    }

    /// Whether the timer can be executed at all (zero-length timers are dropped)
    pub fn is_playable(&self) -> bool {
        self.duration_seconds > 0
    }

    /// Duration formatted as `M:SS`
    pub fn formatted_duration(&self) -> String {
        crate::format::format_clock(u64::from(self.duration_seconds))
    }
}

/// A recursive container of timers and child sections with a repeat count
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
    #[serde(default)]
    pub timers: Vec<Timer>,
    #[serde(default)]
    pub children: Vec<Section>,
    #[serde(default)]
    pub level: u32,
}

fn default_repeat_count() -> u32 {
    1
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            repeat_count: 1,
            timers: Vec::new(),
            children: Vec::new(),
            level: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_repeats(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    pub fn with_timer(mut self, timer: Timer) -> Self {
        self.timers.push(timer);
        self
    }

    /// Append a child section, re-levelling its subtree under this section
    pub fn with_child(mut self, mut child: Section) -> Self {
        child.set_level(self.level + 1);
        self.children.push(child);
        self
    }

    fn set_level(&mut self, level: u32) {
        self.level = level;
        for child in &mut self.children {
            child.set_level(level + 1);
        }
    }

    /// Repeat count as executed; a zero from upstream data plays once
    pub fn effective_repeats(&self) -> u32 {
        self.repeat_count.max(1)
    }

    /// Steps in one iteration: own playable timers plus every child's full expansion
    pub fn one_iteration_steps(&self) -> usize {
        let own = self.timers.iter().filter(|t| t.is_playable()).count();
        let nested: usize = self.children.iter().map(Section::calculate_total_steps).sum();
        own + nested
    }

    /// Seconds in one iteration, counted the same way as `one_iteration_steps`
    pub fn one_iteration_duration(&self) -> u64 {
        let own: u64 = self
            .timers
            .iter()
            .map(|t| u64::from(t.duration_seconds))
            .sum();
        let nested: u64 = self
            .children
            .iter()
            .map(Section::calculate_total_duration)
            .sum();
        own + nested
    }

    /// Total steps including nested sections and repeats
    pub fn calculate_total_steps(&self) -> usize {
        self.one_iteration_steps() * self.effective_repeats() as usize
    }

    /// Total duration in seconds including nested sections and repeats
    pub fn calculate_total_duration(&self) -> u64 {
        self.one_iteration_duration() * u64::from(self.effective_repeats())
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_repeats(&self) -> bool {
        self.repeat_count > 1
    }

    /// Depth of the deepest nested section below this one (0 for a leaf section)
    pub fn depth(&self) -> u32 {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// The root of a workout definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workout {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub preloaded: bool,
}

impl Workout {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
            preloaded: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a root-level section
    pub fn with_section(mut self, mut section: Section) -> Self {
        section.set_level(0);
        self.sections.push(section);
        self
    }

    /// Total number of steps (accounting for repeats)
    pub fn calculate_total_steps(&self) -> usize {
        self.sections.iter().map(Section::calculate_total_steps).sum()
    }

    /// Total duration in seconds (accounting for repeats)
    pub fn calculate_total_duration(&self) -> u64 {
        self.sections
            .iter()
            .map(Section::calculate_total_duration)
            .sum()
    }
}

// ============================================================================
// Flattened Steps
// ============================================================================

/// A section without its subtree, shared by every step it owns
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub level: u32,
}

impl From<&Section> for SectionInfo {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id.clone(),
            name: section.name.clone(),
            description: section.description.clone(),
            level: section.level,
        }
    }
}

/// Position of a step inside one enclosing section's repeat
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatFrame {
    pub section: Arc<SectionInfo>,
    /// 1-based
    pub current_repeat: u32,
    pub total_repeats: u32,
    /// 0-based index within one iteration of the section
    pub index_in_repeat: usize,
    pub steps_in_repeat: usize,
}

impl RepeatFrame {
    /// True at the step where this repeat of the section begins
    pub fn is_first_in_repeat(&self) -> bool {
        self.index_in_repeat == 0
    }
}

/// One execution unit of a flattened workout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlattenedStep {
    pub timer: Arc<Timer>,
    /// The section that declares this timer
    pub owner: RepeatFrame,
    /// Enclosing sections above the owner, outermost first
    pub ancestors: Vec<RepeatFrame>,
    pub root_section_index: usize,
    /// 0-based position within the whole sequence
    pub global_index: usize,
}

impl FlattenedStep {
    /// Every enclosing section, outermost first, ending with the owner
    pub fn frames(&self) -> impl Iterator<Item = &RepeatFrame> {
        self.ancestors.iter().chain(std::iter::once(&self.owner))
    }

    pub fn owner(&self) -> &RepeatFrame {
        &self.owner
    }

    pub fn section(&self) -> &SectionInfo {
        &self.owner().section
    }

    pub fn current_repeat(&self) -> u32 {
        self.owner().current_repeat
    }

    pub fn total_repeats(&self) -> u32 {
        self.owner().total_repeats
    }

    pub fn index_in_repeat(&self) -> usize {
        self.owner().index_in_repeat
    }

    pub fn steps_in_repeat(&self) -> usize {
        self.owner().steps_in_repeat
    }

    pub fn duration_seconds(&self) -> u32 {
        self.timer.duration_seconds
    }
}

// ============================================================================
// Progress and State Snapshot
// ============================================================================

/// Progress within the owning section of the active step
#[derive(Clone, Debug, PartialEq)]
pub struct SectionProgress {
    pub section_id: String,
    /// 1-based
    pub current_repeat: u32,
    pub total_repeats: u32,
    /// 0-based
    pub current_step_index: usize,
    pub steps_in_repeat: usize,
}

impl SectionProgress {
    pub fn for_step(step: &FlattenedStep) -> Self {
        Self {
            section_id: step.section().id.clone(),
            current_repeat: step.current_repeat(),
            total_repeats: step.total_repeats(),
            current_step_index: step.index_in_repeat(),
            steps_in_repeat: step.steps_in_repeat(),
        }
    }

    /// Fraction of repeats already completed
    pub fn total_repeat_fraction(&self) -> f32 {
        if self.total_repeats <= 1 {
            return 1.0;
        }
        (self.current_repeat - 1) as f32 / self.total_repeats as f32
    }

    /// Fraction of the current iteration already completed
    pub fn current_repeat_fraction(&self) -> f32 {
        if self.steps_in_repeat == 0 {
            return 0.0;
        }
        self.current_step_index as f32 / self.steps_in_repeat as f32
    }

    /// Completed repeats plus the within-iteration share; monotonic over a section
    pub fn combined_fraction(&self) -> f32 {
        if self.total_repeats <= 1 {
            return self.current_repeat_fraction();
        }
        self.total_repeat_fraction() + self.current_repeat_fraction() / self.total_repeats as f32
    }
}

/// Progress across the whole workout
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutProgress {
    /// 0-based index of the root section being played
    pub current_section_index: usize,
    pub total_sections: usize,
    /// 1-based step number
    pub current_step: usize,
    pub total_steps: usize,
    pub elapsed_seconds: u64,
    pub total_seconds: u64,
}

impl WorkoutProgress {
    pub fn step_fraction(&self) -> f32 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.current_step as f32 / self.total_steps as f32
    }

    pub fn time_fraction(&self) -> f32 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        self.elapsed_seconds as f32 / self.total_seconds as f32
    }
}

/// The active step of a running or paused workout
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveStep {
    pub step: FlattenedStep,
    pub remaining_seconds: u32,
    pub section_progress: SectionProgress,
    pub overall_progress: WorkoutProgress,
}

/// Immutable snapshot of the execution state machine
#[derive(Clone, Debug, PartialEq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running(ActiveStep),
    Paused(ActiveStep),
    Completed,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running(_))
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, TimerState::Paused(_))
    }

    /// Running or paused
    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TimerState::Completed)
    }

    pub fn active(&self) -> Option<&ActiveStep> {
        match self {
            TimerState::Running(active) | TimerState::Paused(active) => Some(active),
            TimerState::Idle | TimerState::Completed => None,
        }
    }

    pub fn step(&self) -> Option<&FlattenedStep> {
        self.active().map(|a| &a.step)
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.active().map(|a| a.remaining_seconds)
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running(_) => "running",
            TimerState::Paused(_) => "paused",
            TimerState::Completed => "completed",
        }
    }
}
