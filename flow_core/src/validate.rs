//! Authoring constraints for workout definitions.
//!
//! These limits belong to the creation layer: the library refuses to store
//! a workout that breaks them, but the execution engine plays whatever it is
//! given.

use crate::{Section, Workout};
use std::collections::HashSet;

pub const MIN_REPEAT_COUNT: u32 = 1;
pub const MAX_REPEAT_COUNT: u32 = 99;
/// Deepest allowed section level (root sections are level 0)
pub const MAX_NESTING_LEVEL: u32 = 2;
pub const MIN_DURATION_SECONDS: u32 = 1;
/// 99 minutes
pub const MAX_DURATION_SECONDS: u32 = 5940;

/// Ids double as library file names: ASCII letters, digits, `-`, `_` and
/// `.`, not starting with `.`
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl Workout {
    /// Check the workout against authoring limits
    ///
    /// Returns every problem found; an empty list means the workout is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push("Workout has empty ID".to_string());
        } else if !is_valid_id(&self.id) {
            errors.push(format!("Workout ID '{}' contains invalid characters", self.id));
        }
        if self.name.trim().is_empty() {
            errors.push(format!("Workout '{}' has empty name", self.id));
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            validate_section(section, 0, &mut seen, &mut errors);
        }

        if !self.sections.iter().any(has_playable_timer) {
            errors.push(format!("Workout '{}' must have at least one timer", self.name));
        }

        errors
    }
}

fn has_playable_timer(section: &Section) -> bool {
    section.timers.iter().any(|t| t.is_playable())
        || section.children.iter().any(has_playable_timer)
}

fn check_id(id: &str, errors: &mut Vec<String>) {
    if !is_valid_id(id) {
        errors.push(format!("ID '{}' contains invalid characters", id));
    }
}

fn validate_section(
    section: &Section,
    expected_level: u32,
    seen: &mut HashSet<String>,
    errors: &mut Vec<String>,
) {
    let label = if section.name.trim().is_empty() {
        section.id.clone()
    } else {
        section.name.clone()
    };

    if section.name.trim().is_empty() {
        errors.push(format!("Section '{}' has empty name", section.id));
    }
    check_id(&section.id, errors);
    if !seen.insert(section.id.clone()) {
        errors.push(format!("Duplicate ID '{}'", section.id));
    }
    if !(MIN_REPEAT_COUNT..=MAX_REPEAT_COUNT).contains(&section.repeat_count) {
        errors.push(format!(
            "Section '{}': repeat count {} outside {}..={}",
            label, section.repeat_count, MIN_REPEAT_COUNT, MAX_REPEAT_COUNT
        ));
    }
    if section.level != expected_level {
        errors.push(format!(
            "Section '{}': level {} but nested at level {}",
            label, section.level, expected_level
        ));
    }
    if expected_level > MAX_NESTING_LEVEL {
        errors.push(format!(
            "Section '{}' nested deeper than level {}",
            label, MAX_NESTING_LEVEL
        ));
    }

    for timer in &section.timers {
        check_id(&timer.id, errors);
        if !seen.insert(timer.id.clone()) {
            errors.push(format!("Duplicate ID '{}'", timer.id));
        }
        if timer.name.trim().is_empty() {
            errors.push(format!("Section '{}' has a timer with empty name", label));
        }
        if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&timer.duration_seconds) {
            errors.push(format!(
                "Timer '{}' in '{}': duration {}s outside {}..={}",
                timer.name,
                label,
                timer.duration_seconds,
                MIN_DURATION_SECONDS,
                MAX_DURATION_SECONDS
            ));
        }
    }

    for child in &section.children {
        validate_section(child, expected_level + 1, seen, errors);
    }
}
