//! Flattening of a nested workout into a linear step sequence.
//!
//! Sections are expanded depth-first and repeat-major: one iteration of a
//! section is its own timers followed by each child's full expansion, and
//! the section emits that iteration `repeat_count` times. Nested repeats
//! therefore compound, matching `Section::calculate_total_steps`.

use crate::{FlattenedStep, RepeatFrame, Section, SectionInfo, Timer, Workout};
use std::sync::Arc;

/// A step before its enclosing sections have been applied
struct PartialStep {
    timer: Arc<Timer>,
    /// Frames below the section currently being expanded, outermost first
    frames: Vec<RepeatFrame>,
}

/// Flatten a workout into its ordered execution steps
///
/// The result is deterministic and depends only on declared order. An
/// empty workout yields an empty sequence.
pub fn flatten(workout: &Workout) -> Vec<FlattenedStep> {
    let mut steps = Vec::with_capacity(workout.calculate_total_steps());

    for (root_section_index, section) in workout.sections.iter().enumerate() {
        for partial in expand(section) {
            let mut frames = partial.frames;
            // expand() always pushes the section's own frame
            let Some(owner) = frames.pop() else {
                continue;
            };
            steps.push(FlattenedStep {
                timer: partial.timer,
                owner,
                ancestors: frames,
                root_section_index,
                global_index: steps.len(),
            });
        }
    }

    tracing::debug!(
        "Flattened workout '{}' into {} steps",
        workout.name,
        steps.len()
    );
    steps
}

/// Full expansion of a section: `repeat_count` copies of its one iteration
fn expand(section: &Section) -> Vec<PartialStep> {
    let iteration = one_iteration(section);
    if iteration.is_empty() {
        return Vec::new();
    }

    let info = Arc::new(SectionInfo::from(section));
    let total_repeats = section.effective_repeats();
    let steps_in_repeat = iteration.len();
    let mut expanded = Vec::with_capacity(steps_in_repeat * total_repeats as usize);

    for current_repeat in 1..=total_repeats {
        for (index_in_repeat, partial) in iteration.iter().enumerate() {
            let mut frames = Vec::with_capacity(partial.frames.len() + 1);
            frames.push(RepeatFrame {
                section: Arc::clone(&info),
                current_repeat,
                total_repeats,
                index_in_repeat,
                steps_in_repeat,
            });
            frames.extend(partial.frames.iter().cloned());
            expanded.push(PartialStep {
                timer: Arc::clone(&partial.timer),
                frames,
            });
        }
    }

    expanded
}

/// One iteration of a section: own playable timers, then each child's expansion
fn one_iteration(section: &Section) -> Vec<PartialStep> {
    let mut iteration = Vec::with_capacity(section.one_iteration_steps());

    for timer in &section.timers {
        if !timer.is_playable() {
            tracing::warn!(
                "Skipping zero-length timer '{}' in section '{}'",
                timer.name,
                section.name
            );
            continue;
        }
        iteration.push(PartialStep {
            timer: Arc::new(timer.clone()),
            frames: Vec::new(),
        });
    }

    for child in &section.children {
        iteration.extend(expand(child));
    }

    iteration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_catalog;

    fn names(steps: &[FlattenedStep]) -> Vec<&str> {
        steps.iter().map(|s| s.timer.name.as_str()).collect()
    }

    fn two_timer_workout() -> Workout {
        Workout::new("Simple").with_section(
            Section::new("Main")
                .with_repeats(2)
                .with_timer(Timer::new("T10", 10))
                .with_timer(Timer::new("T20", 20)),
        )
    }

    #[test]
    fn test_repeat_major_order() {
        let steps = flatten(&two_timer_workout());

        assert_eq!(names(&steps), vec!["T10", "T20", "T10", "T20"]);
        let repeats: Vec<(u32, u32)> = steps
            .iter()
            .map(|s| (s.current_repeat(), s.total_repeats()))
            .collect();
        assert_eq!(repeats, vec![(1, 2), (1, 2), (2, 2), (2, 2)]);
        let indices: Vec<usize> = steps.iter().map(|s| s.index_in_repeat()).collect();
        assert_eq!(indices, vec![0, 1, 0, 1]);
        assert!(steps.iter().all(|s| s.steps_in_repeat() == 2));
    }

    #[test]
    fn test_global_indices_are_sequential() {
        let workout = two_timer_workout().with_section(
            Section::new("Cool Down").with_timer(Timer::new("Rest", 30)),
        );
        let steps = flatten(&workout);

        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.global_index, i);
        }
        assert_eq!(steps[4].root_section_index, 1);
        assert_eq!(steps[3].root_section_index, 0);
    }

    #[test]
    fn test_empty_workout_yields_nothing() {
        assert!(flatten(&Workout::new("Empty")).is_empty());

        let hollow = Workout::new("Hollow")
            .with_section(Section::new("Nothing").with_repeats(5))
            .with_section(Section::new("Parent").with_child(Section::new("Child")));
        assert!(flatten(&hollow).is_empty());
        assert_eq!(hollow.calculate_total_steps(), 0);
    }

    #[test]
    fn test_nested_repeats_expand_inside_parent() {
        let workout = Workout::new("Nested").with_section(
            Section::new("Outer")
                .with_repeats(2)
                .with_timer(Timer::new("A", 10))
                .with_child(
                    Section::new("Inner")
                        .with_repeats(2)
                        .with_timer(Timer::new("B", 5)),
                ),
        );
        let steps = flatten(&workout);

        assert_eq!(names(&steps), vec!["A", "B", "B", "A", "B", "B"]);
        assert_eq!(steps.len(), workout.calculate_total_steps());

        // B in the second outer repeat, second inner repeat
        let b = &steps[5];
        assert_eq!(b.section().name, "Inner");
        assert_eq!((b.current_repeat(), b.total_repeats()), (2, 2));
        let outer = &b.ancestors[0];
        assert_eq!(outer.section.name, "Outer");
        assert_eq!((outer.current_repeat, outer.total_repeats), (2, 2));
        assert_eq!(outer.index_in_repeat, 2);
        assert_eq!(outer.steps_in_repeat, 3);

        // A's owner is Outer with no ancestors
        assert!(steps[3].ancestors.is_empty());
        assert_eq!(steps[3].index_in_repeat(), 0);
        assert_eq!(steps[3].steps_in_repeat(), 3);
    }

    #[test]
    fn test_each_repeat_is_a_contiguous_copy() {
        let workout = build_default_catalog()
            .into_iter()
            .find(|w| w.id == "advanced_vinyasa")
            .unwrap();
        let steps = flatten(&workout);
        let sun = &workout.sections[0];
        let per_repeat = sun.one_iteration_steps();

        for r in 0..sun.repeat_count as usize {
            let copy = &steps[r * per_repeat..(r + 1) * per_repeat];
            assert_eq!(
                names(copy),
                names(&steps[..per_repeat]),
                "repeat {} differs",
                r + 1
            );
            assert!(copy
                .iter()
                .all(|s| s.current_repeat() as usize == r + 1 && s.total_repeats() == 3));
        }
    }

    #[test]
    fn test_zero_length_timers_are_dropped() {
        let workout = Workout::new("Malformed").with_section(
            Section::new("Main")
                .with_timer(Timer::new("Broken", 0))
                .with_timer(Timer::new("Fine", 15)),
        );
        let steps = flatten(&workout);

        assert_eq!(names(&steps), vec!["Fine"]);
        assert_eq!(steps.len(), workout.calculate_total_steps());
        assert_eq!(steps[0].index_in_repeat(), 0);
    }

    #[test]
    fn test_total_steps_matches_flattened_length_for_catalog() {
        for workout in build_default_catalog() {
            let steps = flatten(&workout);
            assert_eq!(steps.len(), workout.calculate_total_steps(), "{}", workout.name);
            let duration: u64 = steps.iter().map(|s| u64::from(s.duration_seconds())).sum();
            assert_eq!(duration, workout.calculate_total_duration(), "{}", workout.name);
        }
    }
}
