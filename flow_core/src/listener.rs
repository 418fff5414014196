//! Step listeners: the sound/speech collaborator seam.
//!
//! The runner calls a [`StepListener`] when a step starts, when a step
//! counts down to zero (before advancing), and when the workout completes.
//! Listener failures are logged and ignored so they never stall the
//! countdown.

use crate::{FlattenedStep, Result};

/// Receives execution events from the runner
///
/// Calls are made while the runner holds its state lock, so listeners must
/// return promptly and must not call back into the runner.
pub trait StepListener: Send + Sync {
    fn step_started(&self, _step: &FlattenedStep) -> Result<()> {
        Ok(())
    }

    fn step_completed(&self, step: &FlattenedStep) -> Result<()>;

    fn workout_completed(&self) -> Result<()> {
        Ok(())
    }
}

/// What a speech collaborator should say when a step starts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    /// Sections whose (repeat) begins at this step, outermost first
    pub sections: Vec<String>,
    pub timer: String,
}

impl Announcement {
    /// Everything joined into one utterance
    pub fn text(&self) -> String {
        let mut parts = self.sections.clone();
        parts.push(self.timer.clone());
        parts.join(". ")
    }
}

/// Build the announcement for a starting step
///
/// A section is announced at the first step of each of its repeats, with
/// "repeat N of M" when it repeats more than once.
pub fn announcement(step: &FlattenedStep) -> Announcement {
    let sections = step
        .frames()
        .filter(|frame| frame.is_first_in_repeat())
        .map(|frame| {
            if frame.total_repeats > 1 {
                format!(
                    "{}, repeat {} of {}",
                    frame.section.name, frame.current_repeat, frame.total_repeats
                )
            } else {
                frame.section.name.clone()
            }
        })
        .collect();

    Announcement {
        sections,
        timer: step.timer.name.clone(),
    }
}

/// Listener that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl StepListener for NoopListener {
    fn step_completed(&self, _step: &FlattenedStep) -> Result<()> {
        Ok(())
    }
}

/// Listener that logs announcements through tracing
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingListener;

impl StepListener for TracingListener {
    fn step_started(&self, step: &FlattenedStep) -> Result<()> {
        tracing::info!("Announce: {}", announcement(step).text());
        Ok(())
    }

    fn step_completed(&self, step: &FlattenedStep) -> Result<()> {
        tracing::info!(
            "Step {} '{}' complete",
            step.global_index + 1,
            step.timer.name
        );
        Ok(())
    }

    fn workout_completed(&self) -> Result<()> {
        tracing::info!("Workout complete! Great job!");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::recording::{ListenerEvent, RecordingListener};
    use super::*;
    use crate::{build_default_catalog, flatten, Section, Timer, Workout};

    #[test]
    fn test_repeat_announcement_at_iteration_start() {
        let workout = Workout::new("Flow").with_section(
            Section::new("Sun Salutations")
                .with_repeats(3)
                .with_timer(Timer::new("Forward Fold", 15))
                .with_timer(Timer::new("Plank", 20)),
        );
        let steps = flatten(&workout);

        assert_eq!(
            announcement(&steps[2]).text(),
            "Sun Salutations, repeat 2 of 3. Forward Fold"
        );
        // Mid-iteration only the timer is announced
        assert_eq!(announcement(&steps[3]).text(), "Plank");
    }

    #[test]
    fn test_single_pass_section_announced_by_name() {
        let workout = Workout::new("Flow")
            .with_section(Section::new("Warm Up").with_timer(Timer::new("Child's Pose", 60)));
        let steps = flatten(&workout);

        let a = announcement(&steps[0]);
        assert_eq!(a.sections, vec!["Warm Up".to_string()]);
        assert_eq!(a.timer, "Child's Pose");
    }

    #[test]
    fn test_nested_sections_announced_outermost_first() {
        let workout = build_default_catalog()
            .into_iter()
            .find(|w| w.id == "advanced_vinyasa")
            .unwrap();
        let steps = flatten(&workout);

        // Sun Salutations is 3 x 5 steps; Warrior Flow starts at 15
        let a = announcement(&steps[15]);
        assert_eq!(
            a.sections,
            vec![
                "Warrior Flow, repeat 1 of 2".to_string(),
                "Right Side".to_string()
            ]
        );
        // Left Side begins mid-iteration of Warrior Flow
        let a = announcement(&steps[18]);
        assert_eq!(a.sections, vec!["Left Side".to_string()]);
    }

    #[test]
    fn test_recording_listener_failing_still_records() {
        let listener = RecordingListener::failing();
        let workout = Workout::new("W")
            .with_section(Section::new("S").with_timer(Timer::new("T", 1)));
        let steps = flatten(&workout);

        assert!(listener.step_completed(&steps[0]).is_err());
        assert_eq!(listener.events(), vec![ListenerEvent::Completed(0)]);
    }

    #[test]
    fn test_builtin_listeners_accept_every_event() {
        crate::logging::init_test();
        let workout = Workout::new("W")
            .with_section(Section::new("S").with_timer(Timer::new("T", 1)));
        let steps = flatten(&workout);

        let listeners: [&dyn StepListener; 2] = [&NoopListener, &TracingListener];
        for listener in listeners {
            assert!(listener.step_started(&steps[0]).is_ok());
            assert!(listener.step_completed(&steps[0]).is_ok());
            assert!(listener.workout_completed().is_ok());
        }
    }
}
