//! Default catalog of preloaded workouts.
//!
//! These are seeded into an empty workout library on first use.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Vec<Workout>> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static [Workout] {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of preloaded workouts
pub fn build_default_catalog() -> Vec<Workout> {
    vec![beginner_yoga_flow(), advanced_vinyasa()]
}

/// Section with ids derived from its parent so catalog ids stay stable
fn section(parent_id: &str, slug: &str, name: &str, timers: &[(&str, u32)]) -> Section {
    let id = format!("{}.{}", parent_id, slug);
    let mut section = Section::new(name).with_id(&id);
    for (i, (timer_name, seconds)) in timers.iter().enumerate() {
        let timer = Timer::new(*timer_name, *seconds).with_id(format!("{}.{}", id, i));
        section = section.with_timer(timer);
    }
    section
}

fn preloaded(id: &str, name: &str, description: &str) -> Workout {
    let mut workout = Workout::new(name).with_id(id).with_description(description);
    workout.preloaded = true;
    workout
}

fn beginner_yoga_flow() -> Workout {
    let id = "beginner_yoga_flow";

    preloaded(id, "Beginner Yoga Flow", "Gentle introduction to yoga poses")
        .with_section(
            section(
                id,
                "warm_up",
                "Warm Up",
                &[("Child's Pose", 60), ("Cat-Cow", 30), ("Downward Dog", 45)],
            )
            .with_description("Prepare your body"),
        )
        .with_section(
            section(
                id,
                "standing",
                "Standing Poses",
                &[
                    ("Mountain Pose", 30),
                    ("Forward Fold", 45),
                    ("Tree Pose (Right)", 30),
                    ("Tree Pose (Left)", 30),
                ],
            )
            .with_description("Build strength and balance"),
        )
        .with_section(
            section(
                id,
                "cool_down",
                "Cool Down",
                &[("Seated Twist", 30), ("Corpse Pose", 120)],
            )
            .with_description("Relax and restore"),
        )
}

fn advanced_vinyasa() -> Workout {
    let id = "advanced_vinyasa";
    let warrior_id = format!("{}.warrior_flow", id);
    let warrior_side = [("Warrior I", 45), ("Warrior II", 45), ("Triangle", 30)];

    preloaded(id, "Advanced Vinyasa", "Dynamic flow for experienced practitioners")
        .with_section(
            section(
                id,
                "sun_salutations",
                "Sun Salutations",
                &[
                    ("Forward Fold", 15),
                    ("Plank", 20),
                    ("Chaturanga", 10),
                    ("Upward Dog", 15),
                    ("Downward Dog", 20),
                ],
            )
            .with_description("Warm up with sun salutations")
            .with_repeats(3),
        )
        .with_section(
            section(id, "warrior_flow", "Warrior Flow", &[])
                .with_description("Build strength and stamina")
                .with_repeats(2)
                .with_child(section(&warrior_id, "right", "Right Side", &warrior_side))
                .with_child(section(&warrior_id, "left", "Left Side", &warrior_side)),
        )
        .with_section(section(
            id,
            "cool_down",
            "Cool Down",
            &[("Pigeon Pose", 60), ("Savasana", 180)],
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contents() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|w| w.preloaded));
    }

    #[test]
    fn test_beginner_totals() {
        let workout = &build_default_catalog()[0];
        assert_eq!(workout.calculate_total_steps(), 9);
        assert_eq!(workout.calculate_total_duration(), 420);
    }

    #[test]
    fn test_advanced_totals() {
        let workout = &build_default_catalog()[1];
        // 3 x 5 sun salutations + 2 x (3 + 3) warrior + 2 cool down
        assert_eq!(workout.calculate_total_steps(), 29);
        // 3 x 80 + 2 x 240 + 240
        assert_eq!(workout.calculate_total_duration(), 960);
    }

    #[test]
    fn test_ids_are_stable() {
        let a = build_default_catalog();
        let b = build_default_catalog();
        assert_eq!(a[1].sections[1].children[0].id, b[1].sections[1].children[0].id);
        assert_eq!(
            a[1].sections[1].children[0].timers[2].id,
            "advanced_vinyasa.warrior_flow.right.2"
        );
        assert_eq!(get_default_catalog()[0].id, "beginner_yoga_flow");
    }
}
