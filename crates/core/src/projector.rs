//! Threshold projection: metric value + goals → slot percentages.

use crate::model::{COMPLETE, ProgressVector, SLOT_COUNT};

/// Project a metric value onto the named slots of `vector`.
///
/// Each `slots[i]` becomes `min(100 * metric_value / goals[i], 100)`, floored
/// at zero. Slots not listed are copied through unchanged. The input is left
/// untouched so callers can diff before and after.
///
/// # Panics
///
/// Panics if `goals` and `slots` differ in length, if a slot is outside the
/// vector, or if a goal is not strictly positive. Routing rules are validated
/// when the engine configuration is built, so reaching one of these is a bug.
///
/// ```
/// # use progress_core::model::ProgressVector;
/// # use progress_core::projector::project;
/// let after = project(1.0, &[1.0, 5.0], &[0, 1], &ProgressVector::zeroed());
/// assert_eq!(after.get(0), Some(100.0));
/// assert_eq!(after.get(1), Some(20.0));
/// ```
#[must_use]
pub fn project(
    metric_value: f64,
    goals: &[f64],
    slots: &[usize],
    vector: &ProgressVector,
) -> ProgressVector {
    assert_eq!(
        goals.len(),
        slots.len(),
        "projection needs one goal per slot"
    );

    let mut out = *vector;
    for (goal, slot) in goals.iter().copied().zip(slots.iter().copied()) {
        assert!(slot < SLOT_COUNT, "slot {slot} is outside the progress vector");
        assert!(goal > 0.0, "goal for slot {slot} must be positive, got {goal}");
        let pct = (COMPLETE * metric_value / goal).clamp(0.0, COMPLETE);
        out.set(slot, pct);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GOALS: [f64; 4] = [1.0, 5.0, 10.0, 20.0];
    const SLOTS: [usize; 4] = [0, 1, 2, 3];

    #[test]
    fn first_goal_reached_fills_first_slot() {
        let out = project(1.0, &GOALS, &SLOTS, &ProgressVector::zeroed());
        assert_eq!(out.get(0), Some(100.0));
        assert_eq!(out.get(1), Some(20.0));
        assert_eq!(out.get(2), Some(10.0));
        assert_eq!(out.get(3), Some(5.0));
        assert_eq!(out.get(4), Some(0.0));
    }

    #[test]
    fn half_way_to_goal_is_fifty_percent() {
        let out = project(0.5, &[1.0], &[0], &ProgressVector::zeroed());
        assert_eq!(out.get(0), Some(50.0));
    }

    #[test]
    fn overshoot_clamps_to_exactly_one_hundred() {
        let out = project(1_000.0, &GOALS, &SLOTS, &ProgressVector::zeroed());
        for slot in SLOTS {
            assert_eq!(out.get(slot), Some(100.0));
        }
    }

    #[test]
    fn input_vector_is_not_mutated() {
        let before = ProgressVector::zeroed();
        let _ = project(3.0, &GOALS, &SLOTS, &before);
        assert_eq!(before, ProgressVector::zeroed());
    }

    #[test]
    #[should_panic(expected = "one goal per slot")]
    fn mismatched_lengths_fail_fast() {
        let _ = project(1.0, &[1.0, 2.0], &[0], &ProgressVector::zeroed());
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn zero_goal_fails_fast() {
        let _ = project(1.0, &[0.0], &[0], &ProgressVector::zeroed());
    }

    fn any_vector() -> impl Strategy<Value = ProgressVector> {
        proptest::collection::vec(0.0f64..=100.0, SLOT_COUNT)
            .prop_map(|values| ProgressVector::from_values(&values).unwrap())
    }

    proptest! {
        #[test]
        fn projected_values_stay_in_range(
            metric in 0.0f64..10_000.0,
            vector in any_vector(),
        ) {
            let out = project(metric, &GOALS, &SLOTS, &vector);
            for value in out.values() {
                prop_assert!((0.0..=100.0).contains(value));
            }
        }

        #[test]
        fn larger_metric_never_projects_lower(
            small in 0.0f64..500.0,
            extra in 0.0f64..500.0,
            vector in any_vector(),
        ) {
            let low = project(small, &GOALS, &SLOTS, &vector);
            let high = project(small + extra, &GOALS, &SLOTS, &vector);
            for slot in SLOTS {
                prop_assert!(high.get(slot) >= low.get(slot));
            }
        }

        #[test]
        fn unlisted_slots_pass_through(
            metric in 0.0f64..1_000.0,
            vector in any_vector(),
        ) {
            let out = project(metric, &GOALS, &SLOTS, &vector);
            for slot in SLOTS.len()..SLOT_COUNT {
                prop_assert_eq!(out.get(slot), vector.get(slot));
            }
        }
    }
}
