//! Completion detection between two snapshots of a progress vector.

use crate::catalog::Catalog;
use crate::model::{COMPLETE, ProgressVector, Role, SLOT_COUNT};

/// Titles of achievements that became complete between `before` and `after`.
///
/// A slot counts when its value changed and is now at 100. Equality is exact:
/// a slot already at 100 that is recomputed to 100 does not fire again, which
/// is what makes re-delivered events safe. Titles come back in slot order.
#[must_use]
pub fn detect_completions(
    before: &ProgressVector,
    after: &ProgressVector,
    role: Role,
    catalog: &Catalog,
) -> Vec<String> {
    newly_completed_slots(before, after)
        .filter_map(|slot| catalog.title(role, slot).map(str::to_owned))
        .collect()
}

/// Slot ids that crossed into completion, ascending.
#[allow(clippy::float_cmp)]
pub fn newly_completed_slots<'a>(
    before: &'a ProgressVector,
    after: &'a ProgressVector,
) -> impl Iterator<Item = usize> + 'a {
    (0..SLOT_COUNT).filter(move |slot| {
        let (was, now) = (before.values()[*slot], after.values()[*slot]);
        was != now && now >= COMPLETE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::project;

    fn catalog() -> Catalog {
        Catalog::standard().unwrap()
    }

    #[test]
    fn reports_slot_that_crossed_one_hundred() {
        let before = ProgressVector::zeroed();
        let after = project(1.0, &[1.0, 5.0, 10.0, 20.0], &[0, 1, 2, 3], &before);
        assert_eq!(
            detect_completions(&before, &after, Role::Student, &catalog()),
            vec!["First Request".to_string()]
        );
    }

    #[test]
    fn already_complete_slot_does_not_fire_again() {
        let goals = [1.0, 5.0, 10.0, 20.0];
        let slots = [0, 1, 2, 3];
        let first = project(1.0, &goals, &slots, &ProgressVector::zeroed());
        let second = project(5.0, &goals, &slots, &first);
        assert_eq!(
            detect_completions(&first, &second, Role::Student, &catalog()),
            vec!["Curious Mind".to_string()]
        );
        let repeat = project(5.0, &goals, &slots, &second);
        assert!(detect_completions(&second, &repeat, Role::Student, &catalog()).is_empty());
    }

    #[test]
    fn partial_progress_is_not_a_completion() {
        let before = ProgressVector::zeroed();
        let after = project(0.5, &[1.0], &[0], &before);
        assert!(detect_completions(&before, &after, Role::Student, &catalog()).is_empty());
    }

    #[test]
    fn identical_vectors_yield_nothing() {
        let v = project(3.0, &[1.0, 5.0], &[12, 13], &ProgressVector::zeroed());
        assert!(detect_completions(&v, &v, Role::Tutor, &catalog()).is_empty());
    }

    #[test]
    fn titles_follow_slot_order_and_role() {
        let before = ProgressVector::zeroed();
        let mid = project(10.0, &[1.0, 5.0, 10.0], &[25, 26, 27], &before);
        let after = project(1.0, &[1.0], &[4], &mid);
        assert_eq!(
            detect_completions(&before, &after, Role::Tutor, &catalog()),
            vec![
                "Boundary Setter".to_string(),
                "First Review".to_string(),
                "Well Reviewed".to_string(),
                "Student Favorite".to_string(),
            ]
        );
    }
}
