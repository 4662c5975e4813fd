//! Achievement catalog: one titled definition per role and slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::model::{Role, SLOT_COUNT};

/// A single badge a user can earn in one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub slot: usize,
    pub role: Role,
    pub title: String,
    pub description: String,
}

impl AchievementDefinition {
    #[must_use]
    pub fn new(
        role: Role,
        slot: usize,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            role,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Read-only lookup of achievement definitions by `(role, slot)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    definitions: BTreeMap<(Role, usize), AchievementDefinition>,
}

impl Catalog {
    /// Build a catalog from explicit definitions.
    ///
    /// A catalog may cover fewer than `SLOT_COUNT` slots per role; routing
    /// validation rejects rules that point at a slot with no definition.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for out-of-range slots, duplicates, or empty titles.
    pub fn new(
        definitions: impl IntoIterator<Item = AchievementDefinition>,
    ) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for def in definitions {
            let (role, slot) = (def.role, def.slot);
            if slot >= SLOT_COUNT {
                return Err(ConfigError::SlotOutOfRange { role, slot });
            }
            if def.title.trim().is_empty() {
                return Err(ConfigError::EmptyTitle { role, slot });
            }
            if map.insert((role, slot), def).is_some() {
                return Err(ConfigError::DuplicateDefinition { role, slot });
            }
        }
        Ok(Self { definitions: map })
    }

    /// The platform's built-in catalog: 28 badges per role.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the built-in table is malformed.
    pub fn standard() -> Result<Self, ConfigError> {
        let student = STUDENT_ACHIEVEMENTS
            .iter()
            .enumerate()
            .map(|(slot, (title, desc))| AchievementDefinition::new(Role::Student, slot, *title, *desc));
        let tutor = TUTOR_ACHIEVEMENTS
            .iter()
            .enumerate()
            .map(|(slot, (title, desc))| AchievementDefinition::new(Role::Tutor, slot, *title, *desc));
        Self::new(student.chain(tutor))
    }

    #[must_use]
    pub fn get(&self, role: Role, slot: usize) -> Option<&AchievementDefinition> {
        self.definitions.get(&(role, slot))
    }

    #[must_use]
    pub fn title(&self, role: Role, slot: usize) -> Option<&str> {
        self.get(role, slot).map(|d| d.title.as_str())
    }

    /// Definitions for one role in ascending slot order.
    pub fn for_role(&self, role: Role) -> impl Iterator<Item = &AchievementDefinition> {
        self.definitions
            .range((role, 0)..(role, SLOT_COUNT))
            .map(|(_, def)| def)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

//
// ─── BUILT-IN TABLE ────────────────────────────────────────────────────────────
//
// Index in each array is the slot id. Slot groups are shared across roles:
// 0-3 request volume, 4-6 request outcomes, 7-11 points, 12-14 sessions,
// 15-18 eligible courses, 19-21 assignments, 22-24 ratings given,
// 25-27 ratings received.

const STUDENT_ACHIEVEMENTS: [(&str, &str); SLOT_COUNT] = [
    ("First Request", "Send your first tutoring request."),
    ("Curious Mind", "Send 5 tutoring requests."),
    ("Knowledge Seeker", "Send 10 tutoring requests."),
    ("Relentless Learner", "Send 20 tutoring requests."),
    ("Welcome Aboard", "Have a tutoring request accepted."),
    ("Trusted Learner", "Have 3 tutoring requests accepted."),
    ("Sought-After Student", "Have 10 tutoring requests accepted."),
    ("Rising Star", "Earn 10 student points."),
    ("Steady Climber", "Earn 25 student points."),
    ("Scholar", "Earn 50 student points."),
    ("Honor Roll", "Earn 100 student points."),
    ("Valedictorian", "Earn 200 student points."),
    ("First Session", "Complete a tutoring session."),
    ("Regular Attendee", "Complete 5 tutoring sessions."),
    ("Session Veteran", "Complete 10 tutoring sessions."),
    ("Course Explorer", "Become eligible for a course."),
    ("Well-Rounded", "Become eligible for 3 courses."),
    ("Multidisciplinary", "Become eligible for 5 courses."),
    ("Polymath", "Become eligible for 10 courses."),
    ("First Assignment", "Complete an assignment."),
    ("Diligent Worker", "Complete 5 assignments."),
    ("Assignment Ace", "Complete 10 assignments."),
    ("Feedback Giver", "Rate a tutor."),
    ("Honest Critic", "Rate 5 tutors."),
    ("Review Regular", "Rate 10 tutors."),
    ("Rated Student", "Receive a rating from a tutor."),
    ("Well Regarded", "Receive 5 ratings from tutors."),
    ("Class Favorite", "Receive 10 ratings from tutors."),
];

const TUTOR_ACHIEVEMENTS: [(&str, &str); SLOT_COUNT] = [
    ("Open Door", "Accept a tutoring request."),
    ("Helping Hand", "Accept 5 tutoring requests."),
    ("Dedicated Mentor", "Accept 10 tutoring requests."),
    ("Master Mentor", "Accept 20 tutoring requests."),
    ("Boundary Setter", "Decline a tutoring request."),
    ("Selective Schedule", "Decline 3 tutoring requests."),
    ("In High Demand", "Decline 10 tutoring requests."),
    ("Apprentice Tutor", "Earn 10 tutor points."),
    ("Skilled Tutor", "Earn 25 tutor points."),
    ("Expert Tutor", "Earn 50 tutor points."),
    ("Elite Tutor", "Earn 100 tutor points."),
    ("Legendary Tutor", "Earn 200 tutor points."),
    ("First Lesson", "Teach a tutoring session."),
    ("Seasoned Tutor", "Teach 5 tutoring sessions."),
    ("Session Master", "Teach 10 tutoring sessions."),
    ("Certified", "Qualify to tutor a course."),
    ("Versatile Teacher", "Qualify to tutor 3 courses."),
    ("Subject Specialist", "Qualify to tutor 5 courses."),
    ("Faculty of One", "Qualify to tutor 10 courses."),
    ("Taskmaster", "Create an assignment."),
    ("Curriculum Builder", "Create 5 assignments."),
    ("Assignment Architect", "Create 10 assignments."),
    ("Mentor's Eye", "Rate a student."),
    ("Thoughtful Evaluator", "Rate 5 students."),
    ("Seasoned Evaluator", "Rate 10 students."),
    ("First Review", "Receive a rating from a student."),
    ("Well Reviewed", "Receive 5 ratings from students."),
    ("Student Favorite", "Receive 10 ratings from students."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_dense_for_both_roles() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.len(), 2 * SLOT_COUNT);
        for role in Role::ALL {
            let slots: Vec<usize> = catalog.for_role(role).map(|d| d.slot).collect();
            assert_eq!(slots, (0..SLOT_COUNT).collect::<Vec<_>>());
        }
        assert_eq!(catalog.title(Role::Student, 0), Some("First Request"));
        assert_eq!(catalog.title(Role::Tutor, 27), Some("Student Favorite"));
    }

    #[test]
    fn rejects_duplicates_and_out_of_range_slots() {
        let dup = Catalog::new([
            AchievementDefinition::new(Role::Tutor, 1, "A", ""),
            AchievementDefinition::new(Role::Tutor, 1, "B", ""),
        ]);
        assert_eq!(
            dup.unwrap_err(),
            ConfigError::DuplicateDefinition {
                role: Role::Tutor,
                slot: 1
            }
        );

        let far = Catalog::new([AchievementDefinition::new(Role::Student, SLOT_COUNT, "X", "")]);
        assert!(matches!(far, Err(ConfigError::SlotOutOfRange { .. })));

        let blank = Catalog::new([AchievementDefinition::new(Role::Student, 0, "  ", "")]);
        assert!(matches!(blank, Err(ConfigError::EmptyTitle { .. })));
    }

    #[test]
    fn same_slot_in_different_roles_is_distinct() {
        let catalog = Catalog::new([
            AchievementDefinition::new(Role::Student, 0, "S0", ""),
            AchievementDefinition::new(Role::Tutor, 0, "T0", ""),
        ])
        .unwrap();
        assert_eq!(catalog.title(Role::Student, 0), Some("S0"));
        assert_eq!(catalog.title(Role::Tutor, 0), Some("T0"));
        assert_eq!(catalog.title(Role::Tutor, 1), None);
    }
}
