//! Event-to-metric routing table.
//!
//! Each row says "when this event happens, project this counter into these
//! slots of this role's vector". Rows are data: a new badge tier is a new row,
//! the projector never changes. Rows for the same event and role apply in
//! table order, each one working on the output of the previous.

use serde::{Deserialize, Serialize};

use crate::model::{EventKind, Metric, MetricSnapshot, ProgressVector, Role};
use crate::projector::project;

//
// ─── PROJECTION RULE ───────────────────────────────────────────────────────────
//

/// `goals[i]` is the metric value at which `slots[i]` reaches 100%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRule {
    pub role: Role,
    pub metric: Metric,
    pub goals: Vec<f64>,
    pub slots: Vec<usize>,
}

impl ProjectionRule {
    #[must_use]
    pub fn new(role: Role, metric: Metric, goals: &[f64], slots: &[usize]) -> Self {
        Self {
            role,
            metric,
            goals: goals.to_vec(),
            slots: slots.to_vec(),
        }
    }

    /// Project this rule's metric from `metrics` onto `vector`.
    #[must_use]
    pub fn apply(&self, metrics: &MetricSnapshot, vector: &ProgressVector) -> ProgressVector {
        project(metrics.get(self.metric), &self.goals, &self.slots, vector)
    }
}

/// A routing row: which event triggers which rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub event: EventKind,
    pub rule: ProjectionRule,
}

//
// ─── ROUTING TABLE ─────────────────────────────────────────────────────────────
//

/// Ordered list of routes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The platform's production routing table.
    #[must_use]
    pub fn standard() -> Self {
        let routes = STANDARD_ROUTES
            .iter()
            .map(|row| Route {
                event: row.event,
                rule: ProjectionRule::new(row.role, row.metric, row.goals, row.slots),
            })
            .collect();
        Self { routes }
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Rules the event applies to `role`, in application order.
    pub fn rules_for(&self, event: EventKind, role: Role) -> impl Iterator<Item = &ProjectionRule> {
        self.routes
            .iter()
            .filter(move |r| r.event == event && r.rule.role == role)
            .map(|r| &r.rule)
    }

    /// Roles the event credits, student first.
    #[must_use]
    pub fn roles_for(&self, event: EventKind) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.rules_for(event, *role).next().is_some())
            .collect()
    }

    /// Every distinct rule touching `role`, first occurrence order.
    ///
    /// Used to rebuild a vector from stored counters.
    #[must_use]
    pub fn rules_for_role(&self, role: Role) -> Vec<&ProjectionRule> {
        let mut out: Vec<&ProjectionRule> = Vec::new();
        for route in &self.routes {
            if route.rule.role == role && !out.contains(&&route.rule) {
                out.push(&route.rule);
            }
        }
        out
    }

    /// Thread `vector` through every rule `event` applies to `role`.
    #[must_use]
    pub fn project_event(
        &self,
        event: EventKind,
        role: Role,
        metrics: &MetricSnapshot,
        vector: &ProgressVector,
    ) -> ProgressVector {
        self.rules_for(event, role)
            .fold(*vector, |acc, rule| rule.apply(metrics, &acc))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

//
// ─── STANDARD TABLE ────────────────────────────────────────────────────────────
//

struct RouteRow {
    event: EventKind,
    role: Role,
    metric: Metric,
    goals: &'static [f64],
    slots: &'static [usize],
}

const fn row(
    event: EventKind,
    role: Role,
    metric: Metric,
    goals: &'static [f64],
    slots: &'static [usize],
) -> RouteRow {
    RouteRow {
        event,
        role,
        metric,
        goals,
        slots,
    }
}

const VOLUME_GOALS: &[f64] = &[1.0, 5.0, 10.0, 20.0];
const VOLUME_SLOTS: &[usize] = &[0, 1, 2, 3];
const OUTCOME_GOALS: &[f64] = &[1.0, 3.0, 10.0];
const OUTCOME_SLOTS: &[usize] = &[4, 5, 6];
const POINT_GOALS: &[f64] = &[10.0, 25.0, 50.0, 100.0, 200.0];
const POINT_SLOTS: &[usize] = &[7, 8, 9, 10, 11];
const TIER_GOALS: &[f64] = &[1.0, 5.0, 10.0];
const SESSION_SLOTS: &[usize] = &[12, 13, 14];
const COURSE_GOALS: &[f64] = &[1.0, 3.0, 5.0, 10.0];
const COURSE_SLOTS: &[usize] = &[15, 16, 17, 18];
const ASSIGNMENT_SLOTS: &[usize] = &[19, 20, 21];
const RATED_SLOTS: &[usize] = &[22, 23, 24];
const RECEIVED_SLOTS: &[usize] = &[25, 26, 27];

use crate::model::EventKind as E;
use crate::model::Metric as M;
use crate::model::Role::{Student as S, Tutor as T};

#[rustfmt::skip]
const STANDARD_ROUTES: &[RouteRow] = &[
    row(E::RequestSent, S, M::RequestsSent, VOLUME_GOALS, VOLUME_SLOTS),
    row(E::RequestSent, S, M::StudentPoints, POINT_GOALS, POINT_SLOTS),
    row(E::RequestSent, T, M::TutorPoints, POINT_GOALS, POINT_SLOTS),

    row(E::RequestDenied, T, M::RequestsDenied, OUTCOME_GOALS, OUTCOME_SLOTS),

    row(E::RequestAccepted, S, M::AcceptedRequests, OUTCOME_GOALS, OUTCOME_SLOTS),
    row(E::RequestAccepted, S, M::StudentPoints, POINT_GOALS, POINT_SLOTS),
    row(E::RequestAccepted, T, M::RequestsAccepted, VOLUME_GOALS, VOLUME_SLOTS),
    row(E::RequestAccepted, T, M::TutorPoints, POINT_GOALS, POINT_SLOTS),

    row(E::SessionCompleted, S, M::SessionsCompletedAsStudent, TIER_GOALS, SESSION_SLOTS),
    row(E::SessionCompleted, S, M::StudentPoints, POINT_GOALS, POINT_SLOTS),
    row(E::SessionCompleted, T, M::AssignmentsCreated, TIER_GOALS, ASSIGNMENT_SLOTS),
    row(E::SessionCompleted, T, M::SessionsCompletedAsTutor, TIER_GOALS, SESSION_SLOTS),
    row(E::SessionCompleted, T, M::TutorPoints, POINT_GOALS, POINT_SLOTS),

    row(E::SessionCompletedWithRating, S, M::RatingsReceivedAsStudent, TIER_GOALS, RECEIVED_SLOTS),
    row(E::SessionCompletedWithRating, S, M::SessionsCompletedAsStudent, TIER_GOALS, SESSION_SLOTS),
    row(E::SessionCompletedWithRating, S, M::StudentPoints, POINT_GOALS, POINT_SLOTS),
    row(E::SessionCompletedWithRating, T, M::StudentsRated, TIER_GOALS, RATED_SLOTS),
    row(E::SessionCompletedWithRating, T, M::AssignmentsCreated, TIER_GOALS, ASSIGNMENT_SLOTS),
    row(E::SessionCompletedWithRating, T, M::SessionsCompletedAsTutor, TIER_GOALS, SESSION_SLOTS),
    row(E::SessionCompletedWithRating, T, M::TutorPoints, POINT_GOALS, POINT_SLOTS),

    row(E::AssignmentCompleted, S, M::AssignmentsTaken, TIER_GOALS, ASSIGNMENT_SLOTS),
    row(E::AssignmentCompleted, S, M::StudentPoints, POINT_GOALS, POINT_SLOTS),

    row(E::AssessmentCompletedAsStudent, S, M::EligibleCoursesAsStudent, COURSE_GOALS, COURSE_SLOTS),
    row(E::AssessmentCompletedAsStudent, S, M::StudentPoints, POINT_GOALS, POINT_SLOTS),
    row(E::AssessmentCompletedAsTutor, T, M::EligibleCoursesAsTutor, COURSE_GOALS, COURSE_SLOTS),
    row(E::AssessmentCompletedAsTutor, T, M::TutorPoints, POINT_GOALS, POINT_SLOTS),

    row(E::StudentRatedTutor, S, M::TutorsRated, TIER_GOALS, RATED_SLOTS),
    row(E::StudentRatedTutor, T, M::RatingsReceivedAsTutor, TIER_GOALS, RECEIVED_SLOTS),

    row(E::TutorRatedStudent, S, M::RatingsReceivedAsStudent, TIER_GOALS, RECEIVED_SLOTS),
    row(E::TutorRatedStudent, T, M::StudentsRated, TIER_GOALS, RATED_SLOTS),
];
