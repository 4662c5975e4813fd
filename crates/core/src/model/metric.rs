use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::role::Role;

//
// ─── METRIC ────────────────────────────────────────────────────────────────────
//

/// A named cumulative counter or point total kept on a user-role record.
///
/// Metrics only ever grow. Each one belongs to exactly one role, so the
/// counters for a user's student side and tutor side never share a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    // student side
    StudentPoints,
    RequestsSent,
    AcceptedRequests,
    DeniedRequests,
    SessionsCompletedAsStudent,
    AssignmentsTaken,
    TutorsRated,
    RatingsReceivedAsStudent,
    EligibleCoursesAsStudent,
    // tutor side
    TutorPoints,
    RequestsReceived,
    RequestsAccepted,
    RequestsDenied,
    SessionsCompletedAsTutor,
    AssignmentsCreated,
    StudentsRated,
    RatingsReceivedAsTutor,
    EligibleCoursesAsTutor,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown metric: {0}")]
pub struct MetricParseError(pub String);

impl Metric {
    pub const ALL: [Metric; 18] = [
        Metric::StudentPoints,
        Metric::RequestsSent,
        Metric::AcceptedRequests,
        Metric::DeniedRequests,
        Metric::SessionsCompletedAsStudent,
        Metric::AssignmentsTaken,
        Metric::TutorsRated,
        Metric::RatingsReceivedAsStudent,
        Metric::EligibleCoursesAsStudent,
        Metric::TutorPoints,
        Metric::RequestsReceived,
        Metric::RequestsAccepted,
        Metric::RequestsDenied,
        Metric::SessionsCompletedAsTutor,
        Metric::AssignmentsCreated,
        Metric::StudentsRated,
        Metric::RatingsReceivedAsTutor,
        Metric::EligibleCoursesAsTutor,
    ];

    /// Column-style name used in storage and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::StudentPoints => "student_points",
            Metric::RequestsSent => "requests_sent",
            Metric::AcceptedRequests => "accepted_requests",
            Metric::DeniedRequests => "denied_requests",
            Metric::SessionsCompletedAsStudent => "sessions_completed_as_student",
            Metric::AssignmentsTaken => "assignments_taken",
            Metric::TutorsRated => "tutors_rated",
            Metric::RatingsReceivedAsStudent => "ratings_received_as_student",
            Metric::EligibleCoursesAsStudent => "eligible_courses_as_student",
            Metric::TutorPoints => "tutor_points",
            Metric::RequestsReceived => "requests_received",
            Metric::RequestsAccepted => "requests_accepted",
            Metric::RequestsDenied => "requests_denied",
            Metric::SessionsCompletedAsTutor => "sessions_completed_as_tutor",
            Metric::AssignmentsCreated => "assignments_created",
            Metric::StudentsRated => "students_rated",
            Metric::RatingsReceivedAsTutor => "ratings_received_as_tutor",
            Metric::EligibleCoursesAsTutor => "eligible_courses_as_tutor",
        }
    }

    /// The role whose record owns this counter.
    #[must_use]
    pub fn role(self) -> Role {
        match self {
            Metric::StudentPoints
            | Metric::RequestsSent
            | Metric::AcceptedRequests
            | Metric::DeniedRequests
            | Metric::SessionsCompletedAsStudent
            | Metric::AssignmentsTaken
            | Metric::TutorsRated
            | Metric::RatingsReceivedAsStudent
            | Metric::EligibleCoursesAsStudent => Role::Student,
            Metric::TutorPoints
            | Metric::RequestsReceived
            | Metric::RequestsAccepted
            | Metric::RequestsDenied
            | Metric::SessionsCompletedAsTutor
            | Metric::AssignmentsCreated
            | Metric::StudentsRated
            | Metric::RatingsReceivedAsTutor
            | Metric::EligibleCoursesAsTutor => Role::Tutor,
        }
    }

    /// Point total for a role.
    #[must_use]
    pub fn points(role: Role) -> Metric {
        match role {
            Role::Student => Metric::StudentPoints,
            Role::Tutor => Metric::TutorPoints,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| MetricParseError(s.to_string()))
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Current counter values of one user-role record.
///
/// Counters that were never written read as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    values: BTreeMap<Metric, f64>,
}

impl MetricSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, metric: Metric) -> f64 {
        self.values.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.values.insert(metric, value);
    }

    /// Adds `amount` to the counter and returns the new value.
    pub fn add(&mut self, metric: Metric, amount: f64) -> f64 {
        let slot = self.values.entry(metric).or_insert(0.0);
        *slot += amount;
        *slot
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Metric, f64)> for MetricSnapshot {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
