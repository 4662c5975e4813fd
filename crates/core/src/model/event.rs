use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;
use super::metric::Metric;
use super::role::Role;

//
// ─── EVENT KIND ────────────────────────────────────────────────────────────────
//

/// Business occurrence that can move achievement progress.
///
/// This is the routing key; the routing table decides which counters each
/// kind projects and into which role's vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RequestSent,
    RequestDenied,
    RequestAccepted,
    SessionCompleted,
    /// Session completed and the tutor rated the student in the same step.
    SessionCompletedWithRating,
    AssignmentCompleted,
    /// Assessment whose result leaves the user below the tutoring threshold.
    AssessmentCompletedAsStudent,
    /// Assessment whose result qualifies the user to tutor the course.
    AssessmentCompletedAsTutor,
    StudentRatedTutor,
    TutorRatedStudent,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::RequestSent,
        EventKind::RequestDenied,
        EventKind::RequestAccepted,
        EventKind::SessionCompleted,
        EventKind::SessionCompletedWithRating,
        EventKind::AssignmentCompleted,
        EventKind::AssessmentCompletedAsStudent,
        EventKind::AssessmentCompletedAsTutor,
        EventKind::StudentRatedTutor,
        EventKind::TutorRatedStudent,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::RequestSent => "request_sent",
            EventKind::RequestDenied => "request_denied",
            EventKind::RequestAccepted => "request_accepted",
            EventKind::SessionCompleted => "session_completed",
            EventKind::SessionCompletedWithRating => "session_completed_with_rating",
            EventKind::AssignmentCompleted => "assignment_completed",
            EventKind::AssessmentCompletedAsStudent => "assessment_completed_as_student",
            EventKind::AssessmentCompletedAsTutor => "assessment_completed_as_tutor",
            EventKind::StudentRatedTutor => "student_rated_tutor",
            EventKind::TutorRatedStudent => "tutor_rated_student",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PARTICIPANTS ──────────────────────────────────────────────────────────────
//

/// The users an event concerns, by the role in which they took part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub student: Option<UserId>,
    pub tutor: Option<UserId>,
}

impl Participants {
    #[must_use]
    pub fn pair(student: UserId, tutor: UserId) -> Self {
        Self {
            student: Some(student),
            tutor: Some(tutor),
        }
    }

    #[must_use]
    pub fn student(id: UserId) -> Self {
        Self {
            student: Some(id),
            tutor: None,
        }
    }

    #[must_use]
    pub fn tutor(id: UserId) -> Self {
        Self {
            student: None,
            tutor: Some(id),
        }
    }

    #[must_use]
    pub fn get(&self, role: Role) -> Option<UserId> {
        match role {
            Role::Student => self.student,
            Role::Tutor => self.tutor,
        }
    }
}

//
// ─── INCREMENTS ────────────────────────────────────────────────────────────────
//

/// A counter change the caller wants committed together with the projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricIncrement {
    pub user_id: UserId,
    pub metric: Metric,
    pub amount: f64,
}

impl MetricIncrement {
    #[must_use]
    pub fn new(user_id: UserId, metric: Metric, amount: f64) -> Self {
        Self {
            user_id,
            metric,
            amount,
        }
    }

    /// Counters never shrink; amounts must be finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0
    }
}

/// Points awarded per request sent, to each side.
pub const REQUEST_SENT_POINTS: f64 = 0.1;
/// Points awarded per accepted request, to each side.
pub const REQUEST_ACCEPTED_POINTS: f64 = 0.2;
/// Points awarded per completed session, to each side.
pub const SESSION_POINTS: f64 = 0.5;
/// Tutor points for the assignment created when a session completes.
pub const ASSIGNMENT_CREATED_POINTS: f64 = 0.5;
/// Scores (assignments and assessments) convert to points at this rate.
pub const SCORE_POINT_RATE: f64 = 0.1;

//
// ─── EVENT ─────────────────────────────────────────────────────────────────────
//

/// One unit of work for the progress engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub participants: Participants,
    pub increments: Vec<MetricIncrement>,
}

impl ProgressEvent {
    /// An event with no counter changes; projects the counters as stored.
    #[must_use]
    pub fn new(kind: EventKind, participants: Participants) -> Self {
        Self {
            kind,
            participants,
            increments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_increment(mut self, increment: MetricIncrement) -> Self {
        self.increments.push(increment);
        self
    }

    #[must_use]
    pub fn with_increments(mut self, increments: impl IntoIterator<Item = MetricIncrement>) -> Self {
        self.increments.extend(increments);
        self
    }

    /// Build an event carrying the platform's standard counter awards.
    ///
    /// `magnitude` is the score for assignment and assessment events and is
    /// ignored by kinds whose award is fixed. Eligible-course counters follow
    /// the caller's course records, so add those with `with_increment`.
    /// Participants missing for a role simply receive no increment.
    #[must_use]
    pub fn standard(kind: EventKind, participants: Participants, magnitude: f64) -> Self {
        let mut awards: Vec<(Role, Metric, f64)> = Vec::new();
        match kind {
            EventKind::RequestSent => {
                awards.push((Role::Student, Metric::RequestsSent, 1.0));
                awards.push((Role::Student, Metric::StudentPoints, REQUEST_SENT_POINTS));
                awards.push((Role::Tutor, Metric::RequestsReceived, 1.0));
                awards.push((Role::Tutor, Metric::TutorPoints, REQUEST_SENT_POINTS));
            }
            EventKind::RequestDenied => {
                awards.push((Role::Student, Metric::DeniedRequests, 1.0));
                awards.push((Role::Tutor, Metric::RequestsDenied, 1.0));
            }
            EventKind::RequestAccepted => {
                awards.push((Role::Student, Metric::AcceptedRequests, 1.0));
                awards.push((Role::Student, Metric::StudentPoints, REQUEST_ACCEPTED_POINTS));
                awards.push((Role::Tutor, Metric::RequestsAccepted, 1.0));
                awards.push((Role::Tutor, Metric::TutorPoints, REQUEST_ACCEPTED_POINTS));
            }
            EventKind::SessionCompleted | EventKind::SessionCompletedWithRating => {
                awards.push((Role::Student, Metric::SessionsCompletedAsStudent, 1.0));
                awards.push((Role::Student, Metric::StudentPoints, SESSION_POINTS));
                awards.push((Role::Tutor, Metric::SessionsCompletedAsTutor, 1.0));
                awards.push((Role::Tutor, Metric::AssignmentsCreated, 1.0));
                awards.push((
                    Role::Tutor,
                    Metric::TutorPoints,
                    SESSION_POINTS + ASSIGNMENT_CREATED_POINTS,
                ));
                if kind == EventKind::SessionCompletedWithRating {
                    awards.push((Role::Student, Metric::RatingsReceivedAsStudent, 1.0));
                    awards.push((Role::Tutor, Metric::StudentsRated, 1.0));
                }
            }
            EventKind::AssignmentCompleted => {
                awards.push((Role::Student, Metric::AssignmentsTaken, 1.0));
                awards.push((
                    Role::Student,
                    Metric::StudentPoints,
                    magnitude * SCORE_POINT_RATE,
                ));
            }
            EventKind::AssessmentCompletedAsStudent => {
                awards.push((
                    Role::Student,
                    Metric::StudentPoints,
                    magnitude * SCORE_POINT_RATE,
                ));
            }
            EventKind::AssessmentCompletedAsTutor => {
                awards.push((
                    Role::Tutor,
                    Metric::TutorPoints,
                    magnitude * SCORE_POINT_RATE,
                ));
            }
            EventKind::StudentRatedTutor => {
                awards.push((Role::Student, Metric::TutorsRated, 1.0));
                awards.push((Role::Tutor, Metric::RatingsReceivedAsTutor, 1.0));
            }
            EventKind::TutorRatedStudent => {
                awards.push((Role::Tutor, Metric::StudentsRated, 1.0));
                awards.push((Role::Student, Metric::RatingsReceivedAsStudent, 1.0));
            }
        }

        let increments = awards
            .into_iter()
            .filter_map(|(role, metric, amount)| {
                participants
                    .get(role)
                    .map(|user| MetricIncrement::new(user, metric, amount))
            })
            .collect();

        Self {
            kind,
            participants,
            increments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(event: &ProgressEvent, metric: Metric) -> f64 {
        event
            .increments
            .iter()
            .filter(|inc| inc.metric == metric)
            .map(|inc| inc.amount)
            .sum()
    }

    #[test]
    fn request_sent_awards_both_sides() {
        let event = ProgressEvent::standard(
            EventKind::RequestSent,
            Participants::pair(UserId::new(1), UserId::new(2)),
            0.0,
        );
        assert_eq!(amount(&event, Metric::RequestsSent), 1.0);
        assert_eq!(amount(&event, Metric::StudentPoints), REQUEST_SENT_POINTS);
        assert_eq!(amount(&event, Metric::TutorPoints), REQUEST_SENT_POINTS);
        let tutor_incs = event
            .increments
            .iter()
            .filter(|inc| inc.user_id == UserId::new(2))
            .count();
        assert_eq!(tutor_incs, 2);
    }

    #[test]
    fn session_with_rating_adds_rating_counters() {
        let plain = ProgressEvent::standard(
            EventKind::SessionCompleted,
            Participants::pair(UserId::new(1), UserId::new(2)),
            0.0,
        );
        let rated = ProgressEvent::standard(
            EventKind::SessionCompletedWithRating,
            Participants::pair(UserId::new(1), UserId::new(2)),
            0.0,
        );
        assert_eq!(amount(&plain, Metric::StudentsRated), 0.0);
        assert_eq!(amount(&rated, Metric::StudentsRated), 1.0);
        assert_eq!(amount(&rated, Metric::RatingsReceivedAsStudent), 1.0);
        assert_eq!(amount(&rated, Metric::TutorPoints), 1.0);
    }

    #[test]
    fn scored_events_convert_score_to_points() {
        let event = ProgressEvent::standard(
            EventKind::AssignmentCompleted,
            Participants::student(UserId::new(9)),
            80.0,
        );
        assert!((amount(&event, Metric::StudentPoints) - 8.0).abs() < 1e-9);
        assert_eq!(amount(&event, Metric::AssignmentsTaken), 1.0);
    }

    #[test]
    fn missing_participant_gets_no_increment() {
        let event = ProgressEvent::standard(
            EventKind::RequestSent,
            Participants::student(UserId::new(1)),
            0.0,
        );
        assert!(event.increments.iter().all(|i| i.metric.role() == Role::Student));
    }

    #[test]
    fn negative_or_nan_increments_are_invalid() {
        let id = UserId::new(1);
        assert!(MetricIncrement::new(id, Metric::RequestsSent, 1.0).is_valid());
        assert!(!MetricIncrement::new(id, Metric::RequestsSent, -1.0).is_valid());
        assert!(!MetricIncrement::new(id, Metric::RequestsSent, f64::NAN).is_valid());
    }
}
