mod event;
mod ids;
mod metric;
mod role;
mod vector;

pub use event::{
    ASSIGNMENT_CREATED_POINTS, EventKind, MetricIncrement, Participants, ProgressEvent,
    REQUEST_ACCEPTED_POINTS, REQUEST_SENT_POINTS, SCORE_POINT_RATE, SESSION_POINTS,
};
pub use ids::{ParseIdError, UserId};
pub use metric::{Metric, MetricParseError, MetricSnapshot};
pub use role::{Role, RoleParseError};
pub use vector::{COMPLETE, ProgressVector, SLOT_COUNT, VectorError};
