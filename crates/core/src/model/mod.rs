mod ids;
mod league;
mod metrics;
mod session;

pub use ids::{ParseIdError, SessionId, UserId};
pub use league::League;
pub use metrics::{Metrics, MetricsError, WPM_MAX, WPM_MIN};
pub use session::{SessionRecord, SessionRecordError};
