#![forbid(unsafe_code)]

pub mod app_services;
pub mod coach;
pub mod duration;
pub mod error;
pub mod history;
pub mod identity;
mod retry;
pub mod upload;

pub use voice_core::Clock;

pub use app_services::AppServices;
pub use coach::{CoachConfig, CoachService};
pub use duration::{DurationEstimator, SymphoniaEstimator};
pub use error::{CoachError, DecodingError, HistoryError, IdentityError, UploadError};
pub use history::{DEFAULT_HISTORY_LIMIT, HistoryService, LeagueStanding, TrendPoint};
pub use identity::{IdentityProvider, StaticIdentity};
pub use upload::{DEFAULT_DURATION_SEC, UploadRequest, UploadService};
