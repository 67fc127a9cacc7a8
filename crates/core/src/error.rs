use thiserror::Error;

use crate::model::MetricsError;
use crate::model::SessionRecordError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Session(#[from] SessionRecordError),
}
