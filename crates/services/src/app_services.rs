use std::path::Path;
use std::sync::Arc;

use storage::repository::Storage;
use voice_core::Clock;

use crate::coach::CoachService;
use crate::duration::SymphoniaEstimator;
use crate::error::AppServicesError;
use crate::history::HistoryService;
use crate::identity::IdentityProvider;
use crate::upload::UploadService;

/// Assembles app-facing services over SQLite rows and filesystem blobs.
#[derive(Clone)]
pub struct AppServices {
    upload: Arc<UploadService>,
    history: Arc<HistoryService>,
    coach: Arc<CoachService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        blob_root: &Path,
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, blob_root).await?;
        Ok(Self::from_storage(&storage, clock, identity))
    }

    /// Wire services over an already-built storage aggregate.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let upload = Arc::new(UploadService::new(
            clock,
            Arc::clone(&identity),
            Arc::clone(&storage.blobs),
            Arc::clone(&storage.sessions),
            Arc::new(SymphoniaEstimator::new()),
        ));
        let history = Arc::new(HistoryService::new(
            identity,
            Arc::clone(&storage.sessions),
        ));
        let coach = Arc::new(CoachService::from_env(Arc::clone(&history)));

        Self {
            upload,
            history,
            coach,
        }
    }

    #[must_use]
    pub fn upload(&self) -> Arc<UploadService> {
        Arc::clone(&self.upload)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn coach(&self) -> Arc<CoachService> {
        Arc::clone(&self.coach)
    }
}
