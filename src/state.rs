use std::sync::Arc;

use crate::config::Config;
use crate::db::SubmissionStore;
use crate::files::FileStore;
use crate::rate_limit::SubmissionRateLimiter;
use crate::relay::RelayScheduler;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub files: FileStore,
    pub config: Config,
    pub scheduler: RelayScheduler,
    pub submission_limiter: SubmissionRateLimiter,
}
