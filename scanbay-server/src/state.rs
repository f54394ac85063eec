use std::{fmt, sync::Arc};

use scanbay_core::{Config, ResultStore, ScanQueue};

/// Shared state behind every HTTP handler.
///
/// The queue is held behind the [`ScanQueue`] trait so tests can swap
/// in a recording fake without a Redis instance.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: Arc<dyn ScanQueue>,
    pub store: Arc<ResultStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, queue: Arc<dyn ScanQueue>, store: Arc<ResultStore>) -> Self {
        Self {
            config,
            queue,
            store,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
