//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Duration;

use webstatus_core::RouteCacheOptions;
use webstatus_storage::{OperationResponseCache, RawBytesDataCacher, StorageClient};

use crate::types::{
    ChromeUsageStatsPage, FeatureResponse, GetFeatureRequest, ListChromeDailyUsageStatsRequest,
};

/// Operation id of `GET /v1/features/{feature_id}`.
pub const GET_FEATURE_OPERATION: &str = "getFeature";

/// Operation id of the daily Chrome usage route.
pub const LIST_CHROME_DAILY_USAGE_STATS_OPERATION: &str = "listChromeDailyUsageStats";

/// One response cache per cached route, all sharing one backend.
#[derive(Debug, Clone)]
pub struct OperationResponseCaches {
    pub get_feature: OperationResponseCache<GetFeatureRequest, FeatureResponse>,
    pub list_chrome_daily_usage_stats:
        OperationResponseCache<ListChromeDailyUsageStatsRequest, ChromeUsageStatsPage>,
}

impl OperationResponseCaches {
    pub fn new(
        cacher: Arc<dyn RawBytesDataCacher>,
        options: &RouteCacheOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            get_feature: OperationResponseCache::new(
                GET_FEATURE_OPERATION,
                Arc::clone(&cacher),
                options.default,
            )
            .with_timeout(timeout),
            list_chrome_daily_usage_stats: OperationResponseCache::new(
                LIST_CHROME_DAILY_USAGE_STATS_OPERATION,
                cacher,
                options.default,
            )
            .with_timeout(timeout),
        }
    }
}

/// Application-wide state shared across all routes.
pub struct AppState<S> {
    pub storage: StorageClient<S>,
    pub caches: OperationResponseCaches,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            caches: self.caches.clone(),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(storage: StorageClient<S>, caches: OperationResponseCaches) -> Self {
        Self { storage, caches }
    }
}
