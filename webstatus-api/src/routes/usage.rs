//! Usage statistics routes.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use webstatus_core::StorageError;
use webstatus_storage::Store;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{
    ChromeUsageStatsPage, ListChromeDailyUsageStatsParams, ListChromeDailyUsageStatsRequest,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

/// GET /v1/features/{feature_id}/stats/usage/chrome/daily_stats - Daily
/// Chrome usage of a feature between `startAt` (inclusive) and `endAt`
/// (exclusive), newest first
pub async fn list_chrome_daily_usage_stats<S: Store>(
    State(state): State<AppState<S>>,
    Path(feature_id): Path<String>,
    params: Result<Query<ListChromeDailyUsageStatsParams>, QueryRejection>,
) -> ApiResult<Json<ChromeUsageStatsPage>> {
    let Query(params) = params.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::invalid_input(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    let request = ListChromeDailyUsageStatsRequest { feature_id, params };

    let cache = &state.caches.list_chrome_daily_usage_stats;
    if let Some(cached) = cache.lookup(&request).await {
        return Ok(Json(cached));
    }

    let page = state
        .storage
        .list_chromium_daily_usage_stats(
            &request.feature_id,
            request.params.start_at,
            request.params.end_at,
            page_size as usize,
            request.params.page_token.as_deref(),
        )
        .await
        .map_err(|e| match e {
            StorageError::InvalidPageToken => ApiError::invalid_page_token(),
            other => {
                tracing::error!(error = %other, feature_id = %request.feature_id, "unable to get chrome daily usage stats");
                ApiError::internal_error("unable to get chrome daily usage stats")
            }
        })?;

    let response = ChromeUsageStatsPage::from(page);
    cache.attempt_cache(&request, &response).await;
    Ok(Json(response))
}
