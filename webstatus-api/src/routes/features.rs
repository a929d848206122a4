//! Feature routes.

use axum::extract::{Path, State};
use axum::Json;
use webstatus_storage::Store;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{FeatureResponse, GetFeatureParams, GetFeatureRequest};

/// GET /v1/features/{feature_id} - Get a feature by its feature key
pub async fn get_feature<S: Store>(
    State(state): State<AppState<S>>,
    Path(feature_id): Path<String>,
) -> ApiResult<Json<FeatureResponse>> {
    let request = GetFeatureRequest {
        feature_id,
        params: GetFeatureParams::default(),
    };

    let cache = &state.caches.get_feature;
    if let Some(cached) = cache.lookup(&request).await {
        return Ok(Json(cached));
    }

    let feature = match state.storage.get_feature(&request.feature_id).await {
        Ok(feature) => feature,
        Err(e) if e.is_not_found() => {
            return Err(ApiError::feature_not_found(&request.feature_id));
        }
        Err(e) => {
            tracing::error!(error = %e, feature_id = %request.feature_id, "unable to get feature");
            return Err(ApiError::internal_error("unable to get feature"));
        }
    };

    let response = FeatureResponse::from(feature);
    cache.attempt_cache(&request, &response).await;
    Ok(Json(response))
}
