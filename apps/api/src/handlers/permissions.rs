use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use issuegate_application::{RecomputeInput, RecomputeOutcome};

use crate::dto::RecomputeRequest;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn recompute_permissions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RecomputeRequest>,
) -> ApiResult<Json<RecomputeOutcome>> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    state.admin_guard.authorize(bearer).await?;

    let outcome = state
        .permission_service
        .recompute(RecomputeInput {
            uid: payload.uid,
            dry_run: payload.dry_run,
        })
        .await?;

    Ok(Json(outcome))
}
