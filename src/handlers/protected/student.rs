use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde_json::Value;

use crate::database::models::{HealthData, Role};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::vitals;
use crate::state::AppState;

/// POST /api/student/health-data - Record one reading for the calling student
///
/// The body is taken as raw JSON so numeric strings are accepted and every
/// field problem is reported at once. Non-students get 403 before the body is
/// inspected; for students an unparseable body is a 400.
pub async fn health_data_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<HealthData> {
    let payload = match payload {
        Ok(Json(value)) => value,
        Err(rejection) if auth_user.role == Role::Student => return Err(rejection.into()),
        Err(_) => Value::Null,
    };

    let saved = vitals::record(state.store.as_ref(), &auth_user, &payload).await?;
    Ok(ApiResponse::created(saved))
}

/// GET /api/student/health-history - Newest first
pub async fn health_history_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<HealthData>> {
    let records = vitals::history(state.store.as_ref(), &auth_user).await?;
    Ok(ApiResponse::success(records))
}
