use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::session::{self, WhoAmI};
use crate::state::AppState;

/// POST /api/logout - End the caller's session; the token stops working at once
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Value> {
    session::logout(state.store.as_ref(), &auth_user).await?;
    Ok(ApiResponse::success(json!({ "message": "Logged out successfully." })))
}

/// GET /api/auth/whoami
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<WhoAmI> {
    let me = session::whoami(state.store.as_ref(), &auth_user).await?;
    Ok(ApiResponse::success(me))
}
