// handlers/public/login.rs - POST /api/login/{student,teacher}

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::session::{self, LoginSuccess, StudentLogin, TeacherLogin};
use crate::state::AppState;

/// POST /api/login/student - `{student_id, password}`
pub async fn login_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentLogin>, JsonRejection>,
) -> ApiResult<LoginSuccess> {
    let Json(request) = payload?;
    let login = session::login_student(state.store.as_ref(), request).await?;
    Ok(ApiResponse::success(login))
}

/// POST /api/login/teacher - `{email, password, school_code}`
///
/// Bad credentials and a wrong school code produce the same 400 response.
pub async fn login_teacher(
    State(state): State<AppState>,
    payload: Result<Json<TeacherLogin>, JsonRejection>,
) -> ApiResult<LoginSuccess> {
    let Json(request) = payload?;
    let login = session::login_teacher(state.store.as_ref(), request).await?;
    Ok(ApiResponse::success(login))
}
