// handlers/public/register.rs - POST /api/register/{student,teacher}

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::identity::{self, StudentRegistered, StudentRegistration, TeacherRegistered, TeacherRegistration};
use crate::state::AppState;

/// POST /api/register/student
///
/// Body: `{name, school, class_name, section, roll_no}`. Responds 201 with the
/// derived student ID and a one-time temporary password.
pub async fn register_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentRegistration>, JsonRejection>,
) -> ApiResult<StudentRegistered> {
    let Json(request) = payload?;
    let registered = identity::register_student(state.store.as_ref(), request).await?;
    Ok(ApiResponse::created(registered))
}

/// POST /api/register/teacher
pub async fn register_teacher(
    State(state): State<AppState>,
    payload: Result<Json<TeacherRegistration>, JsonRejection>,
) -> ApiResult<TeacherRegistered> {
    let Json(request) = payload?;
    let registered = identity::register_teacher(state.store.as_ref(), request).await?;
    Ok(ApiResponse::created(registered))
}
