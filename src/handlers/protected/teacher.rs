use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query, State,
    },
    Json,
};

use crate::database::models::ClassroomWithStudents;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::classes::{self, ClassSelector, ClassroomCreated, Dashboard};
use crate::state::AppState;

/// GET /api/teacher/dashboard?class_name=..&section=..
///
/// Roster and averages for one class of the caller's school.
pub async fn dashboard_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<ClassSelector>, QueryRejection>,
) -> ApiResult<Dashboard> {
    let Query(selector) = query?;
    let view = classes::dashboard(state.store.as_ref(), &auth_user, selector).await?;
    Ok(ApiResponse::success(view))
}

/// POST /api/teacher/dashboard - Create a classroom from `{class_name, section}`
pub async fn dashboard_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<ClassSelector>, JsonRejection>,
) -> ApiResult<ClassroomCreated> {
    // A bare POST falls back to the default class
    let selector = match payload {
        Ok(Json(selector)) => selector,
        Err(JsonRejection::MissingJsonContentType(_)) => ClassSelector::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let created = classes::create_classroom(state.store.as_ref(), &auth_user, selector).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/teacher/classrooms
pub async fn classrooms_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<ClassroomWithStudents>> {
    let classrooms = classes::list_classrooms(state.store.as_ref(), &auth_user).await?;
    Ok(ApiResponse::success(classrooms))
}
