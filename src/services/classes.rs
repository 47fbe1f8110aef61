//! Class aggregator: dashboard analytics and classroom management for teachers.
//!
//! Every query is scoped by the calling teacher's own school; the client only
//! chooses class and section.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{string_or_number, FieldErrors, ServiceError};
use crate::config;
use crate::database::models::limits::{CLASS_NAME_MAX, SECTION_MAX};
use crate::database::models::{
    ClassFilter, ClassroomWithStudents, Role, RosterEntry, Teacher, VitalsAverages,
};
use crate::database::{DatabaseError, Store};
use crate::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct ClassSelector {
    #[serde(alias = "class")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub class_name: String,
    pub section: String,
    pub students: Vec<RosterEntry>,
    pub analytics: VitalsAverages,
}

#[derive(Debug, Serialize)]
pub struct ClassroomCreated {
    pub message: String,
    pub classroom: ClassroomWithStudents,
}

async fn teacher_profile(store: &dyn Store, caller: &AuthUser) -> Result<Teacher, ServiceError> {
    if caller.role != Role::Teacher {
        warn!("'{}' ({}) tried to open a teacher view", caller.username, caller.role);
        return Err(ServiceError::PermissionDenied(
            "Only teachers can access the dashboard.".to_string(),
        ));
    }

    store
        .find_teacher(caller.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Teacher profile not found.".to_string()))
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Resolve the selector against the configured defaults, pinned to the teacher's school.
fn class_filter(teacher: &Teacher, selector: ClassSelector) -> ClassFilter {
    let defaults = &config::config().dashboard;
    ClassFilter {
        school: teacher.school.clone(),
        class_name: or_default(selector.class_name, &defaults.default_class_name),
        section: or_default(selector.section, &defaults.default_section),
    }
}

pub async fn dashboard(
    store: &dyn Store,
    caller: &AuthUser,
    selector: ClassSelector,
) -> Result<Dashboard, ServiceError> {
    let teacher = teacher_profile(store, caller).await?;
    let filter = class_filter(&teacher, selector);

    let students = store.class_roster(&filter).await?;
    let analytics = store.class_averages(&filter).await?;

    Ok(Dashboard {
        class_name: filter.class_name,
        section: filter.section,
        students,
        analytics,
    })
}

/// Create a classroom and enroll every matching student of the teacher's school.
pub async fn create_classroom(
    store: &dyn Store,
    caller: &AuthUser,
    selector: ClassSelector,
) -> Result<ClassroomCreated, ServiceError> {
    let teacher = teacher_profile(store, caller).await?;
    let filter = class_filter(&teacher, selector);

    let mut errors = FieldErrors::new();
    errors.max_length("class_name", &filter.class_name, CLASS_NAME_MAX);
    errors.max_length("section", &filter.section, SECTION_MAX);
    errors.into_result("Invalid classroom")?;

    let classroom = store
        .create_classroom(teacher.user_id, &filter)
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict(_) => ServiceError::Conflict(format!(
                "Classroom {} - {} already exists.",
                filter.class_name, filter.section
            )),
            other => other.into(),
        })?;

    info!(
        "Teacher '{}' created classroom {} - {} with {} students",
        caller.username,
        filter.class_name,
        filter.section,
        classroom.students.len()
    );

    Ok(ClassroomCreated {
        message: "Data entry successful.".to_string(),
        classroom,
    })
}

pub async fn list_classrooms(store: &dyn Store, caller: &AuthUser) -> Result<Vec<ClassroomWithStudents>, ServiceError> {
    let teacher = teacher_profile(store, caller).await?;
    Ok(store.list_classrooms(teacher.user_id).await?)
}
