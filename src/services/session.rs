//! Session gate: credential checks, session creation and teardown.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{FieldErrors, ServiceError};
use crate::auth::password::verify_password;
use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::models::{Role, Student, Teacher, User};
use crate::database::Store;
use crate::middleware::AuthUser;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Debug, Default, Deserialize)]
pub struct StudentLogin {
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TeacherLogin {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "schoolCode")]
    pub school_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginSuccess {
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<Teacher>,
}

fn invalid_credentials() -> ServiceError {
    ServiceError::InvalidCredentials(INVALID_CREDENTIALS.to_string())
}

/// Look up a user by username and check role and password together, so every
/// failure looks the same to the caller.
async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, ServiceError> {
    let Some(user) = store.find_user_by_username(username).await? else {
        warn!("Login failed: unknown {} '{}'", role, username);
        return Err(invalid_credentials());
    };

    if user.role != role {
        warn!("Login failed: '{}' is not a {}", username, role);
        return Err(invalid_credentials());
    }

    if !verify_password(password, &user.password_hash) {
        warn!("Login failed: bad password for '{}'", username);
        return Err(invalid_credentials());
    }

    Ok(user)
}

async fn open_session(store: &dyn Store, user: User, message: &str) -> Result<LoginSuccess, ServiceError> {
    let expires_at = Utc::now() + Duration::hours(config::config().security.jwt_expiry_hours as i64);
    let session = store.create_session(user.id, expires_at).await?;

    let token = generate_jwt(&Claims::new(&user, &session))
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    info!("{} '{}' logged in", user.role, user.username);

    Ok(LoginSuccess {
        message: message.to_string(),
        token,
        expires_at: session.expires_at,
        user,
    })
}

pub async fn login_student(store: &dyn Store, request: StudentLogin) -> Result<LoginSuccess, ServiceError> {
    let mut errors = FieldErrors::new();
    let student_id = errors.required("student_id", request.student_id.as_deref());
    let password = errors.required("password", request.password.as_deref());
    errors.into_result("Invalid login request")?;

    let user = authenticate(store, &student_id, &password, Role::Student).await?;
    open_session(store, user, "Login successful.").await
}

/// Teachers must also present their school code.
pub async fn login_teacher(store: &dyn Store, request: TeacherLogin) -> Result<LoginSuccess, ServiceError> {
    let mut errors = FieldErrors::new();
    let email = errors.required("email", request.email.as_deref()).to_lowercase();
    let password = errors.required("password", request.password.as_deref());
    let school_code = errors.required("school_code", request.school_code.as_deref());
    errors.into_result("Invalid login request")?;

    let user = authenticate(store, &email, &password, Role::Teacher).await?;

    let teacher = store.find_teacher(user.id).await?;
    match teacher {
        Some(t) if t.school_code == school_code => {}
        _ => {
            warn!("Login failed: school code mismatch for '{}'", email);
            return Err(invalid_credentials());
        }
    }

    open_session(store, user, "Login successful.").await
}

pub async fn logout(store: &dyn Store, caller: &AuthUser) -> Result<(), ServiceError> {
    if store.delete_session(caller.session_id).await? {
        info!("'{}' logged out", caller.username);
    }
    Ok(())
}

pub async fn whoami(store: &dyn Store, caller: &AuthUser) -> Result<WhoAmI, ServiceError> {
    let user = store
        .find_user(caller.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

    let (student, teacher) = match user.role {
        Role::Student => (store.find_student(user.id).await?, None),
        Role::Teacher => (None, store.find_teacher(user.id).await?),
    };

    Ok(WhoAmI { user, student, teacher })
}
