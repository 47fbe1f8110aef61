//! Identity registry: student and teacher account creation.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{string_or_number, FieldErrors, ServiceError};
use crate::auth::password::{generate_temp_password, hash_password};
use crate::config;
use crate::database::models::limits::*;
use crate::database::models::{NewStudent, NewTeacher};
use crate::database::Store;

#[derive(Debug, Default, Deserialize)]
pub struct StudentRegistration {
    pub name: Option<String>,
    pub school: Option<String>,
    #[serde(alias = "class")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub section: Option<String>,
    #[serde(default, alias = "rollNo", deserialize_with = "string_or_number")]
    pub roll_no: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TeacherRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub school: Option<String>,
    #[serde(alias = "schoolCode")]
    pub school_code: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StudentRegistered {
    pub message: String,
    pub student_id: String,
    pub temp_password: String,
}

#[derive(Debug, Serialize)]
pub struct TeacherRegistered {
    pub message: String,
    pub email: String,
    pub temp_password: String,
}

/// Uppercased first letter of every word: "Green Valley High" -> "GVH"
pub fn derive_school_code(school: &str) -> String {
    school
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// School code followed by the roll number zero-padded to three places.
pub fn derive_student_id(school_code: &str, roll_no: &str) -> String {
    format!("{}{:0>3}", school_code, roll_no.trim())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Enter a valid email address.".to_string());
    };

    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err("Enter a valid email address.".to_string());
    }

    Ok(())
}

fn temp_credentials() -> Result<(String, String), ServiceError> {
    let temp_password = generate_temp_password(config::config().security.temp_password_length);
    let password_hash = hash_password(&temp_password).map_err(ServiceError::Internal)?;
    Ok((temp_password, password_hash))
}

pub async fn register_student(
    store: &dyn Store,
    request: StudentRegistration,
) -> Result<StudentRegistered, ServiceError> {
    let mut errors = FieldErrors::new();
    let name = errors.required("name", request.name.as_deref());
    let school = errors.required("school", request.school.as_deref());
    let class_name = errors.required("class_name", request.class_name.as_deref());
    let section = errors.required("section", request.section.as_deref());
    let roll_no = errors.required("roll_no", request.roll_no.as_deref());
    errors.max_length("name", &name, NAME_MAX);
    errors.max_length("school", &school, SCHOOL_MAX);
    errors.max_length("class_name", &class_name, CLASS_NAME_MAX);
    errors.max_length("section", &section, SECTION_MAX);
    errors.max_length("roll_no", &roll_no, ROLL_NO_MAX);
    if !roll_no.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.add("roll_no", "Roll number may only contain letters and digits.");
    }

    let school_code = derive_school_code(&school);
    let student_id = derive_student_id(&school_code, &roll_no);
    errors.max_length("school_code", &school_code, SCHOOL_CODE_MAX);
    errors.max_length("student_id", &student_id, STUDENT_ID_MAX);
    errors.into_result("Invalid student registration")?;

    if store.username_exists(&student_id).await? {
        return Err(ServiceError::Conflict(format!(
            "Student ID {} already exists.",
            student_id
        )));
    }

    let (temp_password, password_hash) = temp_credentials()?;
    let student = store
        .create_student(NewStudent {
            student_id,
            name,
            school,
            school_code,
            class_name,
            section,
            roll_no,
            password_hash,
        })
        .await?;

    info!("Registered student {} ({})", student.student_id, student.school);

    Ok(StudentRegistered {
        message: "Student registered successfully.".to_string(),
        student_id: student.student_id,
        temp_password,
    })
}

/// Teachers start unapproved; nothing currently gates on approval.
pub async fn register_teacher(
    store: &dyn Store,
    request: TeacherRegistration,
) -> Result<TeacherRegistered, ServiceError> {
    let mut errors = FieldErrors::new();
    let name = errors.required("name", request.name.as_deref());
    let email = errors.required("email", request.email.as_deref()).to_lowercase();
    let school = errors.required("school", request.school.as_deref());
    let school_code = errors.required("school_code", request.school_code.as_deref());
    if !email.is_empty() {
        if let Err(message) = validate_email_format(&email) {
            errors.add("email", message);
        }
    }
    let department = request
        .department
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    errors.max_length("name", &name, NAME_MAX);
    errors.max_length("school", &school, SCHOOL_MAX);
    errors.max_length("school_code", &school_code, SCHOOL_CODE_MAX);
    if let Some(department) = &department {
        errors.max_length("department", department, DEPARTMENT_MAX);
    }
    errors.into_result("Invalid teacher registration")?;

    if store.username_exists(&email).await? {
        return Err(ServiceError::Conflict("Email already registered.".to_string()));
    }

    let (temp_password, password_hash) = temp_credentials()?;
    let teacher = store
        .create_teacher(NewTeacher {
            name,
            email: email.clone(),
            school,
            school_code,
            department,
            password_hash,
        })
        .await?;

    info!("Registered teacher {} for {} (pending approval)", email, teacher.school);

    Ok(TeacherRegistered {
        message: "Registration submitted for approval.".to_string(),
        email,
        temp_password,
    })
}
