//! Domain services behind the HTTP handlers.
//!
//! Each service takes the store and, for protected operations, the
//! authenticated caller. Role gates and school scoping live here so the
//! handlers stay thin.

pub mod classes;
pub mod identity;
pub mod session;
pub mod vitals;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::database::DatabaseError;

pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Collects per-field validation failures before reporting them together.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Trimmed value of a required text field, recording an error when blank.
    pub fn required(&mut self, field: &str, value: Option<&str>) -> String {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => {
                self.add(field, REQUIRED);
                String::new()
            }
        }
    }

    /// Record an error when `value` is longer than `max` characters.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("Ensure this field has no more than {} characters.", max));
        }
    }

    pub fn into_result(self, message: &str) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation {
                message: message.to_string(),
                field_errors: self.0,
            })
        }
    }
}

/// Accept a JSON string or number for a text field; forms often send roll
/// numbers as numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::database::models::Role;
    use crate::database::{MemoryStore, Store};
    use crate::middleware::AuthUser;

    pub fn store() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new())
    }

    pub fn caller(user_id: Uuid, role: Role) -> AuthUser {
        AuthUser {
            user_id,
            username: format!("{}-{}", role, user_id),
            role,
            session_id: Uuid::new_v4(),
        }
    }
}
