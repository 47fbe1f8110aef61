//! Vitals recorder: per-student readings.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

use super::{FieldErrors, ServiceError, REQUIRED};
use crate::database::models::{HealthData, NewHealthData, Role};
use crate::database::Store;
use crate::middleware::AuthUser;

const MAX_SPO2: i64 = 100;
/// NUMERIC(4,1): three integer digits at most
const TEMPERATURE_LIMIT: i64 = 1000;

fn integer_field(body: &Map<String, Value>, field: &str, max: i64, errors: &mut FieldErrors) -> i32 {
    let parsed = match body.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, REQUIRED);
            return 0;
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    let Some(value) = parsed else {
        errors.add(field, "A valid integer is required.");
        return 0;
    };

    if value < 0 {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        return 0;
    }
    if value > max {
        errors.add(field, format!("Ensure this value is less than or equal to {}.", max));
        return 0;
    }

    value as i32
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn temperature_field(body: &Map<String, Value>, errors: &mut FieldErrors) -> Decimal {
    let parsed = match body.get("temperature") {
        None | Some(Value::Null) => {
            errors.add("temperature", REQUIRED);
            return Decimal::ZERO;
        }
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        Some(_) => None,
    };

    let Some(value) = parsed.map(|d| d.normalize()) else {
        errors.add("temperature", "A valid number is required.");
        return Decimal::ZERO;
    };

    if value.scale() > 1 {
        errors.add("temperature", "Ensure that there are no more than 1 decimal places.");
        return Decimal::ZERO;
    }
    if value.abs() >= Decimal::from(TEMPERATURE_LIMIT) {
        errors.add("temperature", "Ensure that there are no more than 4 digits in total.");
        return Decimal::ZERO;
    }

    let mut value = value;
    value.rescale(1);
    value
}

/// Validate a submitted reading. Integers may arrive as JSON numbers or numeric strings.
pub fn parse_reading(payload: &Value) -> Result<NewHealthData, ServiceError> {
    let Some(body) = payload.as_object() else {
        return Err(ServiceError::Validation {
            message: "Invalid vital signs".to_string(),
            field_errors: HashMap::from([(
                "non_field_errors".to_string(),
                "Expected a JSON object.".to_string(),
            )]),
        });
    };

    let mut errors = FieldErrors::new();
    let bpm = integer_field(body, "bpm", i32::MAX as i64, &mut errors);
    let spo2 = integer_field(body, "spo2", MAX_SPO2, &mut errors);
    let breathe_rate = integer_field(body, "breathe_rate", i32::MAX as i64, &mut errors);
    let temperature = temperature_field(body, &mut errors);
    errors.into_result("Invalid vital signs")?;

    Ok(NewHealthData {
        bpm,
        spo2,
        breathe_rate,
        temperature,
    })
}

/// Store one reading for the calling student, stamped with today's date.
///
/// The role gate runs before the payload is looked at.
pub async fn record(store: &dyn Store, caller: &AuthUser, payload: &Value) -> Result<HealthData, ServiceError> {
    if caller.role != Role::Student {
        warn!("'{}' ({}) tried to submit health data", caller.username, caller.role);
        return Err(ServiceError::PermissionDenied(
            "Only students can submit health data.".to_string(),
        ));
    }

    let reading = parse_reading(payload)?;

    let student = store
        .find_student(caller.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Student profile not found.".to_string()))?;

    let saved = store
        .insert_health_data(student.user_id, Utc::now().date_naive(), reading)
        .await?;

    info!("Recorded vitals #{} for {}", saved.id, student.student_id);
    Ok(saved)
}

/// The caller's readings, newest first. Non-students simply have none.
pub async fn history(store: &dyn Store, caller: &AuthUser) -> Result<Vec<HealthData>, ServiceError> {
    if caller.role != Role::Student {
        return Ok(Vec::new());
    }
    Ok(store.health_history(caller.user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::services::identity::{register_student, StudentRegistration};
    use crate::services::test_support::{caller, store};

    fn field_errors(result: Result<NewHealthData, ServiceError>) -> HashMap<String, String> {
        match result {
            Err(ServiceError::Validation { field_errors, .. }) => field_errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    async fn student(store: &dyn Store, roll_no: &str) -> AuthUser {
        let registered = register_student(
            store,
            StudentRegistration {
                name: Some(format!("Student {}", roll_no)),
                school: Some("Green Valley High".into()),
                class_name: Some("10th Grade".into()),
                section: Some("A".into()),
                roll_no: Some(roll_no.into()),
            },
        )
        .await
        .unwrap();
        let user = store
            .find_user_by_username(&registered.student_id)
            .await
            .unwrap()
            .unwrap();
        caller(user.id, Role::Student)
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let reading = parse_reading(&json!({
            "bpm": 72, "spo2": "98", "breathe_rate": " 16 ", "temperature": 36.6
        }))
        .unwrap();

        assert_eq!(reading.bpm, 72);
        assert_eq!(reading.spo2, 98);
        assert_eq!(reading.breathe_rate, 16);
        assert_eq!(reading.temperature, Decimal::new(366, 1));

        let reading = parse_reading(&json!({
            "bpm": 72, "spo2": 98, "breathe_rate": 16, "temperature": "37"
        }))
        .unwrap();
        assert_eq!(reading.temperature.to_string(), "37.0");
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = field_errors(parse_reading(&json!({
            "bpm": "fast", "spo2": 101, "temperature": 36.55
        })));

        assert_eq!(errors["bpm"], "A valid integer is required.");
        assert_eq!(errors["spo2"], "Ensure this value is less than or equal to 100.");
        assert_eq!(errors["breathe_rate"], REQUIRED);
        assert_eq!(errors["temperature"], "Ensure that there are no more than 1 decimal places.");
    }

    #[test]
    fn rejects_negative_fractional_and_oversized_values() {
        let errors = field_errors(parse_reading(&json!({
            "bpm": -1, "spo2": 97.5, "breathe_rate": 3_000_000_000_i64, "temperature": 1000
        })));

        assert_eq!(errors["bpm"], "Ensure this value is greater than or equal to 0.");
        assert_eq!(errors["spo2"], "A valid integer is required.");
        assert!(errors["breathe_rate"].starts_with("Ensure this value is less than or equal to"));
        assert_eq!(errors["temperature"], "Ensure that there are no more than 4 digits in total.");
    }

    #[test]
    fn rejects_non_object_body() {
        let errors = field_errors(parse_reading(&json!([72, 98, 16, 36.6])));
        assert!(errors.contains_key("non_field_errors"));
    }

    #[tokio::test]
    async fn teacher_is_forbidden_whatever_the_payload() {
        let store = store();
        let teacher = caller(uuid::Uuid::new_v4(), Role::Teacher);

        for payload in [json!({}), json!({"bpm": 72, "spo2": 98, "breathe_rate": 16, "temperature": 36.6})] {
            let err = record(store.as_ref(), &teacher, &payload).await.unwrap_err();
            assert!(matches!(err, ServiceError::PermissionDenied(_)));
        }
    }

    #[tokio::test]
    async fn history_is_private_to_each_student() {
        let store = store();
        let asha = student(store.as_ref(), "7").await;
        let ravi = student(store.as_ref(), "8").await;

        let saved = record(
            store.as_ref(),
            &asha,
            &json!({"bpm": 72, "spo2": 98, "breathe_rate": 16, "temperature": 36.6}),
        )
        .await
        .unwrap();
        assert_eq!(saved.date, Utc::now().date_naive());

        let mine = history(store.as_ref(), &asha).await.unwrap();
        assert_eq!(mine, vec![saved]);
        assert!(history(store.as_ref(), &ravi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_empty_for_teachers() {
        let store = store();
        let teacher = caller(uuid::Uuid::new_v4(), Role::Teacher);
        assert!(history(store.as_ref(), &teacher).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let store = store();
        let ghost = caller(uuid::Uuid::new_v4(), Role::Student);
        let err = record(
            store.as_ref(),
            &ghost,
            &json!({"bpm": 72, "spo2": 98, "breathe_rate": 16, "temperature": 36.6}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
