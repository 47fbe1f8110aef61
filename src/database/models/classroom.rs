use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A teacher's class/section; unique per (teacher, class_name, section)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub id: i64,
    pub teacher_id: Uuid,
    pub class_name: String,
    pub section: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ClassroomStudent {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassroomWithStudents {
    #[serde(flatten)]
    pub classroom: Classroom,
    pub students: Vec<ClassroomStudent>,
}
