use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub user_id: Uuid,
    pub student_id: String,
    pub name: String,
    pub school: String,
    pub school_code: String,
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create a student's user and profile rows together
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub school: String,
    pub school_code: String,
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub password_hash: String,
}

/// School-scoped class selector. The school always comes from the caller's own profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    pub school: String,
    pub class_name: String,
    pub section: String,
}

impl ClassFilter {
    pub fn matches(&self, student: &Student) -> bool {
        student.school == self.school
            && student.class_name == self.class_name
            && student.section == self.section
    }
}

/// One roster line on the teacher dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub roll_no: String,
    pub record_dates: Vec<NaiveDate>,
}
