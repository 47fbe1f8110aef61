use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    ClassFilter, ClassroomWithStudents, HealthData, NewHealthData, NewStudent, NewTeacher,
    RosterEntry, Session, Student, Teacher, User, VitalsAverages,
};

/// Persistence operations used by the services.
///
/// Implementations must enforce username uniqueness themselves (returning
/// `DatabaseError::Conflict`) and must create a user together with its profile
/// row or not at all.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    /// Create the user (role student, approved) and its student profile atomically.
    async fn create_student(&self, new: NewStudent) -> Result<Student, DatabaseError>;

    /// Create the user (role teacher, not approved) and its teacher profile atomically.
    async fn create_teacher(&self, new: NewTeacher) -> Result<Teacher, DatabaseError>;

    async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_student(&self, user_id: Uuid) -> Result<Option<Student>, DatabaseError>;

    async fn find_teacher(&self, user_id: Uuid) -> Result<Option<Teacher>, DatabaseError>;

    async fn insert_health_data(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        reading: NewHealthData,
    ) -> Result<HealthData, DatabaseError>;

    /// All readings of one student, newest first.
    async fn health_history(&self, student_id: Uuid) -> Result<Vec<HealthData>, DatabaseError>;

    /// Students matching the filter ordered by student ID, each with record dates newest first.
    async fn class_roster(&self, filter: &ClassFilter) -> Result<Vec<RosterEntry>, DatabaseError>;

    async fn class_averages(&self, filter: &ClassFilter) -> Result<VitalsAverages, DatabaseError>;

    /// Create the classroom and enroll every student matching `filter`.
    async fn create_classroom(
        &self,
        teacher_id: Uuid,
        filter: &ClassFilter,
    ) -> Result<ClassroomWithStudents, DatabaseError>;

    async fn list_classrooms(&self, teacher_id: Uuid) -> Result<Vec<ClassroomWithStudents>, DatabaseError>;

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, DatabaseError>;

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError>;

    /// Returns whether a session was removed.
    async fn delete_session(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
