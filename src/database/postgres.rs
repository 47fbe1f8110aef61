use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    ClassFilter, Classroom, ClassroomStudent, ClassroomWithStudents, HealthData, NewHealthData,
    NewStudent, NewTeacher, Role, RosterEntry, Session, Student, Teacher, User, VitalsAverages,
};
use super::store::Store;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_approved, created_at";

/// `Store` backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_user(
        conn: &mut PgConnection,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: Role,
        is_approved: bool,
    ) -> Result<Uuid, DatabaseError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, is_approved) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(is_approved)
        .execute(conn)
        .await
        .map_err(|e| DatabaseError::conflict_on_unique(e, format!("username '{}' already exists", username)))?;
        Ok(id)
    }

    async fn classroom_students(
        pool: &PgPool,
        classroom_id: i64,
    ) -> Result<Vec<ClassroomStudent>, DatabaseError> {
        let students = sqlx::query_as::<_, ClassroomStudent>(
            r#"
            SELECT s.student_id, s.name, s.class_name, s.section, s.roll_no
            FROM classroom_students cs
            JOIN students s ON s.user_id = cs.student_id
            WHERE cs.classroom_id = $1
            ORDER BY s.student_id
            "#,
        )
        .bind(classroom_id)
        .fetch_all(pool)
        .await?;
        Ok(students)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn create_student(&self, new: NewStudent) -> Result<Student, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let user_id = Self::insert_user(
            &mut tx,
            &new.student_id,
            None,
            &new.password_hash,
            Role::Student,
            true,
        )
        .await?;

        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students
                (user_id, student_id, name, school, school_code, class_name, section, roll_no)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING user_id, student_id, name, school, school_code, class_name, section, roll_no, created_at
            "#,
        )
        .bind(user_id)
        .bind(&new.student_id)
        .bind(&new.name)
        .bind(&new.school)
        .bind(&new.school_code)
        .bind(&new.class_name)
        .bind(&new.section)
        .bind(&new.roll_no)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::conflict_on_unique(e, format!("student '{}' already exists", new.student_id)))?;

        tx.commit().await?;
        Ok(student)
    }

    async fn create_teacher(&self, new: NewTeacher) -> Result<Teacher, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let user_id = Self::insert_user(
            &mut tx,
            &new.email,
            Some(&new.email),
            &new.password_hash,
            Role::Teacher,
            false,
        )
        .await?;

        let teacher = sqlx::query_as::<_, Teacher>(
            r#"
            INSERT INTO teachers (user_id, name, school, school_code, department)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING user_id, name, school, school_code, department, created_at
            "#,
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.school)
        .bind(&new.school_code)
        .bind(&new.department)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(teacher)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_student(&self, user_id: Uuid) -> Result<Option<Student>, DatabaseError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT user_id, student_id, name, school, school_code, class_name, section, roll_no, created_at \
             FROM students WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn find_teacher(&self, user_id: Uuid) -> Result<Option<Teacher>, DatabaseError> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT user_id, name, school, school_code, department, created_at FROM teachers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(teacher)
    }

    async fn insert_health_data(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        reading: NewHealthData,
    ) -> Result<HealthData, DatabaseError> {
        let record = sqlx::query_as::<_, HealthData>(
            r#"
            INSERT INTO health_data (student_id, date, bpm, spo2, breathe_rate, temperature)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, student_id, date, bpm, spo2, breathe_rate, temperature, created_at
            "#,
        )
        .bind(student_id)
        .bind(date)
        .bind(reading.bpm)
        .bind(reading.spo2)
        .bind(reading.breathe_rate)
        .bind(reading.temperature)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn health_history(&self, student_id: Uuid) -> Result<Vec<HealthData>, DatabaseError> {
        let records = sqlx::query_as::<_, HealthData>(
            r#"
            SELECT id, student_id, date, bpm, spo2, breathe_rate, temperature, created_at
            FROM health_data
            WHERE student_id = $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn class_roster(&self, filter: &ClassFilter) -> Result<Vec<RosterEntry>, DatabaseError> {
        let rows: Vec<(Uuid, String, String, Option<NaiveDate>)> = sqlx::query_as(
            r#"
            SELECT s.user_id, s.name, s.roll_no, h.date
            FROM students s
            LEFT JOIN health_data h ON h.student_id = s.user_id
            WHERE s.school = $1 AND s.class_name = $2 AND s.section = $3
            ORDER BY s.student_id, h.date DESC, h.id DESC
            "#,
        )
        .bind(&filter.school)
        .bind(&filter.class_name)
        .bind(&filter.section)
        .fetch_all(&self.pool)
        .await?;

        // Rows arrive grouped by student; fold the joined dates into one entry each
        let mut roster: Vec<RosterEntry> = Vec::new();
        let mut current: Option<Uuid> = None;
        for (user_id, name, roll_no, date) in rows {
            if current != Some(user_id) {
                current = Some(user_id);
                roster.push(RosterEntry {
                    name,
                    roll_no,
                    record_dates: Vec::new(),
                });
            }
            if let (Some(date), Some(entry)) = (date, roster.last_mut()) {
                entry.record_dates.push(date);
            }
        }
        Ok(roster)
    }

    async fn class_averages(&self, filter: &ClassFilter) -> Result<VitalsAverages, DatabaseError> {
        let averages = sqlx::query_as::<_, VitalsAverages>(
            r#"
            SELECT
                AVG(h.bpm)::float8 AS avg_bpm,
                AVG(h.spo2)::float8 AS avg_spo2,
                AVG(h.breathe_rate)::float8 AS avg_breathe_rate,
                AVG(h.temperature)::float8 AS avg_temperature
            FROM health_data h
            JOIN students s ON s.user_id = h.student_id
            WHERE s.school = $1 AND s.class_name = $2 AND s.section = $3
            "#,
        )
        .bind(&filter.school)
        .bind(&filter.class_name)
        .bind(&filter.section)
        .fetch_one(&self.pool)
        .await?;
        Ok(averages)
    }

    async fn create_classroom(
        &self,
        teacher_id: Uuid,
        filter: &ClassFilter,
    ) -> Result<ClassroomWithStudents, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let classroom = sqlx::query_as::<_, Classroom>(
            r#"
            INSERT INTO classrooms (teacher_id, class_name, section)
            VALUES ($1, $2, $3)
            RETURNING id, teacher_id, class_name, section, created_at
            "#,
        )
        .bind(teacher_id)
        .bind(&filter.class_name)
        .bind(&filter.section)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            DatabaseError::conflict_on_unique(
                e,
                format!("classroom '{} - {}' already exists", filter.class_name, filter.section),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO classroom_students (classroom_id, student_id)
            SELECT $1, user_id FROM students
            WHERE school = $2 AND class_name = $3 AND section = $4
            "#,
        )
        .bind(classroom.id)
        .bind(&filter.school)
        .bind(&filter.class_name)
        .bind(&filter.section)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let students = Self::classroom_students(&self.pool, classroom.id).await?;
        Ok(ClassroomWithStudents { classroom, students })
    }

    async fn list_classrooms(&self, teacher_id: Uuid) -> Result<Vec<ClassroomWithStudents>, DatabaseError> {
        let classrooms = sqlx::query_as::<_, Classroom>(
            r#"
            SELECT id, teacher_id, class_name, section, created_at
            FROM classrooms
            WHERE teacher_id = $1
            ORDER BY class_name, section
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(classrooms.len());
        for classroom in classrooms {
            let students = Self::classroom_students(&self.pool, classroom.id).await?;
            result.push(ClassroomWithStudents { classroom, students });
        }
        Ok(result)
    }

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, DatabaseError> {
        sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
