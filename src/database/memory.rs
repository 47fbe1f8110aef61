use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    ClassFilter, Classroom, ClassroomStudent, ClassroomWithStudents, HealthData, NewHealthData,
    NewStudent, NewTeacher, Role, RosterEntry, Session, Student, Teacher, User, VitalsAverages,
};
use super::store::Store;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    usernames: HashMap<String, Uuid>,
    students: HashMap<Uuid, Student>,
    teachers: HashMap<Uuid, Teacher>,
    classrooms: Vec<(Classroom, Vec<Uuid>)>,
    health_data: Vec<HealthData>,
    sessions: HashMap<Uuid, Session>,
    next_health_id: i64,
    next_classroom_id: i64,
}

impl Tables {
    /// Insert a user, rejecting duplicate usernames. Caller holds the write lock.
    fn insert_user(
        &mut self,
        username: &str,
        email: Option<String>,
        password_hash: String,
        role: Role,
        is_approved: bool,
    ) -> Result<Uuid, DatabaseError> {
        if self.usernames.contains_key(username) {
            return Err(DatabaseError::Conflict(format!("username '{}' already exists", username)));
        }
        let id = Uuid::new_v4();
        self.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                email,
                password_hash,
                role,
                is_approved,
                created_at: Utc::now(),
            },
        );
        self.usernames.insert(username.to_string(), id);
        Ok(id)
    }

    /// Students in the classroom ordered by student ID
    fn classroom_students(&self, members: &[Uuid]) -> Vec<ClassroomStudent> {
        let mut students: Vec<ClassroomStudent> = members
            .iter()
            .filter_map(|id| self.students.get(id))
            .map(|s| ClassroomStudent {
                student_id: s.student_id.clone(),
                name: s.name.clone(),
                class_name: s.class_name.clone(),
                section: s.section.clone(),
                roll_no: s.roll_no.clone(),
            })
            .collect();
        students.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        students
    }

    fn class_records<'a>(&'a self, filter: &'a ClassFilter) -> impl Iterator<Item = &'a HealthData> + 'a {
        self.health_data.iter().filter(move |record| {
            self.students
                .get(&record.student_id)
                .map(|student| filter.matches(student))
                .unwrap_or(false)
        })
    }
}

fn newest_first(a: &HealthData, b: &HealthData) -> std::cmp::Ordering {
    b.date.cmp(&a.date).then(b.id.cmp(&a.id))
}

/// `Store` kept entirely in process memory.
///
/// All tables sit behind one lock, so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_student(&self, new: NewStudent) -> Result<Student, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.students.values().any(|s| s.student_id == new.student_id) {
            return Err(DatabaseError::Conflict(format!("student '{}' already exists", new.student_id)));
        }

        let user_id = tables.insert_user(&new.student_id, None, new.password_hash, Role::Student, true)?;
        let student = Student {
            user_id,
            student_id: new.student_id,
            name: new.name,
            school: new.school,
            school_code: new.school_code,
            class_name: new.class_name,
            section: new.section,
            roll_no: new.roll_no,
            created_at: Utc::now(),
        };
        tables.students.insert(user_id, student.clone());
        Ok(student)
    }

    async fn create_teacher(&self, new: NewTeacher) -> Result<Teacher, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user_id = tables.insert_user(
            &new.email,
            Some(new.email.clone()),
            new.password_hash,
            Role::Teacher,
            false,
        )?;
        let teacher = Teacher {
            user_id,
            name: new.name,
            school: new.school,
            school_code: new.school_code,
            department: new.department,
            created_at: Utc::now(),
        };
        tables.teachers.insert(user_id, teacher.clone());
        Ok(teacher)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        Ok(self.tables.read().await.usernames.contains_key(username))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_student(&self, user_id: Uuid) -> Result<Option<Student>, DatabaseError> {
        Ok(self.tables.read().await.students.get(&user_id).cloned())
    }

    async fn find_teacher(&self, user_id: Uuid) -> Result<Option<Teacher>, DatabaseError> {
        Ok(self.tables.read().await.teachers.get(&user_id).cloned())
    }

    async fn insert_health_data(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        reading: NewHealthData,
    ) -> Result<HealthData, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.students.contains_key(&student_id) {
            return Err(DatabaseError::NotFound(format!("student {}", student_id)));
        }
        tables.next_health_id += 1;
        let record = HealthData {
            id: tables.next_health_id,
            student_id,
            date,
            bpm: reading.bpm,
            spo2: reading.spo2,
            breathe_rate: reading.breathe_rate,
            temperature: reading.temperature,
            created_at: Utc::now(),
        };
        tables.health_data.push(record.clone());
        Ok(record)
    }

    async fn health_history(&self, student_id: Uuid) -> Result<Vec<HealthData>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut records: Vec<HealthData> = tables
            .health_data
            .iter()
            .filter(|record| record.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by(newest_first);
        Ok(records)
    }

    async fn class_roster(&self, filter: &ClassFilter) -> Result<Vec<RosterEntry>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut students: Vec<&Student> = tables.students.values().filter(|s| filter.matches(s)).collect();
        students.sort_by(|a, b| a.student_id.cmp(&b.student_id));

        let roster = students
            .into_iter()
            .map(|student| {
                let mut records: Vec<&HealthData> = tables
                    .health_data
                    .iter()
                    .filter(|record| record.student_id == student.user_id)
                    .collect();
                records.sort_by(|a, b| newest_first(a, b));
                RosterEntry {
                    name: student.name.clone(),
                    roll_no: student.roll_no.clone(),
                    record_dates: records.into_iter().map(|record| record.date).collect(),
                }
            })
            .collect();
        Ok(roster)
    }

    async fn class_averages(&self, filter: &ClassFilter) -> Result<VitalsAverages, DatabaseError> {
        let tables = self.tables.read().await;
        let records: Vec<&HealthData> = tables.class_records(filter).collect();
        if records.is_empty() {
            return Ok(VitalsAverages::default());
        }

        let count = records.len() as f64;
        let mean = |value: fn(&HealthData) -> f64| -> Option<f64> {
            Some(records.iter().map(|record| value(record)).sum::<f64>() / count)
        };
        Ok(VitalsAverages {
            avg_bpm: mean(|r| f64::from(r.bpm)),
            avg_spo2: mean(|r| f64::from(r.spo2)),
            avg_breathe_rate: mean(|r| f64::from(r.breathe_rate)),
            avg_temperature: mean(|r| r.temperature.to_f64().unwrap_or_default()),
        })
    }

    async fn create_classroom(
        &self,
        teacher_id: Uuid,
        filter: &ClassFilter,
    ) -> Result<ClassroomWithStudents, DatabaseError> {
        let mut tables = self.tables.write().await;
        let exists = tables.classrooms.iter().any(|(c, _)| {
            c.teacher_id == teacher_id && c.class_name == filter.class_name && c.section == filter.section
        });
        if exists {
            return Err(DatabaseError::Conflict(format!(
                "classroom '{} - {}' already exists",
                filter.class_name, filter.section
            )));
        }

        tables.next_classroom_id += 1;
        let classroom = Classroom {
            id: tables.next_classroom_id,
            teacher_id,
            class_name: filter.class_name.clone(),
            section: filter.section.clone(),
            created_at: Utc::now(),
        };
        let members: Vec<Uuid> = tables
            .students
            .values()
            .filter(|s| filter.matches(s))
            .map(|s| s.user_id)
            .collect();
        let students = tables.classroom_students(&members);
        tables.classrooms.push((classroom.clone(), members));
        Ok(ClassroomWithStudents { classroom, students })
    }

    async fn list_classrooms(&self, teacher_id: Uuid) -> Result<Vec<ClassroomWithStudents>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut classrooms: Vec<ClassroomWithStudents> = tables
            .classrooms
            .iter()
            .filter(|(c, _)| c.teacher_id == teacher_id)
            .map(|(classroom, members)| ClassroomWithStudents {
                classroom: classroom.clone(),
                students: tables.classroom_students(members),
            })
            .collect();
        classrooms.sort_by(|a, b| {
            (&a.classroom.class_name, &a.classroom.section).cmp(&(&b.classroom.class_name, &b.classroom.section))
        });
        Ok(classrooms)
    }

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, DatabaseError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at,
        };
        let mut tables = self.tables.write().await;
        tables.sessions.retain(|_, s| s.is_live(now));
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.sessions.remove(&id).is_some())
    }
}
