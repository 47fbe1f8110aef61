pub mod classroom;
pub mod health_data;
pub mod limits;
pub mod session;
pub mod student;
pub mod teacher;
pub mod user;

pub use classroom::{Classroom, ClassroomStudent, ClassroomWithStudents};
pub use health_data::{HealthData, NewHealthData, VitalsAverages};
pub use session::Session;
pub use student::{ClassFilter, NewStudent, RosterEntry, Student};
pub use teacher::{NewTeacher, Teacher};
pub use user::{Role, User};
