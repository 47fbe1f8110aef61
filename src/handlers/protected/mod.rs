// handlers/protected/mod.rs - Handlers that require an authenticated session
//
// Every handler here receives the caller as Extension<AuthUser>.

pub mod session;
pub mod student;
pub mod teacher;

pub use session::{logout, whoami};
pub use student::{health_data_post, health_history_get};
pub use teacher::{classrooms_get, dashboard_get, dashboard_post};
