// handlers/public/mod.rs - Token acquisition and account creation

pub mod login;
pub mod register;

pub use login::{login_student, login_teacher};
pub use register::{register_student, register_teacher};
