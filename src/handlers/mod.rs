// handlers/mod.rs - HTTP handlers grouped by access tier
//
// public/     no token required (registration, login)
// protected/  behind jwt_auth_middleware; role gates are enforced by the services

pub mod protected;
pub mod public;
