use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(&config::config().security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register/student", post(public::register_student))
        .route("/api/register/teacher", post(public::register_teacher))
        .route("/api/login/student", post(public::login_student))
        .route("/api/login/teacher", post(public::login_teacher))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/logout", post(protected::logout))
        .route("/api/auth/whoami", get(protected::whoami))
        .route("/api/student/health-data", post(protected::health_data_post))
        .route("/api/student/health-history", get(protected::health_history_get))
        .route(
            "/api/teacher/dashboard",
            get(protected::dashboard_get).post(protected::dashboard_post),
        )
        .route("/api/teacher/classrooms", get(protected::classrooms_get))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "HealthTrack API",
            "version": version,
            "description": "Student vital-sign tracking with per-school class analytics",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "register": "/api/register/student, /api/register/teacher (public)",
                "login": "/api/login/student, /api/login/teacher (public - token acquisition)",
                "session": "/api/logout, /api/auth/whoami (protected)",
                "student": "/api/student/health-data, /api/student/health-history (protected, students)",
                "teacher": "/api/teacher/dashboard, /api/teacher/classrooms (protected, teachers)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
