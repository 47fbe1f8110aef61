mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn student_login_returns_token_and_profile() -> Result<()> {
    let server = common::start_server().await?;
    let (student_id, password) = server.register_student("Green Valley High", "A", "7").await?;

    let (status, body) = server
        .post("/api/login/student", None, json!({ "studentId": student_id, "password": password }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Login successful.");
    assert_eq!(body["data"]["user"]["role"], "student");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["token"].as_str().unwrap();
    let (status, me) = server.get("/api/auth/whoami", Some(token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["student"]["student_id"], "GVH007");

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() -> Result<()> {
    let server = common::start_server().await?;
    let (student_id, _) = server.register_student("Green Valley High", "A", "7").await?;

    let (status, body) = server
        .post("/api/login/student", None, json!({ "student_id": student_id, "password": "NOPE" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
    assert_eq!(body["message"], "Invalid credentials.");

    Ok(())
}

#[tokio::test]
async fn teacher_login_checks_school_code() -> Result<()> {
    let server = common::start_server().await?;
    let password = server
        .register_teacher("meera@gvh.edu", "Green Valley High", "GVH")
        .await?;

    let (status, body) = server
        .post(
            "/api/login/teacher",
            None,
            json!({ "email": "meera@gvh.edu", "password": password, "school_code": "HCA" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, body) = server
        .post(
            "/api/login/teacher",
            None,
            json!({ "email": "meera@gvh.edu", "password": password, "school_code": "GVH" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["is_approved"], false);

    Ok(())
}

#[tokio::test]
async fn teacher_cannot_use_student_login() -> Result<()> {
    let server = common::start_server().await?;
    let password = server
        .register_teacher("meera@gvh.edu", "Green Valley High", "GVH")
        .await?;

    let (status, _) = server
        .post("/api/login/student", None, json!({ "student_id": "meera@gvh.edu", "password": password }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn token_is_rejected_after_logout() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.student_token("Green Valley High", "A", "7").await?;

    let (status, body) = server.post("/api/logout", Some(&token), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Logged out successfully.");

    let (status, _) = server.get("/api/student/health-history", Some(&token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
