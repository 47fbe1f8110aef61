mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn submitted_reading_shows_in_own_history_only() -> Result<()> {
    let server = common::start_server().await?;
    let asha = server.student_token("Green Valley High", "A", "1").await?;
    let ravi = server.student_token("Green Valley High", "A", "2").await?;

    let (status, body) = server.submit_vitals(&asha, 72, 36.6).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["bpm"], 72);
    assert_eq!(body["data"]["temperature"], "36.6");
    assert!(body["data"]["date"].is_string());

    let (_, mine) = server.get("/api/student/health-history", Some(&asha)).await?;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);

    let (status, theirs) = server.get("/api/student/health-history", Some(&ravi)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(theirs["data"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn history_is_newest_first() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.student_token("Green Valley High", "A", "1").await?;

    for bpm in [70, 75, 80] {
        server.submit_vitals(&token, bpm, 36.8).await?;
    }

    let (_, body) = server.get("/api/student/health-history", Some(&token)).await?;
    let bpms: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["bpm"].as_i64().unwrap())
        .collect();
    assert_eq!(bpms, vec![80, 75, 70]);

    Ok(())
}

#[tokio::test]
async fn invalid_reading_is_400() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.student_token("Green Valley High", "A", "1").await?;

    let (status, body) = server
        .post(
            "/api/student/health-data",
            Some(&token),
            json!({ "bpm": 72, "spo2": 140, "breathe_rate": "sixteen", "temperature": 36.65 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["spo2"].is_string());
    assert!(body["field_errors"]["breathe_rate"].is_string());
    assert!(body["field_errors"]["temperature"].is_string());
    assert!(body["field_errors"].get("bpm").is_none());

    Ok(())
}

#[tokio::test]
async fn teacher_gets_403_regardless_of_payload() -> Result<()> {
    let server = common::start_server().await?;
    let token = server
        .teacher_token("meera@gvh.edu", "Green Valley High", "GVH")
        .await?;

    let (status, _) = server.submit_vitals(&token, 72, 36.6).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .post("/api/student/health-data", Some(&token), json!({ "bpm": "garbage" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // History is simply empty for non-students
    let (status, body) = server.get("/api/student/health-history", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    Ok(())
}
