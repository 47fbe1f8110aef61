mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn dashboard_is_scoped_to_teacher_school() -> Result<()> {
    let server = common::start_server().await?;

    let gvh_1 = server.student_token("Green Valley High", "A", "1").await?;
    let gvh_2 = server.student_token("Green Valley High", "A", "2").await?;
    let hca_1 = server.student_token("Hill Crest Academy", "A", "1").await?;
    server.submit_vitals(&gvh_1, 60, 36.0).await?;
    server.submit_vitals(&gvh_2, 80, 37.0).await?;
    server.submit_vitals(&hca_1, 150, 40.0).await?;

    let teacher = server
        .teacher_token("meera@gvh.edu", "Green Valley High", "GVH")
        .await?;
    let (status, body) = server.get("/api/teacher/dashboard", Some(&teacher)).await?;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["class_name"], "10th Grade");
    assert_eq!(data["section"], "A");
    assert_eq!(data["students"].as_array().unwrap().len(), 2);
    assert_eq!(data["students"][0]["roll_no"], "1");
    assert_eq!(data["students"][0]["record_dates"].as_array().unwrap().len(), 1);
    assert_eq!(data["analytics"]["avg_bpm"], 70.0);
    assert_eq!(data["analytics"]["avg_temperature"], 36.5);

    Ok(())
}

#[tokio::test]
async fn dashboard_without_data_has_null_averages() -> Result<()> {
    let server = common::start_server().await?;
    server.register_student("Green Valley High", "B", "1").await?;
    let teacher = server
        .teacher_token("meera@gvh.edu", "Green Valley High", "GVH")
        .await?;

    let (status, body) = server
        .get("/api/teacher/dashboard?class_name=10th%20Grade&section=B", Some(&teacher))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["students"].as_array().unwrap().len(), 1);
    assert!(body["data"]["analytics"]["avg_bpm"].is_null());
    assert!(body["data"]["analytics"]["avg_temperature"].is_null());

    Ok(())
}

#[tokio::test]
async fn students_cannot_see_dashboard() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.student_token("Green Valley High", "A", "1").await?;

    let (status, body) = server.get("/api/teacher/dashboard", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    Ok(())
}

#[tokio::test]
async fn classroom_creation_and_listing() -> Result<()> {
    let server = common::start_server().await?;
    server.register_student("Green Valley High", "A", "1").await?;
    server.register_student("Green Valley High", "A", "2").await?;
    server.register_student("Hill Crest Academy", "A", "3").await?;
    let teacher = server
        .teacher_token("meera@gvh.edu", "Green Valley High", "GVH")
        .await?;

    let selector = json!({ "class_name": "10th Grade", "section": "A" });
    let (status, body) = server
        .post("/api/teacher/dashboard", Some(&teacher), selector.clone())
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["message"], "Data entry successful.");
    let enrolled: Vec<&str> = body["data"]["classroom"]["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["student_id"].as_str().unwrap())
        .collect();
    assert_eq!(enrolled, vec!["GVH001", "GVH002"]);

    let (status, _) = server.post("/api/teacher/dashboard", Some(&teacher), selector).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server.get("/api/teacher/classrooms", Some(&teacher)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["class_name"], "10th Grade");

    Ok(())
}
