#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// A server process on its own port with a fresh in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_healthtrack-api"));
        cmd.arg("serve")
            .env("APP_ENV", "development")
            .env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env_remove("HEALTHTRACK_PORT")
            .env("STORE_BACKEND", "memory")
            .env("JWT_SECRET", "integration-test-secret")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let res = request.send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let res = request.send().await?;
        Ok((res.status(), res.json().await?))
    }

    /// Register a student and return `(student_id, temp_password)`
    pub async fn register_student(&self, school: &str, section: &str, roll_no: &str) -> Result<(String, String)> {
        let (status, body) = self
            .post(
                "/api/register/student",
                None,
                json!({
                    "name": format!("Student {}", roll_no),
                    "school": school,
                    "class_name": "10th Grade",
                    "section": section,
                    "roll_no": roll_no
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "student registration failed: {}", body);
        Ok((
            body["data"]["student_id"].as_str().context("student_id")?.to_string(),
            body["data"]["temp_password"].as_str().context("temp_password")?.to_string(),
        ))
    }

    pub async fn student_token(&self, school: &str, section: &str, roll_no: &str) -> Result<String> {
        let (student_id, password) = self.register_student(school, section, roll_no).await?;
        let (status, body) = self
            .post(
                "/api/login/student",
                None,
                json!({ "student_id": student_id, "password": password }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "student login failed: {}", body);
        Ok(body["data"]["token"].as_str().context("token")?.to_string())
    }

    /// Register a teacher and return the temporary password
    pub async fn register_teacher(&self, email: &str, school: &str, school_code: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/register/teacher",
                None,
                json!({
                    "name": "Teacher",
                    "email": email,
                    "school": school,
                    "school_code": school_code,
                    "department": "Science"
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "teacher registration failed: {}", body);
        Ok(body["data"]["temp_password"].as_str().context("temp_password")?.to_string())
    }

    pub async fn teacher_token(&self, email: &str, school: &str, school_code: &str) -> Result<String> {
        let password = self.register_teacher(email, school, school_code).await?;
        let (status, body) = self
            .post(
                "/api/login/teacher",
                None,
                json!({ "email": email, "password": password, "school_code": school_code }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "teacher login failed: {}", body);
        Ok(body["data"]["token"].as_str().context("token")?.to_string())
    }

    pub async fn submit_vitals(&self, token: &str, bpm: i64, temperature: f64) -> Result<(StatusCode, Value)> {
        self.post(
            "/api/student/health-data",
            Some(token),
            json!({ "bpm": bpm, "spo2": 98, "breathe_rate": 16, "temperature": temperature }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
