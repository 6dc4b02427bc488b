//! HTTP endpoint integration tests using axum-test
//!
//! The router is built exactly as in production, with an in-memory account
//! store and a stub model backend in place of Postgres and the LLM.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::accounts::auth::issue_token;
use crate::accounts::auth::tests::hash_password;
use crate::accounts::store::UserStore;
use crate::compliance::scanner::tests::StubModel;
use crate::config::{Config, LlmSettings};
use crate::errors::AppError;
use crate::models::user::User;
use crate::pdf::tests::build_pdf;
use crate::routes::build_router;
use crate::state::AppState;

const SECRET: &str = "integration-secret";
const PASSWORD: &str = "Broadcast1";

struct MemoryUserStore(Vec<User>);

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.0.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.0.iter().find(|u| u.username == username).cloned())
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, AppError> {
        Ok(self
            .0
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD))
}

fn user(id: i64, username: &str, is_active: bool, is_superuser: bool) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{username}@station.test"),
        hashed_password: password_hash().to_string(),
        is_active,
        is_superuser,
        created_at: Utc::now(),
    }
}

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        access_token_expire_minutes: 60,
        llm: LlmSettings {
            api_key: "unused".to_string(),
            model: "stub".to_string(),
            temperature: None,
            base_url: "http://localhost".to_string(),
        },
        max_upload_bytes: 5 * 1024 * 1024,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Create a test server; `answer = None` makes every model call fail.
fn create_test_server(answer: Option<Value>) -> TestServer {
    let state = AppState {
        users: Arc::new(MemoryUserStore(vec![
            user(1, "operator", true, false),
            user(2, "admin", true, true),
            user(3, "retired", false, false),
        ])),
        scanner: Arc::new(StubModel(answer)),
        config: test_config(),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn bearer(user_id: i64) -> HeaderValue {
    let token = issue_token(user_id, SECRET, 5).unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn model_answer() -> Value {
    json!({
        "compliance_score": 74,
        "compliance_status": "partial",
        "compliance_message": "EAS logging gaps found",
        "detailed_report": {
            "compliance_score": 74,
            "compliance_status": "Partial Compliance",
            "summary_of_findings": "Mostly in order",
            "section_breakdown": "See issues",
            "specific_issues": "Weekly tests missing",
            "recommendations": "Log weekly tests",
            "section_scores": {"technical_standards": 77, "Children's TV": 12}
        }
    })
}

fn assert_section_keys(document: &Value) {
    let scores = document["detailedReport"]["section_scores"]
        .as_object()
        .unwrap();
    let mut keys: Vec<&str> = scores.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "EAS Compliance",
            "Ownership Disclosure",
            "Public File Requirements",
            "RF Exposure",
            "Technical Compliance"
        ]
    );
    for value in scores.values() {
        let score = value.as_u64().unwrap();
        assert!(score <= 100);
    }
}

fn pdf_form(filename: &str, bytes: Vec<u8>, org_context: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("org_context", org_context.to_string())
        .add_part(
            "pdf_file",
            Part::bytes(bytes)
                .file_name(filename.to_string())
                .mime_type("application/pdf"),
        )
}

// ────────────────────────────────────────────────────────────────────────────
// Health
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_returns_200() {
    let server = create_test_server(None);
    for path in ["/", "/health"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let json = response.json::<Value>();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "fcc-compliance-api");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Accounts
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_issues_usable_token() {
    let server = create_test_server(None);
    let response = server
        .post("/api/v1/unauth/login")
        .json(&json!({"username": "operator", "password": PASSWORD}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().unwrap();
    let me = server
        .get("/api/v1/auth/me")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
        .await;
    me.assert_status_ok();
    let me = me.json::<Value>();
    assert_eq!(me["username"], "operator");
    assert!(me.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let server = create_test_server(None);
    let response = server
        .post("/api/v1/unauth/login")
        .json(&json!({"username": "operator", "password": "nope"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_requires_token() {
    let server = create_test_server(None);
    let response = server.get("/api/v1/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inactive_user_is_rejected() {
    let server = create_test_server(None);
    let response = server
        .get("/api/v1/auth/me")
        .add_header(header::AUTHORIZATION, bearer(3))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_listing_requires_superuser() {
    let server = create_test_server(None);

    let forbidden = server
        .get("/api/v1/auth/users")
        .add_header(header::AUTHORIZATION, bearer(1))
        .await;
    forbidden.assert_status(StatusCode::FORBIDDEN);

    let listed = server
        .get("/api/v1/auth/users")
        .add_header(header::AUTHORIZATION, bearer(2))
        .await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_user_id_is_404() {
    let server = create_test_server(None);
    let response = server
        .get("/api/v1/auth/users/99")
        .add_header(header::AUTHORIZATION, bearer(2))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ────────────────────────────────────────────────────────────────────────────
// JSON compliance scan
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_compliance_scan_requires_token() {
    let server = create_test_server(Some(model_answer()));
    let response = server
        .post("/api/v1/auth/compliance_scan")
        .json(&json!({"compliance_data": [{"content": "log"}], "questions": []}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_compliance_scan_normalizes_model_answer() {
    let server = create_test_server(Some(model_answer()));
    let response = server
        .post("/api/v1/auth/compliance_scan")
        .add_header(header::AUTHORIZATION, bearer(1))
        .json(&json!({
            "compliance_data": [
                {"content": "EAS log for March", "source": "eas_log.txt"},
                {"content": "Public file index"}
            ],
            "questions": [],
            "user_context": {"callsign": "KXYZ"}
        }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    let document = &body["document"];
    assert!(document["id"].as_str().unwrap().starts_with("doc_"));
    assert_eq!(document["name"], "eas_log.txt");
    assert_eq!(document["progress"], 100);
    assert_eq!(document["status"], "complete");
    assert_eq!(document["complianceStatus"], "issues");
    assert_eq!(document["complianceMessage"], "EAS logging gaps found");
    assert_eq!(
        document["detailedReport"]["section_scores"]["Technical Compliance"],
        77
    );
    assert_section_keys(document);
}

#[tokio::test]
async fn test_compliance_scan_degrades_on_model_failure() {
    let server = create_test_server(None);
    let response = server
        .post("/api/v1/auth/compliance_scan")
        .add_header(header::AUTHORIZATION, bearer(1))
        .json(&json!({"compliance_data": [{"content": "anything"}], "questions": []}))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    let document = &body["document"];
    assert_eq!(document["status"], "error");
    assert_eq!(document["complianceStatus"], "review");
    assert_eq!(document["detailedReport"]["compliance_score"], 50);
    assert_eq!(document["detailedReport"]["compliance_status"], "Needs Review");
    assert_section_keys(document);
}

// ────────────────────────────────────────────────────────────────────────────
// PDF compliance scan
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pdf_scan_rejects_malformed_org_context() {
    let server = create_test_server(Some(model_answer()));
    let response = server
        .post("/api/v1/unauth/pdf_compliance_scan")
        .multipart(pdf_form("report.pdf", b"not even a pdf".to_vec(), "{not json"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(
        body["error"]["message"],
        "Invalid organization context JSON format"
    );
}

#[tokio::test]
async fn test_pdf_scan_rejects_non_pdf_filename() {
    let server = create_test_server(Some(model_answer()));
    let response = server
        .post("/api/v1/unauth/pdf_compliance_scan")
        .multipart(pdf_form("report.docx", b"bytes".to_vec(), "{}"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pdf_scan_rejects_image_only_pdf() {
    let server = create_test_server(Some(model_answer()));
    let pdf = build_pdf(&[None], None);
    let response = server
        .post("/api/v1/unauth/pdf_compliance_scan")
        .multipart(pdf_form("scan.pdf", pdf, r#"{"name": "KXYZ"}"#))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let message = response.json::<Value>()["error"]["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.starts_with("Could not extract text from PDF"));
}

#[tokio::test]
async fn test_pdf_scan_returns_normalized_document() {
    let server = create_test_server(Some(model_answer()));
    let pdf = build_pdf(&[Some("Quarterly issues and programs list")], Some("Q1"));
    let response = server
        .post("/api/v1/unauth/pdf_compliance_scan")
        .multipart(pdf_form("q1_public_file.pdf", pdf, r#"{"name": "KXYZ"}"#))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    let document = &body["document"];
    assert_eq!(document["name"], "q1_public_file.pdf");
    assert_eq!(document["status"], "complete");
    assert!(document["size"].as_str().unwrap().ends_with("bytes")
        || document["size"].as_str().unwrap().ends_with("KB"));
    assert_section_keys(document);
}

#[tokio::test]
async fn test_pdf_scan_degrades_on_model_failure() {
    let server = create_test_server(None);
    let pdf = build_pdf(&[Some("Tower lighting inspection")], None);
    let response = server
        .post("/api/v1/unauth/pdf_compliance_scan")
        .multipart(pdf_form("tower.pdf", pdf, "{}"))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(
        body["message"],
        "Document scan encountered an error but returned a fallback response"
    );
    assert_eq!(body["document"]["status"], "error");
    assert_eq!(body["document"]["complianceStatus"], "review");
    assert_eq!(body["document"]["name"], "tower.pdf");
}
