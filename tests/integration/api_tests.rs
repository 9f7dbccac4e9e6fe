//! API integration tests

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use barbershop_server::{
    api,
    config::{
        AppConfig, AuthConfig, DatabaseConfig, GenerationConfig, LoggingConfig, RedisConfig,
        ServerConfig, ShopConfig, SmsConfig,
    },
    models::{enums::StaffRole, StaffClaims},
    repository::Repository,
    services::Services,
    AppState,
};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

const BASE_URL: &str = "http://localhost:8080/api/v1";
const SECRET: &str = "change-this-secret-in-production";

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
        },
        logging: LoggingConfig::default(),
        shop: ShopConfig::default(),
        generation: GenerationConfig::default(),
        sms: SmsConfig::default(),
        redis: RedisConfig::default(),
    }
}

fn token(role: StaffRole) -> String {
    let now = Utc::now().timestamp();
    StaffClaims {
        sub: format!("{:?}-1", role).to_lowercase(),
        name: Some("Test Staff".to_string()),
        role,
        exp: now + 3600,
        iat: now,
    }
    .create_token(SECRET)
    .expect("Failed to sign token")
}

/// Router over a lazy pool; requests that never reach the database work offline
fn app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Invalid database url");
    let services = Services::new(Repository::new(pool), &config, None).expect("Failed to build services");
    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

#[tokio::test]
async fn test_health_is_served_without_database() {
    let response = app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/auto-customers/push")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "from": "2024-01-01", "to": "2024-01-31" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_barber_cannot_generate() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/auto-customers/push")
                .header("authorization", format!("Bearer {}", token(StaffRole::Barber)))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "from": "2024-01-01", "to": "2024-01-31" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reversed_range_is_a_validation_error() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/auto-customers/push")
                .header("authorization", format!("Bearer {}", token(StaffRole::Manager)))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "from": "2024-02-01", "to": "2024-01-01" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap_or_default().contains("before its start"));
}

#[tokio::test]
async fn test_barber_cannot_undo() {
    let response = app()
        .oneshot(
            Request::post(format!("/api/v1/generation-batches/{}/undo", uuid::Uuid::new_v4()))
                .header("authorization", format!("Bearer {}", token(StaffRole::Barber)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// End to end, against a running server and database
// Run with: cargo test -- --ignored
// ---------------------------------------------------------------------------

fn auth(role: StaffRole) -> String {
    format!("Bearer {}", token(role))
}

#[tokio::test]
#[ignore]
async fn test_push_dry_run_then_commit_then_undo() {
    let client = Client::new();
    let manager = auth(StaffRole::Manager);

    let barber = format!("barber-{}", uuid::Uuid::new_v4());
    let response = client
        .post(format!("{}/auto-customers", BASE_URL))
        .header("authorization", &manager)
        .json(&json!({
            "name": "Jordan",
            "phone": "+15550100",
            "barber": barber,
            "weekday": 1,
            "time_of_day": "09:00",
            "cadence_weeks": 2,
            "start_from": "2030-01-07",
            "max_occurrences": 4
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let customer: Value = response.json().await.expect("Failed to parse response");
    let customer_id = customer["id"].as_str().expect("No id").to_string();

    let request = json!({
        "from": "2030-01-01",
        "to": "2030-03-31",
        "auto_customer_ids": [customer_id]
    });

    let mut dry = request.clone();
    dry["dry_run"] = json!(true);
    let preview: Value = client
        .post(format!("{}/auto-customers/push", BASE_URL))
        .header("authorization", &manager)
        .json(&dry)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(preview["dry_run"], true);
    assert_eq!(preview["totals"]["inserted"], 4);
    assert!(preview["batch_id"].is_null());

    let committed: Value = client
        .post(format!("{}/auto-customers/push", BASE_URL))
        .header("authorization", &manager)
        .json(&request)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(committed["totals"]["inserted"], 4);
    assert_eq!(committed["created_count"], 4);
    let batch_id = committed["batch_id"].as_str().expect("No batch id").to_string();

    let rerun: Value = client
        .post(format!("{}/auto-customers/push", BASE_URL))
        .header("authorization", &manager)
        .json(&request)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(rerun["totals"]["existing"], 4);
    assert_eq!(rerun["created_count"], 0);

    let undo = client
        .post(format!("{}/generation-batches/{}/undo", BASE_URL, batch_id))
        .header("authorization", &manager)
        .json(&json!({ "reason": "test" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(undo.status().is_success());
    let undo: Value = undo.json().await.expect("Failed to parse response");
    assert_eq!(undo["success"], true);
    assert!(undo["message"].as_str().unwrap_or_default().starts_with("Removed 4"));

    let again = client
        .post(format!("{}/generation-batches/{}/undo", BASE_URL, batch_id))
        .header("authorization", &manager)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(again.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_manual_overlap_is_refused_unless_forced() {
    let client = Client::new();
    let admin = auth(StaffRole::Admin);
    let barber = format!("barber-{}", uuid::Uuid::new_v4());

    let book = |force: bool| {
        json!({
            "barber": barber,
            "start": "2030-05-06T10:00:00Z",
            "duration_min": 40,
            "customer_name": "Sam",
            "force": force
        })
    };

    let first = client
        .post(format!("{}/calendar/appointments", BASE_URL))
        .header("authorization", &admin)
        .json(&book(false))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/calendar/appointments", BASE_URL))
        .header("authorization", &admin)
        .json(&book(false))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);

    let forced = client
        .post(format!("{}/calendar/appointments", BASE_URL))
        .header("authorization", &admin)
        .json(&book(true))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(forced.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_unknown_batch_is_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/generation-batches/{}", BASE_URL, uuid::Uuid::new_v4()))
        .header("authorization", auth(StaffRole::Manager))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
