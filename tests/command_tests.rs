// Command tests: scripted input against a mocked scoring service

use mockito::{Matcher, Mock, Server, ServerGuard};
use moy_risk::commands::{self, AppContext, CommandError, OutputFormat};
use moy_risk::config::ApiSettings;
use moy_risk::models::RiskCategory;
use moy_risk::services::{ApiClient, LocalStorage, ManualClock, ResponseCache, StorageKeys};
use std::io::Cursor;
use std::sync::Arc;

async fn context(base_url: &str, format: OutputFormat) -> AppContext {
    let storage = Arc::new(LocalStorage::in_memory());
    storage
        .set_item(StorageKeys::SESSION_ID, "anon_cli")
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = ResponseCache::new(storage.clone(), clock.clone(), 100, 3600);
    let settings = ApiSettings {
        base_url: base_url.to_string(),
        timeout_ms: 5_000,
        health_timeout_ms: 1_000,
    };
    let client = ApiClient::new(&settings, storage, cache, clock).unwrap();
    AppContext::new(Arc::new(client), format)
}

async fn mock_calculation(server: &mut ServerGuard, category: &str, expected_calls: usize) -> Mock {
    let body = serde_json::json!({
        "success": true,
        "data": {
            "risk_category": category,
            "risk_percentage": 7.5,
            "risk_description": "Risk description",
            "recommendations": {
                "general": "General advice",
                "actions": [
                    {"priority": 2, "title": "Second", "description": "d2", "frequency": "weekly"},
                    {"priority": 1, "title": "First", "description": "d1", "frequency": "daily"}
                ],
                "emergency_advice": "Call 103"
            },
            "calculation_id": "calc_cli",
            "timestamp": "2024-05-01T10:00:00"
        }
    });

    server
        .mock("POST", "/calculate-risk")
        .with_status(200)
        .with_body(body.to_string())
        .expect(expected_calls)
        .create_async()
        .await
}

fn output(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).unwrap()
}

#[tokio::test]
async fn test_assess_full_walkthrough() {
    let mut server = Server::new_async().await;
    let calc = server
        .mock("POST", "/calculate-risk")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "age": 45,
            "gender": "male",
            "lifestyle": "sedentary",
            "smoking": "never",
            "high_bp": true,
            "palpitations": "rarely"
        })))
        .with_status(200)
        .with_body(
            serde_json::json!({
                "success": true,
                "data": {
                    "risk_category": "high",
                    "risk_percentage": 31.0,
                    "risk_description": "High risk",
                    "recommendations": {"general": "", "actions": [], "emergency_advice": ""},
                    "calculation_id": "calc_hi",
                    "timestamp": "2024-05-01T10:00:00"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let ctx = context(&server.url(), OutputFormat::Text).await;
    let script = "yes\n\
                  45\nmale\n175\n75\n\
                  sedentary\nnever\n\n\
                  yes\n\n\n\n\
                  rarely\nnever\nrarely\n";
    let mut input = Cursor::new(script);
    let mut out = Vec::new();

    let result = commands::assess(&ctx, &mut input, &mut out).await.unwrap().unwrap();
    assert_eq!(result.risk_category, RiskCategory::High);

    let text = output(out);
    assert!(text.contains("Step 1/4"));
    assert!(text.contains("Step 4/4"));
    assert!(text.contains("Please see a doctor soon"));
    assert!(ctx.client.get_last_result().await.is_some());

    calc.assert_async().await;
}

#[tokio::test]
async fn test_assess_declined_disclaimer() {
    let ctx = context("http://127.0.0.1:1", OutputFormat::Text).await;
    let mut input = Cursor::new("no\n");
    let mut out = Vec::new();

    let result = commands::assess(&ctx, &mut input, &mut out).await.unwrap();
    assert!(result.is_none());
    assert!(output(out).contains("Assessment cancelled."));
}

#[tokio::test]
async fn test_assess_back_from_first_step_exits() {
    let ctx = context("http://127.0.0.1:1", OutputFormat::Text).await;
    let mut input = Cursor::new("yes\nback\n");
    let mut out = Vec::new();

    assert!(commands::assess(&ctx, &mut input, &mut out).await.unwrap().is_none());
}

#[tokio::test]
async fn test_assess_invalid_age_returns_to_first_step() {
    let mut server = Server::new_async().await;
    let calc = server
        .mock("POST", "/calculate-risk")
        .match_body(Matcher::PartialJson(serde_json::json!({"age": 50, "height_cm": 175.0})))
        .with_status(200)
        .with_body(
            serde_json::json!({
                "success": true,
                "data": {
                    "risk_category": "low",
                    "risk_percentage": 2.0,
                    "risk_description": "Low risk",
                    "recommendations": {"general": "", "actions": [], "emergency_advice": ""},
                    "calculation_id": "calc_lo",
                    "timestamp": "2024-05-01T10:00:00"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let ctx = context(&server.url(), OutputFormat::Text).await;
    // First pass with age 30, then Enter keeps every other required answer
    let script = "y\n\
                  30\nmale\n175\n75\n\
                  active\nnever\n\n\
                  \n\n\n\n\
                  never\nnever\nnever\n\
                  50\n\n\n\n\
                  \n\n\n\
                  \n\n\n\n\
                  \n\n\n";
    let mut input = Cursor::new(script);
    let mut out = Vec::new();

    let result = commands::assess(&ctx, &mut input, &mut out).await.unwrap();
    assert!(result.is_some());

    let text = output(out);
    assert!(text.contains("Age must be between 35 and 65 years"));
    assert_eq!(text.matches("Step 1/4").count(), 2);

    calc.assert_async().await;
}

#[tokio::test]
async fn test_assess_retry_after_network_error_then_give_up() {
    let ctx = context("http://127.0.0.1:1", OutputFormat::Text).await;
    let script = "yes\n\
                  45\nfemale\n160\n55\n\
                  active\nnever\n\n\
                  \n\n\n\n\
                  never\nnever\nnever\n\
                  yes\nno\n";
    let mut input = Cursor::new(script);
    let mut out = Vec::new();

    let err = commands::assess(&ctx, &mut input, &mut out).await.unwrap_err();
    assert!(matches!(err, CommandError::Api(_)));
    assert_eq!(err.to_error_body().code, "NETWORK_ERROR");

    let text = output(out);
    assert_eq!(text.matches("Calculating...").count(), 2);
    assert!(ctx.client.get_last_result().await.is_none());
}

#[tokio::test]
async fn test_quick_check_json_output() {
    let mut server = Server::new_async().await;
    let calc = mock_calculation(&mut server, "moderate", 1).await;

    let ctx = context(&server.url(), OutputFormat::Json).await;
    let mut out = Vec::new();
    let result = commands::quick_check(&ctx, &mut out).await.unwrap();
    assert_eq!(result.risk_category, RiskCategory::Moderate);

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["risk_category"], "moderate");
    assert_eq!(json["data"]["calculation_id"], "calc_cli");

    calc.assert_async().await;
}

#[tokio::test]
async fn test_quick_check_text_sorts_actions() {
    let mut server = Server::new_async().await;
    let _calc = mock_calculation(&mut server, "low", 1).await;

    let ctx = context(&server.url(), OutputFormat::Text).await;
    let mut out = Vec::new();
    commands::quick_check(&ctx, &mut out).await.unwrap();

    let text = output(out);
    let first = text.find("1. First").unwrap();
    let second = text.find("2. Second").unwrap();
    assert!(first < second);
    assert!(text.contains("My stroke risk: 7.5%"));
}

#[tokio::test]
async fn test_last_result_and_clear() {
    let mut server = Server::new_async().await;
    let _calc = mock_calculation(&mut server, "low", 1).await;

    let ctx = context(&server.url(), OutputFormat::Text).await;
    let mut out = Vec::new();
    commands::last_result(&ctx, &mut out).await.unwrap();
    assert!(output(out).contains("No saved result yet"));

    commands::quick_check(&ctx, &mut Vec::new()).await.unwrap();

    let mut out = Vec::new();
    commands::last_result(&ctx, &mut out).await.unwrap();
    assert!(output(out).contains("Last result: Low risk 7.5%"));

    let mut out = Vec::new();
    commands::clear_history(&ctx, &mut out).await.unwrap();
    assert!(output(out).contains("History cleared."));
    assert!(ctx.client.get_last_result().await.is_none());
}

#[tokio::test]
async fn test_education_offline_marker() {
    let ctx = context("http://127.0.0.1:1", OutputFormat::Text).await;
    let mut out = Vec::new();
    commands::education(&ctx, None, &mut out).await.unwrap();

    let text = output(out);
    assert!(text.contains("Typical symptoms (FAST):"));
    assert!(text.contains("Atypical symptoms:"));
    assert!(text.contains("☎ 103"));
    assert!(text.contains("(offline: showing built-in information)"));
}

#[tokio::test]
async fn test_emergency_json_uses_builtin_contacts() {
    let ctx = context("http://127.0.0.1:1", OutputFormat::Json).await;
    let mut out = Vec::new();
    commands::emergency(&ctx, &mut out).await.unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let numbers: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["number"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(numbers, vec!["103", "112"]);
}

#[tokio::test]
async fn test_health_reports_availability() {
    let mut server = Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(200)
        .create_async()
        .await;

    let ctx = context(&server.url(), OutputFormat::Text).await;
    let mut out = Vec::new();
    assert!(commands::health(&ctx, &mut out).await.unwrap());
    assert!(output(out).contains("is available"));

    let offline = context("http://127.0.0.1:1", OutputFormat::Json).await;
    let mut out = Vec::new();
    assert!(!commands::health(&offline, &mut out).await.unwrap());
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["data"], false);
}
