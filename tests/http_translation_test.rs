// ==========================================
// HttpTranslationApi against a local fake translation server
// ==========================================

use std::time::Duration;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use sheet_translator::config_store::TranslationConfig;
use sheet_translator::translate::{HttpTranslationApi, TranslationApi, TranslationError};

const TEST_KEY: &str = "test-key";

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some("Bearer test-key")
}

/// Returns the received request body, serialized, as the translated text.
async fn echo_request(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({ "translated_text": body.to_string() })))
}

async fn models(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "object": "list",
        "data": [{ "id": "qwen-plus" }, { "id": "qwen-max" }]
    })))
}

async fn spawn_fake_api() -> String {
    let app = Router::new()
        .route("/translate", post(echo_request))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .route("/no-field", post(|| async { Json(json!({ "result": "x" })) }))
        .route(
            "/login-page",
            post(|| async { (StatusCode::OK, "<html>gateway login</html>") }),
        )
        .route("/v1/models", get(models));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn api() -> HttpTranslationApi {
    HttpTranslationApi::new("zh", Duration::from_secs(5)).unwrap()
}

fn config(url: String, model: Option<&str>) -> TranslationConfig {
    TranslationConfig {
        url,
        key: TEST_KEY.to_string(),
        prompt: "Translate to Chinese:".to_string(),
        model: model.map(|m| m.to_string()),
    }
}

#[tokio::test]
async fn test_request_carries_prompt_language_and_model() {
    let base = spawn_fake_api().await;

    let sent = api()
        .translate("hello", &config(format!("{}/translate", base), Some("qwen-plus")))
        .await
        .unwrap();
    let sent: Value = serde_json::from_str(&sent).unwrap();

    assert_eq!(sent["text"], "Translate to Chinese:\nhello");
    assert_eq!(sent["target_language"], "zh");
    assert_eq!(sent["model"], "qwen-plus");
}

#[tokio::test]
async fn test_model_omitted_when_not_configured() {
    let base = spawn_fake_api().await;

    for model in [None, Some("")] {
        let sent = api()
            .translate("hello", &config(format!("{}/translate", base), model))
            .await
            .unwrap();
        let sent: Value = serde_json::from_str(&sent).unwrap();
        assert!(sent.get("model").is_none());
    }
}

#[tokio::test]
async fn test_wrong_key_is_an_http_error() {
    let base = spawn_fake_api().await;
    let mut bad = config(format!("{}/translate", base), None);
    bad.key = "other".to_string();

    let err = api().translate("hello", &bad).await.unwrap_err();
    assert!(matches!(err, TranslationError::Http { status: 401, .. }));
}

#[tokio::test]
async fn test_server_error_keeps_body_in_message() {
    let base = spawn_fake_api().await;

    let err = api()
        .translate("hello", &config(format!("{}/broken", base), None))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: upstream exploded");
}

#[tokio::test]
async fn test_missing_translated_text_is_a_format_error() {
    let base = spawn_fake_api().await;

    let err = api()
        .translate("hello", &config(format!("{}/no-field", base), None))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::ResponseFormat("translated_text")));
}

#[tokio::test]
async fn test_non_json_success_body_is_a_format_error() {
    let base = spawn_fake_api().await;

    let err = api()
        .translate("hello", &config(format!("{}/login-page", base), None))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::ResponseFormat("translated_text")));
    assert_eq!(err.to_string(), "response body has no 'translated_text' field");
}

#[tokio::test]
async fn test_unreachable_host_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = api()
        .translate("hello", &config(format!("http://{}/translate", addr), None))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::Network(_)));
}

#[tokio::test]
async fn test_list_models_reads_ids() {
    let base = spawn_fake_api().await;

    let models = api().list_models(&config(format!("{}/", base), None)).await.unwrap();
    assert_eq!(models, vec!["qwen-plus", "qwen-max"]);
}
