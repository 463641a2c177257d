use std::sync::Mutex;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use canvas::block::{BlockKind, Position, create_block};
use serde_json::json;

use super::*;
use crate::config::Timeouts;

// =============================================================================
// Mock backend
// =============================================================================

type Seen = Arc<Mutex<Vec<Value>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

fn client(base_url: String, session: &Session) -> ApiClient {
    let config = FolioConfig { base_url, session_token: None, timeouts: Timeouts::default() };
    ApiClient::new(&config, session).unwrap()
}

fn authed(headers: &HeaderMap) -> bool {
    headers.get("cookie").and_then(|v| v.to_str().ok()) == Some("token=secret")
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}

fn text_block(id: &str) -> Block {
    let mut b = create_block(BlockKind::Text, Position::new(10.0, 20.0));
    b.id = id.into();
    b
}

fn recording(path: &'static str, reply: Value) -> (Router, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            path,
            post(move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| {
                let reply = reply.clone();
                async move {
                    if !authed(&headers) {
                        return unauthorized();
                    }
                    seen.lock().unwrap().push(body);
                    Json(reply).into_response()
                }
            }),
        )
        .with_state(Arc::clone(&seen));
    (app, seen)
}

// =============================================================================
// Layout
// =============================================================================

#[tokio::test]
async fn load_layout_sends_cookie_and_parses_wrapped_body() {
    let app = Router::new().route(
        "/api/layout",
        get(|headers: HeaderMap| async move {
            if !authed(&headers) {
                return unauthorized();
            }
            Json(json!({
                "layout": {
                    "_id": "mongo-id",
                    "name": "Mine",
                    "blocks": [{
                        "id": "a", "type": "rectangle",
                        "position": {"x": 1, "y": 2}, "size": {"width": 30, "height": 40},
                        "styles": {"backgroundColor": "#fff"}, "content": {}
                    }]
                }
            }))
            .into_response()
        }),
    );
    let base = serve(app).await;

    let layout = client(base.clone(), &Session::with_token("secret")).load_layout().await.unwrap().unwrap();
    assert_eq!(layout.name.as_deref(), Some("Mine"));
    assert_eq!(layout.blocks.len(), 1);
    assert_eq!(layout.blocks[0].kind(), BlockKind::Rectangle);

    let err = client(base, &Session::anonymous()).load_layout().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 401, ref message } if message == "Unauthorized"));
}

#[tokio::test]
async fn load_layout_handles_null_and_bare_bodies() {
    let app = Router::new()
        .route("/none/api/layout", get(|| async { Json(json!({ "layout": null })) }))
        .route("/bare/api/layout", get(|| async { Json(json!({ "blocks": [] })) }));
    let base = serve(app).await;
    let session = Session::with_token("secret");

    assert_eq!(client(format!("{base}/none"), &session).load_layout().await.unwrap(), None);
    assert_eq!(client(format!("{base}/bare"), &session).load_layout().await.unwrap(), Some(Layout::default()));
}

#[tokio::test]
async fn save_layout_posts_blocks_and_name() {
    let (app, seen) = recording("/api/layout", json!({ "layout": {} }));
    let base = serve(app).await;
    let blocks = vec![Arc::new(text_block("t1"))];

    client(base, &Session::with_token("secret")).save_layout(&blocks, Some("Portfolio")).await.unwrap();

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["name"], "Portfolio");
    assert_eq!(bodies[0]["blocks"][0]["id"], "t1");
    assert_eq!(bodies[0]["blocks"][0]["type"], "text");
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let app = Router::new().route(
        "/api/layout",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "db down" }))) }),
    );
    let base = serve(app).await;
    let err = client(base, &Session::with_token("secret")).save_layout(&[], None).await.unwrap_err();
    assert_eq!(err.to_string(), "server returned 500: db down");
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(format!("http://{addr}"), &Session::anonymous()).load_layout().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
}

// =============================================================================
// AI
// =============================================================================

#[tokio::test]
async fn rewrite_text_round() {
    let (app, seen) = recording("/api/ai/rewrite-text", json!({ "rewrittenText": "Sharper words." }));
    let base = serve(app).await;

    let out = client(base, &Session::with_token("secret")).rewrite_text("old words", "make it punchy").await.unwrap();
    assert_eq!(out, "Sharper words.");
    let bodies = seen.lock().unwrap();
    assert_eq!(bodies[0], json!({ "text": "old words", "instruction": "make it punchy" }));
}

#[tokio::test]
async fn rewrite_text_validates_before_sending() {
    let (app, seen) = recording("/api/ai/rewrite-text", json!({ "rewrittenText": "x" }));
    let base = serve(app).await;
    let api = client(base, &Session::with_token("secret"));

    assert!(matches!(api.rewrite_text("  ", "go").await, Err(ApiError::EmptyInput("text"))));
    assert!(matches!(api.rewrite_text("words", "").await, Err(ApiError::EmptyInput("instruction"))));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rewrite_text_rejects_empty_reply() {
    let (app, _seen) = recording("/api/ai/rewrite-text", json!({ "rewrittenText": "" }));
    let base = serve(app).await;
    let err = client(base, &Session::with_token("secret")).rewrite_text("a", "b").await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyResponse(_)));
}

#[tokio::test]
async fn generate_parses_portfolios() {
    let (app, seen) = recording(
        "/api/ai/generate",
        json!({
            "count": 1,
            "portfolios": [{
                "id": "minimal-dark-1",
                "name": "Minimal Dark",
                "description": "Clean",
                "blocks": [{
                    "id": "h", "type": "text",
                    "position": {"x": 0, "y": 0}, "size": {"width": 300, "height": 60},
                    "styles": {"fontSize": 48, "fontWeight": "bold"}, "content": {"text": "Hi"}
                }],
                "metadata": {"theme": "dark", "backgroundColor": "#000"}
            }]
        }),
    );
    let base = serve(app).await;

    let portfolios = client(base, &Session::with_token("secret")).generate("minimal").await.unwrap();
    assert_eq!(portfolios.len(), 1);
    assert_eq!(portfolios[0].metadata.background_color, "#000");
    assert_eq!(portfolios[0].blocks[0].text(), Some("Hi"));
    assert_eq!(seen.lock().unwrap()[0], json!({ "prompt": "minimal" }));
}

#[tokio::test]
async fn edit_sends_current_blocks() {
    let (app, seen) = recording("/api/ai/edit", json!({ "blocks": [] }));
    let base = serve(app).await;
    let current = vec![Arc::new(text_block("t1"))];

    let blocks = client(base, &Session::with_token("secret")).edit("darker", &current).await.unwrap();
    assert!(blocks.is_empty());
    let bodies = seen.lock().unwrap();
    assert_eq!(bodies[0]["prompt"], "darker");
    assert_eq!(bodies[0]["currentBlocks"][0]["id"], "t1");
}

#[tokio::test]
async fn edit_without_blocks_is_error() {
    let (app, _seen) = recording("/api/ai/edit", json!({ "message": "nothing to do" }));
    let base = serve(app).await;
    let err = client(base, &Session::with_token("secret")).edit("x", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyResponse("blocks")));
}

#[tokio::test]
async fn me_returns_profile() {
    let app = Router::new().route(
        "/api/auth/me",
        get(|| async { Json(json!({ "user": { "id": "1", "email": "ada@example.com", "username": "ada" } })) }),
    );
    let base = serve(app).await;
    let me = client(base, &Session::with_token("secret")).me().await.unwrap();
    assert_eq!(me.username, "ada");
    assert_eq!(me.name(), "ada");
}

#[tokio::test]
async fn chat_sends_selection_and_recent_history() {
    let (app, seen) = recording("/api/ai/chat", json!({ "success": true, "message": "Try a shorter headline." }));
    let base = serve(app).await;
    let history: Vec<ChatMessage> = (0..7)
        .map(|i| if i % 2 == 0 { ChatMessage::user(format!("q{i}")) } else { ChatMessage::assistant(format!("a{i}")) })
        .collect();
    let block = text_block("t1");

    let reply = client(base, &Session::with_token("secret"))
        .chat("  improve this  ", ChatContext::for_block(&block), &history)
        .await
        .unwrap();
    assert_eq!(reply, "Try a shorter headline.");

    let bodies = seen.lock().unwrap();
    let body = &bodies[0];
    assert_eq!(body["message"], "improve this");
    assert_eq!(body["selectedBlockType"], "text");
    assert_eq!(body["selectedBlockContent"], block.text().unwrap());
    let sent = body["conversationHistory"].as_array().unwrap();
    assert_eq!(sent.len(), CHAT_HISTORY_LEN);
    assert_eq!(sent[0], json!({ "role": "user", "content": "q2" }));
    assert_eq!(sent[4], json!({ "role": "user", "content": "q6" }));
}

#[tokio::test]
async fn chat_without_selection_omits_block_fields() {
    let (app, seen) = recording("/api/ai/chat", json!({ "message": "Hello!" }));
    let base = serve(app).await;
    let api = client(base, &Session::with_token("secret"));

    let mut rect = create_block(BlockKind::Rectangle, Position::default());
    rect.id = "r".into();
    api.chat("hi", ChatContext::default(), &[]).await.unwrap();
    api.chat("and this?", ChatContext::for_block(&rect), &[]).await.unwrap();

    let bodies = seen.lock().unwrap();
    assert!(bodies[0].get("selectedBlockType").is_none());
    assert!(bodies[0].get("selectedBlockContent").is_none());
    assert_eq!(bodies[0]["conversationHistory"], json!([]));
    assert_eq!(bodies[1]["selectedBlockType"], "rectangle");
    assert!(bodies[1].get("selectedBlockContent").is_none());
}

#[tokio::test]
async fn chat_validates_and_surfaces_errors() {
    let app = Router::new().route(
        "/api/ai/chat",
        post(|| async {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "AI service not configured" }))).into_response()
        }),
    );
    let base = serve(app).await;
    let api = client(base, &Session::with_token("secret"));

    assert!(matches!(api.chat(" ", ChatContext::default(), &[]).await, Err(ApiError::EmptyInput("message"))));
    let err = api.chat("hello", ChatContext::default(), &[]).await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "AI service not configured");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn chat_rejects_empty_reply() {
    let (app, _seen) = recording("/api/ai/chat", json!({ "success": true, "message": "" }));
    let base = serve(app).await;
    let err = client(base, &Session::with_token("secret")).chat("hi", ChatContext::default(), &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyResponse(_)));
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn error_message_prefers_error_field() {
    assert_eq!(error_message(r#"{"error":"Prompt is required"}"#), "Prompt is required");
    assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    assert_eq!(error_message(""), "request failed");
}

#[test]
fn parse_layout_rejects_malformed_blocks() {
    let err = parse_layout(json!({ "layout": { "blocks": [{ "id": "x", "type": "video" }] } })).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}
