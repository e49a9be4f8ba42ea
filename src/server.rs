use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes;
use crate::routes::detect::check_input_size;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes: health check only
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check));

    // Protected routes: require CODELANG_AUTH_TOKEN when configured
    let protected_routes = Router::new()
        .route("/shutdown", post(routes::health::shutdown_handler))
        .route("/api/detect", post(routes::detect::detect))
        .route("/api/detect/batch", post(routes::detect::detect_batch))
        .route("/api/resolve", get(routes::detect::resolve))
        .route("/api/languages", get(routes::languages::list_languages))
        // WebSocket for per-keystroke detection
        .route("/ws", get(ws_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Validates `Authorization: Bearer <token>` against the configured token.
/// Without a configured token, auth is skipped (development mode).
async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, axum::Json<Value>)> {
    let expected_token = match state.config.auth_token.as_deref() {
        Some(t) => t,
        None => return Ok(next.run(req).await),
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header) if header.len() > 7 && header[..7].eq_ignore_ascii_case("bearer ") => {
            if &header[7..] == expected_token {
                Ok(next.run(req).await)
            } else {
                tracing::warn!("Auth token mismatch, rejecting request");
                Err(unauthorized())
            }
        }
        _ => {
            tracing::warn!("Missing or malformed Authorization header, rejecting request");
            Err(unauthorized())
        }
    }
}

fn unauthorized() -> (StatusCode, axum::Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(serde_json::json!({"error": "Unauthorized", "status": 401})),
    )
}

/// Replies sent to WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum WsReply {
    #[serde(rename = "detection")]
    Detection {
        request_id: Option<Value>,
        language: String,
        name: String,
    },
    #[serde(rename = "error")]
    Error {
        request_id: Option<Value>,
        error: String,
    },
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Request/response loop: every `detect` command gets exactly one reply.
async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket client connected");
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let text_str: &str = &text;
        let Some(reply) = handle_command(text_str, &state) else {
            continue;
        };
        match serde_json::to_string(&reply) {
            Ok(json) => {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!("Failed to encode WebSocket reply: {}", e),
        }
    }

    tracing::info!("WebSocket client disconnected");
}

/// Decode one client frame and produce the reply, if any.
pub fn handle_command(text: &str, state: &AppState) -> Option<WsReply> {
    let cmd = match serde_json::from_str::<Value>(text) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::debug!("Ignoring malformed WebSocket frame: {}", e);
            return None;
        }
    };
    let cmd_type = cmd.get("type").and_then(|v| v.as_str()).unwrap_or("");
    tracing::debug!(command = cmd_type, "WebSocket command received");

    match cmd_type {
        "detect" => {
            let request_id = cmd.get("request_id").cloned();
            let code = cmd.get("code").and_then(|v| v.as_str()).unwrap_or("");
            let file_name = cmd
                .get("file_name")
                .or_else(|| cmd.get("fileName"))
                .and_then(|v| v.as_str());

            if let Err(e) = check_input_size(code, state.config.max_input_bytes) {
                return Some(WsReply::Error {
                    request_id,
                    error: e.to_string(),
                });
            }

            let detection = state.detector.detect(code, file_name);
            Some(WsReply::Detection {
                request_id,
                language: detection.language,
                name: detection.name,
            })
        }
        _ => {
            tracing::debug!("Unknown WS command: {}", cmd_type);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::detector::Detector;
    use axum::body::Body;
    use axum::http::{header, Method};
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(config: AppConfig) -> AppState {
        AppState::with_detector(config, Detector::standard().unwrap())
    }

    async fn send(app: Router, req: axum::http::Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_app(test_state(AppConfig::default()));
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "codelang-detect");
        assert_eq!(body["signals"], 27);
    }

    #[tokio::test]
    async fn test_detect_by_content() {
        let app = create_app(test_state(AppConfig::default()));
        let code = "import React from 'react';\nfunction App() { return <Foo bar=\"1\" />; }";
        let (status, body) = send(app, post_json("/api/detect", json!({ "code": code }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"language": "jsx", "name": "JSX"}));
    }

    #[tokio::test]
    async fn test_detect_by_file_name() {
        let app = create_app(test_state(AppConfig::default()));
        let (status, body) = send(
            app,
            post_json("/api/detect", json!({"code": "print('hi')", "fileName": "script.py"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"language": "python", "name": "Python"}));
    }

    #[tokio::test]
    async fn test_detect_empty_code() {
        let app = create_app(test_state(AppConfig::default()));
        let (_, body) = send(app, post_json("/api/detect", json!({"code": ""}))).await;
        assert_eq!(body, json!({"language": "text", "name": "Plain Text"}));
    }

    #[tokio::test]
    async fn test_detect_rejects_oversized_code() {
        let config = AppConfig {
            max_input_bytes: 8,
            ..AppConfig::default()
        };
        let app = create_app(test_state(config));
        let (status, body) = send(
            app,
            post_json("/api/detect", json!({"code": "let mut too_long = 1;"})),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], 413);
    }

    #[tokio::test]
    async fn test_detect_rejects_malformed_body() {
        let app = create_app(test_state(AppConfig::default()));
        let (status, _) = send(app, post_json("/api/detect", json!({"source": "x"}))).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let app = create_app(test_state(AppConfig::default()));
        let (status, body) = send(
            app,
            post_json(
                "/api/detect/batch",
                json!({"items": [
                    {"code": "public static void main(String[] args) {}"},
                    {"code": "", "file_name": "x.go"},
                    {"code": "fn main() -> i32 { let mut x = 5; x }"},
                    {"code": "nothing here"},
                ]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let languages: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["language"].as_str().unwrap())
            .collect();
        assert_eq!(languages, vec!["java", "go", "rust", "text"]);
        assert_eq!(body["results"][3]["name"], "Text");
    }

    #[tokio::test]
    async fn test_batch_rejects_too_many_items() {
        let config = AppConfig {
            max_batch_items: 1,
            ..AppConfig::default()
        };
        let app = create_app(test_state(config));
        let (status, _) = send(
            app,
            post_json("/api/detect/batch", json!({"items": [{"code": "a"}, {"code": "b"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve() {
        let app = create_app(test_state(AppConfig::default()));
        let (status, body) = send(app.clone(), get("/api/resolve?file_name=Main.JAVA")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"file_name": "Main.JAVA", "language": "java", "name": "Java"})
        );

        let (_, body) = send(app, get("/api/resolve?file_name=Makefile")).await;
        assert_eq!(body["language"], Value::Null);
        assert_eq!(body["name"], Value::Null);
    }

    #[tokio::test]
    async fn test_list_languages() {
        let app = create_app(test_state(AppConfig::default()));
        let (status, body) = send(app, get("/api/languages")).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries[0]["id"], "javascript");
        assert!(entries
            .iter()
            .any(|e| e["id"] == "text" && e["name"] == "Plain Text"));
    }

    #[tokio::test]
    async fn test_auth_required_when_configured() {
        let config = AppConfig {
            auth_token: Some("secret".to_string()),
            ..AppConfig::default()
        };
        let app = create_app(test_state(config));

        let (status, _) = send(app.clone(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app.clone(), get("/api/languages")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let mut req = get("/api/languages");
        req.headers_mut()
            .insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut req = get("/api/languages");
        req.headers_mut()
            .insert(header::AUTHORIZATION, "bearer secret".parse().unwrap());
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_shutdown_endpoint_notifies() {
        let state = test_state(AppConfig::default());
        let app = create_app(state.clone());
        let (status, body) = send(app, post_json("/shutdown", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "shutting_down");

        tokio::time::timeout(Duration::from_secs(1), state.wait_for_shutdown())
            .await
            .expect("shutdown should have been requested");
    }

    #[test]
    fn test_ws_detect_command() {
        let state = test_state(AppConfig::default());
        let reply = handle_command(
            r#"{"type":"detect","request_id":7,"code":"let mut x = 1;"}"#,
            &state,
        );
        assert_eq!(
            reply,
            Some(WsReply::Detection {
                request_id: Some(json!(7)),
                language: "rust".to_string(),
                name: "Rust".to_string(),
            })
        );

        let encoded = serde_json::to_value(reply.unwrap()).unwrap();
        assert_eq!(encoded["type"], "detection");
        assert_eq!(encoded["request_id"], 7);
    }

    #[test]
    fn test_ws_detect_with_file_name() {
        let state = test_state(AppConfig::default());
        let reply = handle_command(
            r#"{"type":"detect","code":"def f():\n pass","file_name":"x.js"}"#,
            &state,
        );
        assert!(matches!(
            reply,
            Some(WsReply::Detection { ref language, request_id: None, .. }) if language == "javascript"
        ));
    }

    #[test]
    fn test_ws_oversized_code_replies_error() {
        let config = AppConfig {
            max_input_bytes: 4,
            ..AppConfig::default()
        };
        let state = test_state(config);
        let reply = handle_command(r#"{"type":"detect","request_id":"a","code":"0123456789"}"#, &state);
        assert!(matches!(reply, Some(WsReply::Error { .. })));
    }

    #[test]
    fn test_ws_ignores_unknown_and_malformed_frames() {
        let state = test_state(AppConfig::default());
        assert_eq!(handle_command(r#"{"type":"subscribe"}"#, &state), None);
        assert_eq!(handle_command("not json", &state), None);
    }
}
