use crate::agent::{AgentRuntime, IncompleteRun, ResponseAggregator};
use crate::auth::{AuthError, Authenticator};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

const DEMO_SUBJECT: &str = "demo-user";

pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
    pub auth: Authenticator,
    pub require_auth: bool,
    allowed_origin: HeaderValue,
}

impl AppState {
    pub fn new(
        runtime: Arc<AgentRuntime>,
        auth: Authenticator,
        require_auth: bool,
        allowed_origin: &str,
    ) -> Result<Self> {
        let allowed_origin = HeaderValue::from_str(allowed_origin)
            .with_context(|| format!("invalid CORS origin {allowed_origin}"))?;
        Ok(Self {
            runtime,
            auth,
            require_auth,
            allowed_origin,
        })
    }
}

#[derive(Debug)]
pub enum GatewayError {
    NoMessage,
    InvalidBody,
    Unauthorized(AuthError),
    Internal(String),
    /// The run failed after producing some replies; they are returned with the error.
    Incomplete(IncompleteRun),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::NoMessage => (StatusCode::BAD_REQUEST, "No message provided".to_string()),
            GatewayError::InvalidBody => {
                (StatusCode::BAD_REQUEST, "Request body must be JSON".to_string())
            }
            GatewayError::Unauthorized(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            GatewayError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            GatewayError::Incomplete(run) => {
                let body = json!({ "error": run.error.to_string(), "responses": run.responses });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for GatewayError {
    fn from(e: AuthError) -> Self {
        GatewayError::Unauthorized(e)
    }
}

#[derive(Debug, PartialEq)]
struct ChatRequest {
    message: String,
    thread_id: Option<String>,
}

impl ChatRequest {
    fn parse(body: &[u8]) -> Result<Self, GatewayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(GatewayError::NoMessage);
        }
        let value: Value = serde_json::from_slice(body).map_err(|_| GatewayError::InvalidBody)?;

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .ok_or(GatewayError::NoMessage)?;
        let thread_id = value
            .get("thread_id")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            message: message.to_string(),
            thread_id,
        })
    }
}

#[derive(Serialize)]
struct ChatResponse {
    responses: Vec<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat).options(preflight))
        .route("/login", post(login))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .with_state(state)
}

pub async fn run(bind_addr: &str, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Chat gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down chat gateway");
        })
        .await?;
    Ok(())
}

async fn cors(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        state.allowed_origin.clone(),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatResponse>, GatewayError> {
    if state.require_auth {
        let header = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        state.auth.authorize(header)?;
    }

    let request = ChatRequest::parse(&body)?;
    let session = state.runtime.session(request.thread_id.as_deref());
    info!("chat request on thread {}", session.context().thread_id);

    let steps = session.run(&request.message).await;
    let responses = ResponseAggregator::collect(steps).await.map_err(|run| {
        error!(
            "chat request failed after {} replies: {}",
            run.responses.len(),
            run.error
        );
        GatewayError::Incomplete(run)
    })?;

    Ok(Json(ChatResponse { responses }))
}

async fn login(State(state): State<Arc<AppState>>) -> Result<Json<LoginResponse>, GatewayError> {
    let token = state
        .auth
        .issue(DEMO_SUBJECT)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(Json(LoginResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_and_optional_thread() {
        let request = ChatRequest::parse(br#"{"message": "hi", "thread_id": "t-1"}"#).unwrap();
        assert_eq!(
            request,
            ChatRequest {
                message: "hi".into(),
                thread_id: Some("t-1".into())
            }
        );
        assert_eq!(ChatRequest::parse(br#"{"message": "hi"}"#).unwrap().thread_id, None);
    }

    #[test]
    fn missing_or_blank_message_is_rejected() {
        let bodies: [&[u8]; 5] = [b"{}", br#"{"message": ""}"#, br#"{"message": 3}"#, b"", b"  "];
        for body in bodies {
            assert!(matches!(ChatRequest::parse(body), Err(GatewayError::NoMessage)));
        }
        assert!(matches!(
            ChatRequest::parse(b"message=hi"),
            Err(GatewayError::InvalidBody)
        ));
    }
}
