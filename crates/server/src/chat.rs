//! Chat routes used by the web widget.
//!
//! - `GET  /`              liveness text
//! - `GET  /ping`          `pong`
//! - `POST /responder`     one chat turn, JSON in and out
//! - `GET  /go/{slug}`     redirect to an access-map link

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use olivia_agent::runtime::AgentRuntime;
use olivia_core::config::LinksConfig;
use olivia_core::domain::Domain;
use olivia_core::errors::{ApplicationError, InterfaceError};
use olivia_core::reply::{ReplyKind, ReplyLink};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const HOME_TEXT: &str = "OLIVIA está en línea ✅";

#[derive(Clone)]
pub struct ChatState {
    pub runtime: Arc<AgentRuntime>,
    pub links: LinksConfig,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub mensaje: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub ok: bool,
    /// HTML fragment ready for the widget.
    pub respuesta: String,
    pub texto: String,
    pub enlaces: Vec<ReplyLink>,
    pub tipo: ReplyKind,
    pub dominio: Option<Domain>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub msg: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            ok: false,
            msg: self.0.user_message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/ping", get(ping))
        .route("/responder", post(responder))
        .route("/go/{slug}", get(go))
        .with_state(state)
}

pub async fn home() -> &'static str {
    HOME_TEXT
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn responder(
    State(state): State<ChatState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let Json(request) = payload.map_err(|rejection| {
        warn!(
            event_name = "http.chat.rejected",
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "chat request body rejected"
        );
        ApiError(ApplicationError::InvalidInput(rejection.body_text()).into_interface(&correlation_id))
    })?;

    let Some(message) = request.mensaje else {
        warn!(event_name = "http.chat.rejected", correlation_id = %correlation_id, "missing mensaje");
        return Err(ApiError(
            ApplicationError::InvalidInput("missing `mensaje`".to_string()).into_interface(&correlation_id),
        ));
    };

    let session_id =
        request.session_id.map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

    let reply = state.runtime.handle_message(&message, session_id.as_deref()).await;
    info!(
        event_name = "http.chat.answered",
        correlation_id = %correlation_id,
        session_id = session_id.as_deref().unwrap_or("none"),
        kind = ?reply.kind,
        domain = reply.domain.map(|domain| domain.as_str()).unwrap_or("none"),
        "chat turn answered"
    );

    Ok(Json(ChatResponse {
        ok: true,
        respuesta: reply.to_html(&state.links.redirect_prefix),
        texto: reply.plain_text(),
        enlaces: reply.links.clone(),
        tipo: reply.kind,
        dominio: reply.domain,
    }))
}

pub async fn go(State(state): State<ChatState>, Path(slug): Path<String>) -> Redirect {
    match state.runtime.resolve_slug(&slug) {
        Some(url) => {
            info!(event_name = "http.redirect.resolved", slug = %slug, "access link resolved");
            Redirect::temporary(&url)
        }
        None => {
            warn!(event_name = "http.redirect.missed", slug = %slug, "unknown access slug");
            Redirect::temporary(&state.links.default_redirect)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use olivia_agent::llm::{CompletionClient, CompletionError};
    use olivia_agent::runtime::{AgentRuntime, RuntimeDeps};
    use olivia_core::access::AccessMap;
    use olivia_core::config::AppConfig;
    use olivia_core::flows::InMemorySessionStore;
    use olivia_core::policy::PolicyBundle;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::{router, ChatState, HOME_TEXT};

    struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(&self, _system: &str, user: &str) -> Result<String, CompletionError> {
            Ok(format!("Respuesta <b>modelo</b>\n{user}"))
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn describe(&self) -> String {
            "echo".to_string()
        }
    }

    fn state() -> ChatState {
        let runtime = AgentRuntime::new(RuntimeDeps {
            access: Arc::new(AccessMap::build([
                ("Portal RRHH", "https://rrhh.example.com"),
                ("Política de uniformes - Lumen", "https://docs.example.com/uni-lumen"),
            ])),
            policies: PolicyBundle::default(),
            completion: Arc::new(EchoClient),
            sessions: Arc::new(InMemorySessionStore::default()),
            max_lines: 4,
        });
        ChatState { runtime: Arc::new(runtime), links: AppConfig::default().links }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/responder")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn home_and_ping_answer_plain_text() {
        let app = router(state());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024).await.expect("body");
        assert_eq!(std::str::from_utf8(&bytes).expect("utf8"), HOME_TEXT);

        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let bytes = to_bytes(response.into_body(), 1024).await.expect("body");
        assert_eq!(&bytes[..], b"pong");
    }

    #[tokio::test]
    async fn responder_returns_escaped_html_and_structured_fields() {
        let response = router(state())
            .oneshot(post_json(r#"{"mensaje":"zzz qqq xyz"}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["tipo"], "model");
        let html = json["respuesta"].as_str().expect("html");
        assert!(html.contains("&lt;b&gt;modelo&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(json["texto"].as_str().expect("text").contains("¿Hay algo más en lo que te pueda ayudar?"));
    }

    #[tokio::test]
    async fn responder_with_empty_message_prompts_for_input() {
        let response =
            router(state()).oneshot(post_json(r#"{"mensaje":"   "}"#)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["tipo"], "prompt");
        assert_eq!(json["dominio"], Value::Null);
    }

    #[tokio::test]
    async fn responder_rejects_bad_bodies_with_user_safe_message() {
        for body in ["esto no es json", r#"{"session_id":"x"}"#] {
            let response = router(state()).oneshot(post_json(body)).await.expect("response");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let json = body_json(response).await;
            assert_eq!(json["ok"], false);
            assert!(json["msg"].as_str().expect("msg").starts_with("No pude procesar tu mensaje"));
            assert!(!json["correlation_id"].as_str().expect("correlation id").is_empty());
        }
    }

    #[tokio::test]
    async fn responder_keeps_menu_state_per_session() {
        let app = router(state());

        let first = app
            .clone()
            .oneshot(post_json(r#"{"mensaje":"uniforme","session_id":"widget-1"}"#))
            .await
            .expect("response");
        assert_eq!(body_json(first).await["tipo"], "menu");

        let second = app
            .oneshot(post_json(r#"{"mensaje":"Lumen","session_id":"widget-1"}"#))
            .await
            .expect("response");
        let json = body_json(second).await;
        assert_eq!(json["tipo"], "menu");
        assert_eq!(json["enlaces"][0]["url"], "https://docs.example.com/uni-lumen");
        assert!(json["respuesta"].as_str().expect("html").contains("politica_de_uniformes_lumen"));
    }

    #[tokio::test]
    async fn redirect_resolves_slug_or_falls_back_to_default() {
        let app = router(state());

        let hit = app
            .clone()
            .oneshot(Request::builder().uri("/go/portal_rrhh").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(hit.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(hit.headers()[header::LOCATION], "https://rrhh.example.com");

        let miss = app
            .oneshot(Request::builder().uri("/go/desconocido").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(miss.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(miss.headers()[header::LOCATION], "/");
    }
}
