use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use olivia_agent::runtime::{AgentRuntime, Diagnostics};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub completion: HealthCheck,
    pub knowledge: HealthCheck,
    pub checked_at: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/diag", get(diag))
        .with_state(HealthState { runtime })
}

/// Always `200`: a missing key or missing knowledge files degrade answers but
/// the service keeps replying.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let diagnostics = state.runtime.diagnostics().await;
    let completion = completion_check(&diagnostics);
    let knowledge = knowledge_check(&diagnostics);
    let ready = completion.status == "ready" && knowledge.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck { status: "ready", detail: "olivia-server runtime initialized".to_string() },
        completion,
        knowledge,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

pub async fn diag(State(state): State<HealthState>) -> Json<Diagnostics> {
    Json(state.runtime.diagnostics().await)
}

fn completion_check(diagnostics: &Diagnostics) -> HealthCheck {
    HealthCheck {
        status: if diagnostics.completion_ready { "ready" } else { "degraded" },
        detail: diagnostics.completion_detail.clone(),
    }
}

fn knowledge_check(diagnostics: &Diagnostics) -> HealthCheck {
    let missing = diagnostics
        .policies
        .iter()
        .filter(|policy| !policy.present)
        .map(|policy| policy.name)
        .collect::<Vec<_>>();

    if diagnostics.access_map.size == 0 {
        return HealthCheck { status: "degraded", detail: "access map is empty".to_string() };
    }
    if !missing.is_empty() {
        return HealthCheck {
            status: "degraded",
            detail: format!("missing policy text: {}", missing.join(", ")),
        };
    }
    HealthCheck {
        status: "ready",
        detail: format!("{} access links, all policies loaded", diagnostics.access_map.size),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use olivia_agent::llm::{CompletionClient, CompletionError, UnavailableClient};
    use olivia_agent::runtime::{AgentRuntime, RuntimeDeps};
    use olivia_core::access::AccessMap;
    use olivia_core::flows::InMemorySessionStore;
    use olivia_core::policy::PolicyBundle;

    use crate::health::{diag, health, HealthState};

    struct ReadyClient;

    #[async_trait]
    impl CompletionClient for ReadyClient {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
            Ok("ok".to_string())
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn describe(&self) -> String {
            "stub model".to_string()
        }
    }

    fn full_policies() -> PolicyBundle {
        PolicyBundle {
            vacation: "v".to_string(),
            leave: "l".to_string(),
            purchases: "p".to_string(),
            commissions: "c".to_string(),
            faq: "f".to_string(),
        }
    }

    fn state(completion: Arc<dyn CompletionClient>, policies: PolicyBundle) -> HealthState {
        let runtime = AgentRuntime::new(RuntimeDeps {
            access: Arc::new(AccessMap::build([("Portal RRHH", "https://rrhh.example.com")])),
            policies,
            completion,
            sessions: Arc::new(InMemorySessionStore::default()),
            max_lines: 4,
        });
        HealthState { runtime: Arc::new(runtime) }
    }

    #[tokio::test]
    async fn health_is_ready_with_model_and_knowledge() {
        let (status, Json(payload)) = health(State(state(Arc::new(ReadyClient), full_policies()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.completion.status, "ready");
        assert_eq!(payload.knowledge.status, "ready");
    }

    #[tokio::test]
    async fn health_stays_200_but_degraded_without_key_or_policies() {
        let (status, Json(payload)) = health(State(state(
            Arc::new(UnavailableClient::new("missing api key")),
            PolicyBundle { faq: "f".to_string(), ..PolicyBundle::default() },
        )))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.completion.status, "degraded");
        assert!(payload.completion.detail.contains("missing api key"));
        assert!(payload.knowledge.detail.contains("vacation"));
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn diag_reports_access_map_and_sessions() {
        let Json(report) = diag(State(state(Arc::new(ReadyClient), full_policies()))).await;

        assert!(report.completion_ready);
        assert_eq!(report.access_map.size, 1);
        assert_eq!(report.access_map.sample, vec!["portal_rrhh".to_string()]);
        assert_eq!(report.active_sessions, 0);
    }
}
