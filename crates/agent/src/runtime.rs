use std::sync::Arc;

use olivia_core::access::AccessMap;
use olivia_core::config::AppConfig;
use olivia_core::flows::{FlowEngine, FlowReply, InMemorySessionStore, SessionStore, UniformLookupFlow};
use olivia_core::policy::{PolicyBundle, PolicyPresence};
use olivia_core::reply::{ChatReply, LinkLayout, ReplyKind, ReplyLink};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compose::ResponseComposer;
use crate::llm::{ChatCompletionsClient, CompletionClient, UnavailableClient};
use crate::prompt::PromptBuilder;
use crate::router::DomainRouter;
use crate::rules::RuleBook;
use crate::suggest::AccessSuggester;

pub const EMPTY_INPUT_REPLY: &str = "Hola, soy OLIVIA. ¿En qué te ayudo?";

const DIAGNOSTIC_SAMPLE: usize = 5;

pub struct RuntimeDeps {
    pub access: Arc<AccessMap>,
    pub policies: PolicyBundle,
    pub completion: Arc<dyn CompletionClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub max_lines: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AccessDiagnostics {
    pub size: usize,
    pub collisions: usize,
    pub sample: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Diagnostics {
    pub completion_ready: bool,
    pub completion_detail: String,
    pub policies: Vec<PolicyPresence>,
    pub access_map: AccessDiagnostics,
    pub active_sessions: usize,
}

pub struct AgentRuntime {
    router: DomainRouter,
    rules: RuleBook,
    suggester: AccessSuggester,
    composer: ResponseComposer,
    prompts: PromptBuilder,
    flows: FlowEngine<UniformLookupFlow>,
    completion: Arc<dyn CompletionClient>,
    policies: PolicyBundle,
    access: Arc<AccessMap>,
}

impl AgentRuntime {
    pub fn new(deps: RuntimeDeps) -> Self {
        let RuntimeDeps { access, policies, completion, sessions, max_lines } = deps;
        let composer = ResponseComposer::new(max_lines);
        Self {
            router: DomainRouter::default(),
            rules: RuleBook::default(),
            suggester: AccessSuggester::new(access.clone()),
            prompts: PromptBuilder::new(composer.max_lines()),
            composer,
            flows: FlowEngine::new(UniformLookupFlow, sessions, access.clone()),
            completion,
            policies,
            access,
        }
    }

    /// Wires the runtime from configuration. Missing knowledge files and a
    /// missing API key degrade the assistant but never fail construction.
    pub fn from_config(config: &AppConfig) -> Self {
        let access = Arc::new(AccessMap::load(&config.knowledge.access_listing));
        let policies = PolicyBundle::load(&config.knowledge.policy_dir);

        let completion: Arc<dyn CompletionClient> =
            match ChatCompletionsClient::from_config(&config.llm) {
                Ok(client) => Arc::new(client),
                Err(error) => {
                    warn!(
                        event_name = "runtime.completion_unavailable",
                        error = %error,
                        "completion client could not be built, answering from rules only"
                    );
                    Arc::new(UnavailableClient::new(error.to_string()))
                }
            };

        let idle_secs = i64::try_from(config.assistant.session_idle_secs).unwrap_or(i64::MAX);
        let sessions = Arc::new(InMemorySessionStore::new(chrono::Duration::seconds(idle_secs)));

        Self::new(RuntimeDeps {
            access,
            policies,
            completion,
            sessions,
            max_lines: config.assistant.max_lines,
        })
    }

    /// Answers one message. Always produces a reply.
    pub async fn handle_message(&self, text: &str, session_id: Option<&str>) -> ChatReply {
        if text.trim().is_empty() {
            return ChatReply::text(ReplyKind::Prompt, EMPTY_INPUT_REPLY);
        }

        if self.flows.is_trigger(text) {
            let reply = self.flows.start(session_id).await;
            return menu_reply(reply);
        }

        if let Some(session_id) = session_id {
            if let Some(reply) = self.flows.step(session_id, text).await {
                return menu_reply(reply);
            }
        }

        let domain = self.router.route(text);
        let links = self.suggester.suggest(text, domain);

        if let Some(rule) = self.rules.detect(text) {
            info!(event_name = "runtime.rule_answer", rule_id = rule.id, domain = %domain, "answered from rule");
            return self.composer.compose_rule(rule.response, domain, &links);
        }

        let prompt = self.prompts.build(text, domain, &self.policies);
        match self.completion.complete(&prompt.system, &prompt.user).await {
            Ok(answer) => match self.composer.compose_model(&answer, domain, &links) {
                Some(reply) => {
                    debug!(event_name = "runtime.model_answer", domain = %domain, "answered from model");
                    reply
                }
                None => {
                    warn!(event_name = "runtime.model_answer_empty", domain = %domain, "model answer had no usable lines");
                    self.composer.compose_fallback(domain, &links)
                }
            },
            Err(error) => {
                warn!(
                    event_name = "runtime.completion_failed",
                    domain = %domain,
                    error = %error,
                    "completion failed, answering with fallback"
                );
                self.composer.compose_fallback(domain, &links)
            }
        }
    }

    pub fn resolve_slug(&self, slug: &str) -> Option<String> {
        self.access.resolve(slug).map(|entry| entry.url.clone())
    }

    pub async fn purge_sessions(&self) -> usize {
        self.flows.purge_expired().await
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            completion_ready: self.completion.is_ready(),
            completion_detail: self.completion.describe(),
            policies: self.policies.presence(),
            access_map: AccessDiagnostics {
                size: self.access.len(),
                collisions: self.access.collisions(),
                sample: self.access.sample(DIAGNOSTIC_SAMPLE),
            },
            active_sessions: self.flows.active_sessions().await,
        }
    }
}

fn menu_reply(reply: FlowReply) -> ChatReply {
    let links = reply.link.iter().map(ReplyLink::from).collect::<Vec<_>>();
    ChatReply::new(ReplyKind::Menu, reply.segments).with_links(links, LinkLayout::QuickAccess)
}
