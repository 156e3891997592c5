use std::sync::Arc;
use std::time::Duration;

use olivia_agent::runtime::AgentRuntime;
use olivia_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds the runtime from an already loaded config. Knowledge files and the
/// completion key are optional; only an invalid config stops startup.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    config.validate()?;

    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        policy_dir = %config.knowledge.policy_dir.display(),
        access_listing = %config.knowledge.access_listing.display(),
        "starting application bootstrap"
    );

    let runtime = Arc::new(AgentRuntime::from_config(&config));

    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        max_lines = config.assistant.max_lines,
        "assistant runtime initialized"
    );

    Ok(Application { config, runtime })
}

/// Evicts idle menu sessions every `every`. The first tick fires after one
/// full period.
pub fn spawn_session_purge(runtime: Arc<AgentRuntime>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            ticker.tick().await;
            let purged = runtime.purge_sessions().await;
            if purged > 0 {
                info!(event_name = "system.sessions.purged", purged, "idle sessions evicted");
            } else {
                debug!(event_name = "system.sessions.purged", purged, "no idle sessions");
            }
        }
    })
}
