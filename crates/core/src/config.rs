use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub knowledge: KnowledgeConfig,
    pub assistant: AssistantConfig,
    pub links: LinksConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub session_purge_secs: u64,
}

#[derive(Clone, Debug)]
pub struct KnowledgeConfig {
    pub policy_dir: PathBuf,
    pub access_listing: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Maximum number of non-empty lines kept from a model answer.
    pub max_lines: usize,
    pub session_idle_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LinksConfig {
    pub redirect_prefix: String,
    pub default_redirect: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_provider: Option<LlmProvider>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub port: Option<u16>,
    pub policy_dir: Option<PathBuf>,
    pub access_listing: Option<PathBuf>,
    pub max_lines: Option<usize>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 20,
                temperature: 0.2,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 5000,
                session_purge_secs: 300,
            },
            knowledge: KnowledgeConfig {
                policy_dir: PathBuf::from("data/politicas"),
                access_listing: PathBuf::from("data/accesos.txt"),
            },
            assistant: AssistantConfig { max_lines: 4, session_idle_secs: 1800 },
            links: LinksConfig {
                redirect_prefix: "/go/".to_string(),
                default_redirect: "/".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl LlmConfig {
    /// Whether a completion call can be attempted at all. A missing key is
    /// not a configuration error; answers degrade to rules and fallback.
    pub fn has_credentials(&self) -> bool {
        match self.provider {
            LlmProvider::OpenAi => self
                .api_key
                .as_ref()
                .map(|value| !value.expose_secret().trim().is_empty())
                .unwrap_or(false),
            LlmProvider::Ollama => true,
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("olivia.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(session_purge_secs) = server.session_purge_secs {
                self.server.session_purge_secs = session_purge_secs;
            }
        }

        if let Some(knowledge) = patch.knowledge {
            if let Some(policy_dir) = knowledge.policy_dir {
                self.knowledge.policy_dir = policy_dir;
            }
            if let Some(access_listing) = knowledge.access_listing {
                self.knowledge.access_listing = access_listing;
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(max_lines) = assistant.max_lines {
                self.assistant.max_lines = max_lines;
            }
            if let Some(session_idle_secs) = assistant.session_idle_secs {
                self.assistant.session_idle_secs = session_idle_secs;
            }
        }

        if let Some(links) = patch.links {
            if let Some(redirect_prefix) = links.redirect_prefix {
                self.links.redirect_prefix = redirect_prefix;
            }
            if let Some(default_redirect) = links.default_redirect {
                self.links.default_redirect = default_redirect;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("OLIVIA_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let api_key = read_env("OLIVIA_LLM_API_KEY").or_else(|| read_env("OPENAI_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("OLIVIA_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        let model = read_env("OLIVIA_LLM_MODEL").or_else(|| read_env("OPENAI_MODEL"));
        if let Some(value) = model {
            self.llm.model = value;
        }
        if let Some(value) = read_env("OLIVIA_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("OLIVIA_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("OLIVIA_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("OLIVIA_LLM_TEMPERATURE", &value)?;
        }

        if let Some(value) = read_env("OLIVIA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("OLIVIA_SERVER_PORT") {
            self.server.port = parse_u16("OLIVIA_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("OLIVIA_SERVER_SESSION_PURGE_SECS") {
            self.server.session_purge_secs =
                parse_u64("OLIVIA_SERVER_SESSION_PURGE_SECS", &value)?;
        }

        if let Some(value) = read_env("OLIVIA_KNOWLEDGE_POLICY_DIR") {
            self.knowledge.policy_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("OLIVIA_KNOWLEDGE_ACCESS_LISTING") {
            self.knowledge.access_listing = PathBuf::from(value);
        }

        if let Some(value) = read_env("OLIVIA_ASSISTANT_MAX_LINES") {
            self.assistant.max_lines = parse_usize("OLIVIA_ASSISTANT_MAX_LINES", &value)?;
        }
        if let Some(value) = read_env("OLIVIA_ASSISTANT_SESSION_IDLE_SECS") {
            self.assistant.session_idle_secs =
                parse_u64("OLIVIA_ASSISTANT_SESSION_IDLE_SECS", &value)?;
        }

        if let Some(value) = read_env("OLIVIA_LINKS_REDIRECT_PREFIX") {
            self.links.redirect_prefix = value;
        }
        if let Some(value) = read_env("OLIVIA_LINKS_DEFAULT_REDIRECT") {
            self.links.default_redirect = value;
        }

        let log_level = read_env("OLIVIA_LOGGING_LEVEL").or_else(|| read_env("OLIVIA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("OLIVIA_LOGGING_FORMAT").or_else(|| read_env("OLIVIA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(provider) = overrides.llm_provider {
            self.llm.provider = provider;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(base_url);
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(policy_dir) = overrides.policy_dir {
            self.knowledge.policy_dir = policy_dir;
        }
        if let Some(access_listing) = overrides.access_listing {
            self.knowledge.access_listing = access_listing;
        }
        if let Some(max_lines) = overrides.max_lines {
            self.assistant.max_lines = max_lines;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_assistant(&self.assistant)?;
        validate_links(&self.links)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("olivia.toml"), PathBuf::from("config/olivia.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    // Unset means the provider's own endpoint.
    if let Some(base_url) = &llm.base_url {
        let base_url = base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "llm.base_url must be an http(s) URL (e.g. http://localhost:11434/v1)".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.session_purge_secs == 0 {
        return Err(ConfigError::Validation(
            "server.session_purge_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if assistant.max_lines == 0 || assistant.max_lines > 20 {
        return Err(ConfigError::Validation(
            "assistant.max_lines must be in range 1..=20".to_string(),
        ));
    }

    if assistant.session_idle_secs == 0 {
        return Err(ConfigError::Validation(
            "assistant.session_idle_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_links(links: &LinksConfig) -> Result<(), ConfigError> {
    let prefix = links.redirect_prefix.trim();
    let valid_prefix =
        prefix.starts_with('/') || prefix.starts_with("http://") || prefix.starts_with("https://");
    if !valid_prefix {
        return Err(ConfigError::Validation(
            "links.redirect_prefix must be an absolute path or an http(s) URL".to_string(),
        ));
    }

    if links.default_redirect.trim().is_empty() {
        return Err(ConfigError::Validation(
            "links.default_redirect must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    knowledge: Option<KnowledgePatch>,
    assistant: Option<AssistantPatch>,
    links: Option<LinksPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    session_purge_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgePatch {
    policy_dir: Option<PathBuf>,
    access_listing: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    max_lines: Option<usize>,
    session_idle_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksPatch {
    redirect_prefix: Option<String>,
    default_redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
