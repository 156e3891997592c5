use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use olivia_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    for (key, value, env_keys) in effective_values(&config) {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String, &'static [&'static str])> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        entry("llm.provider", format!("{:?}", config.llm.provider), &["OLIVIA_LLM_PROVIDER"]),
        entry("llm.api_key", api_key, &["OLIVIA_LLM_API_KEY", "OPENAI_API_KEY"]),
        entry(
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["OLIVIA_LLM_BASE_URL"],
        ),
        entry("llm.model", config.llm.model.clone(), &["OLIVIA_LLM_MODEL", "OPENAI_MODEL"]),
        entry("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["OLIVIA_LLM_TIMEOUT_SECS"]),
        entry("llm.temperature", config.llm.temperature.to_string(), &["OLIVIA_LLM_TEMPERATURE"]),
        entry("server.bind_address", config.server.bind_address.clone(), &["OLIVIA_SERVER_BIND_ADDRESS"]),
        entry("server.port", config.server.port.to_string(), &["OLIVIA_SERVER_PORT", "PORT"]),
        entry(
            "server.session_purge_secs",
            config.server.session_purge_secs.to_string(),
            &["OLIVIA_SERVER_SESSION_PURGE_SECS"],
        ),
        entry(
            "knowledge.policy_dir",
            config.knowledge.policy_dir.display().to_string(),
            &["OLIVIA_KNOWLEDGE_POLICY_DIR"],
        ),
        entry(
            "knowledge.access_listing",
            config.knowledge.access_listing.display().to_string(),
            &["OLIVIA_KNOWLEDGE_ACCESS_LISTING"],
        ),
        entry("assistant.max_lines", config.assistant.max_lines.to_string(), &["OLIVIA_ASSISTANT_MAX_LINES"]),
        entry(
            "assistant.session_idle_secs",
            config.assistant.session_idle_secs.to_string(),
            &["OLIVIA_ASSISTANT_SESSION_IDLE_SECS"],
        ),
        entry("links.redirect_prefix", config.links.redirect_prefix.clone(), &["OLIVIA_LINKS_REDIRECT_PREFIX"]),
        entry(
            "links.default_redirect",
            config.links.default_redirect.clone(),
            &["OLIVIA_LINKS_DEFAULT_REDIRECT"],
        ),
        entry("logging.level", config.logging.level.clone(), &["OLIVIA_LOGGING_LEVEL", "OLIVIA_LOG_LEVEL"]),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["OLIVIA_LOGGING_FORMAT", "OLIVIA_LOG_FORMAT"],
        ),
    ]
}

fn entry(
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    ["olivia.toml", "config/olivia.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the `sk-` style prefix so operators can tell key kinds apart.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_key};

    #[test]
    fn redaction_never_shows_key_material() {
        assert_eq!(redact_key("sk-proj-abc123"), "sk-***");
        assert_eq!(redact_key("abc123"), "<redacted>");
        assert_eq!(redact_key("  "), "<empty>");
    }

    #[test]
    fn dotted_paths_are_looked_up_in_the_file() {
        let doc = "[llm]\nmodel = \"gpt-4o-mini\"\n".parse::<toml::Value>().expect("toml");
        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.api_key"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
