use olivia_agent::runtime::AgentRuntime;
use olivia_core::config::{AppConfig, LoadOptions};

use crate::commands::{block_on, CommandResult};

/// Runs one message through a freshly built runtime. Menu sessions live in
/// memory, so `--session` only matters within this invocation.
pub fn run(text: &str, session_id: Option<&str>, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("ask", "config_validation", error.to_string(), 2);
        }
    };

    let runtime = AgentRuntime::from_config(&config);
    let reply = match block_on(runtime.handle_message(text, session_id)) {
        Ok(reply) => reply,
        Err(error) => return CommandResult::failure("ask", "runtime", error, 3),
    };

    if json_output {
        return match serde_json::to_string_pretty(&reply) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("ask", "serialization", error.to_string(), 3),
        };
    }

    CommandResult { exit_code: 0, output: reply.plain_text() }
}
