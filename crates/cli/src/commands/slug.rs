use olivia_core::access::slug;

use crate::commands::CommandResult;

pub fn run(label: &str) -> CommandResult {
    let derived = slug(label);
    if derived.is_empty() {
        return CommandResult::failure(
            "slug",
            "invalid_input",
            format!("label `{label}` has no letters or digits to build a slug from"),
            2,
        );
    }
    CommandResult { exit_code: 0, output: derived }
}
