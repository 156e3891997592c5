use std::process::ExitCode;

fn main() -> ExitCode {
    olivia_cli::run()
}
