use olivia_agent::runtime::{AgentRuntime, Diagnostics};
use olivia_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{block_on, escape_json};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

const RUNTIME_CHECKS: [&str; 3] = ["completion_credentials", "policy_files", "access_map"];

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let runtime = AgentRuntime::from_config(&config);
            match block_on(runtime.diagnostics()) {
                Ok(diagnostics) => checks.extend(runtime_checks(&diagnostics)),
                Err(error) => checks.extend(RUNTIME_CHECKS.into_iter().map(|name| DoctorCheck {
                    name,
                    status: CheckStatus::Fail,
                    details: error.clone(),
                })),
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(RUNTIME_CHECKS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let overall_status = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    let summary = match overall_status {
        CheckStatus::Pass => "doctor: all readiness checks passed",
        CheckStatus::Warn => "doctor: assistant will run degraded",
        _ => "doctor: one or more readiness checks failed",
    }
    .to_string();

    DoctorReport { overall_status, summary, checks }
}

/// A missing key or policy only degrades answers, so those are warnings. An
/// empty access map leaves every link suggestion dead and fails the check.
fn runtime_checks(diagnostics: &Diagnostics) -> Vec<DoctorCheck> {
    let completion = DoctorCheck {
        name: "completion_credentials",
        status: if diagnostics.completion_ready { CheckStatus::Pass } else { CheckStatus::Warn },
        details: diagnostics.completion_detail.clone(),
    };

    let missing = diagnostics
        .policies
        .iter()
        .filter(|policy| !policy.present)
        .map(|policy| policy.name)
        .collect::<Vec<_>>();
    let policies = if missing.is_empty() {
        DoctorCheck {
            name: "policy_files",
            status: CheckStatus::Pass,
            details: format!("{} policy texts loaded", diagnostics.policies.len()),
        }
    } else {
        DoctorCheck {
            name: "policy_files",
            status: CheckStatus::Warn,
            details: format!("missing or empty: {}", missing.join(", ")),
        }
    };

    let access = &diagnostics.access_map;
    let access_map = if access.size == 0 {
        DoctorCheck {
            name: "access_map",
            status: CheckStatus::Fail,
            details: "access listing is missing or has no valid entries".to_string(),
        }
    } else {
        DoctorCheck {
            name: "access_map",
            status: CheckStatus::Pass,
            details: format!(
                "{} links, {} slug collisions, sample: {}",
                access.size,
                access.collisions,
                access.sample.join(", ")
            ),
        }
    };

    vec![completion, policies, access_map]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
