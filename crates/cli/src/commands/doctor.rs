use serde::Serialize;
use serde_json::Value;
use tiendanube_client::{StoreApi, StoreClient};
use tiendanube_core::{AppConfig, ConfigError, LoadOptions};

use super::{escape_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub overall_status: CheckStatus,
    pub summary: String,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

pub fn build_report(loaded: Result<AppConfig, ConfigError>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match config.validate_credentials() {
                Ok(()) => {
                    checks.push(DoctorCheck {
                        name: "store_credentials",
                        status: CheckStatus::Pass,
                        details: format!(
                            "store id `{}` and access token present",
                            config.store.id.as_deref().unwrap_or_default().trim()
                        ),
                    });
                    checks.push(check_store_reachability(&config));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "store_credentials",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("store_reachability", "no store credentials configured"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("store_credentials", "configuration did not load"));
            checks.push(skipped("store_reachability", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
}

fn check_store_reachability(config: &AppConfig) -> DoctorCheck {
    let fail = |details: String| DoctorCheck {
        name: "store_reachability",
        status: CheckStatus::Fail,
        details,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return fail(format!("failed to initialize async runtime: {error}")),
    };
    let client = match StoreClient::from_config(config) {
        Ok(client) => client,
        Err(error) => return fail(format!("failed to build store client: {error}")),
    };

    match runtime.block_on(client.get("/store", Vec::new())) {
        Ok(store) => DoctorCheck {
            name: "store_reachability",
            status: CheckStatus::Pass,
            details: format!("reached store `{}` at {}", store_name(&store), config.api.base_url),
        },
        Err(error) => {
            fail(format!("GET /store failed: {error}. {}", error.kind().user_message()))
        }
    }
}

fn store_name(store: &Value) -> String {
    let localized = ["es", "pt", "en"]
        .iter()
        .filter_map(|lang| store.pointer(&format!("/name/{lang}")).and_then(Value::as_str))
        .find(|name| !name.is_empty());
    match (localized, store.get("id")) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => id.to_string(),
        (None, None) => "unknown".to_string(),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
