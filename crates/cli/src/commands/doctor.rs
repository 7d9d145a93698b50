//! Doctor command - validate configuration and show status

use anyhow::Result;
use audience_tagger_adapters::library::JsonLibrary;
use audience_tagger_domain::{ItemKind, ProviderKind, policy};
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::{AppConfig, load_api_key};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    library: CheckResult,
    llm: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        library: CheckResult::error("Not checked"),
        llm: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = check_classification(&c);
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.library = check_library(&config.general.library_path).await;
        report.llm = check_llm(config);
    }

    let checks = [&report.config, &report.library, &report.llm];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_classification(config: &AppConfig) -> CheckResult {
    if config.classification.item_kind.parse::<ItemKind>().is_err() {
        return CheckResult::error(format!(
            "Unknown item kind: {}",
            config.classification.item_kind
        ));
    }

    if !config.classification.enabled {
        return CheckResult::warn("Configuration loaded, classification is disabled");
    }

    CheckResult::ok("Configuration loaded successfully")
}

async fn check_library(path: &Path) -> CheckResult {
    let library = match JsonLibrary::open(path) {
        Ok(l) => l,
        Err(e) => return CheckResult::error(format!("Failed to open library: {}", e)),
    };

    match library.load().await {
        Ok(items) => {
            let labelled = items
                .iter()
                .filter(|item| policy::has_audience_label(&item.tags))
                .count();
            CheckResult::ok(format!(
                "{} items, {} already labelled",
                items.len(),
                labelled
            ))
            .with_details(serde_json::json!({
                "path": path.display().to_string(),
                "items": items.len(),
                "labelled": labelled,
            }))
        }
        Err(e) => CheckResult::error(format!("Failed to read library: {}", e)),
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let provider = &config.llm.provider;
    let model = if config.llm.model.trim().is_empty() {
        "default"
    } else {
        config.llm.model.trim()
    };

    let kind: ProviderKind = match provider.parse() {
        Ok(kind) => kind,
        Err(e) => return CheckResult::error(e.to_string()),
    };

    if kind == ProviderKind::OpenAiCompat && config.llm.endpoint.trim().is_empty() {
        return CheckResult::error("Provider: openai_compat, endpoint is empty");
    }

    let api_key_env = &config.llm.api_key_env;
    if api_key_env.trim().is_empty() {
        return CheckResult::error(format!("No API key env var configured for {}", provider));
    }

    // The run refuses to start without a key, whatever the provider
    match load_api_key(api_key_env) {
        Some(_) => CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            kind, model, api_key_env
        )),
        None => CheckResult::warn(format!(
            "Provider: {}, Model: {}, API key: {} (not set)",
            kind, model, api_key_env
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("audience-tagger Doctor Report");
    println!("=============================");
    println!();

    print_check("Config", &report.config);
    print_check("Library", &report.library);
    print_check("LLM Provider", &report.llm);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: audience-tagger run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
