//! Models command - list the models a provider offers

use anyhow::Result;
use audience_tagger_adapters::llm::{ProviderFactory, lookup_models};
use secrecy::ExposeSecret;
use std::path::PathBuf;

use crate::args::ModelsArgs;
use crate::config::{AppConfig, load_api_key, non_empty};

pub async fn execute(args: ModelsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();

    let provider = args
        .provider
        .as_deref()
        .and_then(non_empty)
        .unwrap_or_else(|| config.llm.provider.clone());

    let credential = match args.api_key.as_deref().and_then(non_empty) {
        Some(key) => Some(key),
        None => load_api_key(&config.llm.api_key_env).map(|k| k.expose_secret().to_string()),
    };

    let endpoint = args
        .endpoint
        .as_deref()
        .and_then(non_empty)
        .or_else(|| non_empty(&config.llm.endpoint));

    let factory = ProviderFactory::new(config.adapter_llm_config());

    match lookup_models(
        &factory,
        &provider,
        credential.as_deref(),
        endpoint.as_deref(),
    )
    .await
    {
        Ok(models) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else if models.is_empty() {
                println!("No models reported by {}", provider);
            } else {
                for model in &models {
                    println!("{}", model);
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            // 2 when the caller named a bad provider, 1 when the backend failed
            std::process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    }
}
