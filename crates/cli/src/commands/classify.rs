//! Classify command - one-shot classification

use anyhow::{Context, Result};
use audience_tagger_adapters::llm::ProviderFactory;
use audience_tagger_domain::{ClassificationRequest, ClassifierFactory};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::ClassifyArgs;
use crate::config::{AppConfig, non_empty};

#[derive(Debug, Serialize)]
struct ClassifyOutput<'a> {
    title: &'a str,
    provider: &'a str,
    label: &'a str,
}

pub async fn execute(args: ClassifyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();

    if args.title.trim().is_empty() {
        anyhow::bail!("No title provided for classification");
    }

    let genres: Vec<String> = args
        .genres
        .iter()
        .filter_map(|g| non_empty(g))
        .collect();

    let request = ClassificationRequest {
        title: args.title.trim().to_string(),
        year: args.year,
        overview: args.overview.as_deref().and_then(non_empty),
        rating: args.rating.as_deref().and_then(non_empty),
        genres: if genres.is_empty() { None } else { Some(genres) },
    };

    let factory = ProviderFactory::new(config.adapter_llm_config());
    let provider_config = config.provider_config();
    let classifier = factory
        .create(&provider_config)
        .context("Failed to create classifier")?;

    tracing::info!(
        title = %request.title,
        provider = classifier.provider(),
        "Classifying title"
    );

    let label = classifier
        .classify(&request)
        .await
        .context("Classification failed")?;

    if args.json {
        let output = ClassifyOutput {
            title: &request.title,
            provider: classifier.provider(),
            label: label.as_str(),
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        println!("{}: {}", request.title, label);
    }

    Ok(())
}
