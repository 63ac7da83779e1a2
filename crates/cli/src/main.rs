mod cli;
mod input;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use factorlens_compute::{
    AttributionProvider, CorrelationImportance, DecisionExplainer, ExplainRequest,
    FeatureImportanceAnalyzer, GlobalAttributionProvider, MutualInfoImportance,
};
use factorlens_core::config::{load_dotenv, Config};
use factorlens_rules::ConfigSet;

use crate::cli::{CliArgs, Command};
use crate::input::{read_json, read_temporal, DatasetInput, ExplainInput, RecordedPrediction};

fn main() -> Result<()> {
    load_dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    config.log_summary();

    let rules_dir = args.rules_dir.clone().unwrap_or_else(|| config.rules_dir.clone());
    let rules = ConfigSet::load_dir(&rules_dir)
        .with_context(|| format!("failed to load configuration from {}", rules_dir.display()))?;

    let pretty = config.output_pretty && !args.compact;
    match args.command {
        Command::Explain { request } => {
            let input: ExplainInput = read_json(&request)?;
            let explanation = explain(&rules, &input)?;
            emit(&explanation, pretty)
        }
        Command::Importance { dataset, temporal } => {
            let input: DatasetInput = read_json(&dataset)?;
            let temporal = temporal.as_deref().map(read_temporal).transpose()?;
            let report = analyze(&rules, &input, temporal.as_ref())?;
            emit(&report, pretty)
        }
    }
}

fn explain(rules: &ConfigSet, input: &ExplainInput) -> Result<factorlens_core::Explanation> {
    let model = RecordedPrediction(input.prediction);
    let recorded = input.providers()?;
    let providers: Vec<&dyn AttributionProvider> =
        recorded.iter().map(|p| p as &dyn AttributionProvider).collect();
    let feature_names = input.feature_names();

    let request = ExplainRequest::new(&input.instance, &feature_names)
        .with_history(&input.history)
        .with_kind(input.kind);

    let explanation = DecisionExplainer::try_new(rules.explainer.clone())?
        .explain_decision(&model, &providers, &request)
        .context("explanation failed")?;
    info!(rationale = %explanation.rationale, "Explained decision");
    Ok(explanation)
}

fn analyze(
    rules: &ConfigSet,
    input: &DatasetInput,
    temporal: Option<&factorlens_core::TemporalData>,
) -> Result<factorlens_core::ImportanceReport> {
    let correlation = CorrelationImportance;
    let mutual_info = MutualInfoImportance {
        bins: rules.importance.mutual_info_bins,
    };
    let recorded = input.providers()?;
    let recorded_local = input.local_providers()?;
    let local: Vec<&dyn AttributionProvider> =
        recorded_local.iter().map(|p| p as &dyn AttributionProvider).collect();

    let mut providers: Vec<&dyn GlobalAttributionProvider> = vec![&correlation, &mutual_info];
    providers.extend(recorded.iter().map(|p| p as &dyn GlobalAttributionProvider));

    FeatureImportanceAnalyzer::try_new(rules.importance.clone())?
        .comprehensive_importance_analysis(&input.dataset(), &providers, &local, temporal)
        .context("importance analysis failed")
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
