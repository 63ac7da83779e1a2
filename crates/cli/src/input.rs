//! JSON input files and the replay collaborators built from them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use factorlens_compute::{AttributionProvider, GlobalAttributionProvider, PredictionService};
use factorlens_core::{
    AttributionMethod, CollaboratorError, Dataset, ExplanationKind, HistoricalRecord, Instance,
    Prediction, TemporalData,
};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// `factorlens explain` request file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainInput {
    pub instance: Instance,
    /// Defaults to the instance's keys, in order.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub prediction: Prediction,
    /// Method name → feature → contribution.
    #[serde(default)]
    pub attributions: IndexMap<String, IndexMap<String, f64>>,
    #[serde(default)]
    pub history: Vec<HistoricalRecord>,
    #[serde(default)]
    pub kind: ExplanationKind,
}

impl ExplainInput {
    pub fn feature_names(&self) -> Vec<String> {
        self.feature_names
            .clone()
            .unwrap_or_else(|| self.instance.keys().cloned().collect())
    }

    pub fn providers(&self) -> Result<Vec<RecordedAttribution>> {
        self.attributions
            .iter()
            .map(|(name, values)| {
                Ok(RecordedAttribution {
                    method: parse_method(name)?,
                    values: values.clone(),
                })
            })
            .collect()
    }
}

/// `factorlens importance` dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInput {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    /// Precomputed global importance per method.
    #[serde(default)]
    pub attributions: IndexMap<String, IndexMap<String, f64>>,
    /// Method name → one feature → contribution map per row, in row order.
    #[serde(default)]
    pub local_attributions: IndexMap<String, Vec<IndexMap<String, f64>>>,
}

impl DatasetInput {
    pub fn dataset(&self) -> Dataset {
        Dataset::new(self.feature_names.clone(), self.rows.clone(), self.targets.clone())
    }

    pub fn providers(&self) -> Result<Vec<RecordedAttribution>> {
        self.attributions
            .iter()
            .map(|(name, values)| {
                Ok(RecordedAttribution {
                    method: parse_method(name)?,
                    values: values.clone(),
                })
            })
            .collect()
    }

    /// Replay providers for per-row local attributions, keyed by the row's
    /// instance so they can answer for whichever row is asked about.
    pub fn local_providers(&self) -> Result<Vec<RecordedRowAttribution>> {
        let dataset = self.dataset();
        self.local_attributions
            .iter()
            .map(|(name, per_row)| {
                let method = parse_method(name)?;
                let rows = per_row
                    .iter()
                    .enumerate()
                    .filter_map(|(i, values)| dataset.instance(i).map(|inst| (inst, values.clone())))
                    .collect();
                Ok(RecordedRowAttribution { method, rows })
            })
            .collect()
    }
}

pub fn read_temporal(path: &Path) -> Result<TemporalData> {
    read_json(path)
}

fn parse_method(name: &str) -> Result<AttributionMethod> {
    name.parse::<AttributionMethod>()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("invalid attribution method key '{}'", name))
}

/// Replays a recorded prediction for every instance it is asked about.
#[derive(Debug, Clone, Copy)]
pub struct RecordedPrediction(pub Prediction);

impl PredictionService for RecordedPrediction {
    fn predict(&self, _instance: &Instance) -> std::result::Result<Prediction, CollaboratorError> {
        Ok(self.0)
    }
}

/// Replays one method's recorded contributions, locally or globally.
#[derive(Debug, Clone)]
pub struct RecordedAttribution {
    pub method: AttributionMethod,
    pub values: IndexMap<String, f64>,
}

impl AttributionProvider for RecordedAttribution {
    fn method(&self) -> AttributionMethod {
        self.method
    }

    fn attribute(
        &self,
        _instance: &Instance,
        feature_names: &[String],
    ) -> std::result::Result<IndexMap<String, f64>, CollaboratorError> {
        Ok(self
            .values
            .iter()
            .filter(|(name, _)| feature_names.contains(name))
            .map(|(name, value)| (name.clone(), *value))
            .collect())
    }
}

/// Replays per-row local contributions. A row without a recording
/// contributes nothing.
#[derive(Debug, Clone)]
pub struct RecordedRowAttribution {
    pub method: AttributionMethod,
    rows: Vec<(Instance, IndexMap<String, f64>)>,
}

impl AttributionProvider for RecordedRowAttribution {
    fn method(&self) -> AttributionMethod {
        self.method
    }

    fn attribute(
        &self,
        instance: &Instance,
        feature_names: &[String],
    ) -> std::result::Result<IndexMap<String, f64>, CollaboratorError> {
        let Some((_, values)) = self.rows.iter().find(|(row, _)| row == instance) else {
            return Ok(IndexMap::new());
        };
        Ok(values
            .iter()
            .filter(|(name, _)| feature_names.contains(name))
            .map(|(name, value)| (name.clone(), *value))
            .collect())
    }
}

impl GlobalAttributionProvider for RecordedAttribution {
    fn method(&self) -> AttributionMethod {
        self.method
    }

    fn global_importance(
        &self,
        _dataset: &Dataset,
    ) -> std::result::Result<IndexMap<String, f64>, CollaboratorError> {
        Ok(self.values.clone())
    }
}
