use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

const PARAMETERS_PROPERTY: &str = "hudson.model.ParametersDefinitionProperty";

/// Parameter name to allowed choices; `None` means free text.
pub type ParameterDefinitions = IndexMap<String, Option<Vec<String>>>;

/// Subset of `<job>/api/json`.
#[derive(Debug, Default, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub property: Vec<JobProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobProperty {
    #[serde(rename = "_class", default)]
    pub class: String,
    #[serde(rename = "parameterDefinitions", default)]
    pub parameter_definitions: Vec<ParameterDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
}

impl JobInfo {
    pub fn parameter_definitions(self) -> ParameterDefinitions {
        self.property
            .into_iter()
            .find(|property| property.class == PARAMETERS_PROPERTY)
            .map(|property| {
                property
                    .parameter_definitions
                    .into_iter()
                    .map(|definition| (definition.name, definition.choices))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Subset of `<queue item>/api/json`.
#[derive(Debug, Default, Deserialize)]
pub struct QueueItem {
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub executable: Option<Executable>,
}

#[derive(Debug, Deserialize)]
pub struct Executable {
    #[serde(default)]
    pub url: Option<String>,
}

impl QueueItem {
    pub fn build_url(&self) -> Option<&str> {
        self.executable.as_ref().and_then(|e| e.url.as_deref())
    }
}

/// Status tag reported by the pipeline stage view API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Success,
    Failed,
    InProgress,
    #[default]
    NotExecuted,
    Aborted,
    Unstable,
    PausedPendingInput,
    #[serde(other)]
    Unknown,
}

impl StageStatus {
    pub fn is_pending_or_running(self) -> bool {
        matches!(self, Self::InProgress | Self::NotExecuted)
    }

    pub fn is_success_or_skipped(self) -> bool {
        matches!(self, Self::Success | Self::NotExecuted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: StageStatus,
    #[serde(default)]
    pub duration_millis: Option<u64>,
}

impl Stage {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_millis.map(Duration::from_millis)
    }
}

/// Subset of `<build>/wfapi/describe`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    #[serde(default)]
    pub status: StageStatus,
    #[serde(default)]
    pub duration_millis: Option<u64>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}
