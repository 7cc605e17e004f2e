use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ui::utils::capitalize;

/// Summary counters reported by the pipeline API.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_runs: u64,
    pub total_messages: u64,
    pub total_images: u64,
    /// Percentage in `[0, 100]`.
    pub data_quality: f64,
}

/// Coarse UI category a status is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Status of the whole pipeline or of one step.
///
/// Values outside the known set are kept verbatim in `Other` so they can
/// still be labelled; they are never a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusValue {
    Pending,
    Running,
    Success,
    Completed,
    Failed,
    Other(String),
}

impl StatusValue {
    pub fn as_str(&self) -> &str {
        match self {
            StatusValue::Pending => "pending",
            StatusValue::Running => "running",
            StatusValue::Success => "success",
            StatusValue::Completed => "completed",
            StatusValue::Failed => "failed",
            StatusValue::Other(raw) => raw,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StatusValue::Running => Severity::Info,
            StatusValue::Success | StatusValue::Completed => Severity::Success,
            StatusValue::Failed => Severity::Error,
            StatusValue::Pending => Severity::Warning,
            StatusValue::Other(_) => Severity::Info,
        }
    }

    /// Capitalized display label, e.g. `running` -> `Running`.
    pub fn label(&self) -> String {
        capitalize(self.as_str())
    }
}

impl From<String> for StatusValue {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => StatusValue::Pending,
            "running" => StatusValue::Running,
            "success" => StatusValue::Success,
            "completed" => StatusValue::Completed,
            "failed" => StatusValue::Failed,
            _ => StatusValue::Other(raw),
        }
    }
}

impl From<&str> for StatusValue {
    fn from(raw: &str) -> Self {
        StatusValue::from(raw.to_string())
    }
}

impl From<StatusValue> for String {
    fn from(value: StatusValue) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall pipeline status plus one entry per step key.
///
/// Step keys stay as raw strings: the API may report steps this build does
/// not draw, and those are skipped at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub overall: StatusValue,
    #[serde(default)]
    pub steps: BTreeMap<String, StatusValue>,
}

impl Default for PipelineStatus {
    fn default() -> Self {
        PipelineStatus {
            overall: StatusValue::Pending,
            steps: StepName::ALL
                .iter()
                .map(|step| (step.key().to_string(), StatusValue::Pending))
                .collect(),
        }
    }
}

/// Pipeline stages drawn on the dashboard, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepName {
    Scraper,
    Loader,
    Transform,
    Enrich,
}

impl StepName {
    pub const ALL: [StepName; 4] = [
        StepName::Scraper,
        StepName::Loader,
        StepName::Transform,
        StepName::Enrich,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StepName::Scraper => "scraper",
            StepName::Loader => "loader",
            StepName::Transform => "transform",
            StepName::Enrich => "enrich",
        }
    }

    pub fn from_key(key: &str) -> Option<StepName> {
        StepName::ALL.into_iter().find(|step| step.key() == key)
    }

    pub fn info(self) -> &'static StepInfo {
        match self {
            StepName::Scraper => &SCRAPER_INFO,
            StepName::Loader => &LOADER_INFO,
            StepName::Transform => &TRANSFORM_INFO,
            StepName::Enrich => &ENRICH_INFO,
        }
    }
}

/// Static reference data shown when a step is opened.
#[derive(Debug, PartialEq, Eq)]
pub struct StepInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub last_run: &'static str,
    pub duration: &'static str,
}

impl StepInfo {
    pub fn summary(&self) -> String {
        format!("{}: {}", self.title, self.description)
    }
}

const SCRAPER_INFO: StepInfo = StepInfo {
    title: "Telegram Scraper",
    description: "Extracts messages and images from Telegram channels",
    last_run: "2 hours ago",
    duration: "3m 45s",
};

const LOADER_INFO: StepInfo = StepInfo {
    title: "Data Loader",
    description: "Loads raw JSON data into PostgreSQL",
    last_run: "2 hours ago",
    duration: "1m 12s",
};

const TRANSFORM_INFO: StepInfo = StepInfo {
    title: "dbt Transform",
    description: "Transforms data using dbt models",
    last_run: "Running",
    duration: "In progress",
};

const ENRICH_INFO: StepInfo = StepInfo {
    title: "YOLO Enrichment",
    description: "Detects objects in images using YOLOv8",
    last_run: "Pending",
    duration: "Not started",
};

/// Quick actions bound to the four action cards, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ExtractAndLoad,
    TransformOnly,
    EnrichOnly,
    ViewSchedules,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::ExtractAndLoad,
        ActionKind::TransformOnly,
        ActionKind::EnrichOnly,
        ActionKind::ViewSchedules,
    ];

    pub fn from_index(index: usize) -> Option<ActionKind> {
        ActionKind::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::ExtractAndLoad => "extract_and_load",
            ActionKind::TransformOnly => "transform_only",
            ActionKind::EnrichOnly => "enrich_only",
            ActionKind::ViewSchedules => "view_schedules",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ActionKind::ExtractAndLoad => "Extract & Load",
            ActionKind::TransformOnly => "Transform Only",
            ActionKind::EnrichOnly => "Enrich Only",
            ActionKind::ViewSchedules => "View Schedules",
        }
    }

    /// Informational message raised when the card is activated.
    pub fn notice(self) -> &'static str {
        match self {
            ActionKind::ExtractAndLoad => "Starting Extract & Load job...",
            ActionKind::TransformOnly => "Starting Transformations job...",
            ActionKind::EnrichOnly => "Starting YOLO Detection job...",
            ActionKind::ViewSchedules => "Opening Dagster UI...",
        }
    }
}
