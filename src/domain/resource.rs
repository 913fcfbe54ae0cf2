// Read interfaces shared by live resources and their snapshots
use super::error::SnapshotResult;
use super::image::Image;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub trait Resource: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

/// Localized names keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localization(BTreeMap<String, String>);

impl Localization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: impl Into<String>, name: impl Into<String>) -> Self {
        self.0.insert(language.into(), name.into());
        self
    }

    pub fn has_localization(&self, language: &str) -> bool {
        self.0.contains_key(language)
    }

    /// Localized name for `language`, or `default` when none is defined.
    pub fn name_or<'a>(&'a self, language: &str, default: &'a str) -> &'a str {
        self.0.get(language).map(String::as_str).unwrap_or(default)
    }
}

impl FromIterator<(String, String)> for Localization {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Chart,
    Kpi,
    Text,
    Map,
    Table,
    Image,
    #[serde(untagged)]
    Other(String),
}

impl ViewType {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "chart" => ViewType::Chart,
            "kpi" => ViewType::Kpi,
            "text" => ViewType::Text,
            "map" | "geomap" => ViewType::Map,
            "table" => ViewType::Table,
            "image" => ViewType::Image,
            _ => ViewType::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ViewType::Chart => "chart",
            ViewType::Kpi => "kpi",
            ViewType::Text => "text",
            ViewType::Map => "map",
            ViewType::Table => "table",
            ViewType::Image => "image",
            ViewType::Other(raw) => raw,
        }
    }

    /// Views whose content arrives as a single JSON document.
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            ViewType::Chart | ViewType::Kpi | ViewType::Text | ViewType::Map
        )
    }
}

/// Markup returned for one table region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableContent {
    pub content: String,
}

impl TableContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Tabular view content. Region ranges are half-open and validated by the implementor.
#[async_trait]
pub trait Table: Send + Sync {
    fn has_left_header(&self) -> bool;
    fn has_top_header(&self) -> bool;
    fn row_count(&self) -> usize;
    fn column_count(&self) -> usize;
    fn locale(&self) -> Option<String>;

    async fn load_left_header(&self, row_start: i64, row_end: i64) -> SnapshotResult<TableContent>;

    async fn load_top_header(
        &self,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent>;

    async fn load_data(
        &self,
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent>;
}

pub enum ViewContent {
    Json(serde_json::Value),
    Table(Arc<dyn Table>),
    Image(Image),
    None,
}

#[async_trait]
pub trait View: Resource {
    fn view_type(&self) -> ViewType;
    fn localization(&self) -> &Localization;
    async fn load_content(&self) -> SnapshotResult<ViewContent>;
}

#[async_trait]
pub trait Report: Resource {
    fn localization(&self) -> &Localization;
    fn description(&self) -> &str;
    fn owner_name(&self) -> &str;
    fn last_change(&self) -> Option<DateTime<Utc>>;
    async fn load_thumbnail(&self) -> SnapshotResult<Image>;
    fn views(&self) -> Vec<Arc<dyn View>>;
}

/// Lightweight listing entry for a report.
#[async_trait]
pub trait ReportInfo: Resource {
    async fn load_details(&self) -> SnapshotResult<Arc<dyn Report>>;
}

#[derive(Clone)]
pub enum Dashlet {
    View(Arc<dyn View>),
    Text(String),
}

#[async_trait]
pub trait Dashboard: Resource {
    fn last_change(&self) -> Option<DateTime<Utc>>;
    async fn load_thumbnail(&self) -> SnapshotResult<Image>;
    fn dashlets(&self) -> Vec<Dashlet>;
}

#[async_trait]
pub trait DashboardInfo: Resource {
    async fn load_details(&self) -> SnapshotResult<Arc<dyn Dashboard>>;
}
