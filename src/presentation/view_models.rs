// Mapper from snapshot entities to JSON view models
use crate::domain::resource::{Dashboard, Localization, Report, Resource, Table, View};
use crate::domain::snapshot::{
    DashboardSnapshot, DashletSnapshot, FrozenContent, ReportSnapshot, TableSnapshot, ViewSnapshot,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ResourceSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub name: String,
    pub localization: Localization,
    pub description: String,
    pub owner_name: String,
    pub last_change: Option<DateTime<Utc>>,
    pub has_thumbnail: bool,
    pub views: Vec<ViewSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub id: String,
    pub name: String,
    pub view_type: String,
    pub localization: Localization,
    pub content: ContentSummary,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentSummary {
    Json { value: serde_json::Value },
    #[serde(rename_all = "camelCase")]
    Table { row_count: usize, column_count: usize },
    #[serde(rename_all = "camelCase")]
    Image { mime_type: String },
    None,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub locale: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub left_header: Vec<Vec<String>>,
    pub top_header: Vec<Vec<String>>,
    pub data: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub id: String,
    pub name: String,
    pub last_change: Option<DateTime<Utc>>,
    pub has_thumbnail: bool,
    pub dashlets: Vec<DashletView>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DashletView {
    View(ViewSummary),
    Text { text: String },
}

pub fn report_to_view(report: &ReportSnapshot) -> ReportView {
    ReportView {
        id: report.id().to_string(),
        name: report.name().to_string(),
        localization: report.localization().clone(),
        description: report.description().to_string(),
        owner_name: report.owner_name().to_string(),
        last_change: report.last_change(),
        has_thumbnail: report.thumbnail().is_some(),
        views: report.view_snapshots().iter().map(view_to_summary).collect(),
    }
}

pub fn view_to_summary(view: &ViewSnapshot) -> ViewSummary {
    let content = match view.content() {
        FrozenContent::Json(value) => ContentSummary::Json {
            value: value.clone(),
        },
        FrozenContent::Table(table) => ContentSummary::Table {
            row_count: table.row_count(),
            column_count: table.column_count(),
        },
        FrozenContent::Image(image) => ContentSummary::Image {
            mime_type: image.format().mime_type().to_string(),
        },
        FrozenContent::None => ContentSummary::None,
    };

    ViewSummary {
        id: view.id().to_string(),
        name: view.name().to_string(),
        view_type: view.view_type().as_str().to_string(),
        localization: view.localization().clone(),
        content,
    }
}

pub fn table_to_view(table: &TableSnapshot) -> TableView {
    TableView {
        locale: table.locale(),
        row_count: table.row_count(),
        column_count: table.column_count(),
        left_header: table.left_header().to_rows(),
        top_header: table.top_header().to_rows(),
        data: table.data().to_rows(),
    }
}

pub fn dashboard_to_view(dashboard: &DashboardSnapshot) -> DashboardView {
    DashboardView {
        id: dashboard.id().to_string(),
        name: dashboard.name().to_string(),
        last_change: dashboard.last_change(),
        has_thumbnail: dashboard.thumbnail().is_some(),
        dashlets: dashboard
            .dashlet_snapshots()
            .iter()
            .map(|d| match d {
                DashletSnapshot::View(view) => DashletView::View(view_to_summary(view)),
                DashletSnapshot::Text(text) => DashletView::Text { text: text.clone() },
            })
            .collect(),
    }
}
