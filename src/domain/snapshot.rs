// Immutable snapshot entities
//
// Every type here implements the same read trait as its live counterpart,
// answering from frozen fields only.
use super::codec;
use super::error::{Axis, SnapshotError, SnapshotResult, check_range};
use super::image::Image;
use super::matrix::Matrix;
use super::resource::{
    Dashboard, Dashlet, Localization, Report, Resource, Table, TableContent, View, ViewContent,
    ViewType,
};
use super::table_markup::{render_data_cells, render_header_cells};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Frozen table regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    left_header: Matrix,
    top_header: Matrix,
    data: Matrix,
    locale: Option<String>,
}

impl TableSnapshot {
    pub fn new(left_header: Matrix, top_header: Matrix, data: Matrix, locale: Option<String>) -> Self {
        Self {
            left_header,
            top_header,
            data,
            locale,
        }
    }

    /// Copies caller-owned rows; later changes to them do not reach the snapshot.
    pub fn from_rows(
        left_header: &[Vec<String>],
        top_header: &[Vec<String>],
        data: &[Vec<String>],
        locale: Option<String>,
    ) -> SnapshotResult<Self> {
        Ok(Self::new(
            Matrix::from_rows(left_header)?,
            Matrix::from_rows(top_header)?,
            Matrix::from_rows(data)?,
            locale,
        ))
    }

    pub fn left_header(&self) -> &Matrix {
        &self.left_header
    }

    pub fn top_header(&self) -> &Matrix {
        &self.top_header
    }

    pub fn data(&self) -> &Matrix {
        &self.data
    }
}

#[async_trait]
impl Table for TableSnapshot {
    fn has_left_header(&self) -> bool {
        self.left_header.columns() > 0
    }

    fn has_top_header(&self) -> bool {
        self.top_header.rows() > 0
    }

    fn row_count(&self) -> usize {
        self.left_header.rows().min(self.data.rows())
    }

    fn column_count(&self) -> usize {
        match (self.top_header.columns(), self.data.columns()) {
            (0, data) => data,
            (top, 0) => top,
            (top, data) => top.min(data),
        }
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }

    async fn load_left_header(&self, row_start: i64, row_end: i64) -> SnapshotResult<TableContent> {
        check_range(Axis::Row, row_start, row_end, self.row_count())?;
        let region = self.left_header.slice(
            row_start as usize..row_end as usize,
            0..self.left_header.columns(),
        );
        Ok(TableContent::new(render_header_cells(&region)))
    }

    async fn load_top_header(
        &self,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent> {
        check_range(Axis::Column, column_start, column_end, self.column_count())?;
        let region = self.top_header.slice(
            0..self.top_header.rows(),
            column_start as usize..column_end as usize,
        );
        Ok(TableContent::new(render_header_cells(&region)))
    }

    async fn load_data(
        &self,
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent> {
        check_range(Axis::Row, row_start, row_end, self.row_count())?;
        check_range(Axis::Column, column_start, column_end, self.column_count())?;
        let region = self.data.slice(
            row_start as usize..row_end as usize,
            column_start as usize..column_end as usize,
        );
        Ok(TableContent::new(render_data_cells(&region)))
    }
}

/// Frozen view content, one variant per kind of live content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum FrozenContent {
    Json(#[serde(with = "codec::json")] serde_json::Value),
    Table(TableSnapshot),
    Image(Image),
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) view_type: ViewType,
    #[serde(default)]
    pub(crate) localization: Localization,
    pub(crate) content: FrozenContent,
}

impl ViewSnapshot {
    pub fn content(&self) -> &FrozenContent {
        &self.content
    }

    pub fn table(&self) -> Option<&TableSnapshot> {
        match &self.content {
            FrozenContent::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl Resource for ViewSnapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl View for ViewSnapshot {
    fn view_type(&self) -> ViewType {
        self.view_type.clone()
    }

    fn localization(&self) -> &Localization {
        &self.localization
    }

    async fn load_content(&self) -> SnapshotResult<ViewContent> {
        Ok(match &self.content {
            FrozenContent::Json(value) => ViewContent::Json(value.clone()),
            FrozenContent::Table(table) => ViewContent::Table(Arc::new(table.clone())),
            FrozenContent::Image(image) => ViewContent::Image(image.clone()),
            FrozenContent::None => ViewContent::None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) localization: Localization,
    pub(crate) description: String,
    pub(crate) owner_name: String,
    pub(crate) last_change: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) thumbnail: Option<Image>,
    pub(crate) views: Vec<ViewSnapshot>,
}

impl ReportSnapshot {
    pub fn thumbnail(&self) -> Option<&Image> {
        self.thumbnail.as_ref()
    }

    pub fn view_snapshots(&self) -> &[ViewSnapshot] {
        &self.views
    }

    pub fn find_view(&self, view_id: &str) -> Option<&ViewSnapshot> {
        self.views.iter().find(|v| v.id == view_id)
    }
}

impl Resource for ReportSnapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Report for ReportSnapshot {
    fn localization(&self) -> &Localization {
        &self.localization
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn owner_name(&self) -> &str {
        &self.owner_name
    }

    fn last_change(&self) -> Option<DateTime<Utc>> {
        self.last_change
    }

    async fn load_thumbnail(&self) -> SnapshotResult<Image> {
        self.thumbnail
            .clone()
            .ok_or_else(|| SnapshotError::NotAvailable(format!("thumbnail of report {}", self.id)))
    }

    fn views(&self) -> Vec<Arc<dyn View>> {
        self.views
            .iter()
            .map(|v| Arc::new(v.clone()) as Arc<dyn View>)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum DashletSnapshot {
    View(ViewSnapshot),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) last_change: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) thumbnail: Option<Image>,
    pub(crate) dashlets: Vec<DashletSnapshot>,
}

impl DashboardSnapshot {
    pub fn thumbnail(&self) -> Option<&Image> {
        self.thumbnail.as_ref()
    }

    pub fn dashlet_snapshots(&self) -> &[DashletSnapshot] {
        &self.dashlets
    }
}

impl Resource for DashboardSnapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Dashboard for DashboardSnapshot {
    fn last_change(&self) -> Option<DateTime<Utc>> {
        self.last_change
    }

    async fn load_thumbnail(&self) -> SnapshotResult<Image> {
        self.thumbnail.clone().ok_or_else(|| {
            SnapshotError::NotAvailable(format!("thumbnail of dashboard {}", self.id))
        })
    }

    fn dashlets(&self) -> Vec<Dashlet> {
        self.dashlets
            .iter()
            .map(|d| match d {
                DashletSnapshot::View(view) => Dashlet::View(Arc::new(view.clone())),
                DashletSnapshot::Text(text) => Dashlet::Text(text.clone()),
            })
            .collect()
    }
}
