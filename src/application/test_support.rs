// In-process collaborators for snapshot tests
use crate::domain::error::{Axis, SnapshotError, SnapshotResult, check_range};
use crate::domain::image::{Image, TINY_PNG};
use crate::domain::matrix::Matrix;
use crate::domain::resource::{
    Dashboard, DashboardInfo, Dashlet, Localization, Report, ReportInfo, Resource, Table,
    TableContent, View, ViewContent, ViewType,
};
use crate::domain::table_markup::{render_data_cells, render_header_cells};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Counts remote fetches and panics on any fetch once sealed.
#[derive(Clone, Default)]
pub struct FetchCounter {
    fetches: Arc<AtomicUsize>,
    sealed: Arc<AtomicBool>,
}

impl FetchCounter {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    fn record(&self, what: &str) {
        assert!(
            !self.sealed.load(Ordering::SeqCst),
            "remote fetch of {} after snapshot",
            what
        );
        self.fetches.fetch_add(1, Ordering::SeqCst);
    }
}

fn unreachable_service(endpoint: &str) -> SnapshotError {
    SnapshotError::Transport {
        endpoint: endpoint.to_string(),
        message: "connection refused".to_string(),
    }
}

fn rows(cells: &[&[&str]]) -> Matrix {
    let rows: Vec<Vec<String>> = cells
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    Matrix::from_rows(&rows).expect("rectangular fixture")
}

pub struct StubTable {
    counter: FetchCounter,
    left: Matrix,
    top: Matrix,
    data: Matrix,
    has_left: bool,
    has_top: bool,
    reported_rows: Option<usize>,
    locale: Option<String>,
    fail_data: bool,
}

impl StubTable {
    pub fn new(counter: &FetchCounter, left: &[&[&str]], top: &[&[&str]], data: &[&[&str]]) -> Self {
        Self {
            counter: counter.clone(),
            left: rows(left),
            top: rows(top),
            data: rows(data),
            has_left: true,
            has_top: true,
            reported_rows: None,
            locale: None,
            fail_data: false,
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn without_left_header(mut self) -> Self {
        self.has_left = false;
        self
    }

    pub fn without_top_header(mut self) -> Self {
        self.has_top = false;
        self
    }

    /// Advertise more rows than the table holds.
    pub fn overstating_rows(mut self, rows: usize) -> Self {
        self.reported_rows = Some(rows);
        self
    }

    pub fn failing_data(mut self) -> Self {
        self.fail_data = true;
        self
    }
}

#[async_trait]
impl Table for StubTable {
    fn has_left_header(&self) -> bool {
        self.has_left
    }

    fn has_top_header(&self) -> bool {
        self.has_top
    }

    fn row_count(&self) -> usize {
        self.reported_rows.unwrap_or(self.data.rows())
    }

    fn column_count(&self) -> usize {
        self.data.columns()
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }

    async fn load_left_header(&self, row_start: i64, row_end: i64) -> SnapshotResult<TableContent> {
        self.counter.record("left header");
        check_range(Axis::Row, row_start, row_end, self.data.rows())?;
        let region = self.left.slice(row_start as usize..row_end as usize, 0..self.left.columns());
        Ok(TableContent::new(render_header_cells(&region)))
    }

    async fn load_top_header(
        &self,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent> {
        self.counter.record("top header");
        check_range(Axis::Column, column_start, column_end, self.data.columns())?;
        let region = self.top.slice(0..self.top.rows(), column_start as usize..column_end as usize);
        Ok(TableContent::new(render_header_cells(&region)))
    }

    async fn load_data(
        &self,
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent> {
        self.counter.record("data");
        if self.fail_data {
            return Err(unreachable_service("table/data"));
        }
        check_range(Axis::Row, row_start, row_end, self.data.rows())?;
        check_range(Axis::Column, column_start, column_end, self.data.columns())?;
        let region = self.data.slice(
            row_start as usize..row_end as usize,
            column_start as usize..column_end as usize,
        );
        Ok(TableContent::new(render_data_cells(&region)))
    }
}

enum StubContent {
    Json(serde_json::Value),
    Table(Arc<StubTable>),
    Failing,
}

pub struct StubView {
    counter: FetchCounter,
    id: String,
    name: String,
    view_type: ViewType,
    localization: Localization,
    content: StubContent,
    delay: Duration,
}

impl StubView {
    pub fn json(counter: &FetchCounter, id: &str, name: &str, view_type: ViewType, value: serde_json::Value) -> Self {
        Self {
            counter: counter.clone(),
            id: id.to_string(),
            name: name.to_string(),
            view_type,
            localization: Localization::new(),
            content: StubContent::Json(value),
            delay: Duration::ZERO,
        }
    }

    pub fn table(counter: &FetchCounter, id: &str, name: &str, table: StubTable) -> Self {
        Self {
            content: StubContent::Table(Arc::new(table)),
            ..Self::json(counter, id, name, ViewType::Table, serde_json::Value::Null)
        }
    }

    pub fn failing(counter: &FetchCounter, id: &str) -> Self {
        Self {
            content: StubContent::Failing,
            ..Self::json(counter, id, id, ViewType::Chart, serde_json::Value::Null)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_localization(mut self, localization: Localization) -> Self {
        self.localization = localization;
        self
    }

    pub fn shared(self) -> Arc<dyn View> {
        Arc::new(self)
    }
}

impl Resource for StubView {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl View for StubView {
    fn view_type(&self) -> ViewType {
        self.view_type.clone()
    }

    fn localization(&self) -> &Localization {
        &self.localization
    }

    async fn load_content(&self) -> SnapshotResult<ViewContent> {
        self.counter.record("view content");
        tokio::time::sleep(self.delay).await;
        match &self.content {
            StubContent::Json(value) => Ok(ViewContent::Json(value.clone())),
            StubContent::Table(table) => Ok(ViewContent::Table(table.clone())),
            StubContent::Failing => Err(unreachable_service(&format!("views/{}", self.id))),
        }
    }
}

pub struct StubReport {
    pub counter: FetchCounter,
    pub id: String,
    pub name: String,
    pub localization: Localization,
    pub description: String,
    pub owner_name: String,
    pub last_change: Option<DateTime<Utc>>,
    pub has_thumbnail: bool,
    pub views: Vec<Arc<dyn View>>,
}

impl StubReport {
    pub fn new(counter: &FetchCounter, id: &str, views: Vec<Arc<dyn View>>) -> Self {
        Self {
            counter: counter.clone(),
            id: id.to_string(),
            name: format!("Report {}", id),
            localization: Localization::new().with("de", format!("Bericht {}", id)),
            description: "Monthly figures".to_string(),
            owner_name: "Finance".to_string(),
            last_change: DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            has_thumbnail: true,
            views,
        }
    }
}

impl Resource for StubReport {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Report for StubReport {
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
        self.counter.record("report thumbnail");
        if self.has_thumbnail {
            Image::from_bytes(TINY_PNG)
        } else {
            Err(unreachable_service("reports/thumbnail"))
        }
    }

    fn views(&self) -> Vec<Arc<dyn View>> {
        self.views.clone()
    }
}

pub struct StubReportInfo {
    pub counter: FetchCounter,
    pub report: Arc<StubReport>,
}

impl Resource for StubReportInfo {
    fn id(&self) -> &str {
        &self.report.id
    }

    fn name(&self) -> &str {
        &self.report.name
    }
}

#[async_trait]
impl ReportInfo for StubReportInfo {
    async fn load_details(&self) -> SnapshotResult<Arc<dyn Report>> {
        self.counter.record("report details");
        Ok(self.report.clone())
    }
}

pub struct StubDashboard {
    pub counter: FetchCounter,
    pub id: String,
    pub name: String,
    pub has_thumbnail: bool,
    pub dashlets: Vec<Dashlet>,
}

impl StubDashboard {
    pub fn new(counter: &FetchCounter, id: &str, dashlets: Vec<Dashlet>) -> Self {
        Self {
            counter: counter.clone(),
            id: id.to_string(),
            name: format!("Dashboard {}", id),
            has_thumbnail: false,
            dashlets,
        }
    }
}

impl Resource for StubDashboard {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Dashboard for StubDashboard {
    fn last_change(&self) -> Option<DateTime<Utc>> {
        None
    }

    async fn load_thumbnail(&self) -> SnapshotResult<Image> {
        self.counter.record("dashboard thumbnail");
        if self.has_thumbnail {
            Image::from_bytes(TINY_PNG)
        } else {
            Err(unreachable_service("dashboards/thumbnail"))
        }
    }

    fn dashlets(&self) -> Vec<Dashlet> {
        self.dashlets.clone()
    }
}

pub struct StubDashboardInfo {
    pub counter: FetchCounter,
    pub dashboard: Arc<StubDashboard>,
}

impl Resource for StubDashboardInfo {
    fn id(&self) -> &str {
        &self.dashboard.id
    }

    fn name(&self) -> &str {
        &self.dashboard.name
    }
}

#[async_trait]
impl DashboardInfo for StubDashboardInfo {
    async fn load_details(&self) -> SnapshotResult<Arc<dyn Dashboard>> {
        self.counter.record("dashboard details");
        Ok(self.dashboard.clone())
    }
}
