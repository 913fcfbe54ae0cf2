// REST adapter for the analytics service and its live resources
use crate::application::analytics_repository::AnalyticsRepository;
use crate::domain::error::{Axis, SnapshotError, SnapshotResult, check_range};
use crate::domain::image::Image;
use crate::domain::resource::{
    Dashboard, DashboardInfo, Dashlet, Localization, Report, ReportInfo, Resource, Table,
    TableContent, View, ViewContent, ViewType,
};
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Shared connection state; cheap to clone into every live resource.
#[derive(Debug, Clone)]
struct Connection {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl Connection {
    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}/api/{}", self.base_url, path);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> SnapshotResult<reqwest::Response> {
        let url = self.url(path, query);
        tracing::debug!("GET {}", url);

        let transport = |message: String| SnapshotError::Transport {
            endpoint: path.to_string(),
            message,
        };
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(transport(format!(
                "status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> SnapshotResult<T> {
        let response = self.get(path, query).await?;
        response.json::<T>().await.map_err(|e| SnapshotError::InvalidResponse {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_bytes(&self, path: &str) -> SnapshotResult<Bytes> {
        let response = self.get(path, &[]).await?;
        response.bytes().await.map_err(|e| SnapshotError::Transport {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_image(&self, path: &str) -> SnapshotResult<Image> {
        Image::from_bytes(self.get_bytes(path).await?)
    }
}

fn encode_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[derive(Debug, Deserialize)]
struct ReportList {
    #[serde(default)]
    reports: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
struct DashboardList {
    #[serde(default)]
    dashboards: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    localization: BTreeMap<String, String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    last_change: Option<DateTime<Utc>>,
    #[serde(default)]
    views: Vec<ViewDto>,
}

#[derive(Debug, Deserialize)]
struct ViewDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    view_type: String,
    #[serde(default)]
    localization: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    last_change: Option<DateTime<Utc>>,
    #[serde(default)]
    dashlets: Vec<DashletDto>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "content")]
enum DashletDto {
    #[serde(rename = "viewReport")]
    View(ViewDto),
    #[serde(rename = "textContent")]
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableBoundsDto {
    rows_count: usize,
    columns_count: usize,
    #[serde(default)]
    left_header_columns_count: usize,
    #[serde(default)]
    top_header_rows_count: usize,
    #[serde(default)]
    locale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableContentDto {
    #[serde(default)]
    content: String,
}

/// Client for the analytics service REST API, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpAnalyticsClient {
    connection: Connection,
}

impl HttpAnalyticsClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            connection: Connection {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
            },
        })
    }
}

#[async_trait]
impl AnalyticsRepository for HttpAnalyticsClient {
    async fn list_reports(&self) -> anyhow::Result<Vec<Arc<dyn ReportInfo>>> {
        let list: ReportList = self
            .connection
            .get_json("reports", &[])
            .await
            .context("Failed to list reports")?;

        Ok(list
            .reports
            .into_iter()
            .map(|entry| {
                Arc::new(LiveReportInfo {
                    connection: self.connection.clone(),
                    id: entry.id,
                    name: entry.name,
                }) as Arc<dyn ReportInfo>
            })
            .collect())
    }

    async fn list_dashboards(&self) -> anyhow::Result<Vec<Arc<dyn DashboardInfo>>> {
        let list: DashboardList = self
            .connection
            .get_json("dashboards", &[])
            .await
            .context("Failed to list dashboards")?;

        Ok(list
            .dashboards
            .into_iter()
            .map(|entry| {
                Arc::new(LiveDashboardInfo {
                    connection: self.connection.clone(),
                    id: entry.id,
                    name: entry.name,
                }) as Arc<dyn DashboardInfo>
            })
            .collect())
    }

    fn report(&self, id: &str) -> Arc<dyn ReportInfo> {
        Arc::new(LiveReportInfo {
            connection: self.connection.clone(),
            id: id.to_string(),
            name: String::new(),
        })
    }

    fn dashboard(&self, id: &str) -> Arc<dyn DashboardInfo> {
        Arc::new(LiveDashboardInfo {
            connection: self.connection.clone(),
            id: id.to_string(),
            name: String::new(),
        })
    }
}

struct LiveReportInfo {
    connection: Connection,
    id: String,
    name: String,
}

impl Resource for LiveReportInfo {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ReportInfo for LiveReportInfo {
    async fn load_details(&self) -> SnapshotResult<Arc<dyn Report>> {
        let dto: ReportDto = self
            .connection
            .get_json(&format!("reports/{}", encode_id(&self.id)), &[])
            .await?;
        Ok(Arc::new(LiveReport::from_dto(self.connection.clone(), dto)))
    }
}

struct LiveReport {
    connection: Connection,
    id: String,
    name: String,
    localization: Localization,
    description: String,
    owner_name: String,
    last_change: Option<DateTime<Utc>>,
    views: Vec<Arc<dyn View>>,
}

impl LiveReport {
    fn from_dto(connection: Connection, dto: ReportDto) -> Self {
        let views = dto
            .views
            .into_iter()
            .map(|v| Arc::new(LiveView::from_dto(connection.clone(), v)) as Arc<dyn View>)
            .collect();

        Self {
            id: dto.id,
            name: dto.name,
            localization: dto.localization.into_iter().collect(),
            description: dto.description,
            owner_name: dto.owner,
            last_change: dto.last_change,
            views,
            connection,
        }
    }
}

impl Resource for LiveReport {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Report for LiveReport {
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
        self.connection
            .get_image(&format!("reports/{}/thumbnail", encode_id(&self.id)))
            .await
    }

    fn views(&self) -> Vec<Arc<dyn View>> {
        self.views.clone()
    }
}

struct LiveView {
    connection: Connection,
    id: String,
    name: String,
    view_type: ViewType,
    localization: Localization,
}

impl LiveView {
    fn from_dto(connection: Connection, dto: ViewDto) -> Self {
        Self {
            connection,
            id: dto.id,
            name: dto.name,
            view_type: ViewType::parse(&dto.view_type),
            localization: dto.localization.into_iter().collect(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("reports/views/{}/{}", encode_id(&self.id), suffix)
    }
}

impl Resource for LiveView {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl View for LiveView {
    fn view_type(&self) -> ViewType {
        self.view_type.clone()
    }

    fn localization(&self) -> &Localization {
        &self.localization
    }

    async fn load_content(&self) -> SnapshotResult<ViewContent> {
        match &self.view_type {
            json_type if json_type.is_json() => {
                let value: serde_json::Value = self
                    .connection
                    .get_json(&self.path(self.view_type.as_str()), &[])
                    .await?;
                Ok(ViewContent::Json(value))
            }
            ViewType::Table => {
                let bounds: TableBoundsDto = self
                    .connection
                    .get_json(&self.path("table/bounds"), &[])
                    .await?;
                Ok(ViewContent::Table(Arc::new(LiveTable {
                    connection: self.connection.clone(),
                    base_path: self.path("table"),
                    bounds,
                })))
            }
            ViewType::Image => Ok(ViewContent::Image(
                self.connection.get_image(&self.path("image")).await?,
            )),
            other => {
                tracing::debug!(
                    "View {} has unsupported type {}, keeping metadata only",
                    self.id,
                    other.as_str()
                );
                Ok(ViewContent::None)
            }
        }
    }
}

struct LiveTable {
    connection: Connection,
    base_path: String,
    bounds: TableBoundsDto,
}

impl LiveTable {
    async fn region(&self, name: &str, query: &[(&str, String)]) -> SnapshotResult<TableContent> {
        let dto: TableContentDto = self
            .connection
            .get_json(&format!("{}/{}", self.base_path, name), query)
            .await?;
        Ok(TableContent::new(dto.content))
    }
}

#[async_trait]
impl Table for LiveTable {
    fn has_left_header(&self) -> bool {
        self.bounds.left_header_columns_count > 0
    }

    fn has_top_header(&self) -> bool {
        self.bounds.top_header_rows_count > 0
    }

    fn row_count(&self) -> usize {
        self.bounds.rows_count
    }

    fn column_count(&self) -> usize {
        self.bounds.columns_count
    }

    fn locale(&self) -> Option<String> {
        self.bounds.locale.clone()
    }

    async fn load_left_header(&self, row_start: i64, row_end: i64) -> SnapshotResult<TableContent> {
        check_range(Axis::Row, row_start, row_end, self.row_count())?;
        self.region(
            "leftHeader",
            &[("rowsFrom", row_start.to_string()), ("rowsTo", row_end.to_string())],
        )
        .await
    }

    async fn load_top_header(
        &self,
        column_start: i64,
        column_end: i64,
    ) -> SnapshotResult<TableContent> {
        check_range(Axis::Column, column_start, column_end, self.column_count())?;
        self.region(
            "topHeader",
            &[
                ("columnsFrom", column_start.to_string()),
                ("columnsTo", column_end.to_string()),
            ],
        )
        .await
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
        self.region(
            "data",
            &[
                ("rowsFrom", row_start.to_string()),
                ("rowsTo", row_end.to_string()),
                ("columnsFrom", column_start.to_string()),
                ("columnsTo", column_end.to_string()),
            ],
        )
        .await
    }
}

struct LiveDashboardInfo {
    connection: Connection,
    id: String,
    name: String,
}

impl Resource for LiveDashboardInfo {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl DashboardInfo for LiveDashboardInfo {
    async fn load_details(&self) -> SnapshotResult<Arc<dyn Dashboard>> {
        let dto: DashboardDto = self
            .connection
            .get_json(&format!("dashboards/{}", encode_id(&self.id)), &[])
            .await?;

        let dashlets = dto
            .dashlets
            .into_iter()
            .map(|d| match d {
                DashletDto::View(view) => {
                    Dashlet::View(Arc::new(LiveView::from_dto(self.connection.clone(), view)))
                }
                DashletDto::Text(text) => Dashlet::Text(text),
            })
            .collect();

        Ok(Arc::new(LiveDashboard {
            connection: self.connection.clone(),
            id: dto.id,
            name: dto.name,
            last_change: dto.last_change,
            dashlets,
        }))
    }
}

struct LiveDashboard {
    connection: Connection,
    id: String,
    name: String,
    last_change: Option<DateTime<Utc>>,
    dashlets: Vec<Dashlet>,
}

impl Resource for LiveDashboard {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Dashboard for LiveDashboard {
    fn last_change(&self) -> Option<DateTime<Utc>> {
        self.last_change
    }

    async fn load_thumbnail(&self) -> SnapshotResult<Image> {
        self.connection
            .get_image(&format!("dashboards/{}/thumbnail", encode_id(&self.id)))
            .await
    }

    fn dashlets(&self) -> Vec<Dashlet> {
        self.dashlets.clone()
    }
}
