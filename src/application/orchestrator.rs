// Snapshot orchestrators - Freeze whole reports and dashboards
use crate::application::fan_out::fan_out;
use crate::application::view_snapshotter::{
    ConcurrentViewSnapshotter, SequentialViewSnapshotter, ViewSnapshotter,
};
use crate::domain::error::SnapshotResult;
use crate::domain::image::Image;
use crate::domain::resource::{Dashboard, DashboardInfo, Dashlet, Localization, Report, ReportInfo};
use crate::domain::snapshot::{DashboardSnapshot, DashletSnapshot, ReportSnapshot, ViewSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Freezes reports and dashboards into self-contained snapshot trees.
///
/// Scalar fields are read through individually overridable read-steps; child
/// views are handed to the configured [`ViewSnapshotter`].
#[async_trait]
pub trait SnapshotOrchestrator: Send + Sync {
    fn view_snapshotter(&self) -> Arc<dyn ViewSnapshotter>;

    fn read_report_id(&self, report: &dyn Report) -> String {
        report.id().to_string()
    }

    fn read_report_name(&self, report: &dyn Report) -> String {
        report.name().to_string()
    }

    fn read_report_localization(&self, report: &dyn Report) -> Localization {
        report.localization().clone()
    }

    fn read_description(&self, report: &dyn Report) -> String {
        report.description().to_string()
    }

    fn read_owner_name(&self, report: &dyn Report) -> String {
        report.owner_name().to_string()
    }

    fn read_report_last_change(&self, report: &dyn Report) -> Option<DateTime<Utc>> {
        report.last_change()
    }

    /// Thumbnail failures are not fatal; the snapshot just has no thumbnail.
    async fn read_report_thumbnail(&self, report: &dyn Report) -> Option<Image> {
        match report.load_thumbnail().await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!("Thumbnail of report {} unavailable: {}", report.id(), e);
                None
            }
        }
    }

    async fn store_views(&self, report: &dyn Report) -> SnapshotResult<Vec<ViewSnapshot>> {
        let snapshotter = self.view_snapshotter();
        let mut views = Vec::new();
        for view in report.views() {
            views.push(snapshotter.store_view(view.as_ref()).await?);
        }
        Ok(views)
    }

    async fn store_report(&self, report: &dyn Report) -> SnapshotResult<ReportSnapshot> {
        let snapshot = ReportSnapshot {
            id: self.read_report_id(report),
            name: self.read_report_name(report),
            localization: self.read_report_localization(report),
            description: self.read_description(report),
            owner_name: self.read_owner_name(report),
            last_change: self.read_report_last_change(report),
            thumbnail: self.read_report_thumbnail(report).await,
            views: self.store_views(report).await?,
        };

        tracing::info!(
            "Stored report {} with {} views",
            snapshot.id,
            snapshot.views.len()
        );
        Ok(snapshot)
    }

    async fn store_report_info(&self, info: &dyn ReportInfo) -> SnapshotResult<ReportSnapshot> {
        let report = info.load_details().await?;
        self.store_report(report.as_ref()).await
    }

    fn read_dashboard_id(&self, dashboard: &dyn Dashboard) -> String {
        dashboard.id().to_string()
    }

    fn read_dashboard_name(&self, dashboard: &dyn Dashboard) -> String {
        dashboard.name().to_string()
    }

    fn read_dashboard_last_change(&self, dashboard: &dyn Dashboard) -> Option<DateTime<Utc>> {
        dashboard.last_change()
    }

    async fn read_dashboard_thumbnail(&self, dashboard: &dyn Dashboard) -> Option<Image> {
        match dashboard.load_thumbnail().await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!("Thumbnail of dashboard {} unavailable: {}", dashboard.id(), e);
                None
            }
        }
    }

    async fn store_dashlets(&self, dashboard: &dyn Dashboard) -> SnapshotResult<Vec<DashletSnapshot>> {
        let snapshotter = self.view_snapshotter();
        let mut dashlets = Vec::new();
        for dashlet in dashboard.dashlets() {
            dashlets.push(store_dashlet(snapshotter.as_ref(), dashlet).await?);
        }
        Ok(dashlets)
    }

    async fn store_dashboard(&self, dashboard: &dyn Dashboard) -> SnapshotResult<DashboardSnapshot> {
        let snapshot = DashboardSnapshot {
            id: self.read_dashboard_id(dashboard),
            name: self.read_dashboard_name(dashboard),
            last_change: self.read_dashboard_last_change(dashboard),
            thumbnail: self.read_dashboard_thumbnail(dashboard).await,
            dashlets: self.store_dashlets(dashboard).await?,
        };

        tracing::info!(
            "Stored dashboard {} with {} dashlets",
            snapshot.id,
            snapshot.dashlets.len()
        );
        Ok(snapshot)
    }

    async fn store_dashboard_info(&self, info: &dyn DashboardInfo) -> SnapshotResult<DashboardSnapshot> {
        let dashboard = info.load_details().await?;
        self.store_dashboard(dashboard.as_ref()).await
    }
}

async fn store_dashlet(
    snapshotter: &dyn ViewSnapshotter,
    dashlet: Dashlet,
) -> SnapshotResult<DashletSnapshot> {
    match dashlet {
        Dashlet::Text(text) => Ok(DashletSnapshot::Text(text)),
        Dashlet::View(view) => Ok(DashletSnapshot::View(snapshotter.store_view(view.as_ref()).await?)),
    }
}

/// Visits children one at a time.
#[derive(Clone)]
pub struct SequentialOrchestrator {
    views: Arc<dyn ViewSnapshotter>,
}

impl SequentialOrchestrator {
    pub fn new(views: Arc<dyn ViewSnapshotter>) -> Self {
        Self { views }
    }
}

impl Default for SequentialOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(SequentialViewSnapshotter))
    }
}

impl SnapshotOrchestrator for SequentialOrchestrator {
    fn view_snapshotter(&self) -> Arc<dyn ViewSnapshotter> {
        self.views.clone()
    }
}

/// Runs one task per view or dashlet. Results keep input order; the first
/// failing child aborts its siblings and fails the whole call.
#[derive(Clone)]
pub struct ConcurrentOrchestrator {
    views: Arc<dyn ViewSnapshotter>,
}

impl ConcurrentOrchestrator {
    pub fn new(views: Arc<dyn ViewSnapshotter>) -> Self {
        Self { views }
    }
}

impl Default for ConcurrentOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(ConcurrentViewSnapshotter::new()))
    }
}

#[async_trait]
impl SnapshotOrchestrator for ConcurrentOrchestrator {
    fn view_snapshotter(&self) -> Arc<dyn ViewSnapshotter> {
        self.views.clone()
    }

    async fn store_views(&self, report: &dyn Report) -> SnapshotResult<Vec<ViewSnapshot>> {
        let snapshotter = self.view_snapshotter();
        fan_out(report.views(), move |view| {
            let snapshotter = snapshotter.clone();
            async move { snapshotter.store_view(view.as_ref()).await }
        })
        .await
    }

    async fn store_dashlets(&self, dashboard: &dyn Dashboard) -> SnapshotResult<Vec<DashletSnapshot>> {
        let snapshotter = self.view_snapshotter();
        fan_out(dashboard.dashlets(), move |dashlet| {
            let snapshotter = snapshotter.clone();
            async move { store_dashlet(snapshotter.as_ref(), dashlet).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{
        FetchCounter, StubDashboard, StubDashboardInfo, StubReport, StubReportInfo, StubTable, StubView,
    };
    use crate::domain::error::SnapshotError;
    use crate::domain::resource::{Resource, Table, View, ViewContent, ViewType};
    use crate::domain::snapshot::FrozenContent;
    use serde_json::json;
    use std::time::Duration;

    fn sales_table(counter: &FetchCounter) -> StubTable {
        StubTable::new(
            counter,
            &[&["North"], &["South"]],
            &[&["Q1", "Q2"]],
            &[&["1", "2"], &["3", "4"]],
        )
    }

    fn mixed_report(counter: &FetchCounter) -> StubReport {
        StubReport::new(
            counter,
            "r1",
            vec![
                StubView::json(counter, "v0", "Trend", ViewType::Chart, json!({"bars": [1, 2, 3]}))
                    .with_localization(Localization::new().with("de", "Verlauf"))
                    .shared(),
                StubView::table(counter, "v1", "Breakdown", sales_table(counter)).shared(),
                StubView::json(counter, "v2", "Total", ViewType::Kpi, json!({"value": 10})).shared(),
            ],
        )
    }

    /// Children finish in reverse order: child 0 is the slowest.
    fn staggered_views(counter: &FetchCounter, count: u64) -> Vec<Arc<dyn View>> {
        (0..count)
            .map(|i| {
                StubView::json(counter, &format!("v{}", i), &format!("View {}", i), ViewType::Kpi, json!(i))
                    .with_delay(Duration::from_millis(20 * (count - i)))
                    .shared()
            })
            .collect()
    }

    fn orchestrators() -> Vec<Box<dyn SnapshotOrchestrator>> {
        vec![
            Box::new(SequentialOrchestrator::default()),
            Box::new(ConcurrentOrchestrator::default()),
        ]
    }

    #[tokio::test]
    async fn test_store_report_copies_fields_and_views() {
        for orchestrator in orchestrators() {
            let counter = FetchCounter::default();
            let report = mixed_report(&counter);
            let snapshot = orchestrator.store_report(&report).await.unwrap();

            assert_eq!(snapshot.id(), "r1");
            assert_eq!(snapshot.name(), "Report r1");
            assert_eq!(snapshot.description(), "Monthly figures");
            assert_eq!(snapshot.owner_name(), "Finance");
            assert_eq!(snapshot.last_change(), report.last_change);
            assert_eq!(snapshot.localization().name_or("de", ""), "Bericht r1");
            assert!(snapshot.thumbnail().is_some());

            let ids: Vec<&str> = snapshot.view_snapshots().iter().map(|v| v.id()).collect();
            assert_eq!(ids, vec!["v0", "v1", "v2"]);
            assert_eq!(
                snapshot.view_snapshots()[0].localization().name_or("de", ""),
                "Verlauf"
            );
            assert_eq!(snapshot.view_snapshots()[1].table().map(|t| t.row_count()), Some(2));
        }
    }

    #[tokio::test]
    async fn test_snapshot_accessors_never_fetch() {
        let counter = FetchCounter::default();
        let report = mixed_report(&counter);
        let snapshot = ConcurrentOrchestrator::default().store_report(&report).await.unwrap();
        let fetched = counter.fetches();
        counter.seal();

        assert!(snapshot.load_thumbnail().await.is_ok());
        for view in snapshot.views() {
            match view.load_content().await.unwrap() {
                ViewContent::Table(table) => {
                    let rows = table.row_count() as i64;
                    let columns = table.column_count() as i64;
                    table.load_left_header(0, rows).await.unwrap();
                    table.load_top_header(0, columns).await.unwrap();
                    table.load_data(0, rows, 0, columns).await.unwrap();
                }
                ViewContent::Json(_) | ViewContent::Image(_) | ViewContent::None => {}
            }
        }
        assert_eq!(counter.fetches(), fetched);
    }

    #[tokio::test]
    async fn test_missing_thumbnail_is_absent_not_fatal() {
        let counter = FetchCounter::default();
        let mut report = mixed_report(&counter);
        report.has_thumbnail = false;

        let snapshot = SequentialOrchestrator::default().store_report(&report).await.unwrap();
        assert!(snapshot.thumbnail().is_none());
        assert_eq!(snapshot.view_snapshots().len(), 3);
        assert!(matches!(
            snapshot.load_thumbnail().await,
            Err(SnapshotError::NotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_views_keep_input_order() {
        let counter = FetchCounter::default();
        let report = StubReport::new(&counter, "r2", staggered_views(&counter, 5));
        let snapshot = ConcurrentOrchestrator::default().store_report(&report).await.unwrap();

        let contents: Vec<FrozenContent> = snapshot
            .view_snapshots()
            .iter()
            .map(|v| v.content().clone())
            .collect();
        let expected: Vec<FrozenContent> = (0..5).map(|i| FrozenContent::Json(json!(i))).collect();
        assert_eq!(contents, expected);
    }

    #[tokio::test]
    async fn test_failing_child_fails_fast() {
        for orchestrator in orchestrators() {
            let counter = FetchCounter::default();
            let views = vec![
                StubView::json(&counter, "v0", "A", ViewType::Kpi, json!(0))
                    .with_delay(Duration::from_millis(10))
                    .shared(),
                StubView::failing(&counter, "v1").shared(),
                StubView::json(&counter, "v2", "C", ViewType::Kpi, json!(2))
                    .with_delay(Duration::from_millis(10))
                    .shared(),
            ];
            let report = StubReport::new(&counter, "r3", views);

            let err = orchestrator.store_report(&report).await.unwrap_err();
            match err {
                SnapshotError::Transport { endpoint, .. } => assert_eq!(endpoint, "views/v1"),
                other => panic!("expected transport error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_store_report_info_loads_details_first() {
        let counter = FetchCounter::default();
        let info = StubReportInfo {
            counter: counter.clone(),
            report: Arc::new(mixed_report(&counter)),
        };
        let snapshot = SequentialOrchestrator::default().store_report_info(&info).await.unwrap();
        assert_eq!(snapshot.id(), "r1");
        assert_eq!(snapshot.view_snapshots().len(), 3);
    }

    #[tokio::test]
    async fn test_store_dashboard() {
        for orchestrator in orchestrators() {
            let counter = FetchCounter::default();
            let dashboard = StubDashboard::new(
                &counter,
                "d1",
                vec![
                    Dashlet::Text("Welcome <b>back</b>".to_string()),
                    Dashlet::View(StubView::table(&counter, "v1", "Breakdown", sales_table(&counter)).shared()),
                    Dashlet::View(
                        StubView::json(&counter, "v2", "Total", ViewType::Kpi, json!(7))
                            .with_delay(Duration::from_millis(5))
                            .shared(),
                    ),
                ],
            );
            let info = StubDashboardInfo {
                counter: counter.clone(),
                dashboard: Arc::new(dashboard),
            };

            let snapshot = orchestrator.store_dashboard_info(&info).await.unwrap();
            assert_eq!(snapshot.id(), "d1");
            assert_eq!(snapshot.name(), "Dashboard d1");
            assert!(snapshot.thumbnail().is_none());

            let dashlets = snapshot.dashlet_snapshots();
            assert_eq!(dashlets.len(), 3);
            assert_eq!(dashlets[0], DashletSnapshot::Text("Welcome <b>back</b>".to_string()));
            match &dashlets[1] {
                DashletSnapshot::View(view) => {
                    assert_eq!(view.table().map(|t| t.data().get(1, 1)), Some(Some("4")));
                }
                other => panic!("expected view dashlet, got {:?}", other),
            }
            match &dashlets[2] {
                DashletSnapshot::View(view) => assert_eq!(view.content(), &FrozenContent::Json(json!(7))),
                other => panic!("expected view dashlet, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_report_read_step_override() {
        struct NoDescriptions(SequentialOrchestrator);

        impl SnapshotOrchestrator for NoDescriptions {
            fn view_snapshotter(&self) -> Arc<dyn ViewSnapshotter> {
                self.0.view_snapshotter()
            }

            fn read_description(&self, _report: &dyn Report) -> String {
                String::new()
            }
        }

        let counter = FetchCounter::default();
        let report = mixed_report(&counter);
        let snapshot = NoDescriptions(SequentialOrchestrator::default())
            .store_report(&report)
            .await
            .unwrap();
        assert_eq!(snapshot.description(), "");
        assert_eq!(snapshot.owner_name(), "Finance");
    }

    #[tokio::test]
    async fn test_empty_report() {
        let counter = FetchCounter::default();
        let report = StubReport::new(&counter, "r4", Vec::new());
        let snapshot = ConcurrentOrchestrator::default().store_report(&report).await.unwrap();
        assert!(snapshot.view_snapshots().is_empty());
        assert!(snapshot.views().is_empty());
        assert_eq!(snapshot.id(), "r4");
    }
}
