// Snapshot service - Use case for freezing configured reports and dashboards
use crate::application::analytics_repository::AnalyticsRepository;
use crate::application::orchestrator::SnapshotOrchestrator;
use crate::domain::resource::{DashboardInfo, ReportInfo};
use crate::infrastructure::snapshot_store::SnapshotStore;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of one snapshot run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub stored: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl SnapshotSummary {
    fn record(&mut self, id: String, outcome: anyhow::Result<()>) {
        match outcome {
            Ok(()) => self.stored.push(id),
            Err(e) => {
                tracing::error!("Snapshot of {} failed: {:#}", id, e);
                self.failed.push((id, format!("{:#}", e)));
            }
        }
    }
}

#[derive(Clone)]
pub struct SnapshotService {
    repository: Arc<dyn AnalyticsRepository>,
    orchestrator: Arc<dyn SnapshotOrchestrator>,
    store: SnapshotStore,
    parallel_resources: usize,
}

impl SnapshotService {
    pub fn new(
        repository: Arc<dyn AnalyticsRepository>,
        orchestrator: Arc<dyn SnapshotOrchestrator>,
        store: SnapshotStore,
        parallel_resources: usize,
    ) -> Self {
        Self {
            repository,
            orchestrator,
            store,
            parallel_resources: parallel_resources.max(1),
        }
    }

    /// Snapshot the given reports, plus every listed report when `all` is set.
    /// A failing report is recorded and does not stop the others.
    pub async fn snapshot_reports(&self, ids: &[String], all: bool) -> anyhow::Result<SnapshotSummary> {
        let mut handles: Vec<Arc<dyn ReportInfo>> = ids.iter().map(|id| self.repository.report(id)).collect();
        if all {
            let mut seen: BTreeSet<String> = ids.iter().cloned().collect();
            for info in self.repository.list_reports().await? {
                if seen.insert(info.id().to_string()) {
                    handles.push(info);
                }
            }
        }

        let outcomes: Vec<(String, anyhow::Result<()>)> = futures::stream::iter(handles)
            .map(|info| async move {
                let id = info.id().to_string();
                let outcome = self.snapshot_report(info.as_ref()).await;
                (id, outcome)
            })
            .buffered(self.parallel_resources)
            .collect()
            .await;

        let mut summary = SnapshotSummary::default();
        for (id, outcome) in outcomes {
            summary.record(id, outcome);
        }
        Ok(summary)
    }

    /// Snapshot the given dashboards, plus every listed dashboard when `all` is set.
    pub async fn snapshot_dashboards(&self, ids: &[String], all: bool) -> anyhow::Result<SnapshotSummary> {
        let mut handles: Vec<Arc<dyn DashboardInfo>> =
            ids.iter().map(|id| self.repository.dashboard(id)).collect();
        if all {
            let mut seen: BTreeSet<String> = ids.iter().cloned().collect();
            for info in self.repository.list_dashboards().await? {
                if seen.insert(info.id().to_string()) {
                    handles.push(info);
                }
            }
        }

        let outcomes: Vec<(String, anyhow::Result<()>)> = futures::stream::iter(handles)
            .map(|info| async move {
                let id = info.id().to_string();
                let outcome = self.snapshot_dashboard(info.as_ref()).await;
                (id, outcome)
            })
            .buffered(self.parallel_resources)
            .collect()
            .await;

        let mut summary = SnapshotSummary::default();
        for (id, outcome) in outcomes {
            summary.record(id, outcome);
        }
        Ok(summary)
    }

    async fn snapshot_report(&self, info: &dyn ReportInfo) -> anyhow::Result<()> {
        let snapshot = self.orchestrator.store_report_info(info).await?;
        self.store.save_report(&snapshot).await?;
        Ok(())
    }

    async fn snapshot_dashboard(&self, info: &dyn DashboardInfo) -> anyhow::Result<()> {
        let snapshot = self.orchestrator.store_dashboard_info(info).await?;
        self.store.save_dashboard(&snapshot).await?;
        Ok(())
    }
}
