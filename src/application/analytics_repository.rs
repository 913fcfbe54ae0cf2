// Repository trait for the remote analytics service
use crate::domain::resource::{DashboardInfo, ReportInfo};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// List the reports visible to the authenticated user
    async fn list_reports(&self) -> anyhow::Result<Vec<Arc<dyn ReportInfo>>>;

    /// List the dashboards visible to the authenticated user
    async fn list_dashboards(&self) -> anyhow::Result<Vec<Arc<dyn DashboardInfo>>>;

    /// Handle for a report by id; details are fetched on `load_details`
    fn report(&self, id: &str) -> Arc<dyn ReportInfo>;

    /// Handle for a dashboard by id; details are fetched on `load_details`
    fn dashboard(&self, id: &str) -> Arc<dyn DashboardInfo>;
}
