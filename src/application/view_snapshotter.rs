// View snapshotters - Freeze a single view and its table regions
use crate::domain::error::SnapshotResult;
use crate::domain::matrix::Matrix;
use crate::domain::resource::{Localization, Table, View, ViewContent, ViewType};
use crate::domain::snapshot::{FrozenContent, TableSnapshot, ViewSnapshot};
use crate::domain::table_markup::flatten;
use async_trait::async_trait;
use std::sync::Arc;

/// The three logical parts of a tabular view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRegion {
    LeftHeader,
    TopHeader,
    Data,
}

/// Fetch one full region and flatten it.
///
/// A table without a left header yields `row_count x 0`, one without a top
/// header yields `0 x column_count`; neither triggers a fetch.
pub async fn fetch_region(table: &dyn Table, region: TableRegion) -> SnapshotResult<Matrix> {
    let rows = table.row_count();
    let columns = table.column_count();

    let markup = match region {
        TableRegion::LeftHeader => {
            if !table.has_left_header() {
                return Matrix::hollow(rows, 0);
            }
            table.load_left_header(0, rows as i64).await?
        }
        TableRegion::TopHeader => {
            if !table.has_top_header() {
                return Matrix::hollow(0, columns);
            }
            table.load_top_header(0, columns as i64).await?
        }
        TableRegion::Data => table.load_data(0, rows as i64, 0, columns as i64).await?,
    };

    tracing::debug!(
        "Fetched {:?} region ({} bytes of markup)",
        region,
        markup.content.len()
    );
    flatten(&markup.content)
}

/// Freezes views. Every read-step has a default and can be overridden alone.
#[async_trait]
pub trait ViewSnapshotter: Send + Sync {
    fn read_id(&self, view: &dyn View) -> String {
        view.id().to_string()
    }

    fn read_name(&self, view: &dyn View) -> String {
        view.name().to_string()
    }

    fn read_view_type(&self, view: &dyn View) -> ViewType {
        view.view_type()
    }

    fn read_localization(&self, view: &dyn View) -> Localization {
        view.localization().clone()
    }

    async fn read_content(&self, view: &dyn View) -> SnapshotResult<FrozenContent> {
        Ok(match view.load_content().await? {
            ViewContent::Json(value) => FrozenContent::Json(value),
            ViewContent::Table(table) => FrozenContent::Table(self.store_table(table).await?),
            ViewContent::Image(image) => FrozenContent::Image(image),
            ViewContent::None => FrozenContent::None,
        })
    }

    async fn read_left_header(&self, table: &dyn Table) -> SnapshotResult<Matrix> {
        fetch_region(table, TableRegion::LeftHeader).await
    }

    async fn read_top_header(&self, table: &dyn Table) -> SnapshotResult<Matrix> {
        fetch_region(table, TableRegion::TopHeader).await
    }

    async fn read_data(&self, table: &dyn Table) -> SnapshotResult<Matrix> {
        fetch_region(table, TableRegion::Data).await
    }

    async fn store_view(&self, view: &dyn View) -> SnapshotResult<ViewSnapshot> {
        let id = self.read_id(view);
        tracing::debug!("Storing view {}", id);

        Ok(ViewSnapshot {
            name: self.read_name(view),
            view_type: self.read_view_type(view),
            localization: self.read_localization(view),
            content: self.read_content(view).await?,
            id,
        })
    }

    async fn store_table(&self, table: Arc<dyn Table>) -> SnapshotResult<TableSnapshot> {
        let left_header = self.read_left_header(table.as_ref()).await?;
        let top_header = self.read_top_header(table.as_ref()).await?;
        let data = self.read_data(table.as_ref()).await?;
        Ok(TableSnapshot::new(left_header, top_header, data, table.locale()))
    }
}

/// Fetches the table regions one after another.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialViewSnapshotter;

impl ViewSnapshotter for SequentialViewSnapshotter {}

/// Runs the three table regions of the wrapped snapshotter concurrently,
/// failing fast on the first region error.
///
/// Every read-step is taken from `steps`, so a snapshotter that overrides
/// `read_data` (or any other step) keeps that override when wrapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentViewSnapshotter<S = SequentialViewSnapshotter> {
    steps: S,
}

impl ConcurrentViewSnapshotter {
    pub fn new() -> Self {
        Self::wrapping(SequentialViewSnapshotter)
    }
}

impl<S: ViewSnapshotter> ConcurrentViewSnapshotter<S> {
    pub fn wrapping(steps: S) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl<S: ViewSnapshotter> ViewSnapshotter for ConcurrentViewSnapshotter<S> {
    fn read_id(&self, view: &dyn View) -> String {
        self.steps.read_id(view)
    }

    fn read_name(&self, view: &dyn View) -> String {
        self.steps.read_name(view)
    }

    fn read_view_type(&self, view: &dyn View) -> ViewType {
        self.steps.read_view_type(view)
    }

    fn read_localization(&self, view: &dyn View) -> Localization {
        self.steps.read_localization(view)
    }

    async fn read_left_header(&self, table: &dyn Table) -> SnapshotResult<Matrix> {
        self.steps.read_left_header(table).await
    }

    async fn read_top_header(&self, table: &dyn Table) -> SnapshotResult<Matrix> {
        self.steps.read_top_header(table).await
    }

    async fn read_data(&self, table: &dyn Table) -> SnapshotResult<Matrix> {
        self.steps.read_data(table).await
    }

    async fn store_table(&self, table: Arc<dyn Table>) -> SnapshotResult<TableSnapshot> {
        let source = table.as_ref();
        let (left_header, top_header, data) = tokio::try_join!(
            self.read_left_header(source),
            self.read_top_header(source),
            self.read_data(source),
        )?;
        Ok(TableSnapshot::new(left_header, top_header, data, table.locale()))
    }
}
