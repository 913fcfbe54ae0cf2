// Application state for HTTP handlers
use crate::infrastructure::snapshot_store::SnapshotStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}
