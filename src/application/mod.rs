// Application layer - Snapshot orchestration and use cases
pub mod analytics_repository;
pub mod fan_out;
pub mod orchestrator;
pub mod snapshot_service;
pub mod view_snapshotter;

#[cfg(test)]
pub(crate) mod test_support;
