// Presentation layer - Offline HTTP viewer for stored snapshots
pub mod app_state;
pub mod handlers;
pub mod view_models;
