// Snapshot client for a remote analytics service
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
