use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub service: ServiceSettings,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotSettings {
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Fetch views, dashlets and table regions concurrently.
    #[serde(default)]
    pub concurrent: bool,
    /// How many reports or dashboards are snapshotted at the same time.
    #[serde(default = "default_parallel_resources")]
    pub parallel_resources: usize,
    /// Snapshot every report the service lists, in addition to `reports`.
    #[serde(default)]
    pub all_reports: bool,
    /// Snapshot every dashboard the service lists, in addition to `dashboards`.
    #[serde(default)]
    pub all_dashboards: bool,
    #[serde(default)]
    pub reports: Vec<String>,
    #[serde(default)]
    pub dashboards: Vec<String>,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            concurrent: false,
            parallel_resources: default_parallel_resources(),
            all_reports: false,
            all_dashboards: false,
            reports: Vec::new(),
            dashboards: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Serve the stored snapshots after the snapshot run.
    #[serde(default = "default_serve")]
    pub serve: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            serve: default_serve(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_parallel_resources() -> usize {
    4
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_serve() -> bool {
    true
}

/// Load `config/service.*`, then apply `ANALYTICS__SECTION__KEY` overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/service").required(false))
        .add_source(
            config::Environment::with_prefix("ANALYTICS")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("snapshot.reports")
                .with_list_parse_key("snapshot.dashboards")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
