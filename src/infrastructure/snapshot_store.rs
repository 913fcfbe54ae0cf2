// Snapshot store - Brotli-compressed JSON documents on disk
use crate::domain::snapshot::{DashboardSnapshot, ReportSnapshot};
use anyhow::{Context, Result};
use async_compression::tokio::bufread::{BrotliDecoder, BrotliEncoder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const EXTENSION: &str = ".json.br";

#[derive(Debug, Clone, Copy)]
enum Kind {
    Report,
    Dashboard,
}

impl Kind {
    fn dir(&self) -> &'static str {
        match self {
            Kind::Report => "reports",
            Kind::Dashboard => "dashboards",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save_report(&self, report: &ReportSnapshot) -> Result<PathBuf> {
        self.save(Kind::Report, &report.id, report).await
    }

    pub async fn load_report(&self, id: &str) -> Result<Option<ReportSnapshot>> {
        self.load(Kind::Report, id).await
    }

    pub async fn list_reports(&self) -> Result<Vec<String>> {
        self.list(Kind::Report).await
    }

    pub async fn save_dashboard(&self, dashboard: &DashboardSnapshot) -> Result<PathBuf> {
        self.save(Kind::Dashboard, &dashboard.id, dashboard).await
    }

    pub async fn load_dashboard(&self, id: &str) -> Result<Option<DashboardSnapshot>> {
        self.load(Kind::Dashboard, id).await
    }

    pub async fn list_dashboards(&self) -> Result<Vec<String>> {
        self.list(Kind::Dashboard).await
    }

    fn path_for(&self, kind: Kind, id: &str) -> PathBuf {
        // Ids come from the remote service; encoding keeps them inside the store.
        let file = format!("{}{}", urlencoding::encode(id), EXTENSION);
        self.root.join(kind.dir()).join(file)
    }

    async fn save<T: Serialize>(&self, kind: Kind, id: &str, value: &T) -> Result<PathBuf> {
        let path = self.path_for(kind, id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_vec(value).context("Failed to serialize snapshot")?;
        let mut encoder = BrotliEncoder::new(std::io::Cursor::new(json));
        let mut compressed = Vec::new();
        encoder
            .read_to_end(&mut compressed)
            .await
            .context("Failed to compress snapshot")?;

        // Written under a temporary name, then renamed into place.
        let partial = path.with_extension("br.partial");
        tokio::fs::write(&partial, &compressed)
            .await
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        tokio::fs::rename(&partial, &path)
            .await
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

        tracing::debug!("Saved {} ({} bytes compressed)", path.display(), compressed.len());
        Ok(path)
    }

    async fn load<T: DeserializeOwned>(&self, kind: Kind, id: &str) -> Result<Option<T>> {
        let path = self.path_for(kind, id);
        let compressed = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let mut decoder = BrotliDecoder::new(std::io::Cursor::new(compressed));
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .await
            .with_context(|| format!("Failed to decompress {}", path.display()))?;

        let value = serde_json::from_slice(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    async fn list(&self, kind: Kind) -> Result<Vec<String>> {
        let dir = self.root.join(kind.dir());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(encoded) = file_name.to_str().and_then(|n| n.strip_suffix(EXTENSION)) else {
                continue;
            };
            match urlencoding::decode(encoded) {
                Ok(id) => ids.push(id.into_owned()),
                Err(e) => tracing::warn!("Skipping snapshot file {:?}: {}", file_name, e),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
