// src/metrics.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus text snapshot for batch runs, in the node-exporter
/// textfile-collector style: render once at exit, no listener.
pub struct Metrics {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl Metrics {
    /// Install the global recorder. Call at most once per process.
    pub fn init(path: &Path) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self {
            handle,
            path: path.to_path_buf(),
        })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn write_snapshot(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating metrics dir {}", dir.display()))?;
        }
        std::fs::write(&self.path, self.render())
            .with_context(|| format!("writing metrics to {}", self.path.display()))
    }
}
