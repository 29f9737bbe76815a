use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::provider::MetricsProvider;
use crate::error::{Metric, MetricsError};

/// One point-in-time reading of the host. Built per request, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub cpu_model: String,
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub disk_usage: f64,
}

/// Pulls a complete snapshot from a [`MetricsProvider`], all-or-nothing.
#[derive(Clone)]
pub struct StatusSnapshotBuilder {
    provider: Arc<dyn MetricsProvider>,
    disk_mount: PathBuf,
}

impl StatusSnapshotBuilder {
    pub fn new(provider: Arc<dyn MetricsProvider>, disk_mount: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            disk_mount: disk_mount.into(),
        }
    }

    pub fn disk_mount(&self) -> &Path {
        &self.disk_mount
    }

    /// Queries CPU model, CPU usage, RAM usage and disk usage in that order,
    /// stopping at the first failure.
    pub fn build(&self) -> Result<StatusSnapshot, MetricsError> {
        let _span = tracing::debug_span!("snapshot.build").entered();

        let cpu_model = self
            .provider
            .cpu_model()
            .map_err(|e| MetricsError::new(Metric::CpuModel, e))?;
        let cpu_usage = self
            .provider
            .cpu_usage_percent()
            .map_err(|e| MetricsError::new(Metric::CpuUsage, e))?;
        let ram_usage = self
            .provider
            .ram_usage_percent()
            .map_err(|e| MetricsError::new(Metric::RamUsage, e))?;
        let disk_usage = self
            .provider
            .disk_usage_percent(&self.disk_mount)
            .map_err(|e| MetricsError::new(Metric::DiskUsage, e))?;

        Ok(StatusSnapshot {
            cpu_model,
            cpu_usage,
            ram_usage,
            disk_usage,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeProvider;
    use super::*;

    #[test]
    fn builds_all_four_fields() {
        let builder = StatusSnapshotBuilder::new(Arc::new(FakeProvider::default()), "/");
        let snapshot = builder.build().unwrap();
        assert_eq!(
            snapshot,
            StatusSnapshot {
                cpu_model: "Fake CPU @ 3.00GHz".to_string(),
                cpu_usage: 12.5,
                ram_usage: 40.0,
                disk_usage: 73.25,
            }
        );
    }

    #[test]
    fn queries_in_fixed_order() {
        let provider = Arc::new(FakeProvider::default());
        let builder = StatusSnapshotBuilder::new(provider.clone(), "/");
        builder.build().unwrap();
        assert_eq!(
            provider.calls(),
            vec![
                Metric::CpuModel,
                Metric::CpuUsage,
                Metric::RamUsage,
                Metric::DiskUsage
            ]
        );
    }

    #[test]
    fn stops_at_first_failure() {
        let provider = Arc::new(FakeProvider::failing(Metric::CpuUsage));
        let builder = StatusSnapshotBuilder::new(provider.clone(), "/");

        let err = builder.build().unwrap_err();
        assert_eq!(err.metric, Metric::CpuUsage);
        assert_eq!(provider.calls(), vec![Metric::CpuModel, Metric::CpuUsage]);
        assert!(err.to_string().contains("CPU usage"));
    }

    #[test]
    fn failure_on_last_metric_yields_no_partial_result() {
        let builder =
            StatusSnapshotBuilder::new(Arc::new(FakeProvider::failing(Metric::DiskUsage)), "/");
        let err = builder.build().unwrap_err();
        assert_eq!(err.metric, Metric::DiskUsage);
    }

    #[test]
    fn serializes_with_documented_field_names() {
        let snapshot = StatusSnapshot {
            cpu_model: "Fake".to_string(),
            cpu_usage: 1.0,
            ram_usage: 2.0,
            disk_usage: 3.0,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, ["cpu_model", "cpu_usage", "disk_usage", "ram_usage"]);
    }
}
