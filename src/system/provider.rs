use std::path::{Path, PathBuf};
use std::time::Duration;

use sysinfo::{Disks, System};

use crate::error::ProbeError;

/// Source of raw host metrics. Each query is independent and may fail on its own.
pub trait MetricsProvider: Send + Sync {
    fn cpu_model(&self) -> Result<String, ProbeError>;
    fn cpu_usage_percent(&self) -> Result<f64, ProbeError>;
    fn ram_usage_percent(&self) -> Result<f64, ProbeError>;
    fn disk_usage_percent(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// `sysinfo`-backed provider. Every call reads fresh state; nothing is cached
/// between calls, so one instance can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct SysinfoProvider {
    cpu_sample_window: Duration,
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
    }
}

impl SysinfoProvider {
    pub fn new(cpu_sample_window: Duration) -> Self {
        // sysinfo cannot produce a meaningful reading below its minimum interval.
        let cpu_sample_window = cpu_sample_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        Self { cpu_sample_window }
    }

    pub fn cpu_sample_window(&self) -> Duration {
        self.cpu_sample_window
    }
}

impl MetricsProvider for SysinfoProvider {
    fn cpu_model(&self) -> Result<String, ProbeError> {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        let cpu = sys.cpus().first().ok_or(ProbeError::NoCpus)?;

        let model = [cpu.brand(), cpu.vendor_id()]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown");
        Ok(model.to_string())
    }

    fn cpu_usage_percent(&self) -> Result<f64, ProbeError> {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        if sys.cpus().is_empty() {
            return Err(ProbeError::NoCpus);
        }
        std::thread::sleep(self.cpu_sample_window);
        sys.refresh_cpu_usage();
        Ok(clamp_percent(f64::from(sys.global_cpu_usage())))
    }

    fn ram_usage_percent(&self) -> Result<f64, ProbeError> {
        let mut sys = System::new();
        sys.refresh_memory();
        percent_used(sys.total_memory(), sys.used_memory()).ok_or(ProbeError::MemoryUnavailable)
    }

    fn disk_usage_percent(&self, path: &Path) -> Result<f64, ProbeError> {
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<MountUsage> = disks
            .list()
            .iter()
            .map(|disk| MountUsage {
                mount_point: disk.mount_point().to_path_buf(),
                total: disk.total_space(),
                available: disk.available_space(),
            })
            .collect();

        let mount = resolve_mount(&mounts, path)
            .ok_or_else(|| ProbeError::MountNotFound(path.to_path_buf()))?;
        let used = mount.total.saturating_sub(mount.available);
        percent_used(mount.total, used)
            .ok_or_else(|| ProbeError::EmptyFilesystem(mount.mount_point.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountUsage {
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

/// Picks the mount that holds `path`: the one with the longest mount point
/// that is a prefix of it.
pub fn resolve_mount<'a>(mounts: &'a [MountUsage], path: &Path) -> Option<&'a MountUsage> {
    mounts
        .iter()
        .filter(|m| path.starts_with(&m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
}

fn percent_used(total: u64, used: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(clamp_percent(used as f64 / total as f64 * 100.0))
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
