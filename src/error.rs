use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// The four values a snapshot is made of, in query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CpuModel,
    CpuUsage,
    RamUsage,
    DiskUsage,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::CpuModel => "CPU model",
            Metric::CpuUsage => "CPU usage",
            Metric::RamUsage => "RAM usage",
            Metric::DiskUsage => "disk usage",
        };
        f.write_str(label)
    }
}

/// Why a single provider query failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no CPUs reported by the operating system")]
    NoCpus,
    #[error("total physical memory reported as zero")]
    MemoryUnavailable,
    #[error("no mounted filesystem contains {}", .0.display())]
    MountNotFound(PathBuf),
    #[error("filesystem mounted at {} reports zero capacity", .0.display())]
    EmptyFilesystem(PathBuf),
    #[error("{0}")]
    Other(String),
}

/// A snapshot could not be built because one metric query failed.
#[derive(Debug, Error)]
#[error("failed to read {metric}: {source}")]
pub struct MetricsError {
    pub metric: Metric,
    #[source]
    pub source: ProbeError,
}

impl MetricsError {
    pub fn new(metric: Metric, source: ProbeError) -> Self {
        Self { metric, source }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("HTTP listener stopped before it started listening")]
    NotListening,
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("metrics sampler task failed: {0}")]
    Sampler(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error(transparent)]
    Server(#[from] ServiceError),
    #[error("failed to write to console: {0}")]
    Io(#[from] std::io::Error),
}
