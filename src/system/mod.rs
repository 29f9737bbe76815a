pub mod provider;
pub mod snapshot;

pub use provider::{MetricsProvider, SysinfoProvider};
pub use snapshot::{StatusSnapshot, StatusSnapshotBuilder};
