//! Replay job launcher: starts the downstream job that applies changes buffered since the backup.

pub(crate) mod http;

use async_trait::async_trait;

use crate::errors::Result;

pub use http::HttpReplayLauncher;

#[async_trait]
pub trait ReplayLauncher: Send + Sync {
    /// Resolves once the launch request is accepted; the job itself keeps running.
    async fn launch(&self) -> Result<()>;
}
