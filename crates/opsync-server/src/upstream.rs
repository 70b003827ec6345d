//! Upstream connector seam.

use async_trait::async_trait;

use opsync_core::CanonicalTask;
use opsync_openproject::OpenProjectClient;

/// Error type carried across the connector seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Source of candidate tasks for a reconciliation pass.
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    /// Cheap connectivity check run before every fetch.
    async fn test_connection(&self) -> Result<(), BoxError>;

    /// Fetch the candidate set, in upstream order.
    async fn get_tasks(&self) -> Result<Vec<CanonicalTask>, BoxError>;
}

#[async_trait]
impl UpstreamConnector for OpenProjectClient {
    async fn test_connection(&self) -> Result<(), BoxError> {
        OpenProjectClient::test_connection(self).await?;
        Ok(())
    }

    async fn get_tasks(&self) -> Result<Vec<CanonicalTask>, BoxError> {
        Ok(OpenProjectClient::get_tasks(self).await?)
    }
}
