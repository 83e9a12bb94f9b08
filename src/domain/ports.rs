use crate::domain::model::{AddressRowSet, GeocodeResult, ProcessedCsv};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// What happens to the batch when a single geocoding call errors out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RowFailurePolicy {
    /// The row gets `N/A` coordinates and processing continues.
    #[default]
    Degrade,
    /// The whole request fails.
    Abort,
}

pub trait ConfigProvider: Send + Sync {
    fn geocode_endpoint(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn row_failure_policy(&self) -> RowFailurePolicy;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves one free-text address. `Err` means the lookup itself failed,
    /// `Ok(NotFound)` means the provider answered without a usable candidate.
    async fn geocode(&self, address: &str, api_key: &str) -> Result<GeocodeResult>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, input: &[u8]) -> Result<AddressRowSet>;
    async fn transform(&self, rows: AddressRowSet, api_key: &str) -> Result<AddressRowSet>;
    async fn load(&self, rows: AddressRowSet) -> Result<ProcessedCsv>;
}
