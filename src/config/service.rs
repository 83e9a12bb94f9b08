use crate::core::geocoder::DEFAULT_GEOCODE_ENDPOINT;
use crate::core::{ConfigProvider, RowFailurePolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:3000";
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 10;

/// Fully resolved settings for the service and the offline batch tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub listen: String,
    pub geocode_endpoint: String,
    pub concurrent_requests: usize,
    pub request_timeout_seconds: u64,
    pub row_failure: RowFailurePolicy,
    pub max_upload_mb: usize,
    pub json_logs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            geocode_endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            row_failure: RowFailurePolicy::default(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            json_logs: false,
        }
    }
}

impl ServiceConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        validation::validate_socket_addr("server.listen", &self.listen)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl ConfigProvider for ServiceConfig {
    fn geocode_endpoint(&self) -> &str {
        &self.geocode_endpoint
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn row_failure_policy(&self) -> RowFailurePolicy {
        self.row_failure
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_socket_addr("server.listen", &self.listen)?;
        validation::validate_url("geocoder.endpoint", &self.geocode_endpoint)?;
        validation::validate_range("geocoder.concurrent_requests", self.concurrent_requests, 1, 100)?;
        validation::validate_range("geocoder.timeout_seconds", self.request_timeout_seconds, 1, 300)?;
        validation::validate_positive_number("server.max_upload_mb", self.max_upload_mb, 1)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
