pub mod service;
pub mod toml_config;

pub use service::ServiceConfig;

#[cfg(feature = "cli")]
use crate::core::RowFailurePolicy;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "csv-geocoder")]
#[command(about = "Upload a CSV of addresses, get it back with Latitude/Longitude columns")]
pub struct CliConfig {
    #[arg(long, default_value = service::DEFAULT_LISTEN)]
    pub listen: String,

    #[arg(long, default_value = crate::core::geocoder::DEFAULT_GEOCODE_ENDPOINT)]
    pub geocode_endpoint: String,

    #[arg(long, default_value_t = service::DEFAULT_CONCURRENT_REQUESTS)]
    pub concurrent_requests: usize,

    #[arg(long, default_value_t = service::DEFAULT_REQUEST_TIMEOUT_SECONDS)]
    pub request_timeout_seconds: u64,

    #[arg(long, value_enum, default_value_t = RowFailurePolicy::Degrade)]
    pub row_failure: RowFailurePolicy,

    #[arg(long, default_value_t = service::DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    #[arg(long, help = "Read settings from a TOML file instead of the flags above")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// With `--config` the TOML file supplies every setting; `--json-logs` still applies.
    pub fn resolve(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => toml_config::TomlConfig::from_file(path)?.to_service_config(),
            None => ServiceConfig {
                listen: self.listen.clone(),
                geocode_endpoint: self.geocode_endpoint.clone(),
                concurrent_requests: self.concurrent_requests,
                request_timeout_seconds: self.request_timeout_seconds,
                row_failure: self.row_failure,
                max_upload_mb: self.max_upload_mb,
                json_logs: false,
            },
        };
        config.json_logs |= self.json_logs;
        Ok(config)
    }
}
