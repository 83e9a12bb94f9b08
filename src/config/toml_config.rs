use crate::config::service::{
    ServiceConfig, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_LISTEN, DEFAULT_MAX_UPLOAD_MB,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};
use crate::core::geocoder::DEFAULT_GEOCODE_ENDPOINT;
use crate::core::RowFailurePolicy;
use crate::utils::error::{GeoError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub geocoder: GeocoderSection,
    pub error_handling: Option<ErrorHandlingSection>,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub listen: Option<String>,
    pub max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocoderSection {
    pub endpoint: Option<String>,
    pub concurrent_requests: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingSection {
    pub on_row_failure: Option<RowFailurePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GeoError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GeoError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` with the environment value. Unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GeoError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            listen: self
                .server
                .listen
                .clone()
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            geocode_endpoint: self
                .geocoder
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_GEOCODE_ENDPOINT.to_string()),
            concurrent_requests: self
                .geocoder
                .concurrent_requests
                .unwrap_or(DEFAULT_CONCURRENT_REQUESTS),
            request_timeout_seconds: self
                .geocoder
                .timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            row_failure: self
                .error_handling
                .as_ref()
                .and_then(|e| e.on_row_failure)
                .unwrap_or_default(),
            max_upload_mb: self.server.max_upload_mb.unwrap_or(DEFAULT_MAX_UPLOAD_MB),
            json_logs: self
                .monitoring
                .as_ref()
                .and_then(|m| m.json_logs)
                .unwrap_or(false),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_service_config().validate()
    }
}
