use thiserror::Error;

/// Error categories the processing endpoint reports to its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    InvalidInput,
    GeocodeRowFailure,
    InternalError,
}

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Missing file or API Key")]
    MissingInput,

    #[error("CSV is missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Geocoding failed for '{address}': {reason}")]
    GeocodeFailed { address: String, reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Geocoding worker failed: {message}")]
    WorkerError { message: String },

    #[error("Upload failed: {message}")]
    UploadFailed { message: String },

    #[error("An upload is already in progress")]
    Busy,
}

impl GeoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeoError::MissingInput => ErrorKind::MissingInput,
            GeoError::MissingColumns { .. } | GeoError::InvalidInput { .. } => {
                ErrorKind::InvalidInput
            }
            GeoError::GeocodeFailed { .. } => ErrorKind::GeocodeRowFailure,
            _ => ErrorKind::InternalError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::MissingInput | ErrorKind::InvalidInput => 400,
            ErrorKind::GeocodeRowFailure | ErrorKind::InternalError => 500,
        }
    }

    /// Message safe to hand back to the uploader. Internal details stay in the logs.
    pub fn user_friendly_message(&self) -> String {
        match self.kind() {
            ErrorKind::MissingInput | ErrorKind::InvalidInput => self.to_string(),
            ErrorKind::GeocodeRowFailure | ErrorKind::InternalError => {
                "Internal Server Error".to_string()
            }
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        GeoError::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;
