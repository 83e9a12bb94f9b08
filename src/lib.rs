pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod storage;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use client::UploadClient;
pub use config::ServiceConfig;
pub use storage::FileStore;
pub use core::{etl::EtlEngine, geocoder::GoogleGeocoder, pipeline::GeocodePipeline};
pub use utils::error::{GeoError, Result};
