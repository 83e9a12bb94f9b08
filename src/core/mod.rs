pub mod csv_codec;
pub mod etl;
pub mod geocoder;
pub mod pipeline;

pub use crate::domain::model::{AddressRow, AddressRowSet, GeocodeResult, ProcessedCsv};
pub use crate::domain::ports::{ConfigProvider, Geocoder, Pipeline, RowFailurePolicy, Storage};
pub use crate::utils::error::Result;
