use crate::core::csv_codec;
use crate::core::geocoder::GoogleGeocoder;
use crate::core::{
    AddressRowSet, ConfigProvider, GeocodeResult, Geocoder, Pipeline, ProcessedCsv,
    RowFailurePolicy,
};
use crate::domain::model::{LATITUDE_COLUMN, NOT_AVAILABLE};
use crate::utils::error::{GeoError, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const OUTPUT_FILE_NAME: &str = "processed.csv";

/// Parses an uploaded CSV, geocodes every row and serializes the augmented rows.
pub struct GeocodePipeline<G: Geocoder, C: ConfigProvider> {
    geocoder: Arc<G>,
    config: C,
}

impl<C: ConfigProvider> GeocodePipeline<GoogleGeocoder, C> {
    pub fn from_config(config: C) -> Result<Self> {
        let geocoder = GoogleGeocoder::new(config.geocode_endpoint(), config.request_timeout())?;
        Ok(Self::new(geocoder, config))
    }
}

impl<G: Geocoder + 'static, C: ConfigProvider> GeocodePipeline<G, C> {
    pub fn new(geocoder: G, config: C) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
            config,
        }
    }

    /// Runs at most `concurrent_requests` lookups at a time. Lookups start in row order
    /// and results are placed by row index, so completion order never reorders output.
    async fn geocode_all(&self, addresses: Vec<String>, api_key: &str) -> Result<Vec<GeocodeResult>> {
        let total = addresses.len();
        let policy = self.config.row_failure_policy();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests().max(1)));
        let api_key: Arc<str> = Arc::from(api_key);
        let mut tasks = JoinSet::new();

        for (index, address) in addresses.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| GeoError::WorkerError {
                    message: e.to_string(),
                })?;
            let geocoder = Arc::clone(&self.geocoder);
            let api_key = Arc::clone(&api_key);

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = geocoder.geocode(&address, &api_key).await;
                (index, address, outcome)
            });
        }

        let mut results = vec![GeocodeResult::NotFound; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, address, outcome) = joined.map_err(|e| GeoError::WorkerError {
                message: e.to_string(),
            })?;

            match outcome {
                Ok(result) => results[index] = result,
                Err(e) => match policy {
                    RowFailurePolicy::Degrade => {
                        tracing::warn!("Row {} ('{}') degraded to {}: {}", index + 1, address, NOT_AVAILABLE, e);
                    }
                    RowFailurePolicy::Abort => {
                        tracing::error!("Row {} ('{}') failed, aborting batch: {}", index + 1, address, e);
                        return Err(e);
                    }
                },
            }
        }

        Ok(results)
    }
}

#[async_trait::async_trait]
impl<G: Geocoder + 'static, C: ConfigProvider> Pipeline for GeocodePipeline<G, C> {
    async fn extract(&self, input: &[u8]) -> Result<AddressRowSet> {
        let rows = csv_codec::read_address_csv(input)?;
        tracing::debug!("Parsed {} rows with columns {:?}", rows.len(), rows.headers);
        Ok(rows)
    }

    async fn transform(&self, mut rows: AddressRowSet, api_key: &str) -> Result<AddressRowSet> {
        let addresses: Vec<String> = (0..rows.len()).map(|i| rows.full_address(i)).collect();

        tracing::debug!(
            "Geocoding {} addresses with up to {} concurrent requests",
            addresses.len(),
            self.config.concurrent_requests()
        );
        let results = self.geocode_all(addresses, api_key).await?;

        rows.apply_results(&results);
        Ok(rows)
    }

    async fn load(&self, rows: AddressRowSet) -> Result<ProcessedCsv> {
        let content = csv_codec::write_csv(&rows)?;
        let located = (0..rows.len())
            .filter(|&i| rows.value(i, LATITUDE_COLUMN) != Some(NOT_AVAILABLE))
            .count();

        Ok(ProcessedCsv {
            file_name: OUTPUT_FILE_NAME.to_string(),
            content,
            rows: rows.len(),
            located,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockConfig {
        concurrent_requests: usize,
        policy: RowFailurePolicy,
    }

    impl MockConfig {
        fn new(concurrent_requests: usize, policy: RowFailurePolicy) -> Self {
            Self {
                concurrent_requests,
                policy,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn geocode_endpoint(&self) -> &str {
            "http://test.invalid/json"
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn row_failure_policy(&self) -> RowFailurePolicy {
            self.policy
        }
    }

    /// Answers from a fixed table; unknown addresses fail. Earlier rows sleep longer so
    /// that concurrent lookups complete in reverse order.
    #[derive(Default)]
    struct MockGeocoder {
        answers: HashMap<String, GeocodeResult>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockGeocoder {
        fn with(answers: &[(&str, GeocodeResult)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(a, r)| (a.to_string(), *r))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Geocoder for MockGeocoder {
        async fn geocode(&self, address: &str, api_key: &str) -> Result<GeocodeResult> {
            assert_eq!(api_key, "key-123");
            self.calls.lock().unwrap().push(address.to_string());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay = 40u64.saturating_sub(self.calls.lock().unwrap().len() as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.answers
                .get(address)
                .copied()
                .ok_or_else(|| GeoError::GeocodeFailed {
                    address: address.to_string(),
                    reason: "connection reset".to_string(),
                })
        }
    }

    const INPUT: &str = "Id,Address,City,State,Country\n\
1,1 Main St,Springfield,IL,USA\n\
2,2 Elm St,Shelbyville,IL,USA\n\
3,3 Oak St,Capital City,IL,USA\n";

    fn located(latitude: f64, longitude: f64) -> GeocodeResult {
        GeocodeResult::Located {
            latitude,
            longitude,
        }
    }

    async fn run<G: Geocoder + 'static>(pipeline: &GeocodePipeline<G, MockConfig>) -> Result<ProcessedCsv> {
        let rows = pipeline.extract(INPUT.as_bytes()).await?;
        let rows = pipeline.transform(rows, "key-123").await?;
        pipeline.load(rows).await
    }

    #[tokio::test]
    async fn test_output_order_matches_input_under_concurrency() {
        let geocoder = MockGeocoder::with(&[
            ("1 Main St, Springfield, IL, USA", located(1.0, -1.0)),
            ("2 Elm St, Shelbyville, IL, USA", located(2.0, -2.0)),
            ("3 Oak St, Capital City, IL, USA", located(3.5, -3.5)),
        ]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(3, RowFailurePolicy::Degrade));

        let output = run(&pipeline).await.unwrap();

        assert_eq!(
            output.content,
            "Id,Address,City,State,Country,Latitude,Longitude\n\
1,1 Main St,Springfield,IL,USA,1,-1\n\
2,2 Elm St,Shelbyville,IL,USA,2,-2\n\
3,3 Oak St,Capital City,IL,USA,3.5,-3.5\n"
        );
        assert_eq!(output.rows, 3);
        assert_eq!(output.located, 3);
        assert_eq!(output.file_name, "processed.csv");
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let geocoder = MockGeocoder::with(&[]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(2, RowFailurePolicy::Degrade));

        run(&pipeline).await.unwrap();

        assert!(pipeline.geocoder.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(pipeline.geocoder.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_single_worker_calls_in_row_order() {
        let geocoder = MockGeocoder::with(&[]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(1, RowFailurePolicy::Degrade));

        run(&pipeline).await.unwrap();

        assert_eq!(
            *pipeline.geocoder.calls.lock().unwrap(),
            vec![
                "1 Main St, Springfield, IL, USA",
                "2 Elm St, Shelbyville, IL, USA",
                "3 Oak St, Capital City, IL, USA",
            ]
        );
        assert_eq!(pipeline.geocoder.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_row_failure_degrades_to_sentinel() {
        let geocoder = MockGeocoder::with(&[
            ("1 Main St, Springfield, IL, USA", located(1.0, -1.0)),
            ("3 Oak St, Capital City, IL, USA", GeocodeResult::NotFound),
        ]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(2, RowFailurePolicy::Degrade));

        let output = run(&pipeline).await.unwrap();

        let lines: Vec<&str> = output.content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "1,1 Main St,Springfield,IL,USA,1,-1");
        assert_eq!(lines[2], "2,2 Elm St,Shelbyville,IL,USA,N/A,N/A");
        assert_eq!(lines[3], "3,3 Oak St,Capital City,IL,USA,N/A,N/A");
        assert_eq!(output.located, 1);
    }

    #[tokio::test]
    async fn test_row_failure_aborts_under_abort_policy() {
        let geocoder = MockGeocoder::with(&[
            ("1 Main St, Springfield, IL, USA", located(1.0, -1.0)),
            ("3 Oak St, Capital City, IL, USA", located(3.0, -3.0)),
        ]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(1, RowFailurePolicy::Abort));

        let err = run(&pipeline).await.unwrap_err();
        assert!(matches!(err, GeoError::GeocodeFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_columns_make_no_calls() {
        let geocoder = MockGeocoder::with(&[]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(2, RowFailurePolicy::Degrade));

        let err = pipeline
            .extract(b"Address,City\n1 Main St,Springfield\n")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "CSV is missing required columns: State, Country");
        assert!(pipeline.geocoder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reprocessing_output_overwrites_coordinates() {
        let geocoder = MockGeocoder::with(&[
            ("1 Main St, Springfield, IL, USA", located(1.0, -1.0)),
            ("2 Elm St, Shelbyville, IL, USA", located(2.0, -2.0)),
            ("3 Oak St, Capital City, IL, USA", located(3.0, -3.0)),
        ]);
        let pipeline = GeocodePipeline::new(geocoder, MockConfig::new(3, RowFailurePolicy::Degrade));

        let first = run(&pipeline).await.unwrap();
        let rows = pipeline.extract(first.content.as_bytes()).await.unwrap();
        let rows = pipeline.transform(rows, "key-123").await.unwrap();
        let second = pipeline.load(rows).await.unwrap();

        assert_eq!(first.content, second.content);
    }
}
