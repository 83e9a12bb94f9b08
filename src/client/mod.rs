use crate::core::Storage;
use crate::utils::error::{GeoError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/geolocate";

/// The only failure text an uploader ever sees.
pub const GENERIC_FAILURE: &str = "Something went wrong while processing.";

/// Submits a CSV and an API key to the geolocate endpoint. One upload at a time.
pub struct UploadClient {
    client: Client,
    endpoint: String,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl UploadClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the processed CSV. Any non-2xx answer or transport error becomes
    /// [`GeoError::UploadFailed`] carrying [`GENERIC_FAILURE`].
    pub async fn submit(&self, api_key: &str, file_name: &str, csv: Vec<u8>) -> Result<Vec<u8>> {
        if api_key.is_empty() {
            return Err(GeoError::MissingInput);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(GeoError::Busy);
        }
        let _in_flight = InFlight(&self.in_flight);

        let part = Part::bytes(csv)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new()
            .part("file", part)
            .text("apiKey", api_key.to_string());

        tracing::debug!("Uploading {} to {}", file_name, self.endpoint);
        let response = match self.client.post(&self.endpoint).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Upload request failed: {}", e);
                return Err(generic_failure());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Upload rejected with HTTP {}", status);
            return Err(generic_failure());
        }

        match response.bytes().await {
            Ok(body) => Ok(body.to_vec()),
            Err(e) => {
                tracing::error!("Failed to read processed CSV: {}", e);
                Err(generic_failure())
            }
        }
    }

    /// Reads `input` from storage, uploads it and writes the answer to `output`.
    /// Returns the number of bytes written.
    pub async fn submit_file<S: Storage>(
        &self,
        storage: &S,
        api_key: &str,
        input: &str,
        output: &str,
    ) -> Result<usize> {
        if input.is_empty() {
            return Err(GeoError::MissingInput);
        }

        let csv = storage.read_file(input).await?;
        let file_name = std::path::Path::new(input)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();

        let processed = self.submit(api_key, &file_name, csv).await?;
        storage.write_file(output, &processed).await?;
        Ok(processed.len())
    }
}

fn generic_failure() -> GeoError {
    GeoError::UploadFailed {
        message: GENERIC_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_submit_returns_processed_csv() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/geolocate")
                .body_contains("name=\"apiKey\"")
                .body_contains("secret-key")
                .body_contains("name=\"file\"; filename=\"addresses.csv\"");
            then.status(200)
                .header("Content-Type", "text/csv")
                .body("Address,Latitude,Longitude\nx,1,2\n");
        });

        let client = UploadClient::new(server.url("/api/geolocate"));
        let body = client
            .submit("secret-key", "addresses.csv", b"Address\nx\n".to_vec())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(body, b"Address,Latitude,Longitude\nx,1,2\n");
        assert!(!client.is_processing());
    }

    #[tokio::test]
    async fn test_error_status_collapses_to_generic_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/geolocate");
            then.status(400).body("CSV is missing required columns: City");
        });

        let client = UploadClient::new(server.url("/api/geolocate"));
        let err = client
            .submit("k", "a.csv", b"Address\n".to_vec())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), format!("Upload failed: {}", GENERIC_FAILURE));
        assert!(!client.is_processing());
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/api/geolocate");
            then.status(200);
        });

        let client = UploadClient::new(server.url("/api/geolocate"));
        let err = client.submit("", "a.csv", b"x".to_vec()).await.unwrap_err();

        assert!(matches!(err, GeoError::MissingInput));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_refused() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/api/geolocate");
            then.status(200)
                .delay(Duration::from_millis(200))
                .body("ok");
        });

        let client = UploadClient::new(server.url("/api/geolocate"));
        let (first, second) = tokio::join!(
            client.submit("k", "a.csv", b"x".to_vec()),
            client.submit("k", "b.csv", b"y".to_vec()),
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(GeoError::Busy)));
        api_mock.assert_hits(1);
    }
}
