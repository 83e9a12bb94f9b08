use crate::core::{Pipeline, ProcessedCsv};
use crate::utils::error::{GeoError, Result};

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Both inputs are checked before anything is parsed or sent to the provider.
    /// An empty API key counts as missing.
    pub async fn run(&self, file: Option<&[u8]>, api_key: Option<&str>) -> Result<ProcessedCsv> {
        let (file, api_key) = match (file, api_key) {
            (Some(file), Some(key)) if !key.is_empty() => (file, key),
            _ => return Err(GeoError::MissingInput),
        };

        // Extract
        tracing::debug!("Parsing upload ({} bytes)", file.len());
        let rows = self.pipeline.extract(file).await?;
        tracing::info!("Extracted {} address rows", rows.len());

        // Transform
        let rows = self.pipeline.transform(rows, api_key).await?;

        // Load
        let output = self.pipeline.load(rows).await?;
        tracing::info!(
            "Geocoded {}/{} rows into {}",
            output.located,
            output.rows,
            output.file_name
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AddressRowSet, ProcessedCsv};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPipeline {
        extracts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self, _input: &[u8]) -> Result<AddressRowSet> {
            self.extracts.fetch_add(1, Ordering::SeqCst);
            Ok(AddressRowSet::new(vec![], vec![]))
        }

        async fn transform(&self, rows: AddressRowSet, _api_key: &str) -> Result<AddressRowSet> {
            Ok(rows)
        }

        async fn load(&self, rows: AddressRowSet) -> Result<ProcessedCsv> {
            Ok(ProcessedCsv {
                file_name: "processed.csv".to_string(),
                content: String::new(),
                rows: rows.len(),
                located: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected_before_parsing() {
        let engine = EtlEngine::new(CountingPipeline::default());
        let err = engine.run(None, Some("key")).await.unwrap_err();
        assert!(matches!(err, GeoError::MissingInput));
        assert_eq!(engine.pipeline().extracts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_or_empty_key_is_rejected() {
        let engine = EtlEngine::new(CountingPipeline::default());
        assert!(matches!(
            engine.run(Some(b"a,b".as_slice()), None).await,
            Err(GeoError::MissingInput)
        ));
        assert!(matches!(
            engine.run(Some(b"a,b".as_slice()), Some("")).await,
            Err(GeoError::MissingInput)
        ));
        assert_eq!(engine.pipeline().extracts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_runs_all_phases() {
        let engine = EtlEngine::new(CountingPipeline::default());
        let output = engine.run(Some(b"".as_slice()), Some("key")).await.unwrap();
        assert_eq!(output.file_name, "processed.csv");
        assert_eq!(engine.pipeline().extracts.load(Ordering::SeqCst), 1);
    }
}
