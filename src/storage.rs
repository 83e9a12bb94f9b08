use crate::core::pipeline::OUTPUT_FILE_NAME;
use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

const PARTIAL_SUFFIX: &str = "part";

/// CSV files under a root directory. Writes land in a sibling `.part` file first and
/// are renamed into place, so a reader never sees half of a processed CSV.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

/// `processed.csv` in the directory that holds `input`.
pub fn default_output_for(input: &str) -> String {
    Path::new(input)
        .with_file_name(OUTPUT_FILE_NAME)
        .to_string_lossy()
        .into_owned()
}

impl Storage for FileStore {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        let data = fs::read(&full_path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), full_path.display());
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = full_path.with_extension(match full_path.extension() {
            Some(ext) => format!("{}.{}", ext.to_string_lossy(), PARTIAL_SUFFIX),
            None => PARTIAL_SUFFIX.to_string(),
        });
        fs::write(&partial, data).await?;
        if let Err(e) = fs::rename(&partial, &full_path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }

        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}
