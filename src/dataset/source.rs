use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;

use super::error::{DatasetError, DatasetResult};

/// Where dataset payloads come from
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the raw (still compressed) bytes stored at `path`
    async fn fetch(&self, path: &str) -> DatasetResult<Vec<u8>>;

    /// Human-readable location, used in log lines
    fn describe(&self) -> String;
}

/// Static asset host reached over HTTP
pub struct HttpSource {
    base_url: String,
    client: Client,
}

impl HttpSource {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("nudgeboard-dataset-loader/0.1.0")
            .build()
            .context("failed to build HTTP client for dataset loading")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn fetch(&self, path: &str) -> DatasetResult<Vec<u8>> {
        let url = self.url_for(path);
        let fetch_error = |e: reqwest::Error| DatasetError::Fetch {
            path: url.clone(),
            source: e.into(),
        };

        let response = self.client.get(&url).send().await.map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DatasetError::Status {
                path: url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Dataset files on the local filesystem
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DatasetSource for DirectorySource {
    async fn fetch(&self, path: &str) -> DatasetResult<Vec<u8>> {
        let file_path = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read(&file_path)
            .await
            .map_err(|e| DatasetError::Fetch {
                path: file_path.display().to_string(),
                source: e.into(),
            })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_source_joins_paths() {
        let source = HttpSource::new("https://assets.example.com/").unwrap();
        assert_eq!(
            source.url_for("/data/act.json.gz"),
            "https://assets.example.com/data/act.json.gz"
        );
        assert_eq!(
            source.url_for("data/act.json.gz"),
            "https://assets.example.com/data/act.json.gz"
        );
    }

    #[tokio::test]
    async fn directory_source_reports_missing_files() {
        let source = DirectorySource::new(std::env::temp_dir().join("nudgeboard-missing-dir"));
        let err = source.fetch("data/none.json.gz").await.unwrap_err();
        assert!(matches!(err, DatasetError::Fetch { .. }));
    }
}
