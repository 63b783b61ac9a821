use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use url::Url;

use crate::error::LoadError;

/// Somewhere a dataset can be read from as text.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn location(&self) -> &str;
    async fn fetch_text(&self) -> Result<String, LoadError>;
}

pub struct FileSource {
    path: PathBuf,
    location: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = path.display().to_string();
        Self { path, location }
    }
}

#[async_trait]
impl DataSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch_text(&self) -> Result<String, LoadError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                location: self.location.clone(),
                source,
            })
    }
}

pub struct HttpSource {
    client: Client,
    url: Url,
    location: String,
}

impl HttpSource {
    pub fn new(client: Client, url: Url) -> Self {
        let location = url.to_string();
        Self {
            client,
            url,
            location,
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch_text(&self) -> Result<String, LoadError> {
        let wrap = |source: reqwest::Error| LoadError::Http {
            location: self.location.clone(),
            source,
        };
        self.client
            .get(self.url.clone())
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?
            .text()
            .await
            .map_err(wrap)
    }
}

/// Where a source location points, decided from its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    File(PathBuf),
    Http(Url),
}

impl SourceKind {
    /// `http://` and `https://` URLs are fetched over the network, `file://`
    /// URLs and anything without a scheme are read from disk.
    pub fn parse(location: &str) -> Result<Self, LoadError> {
        if !location.contains("://") {
            return Ok(SourceKind::File(PathBuf::from(location)));
        }
        let url = Url::parse(location).map_err(|e| LoadError::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(SourceKind::Http(url)),
            "file" => url
                .to_file_path()
                .map(SourceKind::File)
                .map_err(|_| LoadError::InvalidLocation {
                    location: location.to_string(),
                    reason: "file url has no local path".to_string(),
                }),
            other => Err(LoadError::InvalidLocation {
                location: location.to_string(),
                reason: format!("unsupported scheme {}", other),
            }),
        }
    }

    pub fn build(self, client: &Client) -> Box<dyn DataSource> {
        match self {
            SourceKind::File(path) => Box::new(FileSource::new(path)),
            SourceKind::Http(url) => Box::new(HttpSource::new(client.clone(), url)),
        }
    }
}

pub fn open_source(location: &str, client: &Client) -> Result<Box<dyn DataSource>, LoadError> {
    Ok(SourceKind::parse(location)?.build(client))
}
