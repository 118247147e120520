//! Registry HTTP client
//!
//! Provides a blocking HTTP client for the PyPI JSON API and for
//! downloading release files.

use super::api::ReleaseResponse;
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default registry URL
pub const DEFAULT_REGISTRY: &str = "https://pypi.org/pypi";

/// Maximum size of a downloaded release file (50 MB)
pub const MAX_ARCHIVE_SIZE: u64 = 50 * 1024 * 1024;

/// Total request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur during registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// HTTP request failed (connection, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    /// Package not found
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Latest release has no source distribution
    #[error("No sdist published for {package} {version}")]
    NoSourceArtifact { package: String, version: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error while reading a response body
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Content too large
    #[error("Content too large: {size} bytes (max: {max})")]
    ContentTooLarge { size: u64, max: u64 },
}

/// The source distribution chosen for a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifact {
    /// Download URL
    pub url: String,

    /// Hex SHA-256 as published by the registry
    pub sha256: String,
}

/// Latest release of a package, reduced to what resolution needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRelease {
    /// Canonical name as reported by the registry
    pub name: String,

    /// Latest version
    pub version: String,

    /// Raw `requires_dist` specifiers
    pub requires_dist: Vec<String>,

    /// Selected source distribution
    pub sdist: SourceArtifact,
}

/// Registry client for the PyPI JSON API
pub struct RegistryClient {
    /// HTTP client
    client: Client,

    /// Base URL for the registry
    base_url: String,

    /// Download size limit
    max_download: u64,
}

impl RegistryClient {
    /// Create a new registry client with default URL
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_url(DEFAULT_REGISTRY)
    }

    /// Create a new registry client with a custom URL
    pub fn with_url(base_url: &str) -> Result<Self, RegistryError> {
        Self::with_options(base_url, REQUEST_TIMEOUT, CONNECT_TIMEOUT, MAX_ARCHIVE_SIZE)
    }

    /// Create a registry client with explicit deadlines and download limit
    pub fn with_options(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
        max_download: u64,
    ) -> Result<Self, RegistryError> {
        Url::parse(base_url).map_err(|e| RegistryError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(format!("nixpin/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_download,
        })
    }

    /// Metadata URL for a package: `{base}/{name}/json`
    pub fn release_url(&self, name: &str) -> Result<Url, RegistryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(name)
            .push("json");
        Ok(url)
    }

    /// Get the raw release document of the latest version
    ///
    /// GET /{name}/json
    pub fn get_release(&self, name: &str) -> Result<ReleaseResponse, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::PackageNotFound(String::new()));
        }

        let url = self.release_url(name)?;
        tracing::trace!(%url, "fetching release metadata");
        let response = self.client.get(url.clone()).send()?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PackageNotFound(name.to_string()));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes()?;
        let release: ReleaseResponse = serde_json::from_slice(&body)?;
        Ok(release)
    }

    /// Latest version, its dependency specifiers, and its sdist
    pub fn fetch_latest(&self, name: &str) -> Result<LatestRelease, RegistryError> {
        let release = self.get_release(name)?;

        let sdist = release
            .sdist()
            .ok_or_else(|| RegistryError::NoSourceArtifact {
                package: release.info.name.clone(),
                version: release.info.version.clone(),
            })?;

        let sdist = SourceArtifact {
            url: sdist.url.clone(),
            sha256: sdist.digests.sha256.clone(),
        };

        Ok(LatestRelease {
            name: release.info.name,
            version: release.info.version,
            requires_dist: release.info.requires_dist.unwrap_or_default(),
            sdist,
        })
    }

    /// Download raw bytes from a URL
    pub fn download(&self, url: &str) -> Result<Vec<u8>, RegistryError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RegistryError::InvalidUrl(url.to_string()));
        }

        tracing::trace!(%url, "downloading release file");
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_download {
                return Err(RegistryError::ContentTooLarge {
                    size: len,
                    max: self.max_download,
                });
            }
        }

        let mut content = Vec::new();
        response
            .take(self.max_download + 1)
            .read_to_end(&mut content)?;

        if content.len() as u64 > self.max_download {
            return Err(RegistryError::ContentTooLarge {
                size: content.len() as u64,
                max: self.max_download,
            });
        }

        Ok(content)
    }
}
