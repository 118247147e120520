//! PyPI registry client
//!
//! Provides a blocking HTTP client for the PyPI JSON API.

mod api;
mod client;

pub use api::{ProjectInfo, ReleaseFile, ReleaseFileDigests, ReleaseResponse};
pub use client::{
    LatestRelease, RegistryClient, RegistryError, SourceArtifact, DEFAULT_REGISTRY,
    MAX_ARCHIVE_SIZE,
};
