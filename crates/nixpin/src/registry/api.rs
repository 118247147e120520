//! Registry API types
//!
//! Response types for the PyPI JSON API (`GET /pypi/{name}/json`).

use serde::{Deserialize, Serialize};

/// Packaging kind of a source distribution
pub const SDIST: &str = "sdist";

/// Response from GET /pypi/{name}/json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResponse {
    /// Project metadata for the latest release
    pub info: ProjectInfo,

    /// Files published for the latest release
    #[serde(default)]
    pub urls: Vec<ReleaseFile>,
}

/// The `info` object of a release response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Canonical project name as displayed by PyPI
    pub name: String,

    /// Latest version
    pub version: String,

    /// PEP 508 dependency specifiers; PyPI sends `null` when there are none
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_python: Option<String>,
}

/// A distributable file of a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseFile {
    /// `sdist`, `bdist_wheel`, ...
    pub packagetype: String,

    /// Download URL
    pub url: String,

    /// Content digests keyed by algorithm
    #[serde(default)]
    pub digests: ReleaseFileDigests,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Digest map of a release file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseFileDigests {
    /// Hex SHA-256; empty if PyPI did not send one
    #[serde(default)]
    pub sha256: String,
}

impl ReleaseResponse {
    /// First file published as a source distribution
    pub fn sdist(&self) -> Option<&ReleaseFile> {
        self.urls.iter().find(|file| file.packagetype == SDIST)
    }
}
