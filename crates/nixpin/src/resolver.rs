//! Package resolution
//!
//! Turns a PyPI package name into a [`PackageResolution`]. Resolution never
//! fails: metadata or digest failures produce the fallback descriptor, and
//! build-metadata failures only reset `build_deps` to the default.

use crate::archive::{extract_member, ArchiveError, MAX_MEMBER_SIZE};
use crate::build_system::{default_build_deps, BuildSystemParser};
use crate::config::ResolverConfig;
use crate::hash::{sha256_hex, IntegrityHash, FALLBACK_HASH};
use crate::registry::{RegistryClient, RegistryError, SourceArtifact};
use crate::specifier::Normalizer;
use crossbeam::channel;
use serde::{Deserialize, Serialize};
use std::thread;
use thiserror::Error;

/// Build configuration file looked up inside an sdist
pub const BUILD_CONFIG_MEMBER: &str = "/pyproject.toml";

/// Resolved descriptor of a single package
///
/// Serializes to the flat key/value shape consumed by flake templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResolution {
    /// Registry name, or the requested name if resolution failed
    pub name: String,

    /// Latest version; empty if unresolved
    pub version: String,

    /// Quoted `"sha256-..."` literal, or `pkgs.lib.fakeHash`
    pub hash_expression: String,

    /// nixpkgs attributes needed at build time; never empty
    pub build_deps: Vec<String>,

    /// nixpkgs attributes propagated at runtime
    pub runtime_deps: Vec<String>,

    /// Whether version and hash were pinned
    pub resolved: bool,
}

impl PackageResolution {
    /// Descriptor used when the version or hash could not be pinned
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: String::new(),
            hash_expression: FALLBACK_HASH.to_string(),
            build_deps: default_build_deps(),
            runtime_deps: Vec::new(),
            resolved: false,
        }
    }
}

/// Failures of the best-effort build metadata stage
#[derive(Debug, Error)]
enum BuildMetadataError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Resolves package names against the registry
pub struct Resolver {
    client: RegistryClient,
    normalizer: Normalizer,
    parser: BuildSystemParser,
    verify_artifacts: bool,
    jobs: usize,
}

impl Resolver {
    /// Create a resolver from configuration
    pub fn new(config: &ResolverConfig) -> Result<Self, RegistryError> {
        let client = RegistryClient::with_options(
            &config.registry_url,
            config.timeout(),
            config.connect_timeout(),
            config.max_archive_bytes,
        )?;

        let normalizer = Normalizer::with_extra(&config.overrides);
        let parser = BuildSystemParser::new(config.build_strategy, normalizer.clone());

        Ok(Self {
            client,
            normalizer,
            parser,
            verify_artifacts: config.verify_artifacts,
            jobs: config.effective_jobs(),
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn parser(&self) -> &BuildSystemParser {
        &self.parser
    }

    /// Resolve a single package name
    pub fn resolve(&self, name: &str) -> PackageResolution {
        let release = match self.client.fetch_latest(name) {
            Ok(release) => release,
            Err(e) => {
                tracing::debug!(package = name, error = %e, "metadata lookup failed");
                return PackageResolution::fallback(name);
            }
        };
        if release.version.is_empty() {
            tracing::debug!(package = name, "registry reported an empty version");
            return PackageResolution::fallback(name);
        }

        let hash = match IntegrityHash::from_hex(&release.sdist.sha256) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!(package = name, error = %e, "unusable sdist digest");
                return PackageResolution::fallback(name);
            }
        };

        let build_deps = match self.detect_build_deps(&release.sdist) {
            Ok(deps) => deps,
            Err(e) => {
                tracing::debug!(
                    package = name,
                    url = %release.sdist.url,
                    error = %e,
                    "build metadata unavailable"
                );
                default_build_deps()
            }
        };

        let runtime_deps = self.normalizer.runtime_deps(&release.requires_dist);

        PackageResolution {
            name: release.name,
            version: release.version,
            hash_expression: hash.expression(),
            build_deps,
            runtime_deps,
            resolved: true,
        }
    }

    /// Resolve many names on a bounded worker pool
    ///
    /// Results are returned in input order.
    pub fn resolve_all<S: AsRef<str> + Sync>(&self, names: &[S]) -> Vec<PackageResolution> {
        let workers = self.jobs.min(names.len());
        if workers <= 1 {
            return names.iter().map(|n| self.resolve(n.as_ref())).collect();
        }

        let (job_tx, job_rx) = channel::bounded::<(usize, &str)>(names.len());
        let (done_tx, done_rx) = channel::unbounded::<(usize, PackageResolution)>();

        for (index, name) in names.iter().enumerate() {
            if job_tx.send((index, name.as_ref())).is_err() {
                break;
            }
        }
        drop(job_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                scope.spawn(move || {
                    for (index, name) in jobs.iter() {
                        if done.send((index, self.resolve(name))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(done_tx);

        let mut results: Vec<Option<PackageResolution>> = vec![None; names.len()];
        for (index, resolution) in done_rx.iter() {
            results[index] = Some(resolution);
        }

        results
            .into_iter()
            .zip(names)
            .map(|(resolution, name)| {
                resolution.unwrap_or_else(|| PackageResolution::fallback(name.as_ref()))
            })
            .collect()
    }

    /// Download the sdist and detect its build dependencies
    fn detect_build_deps(&self, sdist: &SourceArtifact) -> Result<Vec<String>, BuildMetadataError> {
        let bytes = self.client.download(&sdist.url)?;

        if self.verify_artifacts {
            let actual = sha256_hex(&bytes);
            if !actual.eq_ignore_ascii_case(&sdist.sha256) {
                return Err(BuildMetadataError::ChecksumMismatch {
                    expected: sdist.sha256.clone(),
                    actual,
                });
            }
        }

        let content = extract_member(&bytes[..], BUILD_CONFIG_MEMBER, MAX_MEMBER_SIZE)?;
        let text = String::from_utf8_lossy(&content);
        Ok(self.parser.detect(&text))
    }
}
