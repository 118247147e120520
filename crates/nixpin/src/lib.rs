//! nixpin library
//!
//! Resolves PyPI package names into pinned descriptors for Nix
//! `buildPythonPackage` recipes, including:
//! - Latest version and sdist lookup through the PyPI JSON API
//! - SRI integrity hashes from published SHA-256 digests
//! - Build-system detection from the sdist's pyproject.toml
//! - Runtime dependency mapping from `requires_dist`
//!
//! Resolution is total: every failure degrades to a fallback descriptor
//! instead of an error.

pub mod archive;
pub mod build_system;
pub mod commands;
pub mod config;
pub mod hash;
pub mod registry;
pub mod resolver;
pub mod specifier;

pub use archive::{extract_member, ArchiveError};
pub use build_system::{BuildStrategy, BuildSystemParser, DEFAULT_BUILD_DEP};
pub use config::{ConfigError, ResolverConfig};
pub use hash::{sri_fragment, HashError, IntegrityHash, FALLBACK_HASH};
pub use registry::{LatestRelease, RegistryClient, RegistryError, SourceArtifact};
pub use resolver::{PackageResolution, Resolver};
pub use specifier::{AttrOverrides, Normalizer};
