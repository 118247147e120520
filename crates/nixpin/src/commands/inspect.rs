//! Inspect command
//!
//! Detects build dependencies of a local sdist without touching the network.

use crate::archive::{extract_member, ArchiveError, MAX_MEMBER_SIZE};
use crate::build_system::{backend_attr, BuildSystemParser};
use crate::resolver::BUILD_CONFIG_MEMBER;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while inspecting an sdist
#[derive(Debug, Error)]
pub enum InspectError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Archive error
    #[error("Archive error: {0}")]
    ArchiveError(#[from] ArchiveError),
}

/// What an sdist declares about its build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    /// Normalized `[build-system] requires`
    pub requires: Vec<String>,

    /// Raw `build-backend`, if declared
    pub backend: Option<String>,

    /// Attribute for the backend family
    pub backend_attr: String,

    /// Result of the configured strategy
    pub detected: Vec<String>,
}

/// Read `path` as a `.tar.gz` sdist and report its build system
pub fn inspect_sdist<W: Write>(
    parser: &BuildSystemParser,
    path: &Path,
    out: &mut W,
) -> Result<InspectReport, InspectError> {
    let file = File::open(path)?;
    let content = extract_member(BufReader::new(file), BUILD_CONFIG_MEMBER, MAX_MEMBER_SIZE)?;
    let text = String::from_utf8_lossy(&content);

    let backend = parser.build_backend(&text);
    let report = InspectReport {
        requires: parser.build_requirements(&text),
        backend_attr: backend_attr(backend.as_deref().unwrap_or_default()).to_string(),
        backend,
        detected: parser.detect(&text),
    };

    writeln!(out, "requires: {}", report.requires.join(", "))?;
    writeln!(
        out,
        "backend:  {} ({})",
        report.backend.as_deref().unwrap_or("<none>"),
        report.backend_attr
    )?;
    writeln!(out, "build deps ({}): {}", parser.strategy(), report.detected.join(", "))?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_sdist(dir: &Path, pyproject: &str) -> std::path::PathBuf {
        let path = dir.join("demo-0.1.0.tar.gz");
        let encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(pyproject.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, "demo-0.1.0/pyproject.toml", pyproject.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_inspect_local_sdist() {
        let temp = TempDir::new().unwrap();
        let path = write_sdist(
            temp.path(),
            "[build-system]\nrequires = [\"poetry-core>=1.0\"]\nbuild-backend = \"poetry.core.masonry.api\"\n",
        );

        let mut out = Vec::new();
        let report = inspect_sdist(&BuildSystemParser::default(), &path, &mut out).unwrap();

        assert_eq!(report.requires, vec!["poetry-core"]);
        assert_eq!(report.backend.as_deref(), Some("poetry.core.masonry.api"));
        assert_eq!(report.backend_attr, "poetry-core");
        assert_eq!(report.detected, vec!["poetry-core"]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("build deps (requires): poetry-core"));
    }

    #[test]
    fn test_inspect_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = inspect_sdist(
            &BuildSystemParser::default(),
            &temp.path().join("missing.tar.gz"),
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(InspectError::IoError(_))));
    }
}
