//! Resolve command
//!
//! Resolves package names and prints the descriptors.

use crate::resolver::{PackageResolution, Resolver};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur while printing resolutions
#[derive(Debug, Error)]
pub enum ResolveError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// How resolutions are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line per package
    #[default]
    Text,
    /// A JSON array of descriptors
    Json,
}

/// Result of a resolve run
#[derive(Debug, Clone)]
pub struct ResolveSummary {
    /// All descriptors, in request order
    pub resolutions: Vec<PackageResolution>,
}

impl ResolveSummary {
    /// Names that fell back to the unpinned descriptor
    pub fn unresolved(&self) -> Vec<&str> {
        self.resolutions
            .iter()
            .filter(|r| !r.resolved)
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Render a descriptor as a single line
pub fn format_line(resolution: &PackageResolution) -> String {
    let version = if resolution.version.is_empty() {
        "<unresolved>"
    } else {
        resolution.version.as_str()
    };
    format!(
        "{} {} {} build=[{}] runtime=[{}]",
        resolution.name,
        version,
        resolution.hash_expression,
        resolution.build_deps.join(", "),
        resolution.runtime_deps.join(", ")
    )
}

/// Resolve `names` and write the descriptors to `out`
///
/// Degraded packages are not an error; inspect
/// [`ResolveSummary::unresolved`] to report them.
pub fn resolve_packages<W: Write>(
    resolver: &Resolver,
    names: &[String],
    format: OutputFormat,
    out: &mut W,
) -> Result<ResolveSummary, ResolveError> {
    let resolutions = resolver.resolve_all(names);

    match format {
        OutputFormat::Text => {
            for resolution in &resolutions {
                writeln!(out, "{}", format_line(resolution))?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &resolutions)?;
            writeln!(out)?;
        }
    }

    Ok(ResolveSummary { resolutions })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_resolved_line() {
        let resolution = PackageResolution {
            name: "Flask".to_string(),
            version: "3.0.3".to_string(),
            hash_expression: "\"sha256-qrvM\"".to_string(),
            build_deps: vec!["flit-core".to_string()],
            runtime_deps: vec!["werkzeug".to_string(), "jinja2".to_string()],
            resolved: true,
        };
        assert_eq!(
            format_line(&resolution),
            "Flask 3.0.3 \"sha256-qrvM\" build=[flit-core] runtime=[werkzeug, jinja2]"
        );
    }

    #[test]
    fn test_format_fallback_line() {
        let resolution = PackageResolution::fallback("nope");
        assert_eq!(
            format_line(&resolution),
            "nope <unresolved> pkgs.lib.fakeHash build=[setuptools] runtime=[]"
        );
    }

    #[test]
    fn test_summary_unresolved() {
        let mut ok = PackageResolution::fallback("ok");
        ok.resolved = true;
        let summary = ResolveSummary {
            resolutions: vec![ok, PackageResolution::fallback("bad")],
        };
        assert_eq!(summary.unresolved(), vec!["bad"]);
    }
}
