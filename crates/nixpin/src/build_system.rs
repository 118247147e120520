//! Build-system detection from pyproject.toml
//!
//! Two detection strategies exist: the explicit `requires = [...]` list of
//! the `[build-system]` table, or the single `build-backend` string mapped
//! through known backend families. Both degrade to [`DEFAULT_BUILD_DEP`].

use crate::specifier::Normalizer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conservative build tool used whenever detection misses
pub const DEFAULT_BUILD_DEP: &str = "setuptools";

/// Backend families, first substring match wins
const BACKEND_FAMILIES: &[(&str, &str)] = &[
    ("hatchling", "hatchling"),
    ("flit_core", "flit-core"),
    ("poetry", "poetry-core"),
    ("pdm", "pdm-backend"),
    ("maturin", "maturin"),
    ("scikit_build_core", "scikit-build-core"),
    ("mesonpy", "meson-python"),
    ("setuptools", "setuptools"),
];

// Textual fallbacks for documents that are not valid TOML. The section body
// runs until the next line opening a table header.
static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^\s*\[build-system\][^\n]*\n(.*?)(?:^\s*\[|\z)")
        .expect("valid build-system section regex")
});

static REQUIRES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^\s*requires\s*=\s*\[(.*?)\]\s*(?:#[^\n]*)?$")
        .expect("valid requires regex")
});

static BACKEND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*build-backend\s*=\s*['"]([^'"]+)['"]"#)
        .expect("valid build-backend regex")
});

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("valid quoted string regex"));

/// Which part of `[build-system]` drives detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    /// Every entry of `requires = [...]`
    #[default]
    Requires,
    /// The family of `build-backend`
    Backend,
}

impl FromStr for BuildStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requires" => Ok(BuildStrategy::Requires),
            "backend" => Ok(BuildStrategy::Backend),
            other => Err(format!(
                "unknown build strategy {other:?} (expected \"requires\" or \"backend\")"
            )),
        }
    }
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStrategy::Requires => write!(f, "requires"),
            BuildStrategy::Backend => write!(f, "backend"),
        }
    }
}

/// Raw `[build-system]` contents
#[derive(Debug, Default, PartialEq, Eq)]
struct BuildSystemSection {
    requires: Option<Vec<String>>,
    backend: Option<String>,
}

impl BuildSystemSection {
    /// Read the section, or `None` if the document has none
    fn read(text: &str) -> Option<Self> {
        match text.parse::<toml::Table>() {
            Ok(doc) => Self::from_table(&doc),
            Err(_) => Self::scan(text),
        }
    }

    fn from_table(doc: &toml::Table) -> Option<Self> {
        let section = doc.get("build-system")?.as_table()?;
        let requires = section.get("requires").and_then(|v| v.as_array()).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect()
        });
        let backend = section
            .get("build-backend")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Some(Self { requires, backend })
    }

    fn scan(text: &str) -> Option<Self> {
        let body = SECTION_RE.captures(text)?.get(1)?.as_str();
        let requires = REQUIRES_RE.captures(body).map(|caps| {
            QUOTED_RE
                .captures_iter(&caps[1])
                .map(|q| q[1].to_string())
                .collect()
        });
        let backend = BACKEND_RE.captures(body).map(|caps| caps[1].to_string());
        Some(Self { requires, backend })
    }
}

/// Map a raw backend identifier to a nixpkgs attribute
pub fn backend_attr(backend: &str) -> &'static str {
    BACKEND_FAMILIES
        .iter()
        .find(|(needle, _)| backend.contains(needle))
        .map(|(_, attr)| *attr)
        .unwrap_or(DEFAULT_BUILD_DEP)
}

/// Extracts build-time dependencies from pyproject.toml text
#[derive(Debug, Clone, Default)]
pub struct BuildSystemParser {
    strategy: BuildStrategy,
    normalizer: Normalizer,
}

impl BuildSystemParser {
    pub fn new(strategy: BuildStrategy, normalizer: Normalizer) -> Self {
        Self {
            strategy,
            normalizer,
        }
    }

    pub fn strategy(&self) -> BuildStrategy {
        self.strategy
    }

    /// Build dependencies according to the configured strategy; never empty
    pub fn detect(&self, text: &str) -> Vec<String> {
        match self.strategy {
            BuildStrategy::Requires => self.build_requirements(text),
            BuildStrategy::Backend => {
                let backend = self.build_backend(text).unwrap_or_default();
                vec![backend_attr(&backend).to_string()]
            }
        }
    }

    /// Normalized entries of `[build-system] requires`
    ///
    /// Falls back to `["setuptools"]` when the section or list is missing or
    /// names nothing.
    pub fn build_requirements(&self, text: &str) -> Vec<String> {
        let deps: Vec<String> = BuildSystemSection::read(text)
            .and_then(|section| section.requires)
            .unwrap_or_default()
            .iter()
            .filter_map(|spec| self.normalizer.normalize(spec))
            .collect();

        if deps.is_empty() {
            default_build_deps()
        } else {
            deps
        }
    }

    /// Raw `[build-system] build-backend` value
    pub fn build_backend(&self, text: &str) -> Option<String> {
        BuildSystemSection::read(text).and_then(|section| section.backend)
    }
}

/// The single-element fallback build dependency list
pub fn default_build_deps() -> Vec<String> {
    vec![DEFAULT_BUILD_DEP.to_string()]
}
