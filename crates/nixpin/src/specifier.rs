//! Dependency specifier normalization
//!
//! Maps PEP 508 specifiers (`httpx>=0.27`, `pydantic[email]>=2`) to nixpkgs
//! Python attribute names.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Leading package name of a specifier; the name is always the first token
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+").expect("valid specifier name regex"));

/// Built-in override table
static BUILTIN_OVERRIDES: Lazy<Arc<AttrOverrides>> = Lazy::new(|| {
    Arc::new(AttrOverrides::from_pairs([
        ("setuptools", "setuptools"),
        ("setuptools-scm", "setuptools-scm"),
        ("wheel", "wheel"),
        ("hatchling", "hatchling"),
        ("hatch-vcs", "hatch-vcs"),
        ("flit-core", "flit-core"),
        ("poetry-core", "poetry-core"),
        ("pdm-backend", "pdm-backend"),
        ("maturin", "maturin"),
        ("scikit-build-core", "scikit-build-core"),
        ("cython", "cython"),
        ("ninja", "ninja"),
        ("opencv-python", "opencv4"),
        ("opencv-python-headless", "opencv4"),
        ("pyyaml", "pyyaml"),
        ("tensorflow-cpu", "tensorflow"),
    ]))
});

/// Lowercase a PyPI name and replace underscores with hyphens
fn canonicalize(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// PyPI name -> nixpkgs attribute exceptions
///
/// Keys are stored canonicalized, so lookups ignore case and `_`/`-`
/// differences. A table is never mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrOverrides {
    entries: HashMap<String, String>,
}

impl AttrOverrides {
    /// Build a table from (PyPI name, attribute) pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (canonicalize(k.as_ref()), v.into()))
            .collect();
        Self { entries }
    }

    /// The shared built-in table
    pub fn builtin() -> Arc<AttrOverrides> {
        Arc::clone(&BUILTIN_OVERRIDES)
    }

    /// A new table with `extra` layered over this one
    pub fn with_extra(&self, extra: &HashMap<String, String>) -> Self {
        let mut entries = self.entries.clone();
        for (name, attr) in extra {
            entries.insert(canonicalize(name), attr.clone());
        }
        Self { entries }
    }

    /// Look up a canonicalized name
    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.entries.get(canonical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Specifier to attribute normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    overrides: Arc<AttrOverrides>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(AttrOverrides::builtin())
    }
}

impl Normalizer {
    pub fn new(overrides: Arc<AttrOverrides>) -> Self {
        Self { overrides }
    }

    /// Normalizer over the built-in table plus `extra`
    pub fn with_extra(extra: &HashMap<String, String>) -> Self {
        if extra.is_empty() {
            Self::default()
        } else {
            Self::new(Arc::new(AttrOverrides::builtin().with_extra(extra)))
        }
    }

    /// Normalize a single specifier
    ///
    /// Returns `None` when the specifier does not start with a package name.
    /// Version constraints, extras and markers are discarded.
    pub fn normalize(&self, specifier: &str) -> Option<String> {
        let name = NAME_RE.find(specifier.trim_start())?.as_str();
        let canonical = canonicalize(name);
        match self.overrides.get(&canonical) {
            Some(attr) => Some(attr.to_string()),
            None => Some(canonical),
        }
    }

    /// Normalize a `requires_dist` list into unconditional runtime attributes
    ///
    /// Entries with an environment marker (`; python_version < "3.11"`,
    /// `; extra == "socks"`) are dropped entirely.
    pub fn runtime_deps<S: AsRef<str>>(&self, specifiers: &[S]) -> Vec<String> {
        specifiers
            .iter()
            .map(AsRef::as_ref)
            .filter(|spec| !spec.contains(';'))
            .filter_map(|spec| self.normalize(spec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_version_constraints() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("Flask>=2.0").as_deref(), Some("flask"));
        assert_eq!(n.normalize("httpx ~= 0.27").as_deref(), Some("httpx"));
        assert_eq!(n.normalize("numpy").as_deref(), Some("numpy"));
    }

    #[test]
    fn test_strips_extras() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("Pydantic[email]>=2").as_deref(), Some("pydantic"));
    }

    #[test]
    fn test_underscores_become_hyphens() {
        let n = Normalizer::default();
        assert_eq!(
            n.normalize("typing_extensions>=4").as_deref(),
            Some("typing-extensions")
        );
        assert_eq!(n.normalize("zope.interface").as_deref(), Some("zope.interface"));
    }

    #[test]
    fn test_override_ignores_case() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("OpenCV_Python>=4").as_deref(), Some("opencv4"));
        assert_eq!(n.normalize("Hatchling").as_deref(), Some("hatchling"));
        assert_eq!(n.normalize("scikit_build_core").as_deref(), Some("scikit-build-core"));
    }

    #[test]
    fn test_no_leading_name() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(""), None);
        assert_eq!(n.normalize(">=1.0"), None);
    }

    #[test]
    fn test_runtime_deps_drop_markers() {
        let n = Normalizer::default();
        let specs = vec![
            "requests>=2".to_string(),
            "foo; sys_platform=='win32'".to_string(),
            "PySocks!=1.5.7,>=1.5.6; extra == \"socks\"".to_string(),
            "Typing_Extensions".to_string(),
        ];
        assert_eq!(n.runtime_deps(&specs), vec!["requests", "typing-extensions"]);
    }

    #[test]
    fn test_runtime_deps_empty() {
        let n = Normalizer::default();
        let specs: Vec<String> = vec![];
        assert!(n.runtime_deps(&specs).is_empty());
    }

    #[test]
    fn test_extra_overrides_layer_over_builtin() {
        let mut extra = HashMap::new();
        extra.insert("Torch".to_string(), "torchWithCuda".to_string());
        let table = AttrOverrides::builtin().with_extra(&extra);
        assert_eq!(table.len(), AttrOverrides::builtin().len() + 1);

        let n = Normalizer::new(Arc::new(table));
        assert_eq!(n.normalize("torch>=2").as_deref(), Some("torchWithCuda"));
        assert_eq!(n.normalize("hatchling").as_deref(), Some("hatchling"));
    }
}
