//! Normalize command
//!
//! Prints the nixpkgs attribute for each dependency specifier.

use crate::specifier::Normalizer;
use std::io::{self, Write};

/// Placeholder printed for specifiers that map to nothing
const DROPPED: &str = "-";

/// Write `spec -> attr` for every specifier
///
/// With `runtime`, specifiers carrying an environment marker are shown as
/// dropped, matching how `requires_dist` entries are treated.
pub fn normalize_specifiers<W: Write>(
    normalizer: &Normalizer,
    specifiers: &[String],
    runtime: bool,
    out: &mut W,
) -> io::Result<()> {
    for spec in specifiers {
        let attr = if runtime {
            normalizer.runtime_deps(std::slice::from_ref(spec)).pop()
        } else {
            normalizer.normalize(spec)
        };
        writeln!(out, "{} -> {}", spec, attr.as_deref().unwrap_or(DROPPED))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(specs: &[&str], runtime: bool) -> String {
        let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        normalize_specifiers(&Normalizer::default(), &specs, runtime, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(
            run(&["Flask>=2.0", "foo; sys_platform=='win32'"], false),
            "Flask>=2.0 -> flask\nfoo; sys_platform=='win32' -> foo\n"
        );
    }

    #[test]
    fn test_runtime_drops_markers() {
        assert_eq!(
            run(&["Flask>=2.0", "foo; sys_platform=='win32'"], true),
            "Flask>=2.0 -> flask\nfoo; sys_platform=='win32' -> -\n"
        );
    }
}
