//! nixpin commands
//!
//! Implements the commands: resolve, normalize, inspect.

pub mod inspect;
pub mod normalize;
pub mod resolve;

pub use inspect::{inspect_sdist, InspectError, InspectReport};
pub use normalize::normalize_specifiers;
pub use resolve::{resolve_packages, OutputFormat, ResolveError, ResolveSummary};
