//! Pure text matching and replacement over module source.
//!
//! This is the engine's lowest layer: one rule in, rewritten text out, no host
//! dependency and no shared state, so every rule is testable against a plain
//! string. Patches targeting code the crate's users do not control are
//! expected to sometimes miss; a miss returns the input unchanged rather than
//! an error.

pub mod errors;
pub mod matcher;
pub mod replacer;

pub use errors::RewriteError;
pub use matcher::MatchSpec;
pub use replacer::{apply_rule, MatchedGroups, ReplaceFn, ReplaceSpec, ReplacementRule};
