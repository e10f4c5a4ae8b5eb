//! Modgraft: runtime patch injection for bundled module graphs
//!
//! A patch engine and module resolution layer for applications built on a
//! bundled, minified module graph the embedder does not control. Source-level
//! text transformations are applied to selected module bodies before they
//! execute, and a capability index lets dependents locate live modules by
//! what their exports can do rather than by id.
//!
//! # Architecture
//!
//! Rewriting is a single pure primitive: [`rewrite::apply_rule`], one rule in,
//! text out. Patch definitions compose rules in order; the pipeline applies
//! definitions in registration order with per-patch rollback; the interception
//! hook wires the pipeline in front of the host's module factory; the resolver
//! serves capability lookups and event-driven waits over everything that has
//! loaded.
//!
//! # Fail-soft
//!
//! Matching against semi-obfuscated code the crate's users do not control is
//! inherently brittle, so failure is isolated to the smallest unit that caused
//! it: a rule that misses is a no-op, a rule that errors rolls back its patch,
//! a failed patch never blocks other patches or a module's load, and a failed
//! module never blocks other modules.
//!
//! # Example
//!
//! ```
//! use modgraft::{apply_patches, ModuleId, PatchDefinition};
//! use std::sync::Arc;
//!
//! let patch = PatchDefinition::builder("rename-constant")
//!     .find_literal("FOO_BAR")
//!     .replace_pattern("FOO_BAR", "BAZ_QUX")
//!     .build()
//!     .unwrap();
//!
//! let result = apply_patches(&[Arc::new(patch)], &ModuleId::from(42), "const x = FOO_BAR;");
//! assert_eq!(result.text, "const x = BAZ_QUX;");
//! ```

pub mod host;
pub mod index;
pub mod intercept;
pub mod patch;
pub mod pipeline;
pub mod predicate;
pub mod resolve;
pub mod rewrite;

// Re-exports
pub use host::{FactoryError, ModuleFactory, ModuleId};
pub use index::{ModuleIndex, ModuleRecord};
pub use intercept::{InterceptError, InterceptHook};
pub use patch::{
    load_from_path, load_from_str, Manifest, ManifestError, ManifestOutcome,
    ManifestRegistrationError, PatchBuilder, PatchDefinition, PatchRegistry, RegistrationError,
};
pub use pipeline::{apply_patches, PatchOutcome, PatchedModule};
pub use predicate::{any_of, by_prop_values, by_props, custom, CapabilityPredicate};
pub use resolve::{ResolveError, Resolver, WaitOptions};
pub use rewrite::{
    apply_rule, MatchSpec, MatchedGroups, ReplaceSpec, ReplacementRule, RewriteError,
};
