//! Patch definitions: schema and validation, the ordered registry, TOML
//! manifests, and host-version gating.

pub mod manifest;
pub mod registry;
pub mod schema;
pub mod version;

pub use manifest::{load_from_path, load_from_str, Manifest, ManifestError, ManifestMeta};
pub use registry::{ManifestOutcome, ManifestRegistrationError, PatchRegistry};
pub use schema::{PatchBuilder, PatchDefinition, RegistrationError};
pub use version::{host_in_range, HostVersionError};
