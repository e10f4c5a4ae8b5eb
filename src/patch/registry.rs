use crate::patch::manifest::Manifest;
use crate::patch::schema::{PatchDefinition, RegistrationError};
use crate::patch::version::{host_in_range, HostVersionError};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// Ordered, append-only collection of patch definitions.
///
/// Registration order is application order: the pipeline walks the registry
/// front to back and later patches see earlier patches' output. There is no
/// de-duplication and no reordering. Registering after interception has begun
/// is permitted; the new patch only affects modules defined afterward, since
/// nothing is ever re-patched retroactively.
#[derive(Debug, Default)]
pub struct PatchRegistry {
    definitions: RwLock<Vec<Arc<PatchDefinition>>>,
}

/// What registering a manifest did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ManifestOutcome should be checked for skipped manifests"]
pub enum ManifestOutcome {
    /// All of the manifest's patches were appended.
    Registered { count: usize },
    /// The host version is outside the manifest's declared range.
    SkippedVersion { reason: String },
}

#[derive(Error, Debug)]
pub enum ManifestRegistrationError {
    #[error(transparent)]
    Version(#[from] HostVersionError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl PatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one definition; returns the shared handle the pipeline will see.
    pub fn register(&self, definition: PatchDefinition) -> Arc<PatchDefinition> {
        let definition = Arc::new(definition);
        let mut definitions = self
            .definitions
            .write()
            .expect("patch registry lock poisoned");
        definitions.push(Arc::clone(&definition));
        debug!(patch = %definition.name(), total = definitions.len(), "patch registered");
        definition
    }

    /// Compile a manifest and append its patches in declaration order, unless
    /// the host version falls outside the manifest's declared range.
    ///
    /// Compilation is all-or-nothing: a single bad pattern rejects the whole
    /// manifest, so a partially registered patch set never half-applies.
    pub fn register_manifest(
        &self,
        manifest: &Manifest,
        host_version: &str,
    ) -> Result<ManifestOutcome, ManifestRegistrationError> {
        if !host_in_range(host_version, manifest.meta.host_range.as_deref())? {
            let range = manifest.meta.host_range.as_deref().unwrap_or_default();
            let reason = format!(
                "host version {host_version} does not satisfy manifest host_range {range}"
            );
            debug!(manifest = %manifest.meta.name, %reason, "manifest skipped");
            return Ok(ManifestOutcome::SkippedVersion { reason });
        }

        let compiled = manifest.compile()?;
        let count = compiled.len();
        for definition in compiled {
            self.register(definition);
        }
        Ok(ManifestOutcome::Registered { count })
    }

    /// Ordered snapshot for pipeline consumption.
    pub fn definitions(&self) -> Vec<Arc<PatchDefinition>> {
        self.definitions
            .read()
            .expect("patch registry lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.definitions
            .read()
            .expect("patch registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
