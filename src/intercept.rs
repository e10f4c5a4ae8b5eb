//! Module interception hook: the wrapper around the host's define-module
//! entry point.
//!
//! Every module's source text is routed through the patch pipeline before the
//! host factory compiles and executes it, and every successful factory result
//! is registered with the resolver. The host's invocation contract is
//! preserved for every module whether or not it was modified: the factory's
//! exports come back as-is, and a factory error propagates untouched.

use crate::host::{FactoryError, ModuleFactory, ModuleId};
use crate::patch::PatchRegistry;
use crate::pipeline::apply_patches;
use crate::resolve::Resolver;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

static HOOK_CLAIMED: AtomicBool = AtomicBool::new(false);

#[derive(Error, Debug)]
pub enum InterceptError {
    #[error("a module interception hook is already installed in this process")]
    AlreadyInstalled,
}

/// The installed wrapper. Holds its collaborators explicitly; the only global
/// state is the claim that exactly one process-wide hook exists.
pub struct InterceptHook {
    registry: Arc<PatchRegistry>,
    resolver: Arc<Resolver>,
}

impl InterceptHook {
    /// Claim the process-wide define-module wrapper.
    ///
    /// Succeeds at most once per process; the claim is irreversible within a
    /// run (there is no uninstall path). Interception starts with the first
    /// `define_module` call after this returns.
    pub fn install(
        registry: Arc<PatchRegistry>,
        resolver: Arc<Resolver>,
    ) -> Result<Self, InterceptError> {
        if HOOK_CLAIMED.swap(true, Ordering::SeqCst) {
            return Err(InterceptError::AlreadyInstalled);
        }
        debug!(patches = registry.len(), "module interception hook installed");
        Ok(Self::new(registry, resolver))
    }

    /// Build a hook without claiming the process-wide slot, for embedders
    /// running several isolated module graphs side by side.
    pub fn new(registry: Arc<PatchRegistry>, resolver: Arc<Resolver>) -> Self {
        Self { registry, resolver }
    }

    /// Intercept one module definition.
    ///
    /// Rewrites the source through the registered patches, hands the result
    /// to the host factory, and on success indexes the exports (fulfilling
    /// pending capability waits). A factory failure is fatal for this one
    /// module only: the error is the host's, and no exports are registered.
    pub fn define_module<F: ModuleFactory + ?Sized>(
        &self,
        id: ModuleId,
        source: &str,
        factory: &mut F,
    ) -> Result<Arc<Value>, FactoryError> {
        let patched = apply_patches(&self.registry.definitions(), &id, source);

        let exports = factory.instantiate(&id, &patched.text).map_err(|err| {
            warn!(
                module = %id,
                modified = patched.modified(),
                error = %err,
                "module factory failed; skipping registration"
            );
            err
        })?;

        Ok(self.resolver.register(id, exports))
    }

    pub fn registry(&self) -> &Arc<PatchRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }
}
