//! Host-facing types: module identity, the factory seam, and host errors.
//!
//! The host application owns module compilation and execution. This crate only
//! sees "a module is about to run with source text T and id I" and "the module
//! produced exports E"; everything between those two points goes through the
//! [`ModuleFactory`] trait the embedder implements.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Opaque host-assigned module identifier.
///
/// Stable only within one process run. Consumers must never persist an id or
/// assume it survives a host update; capability predicates are the portable
/// lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ModuleId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Failure raised by the host while compiling or executing a module factory.
///
/// This is the host's error, not the engine's: the interception hook
/// propagates it untouched so the host's own error handling takes over for
/// that one module.
#[derive(Error, Debug)]
#[error("module factory failed for '{id}': {message}")]
pub struct FactoryError {
    pub id: ModuleId,
    pub message: String,
}

impl FactoryError {
    pub fn new(id: impl Into<ModuleId>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Compiles and executes a module's (possibly rewritten) source text.
///
/// Implemented by the embedding host. The factory must honor the host's
/// original invocation contract: the exports value it returns is exactly what
/// dependents of the module observe, and an `Err` carries the host's own
/// failure for that module.
pub trait ModuleFactory {
    fn instantiate(&mut self, id: &ModuleId, source: &str) -> Result<Value, FactoryError>;
}

impl<F> ModuleFactory for F
where
    F: FnMut(&ModuleId, &str) -> Result<Value, FactoryError>,
{
    fn instantiate(&mut self, id: &ModuleId, source: &str) -> Result<Value, FactoryError> {
        self(id, source)
    }
}
