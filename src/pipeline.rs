//! Patch application pipeline: runs every registered patch over one module's
//! source, in registration order, with per-patch failure isolation.
//!
//! The pipeline itself never fails. A patch that errors is rolled back to the
//! text as it stood before that patch started, the failure is logged with
//! enough context to diagnose drift between host versions, and the remaining
//! patches still apply. The caller always gets usable text back - the original
//! source in the worst case.

use crate::host::ModuleId;
use crate::patch::PatchDefinition;
use crate::rewrite::apply_rule;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

/// Result of routing one module through the pipeline.
#[derive(Debug)]
pub struct PatchedModule {
    /// Final source text: original if nothing applied or everything failed.
    pub text: String,
    /// One outcome per registered patch, in registration order.
    pub outcomes: Vec<PatchOutcome>,
}

impl PatchedModule {
    /// True if any patch changed the text.
    pub fn modified(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, PatchOutcome::Applied { .. }))
    }
}

/// Per-patch outcome for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for failures"]
pub enum PatchOutcome {
    /// At least one rule changed the text.
    Applied { patch: String },
    /// The pre-filter matched but every rule no-opped (target already patched
    /// or absent in this host version).
    Unchanged { patch: String },
    /// The pre-filter did not match; replacements were never attempted.
    SkippedFilter { patch: String },
    /// A rule failed; the patch was rolled back and the module text is as if
    /// the patch never ran.
    Failed {
        patch: String,
        rule: usize,
        reason: String,
    },
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Applied { patch } => write!(f, "applied '{patch}'"),
            PatchOutcome::Unchanged { patch } => write!(f, "'{patch}' matched but changed nothing"),
            PatchOutcome::SkippedFilter { patch } => write!(f, "skipped '{patch}' (filter miss)"),
            PatchOutcome::Failed {
                patch,
                rule,
                reason,
            } => {
                write!(f, "'{patch}' failed at rule {rule}: {reason} (rolled back)")
            }
        }
    }
}

/// Apply the ordered definitions to one module's source text.
///
/// Each definition sees the accumulated output of the definitions before it;
/// within a definition, each rule sees the output of the previous rule. The
/// engine does not reorder and does not detect conflicts - patch authors own
/// their ordering.
pub fn apply_patches(
    definitions: &[Arc<PatchDefinition>],
    module: &ModuleId,
    source: &str,
) -> PatchedModule {
    let mut current = Cow::Borrowed(source);
    let mut outcomes = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if let Some(find) = definition.find() {
            if !find.is_match(&current) {
                outcomes.push(PatchOutcome::SkippedFilter {
                    patch: definition.name().to_string(),
                });
                continue;
            }
        } else {
            debug!(
                patch = %definition.name(),
                module = %module,
                "patch has no pre-filter; attempting against module"
            );
        }

        // Working copy doubles as the rollback snapshot: `current` is left
        // untouched until every rule of this patch has succeeded.
        let mut working = current.clone().into_owned();
        let mut changed = false;
        let mut failure = None;

        for (rule_index, rule) in definition.replacements().iter().enumerate() {
            let step = apply_rule(&working, rule).map(|cow| match cow {
                Cow::Borrowed(_) => None,
                Cow::Owned(next) => Some(next),
            });
            match step {
                Ok(Some(next)) => {
                    working = next;
                    changed = true;
                }
                Ok(None) => {}
                Err(err) => {
                    failure = Some((rule_index, err));
                    break;
                }
            }
        }

        match failure {
            Some((rule_index, err)) => {
                let fingerprint = format!("{:016x}", xxh3_64(source.as_bytes()));
                warn!(
                    patch = %definition.name(),
                    module = %module,
                    rule = rule_index,
                    error = %err,
                    source_fingerprint = %fingerprint,
                    "patch failed; rolled back, continuing with remaining patches"
                );
                outcomes.push(PatchOutcome::Failed {
                    patch: definition.name().to_string(),
                    rule: rule_index,
                    reason: err.to_string(),
                });
            }
            None if changed => {
                current = Cow::Owned(working);
                outcomes.push(PatchOutcome::Applied {
                    patch: definition.name().to_string(),
                });
            }
            None => {
                outcomes.push(PatchOutcome::Unchanged {
                    patch: definition.name().to_string(),
                });
            }
        }
    }

    PatchedModule {
        text: current.into_owned(),
        outcomes,
    }
}
