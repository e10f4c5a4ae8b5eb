//! Declarative patch manifests.
//!
//! Feature modules can ship their patches as TOML instead of building
//! definitions in code. A manifest is parsed and shape-checked here; regex
//! compilation happens when the manifest is registered, so pattern errors are
//! still charged to the supplying module.

use crate::patch::schema::{PatchDefinition, RegistrationError};
use crate::rewrite::{MatchSpec, ReplaceSpec, ReplacementRule};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Manifest {
    #[serde(default)]
    pub meta: ManifestMeta,
    #[serde(default)]
    pub patches: Vec<RawPatch>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ManifestMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Semver range of host versions this manifest targets.
    #[serde(default)]
    pub host_range: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawPatch {
    pub name: String,
    /// Pre-filter pattern. Regex unless `find_literal` is set.
    #[serde(default)]
    pub find: Option<String>,
    #[serde(default)]
    pub find_literal: bool,
    pub replacements: Vec<RawReplacement>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawReplacement {
    /// Match pattern. Regex unless `literal` is set.
    #[serde(rename = "match")]
    pub matcher: String,
    #[serde(default)]
    pub literal: bool,
    /// Replacement text; `$n` / `${name}` backreferences for regex matches.
    pub replace: String,
    /// Rewrite every occurrence instead of the first only.
    #[serde(default)]
    pub all: bool,
}

impl RawPatch {
    /// Compile the raw shape into a validated definition.
    pub fn compile(&self) -> Result<PatchDefinition, RegistrationError> {
        let find = match &self.find {
            None => None,
            Some(text) if self.find_literal => Some(MatchSpec::literal(text.clone())),
            Some(pattern) => Some(MatchSpec::pattern(pattern).map_err(|source| {
                RegistrationError::InvalidPattern {
                    name: self.name.clone(),
                    source,
                }
            })?),
        };

        let mut replacements = Vec::with_capacity(self.replacements.len());
        for raw in &self.replacements {
            let matcher = if raw.literal {
                MatchSpec::literal(raw.matcher.clone())
            } else {
                MatchSpec::pattern(&raw.matcher).map_err(|source| {
                    RegistrationError::InvalidPattern {
                        name: self.name.clone(),
                        source,
                    }
                })?
            };
            let mut rule =
                ReplacementRule::new(matcher, ReplaceSpec::Template(raw.replace.clone()));
            if raw.all {
                rule = rule.global();
            }
            replacements.push(rule);
        }

        PatchDefinition::new(self.name.clone(), find, replacements)
    }
}

impl Manifest {
    /// Compile every patch in declaration order.
    pub fn compile(&self) -> Result<Vec<PatchDefinition>, RegistrationError> {
        self.patches.iter().map(RawPatch::compile).collect()
    }
}

#[derive(Debug)]
pub enum ManifestError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Empty {
        path: Option<PathBuf>,
    },
}

impl ManifestError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ManifestError::Toml { path: None, source } => ManifestError::Toml {
                path: Some(path),
                source,
            },
            ManifestError::Empty { path: None } => ManifestError::Empty { path: Some(path) },
            other => other,
        }
    }
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io { path, source } => {
                write!(
                    f,
                    "failed to read patch manifest from {}: {}",
                    path.display(),
                    source
                )
            }
            ManifestError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse patch manifest ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse patch manifest: {}", source),
            },
            ManifestError::Empty { path } => match path {
                Some(path) => write!(f, "patch manifest ({}) contains no patches", path.display()),
                None => write!(f, "patch manifest contains no patches"),
            },
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Io { source, .. } => Some(source),
            ManifestError::Toml { source, .. } => Some(source),
            ManifestError::Empty { .. } => None,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<Manifest, ManifestError> {
    let manifest: Manifest = toml_edit::de::from_str(input)
        .map_err(|source| ManifestError::Toml { path: None, source })?;
    if manifest.patches.is_empty() {
        return Err(ManifestError::Empty { path: None });
    }
    Ok(manifest)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}
