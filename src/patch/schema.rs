use crate::rewrite::{MatchSpec, ReplacementRule};
use thiserror::Error;

/// A named, immutable set of ordered textual rewrites applied to matching
/// modules before they execute.
///
/// `find` is a cheap pre-filter deciding whether the replacements are
/// attempted at all. `None` means "attempt against every module", which is
/// permitted but discouraged: with no pre-filter the rules run against the
/// whole module graph at host startup.
#[derive(Debug)]
pub struct PatchDefinition {
    name: String,
    find: Option<MatchSpec>,
    replacements: Vec<ReplacementRule>,
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("patch is missing a name")]
    MissingName,

    #[error("patch '{name}' declares no replacement rules")]
    EmptyReplacements { name: String },

    #[error("patch '{name}' rule {rule} has an empty match")]
    EmptyMatch { name: String, rule: usize },

    #[error("patch '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

impl PatchDefinition {
    /// Build a definition, validating it the way registration requires:
    /// a non-empty name, at least one rule, no empty matchers.
    ///
    /// Regex syntax errors never reach this point - they surface when the
    /// [`MatchSpec`] or [`ReplacementRule`] is constructed, in the registering
    /// module's own error path.
    pub fn new(
        name: impl Into<String>,
        find: Option<MatchSpec>,
        replacements: Vec<ReplacementRule>,
    ) -> Result<Self, RegistrationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistrationError::MissingName);
        }
        if replacements.is_empty() {
            return Err(RegistrationError::EmptyReplacements { name });
        }
        for (rule, replacement) in replacements.iter().enumerate() {
            if let MatchSpec::Literal(needle) = &replacement.matcher {
                if needle.is_empty() {
                    return Err(RegistrationError::EmptyMatch { name, rule });
                }
            }
        }
        Ok(Self {
            name,
            find,
            replacements,
        })
    }

    pub fn builder(name: impl Into<String>) -> PatchBuilder {
        PatchBuilder {
            name: name.into(),
            find: None,
            replacements: Vec::new(),
            pattern_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find(&self) -> Option<&MatchSpec> {
        self.find.as_ref()
    }

    pub fn replacements(&self) -> &[ReplacementRule] {
        &self.replacements
    }

    /// True when `find` is absent or matches `source`.
    pub fn applies_to(&self, source: &str) -> bool {
        self.find.as_ref().map_or(true, |spec| spec.is_match(source))
    }
}

/// Fluent construction for programmatic patch registration.
///
/// Pattern syntax errors are deferred to [`PatchBuilder::build`], so feature
/// modules can chain rules without handling each `Result` separately.
pub struct PatchBuilder {
    name: String,
    find: Option<MatchSpec>,
    replacements: Vec<ReplacementRule>,
    pattern_error: Option<regex::Error>,
}

impl PatchBuilder {
    pub fn find_literal(mut self, needle: impl Into<String>) -> Self {
        self.find = Some(MatchSpec::literal(needle));
        self
    }

    pub fn find_pattern(mut self, pattern: &str) -> Self {
        match MatchSpec::pattern(pattern) {
            Ok(spec) => self.find = Some(spec),
            Err(err) => {
                self.pattern_error.get_or_insert(err);
            }
        }
        self
    }

    pub fn rule(mut self, rule: ReplacementRule) -> Self {
        self.replacements.push(rule);
        self
    }

    pub fn replace_literal(
        self,
        find: impl Into<String>,
        with: impl Into<String>,
    ) -> Self {
        self.rule(ReplacementRule::literal(find, with))
    }

    pub fn replace_pattern(mut self, pattern: &str, template: impl Into<String>) -> Self {
        match ReplacementRule::pattern(pattern, template) {
            Ok(rule) => self.replacements.push(rule),
            Err(err) => {
                self.pattern_error.get_or_insert(err);
            }
        }
        self
    }

    pub fn build(self) -> Result<PatchDefinition, RegistrationError> {
        if let Some(source) = self.pattern_error {
            return Err(RegistrationError::InvalidPattern {
                name: self.name,
                source,
            });
        }
        PatchDefinition::new(self.name, self.find, self.replacements)
    }
}
