use crate::rewrite::errors::RewriteError;
use crate::rewrite::matcher::MatchSpec;
use regex::Captures;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// View of one matched occurrence handed to a [`ReplaceSpec::Func`] callback.
///
/// Group 0 is always the whole match. Literal matchers expose only group 0;
/// regex matchers expose every capture group by index, `None` for groups that
/// did not participate in the match.
#[derive(Debug)]
pub struct MatchedGroups<'t> {
    groups: Vec<Option<&'t str>>,
}

impl<'t> MatchedGroups<'t> {
    fn from_literal(whole: &'t str) -> Self {
        Self {
            groups: vec![Some(whole)],
        }
    }

    fn from_captures(caps: &Captures<'t>) -> Self {
        Self {
            groups: caps.iter().map(|m| m.map(|m| m.as_str())).collect(),
        }
    }

    /// The full matched text.
    pub fn whole(&self) -> &'t str {
        self.groups[0].expect("group 0 always participates")
    }

    /// Capture group by index; group 0 is the whole match.
    pub fn get(&self, index: usize) -> Option<&'t str> {
        self.groups.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pure replacement callback: matched groups in, replacement text out.
///
/// Must be synchronous and side-effect-free. An `Err` aborts the rule (and the
/// pipeline rolls the owning patch back); it never aborts the module load.
pub type ReplaceFn = Arc<dyn Fn(&MatchedGroups<'_>) -> anyhow::Result<String> + Send + Sync>;

/// What to put in place of a matched span.
#[derive(Clone)]
pub enum ReplaceSpec {
    /// Replacement text. For regex matchers, `$n` / `${name}` expand to
    /// capture groups; for literal matchers the text is inserted verbatim.
    Template(String),
    /// Pure function of the matched groups.
    Func(ReplaceFn),
}

impl fmt::Debug for ReplaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceSpec::Template(template) => f.debug_tuple("Template").field(template).finish(),
            ReplaceSpec::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// One ordered rewrite rule: a matcher, a replacement, and an occurrence mode.
///
/// `global = true` rewrites every occurrence; otherwise only the first, the
/// same split the host's module format applies to its own text replacement.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub matcher: MatchSpec,
    pub replace: ReplaceSpec,
    pub global: bool,
}

impl ReplacementRule {
    pub fn new(matcher: MatchSpec, replace: ReplaceSpec) -> Self {
        Self {
            matcher,
            replace,
            global: false,
        }
    }

    /// Literal substring match with a verbatim replacement.
    pub fn literal(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self::new(
            MatchSpec::literal(find),
            ReplaceSpec::Template(replace.into()),
        )
    }

    /// Regex match with a backreference template.
    pub fn pattern(
        pattern: &str,
        template: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self::new(
            MatchSpec::pattern(pattern)?,
            ReplaceSpec::Template(template.into()),
        ))
    }

    /// Regex match with a replacement callback.
    pub fn pattern_fn<F>(pattern: &str, run: F) -> Result<Self, regex::Error>
    where
        F: Fn(&MatchedGroups<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Ok(Self::new(
            MatchSpec::pattern(pattern)?,
            ReplaceSpec::Func(Arc::new(run)),
        ))
    }

    /// Rewrite every occurrence instead of the first only.
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }
}

/// Apply one rule to source text.
///
/// No match is not an error: the input comes back borrowed and byte-identical,
/// since patches are expected to sometimes no-op against already-patched or
/// already-absent targets across host versions.
pub fn apply_rule<'t>(
    source: &'t str,
    rule: &ReplacementRule,
) -> Result<Cow<'t, str>, RewriteError> {
    match (&rule.matcher, &rule.replace) {
        (MatchSpec::Literal(needle), ReplaceSpec::Template(template)) => {
            if needle.is_empty() || !source.contains(needle.as_str()) {
                return Ok(Cow::Borrowed(source));
            }
            let rewritten = if rule.global {
                source.replace(needle.as_str(), template)
            } else {
                source.replacen(needle.as_str(), template, 1)
            };
            Ok(Cow::Owned(rewritten))
        }

        (MatchSpec::Pattern(re), ReplaceSpec::Template(template)) => {
            let rewritten = if rule.global {
                re.replace_all(source, template.as_str())
            } else {
                re.replace(source, template.as_str())
            };
            Ok(rewritten)
        }

        (MatchSpec::Literal(needle), ReplaceSpec::Func(run)) => {
            if needle.is_empty() {
                return Ok(Cow::Borrowed(source));
            }
            let mut rewritten = String::with_capacity(source.len());
            let mut tail = 0;
            let mut matched = false;
            for (occurrence, (start, whole)) in
                source.match_indices(needle.as_str()).enumerate()
            {
                matched = true;
                let groups = MatchedGroups::from_literal(whole);
                let replacement = run(&groups)
                    .map_err(|err| RewriteError::ReplaceFn { occurrence, source: err })?;
                rewritten.push_str(&source[tail..start]);
                rewritten.push_str(&replacement);
                tail = start + whole.len();
                if !rule.global {
                    break;
                }
            }
            if !matched {
                return Ok(Cow::Borrowed(source));
            }
            rewritten.push_str(&source[tail..]);
            Ok(Cow::Owned(rewritten))
        }

        (MatchSpec::Pattern(re), ReplaceSpec::Func(run)) => {
            let mut rewritten = String::with_capacity(source.len());
            let mut tail = 0;
            let mut matched = false;
            for (occurrence, caps) in re.captures_iter(source).enumerate() {
                matched = true;
                let whole = caps.get(0).expect("group 0 always participates");
                let groups = MatchedGroups::from_captures(&caps);
                let replacement = run(&groups)
                    .map_err(|err| RewriteError::ReplaceFn { occurrence, source: err })?;
                rewritten.push_str(&source[tail..whole.start()]);
                rewritten.push_str(&replacement);
                tail = whole.end();
                if !rule.global {
                    break;
                }
            }
            if !matched {
                return Ok(Cow::Borrowed(source));
            }
            rewritten.push_str(&source[tail..]);
            Ok(Cow::Owned(rewritten))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_replaces_first_occurrence() {
        let rule = ReplacementRule::pattern("FOO_BAR", "BAZ_QUX").unwrap();
        let out = apply_rule("const x = FOO_BAR; const y = FOO_BAR;", &rule).unwrap();
        assert_eq!(out, "const x = BAZ_QUX; const y = FOO_BAR;");
    }

    #[test]
    fn global_pattern_replaces_every_occurrence() {
        let rule = ReplacementRule::pattern("FOO_BAR", "BAZ_QUX").unwrap().global();
        let out = apply_rule("FOO_BAR + FOO_BAR", &rule).unwrap();
        assert_eq!(out, "BAZ_QUX + BAZ_QUX");
    }

    #[test]
    fn no_match_returns_input_borrowed() {
        let rule = ReplacementRule::literal("ABSENT", "whatever");
        let out = apply_rule("const x = 1;", &rule).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "const x = 1;");
    }

    #[test]
    fn template_backreferences_expand() {
        let rule =
            ReplacementRule::pattern(r"get(\w+)Store", "use${1}Store").unwrap().global();
        let out = apply_rule("e.getGuildStore(); e.getUserStore();", &rule).unwrap();
        assert_eq!(out, "e.useGuildStore(); e.useUserStore();");
    }

    #[test]
    fn literal_template_is_verbatim() {
        // No backreference expansion for literal matchers.
        let rule = ReplacementRule::literal("X", "$1");
        let out = apply_rule("X", &rule).unwrap();
        assert_eq!(out, "$1");
    }

    #[test]
    fn func_receives_capture_groups() {
        let rule = ReplacementRule::pattern_fn(r"(\w+)\.isPremium", |groups| {
            Ok(format!("{}.isPremium&&true", groups.get(1).unwrap()))
        })
        .unwrap();
        let out = apply_rule("if(user.isPremium){}", &rule).unwrap();
        assert_eq!(out, "if(user.isPremium&&true){}");
    }

    #[test]
    fn global_func_runs_per_occurrence() {
        let rule = ReplacementRule::pattern_fn(r"\d+", |groups| {
            let n: u32 = groups.whole().parse()?;
            Ok((n * 2).to_string())
        })
        .unwrap()
        .global();
        let out = apply_rule("1,2,3", &rule).unwrap();
        assert_eq!(out, "2,4,6");
    }

    #[test]
    fn func_error_names_the_occurrence() {
        let rule = ReplacementRule::pattern_fn(r"\d+", |groups| {
            if groups.whole() == "2" {
                anyhow::bail!("refused");
            }
            Ok(groups.whole().to_string())
        })
        .unwrap()
        .global();
        let err = apply_rule("1,2,3", &rule).unwrap_err();
        match err {
            RewriteError::ReplaceFn { occurrence, .. } => assert_eq!(occurrence, 1),
        }
    }

    #[test]
    fn literal_func_sees_only_group_zero() {
        let rule = ReplacementRule::new(
            MatchSpec::literal("FOO"),
            ReplaceSpec::Func(Arc::new(|groups| {
                assert_eq!(groups.len(), 1);
                Ok(groups.whole().to_lowercase())
            })),
        );
        let out = apply_rule("FOO FOO", &rule).unwrap();
        assert_eq!(out, "foo FOO");
    }

    #[test]
    fn empty_literal_needle_is_a_no_op() {
        let rule = ReplacementRule::literal("", "x");
        let out = apply_rule("abc", &rule).unwrap();
        assert_eq!(out, "abc");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn absent_needle_is_identity(input in "[a-z ;=]{0,64}") {
                let rule = ReplacementRule::literal("XYZ", "replacement");
                let out = apply_rule(&input, &rule).unwrap();
                prop_assert_eq!(out.as_ref(), input.as_str());
            }

            #[test]
            fn non_matching_pattern_is_identity(input in "[a-z ;=]{0,64}") {
                let rule = ReplacementRule::pattern("[A-Z]{4}", "replacement").unwrap();
                let out = apply_rule(&input, &rule).unwrap();
                prop_assert_eq!(out.as_ref(), input.as_str());
            }
        }
    }
}
