use regex::Regex;

/// How a rule (or a patch's pre-filter) locates text in a module's source.
///
/// `Literal` is plain substring containment; `Pattern` is a compiled regular
/// expression. Regex syntax errors surface at construction, so a bad pattern
/// is charged to whoever registered it, never to the engine at apply time.
#[derive(Debug, Clone)]
pub enum MatchSpec {
    /// Exact substring match.
    Literal(String),
    /// Compiled regular expression.
    Pattern(Regex),
}

impl MatchSpec {
    pub fn literal(text: impl Into<String>) -> Self {
        MatchSpec::Literal(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(MatchSpec::Pattern(Regex::new(pattern)?))
    }

    /// Cheap containment/regex test, used as the patch pre-filter.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            MatchSpec::Literal(needle) => text.contains(needle.as_str()),
            MatchSpec::Pattern(re) => re.is_match(text),
        }
    }

    /// Byte span of the first occurrence, if any.
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        match self {
            MatchSpec::Literal(needle) => text
                .find(needle.as_str())
                .map(|start| (start, start + needle.len())),
            MatchSpec::Pattern(re) => re.find(text).map(|m| (m.start(), m.end())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_containment() {
        let spec = MatchSpec::literal("FOO_BAR");
        assert!(spec.is_match("const x = FOO_BAR;"));
        assert!(!spec.is_match("const x = foo_bar;"));
    }

    #[test]
    fn pattern_test() {
        let spec = MatchSpec::pattern(r"get\w+Store").unwrap();
        assert!(spec.is_match("e.getGuildStore()"));
        assert!(!spec.is_match("e.fetchStore()"));
    }

    #[test]
    fn pattern_syntax_error_at_construction() {
        assert!(MatchSpec::pattern(r"(unclosed").is_err());
    }

    #[test]
    fn find_reports_byte_span() {
        let spec = MatchSpec::literal("BAR");
        assert_eq!(spec.find("FOO BAR BAZ"), Some((4, 7)));

        let spec = MatchSpec::pattern(r"B\w+").unwrap();
        assert_eq!(spec.find("FOO BAR BAZ"), Some((4, 7)));
        assert_eq!(spec.find("FOO"), None);
    }
}
