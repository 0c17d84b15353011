/// A normalized, non-blank search term.
///
/// Matching is a case-insensitive substring test of the whole term; no
/// wildcards and no tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    needle: String,
}

impl SearchTerm {
    /// Returns `None` for absent or blank input, which means "no filter".
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.needle
    }

    #[inline]
    pub fn matches(&self, text: &str) -> bool {
        contains_ignore_case(text, &self.needle)
    }

    /// True when any present field contains the term.
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
        fields.into_iter().flatten().any(|field| self.matches(field))
    }
}

/// `needle` must already be lowercase.
#[inline]
fn contains_ignore_case(text: &str, needle: &str) -> bool {
    if text.is_ascii() && needle.is_ascii() {
        // ascii fast path
        return text
            .as_bytes()
            .windows(needle.len())
            .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()));
    }
    text.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_terms_do_not_filter() {
        assert!(SearchTerm::parse(None).is_none());
        assert!(SearchTerm::parse(Some("")).is_none());
        assert!(SearchTerm::parse(Some("  \t ")).is_none());
    }

    #[test]
    fn matches_case_insensitively() {
        let term = SearchTerm::parse(Some("acme")).unwrap();
        assert!(term.matches("Acme Corp"));
        assert!(term.matches("THE ACME"));
        assert!(!term.matches("Acm"));
    }

    #[test]
    fn whole_term_is_one_substring() {
        let term = SearchTerm::parse(Some(" corp acme ")).unwrap();
        assert_eq!(term.as_str(), "corp acme");
        assert!(!term.matches("Acme Corp"));
    }

    #[test]
    fn non_ascii_text() {
        let term = SearchTerm::parse(Some("MÜLLER")).unwrap();
        assert!(term.matches("Herr Müller GmbH"));
    }

    #[test]
    fn any_field_may_match() {
        let term = SearchTerm::parse(Some("tech")).unwrap();
        assert!(term.matches_any([None, Some("Acme"), Some("Technology")]));
        assert!(!term.matches_any([None, Some("Acme")]));
    }
}
