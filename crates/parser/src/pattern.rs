//! Exact-or-regex keys used by the configuration tables
//!
//! A key wrapped in slashes (`/^(.+)_id$/`) is a regular expression, anything
//! else matches literally.

use apigen_common::{GeneratorError, Result};
use regex::Regex;
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub(crate) enum Pattern {
    Exact(String),
    Regex(Regex),
}

impl Pattern {
    pub(crate) fn parse(key: &str) -> Result<Self> {
        match key
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(expr) => Regex::new(expr)
                .map(Pattern::Regex)
                .map_err(|e| GeneratorError::Config(format!("Invalid pattern '{}': {}", key, e))),
            None => Ok(Pattern::Exact(key.to_string())),
        }
    }

    pub(crate) fn is_match(&self, s: &str) -> bool {
        match self {
            Pattern::Exact(exact) => exact == s,
            Pattern::Regex(re) => re.is_match(s),
        }
    }

    /// `replacement` applied to `s` if the pattern matches
    ///
    /// Regex replacements apply to every match and may refer to capture
    /// groups (`$1`, `${name}`).
    pub(crate) fn replace<'a>(&self, s: &'a str, replacement: &'a str) -> Option<Cow<'a, str>> {
        match self {
            Pattern::Exact(exact) if exact == s => Some(Cow::Borrowed(replacement)),
            Pattern::Regex(re) if re.is_match(s) => Some(re.replace_all(s, replacement)),
            _ => None,
        }
    }

    pub(crate) fn is_default(&self) -> bool {
        matches!(self, Pattern::Exact(s) if s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_regex() {
        let exact = Pattern::parse("type").unwrap();
        assert!(exact.is_match("type"));
        assert!(!exact.is_match("types"));

        let re = Pattern::parse("/^(.+)_id$/").unwrap();
        assert!(re.is_match("room_id"));
        assert_eq!(re.replace("room_id", "${1}Id").as_deref(), Some("roomId"));
        assert_eq!(re.replace("room", "${1}Id"), None);
    }

    #[test]
    fn test_regex_replaces_every_match() {
        let re = Pattern::parse("/-/").unwrap();
        assert_eq!(re.replace("X-Rate-Limit", "_").as_deref(), Some("X_Rate_Limit"));
    }

    #[test]
    fn test_single_slash_is_literal() {
        assert!(Pattern::parse("/").unwrap().is_match("/"));
    }

    #[test]
    fn test_default_key() {
        assert!(Pattern::parse("").unwrap().is_default());
        assert!(!Pattern::parse("int64").unwrap().is_default());
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            Pattern::parse("/([/"),
            Err(GeneratorError::Config(_))
        ));
    }
}
