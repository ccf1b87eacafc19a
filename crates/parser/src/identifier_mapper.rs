//! Identifier mapping
//!
//! Maps identifiers from the API description to target-language spellings
//! using the `identifiers` section of the configuration. Keys are
//! `[scope/]pattern`; a pattern is either a literal name or a `/regex/`.
//! Identifiers no rule applies to are converted to lowerCamelCase.

use crate::pattern::Pattern;
use apigen_common::util::camel_case;
use apigen_common::Result;
use indexmap::IndexMap;
use tracing::trace;

#[derive(Debug, Clone)]
struct IdentifierRule {
    pattern: Pattern,
    replacement: String,
}

/// Maps raw identifiers to target identifiers
#[derive(Debug, Clone, Default)]
pub struct IdentifierMapper {
    scoped: Vec<(String, IdentifierRule)>,
    unscoped: Vec<IdentifierRule>,
}

impl IdentifierMapper {
    pub fn new(rules: &IndexMap<String, String>) -> Result<Self> {
        let mut mapper = Self::default();
        for (key, replacement) in rules {
            let (scope, pattern) = split_scope(key);
            let rule = IdentifierRule {
                pattern: Pattern::parse(pattern)?,
                replacement: replacement.clone(),
            };
            match scope {
                Some(scope) => mapper.scoped.push((scope.to_string(), rule)),
                None => mapper.unscoped.push(rule),
            }
        }
        Ok(mapper)
    }

    /// Map an identifier, optionally within a scope
    ///
    /// Rules for the given scope are tried before unscoped ones; within each
    /// group the first matching rule wins.
    ///
    /// # Examples
    /// ```
    /// use apigen_parser::IdentifierMapper;
    /// use indexmap::IndexMap;
    ///
    /// let mut rules = IndexMap::new();
    /// rules.insert("type".to_string(), "type_".to_string());
    /// rules.insert("sync/filter".to_string(), "filterId".to_string());
    /// let mapper = IdentifierMapper::new(&rules).unwrap();
    ///
    /// assert_eq!(mapper.map_identifier("type", None), "type_");
    /// assert_eq!(mapper.map_identifier("filter", Some("sync")), "filterId");
    /// assert_eq!(mapper.map_identifier("filter", None), "filter");
    /// assert_eq!(mapper.map_identifier("room_id", None), "roomId");
    /// ```
    pub fn map_identifier(&self, raw: &str, scope: Option<&str>) -> String {
        let scoped = self
            .scoped
            .iter()
            .filter(|(rule_scope, _)| Some(rule_scope.as_str()) == scope)
            .map(|(_, rule)| rule);

        let mapped = scoped
            .chain(&self.unscoped)
            .find_map(|rule| rule.pattern.replace(raw, &rule.replacement))
            .map(|m| m.into_owned())
            .unwrap_or_else(|| camel_case(raw));
        trace!(raw, ?scope, %mapped, "Mapped identifier");
        mapped
    }
}

/// Split `scope/pattern`; a key starting with `/` has no scope
fn split_scope(key: &str) -> (Option<&str>, &str) {
    if key.starts_with('/') {
        return (None, key);
    }
    match key.split_once('/') {
        Some((scope, pattern)) => (Some(scope), pattern),
        None => (None, key),
    }
}
