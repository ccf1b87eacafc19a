//! Type mapping from description types to target-language type usages
//!
//! The table comes from the `types` section of the configuration: each
//! description type (`integer`, `string`, `array`, ...) maps formats to
//! template [`TypeUsage`]s. The `""` format is the default.

use crate::pattern::Pattern;
use apigen_common::{GeneratorError, ObjectSchema, Result, TypeEntry, TypeUsage};
use indexmap::IndexMap;
use tracing::trace;

/// Maps description type/format pairs to TypeUsage
#[derive(Debug, Clone)]
pub struct TypeMapper {
    types: Vec<(String, Vec<(Pattern, TypeUsage)>)>,
}

impl TypeMapper {
    /// Build the mapper from the configured type table
    pub fn new(types: &IndexMap<String, TypeEntry>) -> Result<Self> {
        let types = types
            .iter()
            .map(|(type_name, entry)| {
                let formats = entry
                    .formats()
                    .into_iter()
                    .map(|(format, spec)| Ok((Pattern::parse(format)?, spec.to_type_usage()?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok((type_name.clone(), formats))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { types })
    }

    /// Map a description type to a TypeUsage
    ///
    /// The first format entry matching `format` wins; without a format, or
    /// when no entry matches, the default-format entry is used. The result's
    /// `base_name` is `base_name` if given, `raw_type` otherwise.
    ///
    /// # Examples
    /// ```
    /// use apigen_common::ConfigFile;
    /// use apigen_parser::TypeMapper;
    ///
    /// let config = ConfigFile::from_yaml(
    ///     "analyzer: { types: { integer: { int64: i64, '': i32 } } }",
    /// ).unwrap();
    /// let mapper = TypeMapper::new(&config.analyzer.types).unwrap();
    ///
    /// assert_eq!(mapper.map_type("integer", Some("int64"), None).unwrap().name, "i64");
    /// assert_eq!(mapper.map_type("integer", Some("int8"), None).unwrap().name, "i32");
    /// assert!(mapper.map_type("file", None, None).is_err());
    /// ```
    pub fn map_type(
        &self,
        raw_type: &str,
        format: Option<&str>,
        base_name: Option<&str>,
    ) -> Result<TypeUsage> {
        let unmapped = || GeneratorError::UnmappedType {
            type_name: raw_type.to_string(),
            format: format.map(str::to_string),
        };

        let formats = self
            .types
            .iter()
            .find(|(name, _)| name == raw_type)
            .map(|(_, formats)| formats)
            .ok_or_else(unmapped)?;

        let by_format = format.filter(|f| !f.is_empty()).and_then(|f| {
            formats
                .iter()
                .find(|(pattern, _)| !pattern.is_default() && pattern.is_match(f))
        });
        let (_, template) = by_format
            .or_else(|| formats.iter().find(|(pattern, _)| pattern.is_default()))
            .ok_or_else(unmapped)?;

        // An empty target name would leave the usage unresolved
        if template.is_empty() {
            return Err(unmapped());
        }

        let mut usage = template.clone();
        usage.base_name = base_name.unwrap_or(raw_type).to_string();
        trace!(raw_type, ?format, mapped = %usage.name, "Mapped type");
        Ok(usage)
    }

    /// Usage of a schema defined by the description itself
    pub fn map_schema(schema: &ObjectSchema) -> TypeUsage {
        TypeUsage::from_schema(schema)
    }
}
