//! Translator configuration loaded from YAML
//!
//! The configuration file drives both the translator and the printer:
//!
//! ```yaml
//! analyzer:
//!   subst:
//!     "%CLIENT_MAJOR_VERSION%": r0
//!   identifiers:
//!     type: type_
//!     /^(.+)_id$/: ${1}Id
//!     sync/filter: filterId
//!   types:
//!     integer:
//!       int64: i64
//!       "": i32
//!     string:
//!       date-time: { type: Timestamp, imports: chrono }
//!       "": String
//!     array: { type: Vec }
//! printer:
//!   templates: templates/rust
//! ```
//!
//! Every table is an ordered mapping: earlier entries take precedence.

use crate::model::TypeUsage;
use crate::{GeneratorError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root of the configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Translator settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// Printer settings
    #[serde(default)]
    pub printer: PrinterConfig,
}

/// Tables used by the translator and its type mapper
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Literal substitutions applied to description text before parsing
    #[serde(default, rename = "subst")]
    pub substitutions: IndexMap<String, String>,
    /// Identifier rules: `[scope/]name` or `[scope/]/regex/` → replacement
    #[serde(default)]
    pub identifiers: IndexMap<String, String>,
    /// Description type → format → target type
    #[serde(default)]
    pub types: IndexMap<String, TypeEntry>,
}

/// Printer settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrinterConfig {
    /// Template directory, relative to the configuration file
    #[serde(default)]
    pub templates: Option<PathBuf>,
}

/// Type table entry for one description type
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TypeEntry {
    /// The same target type for every format
    Single(TypeSpec),
    /// Format (`""` for the default, `/regex/` for a pattern) → target type
    Formats(IndexMap<String, TypeSpec>),
}

impl TypeEntry {
    /// Format keys and specs in precedence order
    pub fn formats(&self) -> Vec<(&str, &TypeSpec)> {
        match self {
            TypeEntry::Single(spec) => vec![("", spec)],
            TypeEntry::Formats(formats) => formats.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        }
    }
}

/// Target type specification
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// Just the target type name
    Name(String),
    Detailed(DetailedTypeSpec),
}

/// Target type with imports and rendering attributes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DetailedTypeSpec {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default)]
    pub imports: OneOrMany,
    /// Scalars become attributes, sequences of strings become lists
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// A single string or a list of strings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

impl ConfigFile {
    /// Load configuration from a YAML file
    ///
    /// A relative template directory is resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::from_yaml(&content).map_err(|e| {
            GeneratorError::Config(format!("Failed to parse config from {:?}: {}", path, e))
        })?;
        if let (Some(templates), Some(dir)) = (&config.printer.templates, path.parent()) {
            if templates.is_relative() {
                config.printer.templates = Some(dir.join(templates));
            }
        }
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl TypeSpec {
    /// Build the template type usage for this spec
    pub fn to_type_usage(&self) -> Result<TypeUsage> {
        match self {
            TypeSpec::Name(name) => Ok(TypeUsage::new(name.as_str())),
            TypeSpec::Detailed(spec) => {
                let mut usage = TypeUsage::new(spec.name.as_str());
                for import in spec.imports.to_vec() {
                    usage.add_import(import);
                }
                for (key, value) in &spec.extra {
                    match value {
                        serde_yaml::Value::Sequence(items) => {
                            let list = items
                                .iter()
                                .map(|item| scalar_to_string(item, key, &spec.name))
                                .collect::<Result<Vec<_>>>()?;
                            usage.lists.insert(key.clone(), list);
                        }
                        other => {
                            let value = scalar_to_string(other, key, &spec.name)?;
                            usage.attributes.insert(key.clone(), value);
                        }
                    }
                }
                Ok(usage)
            }
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value, key: &str, type_name: &str) -> Result<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        _ => Err(GeneratorError::Config(format!(
            "Attribute '{}' of type '{}' must be a scalar or a list of scalars",
            key, type_name
        ))),
    }
}
