//! Common types and utilities for apigen
//!
//! This crate contains the API model produced by the translator (type usages,
//! schemas, calls, path templates), the configuration file format, the
//! shared error type, and the [`Printer`] interface implemented by code
//! emitters.

pub mod config;
mod model;
mod path;
pub mod util;

pub use config::{AnalyzerConfig, ConfigFile, PrinterConfig, TypeEntry, TypeSpec};
pub use model::{
    Call, CallClass, CallMut, Model, ObjectSchema, ParamLocation, Params, Response, TypeUsage,
    VarDecl, VarDecls, IMPORTS_LIST,
};
pub use path::{PartKind, Path, PathPart};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while translating or printing an API description
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("No type mapping for '{type_name}'{}", .format.as_deref().map(|f| format!(" with format '{f}'")).unwrap_or_default())]
    UnmappedType {
        type_name: String,
        format: Option<String>,
    },

    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Duplicate operation '{operation_id}' at {path}")]
    DuplicateOperation { operation_id: String, path: String },

    #[error("Conflicting definitions of schema '{name}'")]
    SchemaConflict { name: String },

    #[error("Call '{call}': path parameter '{parameter}' {detail}")]
    MissingPathParameter {
        call: String,
        parameter: String,
        detail: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("{location}: {source}")]
    At {
        location: String,
        #[source]
        source: Box<GeneratorError>,
    },

    #[error("{file}: {source}")]
    InFile {
        file: String,
        #[source]
        source: Box<GeneratorError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GeneratorError {
    /// Attach the name of the description file being processed
    pub fn in_file(self, file: impl Into<String>) -> Self {
        GeneratorError::InFile {
            file: file.into(),
            source: Box::new(self),
        }
    }

    /// Attach the description entry (operation, definition) being processed
    pub fn at(self, location: impl Into<String>) -> Self {
        GeneratorError::At {
            location: location.into(),
            source: Box::new(self),
        }
    }

    /// The error without any file or location context
    pub fn root(&self) -> &GeneratorError {
        match self {
            GeneratorError::InFile { source, .. } | GeneratorError::At { source, .. } => {
                source.root()
            }
            other => other,
        }
    }
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Code emitter consuming a finished [`Model`]
///
/// Implementations receive only fully translated models: all imports are
/// collected, all schemas registered and every call complete. Returns the
/// paths of the files written.
pub trait Printer {
    fn print(&self, model: &Model) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GeneratorError::UnmappedType {
            type_name: "string".to_string(),
            format: Some("uuid".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "No type mapping for 'string' with format 'uuid'"
        );

        let err = GeneratorError::UnmappedType {
            type_name: "file".to_string(),
            format: None,
        };
        assert_eq!(err.to_string(), "No type mapping for 'file'");
    }

    #[test]
    fn test_in_file_context() {
        let err = GeneratorError::SchemaConflict {
            name: "Event".to_string(),
        }
        .at("definition Event")
        .in_file("events.yaml");
        assert_eq!(
            err.to_string(),
            "events.yaml: definition Event: Conflicting definitions of schema 'Event'"
        );
        assert!(matches!(err.root(), GeneratorError::SchemaConflict { .. }));
    }
}
