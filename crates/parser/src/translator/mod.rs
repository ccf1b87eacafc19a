//! Translation of API descriptions into the API model
//!
//! A [`Translator`] holds the configuration tables (substitutions,
//! identifier rules, type table) and turns one description file at a time
//! into an independent [`Model`].
//!
//! ## Usage
//! ```rust,ignore
//! use apigen_parser::{InOut, Translator};
//!
//! let translator = Translator::from_config_file("apigen.yaml")?;
//! let model = translator.process_file("api/rooms.yaml", "api", InOut::InAndOut, true)?;
//! ```

mod call;
mod schema;

use crate::description::{mapping_field, pointer_escape, str_field};
use crate::identifier_mapper::IdentifierMapper;
use crate::type_mapper::TypeMapper;
use apigen_common::{AnalyzerConfig, ConfigFile, GeneratorError, Model, Result, TypeUsage};
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Which side of each call to translate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InOut {
    /// Parameters only
    In,
    /// Responses only
    Out,
    /// Parameters and responses
    #[default]
    InAndOut,
}

impl InOut {
    pub fn has_in(self) -> bool {
        matches!(self, InOut::In | InOut::InAndOut)
    }

    pub fn has_out(self) -> bool {
        matches!(self, InOut::Out | InOut::InAndOut)
    }
}

/// Translates API descriptions into models
///
/// The configuration is fixed at construction; a translator can process
/// any number of files and may be shared between threads.
#[derive(Debug, Clone)]
pub struct Translator {
    substitutions: Vec<(String, String)>,
    identifiers: IdentifierMapper,
    types: TypeMapper,
}

impl Translator {
    /// Build a translator from the `analyzer` configuration section
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        Ok(Self {
            substitutions: config
                .substitutions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            identifiers: IdentifierMapper::new(&config.identifiers)?,
            types: TypeMapper::new(&config.types)?,
        })
    }

    /// Load the configuration file and build a translator from it
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = ConfigFile::load(path.as_ref())?;
        Self::new(&config.analyzer)
    }

    /// See [`TypeMapper::map_type`]
    pub fn map_type(
        &self,
        raw_type: &str,
        format: Option<&str>,
        base_name: Option<&str>,
    ) -> Result<TypeUsage> {
        self.types.map_type(raw_type, format, base_name)
    }

    /// See [`IdentifierMapper::map_identifier`]
    pub fn map_identifier(&self, raw: &str, scope: Option<&str>) -> String {
        self.identifiers.map_identifier(raw, scope)
    }

    /// Apply the configured literal substitutions to description text
    pub fn substitute(&self, text: &str) -> String {
        self.substitutions
            .iter()
            .fold(text.to_string(), |text, (from, to)| text.replace(from, to))
    }

    /// Translate a description file
    ///
    /// The model records the file's directory relative to `base_dir` and its
    /// file name. Errors name the file they occurred in.
    pub fn process_file<P: AsRef<Path>, B: AsRef<Path>>(
        &self,
        file_path: P,
        base_dir: B,
        in_out: InOut,
        skip_trivial: bool,
    ) -> Result<Model> {
        let file_path = file_path.as_ref();
        let display = file_path.display().to_string();

        let content = fs::read_to_string(file_path).map_err(|e| {
            GeneratorError::Parse(format!("Failed to read description: {}", e)).in_file(&display)
        })?;

        let relative = file_path
            .strip_prefix(base_dir.as_ref())
            .unwrap_or(file_path);
        let file_dir = relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = relative
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.process_str(&content, &file_dir, &filename, in_out, skip_trivial)
            .map_err(|e| match e {
                GeneratorError::InFile { source, .. } => (*source).in_file(&display),
                other => other.in_file(&display),
            })
    }

    /// Translate description text (YAML or JSON)
    pub fn process_str(
        &self,
        text: &str,
        file_dir: &str,
        filename: &str,
        in_out: InOut,
        skip_trivial: bool,
    ) -> Result<Model> {
        let text = self.substitute(text);
        let tree: Value =
            serde_yaml::from_str(&text).map_err(|e| GeneratorError::from(e).in_file(filename))?;
        self.process_value(&tree, file_dir, filename, in_out, skip_trivial)
    }

    /// Translate an already loaded description tree
    pub fn process_value(
        &self,
        tree: &Value,
        file_dir: &str,
        filename: &str,
        in_out: InOut,
        skip_trivial: bool,
    ) -> Result<Model> {
        debug!(file_dir, filename, ?in_out, skip_trivial, "Processing description");
        let mut ingestion = Ingestion {
            translator: self,
            root: tree,
            model: Model::new(file_dir, filename),
            in_out,
            skip_trivial,
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
            cycle_refs: HashSet::new(),
        };
        ingestion.run().map_err(|e| e.in_file(filename))?;

        let model = ingestion.model;
        info!(
            filename,
            schemas = model.types().len(),
            calls = model.calls().count(),
            imports = model.imports().len(),
            "Translated description"
        );
        Ok(model)
    }
}

/// State of one description's translation
struct Ingestion<'a> {
    translator: &'a Translator,
    root: &'a Value,
    model: Model,
    in_out: InOut,
    skip_trivial: bool,
    /// Usages of already resolved local references
    resolved: HashMap<String, TypeUsage>,
    /// Local references being resolved, to cut recursive definitions short
    in_progress: HashSet<String>,
    /// Schema names handed out for recursive references; these schemas are
    /// always registered
    cycle_refs: HashSet<String>,
}

impl Ingestion<'_> {
    fn run(&mut self) -> Result<()> {
        if let Some(host) = str_field(self.root, "host") {
            self.model.host_address = host.to_string();
        }
        if let Some(base_path) = str_field(self.root, "basePath") {
            self.model.base_path = base_path.to_string();
        }

        self.ingest_definitions()?;
        self.ingest_paths()
    }

    /// Register every definition, referenced or not
    fn ingest_definitions(&mut self) -> Result<()> {
        let root = self.root;
        let sections = [
            ("#/definitions", mapping_field(root, "definitions")),
            (
                "#/components/schemas",
                root.get("components")
                    .and_then(|c| mapping_field(c, "schemas")),
            ),
        ];

        for (prefix, definitions) in sections {
            for name in definitions.into_iter().flat_map(|d| d.keys()) {
                let name = name.as_str().ok_or_else(|| {
                    GeneratorError::Parse(format!("Non-string definition name under {}", prefix))
                })?;
                let pointer = format!("{}/{}", prefix, pointer_escape(name));
                self.resolve_ref(&pointer)
                    .map_err(|e| e.at(format!("definition {}", name)))?;
            }
        }
        Ok(())
    }
}
