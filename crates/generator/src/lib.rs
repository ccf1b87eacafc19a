//! Source generation for apigen models
//!
//! This crate renders translated API models into source files with Tera
//! templates. Every template `<name>.<ext>.tera` is rendered once per model
//! into `<output>/<file dir>/<description stem>.<ext>`.
//!
//! Templates see the following context:
//! - `model`: the whole model
//! - `imports`: sorted import identifiers
//! - `schemas`: object schemas, in registration order
//! - `call_classes`: calls grouped by their leading path segment
//! - `host`, `base_path`: the description's server settings
//! - `filename_base`: the description file name without its extension

mod templates;

pub use templates::TEMPLATE_SUFFIX;

use apigen_common::{GeneratorError, Model, Printer, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::{debug, info};

/// Printer rendering models through a set of Tera templates
pub struct TemplatePrinter {
    tera: Tera,
    templates: Vec<String>,
    output_dir: PathBuf,
}

impl TemplatePrinter {
    /// Printer using the templates found in `templates_dir`
    pub fn from_dir(templates_dir: &Path, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let (tera, templates) = templates::load_templates_from_dir(templates_dir)?;
        Ok(Self {
            tera,
            templates,
            output_dir: output_dir.into(),
        })
    }

    /// Printer using the built-in Rust templates
    pub fn builtin(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let (tera, templates) = templates::load_builtin_templates()?;
        Ok(Self {
            tera,
            templates,
            output_dir: output_dir.into(),
        })
    }

    /// Names of the loaded templates, without the `.tera` suffix
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create template context from a model
    fn create_context(&self, model: &Model) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("model", model);
        context.insert("imports", model.imports());
        context.insert("schemas", model.types());
        context.insert("call_classes", model.call_classes());
        context.insert("host", &model.host_address);
        context.insert("base_path", &model.base_path);
        context.insert("filename_base", filename_base(model.filename()));
        context
    }

    /// Render one template for a model and write it out
    fn print_template(&self, template: &str, model: &Model, context: &tera::Context) -> Result<PathBuf> {
        let rendered = self.tera.render(template, context).map_err(|e| {
            GeneratorError::Generation(format!("Template {} failed: {:?}", template, e))
        })?;

        let dir = self.output_dir.join(model.file_dir());
        fs::create_dir_all(&dir).map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to create output directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let output_path = dir.join(output_file_name(filename_base(model.filename()), template));
        fs::write(&output_path, rendered).map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to write {}: {}",
                output_path.display(),
                e
            ))
        })?;

        debug!(template, path = %output_path.display(), "Rendered template");
        Ok(output_path)
    }
}

impl Printer for TemplatePrinter {
    fn print(&self, model: &Model) -> Result<Vec<PathBuf>> {
        let context = self.create_context(model);
        let written = self
            .templates
            .iter()
            .map(|template| self.print_template(template, model, &context))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.in_file(model.filename()))?;

        info!(
            filename = model.filename(),
            files = written.len(),
            "Generated sources"
        );
        Ok(written)
    }
}

/// Description file name without its extension (`rooms.yaml` → `rooms`)
fn filename_base(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => filename,
    }
}

/// `<base>.<ext>` for a template named `<name>.<ext>`
fn output_file_name(base: &str, template: &str) -> String {
    match template.rsplit_once('.') {
        Some((_, ext)) => format!("{}.{}", base, ext),
        None => base.to_string(),
    }
}
