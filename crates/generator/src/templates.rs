//! Template loading and filters

use apigen_common::util::{camel_case, capitalize, qualified_name, snake_case, type_case};
use apigen_common::{GeneratorError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Tera, Value};
use tracing::debug;

/// File extension marking a template
pub const TEMPLATE_SUFFIX: &str = ".tera";

/// Templates shipped with the printer, as (name, source)
const BUILTIN_TEMPLATES: [(&str, &str); 1] = [("api.rs", include_str!("../templates/api.rs.tera"))];

/// A Tera instance with the apigen filters and no templates
fn new_tera() -> Tera {
    let mut tera = Tera::default();

    tera.register_filter("render_type", render_type_filter);
    tera.register_filter("qualified_name", qualified_name_filter);
    tera.register_filter("camel_case", camel_case_filter);
    tera.register_filter("capitalize", capitalize_filter);
    tera.register_filter("snake_case", snake_case_filter);

    tera
}

/// Load the built-in templates
pub fn load_builtin_templates() -> Result<(Tera, Vec<String>)> {
    let mut tera = new_tera();
    let mut names = Vec::new();
    for (name, source) in BUILTIN_TEMPLATES {
        tera.add_raw_template(name, source).map_err(|e| {
            GeneratorError::Generation(format!("Failed to load {} template: {}", name, e))
        })?;
        names.push(name.to_string());
    }
    Ok((tera, names))
}

/// Load every `*.tera` file directly inside `dir`
///
/// Templates are named after their file name without the `.tera` suffix
/// and returned in name order.
pub fn load_templates_from_dir(dir: &Path) -> Result<(Tera, Vec<String>)> {
    let entries = fs::read_dir(dir).map_err(|e| {
        GeneratorError::Generation(format!(
            "Failed to read template directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(TEMPLATE_SUFFIX))
        else {
            continue;
        };
        if !path.is_file() || name.is_empty() {
            continue;
        }
        let source = fs::read_to_string(&path)?;
        sources.push((name.to_string(), source));
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));

    if sources.is_empty() {
        return Err(GeneratorError::Generation(format!(
            "No {} templates in {}",
            TEMPLATE_SUFFIX,
            dir.display()
        )));
    }

    let mut tera = new_tera();
    tera.add_raw_templates(sources.iter().map(|(n, s)| (n.as_str(), s.as_str())))
        .map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to load templates from {}: {}",
                dir.display(),
                e
            ))
        })?;
    let names: Vec<String> = sources.into_iter().map(|(name, _)| name).collect();
    debug!(dir = %dir.display(), templates = ?names, "Loaded templates");
    Ok((tera, names))
}

fn str_arg<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter expects a string", filter)))
}

fn flatten_arg(args: &HashMap<String, Value>) -> bool {
    args.get("flatten").and_then(Value::as_bool).unwrap_or(false)
}

/// Name of a serialized type usage or schema
///
/// Scoped names are `scope.Name`, or `ScopeName` when flattened.
fn scoped_name(value: &Value, flatten: bool) -> tera::Result<String> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("expected a type or schema with a name"))?;
    let scope = value.get("scope").and_then(Value::as_str).unwrap_or_default();

    Ok(if flatten {
        format!("{}{}", type_case(scope), name)
    } else {
        qualified_name(scope, name)
    })
}

fn render_type(value: &Value, flatten: bool) -> tera::Result<String> {
    let mut rendered = scoped_name(value, flatten)?;
    let inner = value
        .get("inner_types")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if !inner.is_empty() {
        let inner = inner
            .iter()
            .map(|t| render_type(t, flatten))
            .collect::<tera::Result<Vec<_>>>()?;
        rendered.push('<');
        rendered.push_str(&inner.join(", "));
        rendered.push('>');
    }
    Ok(rendered)
}

/// Filter rendering a type usage as `Name<Inner, ...>`
fn render_type_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(render_type(value, flatten_arg(args))?))
}

/// Filter rendering the scope-qualified name of a type usage or schema
fn qualified_name_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(scoped_name(value, flatten_arg(args))?))
}

fn camel_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(camel_case(str_arg(value, "camel_case")?)))
}

/// Filter to capitalize first letter
fn capitalize_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(capitalize(str_arg(value, "capitalize")?)))
}

fn snake_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(snake_case(str_arg(value, "snake_case")?)))
}
