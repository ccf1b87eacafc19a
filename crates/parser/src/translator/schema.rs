//! Schema analysis: description schemas to type usages and object schemas

use super::Ingestion;
use crate::description::{
    default_value, key_string, mapping_field, pointer_name, ref_target, resolve_pointer,
    sequence_field, str_field, string_list,
};
use crate::type_mapper::TypeMapper;
use apigen_common::util::{type_case, without_suffix};
use apigen_common::{GeneratorError, ObjectSchema, Result, TypeUsage, VarDecl};
use serde_yaml::Value;
use std::path::Path as FsPath;
use tracing::{debug, trace};

const DESCRIPTION_SUFFIXES: [&str; 3] = [".yaml", ".yml", ".json"];

/// Whether a schema node defines named fields or composes other schemas
pub(super) fn has_structure(node: &Value) -> bool {
    node.get("properties").is_some() || node.get("allOf").is_some()
}

impl Ingestion<'_> {
    pub(super) fn map_type(
        &self,
        raw_type: &str,
        format: Option<&str>,
        base_name: Option<&str>,
    ) -> Result<TypeUsage> {
        self.translator.map_type(raw_type, format, base_name)
    }

    /// Resolve the type of a schema node
    ///
    /// Inline object schemas are registered under `scope` with the name
    /// `name_hint`.
    pub(super) fn resolve_type(
        &mut self,
        node: &Value,
        scope: &str,
        name_hint: &str,
    ) -> Result<TypeUsage> {
        if let Some(target) = ref_target(node) {
            return self.resolve_ref(target);
        }

        let format = str_field(node, "format");
        match str_field(node, "type") {
            Some("array") => {
                let array = self.map_type("array", format, None)?;
                match node.get("items") {
                    Some(items) => {
                        let inner = self.resolve_type(items, scope, name_hint)?;
                        Ok(array.instantiate(inner))
                    }
                    None => Ok(array),
                }
            }
            Some("object") | None => self.resolve_object(node, scope, name_hint),
            Some(other) => self.map_type(other, format, None),
        }
    }

    fn resolve_object(&mut self, node: &Value, scope: &str, name_hint: &str) -> Result<TypeUsage> {
        if has_structure(node) {
            let schema = self.analyze_object(node, scope, name_hint)?;
            return self.schema_usage(schema);
        }

        match node.get("additionalProperties") {
            None | Some(Value::Bool(false)) => self.map_type("object", str_field(node, "format"), None),
            Some(Value::Bool(true)) => {
                let value = self.map_type("object", None, None)?;
                Ok(self.map_type("map", None, None)?.instantiate(value))
            }
            Some(values) => {
                let value = self.resolve_type(values, scope, name_hint)?;
                Ok(self.map_type("map", None, None)?.instantiate(value))
            }
        }
    }

    /// Build the object schema for a node with properties and/or `allOf`
    ///
    /// Referenced `allOf` members become parents; inline members contribute
    /// their parents and fields directly.
    pub(super) fn analyze_object(
        &mut self,
        node: &Value,
        scope: &str,
        name: &str,
    ) -> Result<ObjectSchema> {
        let mut schema = ObjectSchema::new(scope, name);

        for member in sequence_field(node, "allOf") {
            match ref_target(member) {
                Some(target) => {
                    let parent = self.resolve_ref(target)?;
                    schema.parent_types.push(parent);
                }
                None => {
                    let inline = self.analyze_object(member, scope, name)?;
                    schema.parent_types.extend(inline.parent_types);
                    schema.fields.extend(inline.fields);
                }
            }
        }

        let required = string_list(node, "required").unwrap_or_default();
        let field_scope = if name.is_empty() { scope } else { name };
        if let Some(properties) = mapping_field(node, "properties") {
            for (key, property) in properties {
                let raw_name = key_string(key)?;
                let nested_name = format!("{}{}", name, type_case(&raw_name));
                let type_usage = self.resolve_type(property, scope, &nested_name)?;
                let mut field = VarDecl::new(
                    type_usage,
                    self.translator.map_identifier(&raw_name, Some(field_scope)),
                    required.contains(&raw_name),
                )
                .with_base_name(raw_name.as_str());
                field.default_value = default_value(property);
                self.model.add_var_decl(&mut schema.fields, field);
            }
        }

        trace!(
            schema = %schema.qualified_name(),
            parents = schema.parent_types.len(),
            fields = schema.fields.len(),
            "Analyzed object schema"
        );
        Ok(schema)
    }

    /// Usage of an analyzed schema, registering it in the model
    ///
    /// Empty schemas map to the configured `object` type; trivial schemas
    /// are replaced by their parent when trivial schemas are skipped, unless
    /// a recursive reference already stands for them.
    pub(super) fn schema_usage(&mut self, schema: ObjectSchema) -> Result<TypeUsage> {
        if schema.is_empty() {
            let hint = Some(schema.name.as_str()).filter(|n| !n.is_empty());
            return self.map_type("object", None, hint);
        }
        let referenced = schema.scope.is_empty() && self.cycle_refs.contains(&schema.name);
        if self.skip_trivial && schema.is_trivial() && !referenced {
            if let Some(parent) = schema.parent_types.first() {
                debug!(schema = %schema.qualified_name(), parent = %parent.name, "Skipping trivial schema");
                return Ok(parent.clone());
            }
        }

        let usage = TypeMapper::map_schema(&schema);
        self.model.add_schema(schema)?;
        Ok(usage)
    }

    /// Whether a usage refers to a schema registered in the model
    pub(super) fn is_registered_schema(&self, usage: &TypeUsage) -> bool {
        self.model.find_schema(&usage.scope, &usage.name).is_some()
    }

    /// Resolve a `$ref` to a usage
    ///
    /// Local references are resolved once and cached; a reference met again
    /// while it is being resolved stands for the schema of that name.
    pub(super) fn resolve_ref(&mut self, target: &str) -> Result<TypeUsage> {
        if !target.starts_with('#') {
            return Ok(external_ref_usage(target));
        }
        if let Some(usage) = self.resolved.get(target) {
            return Ok(usage.clone());
        }

        let raw_name = pointer_name(target);
        if self.in_progress.contains(target) {
            let mut usage = TypeUsage::new(type_case(&raw_name));
            self.cycle_refs.insert(usage.name.clone());
            usage.base_name = raw_name;
            return Ok(usage);
        }

        let root = self.root;
        let node = resolve_pointer(root, target).ok_or_else(|| {
            GeneratorError::Parse(format!("Unresolvable reference '{}'", target))
        })?;

        self.in_progress.insert(target.to_string());
        let usage = self.resolve_type(node, "", &type_case(&raw_name));
        self.in_progress.remove(target);

        let mut usage = usage?;
        usage.base_name = raw_name;
        self.resolved.insert(target.to_string(), usage.clone());
        Ok(usage)
    }
}

/// Usage of a schema living in another description file
///
/// `events.yaml` and `events.yaml#/definitions/RoomEvent` both import
/// `events`; the type is named after the fragment's last token, or the file
/// stem when there is no fragment.
fn external_ref_usage(target: &str) -> TypeUsage {
    let (file, fragment) = match target.split_once('#') {
        Some((file, fragment)) => (file, Some(fragment)),
        None => (target, None),
    };

    let raw_name = match fragment.filter(|f| !f.is_empty()) {
        Some(fragment) => pointer_name(fragment),
        None => FsPath::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string()),
    };
    let import = DESCRIPTION_SUFFIXES
        .iter()
        .fold(file, |f, suffix| without_suffix(f, suffix));

    let mut usage = TypeUsage::with_import(type_case(&raw_name), import);
    usage.base_name = raw_name;
    usage
}
