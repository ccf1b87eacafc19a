//! Operation ingestion: paths and verbs to calls

use super::schema::has_structure;
use super::Ingestion;
use crate::description::{
    bool_field, default_value, key_string, mapping_field, ref_target, resolve_pointer,
    sequence_field, str_field, string_list,
};
use apigen_common::util::type_case;
use apigen_common::{
    GeneratorError, ParamLocation, PartKind, Path, Response, Result, VarDecl,
};
use serde_yaml::Value;
use tracing::{debug, warn};

/// HTTP verbs a path item may define operations for
const VERBS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Path item keys that are not operations but are expected
const PATH_ITEM_KEYS: [&str; 4] = ["parameters", "summary", "description", "servers"];

/// Name given to non-object response bodies
const RESPONSE_DATA: &str = "data";

type Params = Vec<(ParamLocation, VarDecl)>;

impl Ingestion<'_> {
    pub(super) fn ingest_paths(&mut self) -> Result<()> {
        let root = self.root;
        let Some(paths) = mapping_field(root, "paths") else {
            return Ok(());
        };

        for (key, item) in paths {
            let path = key_string(key)?;
            let shared_params = sequence_field(item, "parameters");
            for key in item.as_mapping().into_iter().flat_map(|m| m.keys()) {
                let key = key.as_str().unwrap_or_default();
                if !VERBS.contains(&key) && !PATH_ITEM_KEYS.contains(&key) && !key.starts_with("x-") {
                    warn!(path = %path, key, "Ignoring unsupported path item entry");
                }
            }
            for verb in VERBS {
                if let Some(operation) = item.get(verb) {
                    self.ingest_operation(&path, verb, operation, shared_params)
                        .map_err(|e| e.at(format!("{} {}", verb, path)))?;
                }
            }
        }
        Ok(())
    }

    fn ingest_operation(
        &mut self,
        raw_path: &str,
        verb: &str,
        operation: &Value,
        shared_params: &[Value],
    ) -> Result<()> {
        let root = self.root;
        let path = Path::parse(raw_path)?;
        let raw_id = match str_field(operation, "operationId") {
            Some(id) => id.to_string(),
            None => synthesize_operation_id(verb, &path),
        };
        let name = self.translator.map_identifier(&raw_id, None);

        let needs_security = match operation.get("security") {
            Some(requirements) => has_requirements(requirements),
            None => root.get("security").is_some_and(has_requirements),
        };
        let produces = string_list(operation, "produces")
            .or_else(|| string_list(root, "produces"))
            .unwrap_or_default();
        let mut consumes = string_list(operation, "consumes").or_else(|| string_list(root, "consumes"));

        let mut params = Params::new();
        let mut inline_body = false;
        if self.in_out.has_in() {
            let own_params = sequence_field(operation, "parameters");
            for param in merge_parameters(root, shared_params, own_params)? {
                inline_body |= self.resolve_param(param, &name, &mut params)?;
            }

            if let Some(request_body) = operation.get("requestBody") {
                let request_body = deref_node(root, request_body)?;
                let content = mapping_field(request_body, "content");
                let schema = content
                    .and_then(|c| c.values().next())
                    .and_then(|media| media.get("schema"));
                let required = bool_field(request_body, "required");
                inline_body |= self.resolve_body(schema, "body", required, &name, &mut params)?;
                if consumes.is_none() {
                    consumes = content.map(|c| {
                        c.keys()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    });
                }
            }
        }

        let mut responses = Vec::new();
        if self.in_out.has_out() {
            if let Some(declared) = mapping_field(operation, "responses") {
                for (code, response) in declared {
                    let code = key_string(code)?;
                    responses.push(self.resolve_response(&code, response, &name)?);
                }
            }
        }

        let mut call = self.model.add_call(path, verb, name, needs_security)?;
        call.produced_content_types = produces;
        call.consumed_content_types = consumes.unwrap_or_default();
        call.inline_body = inline_body;
        for (location, var) in params {
            call.add_param(location, var);
        }
        for response in responses {
            call.add_response(response);
        }
        if self.in_out.has_in() {
            call.validate_path_params()?;
        }

        debug!(
            call = %call.name,
            verb,
            path = %call.path,
            params = call.collate_params().len(),
            responses = call.responses.len(),
            "Registered call"
        );
        Ok(())
    }

    /// Resolve one parameter into `params`; returns whether it is an
    /// inline body
    fn resolve_param(&mut self, node: &Value, call_name: &str, params: &mut Params) -> Result<bool> {
        let raw_name = str_field(node, "name")
            .ok_or_else(|| GeneratorError::Parse("Parameter without a name".to_string()))?;
        let token = str_field(node, "in").ok_or_else(|| {
            GeneratorError::Parse(format!("Parameter '{}' has no location", raw_name))
        })?;
        let location = ParamLocation::from_token(token).ok_or_else(|| {
            GeneratorError::Parse(format!(
                "Parameter '{}' has unsupported location '{}'",
                raw_name, token
            ))
        })?;
        let required = location == ParamLocation::Path || bool_field(node, "required");

        if token == "body" {
            return self.resolve_body(node.get("schema"), raw_name, required, call_name, params);
        }

        // OpenAPI 3 parameters describe their type in a nested schema
        let type_node = node.get("schema").unwrap_or(node);
        let type_usage = self.resolve_type(type_node, call_name, &type_case(raw_name))?;
        let mut var = VarDecl::new(
            type_usage,
            self.translator.map_identifier(raw_name, Some(call_name)),
            required,
        )
        .with_base_name(raw_name);
        var.default_value = default_value(node).or_else(|| default_value(type_node));
        params.push((location, var));
        Ok(false)
    }

    /// Resolve a request body
    ///
    /// An inline object without parents is unpacked into one body parameter
    /// per field. Anything else becomes a single body parameter, which is
    /// an inline body unless its type is a registered schema.
    fn resolve_body(
        &mut self,
        schema: Option<&Value>,
        raw_name: &str,
        required: bool,
        call_name: &str,
        params: &mut Params,
    ) -> Result<bool> {
        let name_hint = type_case(raw_name);
        let type_usage = match schema {
            None => self.map_type("object", None, None)?,
            Some(schema) if ref_target(schema).is_none() && has_structure(schema) => {
                let object = self.analyze_object(schema, call_name, &name_hint)?;
                if object.parent_types.is_empty() {
                    let fields = self.unpack_fields(object.fields, call_name);
                    params.extend(fields.into_iter().map(|f| (ParamLocation::Body, f)));
                    return Ok(false);
                }
                self.schema_usage(object)?
            }
            Some(schema) => self.resolve_type(schema, call_name, &name_hint)?,
        };

        let inline = !self.is_registered_schema(&type_usage);
        let var = VarDecl::new(
            type_usage,
            self.translator.map_identifier(raw_name, Some(call_name)),
            required,
        )
        .with_base_name(raw_name);
        params.push((ParamLocation::Body, var));
        Ok(inline)
    }

    fn resolve_response(&mut self, code: &str, node: &Value, call_name: &str) -> Result<Response> {
        let node = deref_node(self.root, node)?;
        let mut response = Response::new(code);

        if let Some(headers) = mapping_field(node, "headers") {
            for (key, header) in headers {
                let raw_name = key_string(key)?;
                let type_usage = self.resolve_type(header, call_name, &type_case(&raw_name))?;
                let var = VarDecl::new(
                    type_usage,
                    self.translator.map_identifier(&raw_name, Some(call_name)),
                    false,
                )
                .with_base_name(raw_name);
                response.headers.push(var);
            }
        }

        let schema = node.get("schema").or_else(|| {
            mapping_field(node, "content")
                .and_then(|c| c.values().next())
                .and_then(|media| media.get("schema"))
        });
        let Some(schema) = schema else {
            return Ok(response);
        };

        let name_hint = format!("Response{}", type_case(code));
        let type_usage = if ref_target(schema).is_none() && has_structure(schema) {
            let object = self.analyze_object(schema, call_name, &name_hint)?;
            if object.parent_types.is_empty() {
                response.properties = self.unpack_fields(object.fields, call_name);
                return Ok(response);
            }
            self.schema_usage(object)?
        } else {
            self.resolve_type(schema, call_name, &name_hint)?
        };

        let var = VarDecl::new(
            type_usage,
            self.translator.map_identifier(RESPONSE_DATA, Some(call_name)),
            true,
        )
        .with_base_name(RESPONSE_DATA);
        response.properties.push(var);
        Ok(response)
    }

    /// Fields of an unpacked inline object, renamed within the call's scope
    fn unpack_fields(&self, fields: Vec<VarDecl>, call_name: &str) -> Vec<VarDecl> {
        fields
            .into_iter()
            .map(|mut field| {
                field.name = self.translator.map_identifier(&field.base_name, Some(call_name));
                field
            })
            .collect()
    }
}

/// Follow a `$ref` to a reusable parameter, response or request body
fn deref_node<'a>(root: &'a Value, node: &'a Value) -> Result<&'a Value> {
    match ref_target(node) {
        Some(target) => resolve_pointer(root, target).ok_or_else(|| {
            GeneratorError::Parse(format!("Unresolvable reference '{}'", target))
        }),
        None => Ok(node),
    }
}

/// Path-level parameters overridden by operation parameters with the same
/// name and location
fn merge_parameters<'a>(
    root: &'a Value,
    shared: &'a [Value],
    own: &'a [Value],
) -> Result<Vec<&'a Value>> {
    let key = |node: &'a Value| (str_field(node, "name"), str_field(node, "in"));

    let mut merged: Vec<&Value> = Vec::new();
    for param in shared.iter().chain(own) {
        let param = deref_node(root, param)?;
        match merged.iter().position(|p| key(*p) == key(param)) {
            Some(idx) => merged[idx] = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

/// Whether a `security` list requires any scheme
fn has_requirements(security: &Value) -> bool {
    security.as_sequence().is_some_and(|s| !s.is_empty())
}

/// Operation id for operations that do not declare one, e.g.
/// `get_users_by_userId` for `GET /users/{userId}`
fn synthesize_operation_id(verb: &str, path: &Path) -> String {
    let mut words = vec![verb.to_string()];
    for part in path.parts() {
        let text = path.part_text(part);
        match part.kind {
            PartKind::Literal => words.extend(
                text.split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            ),
            PartKind::Variable => words.push(format!("by_{}", text)),
        }
    }
    words.join("_")
}
