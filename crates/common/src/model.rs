//! API model handed from the translator to printers

use crate::path::Path;
use crate::util::qualified_name;
use crate::{GeneratorError, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// Name of the list attribute carrying import identifiers
pub const IMPORTS_LIST: &str = "imports";

/// A type as it is used in generated code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeUsage {
    pub scope: String,
    /// Spelling in the generated code
    pub name: String,
    /// Spelling in the API description
    pub base_name: String,
    pub attributes: HashMap<String, String>,
    pub lists: HashMap<String, Vec<String>>,
    /// Template parameters
    pub inner_types: Vec<TypeUsage>,
}

impl TypeUsage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_import(name: impl Into<String>, import: impl Into<String>) -> Self {
        let mut usage = Self::new(name);
        usage.add_import(import);
        usage
    }

    /// Usage of a registered schema
    pub fn from_schema(schema: &ObjectSchema) -> Self {
        Self {
            scope: schema.scope.clone(),
            name: schema.name.clone(),
            base_name: schema.name.clone(),
            ..Default::default()
        }
    }

    /// A copy of this (template) type with `inner` appended as a parameter
    ///
    /// # Examples
    /// ```
    /// use apigen_common::TypeUsage;
    ///
    /// let list = TypeUsage::with_import("Vec", "std::vec::Vec");
    /// let rooms = list.instantiate(TypeUsage::new("RoomId"));
    /// assert_eq!(rooms.inner_types, vec![TypeUsage::new("RoomId")]);
    /// assert_eq!(rooms.imports(), ["std::vec::Vec"]);
    /// ```
    pub fn instantiate(&self, inner: TypeUsage) -> TypeUsage {
        let mut usage = self.clone();
        usage.inner_types.push(inner);
        usage
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn imports(&self) -> &[String] {
        self.lists
            .get(IMPORTS_LIST)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn add_import(&mut self, import: impl Into<String>) {
        self.lists
            .entry(IMPORTS_LIST.to_string())
            .or_default()
            .push(import.into());
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(&self.scope, &self.name)
    }
}

impl std::fmt::Display for TypeUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified_name())?;
        if !self.inner_types.is_empty() {
            let inner: Vec<String> = self.inner_types.iter().map(ToString::to_string).collect();
            write!(f, "<{}>", inner.join(", "))?;
        }
        Ok(())
    }
}

/// A named, typed field or parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDecl {
    #[serde(rename = "type")]
    pub type_usage: TypeUsage,
    pub name: String,
    /// Name as spelled in the API description
    pub base_name: String,
    pub required: bool,
    pub default_value: Option<String>,
}

impl VarDecl {
    pub fn new(type_usage: TypeUsage, name: impl Into<String>, required: bool) -> Self {
        let name = name.into();
        Self {
            type_usage,
            base_name: name.clone(),
            name,
            required,
            default_value: None,
        }
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// `"<type> <name>"`, optionally followed by `" = <default>"`
    pub fn render(&self, with_default: bool) -> String {
        let mut s = format!("{} {}", self.type_usage, self.name);
        if let (true, Some(default)) = (with_default, &self.default_value) {
            s.push_str(" = ");
            s.push_str(default);
        }
        s
    }
}

pub type VarDecls = Vec<VarDecl>;

/// A structured type defined by the API description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectSchema {
    /// Empty for top-level schemas, the owning call's name otherwise
    pub scope: String,
    pub name: String,
    pub parent_types: Vec<TypeUsage>,
    pub fields: VarDecls,
}

impl ObjectSchema {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parent_types.is_empty() && self.fields.is_empty()
    }

    /// A pure alias of its only parent
    pub fn is_trivial(&self) -> bool {
        self.parent_types.len() == 1 && self.fields.is_empty()
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(&self.scope, &self.name)
    }
}

/// Location of a call parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    pub const ALL: [ParamLocation; 4] = [
        ParamLocation::Path,
        ParamLocation::Query,
        ParamLocation::Header,
        ParamLocation::Body,
    ];

    /// Map a description `in` token to a parameter block
    ///
    /// Form data travels in the request body.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "body" | "formData" => Some(ParamLocation::Body),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Body => "body",
        }
    }
}

/// The four parameter blocks of a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params {
    pub path: VarDecls,
    pub query: VarDecls,
    pub header: VarDecls,
    pub body: VarDecls,
}

impl Params {
    pub fn iter(&self) -> impl Iterator<Item = (ParamLocation, &VarDecls)> {
        ParamLocation::ALL.into_iter().map(move |loc| (loc, &self[loc]))
    }
}

impl Index<ParamLocation> for Params {
    type Output = VarDecls;

    fn index(&self, loc: ParamLocation) -> &VarDecls {
        match loc {
            ParamLocation::Path => &self.path,
            ParamLocation::Query => &self.query,
            ParamLocation::Header => &self.header,
            ParamLocation::Body => &self.body,
        }
    }
}

impl IndexMut<ParamLocation> for Params {
    fn index_mut(&mut self, loc: ParamLocation) -> &mut VarDecls {
        match loc {
            ParamLocation::Path => &mut self.path,
            ParamLocation::Query => &mut self.query,
            ParamLocation::Header => &mut self.header,
            ParamLocation::Body => &mut self.body,
        }
    }
}

/// One response of a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// Status code, or `default`
    pub code: String,
    pub headers: VarDecls,
    pub properties: VarDecls,
}

impl Response {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }
}

/// One API operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    pub path: Path,
    pub verb: String,
    pub name: String,
    pub params: Params,
    pub needs_security: bool,
    /// The body is a single value rather than a set of named fields
    pub inline_body: bool,
    pub produced_content_types: Vec<String>,
    pub consumed_content_types: Vec<String>,
    pub responses: Vec<Response>,
}

impl Call {
    pub fn new(path: Path, verb: impl Into<String>, name: impl Into<String>, needs_security: bool) -> Self {
        Self {
            path,
            verb: verb.into(),
            name: name.into(),
            params: Params::default(),
            needs_security,
            inline_body: false,
            produced_content_types: Vec::new(),
            consumed_content_types: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Look up a parameter block by its description token
    pub fn params_block(&self, token: &str) -> Option<&VarDecls> {
        ParamLocation::from_token(token).map(|loc| &self.params[loc])
    }

    /// All parameters, required ones first
    ///
    /// Within each group parameters keep their block order (path, query,
    /// header, body) and their order inside the block.
    pub fn collate_params(&self) -> VarDecls {
        let (required, optional): (Vec<&VarDecl>, Vec<&VarDecl>) = self
            .params
            .iter()
            .flat_map(|(_, block)| block.iter())
            .partition(|p| p.required);
        required.into_iter().chain(optional).cloned().collect()
    }

    /// Check that path template variables and path parameters match up
    pub fn validate_path_params(&self) -> Result<()> {
        let declared: BTreeSet<&str> = self
            .params
            .path
            .iter()
            .map(|p| p.base_name.as_str())
            .collect();
        let used: BTreeSet<&str> = self.path.variables().collect();

        if let Some(missing) = used.difference(&declared).next() {
            return Err(GeneratorError::MissingPathParameter {
                call: self.name.clone(),
                parameter: missing.to_string(),
                detail: format!("is used in '{}' but not declared", self.path),
            });
        }
        if let Some(unused) = declared.difference(&used).next() {
            return Err(GeneratorError::MissingPathParameter {
                call: self.name.clone(),
                parameter: unused.to_string(),
                detail: format!("is declared but does not appear in '{}'", self.path),
            });
        }
        Ok(())
    }
}

/// Calls sharing a leading path segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallClass {
    pub name: String,
    pub calls: Vec<Call>,
}

/// Translation result for one API description file
#[derive(Debug, Serialize)]
pub struct Model {
    file_dir: String,
    filename: String,
    pub host_address: String,
    pub base_path: String,
    imports: BTreeSet<String>,
    types: Vec<ObjectSchema>,
    call_classes: Vec<CallClass>,
}

impl Model {
    pub fn new(file_dir: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            file_dir: file_dir.into(),
            filename: filename.into(),
            host_address: String::new(),
            base_path: String::new(),
            imports: BTreeSet::new(),
            types: Vec::new(),
            call_classes: Vec::new(),
        }
    }

    /// Directory of the description file, relative to the input base
    pub fn file_dir(&self) -> &str {
        &self.file_dir
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Collected imports, in sorted order
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    pub fn types(&self) -> &[ObjectSchema] {
        &self.types
    }

    pub fn call_classes(&self) -> &[CallClass] {
        &self.call_classes
    }

    pub fn calls(&self) -> impl Iterator<Item = &Call> {
        self.call_classes.iter().flat_map(|c| c.calls.iter())
    }

    pub fn find_call(&self, name: &str) -> Option<&Call> {
        self.calls().find(|c| c.name == name)
    }

    pub fn find_schema(&self, scope: &str, name: &str) -> Option<&ObjectSchema> {
        self.types.iter().find(|s| s.scope == scope && s.name == name)
    }

    /// Register a call under the call class of its leading path segment
    pub fn add_call(
        &mut self,
        path: Path,
        verb: impl Into<String>,
        operation_id: impl Into<String>,
        needs_security: bool,
    ) -> Result<CallMut<'_>> {
        let operation_id = operation_id.into();
        if self.calls().any(|c| c.name == operation_id) {
            return Err(GeneratorError::DuplicateOperation {
                operation_id,
                path: path.to_string(),
            });
        }

        let class_name = path.leading_segment().to_string();
        let class_idx = match self.call_classes.iter().position(|c| c.name == class_name) {
            Some(idx) => idx,
            None => {
                self.call_classes.push(CallClass {
                    name: class_name,
                    calls: Vec::new(),
                });
                self.call_classes.len() - 1
            }
        };

        let calls = &mut self.call_classes[class_idx].calls;
        calls.push(Call::new(path, verb, operation_id, needs_security));
        let idx = calls.len() - 1;
        Ok(CallMut {
            call: &mut calls[idx],
            imports: &mut self.imports,
        })
    }

    /// Append a variable to a block not owned by the model yet
    pub fn add_var_decl(&mut self, block: &mut VarDecls, var: VarDecl) {
        self.add_imports(&var.type_usage);
        block.push(var);
    }

    /// Register a schema
    ///
    /// Empty schemas are not registered. Registering a schema equal to an
    /// already registered one is a no-op.
    pub fn add_schema(&mut self, schema: ObjectSchema) -> Result<()> {
        if schema.is_empty() {
            return Ok(());
        }
        if let Some(existing) = self.find_schema(&schema.scope, &schema.name) {
            return if *existing == schema {
                Ok(())
            } else {
                Err(GeneratorError::SchemaConflict {
                    name: schema.qualified_name(),
                })
            };
        }

        for parent in &schema.parent_types {
            fold_imports(&mut self.imports, parent);
        }
        for field in &schema.fields {
            fold_imports(&mut self.imports, &field.type_usage);
        }
        self.types.push(schema);
        Ok(())
    }

    /// Fold the imports of a type and its parameters into the model
    pub fn add_imports(&mut self, type_usage: &TypeUsage) {
        fold_imports(&mut self.imports, type_usage);
    }
}

fn fold_imports(imports: &mut BTreeSet<String>, type_usage: &TypeUsage) {
    imports.extend(type_usage.imports().iter().cloned());
    for inner in &type_usage.inner_types {
        fold_imports(imports, inner);
    }
}

/// Mutable handle to a call registered in a [`Model`]
///
/// Variables added through the handle contribute their imports to the
/// owning model.
pub struct CallMut<'a> {
    call: &'a mut Call,
    imports: &'a mut BTreeSet<String>,
}

impl CallMut<'_> {
    pub fn add_param(&mut self, location: ParamLocation, var: VarDecl) {
        fold_imports(self.imports, &var.type_usage);
        self.call.params[location].push(var);
    }

    pub fn add_response(&mut self, response: Response) {
        for var in response.headers.iter().chain(&response.properties) {
            fold_imports(self.imports, &var.type_usage);
        }
        self.call.responses.push(response);
    }
}

impl Deref for CallMut<'_> {
    type Target = Call;

    fn deref(&self) -> &Call {
        &*self.call
    }
}

impl DerefMut for CallMut<'_> {
    fn deref_mut(&mut self) -> &mut Call {
        &mut *self.call
    }
}
