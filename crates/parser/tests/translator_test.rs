//! Integration tests for the description translator

use apigen_common::{ConfigFile, GeneratorError, Model, ParamLocation};
use apigen_parser::{InOut, Translator};
use std::fs;

const CONFIG: &str = r#"
analyzer:
  subst:
    "%CLIENT_MAJOR_VERSION%": r0
  identifiers:
    getRoomEvents/dir: direction
    type: type_
  types:
    integer:
      int64: i64
      "": i32
    number: f64
    boolean: bool
    string:
      date-time: { type: DateTime, imports: chrono }
      "/^(byte|binary)$/": { type: Bytes, imports: bytes }
      "": String
    array: { type: Vec }
    map: { type: HashMap, imports: std::collections::HashMap }
    object: { type: JsonObject, imports: serde_json }
"#;

const ROOMS: &str = r##"
swagger: "2.0"
host: "matrix.org:8448"
basePath: "/_matrix/client/%CLIENT_MAJOR_VERSION%"
consumes: [application/json]
produces: [application/json]
definitions:
  Event:
    type: object
    properties:
      event_id: { type: string }
      origin_server_ts: { type: integer, format: int64 }
      received: { type: string, format: date-time }
      content: { type: object }
    required: [event_id]
  RoomEvent:
    allOf:
      - $ref: "#/definitions/Event"
      - type: object
        properties:
          room_id: { type: string }
  StateEvent:
    allOf:
      - $ref: "#/definitions/RoomEvent"
  Filter:
    type: object
    properties:
      limit: { type: integer }
      types: { type: array, items: { type: string } }
paths:
  "/rooms/{roomId}/messages":
    get:
      operationId: getRoomEvents
      security: [{ accessToken: [] }]
      parameters:
        - { in: path, name: roomId, type: string, required: true }
        - { in: query, name: from, type: string, required: true }
        - { in: query, name: dir, type: string, enum: [b, f] }
        - { in: query, name: limit, type: integer, default: 10 }
      responses:
        200:
          description: A page of room events
          schema:
            type: object
            properties:
              start: { type: string }
              end: { type: string }
              chunk:
                type: array
                items: { $ref: "#/definitions/RoomEvent" }
  "/rooms/{roomId}/send/{eventType}/{txnId}":
    put:
      operationId: sendMessage
      parameters:
        - { in: path, name: roomId, type: string, required: true }
        - { in: path, name: eventType, type: string, required: true }
        - { in: path, name: txnId, type: string, required: true }
        - in: body
          name: body
          schema: { type: object }
      responses:
        200:
          description: The event was sent
          schema:
            type: object
            properties:
              event_id: { type: string }
  "/user/{userId}/filter":
    parameters:
      - { in: path, name: userId, type: string, required: true }
    post:
      operationId: defineFilter
      parameters:
        - in: body
          name: filter
          required: true
          schema: { $ref: "#/definitions/Filter" }
      responses:
        200:
          description: The filter was created
          schema:
            type: object
            properties:
              filter_id: { type: string }
            required: [filter_id]
  /sync:
    get:
      parameters:
        - { in: query, name: since, type: string }
        - { in: query, name: timeout, type: integer }
      responses:
        200:
          description: The latest event
          headers:
            X-Rate-Limit: { type: integer }
          schema: { $ref: "#/definitions/Event" }
"##;

fn translator() -> Translator {
    let config = ConfigFile::from_yaml(CONFIG).unwrap();
    Translator::new(&config.analyzer).unwrap()
}

fn translate(description: &str) -> Model {
    translator()
        .process_str(description, "", "rooms.yaml", InOut::InAndOut, true)
        .unwrap()
}

fn translate_err(description: &str) -> GeneratorError {
    translator()
        .process_str(description, "", "broken.yaml", InOut::InAndOut, true)
        .unwrap_err()
}

fn names<'a>(vars: impl IntoIterator<Item = &'a apigen_common::VarDecl>) -> Vec<&'a str> {
    vars.into_iter().map(|v| v.name.as_str()).collect()
}

#[test]
fn test_translate_rooms_description() {
    let model = translate(ROOMS);

    assert_eq!(model.filename(), "rooms.yaml");
    assert_eq!(model.host_address, "matrix.org:8448");
    assert_eq!(model.base_path, "/_matrix/client/r0");

    let classes: Vec<&str> = model.call_classes().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(classes, ["rooms", "user", "sync"]);
    assert_eq!(model.call_classes()[0].calls.len(), 2);
    assert_eq!(model.calls().count(), 4);
}

#[test]
fn test_definitions_become_schemas() {
    let model = translate(ROOMS);

    let schemas: Vec<&str> = model.types().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(schemas, ["Event", "RoomEvent", "Filter"]);

    let event = model.find_schema("", "Event").unwrap();
    assert_eq!(
        names(&event.fields),
        ["eventId", "originServerTs", "received", "content"]
    );
    assert!(event.fields[0].required);
    assert!(!event.fields[1].required);
    assert_eq!(event.fields[0].base_name, "event_id");
    assert_eq!(event.fields[1].type_usage.name, "i64");
    assert_eq!(event.fields[2].type_usage.name, "DateTime");
    assert_eq!(event.fields[3].type_usage.name, "JsonObject");

    let room_event = model.find_schema("", "RoomEvent").unwrap();
    assert_eq!(room_event.parent_types.len(), 1);
    assert_eq!(room_event.parent_types[0].name, "Event");
    assert_eq!(names(&room_event.fields), ["roomId"]);

    let filter = model.find_schema("", "Filter").unwrap();
    let types = &filter.fields[1].type_usage;
    assert_eq!(types.to_string(), "Vec<String>");
}

#[test]
fn test_imports_are_collected() {
    let model = translate(ROOMS);
    let imports: Vec<&str> = model.imports().iter().map(String::as_str).collect();
    assert_eq!(imports, ["chrono", "serde_json"]);
}

#[test]
fn test_call_parameters() {
    let model = translate(ROOMS);
    let call = model.find_call("getRoomEvents").unwrap();

    assert_eq!(call.verb, "get");
    assert_eq!(call.path.as_str(), "/rooms/{roomId}/messages");
    assert!(call.needs_security);
    assert_eq!(call.produced_content_types, ["application/json"]);
    assert_eq!(call.consumed_content_types, ["application/json"]);

    assert_eq!(names(&call.params[ParamLocation::Path]), ["roomId"]);
    assert_eq!(
        names(&call.params[ParamLocation::Query]),
        ["from", "direction", "limit"]
    );
    let limit = &call.params.query[2];
    assert_eq!(limit.type_usage.name, "i32");
    assert_eq!(limit.default_value.as_deref(), Some("10"));
    assert_eq!(call.params.query[1].base_name, "dir");

    assert_eq!(
        names(&call.collate_params()),
        ["roomId", "from", "direction", "limit"]
    );
}

#[test]
fn test_inline_response_is_unpacked() {
    let model = translate(ROOMS);
    let call = model.find_call("getRoomEvents").unwrap();

    assert_eq!(call.responses.len(), 1);
    let response = &call.responses[0];
    assert_eq!(response.code, "200");
    assert_eq!(names(&response.properties), ["start", "end", "chunk"]);

    let chunk = &response.properties[2].type_usage;
    assert_eq!(chunk.name, "Vec");
    assert_eq!(chunk.inner_types[0].name, "RoomEvent");
}

#[test]
fn test_referenced_response_is_data_property() {
    let model = translate(ROOMS);
    let call = model.find_call("getSync").unwrap();

    assert!(!call.needs_security);
    let response = &call.responses[0];
    assert_eq!(names(&response.headers), ["xRateLimit"]);
    assert_eq!(response.headers[0].base_name, "X-Rate-Limit");
    assert_eq!(names(&response.properties), ["data"]);
    assert_eq!(response.properties[0].type_usage.name, "Event");
}

#[test]
fn test_body_parameters() {
    let model = translate(ROOMS);

    let send = model.find_call("sendMessage").unwrap();
    assert!(send.inline_body);
    assert_eq!(names(&send.params.body), ["body"]);
    assert_eq!(send.params.body[0].type_usage.name, "JsonObject");
    assert_eq!(
        names(&send.params.path),
        ["roomId", "eventType", "txnId"]
    );

    let define = model.find_call("defineFilter").unwrap();
    assert!(!define.inline_body);
    assert_eq!(names(&define.params.path), ["userId"]);
    assert_eq!(names(&define.params.body), ["filter"]);
    assert!(define.params.body[0].required);
    assert_eq!(define.params.body[0].type_usage.name, "Filter");
}

#[test]
fn test_inline_body_object_is_unpacked() {
    let model = translate(
        r#"
paths:
  /login:
    post:
      operationId: login
      parameters:
        - in: body
          name: body
          required: true
          schema:
            type: object
            properties:
              user: { type: string }
              password: { type: string }
              type: { type: string, default: m.login.password }
            required: [user, password]
"#,
    );
    let call = model.find_call("login").unwrap();
    assert!(!call.inline_body);
    assert_eq!(names(&call.params.body), ["user", "password", "type_"]);
    assert_eq!(
        call.params.body[2].default_value.as_deref(),
        Some("m.login.password")
    );
    assert!(model.types().is_empty());
}

#[test]
fn test_unpacked_fields_use_call_scope() {
    let config = ConfigFile::from_yaml(
        r#"
analyzer:
  identifiers:
    login/type: loginType
    type: type_
  types:
    string: String
"#,
    )
    .unwrap();
    let model = Translator::new(&config.analyzer)
        .unwrap()
        .process_str(
            r#"
paths:
  /login:
    post:
      operationId: login
      parameters:
        - { in: query, name: type, type: string }
        - in: body
          name: body
          schema:
            type: object
            properties:
              type: { type: string }
      responses:
        200:
          description: Logged in
          schema:
            type: object
            properties:
              type: { type: string }
"#,
            "",
            "login.yaml",
            InOut::InAndOut,
            true,
        )
        .unwrap();

    let call = model.find_call("login").unwrap();
    assert_eq!(names(&call.params.query), ["loginType"]);
    assert_eq!(names(&call.params.body), ["loginType"]);
    assert_eq!(call.params.body[0].base_name, "type");
    assert_eq!(names(&call.responses[0].properties), ["loginType"]);
}

#[test]
fn test_trivial_schemas() {
    let model = translate(ROOMS);
    assert!(model.find_schema("", "StateEvent").is_none());

    let model = translator()
        .process_str(ROOMS, "", "rooms.yaml", InOut::InAndOut, false)
        .unwrap();
    let state_event = model.find_schema("", "StateEvent").unwrap();
    assert!(state_event.is_trivial());
    assert_eq!(state_event.parent_types[0].name, "RoomEvent");
}

#[test]
fn test_in_out_selection() {
    let translator = translator();

    let model = translator
        .process_str(ROOMS, "", "rooms.yaml", InOut::In, true)
        .unwrap();
    assert!(model.calls().all(|c| c.responses.is_empty()));
    assert_eq!(model.find_call("getRoomEvents").unwrap().params.query.len(), 3);

    let model = translator
        .process_str(ROOMS, "", "rooms.yaml", InOut::Out, true)
        .unwrap();
    assert!(model.calls().all(|c| c.collate_params().is_empty()));
    assert_eq!(model.find_call("getSync").unwrap().responses.len(), 1);
}

#[test]
fn test_additional_properties_and_external_refs() {
    let model = translate(
        r#"
paths:
  "/rooms/{roomId}/state":
    get:
      operationId: getRoomState
      parameters:
        - { in: path, name: roomId, type: string, required: true }
      responses:
        200:
          description: State events keyed by type
          schema:
            type: object
            additionalProperties: { $ref: "definitions/state_event.yaml" }
"#,
    );
    let call = model.find_call("getRoomState").unwrap();
    let data = &call.responses[0].properties[0];
    assert_eq!(data.name, "data");
    assert_eq!(data.type_usage.name, "HashMap");
    assert_eq!(data.type_usage.inner_types[0].name, "StateEvent");

    let imports: Vec<&str> = model.imports().iter().map(String::as_str).collect();
    assert_eq!(imports, ["definitions/state_event", "std::collections::HashMap"]);
}

#[test]
fn test_openapi3_request_body() {
    let model = translate(
        r##"
openapi: "3.0.0"
components:
  schemas:
    Pod:
      type: object
      properties:
        name: { type: string }
paths:
  "/namespaces/{namespace}/pods":
    post:
      operationId: createPod
      parameters:
        - name: namespace
          in: path
          required: true
          schema: { type: string }
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: "#/components/schemas/Pod" }
      responses:
        201:
          description: Created
          content:
            application/json:
              schema: { $ref: "#/components/schemas/Pod" }
"##,
    );
    let call = model.find_call("createPod").unwrap();
    assert_eq!(call.params.path[0].type_usage.name, "String");
    assert_eq!(names(&call.params.body), ["body"]);
    assert_eq!(call.params.body[0].type_usage.name, "Pod");
    assert!(!call.inline_body);
    assert_eq!(call.consumed_content_types, ["application/json"]);
    assert_eq!(call.responses[0].code, "201");
    assert_eq!(call.responses[0].properties[0].type_usage.name, "Pod");
}

#[test]
fn test_recursive_definitions() {
    let model = translate(
        r##"
definitions:
  Node:
    type: object
    properties:
      children:
        type: array
        items: { $ref: "#/definitions/Node" }
"##,
    );
    let node = model.find_schema("", "Node").unwrap();
    let children = &node.fields[0].type_usage;
    assert_eq!(children.to_string(), "Vec<Node>");
}

#[test]
fn test_trivial_schema_in_a_cycle_is_kept() {
    let model = translate(
        r##"
definitions:
  Thread:
    allOf:
      - $ref: "#/definitions/Message"
  Message:
    type: object
    properties:
      thread: { $ref: "#/definitions/Thread" }
"##,
    );

    let schemas: Vec<&str> = model.types().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(schemas, ["Message", "Thread"]);

    let message = model.find_schema("", "Message").unwrap();
    let thread = &message.fields[0].type_usage;
    assert_eq!(thread.name, "Thread");
    assert!(model.find_schema(&thread.scope, &thread.name).is_some());

    let thread = model.find_schema("", "Thread").unwrap();
    assert!(thread.is_trivial());
    assert_eq!(thread.parent_types[0].name, "Message");
}

#[test]
fn test_missing_path_parameter() {
    let description = r#"
paths:
  "/rooms/{roomId}/messages":
    get:
      operationId: getRoomEvents
      responses: {}
"#;
    let err = translate_err(description);
    match err.root() {
        GeneratorError::MissingPathParameter { call, parameter, .. } => {
            assert_eq!(call, "getRoomEvents");
            assert_eq!(parameter, "roomId");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("broken.yaml: get /rooms/{roomId}/messages: "));

    // Only parameters are checked against the path
    let model = translator()
        .process_str(description, "", "broken.yaml", InOut::Out, true)
        .unwrap();
    assert_eq!(model.calls().count(), 1);
}

#[test]
fn test_undeclared_path_parameter() {
    let err = translate_err(
        r#"
paths:
  /sync:
    get:
      operationId: sync
      parameters:
        - { in: path, name: roomId, type: string }
"#,
    );
    assert!(matches!(
        err.root(),
        GeneratorError::MissingPathParameter { parameter, .. } if parameter == "roomId"
    ));
}

#[test]
fn test_duplicate_operation() {
    let err = translate_err(
        r#"
paths:
  /sync:
    get:
      operationId: sync
  /events:
    get:
      operationId: sync
"#,
    );
    assert!(matches!(
        err.root(),
        GeneratorError::DuplicateOperation { operation_id, path }
            if operation_id == "sync" && path == "/events"
    ));
}

#[test]
fn test_conflicting_schemas() {
    let err = translate_err(
        r#"
definitions:
  room_event:
    type: object
    properties:
      room_id: { type: string }
  RoomEvent:
    type: object
    properties:
      event_id: { type: string }
"#,
    );
    assert!(matches!(
        err.root(),
        GeneratorError::SchemaConflict { name } if name == "RoomEvent"
    ));
    assert!(err.to_string().contains("definition RoomEvent"));
}

#[test]
fn test_unmapped_type() {
    let err = translate_err(
        r#"
paths:
  /upload:
    post:
      operationId: upload
      parameters:
        - { in: formData, name: file, type: file }
"#,
    );
    assert!(matches!(
        err.root(),
        GeneratorError::UnmappedType { type_name, .. } if type_name == "file"
    ));
}

#[test]
fn test_unsupported_parameter_location() {
    let err = translate_err(
        r#"
paths:
  /sync:
    get:
      parameters:
        - { in: cookie, name: session, type: string }
"#,
    );
    assert!(matches!(err.root(), GeneratorError::Parse(msg) if msg.contains("cookie")));
}

#[test]
fn test_malformed_path() {
    let err = translate_err(
        r#"
paths:
  "/rooms/{roomId":
    get:
      operationId: getRoom
"#,
    );
    assert!(matches!(err.root(), GeneratorError::MalformedPath { .. }));
}

#[test]
fn test_invalid_yaml_names_file() {
    let err = translate_err("paths: [unclosed");
    assert!(matches!(err, GeneratorError::InFile { ref file, .. } if file == "broken.yaml"));
    assert!(matches!(err.root(), GeneratorError::Yaml(_)));
}

#[test]
fn test_process_file() {
    let dir = tempfile::tempdir().unwrap();
    let api_dir = dir.path().join("client");
    fs::create_dir_all(&api_dir).unwrap();
    let file = api_dir.join("rooms.yaml");
    fs::write(&file, ROOMS).unwrap();

    let model = translator()
        .process_file(&file, dir.path(), InOut::InAndOut, true)
        .unwrap();
    assert_eq!(model.file_dir(), "client");
    assert_eq!(model.filename(), "rooms.yaml");
    assert_eq!(model.calls().count(), 4);
}

#[test]
fn test_process_file_errors_name_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.yaml");
    fs::write(&file, "paths:\n  \"/x/{id}\":\n    get: {}\n").unwrap();

    let err = translator()
        .process_file(&file, dir.path(), InOut::InAndOut, true)
        .unwrap_err();
    match &err {
        GeneratorError::InFile { file: name, source } => {
            assert_eq!(name, &file.display().to_string());
            assert!(!matches!(**source, GeneratorError::InFile { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    let missing = dir.path().join("missing.yaml");
    let err = translator()
        .process_file(&missing, dir.path(), InOut::InAndOut, true)
        .unwrap_err();
    assert!(matches!(err.root(), GeneratorError::Parse(_)));
}

#[test]
fn test_translator_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("apigen.yaml");
    fs::write(&config, CONFIG).unwrap();

    let translator = Translator::from_config_file(&config).unwrap();
    assert_eq!(translator.map_identifier("type", None), "type_");
    assert_eq!(
        translator.map_type("string", Some("byte"), None).unwrap().name,
        "Bytes"
    );
    assert_eq!(
        translator.substitute("/_matrix/client/%CLIENT_MAJOR_VERSION%"),
        "/_matrix/client/r0"
    );
}
