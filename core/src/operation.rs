#![deny(missing_docs)]

//! # Operation Fixtures
//!
//! Top-level entry points that work on whole operations rather than single
//! schemas: normalizing request and response bodies, collecting every
//! example an operation needs for a test fixture, and normalizing all
//! named schemas of a document.
//!
//! Every function here is one top-level call: it builds its own
//! [`RefResolver`], so a failure in one call never affects another.

use crate::error::{AppError, AppResult};
use crate::oas::document::DocumentKind;
use crate::oas::pointer::{join_pointer, navigate};
use crate::oas::resolver::{ref_pointer, RefResolver};
use crate::options::EngineOptions;
use crate::sample::chain::Synthesizer;
use crate::sample::media::{collect_media_examples, preferred_media_type};
use crate::sample::params::{resolve_header, resolve_parameter, ParameterExample};
use crate::schema::model::{NormalizedSchema, SchemaContext};
use crate::schema::normalize::{normalize_pointer, normalize_schema};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Path-item keys that hold operations.
pub const HTTP_METHODS: [&str; 9] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace", "query",
];

const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Identifies one operation: `#/paths/<path>/<method>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OperationRef {
    /// Path template, e.g. `/pets/{id}`.
    pub path: String,
    /// Lower-case HTTP method.
    pub method: String,
}

impl OperationRef {
    /// Creates a reference; the method is lower-cased.
    pub fn new(path: impl Into<String>, method: &str) -> Self {
        Self {
            path: path.into(),
            method: method.to_ascii_lowercase(),
        }
    }

    /// Pointer of the path item.
    pub fn path_item_pointer(&self) -> String {
        join_pointer("#/paths", &self.path)
    }

    /// Pointer of the operation.
    pub fn pointer(&self) -> String {
        join_pointer(&self.path_item_pointer(), &self.method)
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.to_ascii_uppercase(), self.path)
    }
}

/// Examples for one body, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyExamples {
    /// The media type the examples were taken from.
    pub media_type: String,
    /// Literal examples first, the schema-derived one last.
    pub examples: Vec<Value>,
}

/// Example data for one response status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFixture {
    /// Response description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Body examples, if the response has a body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyExamples>,
    /// Response header values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<ParameterExample>,
}

/// Everything needed to exercise one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationFixture {
    /// Path template.
    pub path: String,
    /// Lower-case HTTP method.
    pub method: String,
    /// `operationId`, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Path-item and operation parameters, excluding Swagger 2 body parameters.
    pub parameters: Vec<ParameterExample>,
    /// Request body examples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<BodyExamples>,
    /// Response examples keyed by status code (or `default`).
    pub responses: IndexMap<String, ResponseFixture>,
}

/// Lists every operation of the document in declaration order.
pub fn list_operations(document: &Value) -> Vec<OperationRef> {
    let Some(Value::Object(paths)) = document.get("paths") else {
        return Vec::new();
    };
    let resolver = RefResolver::new(document);
    paths
        .iter()
        .flat_map(|(path, item)| {
            let item = resolver.peek(item);
            HTTP_METHODS
                .iter()
                .filter(move |method| item.get(**method).is_some_and(Value::is_object))
                .map(move |method| OperationRef::new(path.clone(), method))
        })
        .collect()
}

/// Normalizes the request body schema of `op` in the `request` context.
///
/// Returns `None` if the operation takes no body.
pub fn normalize_request_body(
    document: &Value,
    op: &OperationRef,
    options: &EngineOptions,
) -> AppResult<Option<NormalizedSchema>> {
    let resolver = RefResolver::new(document);
    let operation = find_operation(document, op)?;
    match request_body(&resolver, document, op, operation) {
        Some(body) => {
            debug!(operation = %op, location = %body.schema_location, "normalizing request body");
            normalize_schema(
                document,
                body.schema,
                &body.schema_location,
                SchemaContext::Request,
                options,
            )
            .map(Some)
        }
        None => Ok(None),
    }
}

/// Normalizes the body schema of response `status` of `op` in the
/// `response` context.
///
/// Returns `None` if the response has no body.
pub fn normalize_response_body(
    document: &Value,
    op: &OperationRef,
    status: &str,
    options: &EngineOptions,
) -> AppResult<Option<NormalizedSchema>> {
    let resolver = RefResolver::new(document);
    let operation = find_operation(document, op)?;
    let responses_location = join_pointer(&op.pointer(), "responses");
    let Some(response) = operation.get("responses").and_then(|r| r.get(status)) else {
        return Err(AppError::General(format!(
            "Operation {} has no response '{}'",
            op, status
        )));
    };
    let location = join_pointer(&responses_location, status);
    match response_body(&resolver, document, operation, response, &location) {
        Some(body) => normalize_schema(
            document,
            body.schema,
            &body.schema_location,
            SchemaContext::Response,
            options,
        )
        .map(Some),
        None => Ok(None),
    }
}

/// Collects parameter, request body and response examples for `op`.
///
/// Parameters declared on the path item are inherited; an operation-level
/// parameter with the same `(name, in)` replaces it.
pub fn build_operation_fixture(
    document: &Value,
    op: &OperationRef,
    options: &EngineOptions,
) -> AppResult<OperationFixture> {
    let operation = find_operation(document, op)?;
    let op_pointer = op.pointer();
    let mut resolver = RefResolver::new(document);
    let request = Synthesizer::new(SchemaContext::Request, options);
    let response = Synthesizer::new(SchemaContext::Response, options);

    let mut parameters = Vec::new();
    for (node, location) in merged_parameters(&resolver, document, op, operation) {
        if resolver.peek(node).get("in").and_then(Value::as_str) == Some("body") {
            continue;
        }
        parameters.push(resolve_parameter(&request, &mut resolver, node, &location)?);
    }

    let request_body = match request_body(&resolver, document, op, operation) {
        Some(body) => Some(body_examples(&request, &mut resolver, body)?),
        None => None,
    };

    let mut responses = IndexMap::new();
    if let Some(Value::Object(declared)) = operation.get("responses") {
        let responses_location = join_pointer(&op_pointer, "responses");
        for (status, node) in declared {
            if status.starts_with("x-") {
                continue;
            }
            let location = join_pointer(&responses_location, status);
            let fixture =
                response_fixture(&response, &mut resolver, operation, node, &location)?;
            responses.insert(status.clone(), fixture);
        }
    }

    if !resolver.is_idle() {
        warn!(operation = %op, "reference visits left open after fixture");
    }
    info!(
        operation = %op,
        parameters = parameters.len(),
        responses = responses.len(),
        "built fixture"
    );

    Ok(OperationFixture {
        path: op.path.clone(),
        method: op.method.clone(),
        operation_id: operation
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string),
        parameters,
        request_body,
        responses,
    })
}

/// Normalizes every named schema of the document independently.
///
/// Schemas live under `#/components/schemas` (OpenAPI 3) or
/// `#/definitions` (Swagger 2). An error in one entry is recorded for that
/// entry and does not stop the others.
pub fn normalize_components(
    document: &Value,
    context: SchemaContext,
    options: &EngineOptions,
) -> IndexMap<String, AppResult<NormalizedSchema>> {
    let section = DocumentKind::detect(document).schemas_pointer();
    let Some(Value::Object(schemas)) = navigate(document, section) else {
        debug!(section, "document has no named schemas");
        return IndexMap::new();
    };
    schemas
        .keys()
        .map(|name| {
            let pointer = join_pointer(section, name);
            let result = normalize_pointer(document, &pointer, context, options);
            if let Err(err) = &result {
                warn!(schema = %name, error = %err, "schema failed to normalize");
            }
            (name.clone(), result)
        })
        .collect()
}

/// A body schema together with the media type and pointer it came from.
struct BodySource<'a> {
    media_type: String,
    /// The Media Type Object (OpenAPI 3 only) and its pointer.
    media: Option<(&'a Value, String)>,
    schema: &'a Value,
    schema_location: String,
    literal_examples: Vec<Value>,
}

fn find_operation<'a>(document: &'a Value, op: &OperationRef) -> AppResult<&'a Value> {
    let resolver = RefResolver::new(document);
    navigate(document, &op.path_item_pointer())
        .map(|item| resolver.peek(item))
        .and_then(|item| item.get(&op.method))
        .filter(|operation| operation.is_object())
        .ok_or_else(|| AppError::General(format!("Operation {} not found", op)))
}

/// Follows `node` through references, reporting the pointer of the target.
fn follow<'a>(resolver: &RefResolver<'a>, node: &'a Value, location: &str) -> (&'a Value, String) {
    let mut location = location.to_string();
    let mut current = node;
    let mut seen = HashSet::new();
    while let Some(pointer) = ref_pointer(current) {
        if !seen.insert(pointer) {
            break;
        }
        let Some(target) = resolver.lookup(pointer) else {
            break;
        };
        location = pointer.to_string();
        current = target;
    }
    (current, location)
}

fn merged_parameters<'a>(
    resolver: &RefResolver<'a>,
    document: &'a Value,
    op: &OperationRef,
    operation: &'a Value,
) -> Vec<(&'a Value, String)> {
    let item_pointer = op.path_item_pointer();
    let path_item = navigate(document, &item_pointer).map(|item| resolver.peek(item));
    let mut merged: Vec<(&'a Value, String)> = Vec::new();

    let levels = [
        (path_item.and_then(|item| item.get("parameters")), item_pointer),
        (operation.get("parameters"), op.pointer()),
    ];
    for (parameters, base) in levels {
        let Some(Value::Array(parameters)) = parameters else {
            continue;
        };
        let base = join_pointer(&base, "parameters");
        for (i, node) in parameters.iter().enumerate() {
            let location = join_pointer(&base, &i.to_string());
            let key = parameter_key(resolver.peek(node));
            match merged
                .iter()
                .position(|(existing, _)| parameter_key(resolver.peek(existing)) == key)
            {
                Some(index) => merged[index] = (node, location),
                None => merged.push((node, location)),
            }
        }
    }
    merged
}

fn parameter_key(node: &Value) -> (Option<&str>, Option<&str>) {
    (
        node.get("name").and_then(Value::as_str),
        node.get("in").and_then(Value::as_str),
    )
}

fn request_body<'a>(
    resolver: &RefResolver<'a>,
    document: &'a Value,
    op: &OperationRef,
    operation: &'a Value,
) -> Option<BodySource<'a>> {
    if let Some(body) = operation.get("requestBody") {
        let (body, location) = follow(resolver, body, &join_pointer(&op.pointer(), "requestBody"));
        return content_body(body, &location);
    }

    // Swagger 2: a single `in: body` parameter, declared on the operation or its path item.
    let parameters = merged_parameters(resolver, document, op, operation);
    parameters.into_iter().find_map(|(node, location)| {
        let (param, location) = follow(resolver, node, &location);
        if param.get("in").and_then(Value::as_str) != Some("body") {
            return None;
        }
        Some(BodySource {
            media_type: declared_media_type(document, operation, "consumes"),
            media: None,
            schema: param.get("schema")?,
            schema_location: join_pointer(&location, "schema"),
            literal_examples: Vec::new(),
        })
    })
}

fn response_body<'a>(
    resolver: &RefResolver<'a>,
    document: &'a Value,
    operation: &'a Value,
    response: &'a Value,
    location: &str,
) -> Option<BodySource<'a>> {
    let (response, location) = follow(resolver, response, location);
    if response.get("content").is_some() {
        return content_body(response, &location);
    }

    // Swagger 2: `schema` plus `examples` keyed by media type.
    let schema = response.get("schema")?;
    let media_type = declared_media_type(document, operation, "produces");
    let literal_examples = response
        .get("examples")
        .and_then(|examples| examples.get(&media_type))
        .cloned()
        .into_iter()
        .collect();
    Some(BodySource {
        media_type,
        media: None,
        schema,
        schema_location: join_pointer(&location, "schema"),
        literal_examples,
    })
}

fn content_body<'a>(holder: &'a Value, location: &str) -> Option<BodySource<'a>> {
    let Some(Value::Object(content)) = holder.get("content") else {
        return None;
    };
    let (media_type, media) = preferred_media_type(content)?;
    let media_location = join_pointer(&join_pointer(location, "content"), media_type);
    Some(BodySource {
        media_type: media_type.clone(),
        schema: media.get("schema")?,
        schema_location: join_pointer(&media_location, "schema"),
        media: Some((media, media_location)),
        literal_examples: Vec::new(),
    })
}

fn declared_media_type(document: &Value, operation: &Value, key: &str) -> String {
    operation
        .get(key)
        .or_else(|| document.get(key))
        .and_then(Value::as_array)
        .and_then(|types| types.first())
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_string()
}

fn body_examples(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'_>,
    body: BodySource<'_>,
) -> AppResult<BodyExamples> {
    let examples = match body.media {
        Some((media, media_location)) => {
            collect_media_examples(synth, resolver, media, &media_location)?
        }
        None => {
            let mut examples = body.literal_examples;
            if let Some(value) = synth.synthesize(resolver, body.schema, &body.schema_location)? {
                examples.push(value);
            }
            examples
        }
    };
    Ok(BodyExamples {
        media_type: body.media_type,
        examples,
    })
}

fn response_fixture<'a>(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'a>,
    operation: &'a Value,
    node: &'a Value,
    location: &str,
) -> AppResult<ResponseFixture> {
    let document = resolver.document();
    let (response, response_location) = follow(resolver, node, location);

    let body = match response_body(resolver, document, operation, response, &response_location) {
        Some(body) => Some(body_examples(synth, resolver, body)?),
        None => None,
    };

    let mut headers = Vec::new();
    if let Some(Value::Object(declared)) = response.get("headers") {
        let headers_location = join_pointer(&response_location, "headers");
        for (name, header) in declared {
            let header_location = join_pointer(&headers_location, name);
            headers.push(resolve_header(synth, resolver, name, header, &header_location)?);
        }
    }

    Ok(ResponseFixture {
        description: response
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        body,
        headers,
    })
}
