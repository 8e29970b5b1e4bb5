#![deny(missing_docs)]

//! # Fixture Command
//!
//! Prints parameter, request body and response examples for one operation,
//! or for every operation of the document. When listing every operation, one
//! that fails is reported in place as `{"path", "method", "error"}`.

use std::io::Write;

use oas_synth_core::{build_operation_fixture, list_operations, OperationRef};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::args::{write_json, InputArgs};
use crate::error::{CliError, CliResult};

/// Arguments for the fixture command.
#[derive(clap::Args, Debug, Clone)]
pub struct FixtureArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Path template, e.g. `/pets/{id}`. Omit for every operation.
    #[clap(long, requires = "method")]
    pub path: Option<String>,

    /// HTTP method.
    #[clap(long, requires = "path")]
    pub method: Option<String>,
}

/// Executes the fixture command.
///
/// With `--path`/`--method` one fixture object is written; otherwise an
/// array with a fixture per operation.
pub fn execute(args: &FixtureArgs, out: &mut impl Write) -> CliResult<()> {
    let (document, options) = args.input.load()?;

    if let (Some(path), Some(method)) = (&args.path, &args.method) {
        let op = OperationRef::new(path.as_str(), method);
        let fixture = build_operation_fixture(&document, &op, &options)?;
        return write_json(out, &fixture);
    }

    let operations = list_operations(&document);
    if operations.is_empty() {
        return Err(CliError::General(format!(
            "No operations found in {:?}",
            args.input.spec
        )));
    }
    info!(count = operations.len(), "building fixtures");
    let mut fixtures = Vec::with_capacity(operations.len());
    for op in &operations {
        let fixture = match build_operation_fixture(&document, op, &options) {
            Ok(fixture) => serde_json::to_value(fixture)?,
            Err(err) => {
                warn!(operation = %op, error = %err, "fixture failed");
                json!({ "path": op.path, "method": op.method, "error": err.to_string() })
            }
        };
        fixtures.push(fixture);
    }
    write_json(out, &Value::Array(fixtures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const DOC: &str = r#"
openapi: 3.1.0
info: { title: T, version: "1" }
paths:
  /items/{id}:
    get:
      operationId: getItem
      parameters:
        - { name: id, in: path, required: true, schema: { type: integer, enum: [5] } }
      responses:
        '200':
          description: OK
          content:
            application/json:
              example: { id: 5 }
              schema:
                type: object
                properties: { id: { type: integer, example: 6 } }
    delete:
      parameters:
        - { name: id, in: path, required: true, example: 5 }
      responses:
        '204': { description: Gone }
"#;

    fn args(spec: std::path::PathBuf) -> FixtureArgs {
        FixtureArgs {
            input: InputArgs {
                spec,
                config: None,
                seed: None,
                no_fallback: true,
            },
            path: None,
            method: None,
        }
    }

    #[test]
    fn test_single_fixture() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("openapi.yaml");
        fs::write(&spec, DOC).unwrap();

        let mut args = args(spec);
        args.path = Some("/items/{id}".into());
        args.method = Some("GET".into());
        let mut out = Vec::new();
        execute(&args, &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(
            value,
            json!({
                "path": "/items/{id}",
                "method": "get",
                "operationId": "getItem",
                "parameters": [{ "name": "id", "in": "path", "required": true, "value": 5 }],
                "responses": {
                    "200": {
                        "description": "OK",
                        "body": { "mediaType": "application/json", "examples": [{ "id": 5 }, { "id": 6 }] }
                    }
                }
            })
        );
    }

    #[test]
    fn test_all_fixtures() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("openapi.yaml");
        fs::write(&spec, DOC).unwrap();

        let mut out = Vec::new();
        execute(&args(spec), &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        let methods: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["method"].clone())
            .collect();
        assert_eq!(methods, vec![json!("get"), json!("delete")]);
    }

    #[test]
    fn test_failing_operation_reported_in_place() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("openapi.yaml");
        fs::write(
            &spec,
            r#"
openapi: 3.0.3
paths:
  /broken:
    post:
      requestBody:
        content:
          application/json:
            schema:
              allOf: [{ type: string }, { type: object }]
      responses:
        '204': { description: Done }
  /ok:
    get:
      responses:
        '200':
          description: OK
          content:
            application/json:
              example: { ok: true }
"#,
        )
        .unwrap();

        let mut out = Vec::new();
        execute(&args(spec), &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        let fixtures = value.as_array().unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0]["path"], json!("/broken"));
        assert!(fixtures[0]["error"].is_string());
        assert_eq!(fixtures[1]["path"], json!("/ok"));
        assert_eq!(
            fixtures[1]["responses"]["200"]["body"]["examples"],
            json!([{ "ok": true }])
        );
    }

    #[test]
    fn test_no_operations() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("empty.yaml");
        fs::write(&spec, "openapi: 3.0.0\npaths: {}\n").unwrap();
        let mut out = Vec::new();
        assert!(execute(&args(spec), &mut out).is_err());
    }
}
