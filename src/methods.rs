//! RPC method extraction
//!
//! Reads the document's `paths` section and derives one method descriptor per
//! POST operation: the wire method name, a unique camelCase client identifier,
//! the request/response schema types, the type of the `result` payload inside
//! the response envelope, and the operation summary. The wire name comes from
//! the request schema's single-valued `method` enum when it carries one; the
//! `operationId` and finally the path itself are fallbacks. Paths without a
//! usable operation are skipped with a warning rather than failing extraction.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use crate::document::{AdditionalProperties, Items, SchemaDocument, SchemaNode};
use crate::model::TypeRef;
use crate::names::{to_member_name, to_type_name};
use crate::resolve::ref_name;
use crate::synth::{primitive_type_ref, unique_tag};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodDescriptor {
    /// Unique camelCase identifier for the generated client, with transport
    /// prefixes like `rpc_` stripped
    pub name: String,
    /// Method string sent on the wire, e.g. "block" or "EXPERIMENTAL_changes"
    pub rpc_method: String,
    pub request_type: String,
    pub response_type: String,
    /// Type of the `result` payload inside the response envelope
    pub result_type: TypeRef,
    /// Operation summary (or description) for generated documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Extract method descriptors from every POST operation under `paths`, in
/// declared path order
pub fn extract_methods(document: &SchemaDocument) -> Vec<MethodDescriptor> {
    let Some(paths) = document.paths().and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut methods = Vec::new();

    for (path, item) in paths {
        let Some(operation) = item.get("post") else {
            warn!(path, "path has no POST operation, skipping");
            continue;
        };
        let request_ref = operation
            .get("requestBody")
            .and_then(content_schema_ref);
        let response_ref = success_response(operation).and_then(content_schema_ref);
        let (Some(request_ref), Some(response_ref)) = (request_ref, response_ref) else {
            warn!(path, "missing request or response schema reference, skipping");
            continue;
        };

        let request_schema = document.get_schema(request_ref);
        let rpc_method = request_schema
            .and_then(wire_method_name)
            .or_else(|| {
                operation
                    .get("operationId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| path.trim_start_matches('/').to_string());
        if rpc_method.is_empty() {
            warn!(path, "cannot derive a method name, skipping");
            continue;
        }

        let result_type = document
            .get_schema(response_ref)
            .map(result_type_ref)
            .unwrap_or(TypeRef::Any);
        let summary = operation
            .get("summary")
            .or_else(|| operation.get("description"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let name = unique_tag(&mut seen_names, &client_method_name(&rpc_method));
        methods.push(MethodDescriptor {
            name,
            rpc_method,
            request_type: to_type_name(request_ref),
            response_type: to_type_name(response_ref),
            result_type,
            summary,
        });
    }
    methods
}

/// The wire method string declared by the request schema itself: a
/// single-valued string enum on its `method` property
fn wire_method_name(request: &SchemaNode) -> Option<String> {
    let method = request.properties.get("method")?;
    method
        .enum_values
        .as_deref()?
        .iter()
        .find_map(Value::as_str)
        .map(str::to_string)
}

/// Client-facing identifier for a wire method: the transport prefix is
/// dropped, the rest camelCased
fn client_method_name(rpc_method: &str) -> String {
    let trimmed = rpc_method.strip_prefix("rpc_").unwrap_or(rpc_method);
    to_member_name(trimmed)
}

/// The success response: `200` when present, otherwise the first 2xx entry
fn success_response(operation: &Value) -> Option<&Value> {
    let responses = operation.get("responses")?.as_object()?;
    responses.get("200").or_else(|| {
        responses
            .iter()
            .find(|(status, _)| status.starts_with('2'))
            .map(|(_, response)| response)
    })
}

/// Follow `content/application\/json/schema/$ref` to the referenced name
fn content_schema_ref(holder: &Value) -> Option<&str> {
    let reference = holder
        .get("content")?
        .get("application/json")?
        .get("schema")?
        .get("$ref")?
        .as_str()?;
    ref_name(reference)
}

/// Type of the `result` payload inside a response envelope: the first union
/// or composition member carrying a `result` property wins, then the
/// envelope's own properties; opaque when none declares one
fn result_type_ref(response: &SchemaNode) -> TypeRef {
    let members = response
        .union_members()
        .into_iter()
        .flatten()
        .chain(response.all_of.iter().flatten());
    for member in members {
        if let Some(result) = member.properties.get("result") {
            return payload_type_ref(result);
        }
    }
    match response.properties.get("result") {
        Some(result) => payload_type_ref(result),
        None => TypeRef::Any,
    }
}

/// Shallow schema-to-type mapping for a payload: references become named
/// types, containers recurse one level, everything else falls back to the
/// primitive table or stays opaque
fn payload_type_ref(node: &SchemaNode) -> TypeRef {
    let ty = if let Some(name) = node.reference.as_deref().and_then(ref_name) {
        TypeRef::Named(to_type_name(name))
    } else {
        match node.schema_type.as_deref() {
            Some("array") => match &node.items {
                Some(Items::One(item)) => TypeRef::Array(Box::new(payload_type_ref(item))),
                _ => TypeRef::Array(Box::new(TypeRef::Any)),
            },
            Some("object") => match &node.additional_properties {
                Some(AdditionalProperties::Schema(schema)) => {
                    TypeRef::Map(Box::new(payload_type_ref(schema)))
                }
                _ => TypeRef::Any,
            },
            Some(_) => primitive_type_ref(node),
            None => TypeRef::Any,
        }
    };
    if node.nullable {
        ty.optional()
    } else {
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PrimitiveKind;
    use serde_json::json;

    fn document_with(schemas: Value, paths: Value) -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "components": { "schemas": schemas },
            "paths": paths
        }))
        .unwrap()
    }

    fn document_with_paths(paths: Value) -> SchemaDocument {
        document_with(json!({}), paths)
    }

    fn operation(request: &str, response: &str) -> Value {
        json!({
            "post": {
                "requestBody": {
                    "content": {"application/json": {"schema": {"$ref": format!("#/components/schemas/{request}")}}}
                },
                "responses": {
                    "200": {"content": {"application/json": {"schema": {"$ref": format!("#/components/schemas/{response}")}}}}
                }
            }
        })
    }

    fn operation_with_id(id: &str, request: &str, response: &str) -> Value {
        let mut op = operation(request, response);
        op["post"]["operationId"] = json!(id);
        op
    }

    #[test]
    fn test_extracts_post_operations() {
        let document = document_with_paths(json!({
            "/block": operation_with_id("block", "JsonRpcRequestForBlock", "JsonRpcResponseForBlock")
        }));
        let methods = extract_methods(&document);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "block");
        assert_eq!(methods[0].rpc_method, "block");
        assert_eq!(methods[0].request_type, "JsonRpcRequestForBlock");
        assert_eq!(methods[0].response_type, "JsonRpcResponseForBlock");
        assert_eq!(methods[0].result_type, TypeRef::Any);
    }

    #[test]
    fn test_wire_method_comes_from_request_schema_enum() {
        let document = document_with(
            json!({
                "QueryRequest": {
                    "type": "object",
                    "properties": {
                        "method": {"type": "string", "enum": ["query"]},
                        "params": {"type": "object"}
                    }
                }
            }),
            json!({
                // The operationId disagrees; the schema's own enum wins
                "/query": operation_with_id("somethingElse", "QueryRequest", "QueryResponse")
            }),
        );
        let methods = extract_methods(&document);
        assert_eq!(methods[0].rpc_method, "query");
        assert_eq!(methods[0].name, "query");
    }

    #[test]
    fn test_rpc_prefix_stripped_from_client_name() {
        let document = document_with_paths(json!({
            "/rpc_send_tx": operation_with_id("rpc_send_tx", "Req", "Resp")
        }));
        let methods = extract_methods(&document);
        assert_eq!(methods[0].name, "sendTx");
        // The wire method keeps its original spelling
        assert_eq!(methods[0].rpc_method, "rpc_send_tx");
    }

    #[test]
    fn test_experimental_prefix_becomes_camel_case() {
        let document = document_with_paths(json!({
            "/EXPERIMENTAL_changes": operation_with_id(
                "EXPERIMENTAL_changes",
                "RpcStateChangesRequest",
                "RpcStateChangesResponse"
            )
        }));
        let methods = extract_methods(&document);
        assert_eq!(methods[0].name, "experimentalChanges");
        assert_eq!(methods[0].rpc_method, "EXPERIMENTAL_changes");
    }

    #[test]
    fn test_result_type_from_response_union() {
        let document = document_with(
            json!({
                "BlockResponse": {
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": {"result": {"$ref": "#/components/schemas/BlockView"}},
                            "required": ["result"]
                        },
                        {
                            "type": "object",
                            "properties": {"error": {"type": "string"}},
                            "required": ["error"]
                        }
                    ]
                },
                "BlockView": {"type": "object"}
            }),
            json!({
                "/block": operation_with_id("block", "BlockRequest", "BlockResponse")
            }),
        );
        let methods = extract_methods(&document);
        assert_eq!(methods[0].result_type, TypeRef::Named("BlockView".to_string()));
    }

    #[test]
    fn test_result_type_from_own_properties() {
        let document = document_with(
            json!({
                "StatusResponse": {
                    "type": "object",
                    "properties": {"result": {"type": "integer", "format": "uint64"}}
                }
            }),
            json!({
                "/status": operation_with_id("status", "StatusRequest", "StatusResponse")
            }),
        );
        let methods = extract_methods(&document);
        assert_eq!(
            methods[0].result_type,
            TypeRef::Primitive(PrimitiveKind::UInt64)
        );
    }

    #[test]
    fn test_summary_carried_over() {
        let mut op = operation_with_id("block", "Req", "Resp");
        op["post"]["summary"] = json!("Returns block details  ");
        let document = document_with_paths(json!({ "/block": op }));
        let methods = extract_methods(&document);
        assert_eq!(methods[0].summary.as_deref(), Some("Returns block details"));
    }

    #[test]
    fn test_method_name_falls_back_to_path() {
        let document = document_with_paths(json!({ "/status": operation("Req", "Resp") }));
        let methods = extract_methods(&document);
        assert_eq!(methods[0].rpc_method, "status");
    }

    #[test]
    fn test_non_200_success_response_accepted() {
        let mut op = operation_with_id("broadcast", "Req", "Resp");
        let responses = op["post"]["responses"].as_object_mut().unwrap();
        let accepted = responses.remove("200").unwrap();
        responses.insert("201".to_string(), accepted);
        let document = document_with_paths(json!({ "/broadcast": op }));
        let methods = extract_methods(&document);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].response_type, "Resp");
    }

    #[test]
    fn test_skips_paths_without_schemas() {
        let document = document_with_paths(json!({
            "/health": {"get": {}},
            "/block": operation_with_id("block", "Req", "Resp")
        }));
        let methods = extract_methods(&document);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].rpc_method, "block");
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let document = document_with_paths(json!({
            "/query": operation_with_id("query", "ReqA", "RespA"),
            "/Query": operation_with_id("Query", "ReqB", "RespB")
        }));
        let methods = extract_methods(&document);
        assert_eq!(methods[0].name, "query");
        assert_eq!(methods[1].name, "query2");
    }
}
