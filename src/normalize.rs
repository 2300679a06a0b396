//! Composition normalization
//!
//! Merges `allOf` member lists into a single schema node and normalizes the
//! OpenAPI `nullable` marker into the uniform anyOf-with-null representation.
//! The nullable collapse must run before union classification, otherwise every
//! nullable field turns into a two-case union.

use serde_json::{json, Value};
use tracing::debug;

use crate::document::SchemaNode;
use crate::resolve::Resolver;

/// Merge an `allOf` member list into one schema node.
///
/// Rules, in order:
/// 1. a single pure-reference member resolves and returns the target directly
/// 2. members are resolved and partitioned into object-shaped and
///    primitive-shaped parts
/// 3. object parts union their properties (later members override earlier on
///    name collision), union their required sets without duplicates, and keep
///    the last `additionalProperties` seen
/// 4. primitive-only lists keep the first member verbatim
/// 5. mixed lists merge the object parts, then overlay the first primitive
///    part's type constraints
/// 6. an empty or unmergeable list yields the unconstrained object schema
pub fn merge_all_of(members: &[SchemaNode], resolver: &Resolver<'_>) -> SchemaNode {
    if members.len() == 1 && members[0].is_pure_reference() {
        if let Some(reference) = &members[0].reference {
            if let Ok(resolved) = resolver.resolve(reference) {
                return resolved.clone();
            }
        }
    }

    let mut object_parts: Vec<&SchemaNode> = Vec::new();
    let mut primitive_parts: Vec<&SchemaNode> = Vec::new();
    // Resolved clones must outlive the partition
    let mut resolved_members: Vec<SchemaNode> = Vec::new();

    for member in members {
        if let Some(reference) = &member.reference {
            if let Ok(resolved) = resolver.resolve(reference) {
                resolved_members.push(resolved.clone());
            }
        }
        let inline = strip_reference(member);
        if let Some(inline) = inline {
            resolved_members.push(inline);
        }
    }

    for part in &resolved_members {
        if part.is_object_shaped() {
            object_parts.push(part);
        } else {
            primitive_parts.push(part);
        }
    }

    match (object_parts.is_empty(), primitive_parts.is_empty()) {
        (false, true) => merge_object_parts(&object_parts),
        (true, false) => {
            if primitive_parts.len() > 1 {
                // Composition of more than one primitive keeps only the first
                // member's constraints; the rest are dropped.
                debug!(dropped = primitive_parts.len() - 1, "multi-primitive allOf");
            }
            primitive_parts[0].clone()
        }
        (false, false) => {
            let mut merged = merge_object_parts(&object_parts);
            overlay_primitive(&mut merged, primitive_parts[0]);
            merged
        }
        (true, true) => unconstrained_object(),
    }
}

fn merge_object_parts(parts: &[&SchemaNode]) -> SchemaNode {
    let mut merged = unconstrained_object();
    for part in parts {
        for (name, schema) in &part.properties {
            merged.properties.insert(name.clone(), schema.clone());
        }
        for req in &part.required {
            if !merged.required.contains(req) {
                merged.required.push(req.clone());
            }
        }
        if let Some(ap) = &part.additional_properties {
            merged.additional_properties = Some(ap.clone());
        }
    }
    merged
}

fn overlay_primitive(merged: &mut SchemaNode, primitive: &SchemaNode) {
    if let Some(ty) = &primitive.schema_type {
        merged.schema_type = Some(ty.clone());
    }
    if let Some(fmt) = &primitive.format {
        merged.format = Some(fmt.clone());
    }
    if primitive.enum_values.is_some() {
        merged.enum_values = primitive.enum_values.clone();
    }
    merged.minimum = primitive.minimum.or(merged.minimum);
    merged.maximum = primitive.maximum.or(merged.maximum);
    merged.min_length = primitive.min_length.or(merged.min_length);
    merged.max_length = primitive.max_length.or(merged.max_length);
    if let Some(pattern) = &primitive.pattern {
        merged.pattern = Some(pattern.clone());
    }
}

fn unconstrained_object() -> SchemaNode {
    SchemaNode {
        schema_type: Some("object".to_string()),
        ..SchemaNode::default()
    }
}

/// The member's inline content with its `$ref` removed, or None if the member
/// was only a reference
fn strip_reference(member: &SchemaNode) -> Option<SchemaNode> {
    let mut inline = member.clone();
    inline.reference = None;
    if inline == SchemaNode::default() {
        None
    } else {
        Some(inline)
    }
}

/// If a two-member union pairs a null literal with exactly one real schema,
/// return the real member: the union is "optional of X", never a real union.
pub fn null_collapse(members: &[SchemaNode]) -> Option<&SchemaNode> {
    if members.len() != 2 {
        return None;
    }
    match (members[0].is_null_literal(), members[1].is_null_literal()) {
        (true, false) => Some(&members[1]),
        (false, true) => Some(&members[0]),
        _ => None,
    }
}

/// Whether a property schema admits null: its own `nullable` flag, the flag on
/// its reference target, or a null-literal member inside its anyOf/oneOf.
pub fn is_nullable(node: &SchemaNode, resolver: &Resolver<'_>) -> bool {
    if node.nullable {
        return true;
    }
    if let Some(reference) = &node.reference {
        if let Ok(target) = resolver.resolve(reference) {
            if target.nullable {
                return true;
            }
        }
    }
    if let Some(members) = node.union_members() {
        return members.iter().any(|m| m.nullable || m.is_null_literal());
    }
    false
}

/// Rewrite `nullable: true` into `anyOf: [T, {type: null}]` across a raw
/// schema value. The jsonschema validator does not understand the OpenAPI
/// keyword, so the whole document goes through this before compilation.
pub fn nullable_to_any_of(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return value.clone();
    };

    let mut converted = serde_json::Map::new();
    for (key, entry) in map {
        let entry = match key.as_str() {
            "properties" | "patternProperties" => match entry.as_object() {
                Some(props) => Value::Object(
                    props
                        .iter()
                        .map(|(k, v)| (k.clone(), nullable_to_any_of(v)))
                        .collect(),
                ),
                None => entry.clone(),
            },
            "items" | "additionalProperties" if entry.is_object() => nullable_to_any_of(entry),
            "allOf" | "oneOf" | "anyOf" => match entry.as_array() {
                Some(subs) => Value::Array(subs.iter().map(nullable_to_any_of).collect()),
                None => entry.clone(),
            },
            _ => entry.clone(),
        };
        converted.insert(key.clone(), entry);
    }

    let is_nullable_marker = converted
        .get("nullable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if is_nullable_marker && converted.contains_key("type") {
        converted.remove("nullable");
        return json!({ "anyOf": [Value::Object(converted), {"type": "null"}] });
    }

    Value::Object(converted)
}
