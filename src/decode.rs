//! Structural union decoding
//!
//! A union value has no discriminator on the wire: the decoder tries every
//! variant in declaration order and accepts the first that matches. Checking
//! is structural against the synthesized type model, which is exactly what a
//! generated client's codec would do. Payload types referenced by name are
//! looked up in the model; unknown names are treated as opaque and match
//! anything.

use serde_json::Value;
use thiserror::Error;

use crate::model::{
    EnumBacking, PrimitiveKind, Representation, TypeModel, TypeNode, TypeRef, VariantDescriptor,
};

/// One failed variant probe: the variant's tag and why the value did not fit
#[derive(Debug, Clone, PartialEq)]
pub struct VariantAttempt {
    pub tag: String,
    pub reason: String,
}

/// All variants of a union failed to match a value. Names every attempted
/// variant with its mismatch reason so the caller can see the full probe order.
#[derive(Debug, Error)]
#[error("value matched no variant of {union}; tried: {}", format_attempts(attempted))]
pub struct DecodeError {
    pub union: String,
    pub attempted: Vec<VariantAttempt>,
}

impl DecodeError {
    /// Tags in probe order, without the reasons
    pub fn attempted_tags(&self) -> Vec<&str> {
        self.attempted.iter().map(|a| a.tag.as_str()).collect()
    }
}

fn format_attempts(attempted: &[VariantAttempt]) -> String {
    attempted
        .iter()
        .map(|a| format!("{} ({})", a.tag, a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode a union value: the tag of the first variant that structurally
/// matches, in declaration order
pub fn decode_union<'a>(
    model: &TypeModel,
    union: &'a TypeNode,
    value: &Value,
) -> Result<&'a VariantDescriptor, DecodeError> {
    let (name, variants) = match union {
        TypeNode::Union { name, variants } => (name, variants),
        other => {
            return Err(DecodeError {
                union: other.name().to_string(),
                attempted: Vec::new(),
            })
        }
    };
    let mut attempted = Vec::with_capacity(variants.len());
    for variant in variants {
        match check_variant(model, variant, value) {
            Ok(()) => return Ok(variant),
            Err(reason) => attempted.push(VariantAttempt {
                tag: variant.tag.clone(),
                reason,
            }),
        }
    }
    Err(DecodeError {
        union: name.clone(),
        attempted,
    })
}

fn check_variant(model: &TypeModel, variant: &VariantDescriptor, value: &Value) -> Result<(), String> {
    match &variant.representation {
        Representation::Literal(literal) => {
            if value == literal {
                Ok(())
            } else {
                Err(format!("expected literal {literal}"))
            }
        }
        Representation::Direct(ty) => check_type(model, ty, value),
        Representation::RefWrapped(name) => check_named(model, name, value),
        Representation::KeyWrapped { key, payload } => {
            let Value::Object(map) = value else {
                return Err(format!("expected object, got {}", json_kind(value)));
            };
            // The wire key may differ in case from the declared one
            let Some(inner) = probe_key(map, key) else {
                return Err(format!("wrapper key {key:?} absent"));
            };
            check_type(model, payload, inner)
                .map_err(|reason| format!("payload under {key:?}: {reason}"))
        }
        Representation::InlineStruct { type_name } => check_named(model, type_name, value),
    }
}

/// Probe an object for a wrapper key, tolerating case differences: the
/// declared key, its camelCase form, a lowercased first letter, and finally a
/// full case-insensitive scan
fn probe_key<'v>(map: &'v serde_json::Map<String, Value>, key: &str) -> Option<&'v Value> {
    if let Some(found) = map.get(key) {
        return Some(found);
    }
    let camel = crate::names::to_member_name(key);
    if let Some(found) = map.get(&camel) {
        return Some(found);
    }
    let mut chars = key.chars();
    if let Some(first) = chars.next() {
        let lowered_first: String = first.to_lowercase().chain(chars).collect();
        if let Some(found) = map.get(&lowered_first) {
            return Some(found);
        }
    }
    let lowered = key.to_lowercase();
    map.iter()
        .find(|(k, _)| k.to_lowercase() == lowered)
        .map(|(_, v)| v)
}

/// Structural check of a value against a type expression
pub fn matches_type(model: &TypeModel, ty: &TypeRef, value: &Value) -> bool {
    check_type(model, ty, value).is_ok()
}

fn check_type(model: &TypeModel, ty: &TypeRef, value: &Value) -> Result<(), String> {
    match ty {
        TypeRef::Any => Ok(()),
        TypeRef::Primitive(kind) => check_primitive(*kind, value),
        TypeRef::Optional(inner) => {
            if value.is_null() {
                Ok(())
            } else {
                check_type(model, inner, value)
            }
        }
        TypeRef::Array(element) => match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    check_type(model, element, item)
                        .map_err(|reason| format!("element {index}: {reason}"))?;
                }
                Ok(())
            }
            other => Err(format!("expected array, got {}", json_kind(other))),
        },
        TypeRef::Map(element) => match value {
            Value::Object(map) => {
                for (key, item) in map {
                    check_type(model, element, item)
                        .map_err(|reason| format!("entry {key:?}: {reason}"))?;
                }
                Ok(())
            }
            other => Err(format!("expected object, got {}", json_kind(other))),
        },
        TypeRef::Named(name) => check_named(model, name, value),
    }
}

fn check_primitive(kind: PrimitiveKind, value: &Value) -> Result<(), String> {
    let ok = match kind {
        PrimitiveKind::Text
        | PrimitiveKind::Timestamp
        | PrimitiveKind::Bytes
        | PrimitiveKind::Uuid => value.is_string(),
        // uint64 rides either a string or an integer wire form depending on
        // the declaring schema's type keyword, so both are accepted here
        PrimitiveKind::UInt64 => value.is_string() || value.is_u64(),
        PrimitiveKind::Int | PrimitiveKind::Int32 | PrimitiveKind::Int64 => {
            value.is_i64() || value.is_u64()
        }
        PrimitiveKind::Float | PrimitiveKind::Double => value.is_number(),
        PrimitiveKind::Bool => value.is_boolean(),
        PrimitiveKind::Null => value.is_null(),
    };
    if ok {
        Ok(())
    } else {
        Err(format!(
            "expected {}, got {}",
            primitive_desc(kind),
            json_kind(value)
        ))
    }
}

fn primitive_desc(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Text => "string",
        PrimitiveKind::Timestamp => "date-time string",
        PrimitiveKind::Bytes => "base64 string",
        PrimitiveKind::Uuid => "uuid string",
        PrimitiveKind::UInt64 => "string or unsigned integer",
        PrimitiveKind::Int | PrimitiveKind::Int32 | PrimitiveKind::Int64 => "integer",
        PrimitiveKind::Float | PrimitiveKind::Double => "number",
        PrimitiveKind::Bool => "boolean",
        PrimitiveKind::Null => "null",
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_named(model: &TypeModel, name: &str, value: &Value) -> Result<(), String> {
    match model.find(name) {
        Some(node) => check_node(model, node, value),
        // Unknown names stay permissive rather than failing the whole probe
        None => Ok(()),
    }
}

fn check_node(model: &TypeModel, node: &TypeNode, value: &Value) -> Result<(), String> {
    match node {
        TypeNode::Struct { name, fields } => {
            let Value::Object(map) = value else {
                return Err(format!("expected {name} object, got {}", json_kind(value)));
            };
            for field in fields {
                match map.get(&field.name) {
                    Some(inner) => check_type(model, &field.ty, inner)
                        .map_err(|reason| format!("field {:?}: {reason}", field.name))?,
                    None if field.optional => {}
                    None => return Err(format!("missing required field {:?}", field.name)),
                }
            }
            Ok(())
        }
        TypeNode::Enum { name, backing, cases } => {
            let backing_ok = match backing {
                EnumBacking::Text => value.is_string(),
                EnumBacking::Integer => value.is_i64() || value.is_u64(),
            };
            if backing_ok && cases.iter().any(|case| &case.value == value) {
                Ok(())
            } else {
                Err(format!("no case of {name} equals the value"))
            }
        }
        TypeNode::Unit { name } => {
            if value.is_null() {
                Ok(())
            } else {
                Err(format!("{name} admits only null"))
            }
        }
        TypeNode::Union { .. } => decode_union(model, node, value)
            .map(|_| ())
            .map_err(|err| err.to_string()),
        TypeNode::Alias { target, .. } => check_type(model, target, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;
    use serde_json::json;

    fn shape_model() -> TypeModel {
        TypeModel {
            types: vec![
                TypeNode::Struct {
                    name: "Circle".to_string(),
                    fields: vec![FieldDef {
                        name: "radius".to_string(),
                        ty: TypeRef::Primitive(PrimitiveKind::Double),
                        optional: false,
                    }],
                },
                TypeNode::Struct {
                    name: "Square".to_string(),
                    fields: vec![FieldDef {
                        name: "side".to_string(),
                        ty: TypeRef::Primitive(PrimitiveKind::Double),
                        optional: false,
                    }],
                },
                TypeNode::Union {
                    name: "Shape".to_string(),
                    variants: vec![
                        VariantDescriptor {
                            tag: "circle".to_string(),
                            representation: Representation::KeyWrapped {
                                key: "circle".to_string(),
                                payload: TypeRef::Named("Circle".to_string()),
                            },
                            source_index: 0,
                        },
                        VariantDescriptor {
                            tag: "square".to_string(),
                            representation: Representation::KeyWrapped {
                                key: "square".to_string(),
                                payload: TypeRef::Named("Square".to_string()),
                            },
                            source_index: 1,
                        },
                    ],
                },
            ],
            auxiliary: Vec::new(),
        }
    }

    #[test]
    fn test_key_wrapped_decode() {
        let model = shape_model();
        let union = model.find("Shape").unwrap();
        let value = json!({"square": {"side": 4.0}});
        let variant = decode_union(&model, union, &value).unwrap();
        assert_eq!(variant.tag, "square");
    }

    #[test]
    fn test_decode_error_names_all_variants_with_reasons() {
        let model = shape_model();
        let union = model.find("Shape").unwrap();
        let value = json!({"triangle": {}});
        let err = decode_union(&model, union, &value).unwrap_err();
        assert_eq!(err.attempted_tags(), vec!["circle", "square"]);
        assert_eq!(err.attempted[0].reason, "wrapper key \"circle\" absent");
        let message = err.to_string();
        assert!(message.contains("Shape"));
        assert!(message.contains("circle (wrapper key \"circle\" absent)"));
        assert!(message.contains("square (wrapper key \"square\" absent)"));
    }

    #[test]
    fn test_decode_error_reports_payload_mismatch() {
        let model = shape_model();
        let union = model.find("Shape").unwrap();
        let value = json!({"circle": {"radius": "big"}});
        let err = decode_union(&model, union, &value).unwrap_err();
        assert!(
            err.attempted[0].reason.contains("radius"),
            "reason should name the offending field: {}",
            err.attempted[0].reason
        );
    }

    #[test]
    fn test_first_match_wins_in_declaration_order() {
        let model = TypeModel {
            types: vec![TypeNode::Union {
                name: "Id".to_string(),
                variants: vec![
                    VariantDescriptor {
                        tag: "string".to_string(),
                        representation: Representation::Direct(TypeRef::Primitive(
                            PrimitiveKind::Text,
                        )),
                        source_index: 0,
                    },
                    VariantDescriptor {
                        tag: "uuid".to_string(),
                        representation: Representation::Direct(TypeRef::Primitive(
                            PrimitiveKind::Uuid,
                        )),
                        source_index: 1,
                    },
                ],
            }],
            auxiliary: Vec::new(),
        };
        let union = model.find("Id").unwrap();
        // Both variants accept strings; declaration order decides
        let variant = decode_union(&model, union, &json!("abc")).unwrap();
        assert_eq!(variant.tag, "string");
    }

    #[test]
    fn test_uint64_accepts_integer_and_string_forms() {
        let model = TypeModel {
            types: vec![TypeNode::Union {
                name: "BlockId".to_string(),
                variants: vec![
                    VariantDescriptor {
                        tag: "integer".to_string(),
                        representation: Representation::Direct(TypeRef::Primitive(
                            PrimitiveKind::UInt64,
                        )),
                        source_index: 0,
                    },
                    VariantDescriptor {
                        tag: "byHash".to_string(),
                        representation: Representation::Direct(TypeRef::Primitive(
                            PrimitiveKind::Text,
                        )),
                        source_index: 1,
                    },
                ],
            }],
            auxiliary: Vec::new(),
        };
        let union = model.find("BlockId").unwrap();
        let by_height = decode_union(&model, union, &json!(100)).unwrap();
        assert_eq!(by_height.tag, "integer");
        let as_string = decode_union(&model, union, &json!("12345")).unwrap();
        assert_eq!(as_string.tag, "integer");
        // Negative numbers fit neither wire form of uint64
        let err = decode_union(&model, union, &json!(-1)).unwrap_err();
        assert_eq!(err.attempted_tags(), vec!["integer", "byHash"]);
    }

    #[test]
    fn test_key_probe_is_case_tolerant() {
        let model = shape_model();
        let union = model.find("Shape").unwrap();
        let value = json!({"Circle": {"radius": 1.5}});
        let variant = decode_union(&model, union, &value).unwrap();
        assert_eq!(variant.tag, "circle");
    }

    #[test]
    fn test_literal_and_optional_matching() {
        let model = TypeModel::default();
        assert!(matches_type(
            &model,
            &TypeRef::Optional(Box::new(TypeRef::Primitive(PrimitiveKind::Int))),
            &json!(null)
        ));
        assert!(matches_type(
            &model,
            &TypeRef::Array(Box::new(TypeRef::Primitive(PrimitiveKind::Bool))),
            &json!([true, false])
        ));
        assert!(!matches_type(
            &model,
            &TypeRef::Map(Box::new(TypeRef::Primitive(PrimitiveKind::Text))),
            &json!({"k": 3})
        ));
    }
}
