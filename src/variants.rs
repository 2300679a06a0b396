//! Union variant classification
//!
//! Every member of a oneOf/anyOf union maps to exactly one representation
//! class, tried in a fixed precedence order. The class decides both the
//! variant's wire shape and how the structural decoder later probes it.

use serde_json::Value;
use tracing::warn;

use crate::document::SchemaNode;
use crate::error::TypegenError;
use crate::model::{Representation, TypeRef, VariantDescriptor};
use crate::names::{to_case_name, to_member_name, to_type_name};
use crate::normalize::merge_all_of;
use crate::resolve::ref_name;
use crate::synth::TypeSynthesizer;

const BARE_PRIMITIVE_TYPES: &[&str] = &["string", "integer", "number", "boolean", "array"];

/// Classify one union member into a tagged variant descriptor.
///
/// Precedence: literal enum values, bare primitives, bare references, allOf
/// merges (reclassified), nullable anyOf wrappers, single-property key
/// wrappers, then multi-property inline structs. Anything left falls back to
/// an opaque payload rather than aborting the whole union.
pub(crate) fn classify(
    member: &SchemaNode,
    index: usize,
    parent: &SchemaNode,
    union_name: &str,
    synth: &mut TypeSynthesizer<'_>,
) -> VariantDescriptor {
    if let Some(descriptor) = classify_literal(member, index) {
        return descriptor;
    }
    if let Some(descriptor) = classify_bare_primitive(member, index, union_name, synth) {
        return descriptor;
    }
    if let Some(descriptor) = classify_bare_reference(member, index) {
        return descriptor;
    }
    if let Some(members) = &member.all_of {
        // Merge, carry the member's own title through, and reclassify
        let mut merged = merge_all_of(members, &synth.resolver());
        if merged.title.is_none() {
            merged.title = member.title.clone();
        }
        return classify(&merged, index, parent, union_name, synth);
    }
    if let Some(descriptor) = classify_nullable_wrapper(member, index, synth) {
        return descriptor;
    }
    if member.properties.len() == 1 {
        return classify_key_wrapped(member, index, union_name, synth);
    }
    if member.properties.len() >= 2 {
        return classify_inline_struct(member, index, parent, union_name, synth);
    }
    let err = TypegenError::UnclassifiableVariant {
        union: union_name.to_string(),
        index,
    };
    warn!(error = %err, "using opaque payload");
    VariantDescriptor {
        tag: "unknownVariant".to_string(),
        representation: Representation::Direct(TypeRef::Any),
        source_index: index,
    }
}

/// A single-value enum member is a literal constant variant
fn classify_literal(member: &SchemaNode, index: usize) -> Option<VariantDescriptor> {
    let values = member.enum_values.as_ref()?;
    if values.len() != 1 || values[0].is_null() {
        return None;
    }
    let value = values[0].clone();
    let tag = match &value {
        Value::String(s) => to_case_name(s),
        other => to_case_name(&other.to_string()),
    };
    Some(VariantDescriptor {
        tag,
        representation: Representation::Literal(value),
        source_index: index,
    })
}

/// A bare primitive or array member carries its value without any wrapper;
/// the tag is the lowercased type keyword
fn classify_bare_primitive(
    member: &SchemaNode,
    index: usize,
    union_name: &str,
    synth: &mut TypeSynthesizer<'_>,
) -> Option<VariantDescriptor> {
    let type_name = member.schema_type.as_deref()?;
    if !BARE_PRIMITIVE_TYPES.contains(&type_name) || !member.properties.is_empty() {
        return None;
    }
    let ty = synth.type_of(member, union_name);
    Some(VariantDescriptor {
        tag: type_name.to_string(),
        representation: Representation::Direct(ty),
        source_index: index,
    })
}

/// A bare reference member decodes the referenced type directly
fn classify_bare_reference(member: &SchemaNode, index: usize) -> Option<VariantDescriptor> {
    if !member.is_pure_reference() {
        return None;
    }
    let target = ref_name(member.reference.as_deref()?)?;
    Some(VariantDescriptor {
        tag: to_member_name(target),
        representation: Representation::RefWrapped(to_type_name(target)),
        source_index: index,
    })
}

/// An anyOf member that is the two-element nullable-reference pattern wraps
/// the referenced type in an optional
fn classify_nullable_wrapper(
    member: &SchemaNode,
    index: usize,
    synth: &mut TypeSynthesizer<'_>,
) -> Option<VariantDescriptor> {
    let choices = member.any_of.as_deref()?;
    if choices.len() == 2 {
        let reference = choices.iter().find(|c| c.is_pure_reference());
        let null_member = choices.iter().find(|c| c.is_null_literal());
        if let (Some(reference), Some(_)) = (reference, null_member) {
            let target = ref_name(reference.reference.as_deref()?)?;
            return Some(VariantDescriptor {
                tag: to_member_name(target),
                representation: Representation::Direct(
                    TypeRef::Named(to_type_name(target)).optional(),
                ),
                source_index: index,
            });
        }
    }
    // Otherwise fall through on the first non-null choice
    let first = choices.iter().find(|c| !c.is_null_literal())?;
    let ty = synth.type_of(first, "");
    let tag = match first.reference.as_deref().and_then(ref_name) {
        Some(target) => to_member_name(target),
        None => format!("choice{index}"),
    };
    Some(VariantDescriptor {
        tag,
        representation: Representation::Direct(ty),
        source_index: index,
    })
}

/// A single-property object wraps its payload under that property's key
fn classify_key_wrapped(
    member: &SchemaNode,
    index: usize,
    union_name: &str,
    synth: &mut TypeSynthesizer<'_>,
) -> VariantDescriptor {
    let (key, prop_schema) = member.properties.iter().next().expect("one property");
    let tag = to_member_name(key);

    let payload = if let Some(reference) = prop_schema.reference.as_deref() {
        match ref_name(reference) {
            Some(target) => TypeRef::Named(to_type_name(target)),
            None => TypeRef::Any,
        }
    } else if let Some(choices) = prop_schema.any_of.as_deref() {
        nullable_reference_payload(choices, synth)
            .unwrap_or_else(|| synth.type_of(prop_schema, union_name))
    } else if !prop_schema.properties.is_empty() {
        let candidate = format!("{}OneOf{}Inline", union_name, to_type_name(key));
        let type_name = synth.claim(&candidate);
        let aux = synth.build_struct(&type_name, prop_schema);
        synth.push_auxiliary(aux);
        TypeRef::Named(type_name)
    } else {
        synth.type_of(prop_schema, union_name)
    };

    VariantDescriptor {
        tag,
        representation: Representation::KeyWrapped {
            key: key.clone(),
            payload,
        },
        source_index: index,
    }
}

/// The two-element reference-or-null anyOf inside a wrapped payload becomes
/// an optional of the reference; a null-only referenced type stays plain
fn nullable_reference_payload(
    choices: &[SchemaNode],
    synth: &mut TypeSynthesizer<'_>,
) -> Option<TypeRef> {
    if choices.len() != 2 {
        return None;
    }
    let reference = choices.iter().find(|c| c.is_pure_reference())?;
    choices.iter().find(|c| c.is_null_literal())?;
    let target = ref_name(reference.reference.as_deref()?)?;
    let named = TypeRef::Named(to_type_name(target));
    let resolved = synth.resolver().resolve(reference.reference.as_deref()?).ok();
    if resolved.is_some_and(SchemaNode::is_null_literal) {
        Some(named)
    } else {
        Some(named.optional())
    }
}

/// A multi-property member becomes an auxiliary struct that inherits any
/// shared parent-level properties the member does not override
fn classify_inline_struct(
    member: &SchemaNode,
    index: usize,
    parent: &SchemaNode,
    union_name: &str,
    synth: &mut TypeSynthesizer<'_>,
) -> VariantDescriptor {
    let mut merged = member.clone();
    for (prop_name, prop_schema) in &parent.properties {
        if !merged.properties.contains_key(prop_name) {
            merged.properties.insert(prop_name.clone(), prop_schema.clone());
        }
    }
    for required in &parent.required {
        if !merged.required.contains(required) {
            merged.required.push(required.clone());
        }
    }

    let (candidate, tag) = match &member.title {
        Some(title) => (to_type_name(title), to_member_name(title)),
        None => {
            let mut stem = String::new();
            for prop_name in merged.properties.keys().take(3) {
                stem.push_str(&to_type_name(prop_name));
            }
            if merged.properties.len() > 3 {
                stem.push_str("Etc");
            }
            (format!("{union_name}OneOf{stem}"), to_member_name(&stem))
        }
    };
    let type_name = synth.claim(&candidate);
    let aux = synth.build_struct(&type_name, &merged);
    synth.push_auxiliary(aux);

    VariantDescriptor {
        tag,
        representation: Representation::InlineStruct { type_name },
        source_index: index,
    }
}
