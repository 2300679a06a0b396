//! Type Model Synthesis
//!
//! Walks normalized schema nodes and produces canonical TypeNodes, assigning
//! stable unique names through the NamingRegistry. Schemas are processed in
//! ascending complexity order (reference -> primitive -> enum -> array ->
//! union -> composition -> object) so simpler, more likely-to-be-referenced
//! types claim their natural names before complex ones that can generate
//! colliding inline names. The order is a determinism choice, not a
//! correctness requirement: resolution is name-indexed.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::document::{AdditionalProperties, Items, SchemaDocument, SchemaKind, SchemaNode};
use crate::error::Result;
use crate::model::{
    EnumBacking, EnumCase, FieldDef, PrimitiveKind, TypeModel, TypeNode, TypeRef,
};
use crate::names::{to_case_name, to_type_name, NamingRegistry};
use crate::normalize::{is_nullable, merge_all_of, null_collapse};
use crate::resolve::{ref_name, Resolver};
use crate::variants;

/// Property names that mark single-value string enums as discriminators
const DISCRIMINATOR_PATTERNS: &[&str] = &["type", "request_type", "changes_type", "kind"];

/// Map a primitive schema's (type, format) pair to its fixed primitive kind
pub fn primitive_type_ref(node: &SchemaNode) -> TypeRef {
    let format = node.format.as_deref().unwrap_or("");
    match node.schema_type.as_deref() {
        Some("string") => TypeRef::Primitive(match format {
            "byte" | "binary" => PrimitiveKind::Bytes,
            "uuid" => PrimitiveKind::Uuid,
            "uint64" => PrimitiveKind::UInt64,
            "date-time" | "date" => PrimitiveKind::Timestamp,
            _ => PrimitiveKind::Text,
        }),
        Some("integer") => TypeRef::Primitive(match format {
            "int32" => PrimitiveKind::Int32,
            "int64" => PrimitiveKind::Int64,
            "uint64" => PrimitiveKind::UInt64,
            _ => PrimitiveKind::Int,
        }),
        Some("number") => TypeRef::Primitive(match format {
            "float" => PrimitiveKind::Float,
            _ => PrimitiveKind::Double,
        }),
        Some("boolean") => TypeRef::Primitive(PrimitiveKind::Bool),
        Some("null") => TypeRef::Primitive(PrimitiveKind::Null),
        // Unknown or empty schemas stay dynamic, never the host language's
        // reflective type: they must still round-trip through serialization
        _ => TypeRef::Any,
    }
}

/// Is a property schema a discriminator field: a single-value non-null string
/// enum on a property whose name looks like a tag
pub fn is_discriminator_field(prop_name: &str, prop_schema: &SchemaNode) -> bool {
    if prop_schema.schema_type.as_deref() != Some("string") {
        return false;
    }
    let Some(values) = &prop_schema.enum_values else {
        return false;
    };
    if values.len() != 1 || values[0].is_null() {
        return false;
    }
    let lowered = prop_name.to_lowercase();
    DISCRIMINATOR_PATTERNS.iter().any(|p| lowered.contains(p))
}

/// Walks the schema graph and produces the canonical type model
pub struct TypeSynthesizer<'a> {
    document: &'a SchemaDocument,
    resolver: Resolver<'a>,
    registry: &'a mut NamingRegistry,
    /// schema name -> emitted node (None when the schema needed no node,
    /// e.g. a self-referential alias)
    nodes: IndexMap<String, Option<TypeNode>>,
    /// Auxiliary types generated for inline structs
    auxiliary: Vec<TypeNode>,
    /// Inline object schema content -> already-assigned auxiliary type name
    inline_types: HashMap<String, String>,
    /// Discriminator enums shared document-wide, synthesized first
    discriminator_enums: Vec<TypeNode>,
    discriminator_fields: HashSet<String>,
}

impl<'a> TypeSynthesizer<'a> {
    pub fn new(document: &'a SchemaDocument, registry: &'a mut NamingRegistry) -> Self {
        Self {
            document,
            resolver: Resolver::new(document),
            registry,
            nodes: IndexMap::new(),
            auxiliary: Vec::new(),
            inline_types: HashMap::new(),
            discriminator_enums: Vec::new(),
            discriminator_fields: HashSet::new(),
        }
    }

    pub(crate) fn resolver(&self) -> Resolver<'a> {
        self.resolver
    }

    pub(crate) fn claim(&mut self, candidate: &str) -> String {
        self.registry.claim(candidate)
    }

    pub(crate) fn push_auxiliary(&mut self, node: TypeNode) {
        self.auxiliary.push(node);
    }

    /// The node synthesized for a schema name, if any was emitted
    pub fn node_for(&self, schema_name: &str) -> Option<&TypeNode> {
        self.nodes.get(schema_name).and_then(Option::as_ref)
    }

    /// Synthesize every schema in the document and return the full model
    pub fn synthesize_all(mut self) -> TypeModel {
        self.build_discriminator_enums();

        let mut ordered: Vec<&str> = self.document.schema_names().collect();
        // Stable sort: declared order is preserved within each complexity rank
        let kinds: HashMap<&str, SchemaKind> = ordered
            .iter()
            .map(|name| (*name, self.document.get_schema(name).map(SchemaNode::kind).unwrap_or(SchemaKind::Object)))
            .collect();
        ordered.sort_by_key(|name| kinds[name]);

        for name in ordered {
            if let Err(err) = self.synthesize(name) {
                warn!(schema = name, error = %err, "type synthesis failed, skipping schema");
            }
        }

        let mut types = self.discriminator_enums;
        types.extend(self.nodes.into_values().flatten());
        TypeModel {
            types,
            auxiliary: self.auxiliary,
        }
    }

    /// Synthesize one named schema. Idempotent per (name, run): a second call
    /// finds the already-registered node and has no further side effect on
    /// the naming registry.
    pub fn synthesize(&mut self, name: &str) -> Result<()> {
        if self.nodes.contains_key(name) {
            return Ok(());
        }
        let node = self.document.require_schema(name)?;
        let synthesized = self.synthesize_node(name, node)?;
        self.nodes.insert(name.to_string(), synthesized);
        Ok(())
    }

    fn synthesize_node(&mut self, name: &str, node: &SchemaNode) -> Result<Option<TypeNode>> {
        match node.kind() {
            SchemaKind::Reference => Ok(self.alias_for_reference(name, node)),
            SchemaKind::Enum => {
                let type_name = self.claim(&to_type_name(name));
                Ok(Some(build_enum(&type_name, node)))
            }
            SchemaKind::Primitive | SchemaKind::Array => {
                let target = self.type_of(node, name);
                let type_name = self.claim(&to_type_name(name));
                Ok(Some(TypeNode::Alias {
                    name: type_name,
                    target,
                }))
            }
            SchemaKind::Union => {
                let members = node.union_members().unwrap_or_default();
                if let Some(inner) = null_collapse(members) {
                    // Optional-of-one-type, never a two-case union
                    let target = self.type_of(inner, name).optional();
                    let type_name = self.claim(&to_type_name(name));
                    return Ok(Some(TypeNode::Alias {
                        name: type_name,
                        target,
                    }));
                }
                let members = members.to_vec();
                let type_name = self.claim(&to_type_name(name));
                Ok(Some(self.build_union(&type_name, node, &members)))
            }
            SchemaKind::Composition => {
                let members = node.all_of.as_deref().unwrap_or_default();
                if members.len() == 1 && members[0].is_pure_reference() {
                    return Ok(self.alias_for_reference(name, &members[0]));
                }
                let merged = merge_all_of(members, &self.resolver);
                debug!(schema = name, "merged allOf composition");
                self.synthesize_node(name, &merged)
            }
            SchemaKind::Object => {
                if node.properties.is_empty() {
                    if let Some(AdditionalProperties::Schema(value_schema)) =
                        &node.additional_properties
                    {
                        let value_ty = self.type_of(value_schema, name);
                        let type_name = self.claim(&to_type_name(name));
                        return Ok(Some(TypeNode::Alias {
                            name: type_name,
                            target: TypeRef::Map(Box::new(value_ty)),
                        }));
                    }
                }
                let type_name = self.claim(&to_type_name(name));
                Ok(Some(self.build_struct(&type_name, node)))
            }
        }
    }

    /// A pure-reference schema becomes an alias only when the alias name
    /// differs from the referenced type's name
    fn alias_for_reference(&mut self, name: &str, node: &SchemaNode) -> Option<TypeNode> {
        let reference = node.reference.as_deref()?;
        let target_name = to_type_name(ref_name(reference)?);
        let alias_name = to_type_name(name);
        if alias_name == target_name {
            return None;
        }
        let claimed = self.claim(&alias_name);
        Some(TypeNode::Alias {
            name: claimed,
            target: TypeRef::Named(target_name),
        })
    }

    pub(crate) fn build_struct(&mut self, type_name: &str, node: &SchemaNode) -> TypeNode {
        let fields = self.struct_fields(node, type_name);
        TypeNode::Struct {
            name: type_name.to_string(),
            fields,
        }
    }

    /// Field order follows the schema's declared property order exactly;
    /// optionality is "absent from required OR nullable after resolution"
    pub(crate) fn struct_fields(&mut self, node: &SchemaNode, context: &str) -> Vec<FieldDef> {
        let required: HashSet<&str> = node.required.iter().map(String::as_str).collect();
        let properties = node.properties.clone();
        properties
            .iter()
            .map(|(prop_name, prop_schema)| {
                let ty = if is_discriminator_field(prop_name, prop_schema)
                    && self.discriminator_fields.contains(prop_name)
                {
                    TypeRef::Named(to_type_name(prop_name))
                } else {
                    self.type_of(prop_schema, context)
                };
                let optional =
                    !required.contains(prop_name.as_str()) || is_nullable(prop_schema, &self.resolver);
                FieldDef {
                    name: prop_name.clone(),
                    ty,
                    optional,
                }
            })
            .collect()
    }

    fn build_union(&mut self, type_name: &str, parent: &SchemaNode, members: &[SchemaNode]) -> TypeNode {
        let mut seen_tags: HashSet<String> = HashSet::new();
        let variants = members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                let mut descriptor = variants::classify(member, index, parent, type_name, self);
                descriptor.tag = unique_tag(&mut seen_tags, &descriptor.tag);
                descriptor
            })
            .collect();
        TypeNode::Union {
            name: type_name.to_string(),
            variants,
        }
    }

    /// The anonymous type expression for a schema fragment
    pub(crate) fn type_of(&mut self, node: &SchemaNode, context: &str) -> TypeRef {
        if let Some(reference) = &node.reference {
            return match ref_name(reference) {
                Some(target) => TypeRef::Named(to_type_name(target)),
                None => TypeRef::Any,
            };
        }
        if node.enum_values.is_some() {
            // Inline anonymous enums reduce to their backing primitive;
            // shared discriminator enums are handled at the field level
            return primitive_type_ref(node);
        }
        if let Some(members) = &node.all_of {
            for member in members {
                if let Some(reference) = &member.reference {
                    if let Some(target) = ref_name(reference) {
                        return TypeRef::Named(to_type_name(target));
                    }
                }
            }
            let merged = merge_all_of(members, &self.resolver);
            return self.type_of(&merged, context);
        }
        if let Some(members) = node.union_members() {
            if let Some(inner) = null_collapse(members) {
                return self.type_of(inner, context).optional();
            }
            return TypeRef::Any;
        }
        match node.schema_type.as_deref() {
            Some("array") => match &node.items {
                Some(Items::One(items)) => {
                    TypeRef::Array(Box::new(self.type_of(items, context)))
                }
                // Tuple arrays have no uniform element type
                _ => TypeRef::Array(Box::new(TypeRef::Any)),
            },
            Some("object") => self.object_type_of(node, context),
            _ => primitive_type_ref(node),
        }
    }

    fn object_type_of(&mut self, node: &SchemaNode, context: &str) -> TypeRef {
        if !node.properties.is_empty() && should_inline_struct(node) {
            return self.inline_object_type(node, context);
        }
        if node.properties.is_empty() {
            if let Some(AdditionalProperties::Schema(value_schema)) = &node.additional_properties {
                let value_ty = self.type_of(value_schema, context);
                return TypeRef::Map(Box::new(value_ty));
            }
        }
        TypeRef::Any
    }

    /// Synthesize an auxiliary struct for an inline object, memoized on the
    /// schema content so identical inline objects share one type
    pub(crate) fn inline_object_type(&mut self, node: &SchemaNode, context: &str) -> TypeRef {
        let key = node.to_value().to_string();
        if let Some(existing) = self.inline_types.get(&key) {
            return TypeRef::Named(existing.clone());
        }
        let candidate = format!("{}InlineObject", to_type_name(context));
        let type_name = self.claim(&candidate);
        self.inline_types.insert(key, type_name.clone());
        let aux = self.build_struct(&type_name, node);
        self.push_auxiliary(aux);
        TypeRef::Named(type_name)
    }

    /// Collect single-value string enums on discriminator-named properties
    /// across the whole document and pool them into shared enums. These are
    /// synthesized first: other types reference them by field name.
    fn build_discriminator_enums(&mut self) {
        let mut pools: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (_, schema) in self.document.schemas() {
            collect_discriminators(schema, &mut pools);
        }
        for (field, values) in pools {
            let type_name = self.claim(&to_type_name(&field));
            let cases = distinct_cases(values.iter().map(|v| serde_json::Value::String(v.clone())), EnumBacking::Text);
            self.discriminator_enums.push(TypeNode::Enum {
                name: type_name,
                backing: EnumBacking::Text,
                cases,
            });
            self.discriminator_fields.insert(field);
        }
    }
}

fn collect_discriminators(schema: &SchemaNode, pools: &mut BTreeMap<String, BTreeSet<String>>) {
    for (prop_name, prop_schema) in &schema.properties {
        if is_discriminator_field(prop_name, prop_schema) {
            let values = prop_schema.enum_values.iter().flatten();
            let pool = pools.entry(prop_name.clone()).or_default();
            for value in values {
                if let Some(text) = value.as_str() {
                    pool.insert(text.to_string());
                }
            }
        }
    }
    for members in [&schema.one_of, &schema.any_of, &schema.all_of].into_iter().flatten() {
        for member in members {
            collect_discriminators(member, pools);
        }
    }
}

/// Closed enum synthesis: a null-only enum becomes a unit type whose codec
/// accepts only null; otherwise null members are dropped from the case list
fn build_enum(type_name: &str, node: &SchemaNode) -> TypeNode {
    if node.is_null_literal() {
        return TypeNode::Unit {
            name: type_name.to_string(),
        };
    }
    let values = node.enum_values.clone().unwrap_or_default();
    let non_null: Vec<serde_json::Value> = values.into_iter().filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return TypeNode::Unit {
            name: type_name.to_string(),
        };
    }
    let backing = match node.schema_type.as_deref() {
        Some("integer") => EnumBacking::Integer,
        _ => EnumBacking::Text,
    };
    let cases = distinct_cases(non_null.into_iter(), backing);
    TypeNode::Enum {
        name: type_name.to_string(),
        backing,
        cases,
    }
}

fn distinct_cases(
    values: impl Iterator<Item = serde_json::Value>,
    backing: EnumBacking,
) -> Vec<EnumCase> {
    let mut seen: HashSet<String> = HashSet::new();
    values
        .map(|value| {
            let base = match (&backing, &value) {
                (EnumBacking::Text, serde_json::Value::String(s)) => to_case_name(s),
                (_, other) => format!("val{}", remove_punctuation(&other.to_string())),
            };
            let name = unique_tag(&mut seen, &base);
            EnumCase { name, value }
        })
        .collect()
}

fn remove_punctuation(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Deduplicate a tag/case name within one declaration, suffixing from 2
pub(crate) fn unique_tag(seen: &mut HashSet<String>, base: &str) -> String {
    if seen.insert(base.to_string()) {
        return base.to_string();
    }
    let mut counter = 2usize;
    loop {
        let candidate = format!("{base}{counter}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Inline objects worth an auxiliary struct: anything but a trivial bag of at
/// most two primitive properties
fn should_inline_struct(node: &SchemaNode) -> bool {
    if node.properties.is_empty() {
        return false;
    }
    if node.properties.len() <= 2 {
        let all_primitive = node.properties.values().all(is_primitive_like);
        if all_primitive {
            return false;
        }
    }
    true
}

fn is_primitive_like(node: &SchemaNode) -> bool {
    if node.reference.is_some() {
        return false;
    }
    if node.is_primitive_type() {
        return true;
    }
    if node.schema_type.as_deref() == Some("array") {
        return match &node.items {
            Some(Items::One(items)) => is_primitive_like(items),
            _ => false,
        };
    }
    false
}
