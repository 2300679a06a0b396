//! Canonical type model
//!
//! The output of type synthesis: named type declarations plus the anonymous
//! type expressions they are built from. The model is language-agnostic; any
//! concrete syntax emission is a downstream concern.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed primitive kinds, keyed on the schema's (type, format) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Text,
    Timestamp,
    Bytes,
    Uuid,
    Int,
    Int32,
    Int64,
    UInt64,
    Float,
    Double,
    Bool,
    Null,
}

/// An anonymous type expression.
///
/// `Any` is the dynamic catch-all for unconstrained schema fragments. It is
/// an explicit tagged union over JSON values (null/bool/number/string/array/
/// object of self), not a reflective type: unconstrained fields still
/// round-trip through the serialization contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Array(Box<TypeRef>),
    Map(Box<TypeRef>),
    Named(String),
    Optional(Box<TypeRef>),
    Any,
}

impl TypeRef {
    /// Wrap in Optional unless already optional
    pub fn optional(self) -> TypeRef {
        match self {
            TypeRef::Optional(_) => self,
            other => TypeRef::Optional(Box::new(other)),
        }
    }
}

/// A struct field: declared JSON name, type, and whether the field may be
/// absent or null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
}

/// Value representation backing a closed enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumBacking {
    Text,
    Integer,
}

/// One case of a closed enum: unique case name plus the literal wire value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumCase {
    pub name: String,
    pub value: Value,
}

/// How one union member is represented on the wire, and therefore how its
/// decode strategy probes the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// A tag-only case carrying a literal value, no payload
    Literal(Value),
    /// The whole payload decodes as this scalar/array type
    Direct(TypeRef),
    /// Like Direct, but the payload type is a referenced named type
    RefWrapped(String),
    /// A single-key object wrapper; decode probes for the key (tolerating
    /// casing variants) and decodes the value under it
    KeyWrapped { key: String, payload: TypeRef },
    /// A multi-field object backed by an auxiliary struct type
    InlineStruct { type_name: String },
}

/// Per-union-member record, consumed to emit the case list and the
/// decode/encode contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    pub tag: String,
    pub representation: Representation,
    /// Index of the member in the source oneOf/anyOf list
    pub source_index: usize,
}

/// A named type declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeNode {
    Struct {
        name: String,
        fields: Vec<FieldDef>,
    },
    Enum {
        name: String,
        backing: EnumBacking,
        cases: Vec<EnumCase>,
    },
    /// A null-only enum: accepts exactly the null value, rejects everything
    /// else. It does not disappear from the model; callers use it as a field
    /// type.
    Unit { name: String },
    Union {
        name: String,
        variants: Vec<VariantDescriptor>,
    },
    Alias {
        name: String,
        target: TypeRef,
    },
}

impl TypeNode {
    pub fn name(&self) -> &str {
        match self {
            TypeNode::Struct { name, .. }
            | TypeNode::Enum { name, .. }
            | TypeNode::Unit { name }
            | TypeNode::Union { name, .. }
            | TypeNode::Alias { name, .. } => name,
        }
    }
}

/// The full synthesized model: named types in processing order plus the
/// auxiliary types generated for inline structs during union/array handling.
/// Both lists are emitted so every referenced auxiliary type is defined
/// alongside its user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeModel {
    pub types: Vec<TypeNode>,
    pub auxiliary: Vec<TypeNode>,
}

impl TypeModel {
    /// Look up a named declaration across both lists
    pub fn find(&self, name: &str) -> Option<&TypeNode> {
        self.types
            .iter()
            .chain(self.auxiliary.iter())
            .find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.types.len() + self.auxiliary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.auxiliary.is_empty()
    }
}
