//! Schema document and schema node types
//!
//! The document is loaded once from an OpenAPI/JSON-Schema component file and
//! is immutable afterwards. Every other module reads it through
//! `get_schema`/`schema_names`; transformations always produce new nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Result, TypegenError};

/// `items` is either a single schema or an ordered tuple of schemas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Items {
    One(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

/// `additionalProperties` is either a boolean flag or a value schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Flag(bool),
    Schema(Box<SchemaNode>),
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A single schema node, parsed once from the source document.
///
/// Never mutated after load. Property order follows the document exactly
/// (IndexMap), which is what makes struct field order stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchemaNode {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,

    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<SchemaNode>>,

    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaNode>>,

    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaNode>>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(
        rename = "patternProperties",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub pattern_properties: IndexMap<String, SchemaNode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
}

/// Structural classification of a schema node.
///
/// The order of these variants doubles as the processing order of the type
/// synthesizer: simpler, more likely-to-be-referenced schemas claim their
/// natural names before complex ones that can generate colliding inline names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Reference,
    Primitive,
    Enum,
    Array,
    Union,
    Composition,
    Object,
}

impl SchemaNode {
    /// A schema that is nothing but a `$ref`
    pub fn is_pure_reference(&self) -> bool {
        self.reference.is_some()
            && self.schema_type.is_none()
            && self.properties.is_empty()
            && self.enum_values.is_none()
            && self.one_of.is_none()
            && self.any_of.is_none()
            && self.all_of.is_none()
            && self.items.is_none()
    }

    /// Whether this schema only admits the JSON null value
    pub fn is_null_literal(&self) -> bool {
        if self.schema_type.as_deref() == Some("null") {
            return true;
        }
        match &self.enum_values {
            Some(values) if !values.is_empty() => values.iter().all(Value::is_null),
            _ => false,
        }
    }

    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self.schema_type.as_deref(),
            Some("string") | Some("integer") | Some("number") | Some("boolean")
        )
    }

    /// Object-shaped for allOf partitioning: has properties or declares object
    pub fn is_object_shaped(&self) -> bool {
        self.schema_type.as_deref() == Some("object") || !self.properties.is_empty()
    }

    pub fn kind(&self) -> SchemaKind {
        if self.is_pure_reference() {
            SchemaKind::Reference
        } else if self.enum_values.is_some() {
            SchemaKind::Enum
        } else if self.is_primitive_type() {
            SchemaKind::Primitive
        } else if self.schema_type.as_deref() == Some("array") {
            SchemaKind::Array
        } else if self.one_of.is_some() || self.any_of.is_some() {
            SchemaKind::Union
        } else if self.all_of.is_some() {
            SchemaKind::Composition
        } else {
            SchemaKind::Object
        }
    }

    /// The oneOf or anyOf member list, whichever is present
    pub fn union_members(&self) -> Option<&[SchemaNode]> {
        self.one_of
            .as_deref()
            .or(self.any_of.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Serialize back to a JSON value (for the external validator)
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The immutable schema graph: name -> schema node, loaded once.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Full source document, kept verbatim for reference resolution
    /// inside the external validator
    raw: Value,
    /// Parsed component schemas, document order preserved
    schemas: IndexMap<String, SchemaNode>,
}

impl SchemaDocument {
    /// Parse a full OpenAPI document. Fails only on unparsable input;
    /// a document with no component schemas is valid but empty.
    pub fn from_value(raw: Value) -> Result<Self> {
        let mut schemas = IndexMap::new();
        if let Some(map) = raw
            .pointer("/components/schemas")
            .and_then(Value::as_object)
        {
            for (name, schema) in map {
                let node: SchemaNode = serde_json::from_value(schema.clone())?;
                schemas.insert(name.clone(), node);
            }
        }
        Ok(Self { raw, schemas })
    }

    pub fn from_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    pub fn get_schema(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    pub fn require_schema(&self, name: &str) -> Result<&SchemaNode> {
        self.schemas
            .get(name)
            .ok_or_else(|| TypegenError::SchemaNotFound {
                name: name.to_string(),
            })
    }

    /// Schema names in declared document order
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn schemas(&self) -> &IndexMap<String, SchemaNode> {
        &self.schemas
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// The `paths` section, for method extraction
    pub fn paths(&self) -> Option<&Value> {
        self.raw.get("paths")
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
