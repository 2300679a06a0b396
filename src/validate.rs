//! Schema validation for synthesized samples
//!
//! Wraps a compiled JSON Schema validator for one named component schema.
//! Two document-level fixups happen before compilation: the OpenAPI-style
//! `nullable: true` markers are rewritten into `anyOf [T, null]` (the
//! validator speaks plain JSON Schema), and the document's `components`
//! object is embedded next to the target schema so that
//! `#/components/schemas/...` references resolve against the compiled root.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::document::SchemaDocument;
use crate::error::{Result, TypegenError};
use crate::normalize::nullable_to_any_of;

pub struct SchemaValidator {
    schema_name: String,
    compiled: JSONSchema,
}

impl SchemaValidator {
    /// Compile a validator for one schema out of the document's components
    pub fn for_schema(document: &SchemaDocument, name: &str) -> Result<Self> {
        let node = document.require_schema(name)?;
        let mut target = nullable_to_any_of(&node.to_value());
        if let Some(components) = document.raw().get("components") {
            if let Value::Object(map) = &mut target {
                map.insert("components".to_string(), nullable_to_any_of(components));
            }
        }
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&target)
            .map_err(|err| TypegenError::SchemaCompile {
                schema: name.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            schema_name: name.to_string(),
            compiled,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.compiled.is_valid(value)
    }

    /// All validation error messages for a value, empty when valid
    pub fn errors(&self, value: &Value) -> Vec<String> {
        match self.compiled.validate(value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| format!("{} at {}", err, err.instance_path))
                .collect(),
        }
    }
}
