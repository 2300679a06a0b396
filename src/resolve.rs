//! Reference resolution
//!
//! A reference is a `#/components/schemas/{Name}` pointer into the document's
//! component section. Resolution is a single lookup; chains of references are
//! tolerated but cycles are reported to the caller, which decides the
//! fallback policy; the resolver itself never recovers.

use std::collections::HashSet;

use crate::document::{SchemaDocument, SchemaNode};
use crate::error::{Result, TypegenError};

const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// Extract the schema name from a reference token, if it points into the
/// component section
pub fn ref_name(reference: &str) -> Option<&str> {
    reference.strip_prefix(COMPONENT_PREFIX)
}

/// Resolves reference tokens against one schema document
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    document: &'a SchemaDocument,
}

impl<'a> Resolver<'a> {
    pub fn new(document: &'a SchemaDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &'a SchemaDocument {
        self.document
    }

    /// Resolve a single reference token to its named schema node
    pub fn resolve(&self, reference: &str) -> Result<&'a SchemaNode> {
        let name = ref_name(reference).ok_or_else(|| TypegenError::ReferenceNotFound {
            reference: reference.to_string(),
        })?;
        self.document
            .get_schema(name)
            .ok_or_else(|| TypegenError::ReferenceNotFound {
                reference: reference.to_string(),
            })
    }

    /// Resolve a reference, following ref-to-ref chains, recording each token
    /// in `visited`. Signals a cycle when a token repeats; the caller decides
    /// what to fall back to.
    pub fn resolve_tracked(
        &self,
        reference: &str,
        visited: &mut HashSet<String>,
    ) -> Result<&'a SchemaNode> {
        let mut current = reference.to_string();
        loop {
            if !visited.insert(current.clone()) {
                return Err(TypegenError::StructuralCycle { reference: current });
            }
            let node = self.resolve(&current)?;
            match &node.reference {
                Some(next) if node.is_pure_reference() => current = next.clone(),
                _ => return Ok(node),
            }
        }
    }

    /// Resolve a node that may or may not be a reference; non-references are
    /// returned as-is
    pub fn deref_node(&self, node: &'a SchemaNode) -> Result<&'a SchemaNode> {
        match &node.reference {
            Some(reference) => self.resolve(reference),
            None => Ok(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "components": { "schemas": {
                "AccountId": {"type": "string"},
                "Account": {"$ref": "#/components/schemas/AccountId"},
                "Loop": {"$ref": "#/components/schemas/Loop"}
            }}
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_direct() {
        let doc = doc();
        let resolver = Resolver::new(&doc);
        let node = resolver.resolve("#/components/schemas/AccountId").unwrap();
        assert_eq!(node.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_resolve_not_found() {
        let doc = doc();
        let resolver = Resolver::new(&doc);
        let err = resolver.resolve("#/components/schemas/Missing").unwrap_err();
        assert!(matches!(err, TypegenError::ReferenceNotFound { .. }));
    }

    #[test]
    fn test_resolve_chain() {
        let doc = doc();
        let resolver = Resolver::new(&doc);
        let mut visited = HashSet::new();
        let node = resolver
            .resolve_tracked("#/components/schemas/Account", &mut visited)
            .unwrap();
        assert_eq!(node.schema_type.as_deref(), Some("string"));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_cycle_detected() {
        let doc = doc();
        let resolver = Resolver::new(&doc);
        let mut visited = HashSet::new();
        let err = resolver
            .resolve_tracked("#/components/schemas/Loop", &mut visited)
            .unwrap_err();
        assert!(matches!(err, TypegenError::StructuralCycle { .. }));
    }

    #[test]
    fn test_non_component_ref_is_not_found() {
        let doc = doc();
        let resolver = Resolver::new(&doc);
        assert!(resolver.resolve("#/definitions/Other").is_err());
    }
}
