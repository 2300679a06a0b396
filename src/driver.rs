//! Generation driver
//!
//! Orchestrates a full run over the document: one type model, plus validated
//! samples for every schema and per-variant samples for union schemas.
//! Per-schema failures never abort the batch; the driver reports a tally at
//! the end and the only fatal condition is an unreadable input document,
//! which fails before this module is ever reached.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::document::{SchemaDocument, SchemaNode};
use crate::error::{Result, TypegenError};
use crate::model::TypeModel;
use crate::names::NamingRegistry;
use crate::sample::{forced_variant_schema, Sampler};
use crate::synth::TypeSynthesizer;
use crate::validate::SchemaValidator;

/// One generated sample, labeled for file naming by the caller
#[derive(Debug, Clone)]
pub struct NamedSample {
    /// Label suffix: "Success"/"Error" for response unions, "Variant{i}"
    /// otherwise, empty for the plain whole-schema sample
    pub label: String,
    pub value: Value,
    /// Whether the value passed schema validation
    pub valid: bool,
}

/// All samples generated for one schema
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub schema: String,
    pub samples: Vec<NamedSample>,
}

/// Success/failure tally for one run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

impl GenerationReport {
    fn record(&mut self, schema: &str, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(schema.to_string());
        }
    }
}

pub struct Generator<'a> {
    document: &'a SchemaDocument,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(document: &'a SchemaDocument, config: GeneratorConfig) -> Self {
        Self { document, config }
    }

    /// Synthesize the canonical type model for the whole document
    pub fn type_model(&self) -> TypeModel {
        let mut registry = NamingRegistry::new();
        TypeSynthesizer::new(self.document, &mut registry).synthesize_all()
    }

    /// Generate validated samples for every schema in the document
    pub fn sample_all(&self) -> (Vec<SampleSet>, GenerationReport) {
        let sampler = Sampler::new(self.document, self.config.sampler.clone());
        let mut report = GenerationReport::default();
        let mut sets = Vec::new();

        for name in self.document.schema_names() {
            match self.sample_schema(&sampler, name) {
                Ok(set) => {
                    let ok = set.samples.iter().all(|s| s.valid);
                    report.record(name, ok);
                    sets.push(set);
                }
                Err(err) => {
                    warn!(schema = name, error = %err, "sample generation failed");
                    report.record(name, false);
                }
            }
        }
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "sample generation finished"
        );
        (sets, report)
    }

    /// Samples for one schema: the whole-schema sample, plus one forced
    /// sample per union member so that every logical outcome is covered
    pub fn sample_schema(&self, sampler: &Sampler<'a>, name: &str) -> Result<SampleSet> {
        let node = self.document.require_schema(name)?;
        let validator = SchemaValidator::for_schema(self.document, name)?;
        let mut samples = Vec::new();

        let (value, valid) = self.sample_validated(sampler, node, &validator, 0);
        samples.push(NamedSample {
            label: String::new(),
            value,
            valid,
        });

        if let Some(members) = node.union_members() {
            if members.len() >= 2 {
                for (index, member) in members.iter().enumerate() {
                    let resolver = crate::resolve::Resolver::new(self.document);
                    let forced = forced_variant_schema(node, member, &resolver);
                    // Stagger seeds so variants draw independent streams
                    let seed_base = (index as u64 + 1) * 1000;
                    let (value, valid) =
                        self.sample_validated(sampler, &forced, &validator, seed_base);
                    samples.push(NamedSample {
                        label: variant_label(member, index),
                        value,
                        valid,
                    });
                }
            }
        }

        Ok(SampleSet {
            schema: name.to_string(),
            samples,
        })
    }

    /// The bounded validate-and-retry loop: up to `max_attempts` seeds, first
    /// valid sample wins; if none validate, the last attempt is still emitted
    /// so the near-miss can be inspected
    fn sample_validated(
        &self,
        sampler: &Sampler<'a>,
        node: &SchemaNode,
        validator: &SchemaValidator,
        seed_base: u64,
    ) -> (Value, bool) {
        let attempts = self.config.sampler.max_attempts.max(1) as u64;
        let mut last = Value::Null;
        for attempt in 0..attempts {
            let value = sampler.sample(node, self.config.sampler.seed + seed_base + attempt);
            if validator.is_valid(&value) {
                if attempt > 0 {
                    debug!(schema = validator.schema_name(), attempt, "valid after retry");
                }
                return (value, true);
            }
            last = value;
        }
        let err = TypegenError::ValidationExhausted {
            schema: validator.schema_name().to_string(),
            attempts: attempts as usize,
            last_error: validator
                .errors(&last)
                .into_iter()
                .next()
                .unwrap_or_default(),
        };
        warn!(error = %err, "emitting last sample");
        (last, false)
    }
}

/// Label a forced union member for output naming. Response-shaped members
/// carrying a single `result` or `error` property get the conventional
/// Success/Error suffix; everything else is numbered by position.
fn variant_label(member: &SchemaNode, index: usize) -> String {
    if member.properties.len() == 1 {
        match member.properties.keys().next().map(String::as_str) {
            Some("result") => return "Success".to_string(),
            Some("error") => return "Error".to_string(),
            _ => {}
        }
    }
    format!("Variant{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(schemas: serde_json::Value) -> SchemaDocument {
        SchemaDocument::from_value(json!({ "components": { "schemas": schemas } })).unwrap()
    }

    #[test]
    fn test_batch_never_aborts_on_one_schema() {
        let document = doc(json!({
            "Good": {"type": "string"},
            "Broken": {"$ref": "#/components/schemas/Missing"},
            "AlsoGood": {"type": "integer"}
        }));
        let generator = Generator::new(&document, GeneratorConfig::default());
        let (sets, report) = generator.sample_all();
        assert_eq!(report.succeeded + report.failed, 3);
        assert!(sets.iter().any(|s| s.schema == "Good"));
        assert!(sets.iter().any(|s| s.schema == "AlsoGood"));
    }

    #[test]
    fn test_response_union_gets_success_and_error_samples() {
        let document = doc(json!({
            "RpcResponse": {
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string"},
                    "id": {"type": "string"}
                },
                "required": ["jsonrpc", "id"],
                "oneOf": [
                    {
                        "type": "object",
                        "properties": {"result": {"type": "integer"}},
                        "required": ["result"]
                    },
                    {
                        "type": "object",
                        "properties": {"error": {"type": "string"}},
                        "required": ["error"]
                    }
                ]
            }
        }));
        let generator = Generator::new(&document, GeneratorConfig::default());
        let sampler = Sampler::new(&document, GeneratorConfig::default().sampler);
        let set = generator.sample_schema(&sampler, "RpcResponse").unwrap();
        let labels: Vec<&str> = set.samples.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["", "Success", "Error"]);
        // Forced variants carry the parent-level required fields
        let success = &set.samples[1].value;
        assert!(success.get("result").is_some());
        assert!(success.get("jsonrpc").is_some());
        assert!(success.get("id").is_some());
    }

    #[test]
    fn test_plain_union_variants_are_numbered() {
        let document = doc(json!({
            "Shape": {"oneOf": [
                {"type": "object", "properties": {"circle": {"type": "number"}}, "required": ["circle"]},
                {"type": "object", "properties": {"square": {"type": "number"}}, "required": ["square"]}
            ]}
        }));
        let generator = Generator::new(&document, GeneratorConfig::default());
        let sampler = Sampler::new(&document, GeneratorConfig::default().sampler);
        let set = generator.sample_schema(&sampler, "Shape").unwrap();
        let labels: Vec<&str> = set.samples.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["", "Variant0", "Variant1"]);
    }

    #[test]
    fn test_unsatisfiable_schema_still_emits_a_sample() {
        // minLength above maxLength can never validate; the last attempt is
        // still emitted and the schema counted as a failure
        let document = doc(json!({
            "Impossible": {"type": "string", "minLength": 5, "maxLength": 2}
        }));
        let generator = Generator::new(&document, GeneratorConfig::default());
        let (sets, report) = generator.sample_all();
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures, vec!["Impossible"]);
        let set = sets.iter().find(|s| s.schema == "Impossible").unwrap();
        assert!(!set.samples[0].valid);
        assert!(set.samples[0].value.is_string());
    }

    #[test]
    fn test_type_model_runs_are_deterministic() {
        let document = doc(json!({
            "A": {"type": "object", "properties": {"x": {"type": "string"}}},
            "B": {"type": "string", "enum": ["a", "b"]}
        }));
        let generator = Generator::new(&document, GeneratorConfig::default());
        let first = generator.type_model();
        let second = generator.type_model();
        let names_a: Vec<&str> = first.types.iter().map(|t| t.name()).collect();
        let names_b: Vec<&str> = second.types.iter().map(|t| t.name()).collect();
        assert_eq!(names_a, names_b);
    }
}
