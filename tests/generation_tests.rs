//! End-to-end generation tests
//!
//! Exercises the full pipeline over small documents: type synthesis, sample
//! generation with validation, and the union decode contract.

use openapi_typegen::{
    decode_union, GeneratorConfig, Generator, Sampler, SamplerConfig, SchemaDocument, TypeNode,
};
use serde_json::json;

fn document(schemas: serde_json::Value) -> SchemaDocument {
    SchemaDocument::from_value(json!({ "components": { "schemas": schemas } })).unwrap()
}

fn shape_document() -> SchemaDocument {
    document(json!({
        "Circle": {
            "type": "object",
            "properties": {"radius": {"type": "number"}},
            "required": ["radius"]
        },
        "Square": {
            "type": "object",
            "properties": {"side": {"type": "number"}},
            "required": ["side"]
        },
        "Shape": {
            "oneOf": [
                {
                    "type": "object",
                    "properties": {"circle": {"$ref": "#/components/schemas/Circle"}},
                    "required": ["circle"]
                },
                {
                    "type": "object",
                    "properties": {"square": {"$ref": "#/components/schemas/Square"}},
                    "required": ["square"]
                }
            ]
        }
    }))
}

#[test]
fn test_forced_circle_variant_decodes_back_to_circle() {
    let doc = shape_document();
    let generator = Generator::new(&doc, GeneratorConfig::default());
    let model = generator.type_model();
    let sampler = Sampler::new(&doc, SamplerConfig::default());

    let set = generator.sample_schema(&sampler, "Shape").unwrap();
    // One whole-schema sample plus one per forced variant
    assert_eq!(set.samples.len(), 3);

    let circle = &set.samples[1];
    assert!(circle.valid, "forced circle sample failed validation");
    assert!(
        circle.value["circle"]["radius"].is_number(),
        "unexpected shape: {}",
        circle.value
    );

    let union = model.find("Shape").unwrap();
    let variant = decode_union(&model, union, &circle.value).unwrap();
    assert_eq!(variant.tag, "circle");
    // The radius survives the round trip untouched
    assert_eq!(circle.value["circle"]["radius"], json!(0.0));
}

#[test]
fn test_every_forced_variant_round_trips_to_its_own_tag() {
    let doc = shape_document();
    let generator = Generator::new(&doc, GeneratorConfig::default());
    let model = generator.type_model();
    let sampler = Sampler::new(&doc, SamplerConfig::default());
    let union = model.find("Shape").unwrap();

    let set = generator.sample_schema(&sampler, "Shape").unwrap();
    let expected = ["circle", "square"];
    for (sample, tag) in set.samples[1..].iter().zip(expected) {
        let variant = decode_union(&model, union, &sample.value).unwrap();
        assert_eq!(variant.tag, tag);
    }
}

#[test]
fn test_nullable_reference_never_becomes_a_union() {
    let doc = document(json!({
        "Height": {"type": "integer"},
        "MaybeHeight": {
            "anyOf": [
                {"$ref": "#/components/schemas/Height"},
                {"type": "null"}
            ]
        }
    }));
    let generator = Generator::new(&doc, GeneratorConfig::default());
    let model = generator.type_model();
    match model.find("MaybeHeight").unwrap() {
        TypeNode::Alias { .. } => {}
        other => panic!("nullable pair must collapse to an alias, got {:?}", other),
    }
}

#[test]
fn test_whole_document_samples_validate() {
    let doc = document(json!({
        "AccountId": {"type": "string", "minLength": 2, "maxLength": 64},
        "Balance": {"type": "string"},
        "Account": {
            "type": "object",
            "properties": {
                "account_id": {"$ref": "#/components/schemas/AccountId"},
                "amount": {"$ref": "#/components/schemas/Balance"},
                "block_height": {"type": "integer", "minimum": 0},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["account_id", "amount", "block_height"]
        },
        "Finality": {"type": "string", "enum": ["optimistic", "final"]}
    }));
    let generator = Generator::new(&doc, GeneratorConfig::default());
    let (sets, report) = generator.sample_all();
    assert_eq!(report.failed, 0, "failures: {:?}", report.failures);
    assert_eq!(sets.len(), 4);
    for set in &sets {
        for sample in &set.samples {
            assert!(sample.valid, "{} produced an invalid sample", set.schema);
        }
    }
}

#[test]
fn test_generation_is_reproducible_across_runs() {
    let build = || {
        let doc = shape_document();
        let generator = Generator::new(&doc, GeneratorConfig::default());
        let sampler = Sampler::new(&doc, SamplerConfig::default());
        let model = serde_json::to_value(generator.type_model()).unwrap();
        let samples: Vec<serde_json::Value> = generator
            .sample_schema(&sampler, "Shape")
            .unwrap()
            .samples
            .into_iter()
            .map(|s| s.value)
            .collect();
        (model, samples)
    };
    assert_eq!(build(), build());
}

#[test]
fn test_recursive_document_generates_types_and_samples() {
    let doc = document(json!({
        "Tree": {
            "type": "object",
            "properties": {
                "label": {"type": "string", "minLength": 1},
                "children": {
                    "type": "array",
                    "items": {"$ref": "#/components/schemas/Tree"}
                }
            },
            "required": ["label"]
        }
    }));
    let generator = Generator::new(&doc, GeneratorConfig::default());
    let model = generator.type_model();
    assert!(model.find("Tree").is_some());

    let (sets, report) = generator.sample_all();
    assert_eq!(report.failed, 0, "failures: {:?}", report.failures);
    assert!(sets[0].samples[0].value.is_object());
}
