//! Sample value synthesis
//!
//! Produces randomized, constraint-satisfying JSON instances for a schema.
//! Sampling is a pure function of (schema, seed): the caller owns the
//! validate-and-retry loop and varies the seed between attempts, so a fixed
//! seed reproduces a sample exactly. Cycles are broken by a `seen_refs` set
//! threaded through every recursive call; the depth ceiling is a safety net
//! behind it, not the primary defense.

use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::SamplerConfig;
use crate::document::{AdditionalProperties, Items, SchemaDocument, SchemaNode};
use crate::error::Result;
use crate::normalize::{is_nullable, merge_all_of, null_collapse};
use crate::resolve::{ref_name, Resolver};

/// Recursion budget for the fallback path, separate from the main ceiling
const FALLBACK_BUDGET: u32 = 3;

/// How many required fields a cycle-breaking minimal object covers
const FALLBACK_FIELD_LIMIT: usize = 3;

/// Minimal hand-picked values for primitive-like reference names that commonly
/// sit on reference cycles. Config fallbacks are merged over these.
fn builtin_fallbacks() -> HashMap<String, Value> {
    HashMap::from([
        ("AccountId".to_string(), json!("alice.test")),
        (
            "PublicKey".to_string(),
            json!("ed25519:6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp"),
        ),
        (
            "CryptoHash".to_string(),
            json!("11111111111111111111111111111111"),
        ),
        (
            "Signature".to_string(),
            json!("ed25519:3s1dvZdQtcAjBksMHFrysqvF63wnyMHPA4owNQmCJZ2EBakZEKdtMsLqrHdKWQjJbSRN6kRknN2WdwSBLWGCokXj"),
        ),
        ("BlockHeight".to_string(), json!(100)),
        ("Balance".to_string(), json!("1000000000000000000000000")),
        ("Gas".to_string(), json!(100_000_000_000_000u64)),
        ("Nonce".to_string(), json!(1)),
        ("ShardId".to_string(), json!(0)),
    ])
}

pub struct Sampler<'a> {
    resolver: Resolver<'a>,
    config: SamplerConfig,
    fallbacks: HashMap<String, Value>,
}

impl<'a> Sampler<'a> {
    pub fn new(document: &'a SchemaDocument, config: SamplerConfig) -> Self {
        let mut fallbacks = builtin_fallbacks();
        fallbacks.extend(config.fallbacks.clone());
        Self {
            resolver: Resolver::new(document),
            config,
            fallbacks,
        }
    }

    /// One sample for a schema fragment; pure in (schema, seed)
    pub fn sample(&self, node: &SchemaNode, seed: u64) -> Value {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut seen = HashSet::new();
        self.synth(&mut rng, node, 0, &mut seen)
    }

    /// One sample for a named schema
    pub fn sample_named(&self, name: &str, seed: u64) -> Result<Value> {
        let node = self.resolver.document().require_schema(name)?;
        Ok(self.sample(node, seed))
    }

    fn synth(
        &self,
        rng: &mut Xoshiro256StarStar,
        node: &SchemaNode,
        depth: u32,
        seen: &mut HashSet<String>,
    ) -> Value {
        if depth > self.config.depth_limit {
            return Value::Null;
        }

        // Declared defaults and constants win over anything synthesized
        if let Some(value) = &node.default {
            return value.clone();
        }

        if let Some(reference) = &node.reference {
            return self.synth_reference(rng, reference, depth, seen);
        }

        if let Some(members) = &node.all_of {
            let merged = merge_all_of(members, &self.resolver);
            return self.synth(rng, &merged, depth + 1, seen);
        }

        if let Some(values) = &node.enum_values {
            return pick_enum_value(rng, values);
        }

        if let Some(members) = node.union_members() {
            if let Some(inner) = null_collapse(members) {
                return self.synth(rng, inner, depth + 1, seen);
            }
            return self.synth_union(rng, node, members, depth, seen);
        }

        if let Some(value) = &node.const_value {
            return value.clone();
        }

        match node.schema_type.as_deref() {
            Some("object") => self.synth_object(rng, node, depth, seen),
            Some("array") => self.synth_array(rng, node, depth, seen),
            Some("string") => synth_string(rng, node),
            Some("integer") => synth_integer(node),
            Some("number") => synth_number(node),
            Some("boolean") => Value::Bool(true),
            Some("null") => Value::Null,
            None if !node.properties.is_empty() => self.synth_object(rng, node, depth, seen),
            _ => Value::Null,
        }
    }

    fn synth_reference(
        &self,
        rng: &mut Xoshiro256StarStar,
        reference: &str,
        depth: u32,
        seen: &mut HashSet<String>,
    ) -> Value {
        let Some(name) = ref_name(reference) else {
            return Value::Null;
        };
        if seen.contains(name) {
            debug!(reference = name, "reference cycle, using fallback value");
            return self.fallback_for_ref(name, FALLBACK_BUDGET);
        }
        let Ok(target) = self.resolver.resolve(reference) else {
            return Value::Null;
        };
        seen.insert(name.to_string());
        let value = self.synth(rng, target, depth + 1, seen);
        seen.remove(name);
        value
    }

    /// Cycle-breaking value for a reference: the hand-picked table first, then
    /// a minimal object covering the first few required fields, each filled
    /// from the same table under a small recursion budget
    fn fallback_for_ref(&self, name: &str, budget: u32) -> Value {
        if let Some(value) = self.fallbacks.get(name) {
            return value.clone();
        }
        if budget == 0 {
            return Value::Null;
        }
        let Some(node) = self.resolver.document().get_schema(name) else {
            return Value::Null;
        };
        self.fallback_for_node(node, budget)
    }

    fn fallback_for_node(&self, node: &SchemaNode, budget: u32) -> Value {
        if let Some(reference) = node.reference.as_deref().and_then(ref_name) {
            return self.fallback_for_ref(reference, budget.saturating_sub(1));
        }
        if let Some(values) = &node.enum_values {
            return values.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null);
        }
        if !node.properties.is_empty() {
            let mut object = Map::new();
            for required in node.required.iter().take(FALLBACK_FIELD_LIMIT) {
                if let Some(prop) = node.properties.get(required) {
                    let value = self.fallback_for_node(prop, budget.saturating_sub(1));
                    object.insert(required.clone(), value);
                }
            }
            return Value::Object(object);
        }
        match node.schema_type.as_deref() {
            Some("string") => json!("value"),
            Some("integer") | Some("number") => json!(0),
            Some("boolean") => json!(true),
            Some("array") => json!([]),
            Some("object") => json!({}),
            _ => Value::Null,
        }
    }

    fn synth_union(
        &self,
        rng: &mut Xoshiro256StarStar,
        parent: &SchemaNode,
        members: &[SchemaNode],
        depth: u32,
        seen: &mut HashSet<String>,
    ) -> Value {
        if members.is_empty() {
            return Value::Null;
        }
        let choice = rng.gen_range(0..members.len());
        let member = &members[choice];
        let mut value = self.synth(rng, member, depth + 1, seen);
        if let Value::Object(object) = &mut value {
            self.backfill_required(rng, object, parent, members, member, depth, seen);
        }
        value
    }

    /// Required fields declared at the parent level or on any sibling member
    /// must still be present in the chosen member's sample. A field that
    /// stays null after backfill is left absent so validation surfaces the
    /// gap instead of masking it.
    #[allow(clippy::too_many_arguments)]
    fn backfill_required(
        &self,
        rng: &mut Xoshiro256StarStar,
        object: &mut Map<String, Value>,
        parent: &SchemaNode,
        members: &[SchemaNode],
        chosen: &SchemaNode,
        depth: u32,
        seen: &mut HashSet<String>,
    ) {
        let mut required: Vec<&str> = parent.required.iter().map(String::as_str).collect();
        for name in &chosen.required {
            if !required.contains(&name.as_str()) {
                required.push(name);
            }
        }
        for name in required {
            if object.contains_key(name) {
                continue;
            }
            let schema = chosen
                .properties
                .get(name)
                .or_else(|| parent.properties.get(name))
                .or_else(|| members.iter().find_map(|m| m.properties.get(name)));
            let Some(schema) = schema else { continue };
            let value = self.retry_field(rng, schema, depth, seen);
            if !value.is_null() {
                object.insert(name.to_string(), value);
            }
        }
    }

    fn synth_object(
        &self,
        rng: &mut Xoshiro256StarStar,
        node: &SchemaNode,
        depth: u32,
        seen: &mut HashSet<String>,
    ) -> Value {
        let required: HashSet<&str> = node.required.iter().map(String::as_str).collect();
        let mut object = Map::new();

        for (name, prop) in &node.properties {
            let is_required = required.contains(name.as_str());
            let mut value = self.synth(rng, prop, depth + 1, seen);
            if value.is_null() && is_required && !is_nullable(prop, &self.resolver) {
                value = self.retry_field(rng, prop, depth, seen);
            }
            if value.is_null() {
                if is_required {
                    // Left null after retries: a visible validation failure
                    // beats a silently wrong default
                    object.insert(name.clone(), Value::Null);
                } else {
                    // Absent nullable collections and absent non-nullable ones
                    // must not be conflated
                    match prop.schema_type.as_deref() {
                        Some("array") => {
                            object.insert(name.clone(), json!([]));
                        }
                        Some("object") => {
                            object.insert(name.clone(), json!({}));
                        }
                        _ => {}
                    }
                }
            } else {
                object.insert(name.clone(), value);
            }
        }

        for (pattern, schema) in &node.pattern_properties {
            let key = key_for_pattern(pattern);
            let value = self.synth(rng, schema, depth + 1, seen);
            object.entry(key).or_insert(value);
        }

        if object.is_empty() {
            if let Some(AdditionalProperties::Schema(schema)) = &node.additional_properties {
                let value = self.synth(rng, schema, depth + 1, seen);
                object.insert("sample_key".to_string(), value);
            }
        }

        Value::Object(object)
    }

    fn retry_field(
        &self,
        rng: &mut Xoshiro256StarStar,
        schema: &SchemaNode,
        depth: u32,
        seen: &mut HashSet<String>,
    ) -> Value {
        for _ in 0..self.config.field_retries {
            let value = self.synth(rng, schema, depth + 1, seen);
            if !value.is_null() {
                return value;
            }
        }
        Value::Null
    }

    fn synth_array(
        &self,
        rng: &mut Xoshiro256StarStar,
        node: &SchemaNode,
        depth: u32,
        seen: &mut HashSet<String>,
    ) -> Value {
        match &node.items {
            Some(Items::Tuple(items)) => {
                let mut values: Vec<Value> = items
                    .iter()
                    .map(|item| self.synth(rng, item, depth + 1, seen))
                    .collect();
                // Pad by repeating the last declared item type
                if let (Some(min), Some(last)) = (node.min_items, items.last()) {
                    while values.len() < min as usize {
                        values.push(self.synth(rng, last, depth + 1, seen));
                    }
                }
                Value::Array(values)
            }
            Some(Items::One(item)) => {
                let upper = node.max_items.map(|m| m.min(3)).unwrap_or(3);
                if upper == 0 {
                    return json!([]);
                }
                let mut count = rng.gen_range(1..=upper) as usize;
                if let Some(min) = node.min_items {
                    count = count.max(min as usize);
                }
                let values = (0..count)
                    .map(|_| self.synth(rng, item, depth + 1, seen))
                    .collect();
                Value::Array(values)
            }
            None => json!([]),
        }
    }
}

/// Bias 9:1 toward non-null members when both exist; a uniform pick would
/// make a disproportionate share of samples degenerate
fn pick_enum_value(rng: &mut Xoshiro256StarStar, values: &[Value]) -> Value {
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return Value::Null;
    }
    if non_null.len() < values.len() && !rng.gen_bool(0.9) {
        return Value::Null;
    }
    non_null[rng.gen_range(0..non_null.len())].clone()
}

/// One representative key for a pattern-keyed property: the first stock
/// candidate the pattern accepts, else a placeholder
fn key_for_pattern(pattern: &str) -> String {
    const CANDIDATES: &[&str] = &["12345", "sample_key", "sampleKey", "key1"];
    if let Ok(re) = regex::Regex::new(pattern) {
        for candidate in CANDIDATES {
            if re.is_match(candidate) {
                return (*candidate).to_string();
            }
        }
    }
    "key1".to_string()
}

fn synth_string(rng: &mut Xoshiro256StarStar, node: &SchemaNode) -> Value {
    match node.format.as_deref() {
        // Fixed canonical placeholder encodings
        Some("byte") | Some("binary") => return json!("dGVzdA=="),
        Some("date-time") => return json!("2024-01-01T00:00:00Z"),
        Some("date") => return json!("2024-01-01"),
        Some("uuid") => return json!("00000000-0000-4000-8000-000000000000"),
        _ => {}
    }
    if let Some(pattern) = &node.pattern {
        if let Ok(re) = regex::Regex::new(pattern) {
            // Settle for a stock value the pattern accepts; otherwise fall
            // through and let the validation loop surface the miss
            for candidate in ["12345", "sample", "2024-01-01"] {
                if re.is_match(candidate) {
                    return json!(candidate);
                }
            }
        }
    }
    // An explicit maxLength below 1 wins over the default length of 1
    let mut len = node.min_length.unwrap_or(1).max(1) as usize;
    if let Some(max) = node.max_length {
        len = len.min(max as usize);
    }
    let text: String = (0..len)
        .map(|_| (b'a' + rng.gen_range(0..26u8)) as char)
        .collect();
    Value::String(text)
}

/// Prefer the declared minimum, then the maximum, then zero
fn synth_integer(node: &SchemaNode) -> Value {
    if let Some(min) = node.minimum {
        return json!(min as i64);
    }
    if let Some(max) = node.maximum {
        return json!(max as i64);
    }
    json!(0)
}

fn synth_number(node: &SchemaNode) -> Value {
    if let Some(min) = node.minimum {
        return json!(min);
    }
    if let Some(max) = node.maximum {
        return json!(max);
    }
    json!(0.0)
}

/// Build the synthetic schema for one forced union member: parent-level base
/// properties and required names combined with the member's own, so one
/// sample per logical outcome can be produced instead of one random outcome
pub fn forced_variant_schema(
    parent: &SchemaNode,
    member: &SchemaNode,
    resolver: &Resolver<'_>,
) -> SchemaNode {
    let mut base = if member.is_pure_reference() {
        member
            .reference
            .as_deref()
            .and_then(|r| resolver.resolve(r).ok())
            .cloned()
            .unwrap_or_else(|| member.clone())
    } else if member.all_of.is_some() {
        merge_all_of(member.all_of.as_deref().unwrap_or_default(), resolver)
    } else {
        member.clone()
    };

    if base.properties.is_empty() && parent.properties.is_empty() {
        return base;
    }
    for (name, prop) in &parent.properties {
        if !base.properties.contains_key(name) {
            base.properties.insert(name.clone(), prop.clone());
        }
    }
    for name in &parent.required {
        if !base.required.contains(name) {
            base.required.push(name.clone());
        }
    }
    if base.schema_type.is_none() {
        base.schema_type = Some("object".to_string());
    }
    base
}
