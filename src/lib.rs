//! OpenAPI Type Generator
//!
//! Ingests a JSON-Schema/OpenAPI component document and produces two
//! artifacts: a canonical type model describing every schema as a
//! strongly-typed data structure with an explicit decode contract, and
//! schema-valid sample values for every schema, used to exercise those types.
//!
//! ## Pipeline
//!
//! ```text
//! document.json
//!   ├── SchemaDocument      (immutable schema graph)
//!   ├── Resolver            (reference lookup, cycle detection)
//!   ├── normalize           (allOf merging, nullable collapse)
//!   ├── TypeSynthesizer     (canonical TypeNodes + NamingRegistry)
//!   │     └── variant classification for oneOf/anyOf unions
//!   └── Sampler             (seeded, constraint-satisfying samples)
//!         └── SchemaValidator (validate-and-retry loop)
//! ```
//!
//! The type synthesizer and the sampler are independent consumers of the
//! same schema graph; they never call each other.

pub mod config;
pub mod decode;
pub mod document;
pub mod driver;
pub mod error;
pub mod methods;
pub mod model;
pub mod names;
pub mod normalize;
pub mod resolve;
pub mod sample;
pub mod synth;
pub mod validate;
pub(crate) mod variants;

pub use config::{GeneratorConfig, OutputFormat, SamplerConfig};
pub use decode::{decode_union, DecodeError, VariantAttempt};
pub use document::{SchemaDocument, SchemaKind, SchemaNode};
pub use driver::{GenerationReport, Generator, NamedSample, SampleSet};
pub use error::{Result, TypegenError};
pub use methods::{extract_methods, MethodDescriptor};
pub use model::{Representation, TypeModel, TypeNode, TypeRef, VariantDescriptor};
pub use names::NamingRegistry;
pub use resolve::Resolver;
pub use sample::Sampler;
pub use synth::TypeSynthesizer;
pub use validate::SchemaValidator;
