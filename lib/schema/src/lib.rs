//! # PairX Schema
//!
//! Declarative description of the entity shapes a similarity job
//! compares. A schema document holds one entity (same-type jobs) or two
//! (cross-type jobs), the per-field comparison configuration, and the
//! job-wide policies the distance strategies consume.
//!
//! ## Features
//!
//! - **Entity model**: ordered fields with data type, weight, numeric
//!   distance selector, bounds, and unit
//! - **Field mappings**: cross-type value correspondence and numeric
//!   sub-range tables resolved into per-ordinal mapped values
//! - **Categorical distance table**: symmetric lookup keyed by target
//!   ordinal and value pair
//! - **Validation**: id fields, weights, mapping ordinals, and entity
//!   shapes are checked once at load time; workers never re-validate
//!
//! ## Example
//!
//! ```rust
//! use pairx_schema::TypeSchema;
//!
//! let schema: TypeSchema = TypeSchema::from_json(r#"{
//!     "entities": [{
//!         "entity_type": 0,
//!         "fields": [
//!             {"ordinal": 0, "type": "text", "id": true},
//!             {"ordinal": 1, "type": "categorical", "weight": 2.0},
//!             {"ordinal": 2, "type": "int", "min": 0.0, "max": 100.0}
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(schema.entity().id_ordinal().unwrap(), 0);
//! ```

pub mod entity;
pub mod schema;

pub use entity::{
    DataType, Entity, Field, FieldMapping, MappedValue, NumericSelector, ValueMapping,
};
pub use schema::{
    CategoricalDistance, DistanceAlgorithm, MissingValuePolicy, SchemaError, TextAlgorithm,
    TypeSchema,
};
