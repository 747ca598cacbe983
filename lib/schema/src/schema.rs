//! Schema root document
//!
//! The `TypeSchema` is loaded once per worker before any records are
//! processed and is read-only for the rest of the worker's lifetime.
//! Everything a job needs to score a pair hangs off it: the entity
//! shapes, the missing-value policy, the categorical distance table,
//! and the algorithm selectors the strategy constructors consume.

use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a missing attribute value contributes to a comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Substitute a default distance for the missing side
    #[default]
    Default,
    /// Omit the field from accumulation
    Skip,
}

/// Selector for the weighted distance accumulator.
///
/// A closed enum: an unrecognized name fails deserialization, which is
/// a fatal setup error before any records are processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "name")]
pub enum DistanceAlgorithm {
    /// Linear blend of effective distances
    Manhattan,
    /// Power blend: Minkowski-style aggregation with exponent `power`
    Minkowski {
        #[serde(default = "default_power")]
        power: f64,
    },
}

fn default_power() -> f64 {
    2.0
}

impl Default for DistanceAlgorithm {
    fn default() -> Self {
        Self::Manhattan
    }
}

/// Selector for the text field distance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlgorithm {
    /// Character trigram set similarity
    #[default]
    Trigram,
    /// Whitespace-token Jaccard similarity
    TokenJaccard,
}

/// One symmetric entry of the categorical distance lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoricalDistance {
    /// Target-entity ordinal the entry applies to.
    pub ordinal: usize,
    pub value_one: String,
    pub value_two: String,
    pub distance: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// The schema document of one similarity job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeSchema {
    /// One entity for same-type jobs, two (source then target) for
    /// cross-type jobs.
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub missing_value_policy: MissingValuePolicy,

    /// Relative-difference cutoff for numeric fields without bounds.
    #[serde(default = "default_threshold")]
    pub numeric_diff_threshold: f64,

    /// Symmetric categorical distances; unlisted distinct pairs score 1.
    #[serde(default)]
    pub categorical_distances: Vec<CategoricalDistance>,

    #[serde(default)]
    pub distance_algorithm: DistanceAlgorithm,

    #[serde(default)]
    pub text_algorithm: TextAlgorithm,

    /// Same-type only: confine comparisons to records sharing this
    /// column's value.
    #[serde(default)]
    pub partitioning_ordinal: Option<usize>,
}

impl TypeSchema {
    /// Parse and validate a schema from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: TypeSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema document from a file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check everything the workers will rely on, once, at load time.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.entities.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        if self.entities.len() > 2 {
            return Err(SchemaError::TooManyEntities(self.entities.len()));
        }

        for entity in &self.entities {
            entity.id_field()?;
            for field in &entity.fields {
                if field.weight < 1.0 {
                    return Err(SchemaError::WeightBelowOne {
                        ordinal: field.ordinal,
                        weight: field.weight,
                    });
                }
            }
        }

        if self.is_cross_type() {
            let target = self
                .entity_by_type(1)
                .ok_or(SchemaError::MissingEntityType(1))?;
            let source = self
                .entity_by_type(0)
                .ok_or(SchemaError::MissingEntityType(0))?;
            if source.field_count() == target.field_count() {
                return Err(SchemaError::AmbiguousEntityWidth(source.field_count()));
            }
            for field in &source.fields {
                for mapping in &field.mappings {
                    if mapping.matching_ordinal < 0 {
                        continue;
                    }
                    let ordinal = mapping.matching_ordinal as usize;
                    if target.field_at(ordinal).is_none() {
                        return Err(SchemaError::UnknownMappingOrdinal {
                            source_ordinal: field.ordinal,
                            matching_ordinal: ordinal,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// The single entity of a same-type schema (first entity otherwise).
    pub fn entity(&self) -> &Entity {
        &self.entities[0]
    }

    pub fn entity_by_type(&self, entity_type: u8) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_type == entity_type)
    }

    /// Recognize an entity shape from a raw record's field count.
    pub fn entity_by_width(&self, width: usize) -> Option<&Entity> {
        self.entities.iter().find(|e| e.field_count() == width)
    }

    pub fn is_cross_type(&self) -> bool {
        self.entities.len() == 2
    }

    /// Categorical distance between two values at a target ordinal.
    ///
    /// Equal values are identical; the lookup is symmetric in the value
    /// pair; unlisted distinct pairs are maximally distant.
    pub fn categorical_distance(&self, ordinal: usize, first: &str, second: &str) -> f64 {
        if first == second {
            return 0.0;
        }
        self.categorical_distances
            .iter()
            .find(|entry| {
                entry.ordinal == ordinal
                    && ((entry.value_one == first && entry.value_two == second)
                        || (entry.value_one == second && entry.value_two == first))
            })
            .map(|entry| entry.distance)
            .unwrap_or(1.0)
    }
}

/// Errors raised while loading or validating a schema document.
///
/// All of these are fatal at worker startup: no valid strategy can be
/// constructed from a bad schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema must declare at least one entity")]
    EmptySchema,

    #[error("Schema declares {0} entities; at most two are supported")]
    TooManyEntities(usize),

    #[error("Entity type {0} has no id field")]
    NoIdField(u8),

    #[error("Entity type {0} has more than one id field")]
    MultipleIdFields(u8),

    #[error("Field at ordinal {ordinal} has weight {weight}; weights must be >= 1")]
    WeightBelowOne { ordinal: usize, weight: f64 },

    #[error("Cross-type schema is missing an entity of type {0}")]
    MissingEntityType(u8),

    #[error("Cross-type entities share field count {0}; shapes must be distinguishable")]
    AmbiguousEntityWidth(usize),

    #[error("Mapping on source ordinal {source_ordinal} targets unknown ordinal {matching_ordinal}")]
    UnknownMappingOrdinal {
        source_ordinal: usize,
        matching_ordinal: usize,
    },

    #[error("Schema parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Schema IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SchemaError> for pairx_core::Error {
    fn from(err: SchemaError) -> Self {
        pairx_core::Error::Schema(err.to_string())
    }
}
