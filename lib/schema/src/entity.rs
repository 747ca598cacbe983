//! Entity and field definitions
//!
//! An entity is a named record shape: an ordered list of fields, a type
//! tag (0 = source, 1 = target in cross-type jobs), and exactly one id
//! field. Fields carry everything a distance strategy needs to compare
//! one attribute: data type, weight, numeric selector, bounds, unit,
//! and (cross-type only) mappings into the other entity.

use crate::schema::SchemaError;
use ahash::AHashMap;
use pairx_core::{Counters, Record};
use serde::{Deserialize, Serialize};

/// Data type of one record field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Discrete category values compared through the schema lookup table
    Categorical,
    /// Integer values compared through a numeric selector
    Int,
    /// Floating point values compared through a numeric selector
    Double,
    /// Free text compared through the text strategy
    Text,
}

/// Distance selector for numeric fields.
///
/// `Soft` variants produce a linear distance normalized by the field
/// bounds; `Hard` variants are binary. `Min`/`Max` variants treat the
/// source value as a one-sided requirement on the target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum NumericSelector {
    #[default]
    EqualSoft,
    EqualHard,
    MinSoft,
    MinHard,
    MaxSoft,
    MaxHard,
}

/// One row of a cross-type value correspondence table.
///
/// Either `this_value` (categorical) or `this_value_range` (int) selects
/// source values that map to `that_value` in the target entity's domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueMapping {
    #[serde(default)]
    pub this_value: Option<String>,
    #[serde(default)]
    pub this_value_range: Option<[i64; 2]>,
    pub that_value: String,
}

/// Declares that a source field's values correspond to a target ordinal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    /// Ordinal in the target entity; -1 disables the mapping.
    pub matching_ordinal: i64,
    /// Without a table the raw source value passes through unchanged.
    #[serde(default)]
    pub value_mappings: Option<Vec<ValueMapping>>,
}

fn default_weight() -> f64 {
    1.0
}

/// Configuration for one field of an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    /// Position of the field in the delimited record.
    pub ordinal: usize,

    /// The data type of the field
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Relative importance in the combined score; must be >= 1.0.
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Marks the entity id field.
    #[serde(default)]
    pub id: bool,

    /// Distance selector for int/double fields.
    #[serde(default)]
    pub num_dist_function: NumericSelector,

    /// Lower bound used to normalize soft numeric distance.
    #[serde(default)]
    pub min: Option<f64>,

    /// Upper bound used to normalize soft numeric distance.
    #[serde(default)]
    pub max: Option<f64>,

    /// Unit token two-token values must carry, e.g. "kg" in "5 kg".
    #[serde(default)]
    pub unit: Option<String>,

    /// Cross-type mappings into the target entity.
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
}

impl Field {
    /// Normalization bounds, present only when the span is non-degenerate.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if max > min => Some((min, max)),
            _ => None,
        }
    }
}

/// A named record shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// 0 = source/first type, 1 = target/second type.
    #[serde(default)]
    pub entity_type: u8,

    /// Ordered field definitions covering every record column.
    pub fields: Vec<Field>,
}

impl Entity {
    /// The unique id field of the entity.
    pub fn id_field(&self) -> Result<&Field, SchemaError> {
        let mut id_fields = self.fields.iter().filter(|f| f.id);
        let first = id_fields
            .next()
            .ok_or(SchemaError::NoIdField(self.entity_type))?;
        if id_fields.next().is_some() {
            return Err(SchemaError::MultipleIdFields(self.entity_type));
        }
        Ok(first)
    }

    /// Ordinal of the id field.
    pub fn id_ordinal(&self) -> Result<usize, SchemaError> {
        Ok(self.id_field()?.ordinal)
    }

    /// Number of declared fields; recognizes which entity shape a raw
    /// record belongs to.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field declared at an ordinal, if any.
    pub fn field_at(&self, ordinal: usize) -> Option<&Field> {
        self.fields.iter().find(|f| f.ordinal == ordinal)
    }

    /// Resolve this (source) entity's mappings against one record.
    ///
    /// Produces one [`MappedValue`] per target ordinal, accumulating
    /// many-to-one mappings into a single entry. Unparseable values in
    /// range mappings are counted and dropped, never fatal.
    pub fn resolve_mapped_values(
        &self,
        record: &Record<'_>,
        counters: &mut Counters,
    ) -> AHashMap<usize, MappedValue> {
        let mut mapped: AHashMap<usize, MappedValue> = AHashMap::new();
        for field in &self.fields {
            for mapping in &field.mappings {
                if mapping.matching_ordinal < 0 {
                    continue;
                }
                let matching_ordinal = mapping.matching_ordinal as usize;
                let entry = mapped
                    .entry(matching_ordinal)
                    .or_insert_with(|| MappedValue::new(field.ordinal));

                let value = record.field_or_empty(field.ordinal);
                match &mapping.value_mappings {
                    Some(value_mappings) => {
                        for value_mapping in value_mappings {
                            if let Some(resolved) =
                                resolve_one(field, value, value_mapping, counters)
                            {
                                entry.values.push(resolved);
                                counters.increment("data", "mapped_value");
                                break;
                            }
                        }
                    }
                    None => {
                        if !value.is_empty() {
                            entry.values.push(value.to_string());
                        }
                    }
                }
            }
        }
        mapped
    }
}

fn resolve_one(
    field: &Field,
    value: &str,
    value_mapping: &ValueMapping,
    counters: &mut Counters,
) -> Option<String> {
    match field.data_type {
        DataType::Categorical | DataType::Text => {
            let this_value = value_mapping.this_value.as_deref()?;
            (this_value == value).then(|| value_mapping.that_value.clone())
        }
        DataType::Int | DataType::Double => {
            let range = value_mapping.this_value_range?;
            match value.parse::<f64>() {
                Ok(v) if v >= range[0] as f64 && v <= range[1] as f64 => {
                    Some(value_mapping.that_value.clone())
                }
                Ok(_) => None,
                Err(_) => {
                    counters.increment("invalid_data", &format!("field_{}", field.ordinal));
                    None
                }
            }
        }
    }
}

/// Mapped source values accumulated for one target ordinal.
///
/// Lives for the duration of one comparison; the originating source
/// field supplies the numeric selector when the target value is scored.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedValue {
    pub values: Vec<String>,
    pub source_ordinal: usize,
}

impl MappedValue {
    fn new(source_ordinal: usize) -> Self {
        Self {
            values: Vec::new(),
            source_ordinal,
        }
    }

    /// Average of the parseable mapped values, for numeric targets.
    pub fn average(&self) -> Option<f64> {
        let parsed: Vec<f64> = self
            .values
            .iter()
            .filter_map(|v| v.parse::<f64>().ok())
            .collect();
        if parsed.is_empty() {
            return None;
        }
        Some(parsed.iter().sum::<f64>() / parsed.len() as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(ordinal: usize, data_type: DataType) -> Field {
        Field {
            ordinal,
            data_type,
            weight: 1.0,
            id: false,
            num_dist_function: NumericSelector::default(),
            min: None,
            max: None,
            unit: None,
            mappings: Vec::new(),
        }
    }

    #[test]
    fn test_id_field_lookup() {
        let mut id = field(0, DataType::Text);
        id.id = true;
        let entity = Entity {
            entity_type: 0,
            fields: vec![id, field(1, DataType::Int)],
        };
        assert_eq!(entity.id_ordinal().unwrap(), 0);
    }

    #[test]
    fn test_missing_id_field() {
        let entity = Entity {
            entity_type: 1,
            fields: vec![field(0, DataType::Text)],
        };
        assert!(matches!(entity.id_field(), Err(SchemaError::NoIdField(1))));
    }

    #[test]
    fn test_bounds_require_distinct_min_max() {
        let mut f = field(2, DataType::Int);
        assert_eq!(f.bounds(), None);
        f.min = Some(5.0);
        f.max = Some(5.0);
        assert_eq!(f.bounds(), None);
        f.max = Some(10.0);
        assert_eq!(f.bounds(), Some((5.0, 10.0)));
    }

    #[test]
    fn test_categorical_value_mapping() {
        let mut source = field(1, DataType::Categorical);
        source.mappings = vec![FieldMapping {
            matching_ordinal: 3,
            value_mappings: Some(vec![
                ValueMapping {
                    this_value: Some("petite".to_string()),
                    this_value_range: None,
                    that_value: "S".to_string(),
                },
                ValueMapping {
                    this_value: Some("tall".to_string()),
                    this_value_range: None,
                    that_value: "L".to_string(),
                },
            ]),
        }];
        let entity = Entity {
            entity_type: 0,
            fields: vec![field(0, DataType::Text), source],
        };

        let mut counters = Counters::new();
        let record = Record::parse("c1,tall", ",");
        let mapped = entity.resolve_mapped_values(&record, &mut counters);

        let value = mapped.get(&3).unwrap();
        assert_eq!(value.values, vec!["L".to_string()]);
        assert_eq!(value.source_ordinal, 1);
        assert_eq!(counters.get("data", "mapped_value"), 1);
    }

    #[test]
    fn test_range_value_mapping() {
        let mut source = field(1, DataType::Int);
        source.mappings = vec![FieldMapping {
            matching_ordinal: 2,
            value_mappings: Some(vec![ValueMapping {
                this_value: None,
                this_value_range: Some([18, 35]),
                that_value: "young".to_string(),
            }]),
        }];
        let entity = Entity {
            entity_type: 0,
            fields: vec![field(0, DataType::Text), source],
        };

        let mut counters = Counters::new();
        let mapped =
            entity.resolve_mapped_values(&Record::parse("c1,27", ","), &mut counters);
        assert_eq!(mapped.get(&2).unwrap().values, vec!["young".to_string()]);

        let unmapped =
            entity.resolve_mapped_values(&Record::parse("c1,70", ","), &mut counters);
        assert!(unmapped.get(&2).unwrap().is_empty());
    }

    #[test]
    fn test_passthrough_mapping_and_many_to_one() {
        let mut first = field(1, DataType::Categorical);
        first.mappings = vec![FieldMapping {
            matching_ordinal: 4,
            value_mappings: None,
        }];
        let mut second = field(2, DataType::Categorical);
        second.mappings = vec![FieldMapping {
            matching_ordinal: 4,
            value_mappings: None,
        }];
        let entity = Entity {
            entity_type: 0,
            fields: vec![field(0, DataType::Text), first, second],
        };

        let mut counters = Counters::new();
        let mapped =
            entity.resolve_mapped_values(&Record::parse("c1,red,blue", ","), &mut counters);
        let value = mapped.get(&4).unwrap();
        assert_eq!(value.values, vec!["red".to_string(), "blue".to_string()]);
        // the first contributing field owns the entry
        assert_eq!(value.source_ordinal, 1);
    }

    #[test]
    fn test_disabled_mapping_ignored() {
        let mut source = field(1, DataType::Categorical);
        source.mappings = vec![FieldMapping {
            matching_ordinal: -1,
            value_mappings: None,
        }];
        let entity = Entity {
            entity_type: 0,
            fields: vec![source],
        };
        let mut counters = Counters::new();
        let mapped = entity.resolve_mapped_values(&Record::parse("red", ","), &mut counters);
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_mapped_value_average() {
        let value = MappedValue {
            values: vec!["2".to_string(), "4".to_string()],
            source_ordinal: 0,
        };
        assert_eq!(value.average(), Some(3.0));

        let empty = MappedValue {
            values: Vec::new(),
            source_ordinal: 0,
        };
        assert_eq!(empty.average(), None);
    }
}
