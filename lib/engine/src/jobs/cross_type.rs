//! Schema-driven similarity between two entity types
//!
//! Source records (type 0) and target records (type 1) are fanned into
//! composite bucket slots so that every source bucket meets the full
//! target population. Inside a group the reducer buffers the sources,
//! resolves each one's field mappings once, and streams the targets
//! against the buffer. Scores are scaled distances (0 = identical).

use crate::jobs::{JobOutput, ScoredPair};
use crate::key::{cross_type_fanout, CompositeKey};
use crate::shuffle::run_local;
use ahash::AHashMap;
use pairx_core::{bucket_of, Counters, Error, JobConfig, Record, Result};
use pairx_schema::{
    DataType, Entity, MappedValue, MissingValuePolicy, NumericSelector, TypeSchema,
};
use pairx_similarity::{
    bounds_position_distance, numeric_distance, Accumulator, TextStrategy,
};
use std::cell::RefCell;
use tracing::{debug, info};

/// Pairwise similarity job between two field-mapped entity types.
pub struct CrossTypeSimilarityJob {
    config: JobConfig,
    schema: TypeSchema,
}

impl CrossTypeSimilarityJob {
    pub fn new(config: JobConfig, schema: TypeSchema) -> Result<Self> {
        config.validate()?;
        schema.validate()?;
        if !schema.is_cross_type() {
            return Err(Error::InvalidConfig(
                "cross-type job requires a two-entity schema".into(),
            ));
        }
        Ok(Self { config, schema })
    }

    /// Compare every source record against every target record.
    pub fn run(&self, lines: &[String]) -> Result<JobOutput> {
        let source = self
            .schema
            .entity_by_type(0)
            .ok_or_else(|| Error::Schema("missing source entity".into()))?;
        let target = self
            .schema
            .entity_by_type(1)
            .ok_or_else(|| Error::Schema("missing target entity".into()))?;
        let source_id_ordinal = source.id_ordinal()?;
        let target_id_ordinal = target.id_ordinal()?;
        let delim = self.config.field_delim.as_str();
        let bucket_count = self.config.bucket_count;

        info!(
            records = lines.len(),
            bucket_count,
            source_fields = source.field_count(),
            target_fields = target.field_count(),
            "running cross-type schema similarity"
        );

        let counters = RefCell::new(Counters::new());
        let mut accumulator =
            Accumulator::new(self.schema.distance_algorithm, self.config.distance_scale);
        let text_strategy = TextStrategy::for_schema(&self.schema);
        let mut pairs: Vec<ScoredPair> = Vec::new();

        run_local(
            lines.iter().map(String::as_str),
            self.config.num_reducers,
            |line| {
                let record = Record::parse(line, delim);
                let Some(entity) = self.schema.entity_by_width(record.width()) else {
                    counters.borrow_mut().increment("mapper", "records_skipped");
                    debug!(line, "record matches no entity shape, skipped");
                    return Vec::new();
                };
                let id_ordinal = if entity.entity_type == 0 {
                    source_id_ordinal
                } else {
                    target_id_ordinal
                };
                let id = record.field_or_empty(id_ordinal);
                cross_type_fanout(bucket_of(id, bucket_count), bucket_count, entity.entity_type)
                    .into_iter()
                    .map(|key| (key, line))
                    .collect::<Vec<(CompositeKey, &str)>>()
            },
            |_key, group| {
                let mut counters = counters.borrow_mut();
                let mut sources: Vec<(&str, AHashMap<usize, MappedValue>)> = Vec::new();
                for (key, line) in group {
                    let record = Record::parse(line, delim);
                    if key.is_source() {
                        let mapped = source.resolve_mapped_values(&record, &mut counters);
                        sources.push((record.field_or_empty(source_id_ordinal), mapped));
                        counters.increment("data", "source_count");
                    } else {
                        let target_id = record.field_or_empty(target_id_ordinal);
                        for (source_id, mapped) in &sources {
                            let score = self.pair_distance(
                                source,
                                target,
                                mapped,
                                &record,
                                text_strategy,
                                &mut accumulator,
                                &mut counters,
                            );
                            pairs.push(ScoredPair::new(source_id, target_id, score));
                            counters.increment("data", "similarity_count");
                        }
                        counters.increment("data", "target_count");
                    }
                }
            },
        );

        let counters = counters.into_inner();
        info!(pairs = pairs.len(), "cross-type schema similarity complete");
        Ok(JobOutput { pairs, counters })
    }

    /// Distance between one source (already mapped) and one target.
    ///
    /// Target fields without a resolved mapping are passive and do not
    /// contribute. Missing values on either side follow the schema's
    /// missing value policy.
    #[allow(clippy::too_many_arguments)]
    fn pair_distance(
        &self,
        source: &Entity,
        target: &Entity,
        mapped_fields: &AHashMap<usize, MappedValue>,
        target_record: &Record<'_>,
        text_strategy: TextStrategy,
        accumulator: &mut Accumulator,
        counters: &mut Counters,
    ) -> i64 {
        let policy = self.schema.missing_value_policy;
        accumulator.reset();

        for field in &target.fields {
            if field.id {
                continue;
            }
            let ordinal = field.ordinal;
            let Some(mapped) = mapped_fields.get(&ordinal) else {
                continue;
            };
            let target_value = target_record.field_or_empty(ordinal);

            let distance: Option<f64> = if target_value.is_empty() {
                counters.increment("data", "missing_target");
                match policy {
                    MissingValuePolicy::Skip => None,
                    MissingValuePolicy::Default => Some(match field.data_type {
                        DataType::Categorical | DataType::Text => 1.0,
                        DataType::Int | DataType::Double => match mapped.average() {
                            Some(average) => bounds_position_distance(field.bounds(), average),
                            None => 1.0,
                        },
                    }),
                }
            } else {
                match field.data_type {
                    DataType::Categorical => {
                        if mapped.is_empty() {
                            self.missing_source(policy, counters)
                                .then_some(0.0)
                        } else {
                            Some(
                                mapped
                                    .values
                                    .iter()
                                    .map(|value| {
                                        self.schema.categorical_distance(
                                            ordinal,
                                            value,
                                            target_value,
                                        )
                                    })
                                    .fold(1.0, f64::min),
                            )
                        }
                    }
                    DataType::Text => {
                        if mapped.is_empty() {
                            self.missing_source(policy, counters)
                                .then_some(0.0)
                        } else {
                            Some(
                                mapped
                                    .values
                                    .iter()
                                    .map(|value| text_strategy.distance(value, target_value))
                                    .fold(1.0, f64::min),
                            )
                        }
                    }
                    DataType::Int | DataType::Double => {
                        match parse_numeric(target_value, field.data_type) {
                            None => {
                                counters
                                    .increment("invalid_data", &format!("field_{}", ordinal));
                                None
                            }
                            Some(target_numeric) => match mapped.average() {
                                Some(source_average) => {
                                    let selector = source
                                        .field_at(mapped.source_ordinal)
                                        .map(|f| f.num_dist_function)
                                        .unwrap_or(NumericSelector::EqualSoft);
                                    Some(numeric_distance(
                                        selector,
                                        source_average,
                                        target_numeric,
                                        field.bounds(),
                                        self.schema.numeric_diff_threshold,
                                    ))
                                }
                                None => self
                                    .missing_source(policy, counters)
                                    .then(|| {
                                        bounds_position_distance(field.bounds(), target_numeric)
                                    }),
                            },
                        }
                    }
                }
            };

            if let Some(distance) = distance {
                accumulator.accumulate(distance, field.weight);
            }
        }
        accumulator.similarity()
    }

    /// Count a missing source value; true when the default policy says
    /// the field still contributes.
    fn missing_source(&self, policy: MissingValuePolicy, counters: &mut Counters) -> bool {
        counters.increment("data", "missing_source");
        policy == MissingValuePolicy::Default
    }
}

fn parse_numeric(value: &str, data_type: DataType) -> Option<f64> {
    match data_type {
        DataType::Int => value.parse::<i64>().ok().map(|v| v as f64),
        _ => value.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Products (source, 3 fields) matched against customer profiles
    /// (target, 4 fields).
    fn schema() -> TypeSchema {
        TypeSchema::from_json(
            r#"{
            "entities": [
                {"entity_type": 0, "fields": [
                    {"ordinal": 0, "type": "text", "id": true},
                    {"ordinal": 1, "type": "categorical",
                     "mappings": [{"matching_ordinal": 1, "value_mappings": [
                        {"this_value": "outdoor", "that_value": "sporty"},
                        {"this_value": "formal", "that_value": "classic"}
                     ]}]},
                    {"ordinal": 2, "type": "int", "num_dist_function": "equalSoft",
                     "mappings": [{"matching_ordinal": 2}]}
                ]},
                {"entity_type": 1, "fields": [
                    {"ordinal": 0, "type": "text", "id": true},
                    {"ordinal": 1, "type": "categorical"},
                    {"ordinal": 2, "type": "int", "num_dist_function": "equalSoft",
                     "min": 0.0, "max": 100.0},
                    {"ordinal": 3, "type": "categorical"}
                ]}
            ]
        }"#,
        )
        .unwrap()
    }

    fn config() -> JobConfig {
        JobConfig {
            bucket_count: 5,
            ..JobConfig::default()
        }
    }

    fn lines(records: &[&str]) -> Vec<String> {
        records.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_every_source_meets_every_target() {
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let input = lines(&[
            "prod1,outdoor,40",
            "prod2,formal,80",
            "prod3,outdoor,10",
            "cust1,sporty,35,east",
            "cust2,classic,75,west",
        ]);
        let output = job.run(&input).unwrap();

        // 3 sources x 2 targets
        assert_eq!(output.pairs.len(), 6);
        let unique: std::collections::HashSet<(String, String)> = output
            .pairs
            .iter()
            .map(|p| (p.first_id.clone(), p.second_id.clone()))
            .collect();
        assert_eq!(unique.len(), 6);
        assert_eq!(output.counters.get("data", "similarity_count"), 6);
    }

    #[test]
    fn test_mapped_match_scores_close() {
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let output = job
            .run(&lines(&["prod1,outdoor,35", "cust1,sporty,35,east"]))
            .unwrap();
        // category maps outdoor->sporty (distance 0), ages equal
        assert_eq!(output.pairs.len(), 1);
        assert_eq!(output.pairs[0].score, 0);
    }

    #[test]
    fn test_unmapped_category_is_distant() {
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let output = job
            .run(&lines(&["prod1,formal,35", "cust1,sporty,35,east"]))
            .unwrap();
        // classic vs sporty has no lookup entry: distance 1; age distance 0
        assert_eq!(output.pairs[0].score, 500);
    }

    #[test]
    fn test_numeric_distance_uses_target_bounds() {
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let output = job
            .run(&lines(&["prod1,outdoor,15", "cust1,sporty,35,east"]))
            .unwrap();
        // |15-35| / (100-0) = 0.2; category 0; mean 0.1
        assert_eq!(output.pairs[0].score, 100);
    }

    #[test]
    fn test_missing_target_default_policy() {
        // Scenario: numeric bounds [0,100], source value 30, missing target
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let output = job
            .run(&lines(&["prod1,outdoor,30", "cust1,sporty,,east"]))
            .unwrap();
        // age field: max(upper, lower) = max(0.7, 0.3) = 0.7; category 0
        assert_eq!(output.counters.get("data", "missing_target"), 1);
        assert_eq!(output.pairs[0].score, 350);
    }

    #[test]
    fn test_missing_source_skip_policy() {
        let json = serde_json::to_string(&schema()).unwrap();
        let schema = TypeSchema::from_json(&json.replace(
            "\"missing_value_policy\":\"default\"",
            "\"missing_value_policy\":\"skip\"",
        ))
        .unwrap();
        let job = CrossTypeSimilarityJob::new(config(), schema).unwrap();
        // "indoor" resolves to no mapped category value
        let output = job
            .run(&lines(&["prod1,indoor,35", "cust1,sporty,35,east"]))
            .unwrap();
        assert_eq!(output.counters.get("data", "missing_source"), 1);
        // only the age field contributes
        assert_eq!(output.pairs[0].score, 0);
    }

    #[test]
    fn test_unrecognized_width_skipped() {
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let output = job
            .run(&lines(&["prod1,outdoor,35", "too,few", "cust1,sporty,35,east"]))
            .unwrap();
        assert_eq!(output.counters.get("mapper", "records_skipped"), 1);
        assert_eq!(output.pairs.len(), 1);
    }

    #[test]
    fn test_same_type_schema_rejected() {
        let schema = TypeSchema::from_json(
            r#"{"entities": [{"entity_type": 0, "fields": [
                {"ordinal": 0, "type": "text", "id": true}
            ]}]}"#,
        )
        .unwrap();
        assert!(CrossTypeSimilarityJob::new(config(), schema).is_err());
    }

    #[test]
    fn test_passive_target_fields_ignored() {
        // ordinal 3 (region) has no mapping and never contributes
        let job = CrossTypeSimilarityJob::new(config(), schema()).unwrap();
        let a = job
            .run(&lines(&["prod1,outdoor,35", "cust1,sporty,35,east"]))
            .unwrap();
        let b = job
            .run(&lines(&["prod1,outdoor,35", "cust1,sporty,35,west"]))
            .unwrap();
        assert_eq!(a.pairs[0].score, b.pairs[0].score);
    }
}
