//! Schema-driven similarity between records of one entity type
//!
//! The mapper fans each record into its bucket-pair groups; the reducer
//! walks the entity's fields for every local pair and folds per-field
//! distances through the schema's accumulator. Output scores are scaled
//! distances (0 = identical).

use crate::jobs::{JobOutput, ScoredPair};
use crate::key::{same_type_fanout, PairKey};
use crate::shuffle::run_local;
use pairx_core::{pair_bucket, Counters, Error, JobConfig, Record, Result};
use pairx_schema::{DataType, Field, MissingValuePolicy, TypeSchema};
use pairx_similarity::{measured_pair, numeric_distance, Accumulator, TextStrategy};
use std::cell::RefCell;
use tracing::{debug, info};

/// Pairwise similarity job over one schema-described entity.
pub struct SameTypeSimilarityJob {
    config: JobConfig,
    schema: TypeSchema,
}

impl SameTypeSimilarityJob {
    pub fn new(config: JobConfig, schema: TypeSchema) -> Result<Self> {
        config.validate()?;
        schema.validate()?;
        if schema.is_cross_type() {
            return Err(Error::InvalidConfig(
                "same-type job requires a single-entity schema".into(),
            ));
        }
        Ok(Self { config, schema })
    }

    /// Compare every unordered pair of well-formed records exactly once.
    pub fn run(&self, lines: &[String]) -> Result<JobOutput> {
        let entity = self.schema.entity();
        let id_ordinal = entity.id_ordinal()?;
        let width = entity.field_count();
        let delim = self.config.field_delim.as_str();
        let bucket_count = self.config.bucket_count;
        let multiplier = self.config.hash_pair_multiplier;
        let partitioning_ordinal = self.schema.partitioning_ordinal;

        info!(
            records = lines.len(),
            bucket_count,
            fields = width,
            "running same-type schema similarity"
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
                if record.width() != width {
                    counters.borrow_mut().increment("mapper", "records_skipped");
                    debug!(line, expected = width, "record width mismatch, skipped");
                    return Vec::new();
                }
                let id = record.field_or_empty(id_ordinal);
                let partition = partitioning_ordinal.map(|ord| record.field_or_empty(ord));
                same_type_fanout(
                    pair_bucket(id, bucket_count),
                    bucket_count,
                    multiplier,
                    partition,
                )
                .into_iter()
                .map(|key| (key, line))
                .collect::<Vec<(PairKey, &str)>>()
            },
            |key, group| {
                let mut counters = counters.borrow_mut();
                if key.is_diagonal(multiplier as u64) {
                    counters.increment("reducer", "same_bucket_groups");
                    let records: Vec<Record<'_>> =
                        group.iter().map(|(_, line)| Record::parse(line, delim)).collect();
                    for i in 0..records.len() {
                        for j in (i + 1)..records.len() {
                            let first_id = records[i].field_or_empty(id_ordinal);
                            let second_id = records[j].field_or_empty(id_ordinal);
                            if first_id == second_id {
                                counters.increment("reducer", "same_id");
                                continue;
                            }
                            let score = self.record_distance(
                                &records[i],
                                &records[j],
                                text_strategy,
                                &mut accumulator,
                                &mut counters,
                            );
                            pairs.push(ScoredPair::new(first_id, second_id, score));
                            counters.increment("reducer", "emitted_pairs");
                        }
                    }
                } else {
                    counters.increment("reducer", "different_bucket_groups");
                    let mut side_zero: Vec<Record<'_>> = Vec::new();
                    for (key, line) in group {
                        let record = Record::parse(line, delim);
                        if key.side == 0 {
                            side_zero.push(record);
                        } else {
                            let second_id = record.field_or_empty(id_ordinal);
                            for first in &side_zero {
                                let first_id = first.field_or_empty(id_ordinal);
                                let score = self.record_distance(
                                    first,
                                    &record,
                                    text_strategy,
                                    &mut accumulator,
                                    &mut counters,
                                );
                                pairs.push(ScoredPair::new(first_id, second_id, score));
                                counters.increment("reducer", "emitted_pairs");
                            }
                        }
                    }
                }
            },
        );

        let counters = counters.into_inner();
        info!(pairs = pairs.len(), "same-type schema similarity complete");
        Ok(JobOutput { pairs, counters })
    }

    /// Weighted distance over every comparable field of the entity.
    fn record_distance(
        &self,
        first: &Record<'_>,
        second: &Record<'_>,
        text_strategy: TextStrategy,
        accumulator: &mut Accumulator,
        counters: &mut Counters,
    ) -> i64 {
        accumulator.reset();
        for field in &self.schema.entity().fields {
            if field.id || Some(field.ordinal) == self.schema.partitioning_ordinal {
                continue;
            }
            let first_attr = first.field_or_empty(field.ordinal);
            let second_attr = second.field_or_empty(field.ordinal);

            if first_attr.is_empty() || second_attr.is_empty() {
                counters.increment("missing_data", &format!("field_{}", field.ordinal));
                if self.schema.missing_value_policy == MissingValuePolicy::Default {
                    accumulator.accumulate(1.0, field.weight);
                }
                continue;
            }

            let distance = match field.data_type {
                DataType::Categorical => {
                    self.schema
                        .categorical_distance(field.ordinal, first_attr, second_attr)
                }
                DataType::Int | DataType::Double => {
                    match self.numeric_field_distance(field, first_attr, second_attr) {
                        Some(distance) => distance,
                        None => {
                            counters
                                .increment("invalid_data", &format!("field_{}", field.ordinal));
                            continue;
                        }
                    }
                }
                DataType::Text => text_strategy.distance(first_attr, second_attr),
            };
            accumulator.accumulate(distance, field.weight);
        }
        accumulator.similarity()
    }

    fn numeric_field_distance(
        &self,
        field: &Field,
        first_attr: &str,
        second_attr: &str,
    ) -> Option<f64> {
        let (first_raw, second_raw) =
            measured_pair(first_attr, second_attr, field.unit.as_deref())?;
        let first = parse_numeric(first_raw, field.data_type)?;
        let second = parse_numeric(second_raw, field.data_type)?;
        Some(numeric_distance(
            field.num_dist_function,
            first,
            second,
            field.bounds(),
            self.schema.numeric_diff_threshold,
        ))
    }
}

fn parse_numeric(value: &str, data_type: DataType) -> Option<f64> {
    match data_type {
        DataType::Int => value.parse::<i64>().ok().map(|v| v as f64),
        _ => value.parse::<f64>().ok(),
    }
}
