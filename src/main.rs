use anyhow::Context;
use clap::{Parser, ValueEnum};
use pairx::prelude::*;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// A schema-driven pairwise similarity engine
#[derive(Parser, Debug)]
#[command(name = "pairx")]
#[command(about = "Pairwise entity similarity with bucket-pair sharding", long_about = None)]
struct Args {
    /// Similarity job to run
    #[arg(long, value_enum)]
    job: JobKind,

    /// Input records, one delimited line per record
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for id1/id2/score lines
    #[arg(short, long)]
    output: PathBuf,

    /// Schema document (schema-driven jobs)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Number of hash buckets
    #[arg(long, default_value_t = 1000)]
    bucket_count: u32,

    /// Field delimiter
    #[arg(long, default_value = ",")]
    field_delim: String,

    /// Scale of the integer similarity output
    #[arg(long, default_value_t = 1000)]
    distance_scale: i64,

    /// Reduce-side parallelism
    #[arg(long, default_value_t = 1)]
    num_reducers: usize,

    /// Attribute measure for the dynamic job
    #[arg(long, value_enum, default_value = "cosine")]
    algorithm: DynamicMeasure,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum JobKind {
    /// Same-type similarity over dynamic attribute sets
    Dynamic,
    /// Same-type schema-driven similarity
    SameType,
    /// Cross-type schema-driven similarity
    CrossType,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DynamicMeasure {
    Cosine,
    Jaccard,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PairX v{}", env!("CARGO_PKG_VERSION"));

    let config = JobConfig {
        bucket_count: args.bucket_count,
        field_delim: args.field_delim.clone(),
        distance_scale: args.distance_scale,
        num_reducers: args.num_reducers,
        ..JobConfig::default()
    };

    let lines: Vec<String> = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading input {:?}", args.input))?
        .lines()
        .map(str::to_string)
        .collect();
    info!("Read {} records from {:?}", lines.len(), args.input);

    let output = match args.job {
        JobKind::Dynamic => {
            let algorithm = match args.algorithm {
                DynamicMeasure::Cosine => DynamicAlgorithm::Cosine,
                DynamicMeasure::Jaccard => DynamicAlgorithm::Jaccard {
                    src_non_matching_weight: 1.0,
                    trg_non_matching_weight: 1.0,
                },
            };
            DynamicSimilarityJob::new(config, algorithm)?.run(&lines)?
        }
        JobKind::SameType => {
            let schema = load_schema(args.schema.as_deref())?;
            SameTypeSimilarityJob::new(config, schema)?.run(&lines)?
        }
        JobKind::CrossType => {
            let schema = load_schema(args.schema.as_deref())?;
            CrossTypeSimilarityJob::new(config, schema)?.run(&lines)?
        }
    };

    output.counters.report();

    let rendered = output.lines(&args.field_delim).join("\n");
    std::fs::write(&args.output, rendered + "\n")
        .with_context(|| format!("writing output {:?}", args.output))?;
    info!("Wrote {} pairs to {:?}", output.pairs.len(), args.output);

    Ok(())
}

fn load_schema(path: Option<&std::path::Path>) -> anyhow::Result<TypeSchema> {
    let path = path.context("schema-driven jobs require --schema")?;
    TypeSchema::load(path).with_context(|| format!("loading schema {:?}", path))
}
