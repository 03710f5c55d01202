use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};

use crate::codec::decode_manifest;
use crate::config::CorpusConfig;
use crate::constants::files::MANIFEST_FILE;
use crate::coverage::{compare_pub_counts, coverage_rate};
use crate::errors::CorpusError;
use crate::pipeline::{CorpusBuild, CorpusPipeline, VolumeOutcome};
use crate::transport::fs::read_table;

#[derive(Debug, Parser)]
#[command(
    name = "build_corpus",
    disable_help_subcommand = true,
    about = "Build the combined page and issue corpus",
    long_about = "Merge extracted page tokens with curated issue annotations per volume, cut each volume to its issue boundaries, and write the combined page and issue tables.",
    after_help = "Existing output tables are reused as caches; delete a table to recompute it."
)]
/// CLI for `build_corpus`.
///
/// Common usage:
/// - Full build: `--annotations annotations.csv --volumes tokens/ --output corpus/`
/// - Rebuild from cached merged volumes only: `--from-cache --output corpus/`
/// - Print term coverage after the build: `--terms nasser,bandung`
struct BuildCorpusCli {
    #[arg(
        long,
        value_name = "CSV",
        required_unless_present = "from_cache",
        help = "Curated annotation table, one row per physical page"
    )]
    annotations: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        required_unless_present = "from_cache",
        help = "Directory with one token table per volume plus a volumes.csv manifest"
    )]
    volumes: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        default_value = "corpus_output",
        help = "Directory for merged volume tables and the corpus/issue tables"
    )]
    output: PathBuf,
    #[arg(long, value_name = "JSON", help = "Optional JSON build configuration")]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "TERM,TERM",
        value_delimiter = ',',
        help = "Terms to report coverage for after the build"
    )]
    terms: Vec<String>,
    #[arg(long, help = "Process volumes one at a time instead of in parallel")]
    sequential: bool,
    #[arg(
        long = "from-cache",
        conflicts_with_all = ["annotations", "volumes"],
        help = "Assemble from previously merged volume tables only"
    )]
    from_cache: bool,
}

/// Run the `build_corpus` CLI with the given arguments (program name excluded).
pub fn run_build_corpus<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let Some(cli) = parse_cli::<BuildCorpusCli, _>(
        std::iter::once("build_corpus".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => CorpusConfig::from_json_path(path)?,
        None => CorpusConfig::default(),
    };
    if cli.sequential {
        config = config.with_parallel(false);
    }
    let pipeline = CorpusPipeline::new(config, &cli.output);

    let build = if cli.from_cache {
        pipeline.assemble_from_cache()?
    } else {
        let annotations_path = cli
            .annotations
            .as_deref()
            .ok_or_else(|| CorpusError::Configuration("--annotations is required".into()))?;
        let volumes_dir = cli
            .volumes
            .as_deref()
            .ok_or_else(|| CorpusError::Configuration("--volumes is required".into()))?;
        let annotations = pipeline.load_annotations(annotations_path)?;
        let jobs = decode_manifest(read_table(&volumes_dir.join(MANIFEST_FILE))?, volumes_dir)?;
        pipeline.run(&annotations, &jobs)?
    };

    print_summary(&pipeline, &build);
    if !cli.terms.is_empty() {
        print_coverage(&build, &cli.terms);
    }
    Ok(())
}

fn print_summary(pipeline: &CorpusPipeline, build: &CorpusBuild) {
    println!("=== volumes ===");
    if build.report.corpus_cached {
        println!("corpus table reused from {}", pipeline.corpus_path().display());
    }
    for outcome in &build.report.volumes {
        match outcome {
            VolumeOutcome::Completed {
                volume,
                cached,
                merged_pages,
                retained_pages,
                conflicts,
            } => println!(
                "{:<32} kept {:>5} of {:>5} pages  conflicts {:>3}{}",
                volume,
                retained_pages,
                merged_pages,
                conflicts,
                if *cached { "  (cached)" } else { "" }
            ),
            VolumeOutcome::Failed { volume, error } => {
                println!("{:<32} FAILED: {}", volume, error)
            }
        }
    }
    println!();
    println!("=== corpus ===");
    println!("pages  : {}", build.corpus.len());
    println!(
        "issues : {}{}",
        build.issues.len(),
        if build.report.issues_cached { " (cached)" } else { "" }
    );
    println!("failed : {}", build.report.failures().count());
}

fn print_coverage(build: &CorpusBuild, terms: &[String]) {
    println!();
    println!("=== term coverage ===");
    for row in compare_pub_counts(&build.corpus, terms) {
        println!(
            "{:<16} {:<28} {}  terms {:>6}  page words {:>8} / {:>8}",
            row.term,
            row.magazine_title,
            row.datetime,
            row.term_counts,
            row.page_counts,
            row.total_counts
        );
    }
    println!();
    println!("=== coverage rate ({}) ===", terms.join(", "));
    for rate in coverage_rate(&build.corpus, terms) {
        println!(
            "{}  {:>8} / {:>8}  {:>6.2}%",
            rate.datetime,
            rate.term_counts,
            rate.total_counts,
            rate.rate * 100.0
        );
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
