use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use corpus_metrics::report::{
    aggregate_reports, compute_case_report, CaseFailure, CaseReport, EvalCase, Meta, Report,
    REPORT_SCHEMA_VERSION,
};
use corpus_metrics::{logging, AggregationMode, MetricsConfig, Scorer, ScorerBuilder};
use indicatif::{ProgressBar, ProgressStyle};

#[path = "corpus_report/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "corpus_report/text_report_formatter.rs"]
mod text_report_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AggregationChoice {
    Pooled,
    Mean,
}

impl AggregationChoice {
    fn mode(self) -> AggregationMode {
        match self {
            Self::Pooled => AggregationMode::Pooled,
            Self::Mean => AggregationMode::MeanOfExamples,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "corpus_report")]
#[command(about = "Score hypothesis/reference and retrieval cases and report corpus metrics")]
struct Args {
    #[arg(
        long,
        env = "CORPUS_METRICS_CASES",
        default_value = "test-data/reference_cases.jsonl"
    )]
    cases: PathBuf,
    /// JSON `MetricsConfig`; missing fields take their defaults.
    #[arg(long, env = "CORPUS_METRICS_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "CORPUS_METRICS_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "CORPUS_METRICS_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "CORPUS_METRICS_OFFSET", default_value_t = 0)]
    offset: usize,
    /// Overrides `aggregation` from the config file; picks each summary's headline value.
    #[arg(long, env = "CORPUS_METRICS_AGGREGATION", value_enum)]
    aggregation: Option<AggregationChoice>,
    #[arg(long, env = "CORPUS_METRICS_CASE_INSENSITIVE", default_value_t = false)]
    case_insensitive: bool,
    #[arg(
        long,
        env = "CORPUS_METRICS_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        tracing::error!(error = %err, "corpus_report failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cases_path = resolve_path(&repo_root, &args.cases);

    let mut config = match args.config.as_ref() {
        Some(path) => MetricsConfig::load(&resolve_path(&repo_root, path))
            .map_err(|err| format!("Failed to load metrics config: {err}"))?,
        None => MetricsConfig::default(),
    };
    if let Some(choice) = args.aggregation {
        config.aggregation = choice.mode();
    }
    if args.case_insensitive {
        config.case_sensitive = false;
    }

    let mut cases = load_cases(&cases_path)?;
    if args.offset > 0 {
        cases = cases.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        cases.truncate(limit);
    }
    if cases.is_empty() {
        return Err("No cases selected after applying offset/limit.".to_string());
    }

    let scorer = build_scorer(config)?;
    let started = Instant::now();
    let (case_reports, failures) = score_cases(&scorer, &cases);
    tracing::info!(
        scored = case_reports.len(),
        failed = failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scoring finished"
    );

    let aggregates = aggregate_reports(&case_reports, scorer.config());
    let report = Report {
        schema_version: REPORT_SCHEMA_VERSION,
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            cases_path: cases_path.to_string_lossy().into_owned(),
            config: scorer.config().clone(),
            case_count: cases.len(),
        },
        cases: case_reports,
        failures,
        aggregates,
    };

    match args.output_format {
        OutputFormat::Json => {
            let out_path = resolve_out_path(&repo_root, args.out.as_ref());
            json_report_formatter::write_report(&out_path, &report)?;
            println!("{}", out_path.display());
        }
        OutputFormat::Text => {
            let out_path = args.out.as_ref().map(|path| resolve_path(&repo_root, path));
            text_report_formatter::write_summary(out_path.as_deref(), &report)?;
            if let Some(path) = out_path {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn build_scorer(config: MetricsConfig) -> Result<Scorer, String> {
    ScorerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build Scorer: {err}"))
}

fn score_cases(scorer: &Scorer, cases: &[EvalCase]) -> (Vec<CaseReport>, Vec<CaseFailure>) {
    let progress = ProgressBar::new(cases.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let mut reports = Vec::with_capacity(cases.len());
    let mut failures = Vec::new();
    for case in cases {
        progress.set_message(case.id.clone());
        match compute_case_report(scorer, case) {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::warn!(case = %case.id, error = %err, "case skipped");
                failures.push(CaseFailure {
                    id: case.id.clone(),
                    error: err.to_string(),
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");
    (reports, failures)
}

fn load_cases(path: &Path) -> Result<Vec<EvalCase>, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read cases file '{}': {err}", path.display()))?;
    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<EvalCase>(line).map_err(|err| {
                format!("{}:{}: invalid case line: {err}", path.display(), idx + 1)
            })
        })
        .collect()
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("corpus_reports")
        .join(format!("corpus-report-{run_id}.json"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}
