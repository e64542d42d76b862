use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use corpus_metrics::report::{MetricSummary, OutlierEntry, Report};

const TEXT_OUTLIER_LIMIT: usize = 5;

pub fn write_summary(path: Option<&Path>, report: &Report) -> Result<(), String> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|err| {
                    format!(
                        "Failed to create summary output directory '{}': {err}",
                        parent.display()
                    )
                })?;
            }
            let file = File::create(path).map_err(|err| {
                format!("Failed to create summary file '{}': {err}", path.display())
            })?;
            let mut writer = BufWriter::new(file);
            render(&mut writer, report)
                .and_then(|()| writer.flush())
                .map_err(|err| format!("Failed to write summary '{}': {err}", path.display()))
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            render(&mut handle, report).map_err(|err| format!("Failed to write summary: {err}"))
        }
    }
}

fn render(out: &mut impl Write, report: &Report) -> io::Result<()> {
    let counts = &report.aggregates.counts;
    writeln!(out, "corpus report ({})", report.meta.generated_at)?;
    writeln!(out, "cases: {}", report.meta.cases_path)?;
    writeln!(
        out,
        "scored {} case(s), {} failed; ter={} wil={} retrieval={}",
        counts.total,
        report.failures.len(),
        counts.ter_cases,
        counts.wil_cases,
        counts.retrieval_cases
    )?;
    if counts.undefined_ter > 0 || counts.empty_queries > 0 || counts.unconverged > 0 {
        writeln!(
            out,
            "degenerate: undefined_ter={} empty_queries={} shift_cap_reached={}",
            counts.undefined_ter, counts.empty_queries, counts.unconverged
        )?;
    }
    writeln!(out)?;

    let mode = report.aggregates.mode.as_str();
    render_metric(out, "TER", mode, report.aggregates.ter.as_ref())?;
    render_metric(out, "WIL", mode, report.aggregates.wil.as_ref())?;
    render_metric(out, "R-Precision", mode, report.aggregates.r_precision.as_ref())?;

    let outliers = &report.aggregates.outliers;
    render_outliers(out, "highest TER", &outliers.worst_ter)?;
    render_outliers(out, "highest WIL", &outliers.worst_wil)?;
    render_outliers(out, "lowest R-Precision", &outliers.worst_r_precision)?;

    for failure in &report.failures {
        writeln!(out, "failed {}: {}", failure.id, failure.error)?;
    }
    Ok(())
}

fn render_metric(
    out: &mut impl Write,
    name: &str,
    mode: &str,
    summary: Option<&MetricSummary>,
) -> io::Result<()> {
    let Some(summary) = summary else {
        return Ok(());
    };
    writeln!(
        out,
        "{name:<12} {} ({mode}) pooled={} mean_of_examples={}",
        format_value(summary.value),
        format_value(summary.pooled),
        format_value(summary.mean_of_examples)
    )?;
    if let Some(dist) = &summary.distribution {
        writeln!(
            out,
            "{:<12} p50={:.4} p90={:.4} p95={:.4} p99={:.4}",
            "", dist.p50, dist.p90, dist.p95, dist.p99
        )?;
    }
    Ok(())
}

fn render_outliers(out: &mut impl Write, label: &str, entries: &[OutlierEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{label}:")?;
    for entry in entries.iter().take(TEXT_OUTLIER_LIMIT) {
        writeln!(out, "  {:.4}  {}", entry.value, entry.id)?;
    }
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| format!("{v:.4}"))
}
