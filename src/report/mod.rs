//! Presentation: formatted terminal output for submissions, dashboards and errors.
//!
//! We keep formatting code in one place so:
//! - the engine and orchestrator return structured values only
//! - output changes are localized

use crate::app::pipeline::Submission;
use crate::domain::{FitParams, FitRecord, QuadraticFit, Samples, UserId};
use crate::error::OrchestratorError;

/// `a, b, c` using shortest round-trip float formatting.
pub fn format_params(params: &FitParams) -> String {
    format!("{}, {}, {}", params.a, params.b, params.c)
}

/// Success message for a stored fit.
pub fn format_submission(submission: &Submission) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Curve fitting successful! Parameters: {}\n",
        format_params(&submission.fit.params())
    ));
    out.push_str(&format!(
        "Saved as record #{} ({})\n",
        submission.record_id, submission.dataset_name
    ));
    out.push_str(&format_diagnostics(&submission.fit));
    out
}

/// Fit summary without a stored record (dry runs).
pub fn format_preview(fit: &QuadraticFit) -> String {
    let mut out = format!("Parameters: {}\n", format_params(&fit.params()));
    out.push_str(&format_diagnostics(fit));
    out
}

fn format_diagnostics(fit: &QuadraticFit) -> String {
    if fit.iterations > 0 {
        format!(
            "Solver: {} ({} iterations) | RSS={:.6e}\n",
            fit.solver.display_name(),
            fit.iterations,
            fit.rss
        )
    } else {
        format!("Solver: {} | RSS={:.6e}\n", fit.solver.display_name(), fit.rss)
    }
}

/// User-facing error line.
pub fn format_error(err: &OrchestratorError) -> String {
    format!("Error during curve fitting: {}: {}", err.kind, err.message)
}

/// Dashboard table of an owner's records.
pub fn format_dashboard(owner: &UserId, records: &[FitRecord]) -> String {
    let mut out = format!("Fits for {owner}: {}\n", records.len());
    if records.is_empty() {
        return out;
    }

    out.push_str(
        format!(
            "{:>6} {:<20} {:<24} {:>14} {:>14} {:>14}\n",
            "id", "created", "dataset", "a", "b", "c"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:->6} {:-<20} {:-<24} {:->14} {:->14} {:->14}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in records {
        let created = r.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let line = match r.fit_params() {
            Ok(p) => format!(
                "{:>6} {:<20} {:<24} {:>14.6} {:>14.6} {:>14.6}",
                r.id.0,
                created,
                truncate(&r.dataset_name, 24),
                p.a,
                p.b,
                p.c
            ),
            Err(_) => format!(
                "{:>6} {:<20} {:<24} {}",
                r.id.0,
                created,
                truncate(&r.dataset_name, 24),
                r.params
            ),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Detail view of a single record.
pub fn format_record(record: &FitRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Record #{}: {}\n", record.id, record.dataset_name));
    out.push_str(&format!("Owner: {}\n", record.owner));
    out.push_str(&format!("Created: {}\n", record.created_at.to_rfc3339()));
    match record.fit_params() {
        Ok(p) => {
            out.push_str(&format!("Parameters: {}\n", format_params(&p)));
            out.push_str(&format!("f(x) = {}·x² + {}·x + {}\n", p.a, p.b, p.c));
        }
        Err(e) => out.push_str(&format!("Parameters (unreadable: {e}): {}\n", record.params)),
    }
    out
}

/// Two comma-separated lines (x then y), ready to paste into `fit --x/--y`.
pub fn format_samples(samples: &Samples) -> String {
    format!("{}\n{}\n", join(&samples.x), join(&samples.y))
}

fn join(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
