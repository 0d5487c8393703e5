//! Rendering helpers for change logs: the scrolling log, markdown and JSON.

use anyhow::Context;
use pbifix_types::{ChangeEntry, ChangeLog, ChangeSummary};

/// One line of the scrolling log.
pub fn render_log_line(entry: &ChangeEntry) -> String {
    format!(
        "[{}] {} ({}): {}",
        entry.status.label(),
        entry.title,
        entry.layer.label(),
        entry.detail
    )
}

pub fn render_summary_line(summary: &ChangeSummary) -> String {
    format!(
        "{} fixers: {} applied, {} unchanged, {} would change, {} clean, {} stale, {} failed",
        summary.total,
        summary.applied,
        summary.unchanged,
        summary.would_change,
        summary.clean,
        summary.stale,
        summary.failed
    )
}

/// The terminal log: one line per entry, optional diff previews, then the summary.
pub fn render_change_log_text(log: &ChangeLog, show_diff: bool) -> String {
    let mut out = String::new();
    for entry in log.entries() {
        out.push_str(&render_log_line(entry));
        out.push('\n');
        if show_diff {
            if let Some(preview) = entry.scan.as_ref().and_then(|s| s.preview.as_deref()) {
                for line in preview.lines() {
                    out.push_str(&format!("    {line}\n"));
                }
            }
        }
    }
    out.push_str(&render_summary_line(&log.summary()));
    out.push('\n');
    out
}

pub fn render_change_log_md(log: &ChangeLog, show_diff: bool) -> String {
    let mut out = String::new();
    out.push_str("# pbifix change log\n\n");
    out.push_str(&format!("- Mode: {}\n", log.mode.label()));
    out.push_str(&format!(
        "- Target: `{}/{}`",
        log.target.workspace, log.target.report
    ));
    if let Some(page) = &log.target.page {
        out.push_str(&format!(" page `{page}`"));
    }
    out.push('\n');
    if let Some(dataset) = &log.target.dataset {
        out.push_str(&format!("- Semantic model: `{dataset}`\n"));
    }
    let s = log.summary();
    out.push_str(&format!(
        "- Applied: {}\n- Unchanged: {}\n- Would change: {}\n- Clean: {}\n- Stale: {}\n- Failed: {}\n\n",
        s.applied, s.unchanged, s.would_change, s.clean, s.stale, s.failed
    ));

    out.push_str("## Fixers\n\n");
    if log.is_empty() {
        out.push_str("_No fixers ran._\n");
        return out;
    }

    for (i, e) in log.entries().iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, e.title));
        out.push_str(&format!("- Key: `{}`\n", e.fixer));
        out.push_str(&format!("- Layer: {}\n", e.layer.label()));
        out.push_str(&format!("- Status: `{}`\n", e.status.label()));
        out.push_str(&format!("- Detail: {}\n", e.detail));

        if let Some(scan) = &e.scan {
            if scan.detail != e.detail {
                out.push_str(&format!("- Scan: {}\n", scan.detail));
            }
            if !scan.targets.is_empty() {
                out.push_str("\n**Targets**\n\n");
                for t in &scan.targets {
                    out.push_str(&format!("- `{t}`\n"));
                }
            }
            if show_diff {
                if let Some(preview) = &scan.preview {
                    out.push_str("\n```diff\n");
                    out.push_str(preview);
                    if !preview.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str("```\n");
                }
            }
        }
        out.push('\n');
    }

    out
}

pub fn render_change_log_json(log: &ChangeLog) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(log).context("serialize change log")?;
    out.push('\n');
    Ok(out)
}
