//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a crawl run,
//! including totals, the incoming-link distribution, orphaned articles,
//! failed pages and a per-article table.

use crate::report::{IncomingBucket, OutputError, OutputResult, RunSummary};
use std::fs;
use std::path::Path;

/// Generates a markdown summary and writes it to disk
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    fs::write(output_path, markdown)
        .map_err(|e| OutputError::Write(format!("{}: {}", output_path.display(), e)))?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let run = &summary.run;
    let report = &summary.report;
    let mut md = String::new();

    md.push_str("# Link-Matrix Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", run.id));
    md.push_str(&format!("- **Started**: {}\n", run.started_at));
    if let Some(finished) = &run.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = run.duration_seconds() {
        md.push_str(&format!("- **Duration**: {} seconds\n", duration));
    }
    md.push_str(&format!("- **Status**: {}\n", run.status.to_db_string()));
    md.push_str(&format!("- **Config Hash**: {}\n\n", run.config_hash));

    // Totals
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Articles**: {}\n", report.rows().len()));
    md.push_str(&format!(
        "- **Pages Crawled**: {} / {}\n",
        run.crawled_count.unwrap_or(0),
        run.total_count
    ));
    md.push_str(&format!("- **Links Extracted**: {}\n", summary.total_links));
    md.push_str(&format!(
        "- **Article-to-Article Links**: {}\n",
        report.edge_count()
    ));
    md.push_str(&format!("- **Failed Pages**: {}\n\n", summary.errors.len()));

    // Distribution
    md.push_str("## Incoming Link Distribution\n\n");
    md.push_str("| Incoming | Articles |\n");
    md.push_str("|----------|----------|\n");
    for bucket in IncomingBucket::ALL {
        md.push_str(&format!(
            "| {} | {} |\n",
            bucket.range(),
            report.bucket_count(bucket)
        ));
    }
    md.push('\n');

    let orphans = report.orphans();
    if !orphans.is_empty() {
        md.push_str("## Orphaned Articles\n\n");
        for row in orphans {
            md.push_str(&format!("- [{}]({})\n", row.label, row.url));
        }
        md.push('\n');
    }

    if !summary.errors.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for error in &summary.errors {
            md.push_str(&format!(
                "| {} | {} |\n",
                table_cell(&error.url),
                table_cell(&error.error)
            ));
        }
        md.push('\n');
    }

    if !report.rows().is_empty() {
        md.push_str("## Articles\n\n");
        md.push_str("| Article | Genre | Incoming | Outgoing |\n");
        md.push_str("|---------|-------|----------|----------|\n");
        for row in report.rows() {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                table_cell(&row.label),
                table_cell(row.genre.as_deref().unwrap_or("-")),
                row.incoming,
                row.outgoing
            ));
        }
        md.push('\n');
    }

    md
}

/// Escapes text for a single markdown table cell
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
