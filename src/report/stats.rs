//! Console statistics for a stored run

use crate::report::{IncomingBucket, RunSummary};

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The run summary to display
pub fn print_statistics(summary: &RunSummary) {
    let run = &summary.run;
    let report = &summary.report;

    println!("=== Link Statistics ===\n");

    println!("Run:");
    println!("  ID: {}", run.id);
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Status: {}", run.status.to_db_string());
    println!();

    println!("Overview:");
    println!("  Articles: {}", report.rows().len());
    println!(
        "  Pages crawled: {} / {}",
        run.crawled_count.unwrap_or(0),
        run.total_count
    );
    println!("  Links extracted: {}", summary.total_links);
    println!("  Article-to-article links: {}", report.edge_count());
    println!("  Failed pages: {}", summary.errors.len());
    println!();

    println!("Incoming Links:");
    let total = report.rows().len();
    for bucket in IncomingBucket::ALL {
        let count = report.bucket_count(bucket);
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!(
            "  {:<9} ({:>4}): {} ({:.1}%)",
            bucket.to_string(),
            bucket.range(),
            count,
            percentage
        );
    }
    println!();

    if !summary.errors.is_empty() {
        println!("Failed Pages ({}):", summary.errors.len());
        for error in &summary.errors {
            println!("  - {}: {}", error.url, error.error);
        }
        println!();
    }
}
