pub mod types;

pub use types::RunSummary;

use colored::Colorize;
use std::path::Path;
use tracing::instrument;

/// Print the one-line summary of a finished pass to stdout.
#[instrument(skip_all, fields(issues = summary.issues, comments = summary.comments))]
pub fn print_summary(summary: &RunSummary, root: &Path) {
    println!("{}", format_summary(summary, root));
}

fn format_summary(summary: &RunSummary, root: &Path) -> String {
    format!(
        "{} {} and {} into {} ({} {}, {} {}, {:.1}s)",
        "Mirrored".green().bold(),
        plural(summary.issues, "issue"),
        plural(summary.comments, "comment"),
        root.display().to_string().bold(),
        summary.issue_pages,
        if summary.issue_pages == 1 { "issue page" } else { "issue pages" },
        summary.comment_pages,
        if summary.comment_pages == 1 { "comment page" } else { "comment pages" },
        summary.elapsed.as_secs_f64(),
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
