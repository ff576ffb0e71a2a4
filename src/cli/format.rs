use std::fmt::Write as _;

use anyhow::Result;

use crate::models::{SearchResponse, SeedSummary};

/// Render a `SearchResponse` in human-readable text form.
///
/// One completed word per line, followed by a footer:
/// `Found N results in X.XXms`. A `(truncated)` marker is appended to the
/// footer when the engine's bound cut the result short.
pub fn render_text(response: &SearchResponse) -> String {
    let mut out = String::new();

    for word in &response.result {
        let _ = writeln!(out, "{word}");
    }

    let _ = write!(
        out,
        "Found {} results in {:.2}ms",
        response.result.len(),
        response.duration
    );
    if response.truncated {
        out.push_str(" (truncated)");
    }
    out.push('\n');

    out
}

pub fn print_text(response: &SearchResponse) -> Result<()> {
    print!("{}", render_text(response));
    Ok(())
}

/// Render a `SeedSummary` as a single line.
pub fn render_seed_summary(summary: &SeedSummary) -> String {
    let mut line = format!(
        "Seeded {} engine with {} words ({} entries) at {}",
        summary.engine,
        summary.words,
        summary.entries,
        summary.path.display()
    );
    if let Some(created) = &summary.created_at {
        let _ = write!(line, " [{created}]");
    }
    line
}

pub fn print_seed_summaries(summaries: &[SeedSummary]) -> Result<()> {
    for summary in summaries {
        println!("{}", render_seed_summary(summary));
    }
    Ok(())
}
