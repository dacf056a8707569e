//! The `sealexam review` command.

use std::path::PathBuf;

use anyhow::Result;

use sealexam_core::report::SessionReport;
use sealexam_report::html::write_html_report;

pub fn execute(report_path: PathBuf, html: Option<PathBuf>, format: String) -> Result<()> {
    let report = SessionReport::load_json(&report_path)?;

    match format.as_str() {
        "text" => {
            println!(
                "Session {} ({}, {})",
                report.id,
                report.mode,
                report.finished_at.format("%Y-%m-%d %H:%M UTC")
            );
            let stdout = std::io::stdout();
            super::run::print_results(&report, &mut stdout.lock())?;
        }
        "markdown" => print!("{}", report.to_markdown()),
        other => anyhow::bail!("unknown format: {other} (expected text or markdown)"),
    }

    if let Some(path) = html {
        write_html_report(&report, &path)?;
        eprintln!("HTML report: {}", path.display());
    }

    Ok(())
}
