//! The `sealexam validate` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use sealexam_core::parser::{parse_bank_file, validate_questions, ValidationWarning};
use sealexam_core::statistics::task_coverage;
use sealexam_sources::load_config_from;

pub async fn execute(
    config_path: Option<PathBuf>,
    bank: Option<PathBuf>,
    length: Option<usize>,
) -> Result<()> {
    if let Some(path) = bank {
        return validate_file(&path);
    }

    let config = load_config_from(config_path.as_deref())?;
    let length = length.unwrap_or(config.default_length);
    anyhow::ensure!(length >= 1, "length must be at least 1");

    let library = config.loader()?.load().await;

    println!("{}", library.status_line());
    for (name, count) in library.bank_counts() {
        println!("  {name}: {count} question(s)");
    }
    for f in &library.failures {
        let hint = if f.retryable { " (may be temporary)" } else { "" };
        println!("  [{}] {}: {}{}", f.name, f.location, f.error, hint);
    }
    if library.rejected > 0 {
        println!("  {} malformed record(s) skipped", library.rejected);
    }

    println!("{}", library.blueprint_status_line());

    if let Some(bp) = library.blueprint() {
        let coverage = task_coverage(&library.questions, bp, length);
        let mut table = Table::new();
        table.set_header(vec![
            "Task".to_string(),
            "Title".to_string(),
            "Count/125".to_string(),
            format!("Target/{length}"),
            "Available".to_string(),
            "Status".to_string(),
        ]);
        for c in &coverage {
            let status = if c.is_short() {
                "SHORT"
            } else if c.available < c.count125 {
                "thin"
            } else {
                "OK"
            };
            table.add_row(vec![
                Cell::new(&c.task_id),
                Cell::new(&c.title),
                Cell::new(c.count125),
                Cell::new(c.target),
                Cell::new(c.available),
                Cell::new(status),
            ]);
        }
        println!("\n{table}");

        let untagged = library
            .questions
            .iter()
            .filter(|q| q.task_id.is_none())
            .count();
        if untagged > 0 {
            println!("{untagged} question(s) have no taskId and only fill top-ups.");
        }
    }

    let mut warnings = validate_questions(&library.questions, library.blueprint());
    if library.duplicates > 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "{} question(s) dropped for duplicate ids",
                library.duplicates
            ),
        });
    }

    print_warnings(&warnings, "All banks valid.");
    Ok(())
}

fn validate_file(path: &Path) -> Result<()> {
    let source_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().trim_start_matches("questions-").to_string())
        .unwrap_or_else(|| "bank".to_string());
    let parsed = parse_bank_file(path, &source_name)?;

    println!(
        "Bank file: {} ({} questions, {} rejected)",
        path.display(),
        parsed.questions.len(),
        parsed.rejected
    );

    let warnings = validate_questions(&parsed.questions, None);
    print_warnings(&warnings, "All questions valid.");
    Ok(())
}

fn print_warnings(warnings: &[ValidationWarning], ok_message: &str) {
    for w in warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("{ok_message}");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }
}
