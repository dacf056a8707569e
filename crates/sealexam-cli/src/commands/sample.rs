//! The `sealexam sample` command.

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use sealexam_core::sampler::{SamplingTarget, Selection, Shortfall, Strategy};

use super::{draw, SelectionArgs};

/// Machine-readable preview of a draw.
#[derive(Serialize)]
struct SamplePreview<'a> {
    strategy: Strategy,
    requested: usize,
    total: usize,
    question_ids: Vec<&'a str>,
    targets: &'a [SamplingTarget],
    shortfalls: &'a [Shortfall],
    topped_up: usize,
    warnings: Vec<String>,
}

impl<'a> SamplePreview<'a> {
    fn new(selection: &'a Selection) -> Self {
        Self {
            strategy: selection.strategy,
            requested: selection.requested,
            total: selection.len(),
            question_ids: selection.questions.iter().map(|q| q.id.as_str()).collect(),
            targets: &selection.targets,
            shortfalls: &selection.shortfalls,
            topped_up: selection.topped_up,
            warnings: selection.warnings(),
        }
    }
}

pub async fn execute(selection: SelectionArgs, format: String) -> Result<()> {
    let draw = draw(&selection).await?;
    let selection = &draw.selection;

    match format.as_str() {
        "json" => {
            let preview = SamplePreview::new(selection);
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        "text" => print_text(selection),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

fn print_text(selection: &Selection) {
    println!(
        "Selection: {} | {} of {} question(s)",
        selection.strategy,
        selection.len(),
        selection.requested
    );

    if !selection.targets.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Task", "Title", "Count/125", "Target", "Drawn"]);
        for t in &selection.targets {
            let drawn = selection
                .questions
                .iter()
                .filter(|q| q.belongs_to(&t.task_id))
                .count();
            table.add_row(vec![
                Cell::new(&t.task_id),
                Cell::new(&t.title),
                Cell::new(t.count125),
                Cell::new(t.target),
                Cell::new(drawn),
            ]);
        }
        println!("\n{table}");
    }

    println!();
    for (n, q) in selection.questions.iter().enumerate() {
        let task = q.task_id.as_deref().unwrap_or("-");
        println!("{:>4}. {} [{} | {}]", n + 1, q.id, q.bank, task);
    }

    if !selection.shortfalls.is_empty() {
        println!("\nShortfalls:");
        for s in &selection.shortfalls {
            println!("  {s} (missing {})", s.missing());
        }
        println!("Topped up with {} random question(s).", selection.topped_up);
    }
}
