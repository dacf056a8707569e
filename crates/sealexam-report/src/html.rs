//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use sealexam_core::model::{Confidence, Question};
use sealexam_core::report::SessionReport;
use sealexam_core::statistics::GroupStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a session report.
pub fn generate_html(report: &SessionReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>sealexam results — {}/{}</title>\n",
        report.correct, report.total
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>sealexam results</h1>\n");
    html.push_str(&format!(
        "<p class=\"score {}\">{}</p>\n",
        score_class(report.percent),
        html_escape(&report.summary_line())
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Mode: <strong>{}</strong> | Selection: {} | {} of {} requested | {}</p>\n",
        report.mode,
        report.strategy,
        report.total,
        report.requested,
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !report.shortfalls.is_empty() {
        html.push_str("<p class=\"notice\">Some tasks were short of questions: ");
        let items: Vec<String> = report
            .shortfalls
            .iter()
            .map(|s| html_escape(&s.to_string()))
            .collect();
        html.push_str(&items.join("; "));
        html.push_str("</p>\n");
    }
    html.push_str("</header>\n");

    // Breakdown
    html.push_str("<section class=\"breakdown\">\n");
    html.push_str("<h2>Breakdown</h2>\n");
    if !report.breakdown.per_task.is_empty() {
        html.push_str(&generate_bar_chart(&report.breakdown.per_task));
    }
    html.push_str(&group_table("Task", &report.breakdown.per_task));
    html.push_str(&group_table("Bank", &report.breakdown.per_bank));
    html.push_str("</section>\n");

    // Missed questions
    html.push_str("<section class=\"missed\">\n");
    html.push_str(&format!("<h2>Missed ({})</h2>\n", report.missed.len()));
    if report.missed.is_empty() {
        html.push_str("<p>No missed questions.</p>\n");
    }
    for m in &report.missed {
        html.push_str(&missed_card(&m.question, m.chosen_text()));
    }
    html.push_str("</section>\n");

    // Every item
    html.push_str("<section class=\"items\">\n");
    html.push_str("<h2>All questions</h2>\n");
    html.push_str("<table class=\"items-table\" id=\"items\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Bank</th><th onclick=\"sortTable(3)\">Task</th><th onclick=\"sortTable(4)\">Result</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (n, item) in report.items.iter().enumerate() {
        let (class, text) = match (item.chosen, item.correct) {
            (None, _) => ("skip", "Unanswered"),
            (Some(_), true) => ("pass", "Correct"),
            (Some(_), false) => ("fail", "Incorrect"),
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            n + 1,
            html_escape(&item.question_id),
            html_escape(&item.bank),
            html_escape(item.task_id.as_deref().unwrap_or("-")),
            text
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn score_class(percent: u32) -> &'static str {
    if percent >= 70 {
        "pass"
    } else {
        "fail"
    }
}

fn group_table(label: &str, groups: &[GroupStats]) -> String {
    if groups.is_empty() {
        return String::new();
    }
    let mut table = String::from("<table class=\"summary\">\n");
    table.push_str(&format!(
        "<thead><tr><th>{label}</th><th>Correct</th><th>Answered</th><th>Total</th><th>Accuracy</th></tr></thead>\n"
    ));
    table.push_str("<tbody>\n");
    for g in groups {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.0}%</td></tr>\n",
            html_escape(&g.key),
            g.correct,
            g.answered,
            g.total,
            g.accuracy() * 100.0
        ));
    }
    table.push_str("</tbody></table>\n");
    table
}

fn missed_card(q: &Question, chosen: Option<&str>) -> String {
    let mut card = String::from("<article class=\"card\">\n");
    card.push_str(&format!("<h3>{}</h3>\n", html_escape(&q.stem)));

    let mut tags = vec![html_escape(&q.bank)];
    if let Some(task) = &q.task_id {
        tags.push(format!("Task: {}", html_escape(task)));
    }
    card.push_str(&format!("<p class=\"meta\">{}</p>\n", tags.join(" | ")));

    card.push_str(&format!(
        "<p class=\"fail\">Your answer: {}</p>\n",
        html_escape(chosen.unwrap_or("-"))
    ));
    card.push_str(&format!(
        "<p class=\"pass\">Correct answer: {}</p>\n",
        html_escape(q.correct_choice().unwrap_or("-"))
    ));
    card.push_str(&format!(
        "<p>{}</p>\n",
        html_escape(
            q.explanation
                .as_deref()
                .unwrap_or("Explanation not provided.")
        )
    ));

    if !q.references.is_empty() {
        card.push_str("<ul class=\"refs\">\n");
        for r in &q.references {
            let tag = match r.confidence {
                Confidence::Verified => "verified",
                Confidence::NeedsVerify => "needs-verify",
            };
            card.push_str(&format!(
                "<li>{} {} <span class=\"tag {}\">{}</span>",
                html_escape(&r.code),
                html_escape(&r.location),
                tag,
                r.confidence
            ));
            if !r.note.is_empty() {
                card.push_str(&format!(" {}", html_escape(&r.note)));
            }
            card.push_str("</li>\n");
        }
        card.push_str("</ul>\n");
    }

    card.push_str("</article>\n");
    card
}

fn generate_bar_chart(groups: &[GroupStats]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 160;

    let total_height = groups.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, g) in groups.iter().enumerate() {
        let score = g.accuracy();
        let y = i * (bar_height + padding) + padding;
        let width = (score * max_width as f64) as usize;

        let color = if score >= 0.8 {
            "#22c55e"
        } else if score >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"13\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&g.key)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}/{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            g.correct,
            g.total
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --skip: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --skip: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 1.5rem; font-weight: bold; padding: 0.5rem 1rem; border-radius: 8px; display: inline-block; }
.notice { border-left: 4px solid #eab308; padding-left: 1rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.skip { background: var(--skip); }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem; margin: 1rem 0; }
.card h3 { margin-top: 0; }
.card p.pass, .card p.fail { padding: 0.25rem 0.5rem; border-radius: 4px; }
.tag { font-size: 0.75rem; padding: 0.1rem 0.4rem; border-radius: 4px; border: 1px solid var(--border); }
.tag.verified { background: var(--pass); }
.tag.needs-verify { background: #fef3c7; color: #1a1a1a; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('items');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
