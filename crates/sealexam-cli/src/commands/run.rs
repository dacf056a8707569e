//! The `sealexam run` command.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;

use sealexam_core::model::{Mode, Question};
use sealexam_core::report::SessionReport;
use sealexam_core::session::{Advance, Session};
use sealexam_report::html::write_html_report;

use super::{draw, group_table, SelectionArgs};

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    /// The user quit, or input ran out, before the last question.
    Quit,
}

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Answer(usize),
    Next,
    Prev,
    Quit,
    Invalid,
}

pub async fn execute(
    selection: SelectionArgs,
    mode: Option<Mode>,
    output: PathBuf,
    format: Option<String>,
) -> Result<()> {
    let draw = draw(&selection).await?;
    let mode = mode.unwrap_or(draw.config.mode);
    let mut session = Session::start(draw.selection, mode)?;

    println!(
        "Starting {} session: {} question(s). Answer with a number or letter; n/Enter next, p previous, q quit.",
        mode,
        session.len()
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = run_session(&mut session, stdin.lock(), &mut out)?;
    if outcome == Outcome::Quit {
        writeln!(out, "\nSession ended early.")?;
    }

    let report = session.finish();
    print_results(&report, &mut out)?;
    drop(out);

    if let Some(format) = format {
        save_report(&report, &output, &format)?;
    }

    Ok(())
}

/// Drive a session from line-based input until it finishes or the user quits.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
) -> Result<Outcome> {
    let mut lines = input.lines();
    render_question(session, out)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            return Ok(Outcome::Quit);
        };
        let line = line?;

        match parse_input(&line, session.current().choices.len()) {
            Input::Quit => return Ok(Outcome::Quit),
            Input::Prev => {
                if session.prev() {
                    render_question(session, out)?;
                } else {
                    writeln!(out, "Already at the first question.")?;
                }
            }
            Input::Next => match session.next() {
                Ok(Advance::Moved(_)) => render_question(session, out)?,
                Ok(Advance::Finished) => return Ok(Outcome::Finished),
                Err(e) => writeln!(out, "{}.", capitalize(&e.to_string()))?,
            },
            Input::Answer(choice) => match session.answer(choice) {
                Ok(_) => render_feedback(session, out)?,
                Err(e) => writeln!(out, "{}.", capitalize(&e.to_string()))?,
            },
            Input::Invalid => {
                let n = session.current().choices.len();
                writeln!(
                    out,
                    "Enter 1-{n} or A-{}, n for next, p for previous, q to quit.",
                    choice_letter(n.saturating_sub(1))
                )?;
            }
        }
    }
}

fn parse_input(line: &str, choices: usize) -> Input {
    let cmd = line.trim().to_lowercase();
    match cmd.as_str() {
        "" | "n" | "next" => return Input::Next,
        "p" | "prev" => return Input::Prev,
        "q" | "quit" => return Input::Quit,
        _ => {}
    }

    if let Ok(n) = cmd.parse::<usize>() {
        return if (1..=choices).contains(&n) {
            Input::Answer(n - 1)
        } else {
            Input::Invalid
        };
    }

    let mut chars = cmd.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => {
            let idx = (c as u8 - b'a') as usize;
            if idx < choices {
                Input::Answer(idx)
            } else {
                Input::Invalid
            }
        }
        _ => Input::Invalid,
    }
}

fn choice_letter(idx: usize) -> char {
    (b'A' + (idx % 26) as u8) as char
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_question<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let q = session.current();
    let answer = session.current_answer();

    writeln!(out)?;
    let mut meta = format!(
        "Question {}/{} [{}",
        session.index() + 1,
        session.len(),
        q.bank
    );
    if let Some(task) = &q.task_id {
        meta.push_str(&format!(" | Task: {task}"));
    }
    if let Some(difficulty) = &q.difficulty {
        meta.push_str(&format!(" | {difficulty}"));
    }
    meta.push(']');
    writeln!(out, "{meta}")?;
    writeln!(out, "{}", q.stem)?;

    for (idx, choice) in q.choices.iter().enumerate() {
        let marker = match answer.chosen {
            Some(_) if idx == q.answer_index => " (correct)",
            Some(chosen) if chosen == idx => " (your answer)",
            _ => "",
        };
        writeln!(out, "  {}) {}{}", choice_letter(idx), choice, marker)?;
    }

    if answer.is_answered() {
        render_feedback(session, out)?;
    }
    Ok(())
}

fn render_feedback<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let q = session.current();
    let correct = session.current_answer().correct == Some(true);

    let mut verdict = if correct {
        "Correct".to_string()
    } else {
        format!(
            "Incorrect. Answer: {}) {}",
            choice_letter(q.answer_index),
            q.correct_choice().unwrap_or("-")
        )
    };
    if session.mode() == Mode::Training {
        verdict.push_str(" [Training mode]");
    }
    writeln!(out, "{verdict}")?;
    write_explanation(q, out)
}

fn write_explanation<W: Write>(q: &Question, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "  {}",
        q.explanation
            .as_deref()
            .unwrap_or("Explanation not provided.")
    )?;
    for r in &q.references {
        write!(out, "  - {} {} [{}]", r.code, r.location, r.confidence)?;
        if !r.note.is_empty() {
            write!(out, " {}", r.note)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Print the score, missed review and breakdown.
pub fn print_results<W: Write>(report: &SessionReport, out: &mut W) -> Result<()> {
    writeln!(out, "\n{}", report.summary_line())?;

    if report.missed.is_empty() {
        writeln!(out, "No missed questions.")?;
    } else {
        writeln!(out, "\nMissed ({}):", report.missed.len())?;
        for (n, m) in report.missed.iter().enumerate() {
            let q = &m.question;
            writeln!(out, "\n{}. {}", n + 1, q.stem)?;
            writeln!(out, "  Your answer: {}", m.chosen_text().unwrap_or("-"))?;
            writeln!(
                out,
                "  Correct answer: {}",
                q.correct_choice().unwrap_or("-")
            )?;
            write_explanation(q, out)?;
        }
    }

    if !report.breakdown.per_task.is_empty() {
        writeln!(out, "\n{}", group_table("Task", &report.breakdown.per_task))?;
    }
    if report.breakdown.per_bank.len() > 1 {
        writeln!(out, "{}", group_table("Bank", &report.breakdown.per_bank))?;
    }
    Ok(())
}

/// Write the report in the requested formats.
pub fn save_report(report: &SessionReport, output: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)?;
    let timestamp = report.finished_at.format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("session-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("session-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }
    Ok(())
}
