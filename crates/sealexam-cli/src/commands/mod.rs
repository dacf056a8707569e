//! Subcommand implementations and the helpers they share.

pub mod init;
pub mod review;
pub mod run;
pub mod sample;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};

use sealexam_core::sampler::{Sampler, Selection};
use sealexam_core::shuffle::RandomShuffler;
use sealexam_core::statistics::GroupStats;
use sealexam_sources::{load_config_from, SealexamConfig};

/// Flags that decide which questions a session draws.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Number of questions (default from config, usually 15)
    #[arg(long)]
    pub length: Option<usize>,

    /// Banks to draw from, comma-separated (default: all)
    #[arg(long)]
    pub banks: Option<String>,

    /// Ignore the blueprint and draw uniformly
    #[arg(long)]
    pub no_blueprint: bool,

    /// Seed for a reproducible draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Everything produced while choosing a session's questions.
pub struct Draw {
    pub config: SealexamConfig,
    pub selection: Selection,
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(list: Option<&str>) -> Vec<String> {
    list.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Bank names a selection may use: tags found on loaded questions, then
/// configured names, each listed once.
pub fn known_banks(
    loaded: impl IntoIterator<Item = String>,
    configured: impl IntoIterator<Item = String>,
) -> Vec<String> {
    let mut known: Vec<String> = Vec::new();
    for name in loaded.into_iter().chain(configured) {
        if !known.contains(&name) {
            known.push(name);
        }
    }
    known
}

/// Load config and banks, then draw a selection.
pub async fn draw(args: &SelectionArgs) -> Result<Draw> {
    let config = load_config_from(args.config.as_deref())?;
    let length = args.length.unwrap_or(config.default_length);
    anyhow::ensure!(length >= 1, "length must be at least 1");

    let library = config.loader()?.load().await;
    eprintln!("{}", library.blueprint_status_line());
    anyhow::ensure!(
        !library.is_empty(),
        "no questions loaded; check the bank locations in your config or run `sealexam init`"
    );

    let banks = split_list(args.banks.as_deref());
    let known = known_banks(
        library.bank_counts().into_iter().map(|(name, _)| name),
        config.bank_names(),
    );
    for bank in &banks {
        anyhow::ensure!(
            known.contains(bank),
            "unknown bank '{bank}'. Available: {}",
            known.join(", ")
        );
    }

    let pool = library.pool(&banks);
    let blueprint = if config.use_blueprint && !args.no_blueprint {
        library.blueprint()
    } else {
        None
    };

    let mut shuffler = RandomShuffler::with_seed(args.seed);
    let selection = Sampler::new(&pool)
        .with_fallback(&library.questions)
        .with_blueprint(blueprint)
        .sample(length, &mut shuffler);
    tracing::debug!(
        "drew {} question(s) via {}",
        selection.len(),
        selection.strategy
    );

    for warning in selection.warnings() {
        eprintln!("Warning: {warning}");
    }

    Ok(Draw { config, selection })
}

/// Render grouped results as a table.
pub fn group_table(label: &str, groups: &[GroupStats]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![label, "Correct", "Answered", "Total", "Accuracy"]);
    for g in groups {
        table.add_row(vec![
            Cell::new(&g.key),
            Cell::new(g.correct),
            Cell::new(g.answered),
            Cell::new(g.total),
            Cell::new(format!("{:.0}%", g.accuracy() * 100.0)),
        ]);
    }
    table
}
