//! Question selection for a session.
//!
//! Without a blueprint the sampler draws uniformly from the pool. With one,
//! it apportions the requested length across blueprint tasks using the
//! largest remainder (Hare–Niemeyer) method, draws per task, tops up any
//! shortfall from the rest of the pool, and shuffles the result.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Blueprint, Question, REFERENCE_EXAM_LENGTH};
use crate::shuffle::Shuffler;

/// How many questions one blueprint task should receive this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingTarget {
    pub task_id: String,
    pub title: String,
    /// The task's count on the 125-question reference exam.
    pub count125: usize,
    /// Final number of questions to draw for this task.
    pub target: usize,
    /// Fractional part of the scaled count, in `[0, 1)`.
    pub remainder: f64,
}

/// A task whose tagged questions could not cover its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub task_id: String,
    pub target: usize,
    pub available: usize,
}

impl Shortfall {
    /// Questions missing for this task.
    pub fn missing(&self) -> usize {
        self.target.saturating_sub(self.available)
    }
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} needs {}, has {}",
            self.task_id, self.target, self.available
        )
    }
}

/// Which path produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Uniform draw from the filtered pool.
    Random,
    /// The filtered pool was too small, so the draw used every loaded question.
    RandomFallback,
    /// Blueprint-weighted draw.
    Blueprint,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Random => write!(f, "random"),
            Strategy::RandomFallback => write!(f, "random (all banks)"),
            Strategy::Blueprint => write!(f, "blueprint"),
        }
    }
}

/// The questions chosen for a session plus what happened while choosing them.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Questions in presentation order.
    pub questions: Vec<Question>,
    /// The length that was asked for.
    pub requested: usize,
    pub strategy: Strategy,
    /// Per-task targets; empty unless the blueprint path ran.
    pub targets: Vec<SamplingTarget>,
    pub shortfalls: Vec<Shortfall>,
    /// Questions added at random to cover shortfalls.
    pub topped_up: usize,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Whether the selection reached the requested length.
    pub fn is_complete(&self) -> bool {
        self.questions.len() >= self.requested
    }

    /// How many questions short of the requested length the selection is.
    pub fn missing(&self) -> usize {
        self.requested.saturating_sub(self.questions.len())
    }

    /// Human-readable warnings for the caller to display.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.shortfalls.is_empty() {
            let lines: Vec<String> = self.shortfalls.iter().map(|s| s.to_string()).collect();
            warnings.push(format!(
                "Blueprint ON, but the question bank is missing enough questions in some tasks: {}. \
                 The exam was topped up randomly with {} question(s).",
                lines.join("; "),
                self.topped_up
            ));
        }

        if self.strategy == Strategy::RandomFallback {
            warnings.push(
                "Selected banks have too few questions; drawing from all loaded banks.".into(),
            );
        }

        if !self.is_complete() {
            warnings.push(format!(
                "Requested {} questions but only {} are available.",
                self.requested,
                self.questions.len()
            ));
        }

        warnings
    }
}

/// Compute per-task targets for a session of `length` questions.
///
/// Tasks with `count125 == 0` are skipped. For the reference length the
/// targets are the blueprint counts unchanged. Otherwise each count is
/// scaled by `length / 125` and floored, and the units left over go one at
/// a time to the tasks with the largest fractional remainders. Equal
/// remainders keep blueprint order. If more units are left over than there
/// are tasks, awarding wraps around the sorted list.
pub fn apportion(blueprint: &Blueprint, length: usize) -> Vec<SamplingTarget> {
    let mut targets = Vec::new();
    // Remainders as numerators over REFERENCE_EXAM_LENGTH keep comparisons exact.
    let mut numerators = Vec::new();

    for task in blueprint.weighted_tasks() {
        let (target, numerator) = if length == REFERENCE_EXAM_LENGTH {
            (task.count125, 0)
        } else {
            // Widened so huge counts or lengths cannot overflow.
            let scaled = task.count125 as u128 * length as u128;
            let reference = REFERENCE_EXAM_LENGTH as u128;
            (
                usize::try_from(scaled / reference).unwrap_or(usize::MAX),
                (scaled % reference) as usize,
            )
        };
        targets.push(SamplingTarget {
            task_id: task.task_id.clone(),
            title: task.title.clone(),
            count125: task.count125,
            target,
            remainder: numerator as f64 / REFERENCE_EXAM_LENGTH as f64,
        });
        numerators.push(numerator);
    }

    if length == REFERENCE_EXAM_LENGTH || targets.is_empty() {
        return targets;
    }

    let assigned = targets
        .iter()
        .fold(0usize, |sum, t| sum.saturating_add(t.target));
    let remaining = length.saturating_sub(assigned);

    let mut order: Vec<usize> = (0..targets.len()).collect();
    order.sort_by(|&a, &b| numerators[b].cmp(&numerators[a]));

    // Wrapping around the sorted list awards every task `remaining / n`
    // extra units and one more to each of the first `remaining % n`.
    let (every, first) = (remaining / order.len(), remaining % order.len());
    for (rank, &i) in order.iter().enumerate() {
        let extra = every + usize::from(rank < first);
        targets[i].target = targets[i].target.saturating_add(extra);
    }

    targets
}

/// Draws the question set for a session.
///
/// `pool` holds the questions of the banks the user selected. `fallback`,
/// when set, is the whole loaded question set and is only used by the
/// unweighted path when the pool is smaller than the requested length.
pub struct Sampler<'a> {
    pool: &'a [Question],
    fallback: Option<&'a [Question]>,
    blueprint: Option<&'a Blueprint>,
}

impl<'a> Sampler<'a> {
    #[must_use]
    pub fn new(pool: &'a [Question]) -> Self {
        Self {
            pool,
            fallback: None,
            blueprint: None,
        }
    }

    /// Draw from `all` when the pool cannot fill an unweighted exam.
    #[must_use]
    pub fn with_fallback(mut self, all: &'a [Question]) -> Self {
        self.fallback = Some(all);
        self
    }

    /// Weight the draw by `blueprint`. Passing `None` disables weighting.
    #[must_use]
    pub fn with_blueprint(mut self, blueprint: Option<&'a Blueprint>) -> Self {
        self.blueprint = blueprint;
        self
    }

    /// Whether a draw would use the blueprint path.
    pub fn is_weighted(&self) -> bool {
        self.blueprint
            .is_some_and(|bp| bp.weighted_tasks().next().is_some())
    }

    /// Select `length` questions.
    pub fn sample<S: Shuffler>(&self, length: usize, shuffler: &mut S) -> Selection {
        match self.blueprint {
            Some(blueprint) if self.is_weighted() => {
                self.sample_weighted(blueprint, length, shuffler)
            }
            _ => self.sample_unweighted(length, shuffler),
        }
    }

    fn sample_unweighted<S: Shuffler>(&self, length: usize, shuffler: &mut S) -> Selection {
        let (source, strategy) = match self.fallback {
            Some(all) if self.pool.len() < length => (all, Strategy::RandomFallback),
            _ => (self.pool, Strategy::Random),
        };
        tracing::debug!(
            pool = self.pool.len(),
            source = source.len(),
            length,
            %strategy,
            "unweighted draw"
        );

        let shuffled = shuffler.shuffle(&source.iter().collect::<Vec<_>>());
        let mut used = HashSet::new();
        let questions = take_unique(shuffled, &mut used, length);

        Selection {
            questions,
            requested: length,
            strategy,
            targets: Vec::new(),
            shortfalls: Vec::new(),
            topped_up: 0,
        }
    }

    fn sample_weighted<S: Shuffler>(
        &self,
        blueprint: &Blueprint,
        length: usize,
        shuffler: &mut S,
    ) -> Selection {
        let targets = apportion(blueprint, length);
        let mut used: HashSet<&str> = HashSet::new();
        let mut picked = Vec::with_capacity(length.min(self.pool.len()));
        let mut shortfalls = Vec::new();

        for t in &targets {
            let task_pool: Vec<&Question> =
                self.pool.iter().filter(|q| q.belongs_to(&t.task_id)).collect();
            if task_pool.len() < t.target {
                shortfalls.push(Shortfall {
                    task_id: t.task_id.clone(),
                    target: t.target,
                    available: task_pool.len(),
                });
            }
            picked.extend(take_unique(shuffler.shuffle(&task_pool), &mut used, t.target));
        }

        let mut topped_up = 0;
        if picked.len() < length {
            let rest: Vec<&Question> = self
                .pool
                .iter()
                .filter(|q| !used.contains(q.id.as_str()))
                .collect();
            let top_up = take_unique(shuffler.shuffle(&rest), &mut used, length - picked.len());
            topped_up = top_up.len();
            picked.extend(top_up);
        }

        if !shortfalls.is_empty() {
            tracing::debug!(
                shortfalls = shortfalls.len(),
                topped_up,
                "blueprint tasks under-supplied"
            );
        }

        let mut questions = shuffler.shuffle(&picked);
        questions.truncate(length);

        Selection {
            questions,
            requested: length,
            strategy: Strategy::Blueprint,
            targets,
            shortfalls,
            topped_up,
        }
    }
}

/// Take up to `limit` questions whose ids are not yet in `used`, recording
/// each taken id.
fn take_unique<'q>(
    candidates: Vec<&'q Question>,
    used: &mut HashSet<&'q str>,
    limit: usize,
) -> Vec<Question> {
    let mut out = Vec::with_capacity(limit.min(candidates.len()));
    for q in candidates {
        if out.len() >= limit {
            break;
        }
        if used.insert(q.id.as_str()) {
            out.push(q.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{blueprint, question, task_questions};
    use crate::shuffle::{Identity, RandomShuffler};
    use proptest::prelude::*;
    use super::Strategy;

    fn count_task(selection: &Selection, task_id: &str) -> usize {
        selection
            .questions
            .iter()
            .filter(|q| q.belongs_to(task_id))
            .count()
    }

    fn assert_unique(questions: &[Question]) {
        let ids: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), questions.len(), "duplicate ids in selection");
    }

    fn targets_of(targets: &[SamplingTarget]) -> Vec<(&str, usize)> {
        targets
            .iter()
            .map(|t| (t.task_id.as_str(), t.target))
            .collect()
    }

    #[test]
    fn unweighted_draws_exact_length_from_pool() {
        let pool: Vec<Question> = (0..60)
            .map(|n| question(&format!("q{n}"), "core", None))
            .collect();

        for seed in 0..20 {
            let selection = Sampler::new(&pool).sample(40, &mut RandomShuffler::seeded(seed));
            assert_eq!(selection.len(), 40);
            assert_eq!(selection.strategy, Strategy::Random);
            assert_unique(&selection.questions);
            assert!(selection.questions.iter().all(|q| pool.contains(q)));
        }
    }

    #[test]
    fn unweighted_falls_back_to_all_questions_when_pool_is_small() {
        let all: Vec<Question> = (0..30)
            .map(|n| question(&format!("q{n}"), if n < 5 { "dwv" } else { "core" }, None))
            .collect();
        let pool: Vec<Question> = all.iter().filter(|q| q.bank == "dwv").cloned().collect();

        let selection = Sampler::new(&pool)
            .with_fallback(&all)
            .sample(15, &mut RandomShuffler::seeded(3));

        assert_eq!(selection.len(), 15);
        assert_eq!(selection.strategy, Strategy::RandomFallback);
        assert!(selection.warnings().iter().any(|w| w.contains("all loaded banks")));
    }

    #[test]
    fn unweighted_without_fallback_returns_what_it_has() {
        let pool: Vec<Question> = (0..7)
            .map(|n| question(&format!("q{n}"), "core", None))
            .collect();
        let selection = Sampler::new(&pool).sample(15, &mut RandomShuffler::seeded(1));
        assert_eq!(selection.len(), 7);
        assert!(!selection.is_complete());
        assert_eq!(selection.missing(), 8);
        assert!(selection
            .warnings()
            .iter()
            .any(|w| w.contains("Requested 15 questions but only 7")));
    }

    #[test]
    fn reference_length_passes_counts_through() {
        let bp = blueprint(&[("A", 20), ("B", 30), ("C", 45), ("D", 30)]);
        let targets = apportion(&bp, 125);
        assert_eq!(
            targets_of(&targets),
            vec![("A", 20), ("B", 30), ("C", 45), ("D", 30)]
        );
        assert_eq!(targets.iter().map(|t| t.target).sum::<usize>(), bp.total_questions);
        assert!(targets.iter().all(|t| t.remainder == 0.0));

        let mut pool = Vec::new();
        for task in &bp.tasks {
            pool.extend(task_questions(&task.task_id, task.count125 + 3));
        }

        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(125, &mut RandomShuffler::seeded(11));

        assert_eq!(selection.len(), 125);
        assert_unique(&selection.questions);
        assert!(selection.shortfalls.is_empty());
        for task in &bp.tasks {
            assert_eq!(count_task(&selection, &task.task_id), task.count125);
        }
    }

    #[test]
    fn length_15_splits_50_75_exactly() {
        let bp = blueprint(&[("A", 50), ("B", 75)]);
        let targets = apportion(&bp, 15);
        assert_eq!(targets_of(&targets), vec![("A", 6), ("B", 9)]);

        let mut pool = task_questions("A", 20);
        pool.extend(task_questions("B", 20));
        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(15, &mut RandomShuffler::seeded(5));

        assert_eq!(selection.len(), 15);
        assert_eq!(count_task(&selection, "A"), 6);
        assert_eq!(count_task(&selection, "B"), 9);
    }

    #[test]
    fn length_40_awards_remainder_to_first_of_tied_tasks() {
        let bp = blueprint(&[("A", 41), ("B", 42), ("C", 42)]);
        let targets = apportion(&bp, 40);
        assert_eq!(targets_of(&targets), vec![("A", 13), ("B", 14), ("C", 13)]);
        assert!((targets[0].remainder - 0.12).abs() < 1e-9);
        assert!((targets[1].remainder - 0.44).abs() < 1e-9);

        let mut pool = task_questions("A", 20);
        pool.extend(task_questions("B", 20));
        pool.extend(task_questions("C", 20));
        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(40, &mut RandomShuffler::seeded(9));

        assert_eq!(selection.len(), 40);
        assert_eq!(count_task(&selection, "B"), 14);
        assert_eq!(count_task(&selection, "A"), 13);
        assert_eq!(count_task(&selection, "C"), 13);
    }

    #[test]
    fn zero_count_tasks_are_excluded() {
        let bp = blueprint(&[("A", 60), ("Z", 0), ("B", 65)]);
        let targets = apportion(&bp, 40);
        assert!(targets.iter().all(|t| t.task_id != "Z"));
        assert_eq!(targets.iter().map(|t| t.target).sum::<usize>(), 40);
    }

    #[test]
    fn leftover_units_wrap_around_the_task_list() {
        // Counts sum to 20, so scaling leaves far more units than tasks.
        let bp = blueprint(&[("A", 10), ("B", 10)]);
        let targets = apportion(&bp, 40);
        assert_eq!(targets_of(&targets), vec![("A", 20), ("B", 20)]);
    }

    #[test]
    fn wrap_around_awards_extras_in_remainder_order() {
        // Every task floors to 0, so all 13 units wrap around the list four
        // times and the last one goes to B, the largest remainder.
        let bp = blueprint(&[("A", 3), ("B", 4), ("C", 3)]);
        let targets = apportion(&bp, 13);
        assert_eq!(targets_of(&targets), vec![("A", 4), ("B", 5), ("C", 4)]);
    }

    #[test]
    fn huge_length_does_not_overflow() {
        let bp = blueprint(&[("A", 50), ("B", 75)]);
        let mut pool = task_questions("A", 3);
        pool.extend(task_questions("B", 2));

        let length = usize::MAX / 4;
        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(length, &mut RandomShuffler::seeded(5));
        assert_eq!(selection.len(), 5);
        assert_eq!(selection.strategy, Strategy::Blueprint);
        assert_unique(&selection.questions);
        assert!(!selection.is_complete());
    }

    #[test]
    fn huge_blueprint_count_does_not_overflow() {
        let bp = blueprint(&[("A", usize::MAX / 2), ("B", 75)]);
        let targets = apportion(&bp, 40);
        assert_eq!(targets.len(), 2);
        assert!(targets[0].target > 40);
        assert_eq!(targets[1].target, 24);
    }

    #[test]
    fn shortfall_is_reported_and_topped_up() {
        let bp = blueprint(&[("A", 50), ("B", 75)]);
        let mut pool = task_questions("A", 2);
        pool.extend(task_questions("B", 10));
        pool.extend((0..5).map(|n| question(&format!("x-{n}"), "core", None)));

        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(15, &mut Identity);

        assert_eq!(
            selection.shortfalls,
            vec![Shortfall {
                task_id: "A".into(),
                target: 6,
                available: 2
            }]
        );
        assert_eq!(selection.shortfalls[0].missing(), 4);
        assert_eq!(selection.topped_up, 4);
        assert_eq!(selection.len(), 15);
        assert_unique(&selection.questions);

        let ids: Vec<&str> = selection.questions.iter().map(|q| q.id.as_str()).collect();
        for expected in ["A-0", "A-1", "B-8", "B-9", "x-0", "x-1", "x-2"] {
            assert!(ids.contains(&expected), "missing {expected}");
        }
        assert!(!ids.contains(&"x-3"));

        let warnings = selection.warnings();
        assert!(warnings[0].contains("A needs 6, has 2"));
    }

    #[test]
    fn small_pool_gives_short_weighted_session() {
        let bp = blueprint(&[("A", 50), ("B", 75)]);
        let mut pool = task_questions("A", 3);
        pool.extend(task_questions("B", 4));

        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(15, &mut RandomShuffler::seeded(2));

        assert_eq!(selection.len(), 7);
        assert_eq!(selection.shortfalls.len(), 2);
        assert_eq!(selection.missing(), 8);
    }

    #[test]
    fn different_seeds_differ_but_keep_invariants() {
        let bp = blueprint(&[("A", 41), ("B", 42), ("C", 42)]);
        let mut pool = task_questions("A", 30);
        pool.extend(task_questions("B", 30));
        pool.extend(task_questions("C", 30));
        let sampler = Sampler::new(&pool).with_blueprint(Some(&bp));

        let first = sampler.sample(40, &mut RandomShuffler::seeded(100));
        let second = sampler.sample(40, &mut RandomShuffler::seeded(200));

        assert_ne!(first.questions, second.questions);
        for selection in [&first, &second] {
            assert_eq!(selection.len(), 40);
            assert_unique(&selection.questions);
            assert_eq!(count_task(selection, "A"), 13);
            assert_eq!(count_task(selection, "B"), 14);
            assert_eq!(count_task(selection, "C"), 13);
        }
    }

    #[test]
    fn zero_length_is_empty() {
        let bp = blueprint(&[("A", 50), ("B", 75)]);
        let pool = task_questions("A", 5);

        let plain = Sampler::new(&pool).sample(0, &mut RandomShuffler::seeded(1));
        assert!(plain.is_empty());
        assert!(plain.is_complete());

        let weighted = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(0, &mut RandomShuffler::seeded(1));
        assert!(weighted.is_empty());
        assert!(weighted.shortfalls.is_empty());
    }

    #[test]
    fn all_zero_blueprint_matches_unweighted_path() {
        let bp = blueprint(&[("A", 0), ("B", 0)]);
        let pool: Vec<Question> = (0..40)
            .map(|n| question(&format!("q{n}"), "core", Some("A")))
            .collect();

        let weighted = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(15, &mut RandomShuffler::seeded(77));
        let plain = Sampler::new(&pool).sample(15, &mut RandomShuffler::seeded(77));

        assert_eq!(weighted.strategy, Strategy::Random);
        assert_eq!(weighted.questions, plain.questions);
        assert!(weighted.targets.is_empty());
    }

    #[test]
    fn oversubscribed_blueprint_is_capped_at_length() {
        let bp = blueprint(&[("A", 70), ("B", 60)]);
        let mut pool = task_questions("A", 80);
        pool.extend(task_questions("B", 80));

        let selection = Sampler::new(&pool)
            .with_blueprint(Some(&bp))
            .sample(125, &mut RandomShuffler::seeded(4));
        assert_eq!(selection.len(), 125);
        assert_unique(&selection.questions);
    }

    proptest! {
        #[test]
        fn unweighted_invariants(pool_size in 0usize..120, length in 0usize..130, seed in any::<u64>()) {
            let pool: Vec<Question> = (0..pool_size)
                .map(|n| question(&format!("q{n}"), "core", None))
                .collect();
            let selection = Sampler::new(&pool).sample(length, &mut RandomShuffler::seeded(seed));
            prop_assert_eq!(selection.len(), length.min(pool_size));
            let ids: HashSet<&str> = selection.questions.iter().map(|q| q.id.as_str()).collect();
            prop_assert_eq!(ids.len(), selection.len());
        }

        #[test]
        fn weighted_invariants(
            per_task in proptest::collection::vec(0usize..40, 1..6),
            counts in proptest::collection::vec(0usize..60, 1..6),
            length in 0usize..130,
            seed in any::<u64>(),
        ) {
            let tasks: Vec<(String, usize)> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| (format!("T{i}"), *c))
                .collect();
            let task_refs: Vec<(&str, usize)> = tasks.iter().map(|(id, c)| (id.as_str(), *c)).collect();
            let bp = blueprint(&task_refs);

            let mut pool = Vec::new();
            for (i, n) in per_task.iter().enumerate() {
                pool.extend(task_questions(&format!("T{i}"), *n));
            }

            let selection = Sampler::new(&pool)
                .with_blueprint(Some(&bp))
                .sample(length, &mut RandomShuffler::seeded(seed));

            prop_assert_eq!(selection.len(), length.min(pool.len()));
            let ids: HashSet<&str> = selection.questions.iter().map(|q| q.id.as_str()).collect();
            prop_assert_eq!(ids.len(), selection.len());

            if selection.strategy == Strategy::Blueprint && length != REFERENCE_EXAM_LENGTH {
                let sum: usize = selection.targets.iter().map(|t| t.target).sum();
                prop_assert!(sum >= length);
            }
        }
    }
}
