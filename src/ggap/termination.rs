//! Run bookkeeping and stopping rules.
//!
//! [`Progress`] is updated by the runner at the top of every generation,
//! before the [`Termination`] predicate is consulted. It tracks the
//! generation and evaluation counters, the best feasible individual seen so
//! far, the stagnation counter and a per-generation trace.

use std::time::{Duration, Instant};

use super::config::GgapConfig;
use super::encoding::Direction;
use super::population::{Individual, Population};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    MaxGenerations,
    MaxEvaluations,
    TimeLimit,
    Stagnation,
    Cancelled,
}

/// Snapshot of one generation, recorded before the termination check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Completed generations at the time of recording.
    pub generation: usize,
    pub evaluations: usize,
    /// Raw objective of the best feasible row, if any row is feasible.
    pub best_objective: Option<f64>,
    /// Mean raw objective over feasible rows.
    pub mean_objective: Option<f64>,
    pub feasible: usize,
}

/// Counters and best-so-far state of a run.
#[derive(Debug, Clone)]
pub struct Progress {
    generation: usize,
    evaluations: usize,
    started: Instant,
    best: Option<Individual>,
    best_signed: Option<f64>,
    previous_signed: Option<f64>,
    stagnation: usize,
    trace: Vec<GenerationStats>,
}

impl Progress {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            evaluations: 0,
            started: Instant::now(),
            best: None,
            best_signed: None,
            previous_signed: None,
            stagnation: 0,
            trace: Vec::new(),
        }
    }

    /// Completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Objective evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Best feasible individual seen so far.
    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// Consecutive generations whose best signed objective moved by less
    /// than the stagnation tolerance. A generation without feasible rows
    /// resets the counter.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    pub fn trace(&self) -> &[GenerationStats] {
        &self.trace
    }

    pub(crate) fn add_evaluations(&mut self, n: usize) {
        self.evaluations += n;
    }

    pub(crate) fn next_generation(&mut self) {
        self.generation += 1;
    }

    pub(crate) fn into_parts(self) -> (Option<Individual>, Vec<GenerationStats>) {
        (self.best, self.trace)
    }

    /// Records statistics of `population` and updates best-so-far and stagnation.
    ///
    /// Only the first objective is considered; `tolerance` is the minimum
    /// change of the generation best that does not count as stagnation.
    pub(crate) fn record(&mut self, population: &Population, directions: &[Direction], tolerance: f64) {
        let sign = directions.first().map_or(-1.0, |d| d.sign());
        let mut best_row: Option<(usize, f64)> = None;
        let mut sum = 0.0;
        let mut feasible = 0usize;

        for (row, ind) in population.individuals().iter().enumerate() {
            let Some(&raw) = ind.objectives().first() else { continue };
            if !ind.is_feasible() || !raw.is_finite() {
                continue;
            }
            feasible += 1;
            sum += raw;
            let signed = raw * sign;
            if best_row.map_or(true, |(_, b)| signed > b) {
                best_row = Some((row, signed));
            }
        }

        if let Some((row, signed)) = best_row {
            if self.best_signed.map_or(true, |b| signed > b) {
                self.best_signed = Some(signed);
                self.best = population.get(row).cloned();
            }
            match self.previous_signed {
                Some(prev) if (signed - prev).abs() < tolerance => self.stagnation += 1,
                _ => self.stagnation = 0,
            }
            self.previous_signed = Some(signed);
        } else {
            self.stagnation = 0;
            self.previous_signed = None;
        }

        self.trace.push(GenerationStats {
            generation: self.generation,
            evaluations: self.evaluations,
            best_objective: best_row.map(|(_, s)| s * sign),
            mean_objective: (feasible > 0).then(|| sum / feasible as f64),
            feasible,
        });
    }
}

/// Stopping predicate consulted once at the top of every generation.
///
/// Implementations may keep internal state but must not touch the population.
pub trait Termination {
    /// Returns `Some(reason)` to stop the run.
    fn terminated(&mut self, progress: &Progress) -> Option<StopReason>;
}

impl<F> Termination for F
where
    F: FnMut(&Progress) -> Option<StopReason>,
{
    fn terminated(&mut self, progress: &Progress) -> Option<StopReason> {
        self(progress)
    }
}

/// Default stopping rules: generation, evaluation and time budgets plus stagnation.
#[derive(Debug, Clone, PartialEq)]
pub struct StopCriteria {
    pub max_generations: usize,
    pub max_evaluations: Option<usize>,
    pub time_limit: Option<Duration>,
    /// Consecutive stagnating generations before stopping; 0 disables.
    pub stagnation_limit: usize,
}

impl StopCriteria {
    pub fn from_config(config: &GgapConfig) -> Self {
        Self {
            max_generations: config.max_generations,
            max_evaluations: config.max_evaluations,
            time_limit: config.time_limit_ms.map(Duration::from_millis),
            stagnation_limit: config.stagnation_limit,
        }
    }
}

impl Termination for StopCriteria {
    fn terminated(&mut self, progress: &Progress) -> Option<StopReason> {
        if progress.generation() >= self.max_generations {
            return Some(StopReason::MaxGenerations);
        }
        if self.max_evaluations.is_some_and(|max| progress.evaluations() >= max) {
            return Some(StopReason::MaxEvaluations);
        }
        if self.time_limit.is_some_and(|limit| progress.elapsed() >= limit) {
            return Some(StopReason::TimeLimit);
        }
        if self.stagnation_limit > 0 && progress.stagnation() >= self.stagnation_limit {
            return Some(StopReason::Stagnation);
        }
        None
    }
}
