//! Generational-gap evolutionary loop.
//!
//! [`GgapRunner`] orchestrates the complete process:
//! initialize → evaluate → {select → vary → evaluate → reinsert → rescale}* → finish.
//!
//! Only `ceil(N · gap)` parents are replaced per generation, so the loop
//! sits between a full generational GA (`gap = 1`) and a steady-state GA.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::config::GgapConfig;
use super::encoding::{Direction, Field};
use super::error::{ConfigurationError, GgapError};
use super::population::{Individual, Population};
use super::reinsertion::reinsert;
use super::scaling::FitnessScaler;
use super::termination::{GenerationStats, Progress, StopCriteria, StopReason, Termination};
use super::types::Problem;
use super::variation::VariationPipeline;
use crate::random::create_rng;

/// Result of a generational-gap run.
#[derive(Debug, Clone)]
pub struct GgapResult {
    /// Best feasible individual seen during the run, as a single-row
    /// population. `None` if no feasible individual was ever found.
    pub best: Option<Population>,

    /// Raw objective values of `best`.
    pub best_objectives: Option<Vec<f64>>,

    /// Population at termination.
    pub population: Population,

    /// Completed generations.
    pub generations: usize,

    /// Objective evaluations, including the initial population.
    pub evaluations: usize,

    pub stop_reason: StopReason,

    /// One entry per generation, recorded before each termination check.
    pub trace: Vec<GenerationStats>,
}

impl GgapResult {
    /// The best individual, if any.
    pub fn best_individual(&self) -> Option<&Individual> {
        self.best.as_ref().and_then(|p| p.get(0))
    }

    /// Decoded decision variables of the best individual.
    pub fn best_phenotype(&self) -> Option<&[f64]> {
        self.best_individual().map(Individual::phenotype)
    }
}

/// Executes the generational-gap GA.
///
/// The fitness scaler defaults to [`GgapConfig::scaling`] and termination to
/// [`StopCriteria::from_config`]. A custom [`Termination`] is consulted after
/// the configured criteria, so `max_generations` always bounds a run.
///
/// # Usage
///
/// ```ignore
/// let config = GgapConfig::default().with_seed(42);
/// let fields = vec![Field::permutation(10), Field::real(lb, ub)];
/// let result = GgapRunner::new(config).run(&problem, fields)?;
/// println!("best: {:?}", result.best_objectives);
/// ```
pub struct GgapRunner<'a> {
    config: GgapConfig,
    scaler: Option<Box<dyn FitnessScaler + 'a>>,
    termination: Option<Box<dyn Termination + 'a>>,
    prophet: Option<Population>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> GgapRunner<'a> {
    pub fn new(config: GgapConfig) -> Self {
        Self {
            config,
            scaler: None,
            termination: None,
            prophet: None,
            cancel: None,
        }
    }

    pub fn config(&self) -> &GgapConfig {
        &self.config
    }

    /// Replaces the configured scaling with a custom scaler.
    pub fn with_scaler(mut self, scaler: impl FitnessScaler + 'a) -> Self {
        self.scaler = Some(Box::new(scaler));
        self
    }

    /// Adds a termination predicate checked after the configured criteria.
    pub fn with_termination(mut self, termination: impl Termination + 'a) -> Self {
        self.termination = Some(Box::new(termination));
        self
    }

    /// Seeds the run with prior knowledge.
    ///
    /// The rows are placed in front of the random initial population and the
    /// result is cut back to `population_size`. They are trusted as-is:
    /// objectives and violations must already be filled in.
    pub fn with_prophet(mut self, prophet: Population) -> Self {
        self.prophet = Some(prophet);
        self
    }

    /// Sets a flag that stops the run at the top of the next generation.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs the GA on a random initial population with the given segment layout.
    pub fn run<P: Problem + ?Sized>(
        self,
        problem: &P,
        fields: Vec<Field>,
    ) -> Result<GgapResult, GgapError> {
        let population = Population::new(fields)?;
        self.run_population(problem, population)
    }

    /// Runs the GA starting from `population`.
    ///
    /// An empty population is filled with `population_size` random rows;
    /// otherwise it must already hold exactly `population_size` rows.
    pub fn run_population<P: Problem + ?Sized>(
        self,
        problem: &P,
        mut population: Population,
    ) -> Result<GgapResult, GgapError> {
        let GgapRunner {
            config,
            scaler,
            termination,
            prophet,
            cancel,
        } = self;

        config.validate()?;
        let directions = problem.directions();
        if directions.is_empty() {
            return Err(ConfigurationError::NoObjectives.into());
        }
        if scaler.is_none() && directions.len() != 1 {
            return Err(ConfigurationError::ObjectiveCount(directions.len()).into());
        }
        let n = config.population_size;
        let pipeline = VariationPipeline::new(&population, problem.dim())?;
        let replace = config.replacement_count();

        let default_scaler = config.scaling;
        let scaler: &dyn FitnessScaler = match scaler.as_deref() {
            Some(custom) => custom,
            None => &default_scaler,
        };
        let mut criteria = StopCriteria::from_config(&config);
        let mut termination = termination;

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        if population.is_empty() {
            population.init_chromosomes(n, &mut rng);
        } else if population.size() != n {
            return Err(ConfigurationError::InvalidParameter(format!(
                "initial population has {} rows, expected {n}",
                population.size()
            ))
            .into());
        }

        log::info!(
            "ggap: starting run (N = {n}, replaced per generation = {replace}, chromosomes = {})",
            population.chromosome_count()
        );

        let mut progress = Progress::new();
        evaluate(problem, &mut population, directions.len())?;
        progress.add_evaluations(n);

        if let Some(prophet) = prophet {
            let mut merged = prophet.concat(&population)?;
            merged.truncate(n);
            merged.check_evaluated(directions.len())?;
            population = merged;
        }
        rescale(scaler, &mut population, &directions)?;

        let stop_reason = loop {
            progress.record(&population, &directions, config.stagnation_tolerance);
            if let Some(stats) = progress.trace().last() {
                log::debug!(
                    "ggap: generation {} best = {:?} mean = {:?} feasible = {} evaluations = {}",
                    stats.generation,
                    stats.best_objective,
                    stats.mean_objective,
                    stats.feasible,
                    stats.evaluations
                );
            }

            if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                break StopReason::Cancelled;
            }
            if let Some(reason) = criteria.terminated(&progress) {
                break reason;
            }
            if let Some(reason) = termination.as_mut().and_then(|t| t.terminated(&progress)) {
                break reason;
            }

            // Select
            let rows = config.selection.select(&population.fitness(), n, &mut rng);
            let mut offspring = population.select_rows(&rows)?;

            // Vary
            pipeline.apply(&mut offspring, &mut rng)?;

            // Evaluate
            evaluate(problem, &mut offspring, directions.len())?;
            if offspring.size() != n {
                return Err(GgapError::contract(format!(
                    "offspring has {} rows, expected {n}",
                    offspring.size()
                )));
            }
            progress.add_evaluations(offspring.size());
            rescale(scaler, &mut offspring, &directions)?;

            // Reinsert and rescale the merged population
            reinsert(&mut population, &offspring, replace)?;
            rescale(scaler, &mut population, &directions)?;

            progress.next_generation();
        };

        finish(population, progress, stop_reason)
    }
}

/// Calls the problem's evaluator and checks the result shape.
fn evaluate<P: Problem + ?Sized>(
    problem: &P,
    population: &mut Population,
    objectives: usize,
) -> Result<(), GgapError> {
    let size = population.size();
    problem
        .evaluate(population)
        .map_err(GgapError::Collaborator)?;
    if population.size() != size {
        return Err(GgapError::contract(format!(
            "evaluator changed population size from {size} to {}",
            population.size()
        )));
    }
    population.check_evaluated(objectives)
}

/// Recomputes the fitness of every row.
fn rescale(
    scaler: &dyn FitnessScaler,
    population: &mut Population,
    directions: &[Direction],
) -> Result<(), GgapError> {
    let fitness = scaler
        .scale(
            &population.signed_objectives(directions),
            &population.violations(),
        )
        .map_err(GgapError::Collaborator)?;
    population.set_fitness(&fitness)
}

fn finish(
    population: Population,
    progress: Progress,
    stop_reason: StopReason,
) -> Result<GgapResult, GgapError> {
    let generations = progress.generation();
    let evaluations = progress.evaluations();
    let (best, trace) = progress.into_parts();

    log::info!(
        "ggap: stopped ({stop_reason:?}) after {generations} generations, {evaluations} evaluations"
    );

    let best_objectives = best.as_ref().map(|ind| ind.objectives().to_vec());
    let best = match best {
        Some(ind) => Some(Population::from_individuals(
            population.fields().to_vec(),
            vec![ind],
        )?),
        None => {
            log::warn!("ggap: no feasible individual found");
            None
        }
    };

    Ok(GgapResult {
        best,
        best_objectives,
        population,
        generations,
        evaluations,
        stop_reason,
        trace,
    })
}

// ============================================================================
// Tests
// ============================================================================
