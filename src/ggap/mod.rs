//! Generational-gap genetic algorithm.
//!
//! A single-objective GA over multi-chromosome genomes. Each chromosome
//! segment has its own [`Encoding`] (binary/gray bit strings, real or integer
//! vectors, or permutations) and its own crossover/mutation pair, fixed once
//! at setup. Each generation, `ceil(N · gap)` of the worst parents are
//! replaced by the best offspring; the rest of the population survives.
//!
//! # Core Traits
//!
//! - [`Problem`]: Evaluator, dimensionality and objective directions
//! - [`FitnessScaler`]: Signed objectives and violations → higher-is-better fitness
//! - [`Termination`]: Stopping predicate consulted at the top of each generation
//!
//! # Key Types
//!
//! - [`Field`]: Layout of one chromosome segment
//! - [`Population`]: Row-indexed individuals sharing a segment layout
//! - [`VariationPipeline`]: Per-segment crossover and mutation
//! - [`GenerationalGap`]: Replacement ratio and reinsertion
//! - [`GgapConfig`]: Algorithm parameters
//! - [`GgapRunner`]: Executes the evolutionary loop
//! - [`GgapResult`]: Final population, best individual and run statistics
//!
//! # Submodules
//!
//! - [`operators`]: Row-level crossover and mutation primitives
//!
//! # References
//!
//! - De Jong (1975), *An Analysis of the Behavior of a Class of Genetic
//!   Adaptive Systems* (generation gap)
//! - Mühlenbein & Schlierkamp-Voosen (1993), "Predictive Models for the
//!   Breeder Genetic Algorithm"
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman
//!   Problem" (PMX)

mod config;
mod encoding;
mod error;
pub mod operators;
mod population;
mod reinsertion;
mod runner;
mod scaling;
mod selection;
mod termination;
mod types;
mod variation;

pub use config::GgapConfig;
pub use encoding::{Direction, Encoding, Field, DEFAULT_BITS_PER_VARIABLE};
pub use error::{BoxError, ConfigurationError, GgapError};
pub use population::{Evaluation, Genes, Individual, Population};
pub use reinsertion::{best_rows, reinsert, worst_rows, GenerationalGap};
pub use runner::{GgapResult, GgapRunner};
pub use scaling::{FitnessScaler, Scaling, ScalingError};
pub use selection::Selection;
pub use termination::{GenerationStats, Progress, StopCriteria, StopReason, Termination};
pub use types::Problem;
pub use variation::{
    operators_for, Mutation, Recombination, VariationPipeline, BREEDER_GRADIENT, BREEDER_SHRINK,
};
