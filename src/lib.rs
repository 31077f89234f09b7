//! Generational-gap genetic algorithm for heterogeneous genomes.
//!
//! Provides a steady-state GA where only a fixed fraction of the population
//! is replaced each generation:
//!
//! - **Multi-chromosome genomes**: each segment is binary/gray coded,
//!   real/integer valued, or a permutation, with its own crossover and
//!   mutation pair chosen from its encoding.
//! - **Generational-gap reinsertion**: the worst `ceil(N · gap)` parents are
//!   overwritten by the best offspring; the rest survive unchanged.
//! - **Pluggable collaborators**: the evaluator, fitness scaler and
//!   termination predicate are traits with default implementations.
//!
//! # Architecture
//!
//! The crate is domain-agnostic. Problems are defined by implementing
//! [`ggap::Problem`] over decoded phenotypes; scheduling, routing or
//! design-space concepts live in consumers.

pub mod ggap;
pub mod random;
