//! Generational-gap reinsertion.
//!
//! Each generation only `ceil(N · gap)` parents are replaced: the worst
//! parents (by fitness, ascending) are overwritten by the best offspring
//! (by fitness, descending), pairwise in rank order. Ties keep index order.
//! All other parent rows are left untouched.

use super::error::{ConfigurationError, GgapError};
use super::population::Population;

/// Fraction of the population replaced each generation.
///
/// # Examples
///
/// ```
/// use u_ggap::ggap::GenerationalGap;
///
/// let gap = GenerationalGap::new(0.9).unwrap();
/// assert_eq!(gap.replacement_count(50), 45);
/// assert_eq!(gap.replacement_count(7), 7); // ceil(6.3)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationalGap {
    ratio: f64,
}

impl GenerationalGap {
    /// Creates a gap; `ratio` must lie in `(0, 1]`.
    pub fn new(ratio: f64) -> Result<Self, ConfigurationError> {
        if ratio > 0.0 && ratio <= 1.0 {
            Ok(Self { ratio })
        } else {
            Err(ConfigurationError::InvalidGap(ratio))
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Number of individuals replaced per generation, `ceil(n · ratio)`.
    pub fn replacement_count(&self, n: usize) -> usize {
        ((n as f64 * self.ratio).ceil() as usize).min(n)
    }
}

/// Indices of the `count` lowest-fitness rows, worst first.
pub fn worst_rows(fitness: &[f64], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));
    order.truncate(count);
    order
}

/// Indices of the `count` highest-fitness rows, best first.
pub fn best_rows(fitness: &[f64], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
    order.truncate(count);
    order
}

/// Overwrites the `count` worst rows of `population` with the `count` best
/// rows of `offspring`.
///
/// `count == 0` is a no-op. The offspring set is not modified.
pub fn reinsert(
    population: &mut Population,
    offspring: &Population,
    count: usize,
) -> Result<(), GgapError> {
    if count > population.size() || count > offspring.size() {
        return Err(GgapError::contract(format!(
            "cannot replace {count} rows (population {}, offspring {})",
            population.size(),
            offspring.size()
        )));
    }
    if count == 0 {
        return Ok(());
    }
    let replace = worst_rows(&population.fitness(), count);
    let insert = best_rows(&offspring.fitness(), count);
    population.overwrite_rows(&replace, offspring, &insert)
}
