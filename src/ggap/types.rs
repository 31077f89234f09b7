//! Problem definition for the generational-gap GA.
//!
//! [`Problem`] is the contract between the engine and a domain: it reports
//! how many decision variables there are, which way each objective points,
//! and fills in objective values (and constraint violations) for a whole
//! population at once.

use super::encoding::Direction;
use super::error::BoxError;
use super::population::Population;

/// A single-objective optimization problem over decoded phenotypes.
///
/// # Implementing
///
/// ```ignore
/// struct Sphere { dim: usize }
///
/// impl Problem for Sphere {
///     fn dim(&self) -> usize { self.dim }
///     fn directions(&self) -> Vec<Direction> { vec![Direction::Minimize] }
///     fn evaluate(&self, pop: &mut Population) -> Result<(), BoxError> {
///         pop.evaluate_rows(|x| Evaluation::unconstrained(vec![x.iter().map(|v| v * v).sum()]));
///         Ok(())
///     }
/// }
/// ```
pub trait Problem {
    /// Number of decision variables.
    ///
    /// Real-valued segments mutate each gene with probability `1 / dim`.
    fn dim(&self) -> usize;

    /// Direction of each objective; its length is the number of objectives.
    fn directions(&self) -> Vec<Direction>;

    /// Computes objective values and constraint violations for every row.
    ///
    /// Must read phenotypes and write results in place via
    /// [`Individual::set_evaluation`](super::Individual::set_evaluation) or
    /// [`Population::evaluate_rows`]. It must not change genes or row count.
    fn evaluate(&self, population: &mut Population) -> Result<(), BoxError>;
}
