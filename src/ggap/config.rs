//! Generational-gap GA configuration.
//!
//! [`GgapConfig`] holds all parameters that control the evolutionary loop.

use super::error::ConfigurationError;
use super::reinsertion::GenerationalGap;
use super::scaling::Scaling;
use super::selection::Selection;

/// Configuration for the generational-gap GA.
///
/// # Defaults
///
/// ```
/// use u_ggap::ggap::GgapConfig;
///
/// let config = GgapConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.replacement_count(), 45);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_ggap::ggap::{GgapConfig, Selection};
///
/// let config = GgapConfig::default()
///     .with_population_size(100)
///     .with_generation_gap(0.5)
///     .with_selection(Selection::Tournament(3))
///     .with_seed(42);
/// assert_eq!(config.replacement_count(), 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GgapConfig {
    /// Number of individuals in the population (N).
    pub population_size: usize,

    /// Fraction of the population replaced each generation, in `(0, 1]`.
    pub generation_gap: f64,

    /// Parent selection strategy.
    pub selection: Selection,

    /// Fitness scaling applied to parents, offspring and the merged population.
    pub scaling: Scaling,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Optional budget of objective evaluations.
    pub max_evaluations: Option<usize>,

    /// Optional wall-clock time limit in milliseconds, checked at the top
    /// of each generation.
    pub time_limit_ms: Option<u64>,

    /// Number of consecutive stagnating generations before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// A generation stagnates when its best objective differs from the
    /// previous generation's best by less than this value.
    pub stagnation_tolerance: f64,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GgapConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generation_gap: 0.9,
            selection: Selection::Roulette,
            scaling: Scaling::default(),
            max_generations: 500,
            max_evaluations: None,
            time_limit_ms: None,
            stagnation_limit: 0,
            stagnation_tolerance: 1e-6,
            seed: None,
        }
    }
}

impl GgapConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation gap. Values above 1 are clamped to 1.
    pub fn with_generation_gap(mut self, gap: f64) -> Self {
        self.generation_gap = gap.min(1.0);
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Sets the fitness scaling.
    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the stagnation tolerance.
    pub fn with_stagnation_tolerance(mut self, tolerance: f64) -> Self {
        self.stagnation_tolerance = tolerance.max(0.0);
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of individuals replaced per generation, `ceil(N · gap)`.
    ///
    /// Returns 0 for an invalid gap; call [`validate`](Self::validate) first.
    pub fn replacement_count(&self) -> usize {
        GenerationalGap::new(self.generation_gap)
            .map(|g| g.replacement_count(self.population_size))
            .unwrap_or(0)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.population_size < 2 {
            return Err(ConfigurationError::PopulationTooSmall(self.population_size));
        }
        GenerationalGap::new(self.generation_gap)?;
        if self.max_generations == 0 {
            return Err(ConfigurationError::InvalidParameter(
                "max_generations must be at least 1".into(),
            ));
        }
        if self.max_evaluations == Some(0) {
            return Err(ConfigurationError::InvalidParameter(
                "max_evaluations must be positive or None".into(),
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigurationError::InvalidParameter(
                "time_limit_ms must be positive or None".into(),
            ));
        }
        if let Selection::Tournament(0) = self.selection {
            return Err(ConfigurationError::InvalidParameter(
                "tournament size must be at least 1".into(),
            ));
        }
        if !(self.stagnation_tolerance >= 0.0) {
            return Err(ConfigurationError::InvalidParameter(
                "stagnation_tolerance must be non-negative".into(),
            ));
        }
        self.scaling.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GgapConfig::default();
        assert_eq!(config.population_size, 50);
        assert!((config.generation_gap - 0.9).abs() < 1e-12);
        assert_eq!(config.selection, Selection::Roulette);
        assert_eq!(config.scaling, Scaling::Linear { alpha: 2.0 });
        assert_eq!(config.max_generations, 500);
        assert!(config.max_evaluations.is_none());
        assert!(config.time_limit_ms.is_none());
        assert_eq!(config.stagnation_limit, 0);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GgapConfig::default()
            .with_population_size(20)
            .with_generation_gap(0.25)
            .with_selection(Selection::Rank)
            .with_scaling(Scaling::Rank { pressure: 1.7 })
            .with_max_generations(10)
            .with_max_evaluations(1000)
            .with_time_limit_ms(500)
            .with_stagnation_limit(5)
            .with_stagnation_tolerance(1e-3)
            .with_seed(7);

        assert_eq!(config.population_size, 20);
        assert_eq!(config.replacement_count(), 5);
        assert_eq!(config.selection, Selection::Rank);
        assert_eq!(config.max_generations, 10);
        assert_eq!(config.max_evaluations, Some(1000));
        assert_eq!(config.time_limit_ms, Some(500));
        assert_eq!(config.stagnation_limit, 5);
        assert_eq!(config.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gap_clamped_and_validated() {
        let config = GgapConfig::default().with_generation_gap(3.0);
        assert_eq!(config.generation_gap, 1.0);
        assert_eq!(config.replacement_count(), config.population_size);

        let config = GgapConfig::default().with_generation_gap(0.0);
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidGap(0.0)));
        assert_eq!(config.replacement_count(), 0);
    }

    #[test]
    fn test_replacement_count_rounds_up() {
        let config = GgapConfig::default()
            .with_population_size(7)
            .with_generation_gap(0.5);
        assert_eq!(config.replacement_count(), 4);
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(
            GgapConfig::default().with_population_size(1).validate(),
            Err(ConfigurationError::PopulationTooSmall(1))
        );
        assert!(GgapConfig::default().with_max_generations(0).validate().is_err());
        assert!(GgapConfig::default().with_max_evaluations(0).validate().is_err());
        assert!(GgapConfig::default().with_time_limit_ms(0).validate().is_err());
        assert!(GgapConfig::default()
            .with_selection(Selection::Tournament(0))
            .validate()
            .is_err());
        assert!(GgapConfig::default()
            .with_scaling(Scaling::Linear { alpha: 0.5 })
            .validate()
            .is_err());
    }
}
