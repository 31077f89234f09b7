//! Error taxonomy for the generational-gap GA.
//!
//! - [`ConfigurationError`]: fatal, raised during setup before any evaluation.
//! - [`GgapError::ContractViolation`]: a collaborator returned a population whose
//!   shape no longer matches what the engine handed it.
//! - [`GgapError::Collaborator`]: a failure raised by the problem, the scaler or
//!   another collaborator, passed through unchanged.

/// Boxed error type returned by user-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Setup-time configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unsupported chromosome encoding '{0}' (expected BG, RI or P)")]
    UnsupportedEncoding(String),
    #[error("population must have at least one chromosome")]
    NoChromosomes,
    #[error("population size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("generation gap must be in (0, 1], got {0}")]
    InvalidGap(f64),
    #[error("invalid field for chromosome {index}: {reason}")]
    InvalidField { index: usize, reason: String },
    #[error("genes of chromosome {index} do not match its encoding")]
    EncodingMismatch { index: usize },
    #[error("individual {row} has {found} chromosomes, expected {expected}")]
    ChromosomeCount {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("individual {row}, chromosome {index}: {reason}")]
    InvalidGenes {
        row: usize,
        index: usize,
        reason: String,
    },
    #[error("default scaling supports exactly one objective, problem declares {0}")]
    ObjectiveCount(usize),
    #[error("problem dimensionality must be positive")]
    ZeroDimension,
    #[error("problem must declare at least one objective")]
    NoObjectives,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors surfaced by a generational-gap run.
#[derive(Debug, thiserror::Error)]
pub enum GgapError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("contract violation: {0}")]
    ContractViolation(String),
    #[error(transparent)]
    Collaborator(BoxError),
}

impl GgapError {
    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        GgapError::ContractViolation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_converts() {
        let err: GgapError = ConfigurationError::NoChromosomes.into();
        assert!(matches!(err, GgapError::Configuration(ConfigurationError::NoChromosomes)));
        assert_eq!(
            err.to_string(),
            "configuration error: population must have at least one chromosome"
        );
    }

    #[test]
    fn test_collaborator_is_transparent() {
        let inner: BoxError = "evaluator exploded".into();
        let err = GgapError::Collaborator(inner);
        assert_eq!(err.to_string(), "evaluator exploded");
    }
}
