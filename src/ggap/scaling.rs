//! Fitness scaling.
//!
//! Turns signed objective values (already multiplied by the direction sign,
//! so larger is better) and constraint violations into one scalar fitness per
//! row, **higher is better**. Feasible rows always score above infeasible ones.
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and
//!   Machine Learning*, §3 (linear scaling)
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use super::error::{BoxError, ConfigurationError};

/// Maps signed objectives and violations to fitness values.
pub trait FitnessScaler {
    /// Returns one fitness value per row of `signed_objectives`.
    ///
    /// `violations` is either empty (unconstrained) or has one row per
    /// individual; a row is feasible when none of its entries is positive.
    fn scale(
        &self,
        signed_objectives: &[Vec<f64>],
        violations: &[Vec<f64>],
    ) -> Result<Vec<f64>, BoxError>;
}

/// Input errors raised by the built-in scalers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalingError {
    #[error("single-objective scaling expects 1 objective column, row {row} has {columns}")]
    ObjectiveColumns { row: usize, columns: usize },
    #[error("{objectives} objective rows but {violations} violation rows")]
    RowMismatch { objectives: usize, violations: usize },
    #[error("objective value of row {row} is not finite")]
    NonFinite { row: usize },
}

/// Built-in fitness scalers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scaling {
    /// Linear scaling `f = a·s + b` among feasible rows, keeping the mean and
    /// mapping the best row to `alpha` times the mean where possible.
    /// Infeasible rows get minus their total violation.
    Linear { alpha: f64 },

    /// Linear ranking with selection pressure in `[1, 2]`. Equal keys share
    /// the averaged rank.
    Rank { pressure: f64 },
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling::Linear { alpha: 2.0 }
    }
}

impl Scaling {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Scaling::Linear { alpha } if !(alpha > 1.0 && alpha.is_finite()) => Err(
                ConfigurationError::InvalidParameter(format!("linear scaling alpha must be > 1, got {alpha}")),
            ),
            Scaling::Rank { pressure } if !(1.0..=2.0).contains(&pressure) => {
                Err(ConfigurationError::InvalidParameter(format!(
                    "rank pressure must be in [1, 2], got {pressure}"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl FitnessScaler for Scaling {
    fn scale(
        &self,
        signed_objectives: &[Vec<f64>],
        violations: &[Vec<f64>],
    ) -> Result<Vec<f64>, BoxError> {
        let rows = prepare(signed_objectives, violations)?;
        Ok(match *self {
            Scaling::Linear { alpha } => linear(&rows, alpha),
            Scaling::Rank { pressure } => ranked(&rows, pressure),
        })
    }
}

/// Signed objective and total violation of one row.
#[derive(Debug, Clone, Copy)]
struct Row {
    value: f64,
    violation: f64,
}

impl Row {
    fn feasible(&self) -> bool {
        self.violation <= 0.0
    }
}

fn prepare(signed_objectives: &[Vec<f64>], violations: &[Vec<f64>]) -> Result<Vec<Row>, ScalingError> {
    if !violations.is_empty() && violations.len() != signed_objectives.len() {
        return Err(ScalingError::RowMismatch {
            objectives: signed_objectives.len(),
            violations: violations.len(),
        });
    }
    signed_objectives
        .iter()
        .enumerate()
        .map(|(row, objs)| {
            if objs.len() != 1 {
                return Err(ScalingError::ObjectiveColumns {
                    row,
                    columns: objs.len(),
                });
            }
            let value = objs[0];
            if !value.is_finite() {
                return Err(ScalingError::NonFinite { row });
            }
            let violation = violations
                .get(row)
                .map(|v| v.iter().map(|x| x.max(0.0)).sum())
                .unwrap_or(0.0);
            Ok(Row { value, violation })
        })
        .collect()
}

fn linear(rows: &[Row], alpha: f64) -> Vec<f64> {
    let feasible: Vec<f64> = rows.iter().filter(|r| r.feasible()).map(|r| r.value).collect();
    let min = feasible.iter().copied().fold(f64::INFINITY, f64::min);
    let max_u = feasible.iter().map(|v| v - min).fold(0.0, f64::max);
    let avg_u = if feasible.is_empty() {
        0.0
    } else {
        feasible.iter().map(|v| v - min).sum::<f64>() / feasible.len() as f64
    };

    let (a, b) = if max_u - avg_u <= f64::EPSILON * max_u.abs().max(1.0) {
        (0.0, 1.0)
    } else if max_u > alpha * avg_u {
        let spread = max_u - avg_u;
        ((alpha - 1.0) * avg_u / spread, avg_u * (max_u - alpha * avg_u) / spread)
    } else {
        (1.0, 0.0)
    };

    rows.iter()
        .map(|r| {
            if r.feasible() {
                a * (r.value - min) + b
            } else {
                -r.violation
            }
        })
        .collect()
}

fn ranked(rows: &[Row], pressure: f64) -> Vec<f64> {
    let n = rows.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }

    // Worst first: infeasible by decreasing violation, then feasible by value.
    let key = |r: &Row| {
        if r.feasible() {
            (1u8, r.value)
        } else {
            (0u8, -r.violation)
        }
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        let (ci, vi) = key(&rows[i]);
        let (cj, vj) = key(&rows[j]);
        ci.cmp(&cj).then(vi.total_cmp(&vj))
    });

    let mut fitness = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && key(&rows[order[end]]) == key(&rows[order[start]]) {
            end += 1;
        }
        let mean_rank = (start + end - 1) as f64 / 2.0;
        let f = 2.0 - pressure + 2.0 * (pressure - 1.0) * mean_rank / (n - 1) as f64;
        for &idx in &order[start..end] {
            fitness[idx] = f;
        }
        start = end;
    }
    fitness
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    fn is_order_preserving(values: &[f64], fitness: &[f64]) -> bool {
        (0..values.len()).all(|i| {
            (0..values.len()).all(|j| values[i] <= values[j] || fitness[i] > fitness[j])
        })
    }

    #[test]
    fn test_linear_preserves_order() {
        let values = [-3.0, 1.0, 7.5, 0.0, 2.0];
        let f = Scaling::default().scale(&column(&values), &[]).unwrap();
        assert!(is_order_preserving(&values, &f), "{f:?}");
        assert!(f.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_linear_caps_best_at_alpha_mean() {
        // u = [0, 0, 0, 10]: avg 2.5, max 10 > 2 * 2.5 so the best maps to 2 * mean.
        let f = Scaling::Linear { alpha: 2.0 }
            .scale(&column(&[0.0, 0.0, 0.0, 10.0]), &[])
            .unwrap();
        let mean = f.iter().sum::<f64>() / 4.0;
        assert!((mean - 2.5).abs() < 1e-9);
        assert!((f[3] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_all_equal() {
        let f = Scaling::default().scale(&column(&[4.0, 4.0, 4.0]), &[]).unwrap();
        assert_eq!(f, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_infeasible_below_feasible() {
        let values = column(&[100.0, -50.0, 3.0, 0.0]);
        let cv = vec![vec![2.0], vec![0.0], vec![0.5, -1.0], vec![-1.0]];
        for scaler in [Scaling::default(), Scaling::Rank { pressure: 2.0 }] {
            let f = scaler.scale(&values, &cv).unwrap();
            let worst_feasible = f[1].min(f[3]);
            assert!(f[0] < worst_feasible && f[2] < worst_feasible, "{scaler:?}: {f:?}");
            assert!(f[2] > f[0], "less violation must score higher: {f:?}");
        }
    }

    #[test]
    fn test_rank_ties_share_fitness() {
        let f = Scaling::Rank { pressure: 2.0 }
            .scale(&column(&[1.0, 5.0, 1.0, 9.0]), &[])
            .unwrap();
        assert_eq!(f[0], f[2]);
        assert!(f[3] > f[1] && f[1] > f[0]);
        assert!((f[3] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_single_row() {
        let f = Scaling::Rank { pressure: 1.5 }.scale(&column(&[3.0]), &[]).unwrap();
        assert_eq!(f, vec![1.0]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = Scaling::default().scale(&[vec![1.0, 2.0]], &[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScalingError>(),
            Some(&ScalingError::ObjectiveColumns { row: 0, columns: 2 })
        );

        let err = Scaling::default().scale(&column(&[1.0, 2.0]), &[vec![0.0]]).unwrap_err();
        assert!(err.downcast_ref::<ScalingError>().is_some());

        let err = Scaling::default().scale(&column(&[f64::NAN]), &[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScalingError>(),
            Some(&ScalingError::NonFinite { row: 0 })
        );
    }

    #[test]
    fn test_validate() {
        assert!(Scaling::default().validate().is_ok());
        assert!(Scaling::Linear { alpha: 1.0 }.validate().is_err());
        assert!(Scaling::Rank { pressure: 2.5 }.validate().is_err());
        assert!(Scaling::Rank { pressure: 1.0 }.validate().is_ok());
    }
}
