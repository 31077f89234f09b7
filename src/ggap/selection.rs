//! Parent selection over scaled fitness.
//!
//! Selection draws row indices with replacement. Fitness is scaled so that
//! **higher is better**; every strategy gives a row at least the selection
//! probability of any row with lower fitness.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use rand::Rng;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_ggap::ggap::Selection;
/// use u_ggap::random::create_rng;
///
/// let mut rng = create_rng(42);
/// let picks = Selection::Roulette.select(&[1.0, 2.0, 3.0], 5, &mut rng);
/// assert_eq!(picks.len(), 5);
/// assert!(picks.iter().all(|&i| i < 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Negative fitness values are shifted so the worst row keeps a tiny,
    /// non-zero weight.
    ///
    /// # Complexity
    /// O(n) setup, O(log n) per draw
    #[default]
    Roulette,

    /// Tournament selection: pick `k` rows at random, keep the fittest.
    ///
    /// # Complexity
    /// O(k) per draw
    Tournament(usize),

    /// Linear rank selection: weight `n - rank`, rank 0 being the fittest.
    ///
    /// # Complexity
    /// O(n log n) setup, O(log n) per draw
    Rank,
}

impl Selection {
    /// Draws `count` row indices into `fitness`, with replacement.
    ///
    /// # Panics
    /// Panics if `fitness` is empty and `count > 0`.
    pub fn select<R: Rng>(&self, fitness: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }
        assert!(!fitness.is_empty(), "cannot select from empty population");

        match self {
            Selection::Roulette => roulette(fitness, count, rng),
            Selection::Tournament(k) => (0..count).map(|_| tournament(fitness, *k, rng)).collect(),
            Selection::Rank => rank(fitness, count, rng),
        }
    }
}

/// Tournament selection: pick k random rows, return the fittest.
fn tournament<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = fitness.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if fitness[idx] > fitness[best_idx] {
            best_idx = idx;
        }
    }
    best_idx
}

/// Roulette wheel selection over non-negative weights.
fn roulette<R: Rng>(fitness: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    let epsilon = 1e-10;
    let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = fitness
        .iter()
        .map(|&f| {
            let w = if min < 0.0 { f - min + epsilon } else { f };
            if w.is_finite() && w > 0.0 {
                w
            } else {
                0.0
            }
        })
        .collect();
    spin(&weights, count, rng)
}

/// Rank-based selection using linear ranking. Equal fitness shares the
/// averaged rank weight.
fn rank<R: Rng>(fitness: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    let n = fitness.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

    let mut weights = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let head = fitness[order[start]];
        let end = start
            + order[start..]
                .iter()
                .take_while(|&&i| fitness[i].total_cmp(&head).is_eq())
                .count();
        // Mean of n - p over positions p in start..end.
        let weight = n as f64 - (start + end - 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            weights[idx] = weight;
        }
        start = end;
    }
    spin(&weights, count, rng)
}

/// Draws `count` indices proportionally to `weights`; uniform if all are zero.
fn spin<R: Rng>(weights: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    let n = weights.len();
    let mut cumulative = Vec::with_capacity(n);
    let mut total = 0.0;
    for &w in weights {
        total += w;
        cumulative.push(total);
    }

    if total <= 0.0 || !total.is_finite() {
        return (0..count).map(|_| rng.random_range(0..n)).collect();
    }

    (0..count)
        .map(|_| {
            let threshold = rng.random_range(0.0..total);
            cumulative
                .partition_point(|&c| c <= threshold)
                .min(n - 1) // floating-point fallback
        })
        .collect()
}
