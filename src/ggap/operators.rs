//! Row-level crossover and mutation primitives.
//!
//! These act on one gene vector (mutation) or one pair of gene vectors
//! (crossover). [`VariationPipeline`](super::VariationPipeline) decides
//! which primitive each chromosome segment uses.
//!
//! # Crossover
//!
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), for permutations
//! - [`two_point_crossover`]: exchange the genes between two cut points
//!
//! # Mutation
//!
//! - [`invert_mutation`]: reverse a random segment (2-opt move)
//! - [`breeder_mutation`]: Mühlenbein & Schlierkamp-Voosen (1993) breeder GA mutation
//! - [`bit_flip_mutation`]: independent bit flips
//!
//! # References
//!
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Mühlenbein & Schlierkamp-Voosen (1993), "Predictive Models for the Breeder Genetic Algorithm"

use rand::Rng;

use super::encoding::Field;

// ============================================================================
// Crossover operators
// ============================================================================

/// Partially Mapped Crossover (PMX) for permutations of `0..n`.
///
/// 1. Select a random segment `[start, end]`
/// 2. Each child keeps its template's segment
/// 3. Donor values displaced by the segment are placed by following the
///    position mapping until a free slot outside the segment is found
/// 4. Remaining slots are filled from the donor
///
/// # Panics
/// Panics if parents have different lengths.
pub fn pmx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");

    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);

    (
        pmx_build_child(parent1, parent2, start, end),
        pmx_build_child(parent2, parent1, start, end),
    )
}

fn pmx_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut placed = vec![false; n];
    let mut donor_pos = vec![0usize; n];
    for (pos, &v) in donor.iter().enumerate() {
        donor_pos[v] = pos;
    }

    for i in start..=end {
        child[i] = template[i];
        placed[template[i]] = true;
    }

    for i in start..=end {
        let value = donor[i];
        if placed[value] {
            continue;
        }
        let mut pos = i;
        loop {
            let next = donor_pos[template[pos]];
            if next < start || next > end {
                child[next] = value;
                placed[value] = true;
                break;
            }
            pos = next;
        }
    }

    for (slot, &v) in child.iter_mut().zip(donor) {
        if *slot == usize::MAX {
            *slot = v;
        }
    }

    child
}

/// Two-point crossover: swaps the genes in `[a, b)` between both rows, in place.
///
/// # Panics
/// Panics if the rows have different lengths.
pub fn two_point_crossover<T, R: Rng>(row1: &mut [T], row2: &mut [T], rng: &mut R) {
    let n = row1.len();
    assert_eq!(n, row2.len(), "rows must have equal length");
    if n < 2 {
        return;
    }
    let a = rng.random_range(0..=n);
    let b = rng.random_range(0..=n);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    row1[lo..hi].swap_with_slice(&mut row2[lo..hi]);
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Invert mutation: reverse a random segment.
pub fn invert_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    perm[start..=end].reverse();
}

/// Breeder GA mutation for real/integer genes.
///
/// Each gene mutates with probability `rate`:
/// `x' = x ± shrink · 0.5 · (ub − lb) · δ` where
/// `δ = Σ_{k < gradient} a_k · 2^{−k}` and `a_k` is 1 with probability `1 / gradient`.
/// Results are clamped into the field bounds; integer variables are rounded.
pub fn breeder_mutation<R: Rng>(
    genes: &mut [f64],
    field: &Field,
    rate: f64,
    shrink: f64,
    gradient: u32,
    rng: &mut R,
) {
    let rate = rate.clamp(0.0, 1.0);
    let gradient = gradient.max(1);
    let p_bit = 1.0 / f64::from(gradient);

    for (var, x) in genes.iter_mut().enumerate() {
        if !rng.random_bool(rate) {
            continue;
        }
        let (lb, ub) = (field.lower()[var], field.upper()[var]);
        let radius = shrink * 0.5 * (ub - lb);
        let delta: f64 = (0..gradient)
            .filter(|_| rng.random_bool(p_bit))
            .map(|k| 0.5f64.powi(k as i32))
            .sum();
        let step = if rng.random_bool(0.5) { radius * delta } else { -radius * delta };
        let mut y = (*x + step).clamp(lb, ub);
        if field.is_integer(var) {
            y = y.round().clamp(lb, ub);
        }
        *x = y;
    }
}

/// Flips each bit independently with probability `rate`.
pub fn bit_flip_mutation<R: Rng>(bits: &mut [u8], rate: f64, rng: &mut R) {
    let rate = rate.clamp(0.0, 1.0);
    for bit in bits.iter_mut() {
        if rng.random_bool(rate) {
            *bit ^= 1;
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// Check that a slice is a valid permutation of 0..n.
    fn is_valid_permutation(perm: &[usize], n: usize) -> bool {
        if perm.len() != n {
            return false;
        }
        let set: HashSet<usize> = perm.iter().copied().collect();
        set.len() == n && perm.iter().all(|&v| v < n)
    }

    // ---- PMX ----

    #[test]
    fn test_pmx_produces_valid_permutations() {
        let mut rng = create_rng(42);
        let p1 = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = vec![3, 7, 5, 1, 6, 0, 2, 4];

        for _ in 0..100 {
            let (c1, c2) = pmx_crossover(&p1, &p2, &mut rng);
            assert!(is_valid_permutation(&c1, 8), "PMX child1 not valid: {c1:?}");
            assert!(is_valid_permutation(&c2, 8), "PMX child2 not valid: {c2:?}");
        }
    }

    #[test]
    fn test_pmx_identical_parents() {
        let mut rng = create_rng(42);
        let p = vec![0, 1, 2, 3, 4];
        let (c1, c2) = pmx_crossover(&p, &p, &mut rng);
        assert_eq!(c1, p);
        assert_eq!(c2, p);
    }

    #[test]
    fn test_pmx_single_element() {
        let mut rng = create_rng(42);
        let (c1, c2) = pmx_crossover(&[0], &[0], &mut rng);
        assert_eq!(c1, vec![0]);
        assert_eq!(c2, vec![0]);
    }

    #[test]
    fn test_pmx_known_segment() {
        // Segment [3, 5] of p1 is kept; 2 and 6 from p2's segment are mapped out.
        let p1 = [0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = [7, 6, 5, 4, 3, 2, 1, 0];
        let child = pmx_build_child(&p1, &p2, 3, 5);
        assert_eq!(&child[3..=5], &[3, 4, 5]);
        assert!(is_valid_permutation(&child, 8));
        assert_eq!(child[0], 7);
        assert_eq!(child[7], 0);
    }

    proptest! {
        #[test]
        fn prop_pmx_valid(seed in any::<u64>(), n in 1usize..30) {
            let mut rng = create_rng(seed);
            let p1: Vec<usize> = (0..n).collect();
            let mut p2 = p1.clone();
            p2.reverse();
            let (c1, c2) = pmx_crossover(&p1, &p2, &mut rng);
            prop_assert!(is_valid_permutation(&c1, n));
            prop_assert!(is_valid_permutation(&c2, n));
        }

        #[test]
        fn prop_invert_keeps_symbols(seed in any::<u64>(), n in 0usize..30) {
            let mut rng = create_rng(seed);
            let mut perm: Vec<usize> = (0..n).collect();
            invert_mutation(&mut perm, &mut rng);
            prop_assert!(is_valid_permutation(&perm, n));
        }
    }

    // ---- Two-point ----

    #[test]
    fn test_two_point_exchanges_contiguous_block() {
        let mut rng = create_rng(7);
        for _ in 0..100 {
            let mut a = vec![0u8; 10];
            let mut b = vec![1u8; 10];
            two_point_crossover(&mut a, &mut b, &mut rng);
            for i in 0..10 {
                assert_ne!(a[i], b[i], "positions must stay complementary");
            }
            // Swapped genes form one contiguous run.
            let swapped: Vec<usize> = (0..10).filter(|&i| a[i] == 1).collect();
            if let (Some(&first), Some(&last)) = (swapped.first(), swapped.last()) {
                assert_eq!(last - first + 1, swapped.len());
            }
        }
    }

    #[test]
    fn test_two_point_short_rows_untouched() {
        let mut rng = create_rng(7);
        let mut a = vec![1.0];
        let mut b = vec![2.0];
        two_point_crossover(&mut a, &mut b, &mut rng);
        assert_eq!((a[0], b[0]), (1.0, 2.0));
    }

    // ---- Invert ----

    #[test]
    fn test_invert_eventually_changes() {
        let mut rng = create_rng(42);
        let original = vec![0, 1, 2, 3, 4];
        let changed = (0..100).any(|_| {
            let mut perm = original.clone();
            invert_mutation(&mut perm, &mut rng);
            perm != original
        });
        assert!(changed, "invert should change the permutation eventually");
    }

    // ---- Breeder ----

    #[test]
    fn test_breeder_respects_bounds() {
        let mut rng = create_rng(3);
        let field = Field::real(vec![-1.0, 0.0, 10.0], vec![1.0, 5.0, 10.5])
            .with_integer(vec![false, true, false]);
        for _ in 0..500 {
            let mut genes = vec![0.9, 4.0, 10.25];
            breeder_mutation(&mut genes, &field, 1.0, 0.5, 20, &mut rng);
            assert!((-1.0..=1.0).contains(&genes[0]));
            assert!((0.0..=5.0).contains(&genes[1]));
            assert_eq!(genes[1], genes[1].round());
            assert!((10.0..=10.5).contains(&genes[2]));
        }
    }

    #[test]
    fn test_breeder_zero_rate_is_noop() {
        let mut rng = create_rng(3);
        let field = Field::real(vec![0.0; 3], vec![1.0; 3]);
        let mut genes = vec![0.1, 0.2, 0.3];
        breeder_mutation(&mut genes, &field, 0.0, 0.5, 20, &mut rng);
        assert_eq!(genes, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_breeder_step_is_bounded_by_radius() {
        let mut rng = create_rng(11);
        let field = Field::real(vec![-100.0], vec![100.0]);
        // radius = 0.5 * 0.5 * 200 = 50, delta < 2
        for _ in 0..500 {
            let mut genes = vec![0.0];
            breeder_mutation(&mut genes, &field, 1.0, 0.5, 20, &mut rng);
            assert!(genes[0].abs() < 100.0);
        }
    }

    // ---- Bit flip ----

    #[test]
    fn test_bit_flip_rates() {
        let mut rng = create_rng(5);
        let mut bits = vec![0u8, 1, 0, 1];
        bit_flip_mutation(&mut bits, 0.0, &mut rng);
        assert_eq!(bits, vec![0, 1, 0, 1]);
        bit_flip_mutation(&mut bits, 1.0, &mut rng);
        assert_eq!(bits, vec![1, 0, 1, 0]);
    }

    // ---- Random segment helper ----

    #[test]
    fn test_random_segment_bounds() {
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let (start, end) = random_segment(10, &mut rng);
            assert!(start <= end);
            assert!(end < 10);
        }
    }
}
