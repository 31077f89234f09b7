//! Per-chromosome variation.
//!
//! Every chromosome segment gets one crossover and one mutation operator,
//! chosen once from its [`Encoding`]:
//!
//! | Encoding | Crossover        | Mutation                                  |
//! |----------|------------------|-------------------------------------------|
//! | `P`      | PMX, rate 1      | inversion, rate 1                         |
//! | `RI`     | two-point, rate 1| breeder GA, rate `1/dim`, shrink 0.5, gradient 20 |
//! | `BG`     | two-point, rate 1| bit flip, rate `1/len`                    |
//!
//! Segments are varied independently and in order; phenotypes are decoded
//! again once all segments have been varied.

use rand::Rng;

use super::encoding::Encoding;
use super::error::{ConfigurationError, GgapError};
use super::operators::{
    bit_flip_mutation, breeder_mutation, invert_mutation, pmx_crossover, two_point_crossover,
};
use super::population::{Genes, Population};

/// Shrink factor of the breeder mutation used for `RI` segments.
pub const BREEDER_SHRINK: f64 = 0.5;

/// Gradient (number of `δ` terms) of the breeder mutation used for `RI` segments.
pub const BREEDER_GRADIENT: u32 = 20;

/// Crossover operator applied to one chromosome segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recombination {
    /// Partially mapped crossover for permutations.
    PartiallyMapped { rate: f64 },
    /// Two-point crossover for bit strings and real vectors.
    TwoPoint { rate: f64 },
}

impl Recombination {
    /// Recombines consecutive row pairs `(0, 1), (2, 3), …` of segment
    /// `chromosome`, each pair with probability `rate`. An odd last row is kept.
    pub fn apply<R: Rng>(
        &self,
        population: &mut Population,
        chromosome: usize,
        rng: &mut R,
    ) -> Result<(), GgapError> {
        let rate = match *self {
            Recombination::PartiallyMapped { rate } | Recombination::TwoPoint { rate } => {
                rate.clamp(0.0, 1.0)
            }
        };

        for pair in population.individuals_mut().chunks_exact_mut(2) {
            if !rng.random_bool(rate) {
                continue;
            }
            let (left, right) = pair.split_at_mut(1);
            let a = left[0].chromosome_mut(chromosome);
            let b = right[0].chromosome_mut(chromosome);
            match (self, a, b) {
                (Recombination::PartiallyMapped { .. }, Genes::Permutation(x), Genes::Permutation(y)) => {
                    let (c1, c2) = pmx_crossover(x, y, rng);
                    *x = c1;
                    *y = c2;
                }
                (Recombination::TwoPoint { .. }, Genes::Binary(x), Genes::Binary(y)) => {
                    two_point_crossover(x, y, rng)
                }
                (Recombination::TwoPoint { .. }, Genes::Real(x), Genes::Real(y)) => {
                    two_point_crossover(x, y, rng)
                }
                _ => return Err(ConfigurationError::EncodingMismatch { index: chromosome }.into()),
            }
        }
        Ok(())
    }
}

/// Mutation operator applied to one chromosome segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    /// Reverses a random segment of each row with probability `rate`.
    Inversion { rate: f64 },
    /// Breeder GA mutation, per gene with probability `rate`.
    Breeder { rate: f64, shrink: f64, gradient: u32 },
    /// Independent bit flips; `None` means `1 / segment length`.
    BitFlip { rate: Option<f64> },
}

impl Mutation {
    /// Mutates segment `chromosome` of every row.
    pub fn apply<R: Rng>(
        &self,
        population: &mut Population,
        chromosome: usize,
        rng: &mut R,
    ) -> Result<(), GgapError> {
        let (fields, rows) = population.split_mut();
        let field = fields
            .get(chromosome)
            .ok_or_else(|| GgapError::contract(format!("no chromosome {chromosome}")))?;

        for ind in rows.iter_mut() {
            match (*self, ind.chromosome_mut(chromosome)) {
                (Mutation::Inversion { rate }, Genes::Permutation(perm)) => {
                    if rng.random_bool(rate.clamp(0.0, 1.0)) {
                        invert_mutation(perm, rng);
                    }
                }
                (Mutation::Breeder { rate, shrink, gradient }, Genes::Real(genes)) => {
                    breeder_mutation(genes, field, rate, shrink, gradient, rng);
                }
                (Mutation::BitFlip { rate }, Genes::Binary(bits)) => {
                    let rate = rate.unwrap_or(1.0 / bits.len().max(1) as f64);
                    bit_flip_mutation(bits, rate, rng);
                }
                _ => return Err(ConfigurationError::EncodingMismatch { index: chromosome }.into()),
            }
        }
        Ok(())
    }
}

/// Crossover/mutation pair for one encoding.
///
/// `dim` is the problem dimensionality; real-valued genes mutate with
/// probability `1 / dim`.
pub fn operators_for(encoding: Encoding, dim: usize) -> (Recombination, Mutation) {
    match encoding {
        Encoding::Permutation => (
            Recombination::PartiallyMapped { rate: 1.0 },
            Mutation::Inversion { rate: 1.0 },
        ),
        Encoding::RealInteger => (
            Recombination::TwoPoint { rate: 1.0 },
            Mutation::Breeder {
                rate: 1.0 / dim.max(1) as f64,
                shrink: BREEDER_SHRINK,
                gradient: BREEDER_GRADIENT,
            },
        ),
        Encoding::BinaryGray => (
            Recombination::TwoPoint { rate: 1.0 },
            Mutation::BitFlip { rate: None },
        ),
    }
}

/// Crossover and mutation operators for every chromosome segment, fixed at setup.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationPipeline {
    operators: Vec<(Recombination, Mutation)>,
}

impl VariationPipeline {
    /// Builds the pipeline for a population's segment layout.
    pub fn new(population: &Population, dim: usize) -> Result<Self, ConfigurationError> {
        population.validate_shape()?;
        Self::for_encodings(&population.encodings(), dim)
    }

    /// Builds the pipeline from encoding tags such as `["P", "RI"]`.
    pub fn from_tags(tags: &[&str], dim: usize) -> Result<Self, ConfigurationError> {
        let encodings = tags
            .iter()
            .map(|t| Encoding::from_tag(t))
            .collect::<Result<Vec<_>, _>>()?;
        Self::for_encodings(&encodings, dim)
    }

    pub fn for_encodings(encodings: &[Encoding], dim: usize) -> Result<Self, ConfigurationError> {
        if encodings.is_empty() {
            return Err(ConfigurationError::NoChromosomes);
        }
        if dim == 0 {
            return Err(ConfigurationError::ZeroDimension);
        }
        Ok(Self {
            operators: encodings.iter().map(|&e| operators_for(e, dim)).collect(),
        })
    }

    pub fn operators(&self) -> &[(Recombination, Mutation)] {
        &self.operators
    }

    /// Crossover then mutation on every segment in order, then decode.
    ///
    /// Only `offspring` is touched.
    pub fn apply<R: Rng>(&self, offspring: &mut Population, rng: &mut R) -> Result<(), GgapError> {
        if offspring.chromosome_count() != self.operators.len() {
            return Err(GgapError::contract(format!(
                "offspring has {} chromosomes, pipeline expects {}",
                offspring.chromosome_count(),
                self.operators.len()
            )));
        }
        for (chromosome, (recombination, mutation)) in self.operators.iter().enumerate() {
            recombination.apply(offspring, chromosome, rng)?;
            mutation.apply(offspring, chromosome, rng)?;
        }
        offspring.decode();
        Ok(())
    }
}
