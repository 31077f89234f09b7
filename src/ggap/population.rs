//! Multi-chromosome population storage.
//!
//! A [`Population`] is an arena of row records: every [`Individual`] carries
//! its genes for each chromosome segment together with its phenotype,
//! objective values, constraint violations and fitness. Any operation that
//! selects, reorders or overwrites rows moves all of these fields together.

use rand::seq::SliceRandom;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::encoding::{Direction, Encoding, Field};
use super::error::{ConfigurationError, GgapError};

/// Genes of one chromosome segment for one individual.
#[derive(Debug, Clone, PartialEq)]
pub enum Genes {
    /// One byte per bit, each `0` or `1`.
    Binary(Vec<u8>),
    Real(Vec<f64>),
    Permutation(Vec<usize>),
}

impl Genes {
    /// Encoding this gene vector belongs to.
    pub fn encoding(&self) -> Encoding {
        match self {
            Genes::Binary(_) => Encoding::BinaryGray,
            Genes::Real(_) => Encoding::RealInteger,
            Genes::Permutation(_) => Encoding::Permutation,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Genes::Binary(g) => g.len(),
            Genes::Real(g) => g.len(),
            Genes::Permutation(g) => g.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Genes::Binary(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            Genes::Real(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_permutation(&self) -> Option<&[usize]> {
        match self {
            Genes::Permutation(g) => Some(g),
            _ => None,
        }
    }
}

/// Result of evaluating one individual.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    /// Raw objective values, one per objective.
    pub objectives: Vec<f64>,
    /// Constraint violations; a value `> 0` means the constraint is violated.
    pub violations: Vec<f64>,
}

impl Evaluation {
    pub fn unconstrained(objectives: Vec<f64>) -> Self {
        Self {
            objectives,
            violations: Vec::new(),
        }
    }

    pub fn constrained(objectives: Vec<f64>, violations: Vec<f64>) -> Self {
        Self {
            objectives,
            violations,
        }
    }
}

/// One row of a [`Population`].
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    chromosomes: Vec<Genes>,
    phenotype: Vec<f64>,
    objectives: Vec<f64>,
    violations: Vec<f64>,
    fitness: f64,
}

impl Individual {
    /// Creates an unevaluated individual from its chromosome segments.
    pub fn new(chromosomes: Vec<Genes>) -> Self {
        Self {
            chromosomes,
            phenotype: Vec::new(),
            objectives: Vec::new(),
            violations: Vec::new(),
            fitness: f64::NEG_INFINITY,
        }
    }

    pub fn chromosomes(&self) -> &[Genes] {
        &self.chromosomes
    }

    pub fn chromosome(&self, index: usize) -> Option<&Genes> {
        self.chromosomes.get(index)
    }

    pub(crate) fn chromosome_mut(&mut self, index: usize) -> &mut Genes {
        &mut self.chromosomes[index]
    }

    /// Decoded decision variables of all segments, concatenated in segment order.
    pub fn phenotype(&self) -> &[f64] {
        &self.phenotype
    }

    pub fn objectives(&self) -> &[f64] {
        &self.objectives
    }

    pub fn violations(&self) -> &[f64] {
        &self.violations
    }

    /// Scaled fitness; higher is better.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.objectives = evaluation.objectives;
        self.violations = evaluation.violations;
    }

    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Sum of the positive constraint violations.
    pub fn total_violation(&self) -> f64 {
        self.violations.iter().map(|v| v.max(0.0)).sum()
    }

    pub fn is_feasible(&self) -> bool {
        self.total_violation() <= 0.0
    }
}

/// Ordered collection of individuals sharing the same chromosome layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    fields: Vec<Field>,
    individuals: Vec<Individual>,
}

impl Population {
    /// Creates an empty population with the given segment layout.
    pub fn new(fields: Vec<Field>) -> Result<Self, ConfigurationError> {
        if fields.is_empty() {
            return Err(ConfigurationError::NoChromosomes);
        }
        for (index, field) in fields.iter().enumerate() {
            field.validate(index)?;
        }
        Ok(Self {
            fields,
            individuals: Vec::new(),
        })
    }

    /// Creates `size` random individuals and decodes them.
    pub fn random<R: Rng>(
        fields: Vec<Field>,
        size: usize,
        rng: &mut R,
    ) -> Result<Self, ConfigurationError> {
        let mut population = Self::new(fields)?;
        population.init_chromosomes(size, rng);
        Ok(population)
    }

    /// Builds a population from explicit rows, e.g. a seed population
    /// carrying prior knowledge. Phenotypes are recomputed from the genes.
    pub fn from_individuals(
        fields: Vec<Field>,
        individuals: Vec<Individual>,
    ) -> Result<Self, ConfigurationError> {
        let mut population = Self::new(fields)?;
        population.individuals = individuals;
        population.validate_shape()?;
        population.decode();
        Ok(population)
    }

    /// Replaces all rows with `size` random individuals.
    ///
    /// Bit strings are uniform, real genes uniform within bounds (rounded for
    /// integer variables), permutations uniformly shuffled.
    pub fn init_chromosomes<R: Rng>(&mut self, size: usize, rng: &mut R) {
        let individuals = (0..size)
            .map(|_| {
                let chromosomes = self.fields.iter().map(|f| random_genes(f, rng)).collect();
                Individual::new(chromosomes)
            })
            .collect();
        self.individuals = individuals;
        self.decode();
    }

    /// Checks that every row has one gene vector per segment, of the right
    /// encoding and length, with well-formed values: bits are 0 or 1 and
    /// permutations hold every symbol of `0..len` exactly once.
    pub fn validate_shape(&self) -> Result<(), ConfigurationError> {
        for (row, ind) in self.individuals.iter().enumerate() {
            if ind.chromosomes.len() != self.fields.len() {
                return Err(ConfigurationError::ChromosomeCount {
                    row,
                    found: ind.chromosomes.len(),
                    expected: self.fields.len(),
                });
            }
            for (index, (genes, field)) in ind.chromosomes.iter().zip(&self.fields).enumerate() {
                if genes.encoding() != field.encoding() || genes.len() != field.genome_len() {
                    return Err(ConfigurationError::EncodingMismatch { index });
                }
                if let Some(reason) = malformed(genes) {
                    return Err(ConfigurationError::InvalidGenes { row, index, reason });
                }
            }
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn chromosome_count(&self) -> usize {
        self.fields.len()
    }

    pub fn encodings(&self) -> Vec<Encoding> {
        self.fields.iter().map(Field::encoding).collect()
    }

    /// Number of phenotype columns.
    pub fn phenotype_width(&self) -> usize {
        self.fields.iter().map(Field::len).sum()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Mutable access to the rows. The row count cannot change through this slice.
    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    /// Segment layout and mutable rows at the same time.
    pub(crate) fn split_mut(&mut self) -> (&[Field], &mut [Individual]) {
        (&self.fields, &mut self.individuals)
    }

    pub fn get(&self, row: usize) -> Option<&Individual> {
        self.individuals.get(row)
    }

    pub fn fitness(&self) -> Vec<f64> {
        self.individuals.iter().map(|ind| ind.fitness).collect()
    }

    /// Objective values multiplied by the direction signs, so larger is better.
    pub fn signed_objectives(&self, directions: &[Direction]) -> Vec<Vec<f64>> {
        self.individuals
            .iter()
            .map(|ind| {
                ind.objectives
                    .iter()
                    .zip(directions)
                    .map(|(&v, d)| v * d.sign())
                    .collect()
            })
            .collect()
    }

    pub fn violations(&self) -> Vec<Vec<f64>> {
        self.individuals.iter().map(|ind| ind.violations.clone()).collect()
    }

    pub(crate) fn set_fitness(&mut self, fitness: &[f64]) -> Result<(), GgapError> {
        if fitness.len() != self.individuals.len() {
            return Err(GgapError::contract(format!(
                "scaler returned {} fitness values for {} individuals",
                fitness.len(),
                self.individuals.len()
            )));
        }
        for (ind, &f) in self.individuals.iter_mut().zip(fitness) {
            ind.set_fitness(f);
        }
        Ok(())
    }

    /// Recomputes every phenotype from the genes.
    pub fn decode(&mut self) {
        let fields = &self.fields;
        for ind in &mut self.individuals {
            let mut phenotype = Vec::with_capacity(fields.iter().map(Field::len).sum());
            for (genes, field) in ind.chromosomes.iter().zip(fields) {
                decode_into(genes, field, &mut phenotype);
            }
            ind.phenotype = phenotype;
        }
    }

    /// Deep copy of the rows at `rows`, in that order; repeats allowed.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Population, GgapError> {
        let individuals = rows
            .iter()
            .map(|&r| {
                self.individuals.get(r).cloned().ok_or_else(|| {
                    GgapError::contract(format!("row {r} out of range for size {}", self.size()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Population {
            fields: self.fields.clone(),
            individuals,
        })
    }

    /// Rows of `self` followed by rows of `other`.
    pub fn concat(&self, other: &Population) -> Result<Population, GgapError> {
        if self.fields != other.fields {
            return Err(GgapError::contract(
                "cannot concatenate populations with different chromosome layouts",
            ));
        }
        let mut individuals = Vec::with_capacity(self.size() + other.size());
        individuals.extend_from_slice(&self.individuals);
        individuals.extend_from_slice(&other.individuals);
        Ok(Population {
            fields: self.fields.clone(),
            individuals,
        })
    }

    /// Keeps the first `len` rows.
    pub fn truncate(&mut self, len: usize) {
        self.individuals.truncate(len);
    }

    /// Overwrites `self[dst[k]]` with a copy of `src[src_rows[k]]` for every `k`.
    pub fn overwrite_rows(
        &mut self,
        dst: &[usize],
        src: &Population,
        src_rows: &[usize],
    ) -> Result<(), GgapError> {
        if dst.len() != src_rows.len() {
            return Err(GgapError::contract(format!(
                "{} destination rows but {} source rows",
                dst.len(),
                src_rows.len()
            )));
        }
        if self.fields.len() != src.fields.len() {
            return Err(GgapError::contract(format!(
                "source has {} chromosomes, destination {}",
                src.fields.len(),
                self.fields.len()
            )));
        }
        if let Some(&r) = dst.iter().find(|&&r| r >= self.size()) {
            return Err(GgapError::contract(format!(
                "destination row {r} out of range for size {}",
                self.size()
            )));
        }
        if let Some(&r) = src_rows.iter().find(|&&r| r >= src.size()) {
            return Err(GgapError::contract(format!(
                "source row {r} out of range for size {}",
                src.size()
            )));
        }
        for (&d, &s) in dst.iter().zip(src_rows) {
            self.individuals[d].clone_from(&src.individuals[s]);
        }
        Ok(())
    }

    /// Evaluates every row independently from its phenotype.
    ///
    /// Runs on the rayon thread pool when the `parallel` feature is enabled.
    pub fn evaluate_rows<F>(&mut self, f: F)
    where
        F: Fn(&[f64]) -> Evaluation + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        self.individuals.par_iter_mut().for_each(|ind| {
            let evaluation = f(&ind.phenotype);
            ind.set_evaluation(evaluation);
        });

        #[cfg(not(feature = "parallel"))]
        for ind in self.individuals.iter_mut() {
            let evaluation = f(&ind.phenotype);
            ind.set_evaluation(evaluation);
        }
    }

    /// Checks that every row carries exactly `objectives` objective values.
    pub fn check_evaluated(&self, objectives: usize) -> Result<(), GgapError> {
        match self
            .individuals
            .iter()
            .position(|ind| ind.objectives.len() != objectives)
        {
            Some(row) => Err(GgapError::contract(format!(
                "row {row} has {} objective values, expected {objectives}",
                self.individuals[row].objectives.len()
            ))),
            None => Ok(()),
        }
    }
}

/// Describes the first malformed value of `genes`, if any.
fn malformed(genes: &Genes) -> Option<String> {
    match genes {
        Genes::Binary(bits) => bits
            .iter()
            .position(|&b| b > 1)
            .map(|i| format!("bit {i} is {}, expected 0 or 1", bits[i])),
        Genes::Real(values) => values
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| format!("gene {i} is not finite")),
        Genes::Permutation(perm) => {
            let mut seen = vec![false; perm.len()];
            for &s in perm {
                match seen.get_mut(s) {
                    Some(slot) if !*slot => *slot = true,
                    Some(_) => return Some(format!("symbol {s} appears more than once")),
                    None => return Some(format!("symbol {s} is outside 0..{}", perm.len())),
                }
            }
            None
        }
    }
}

fn random_genes<R: Rng>(field: &Field, rng: &mut R) -> Genes {
    match field.encoding() {
        Encoding::BinaryGray => Genes::Binary(
            (0..field.genome_len())
                .map(|_| u8::from(rng.random_bool(0.5)))
                .collect(),
        ),
        Encoding::RealInteger => Genes::Real(
            field
                .lower()
                .iter()
                .zip(field.upper())
                .enumerate()
                .map(|(var, (&lb, &ub))| {
                    let x = lb + rng.random::<f64>() * (ub - lb);
                    if field.is_integer(var) {
                        x.round().clamp(lb, ub)
                    } else {
                        x
                    }
                })
                .collect(),
        ),
        Encoding::Permutation => {
            let mut perm: Vec<usize> = (0..field.len()).collect();
            perm.shuffle(rng);
            Genes::Permutation(perm)
        }
    }
}

fn decode_into(genes: &Genes, field: &Field, out: &mut Vec<f64>) {
    match genes {
        Genes::Binary(bits) => {
            let mut offset = 0;
            for (var, &n) in field.bits().iter().enumerate() {
                let chunk = &bits[offset..offset + n];
                offset += n;
                let k = bits_to_integer(chunk, field.is_gray());
                let (lb, ub) = (field.lower()[var], field.upper()[var]);
                let max = ((1u64 << n) - 1) as f64;
                let x = lb + (k as f64) * (ub - lb) / max;
                out.push(if field.is_integer(var) {
                    x.round().clamp(lb, ub)
                } else {
                    x
                });
            }
        }
        Genes::Real(values) => {
            out.extend(values.iter().enumerate().map(|(var, &x)| {
                if field.is_integer(var) {
                    x.round()
                } else {
                    x
                }
            }));
        }
        Genes::Permutation(perm) => out.extend(perm.iter().map(|&s| s as f64)),
    }
}

/// Reads a big-endian bit chunk, undoing Gray coding when `gray` is set.
fn bits_to_integer(chunk: &[u8], gray: bool) -> u64 {
    let mut value = 0u64;
    let mut prev = 0u8;
    for &g in chunk {
        let b = if gray { prev ^ (g & 1) } else { g & 1 };
        prev = b;
        value = (value << 1) | u64::from(b);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn mixed_fields() -> Vec<Field> {
        vec![
            Field::permutation(5),
            Field::real(vec![-1.0, 0.0], vec![1.0, 10.0]).with_integer(vec![false, true]),
            Field::binary(vec![0.0], vec![15.0], vec![4], false),
        ]
    }

    #[test]
    fn test_new_requires_chromosomes() {
        assert_eq!(Population::new(vec![]), Err(ConfigurationError::NoChromosomes));
    }

    #[test]
    fn test_new_validates_fields() {
        let err = Population::new(vec![Field::real(vec![1.0], vec![0.0])]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidField { index: 0, .. }));
    }

    #[test]
    fn test_random_population_shape() {
        let mut rng = create_rng(42);
        let pop = Population::random(mixed_fields(), 10, &mut rng).unwrap();
        assert_eq!(pop.size(), 10);
        assert_eq!(pop.chromosome_count(), 3);
        assert_eq!(pop.phenotype_width(), 8);
        assert!(pop.validate_shape().is_ok());

        for ind in pop.individuals() {
            assert_eq!(ind.phenotype().len(), 8);
            let mut perm = ind.chromosome(0).unwrap().as_permutation().unwrap().to_vec();
            perm.sort_unstable();
            assert_eq!(perm, vec![0, 1, 2, 3, 4]);

            let real = ind.chromosome(1).unwrap().as_real().unwrap();
            assert!((-1.0..=1.0).contains(&real[0]));
            assert_eq!(real[1], real[1].round());
            assert!(ind.fitness().is_infinite());
        }
    }

    #[test]
    fn test_decode_binary_and_gray() {
        assert_eq!(bits_to_integer(&[1, 0, 1, 1], false), 11);
        // Gray 1110 -> binary 1011
        assert_eq!(bits_to_integer(&[1, 1, 1, 0], true), 11);

        let field = Field::binary(vec![0.0, -1.0], vec![15.0, 1.0], vec![4, 2], false);
        let mut out = Vec::new();
        decode_into(&Genes::Binary(vec![1, 1, 1, 1, 0, 0]), &field, &mut out);
        assert_eq!(out, vec![15.0, -1.0]);
    }

    #[test]
    fn test_decode_real_rounds_integers() {
        let field = Field::real(vec![0.0, 0.0], vec![5.0, 5.0]).with_integer(vec![true, false]);
        let mut out = Vec::new();
        decode_into(&Genes::Real(vec![2.6, 2.6]), &field, &mut out);
        assert_eq!(out, vec![3.0, 2.6]);
    }

    #[test]
    fn test_from_individuals_checks_encoding() {
        let fields = vec![Field::real(vec![0.0], vec![1.0])];
        let bad = vec![Individual::new(vec![Genes::Permutation(vec![0])])];
        assert_eq!(
            Population::from_individuals(fields.clone(), bad),
            Err(ConfigurationError::EncodingMismatch { index: 0 })
        );

        let good = vec![Individual::new(vec![Genes::Real(vec![0.25])])];
        let pop = Population::from_individuals(fields, good).unwrap();
        assert_eq!(pop.get(0).unwrap().phenotype(), &[0.25]);
    }

    #[test]
    fn test_from_individuals_checks_chromosome_count() {
        let fields = vec![Field::permutation(2), Field::real(vec![0.0], vec![1.0])];
        let short = vec![Individual::new(vec![Genes::Permutation(vec![1, 0])])];
        assert_eq!(
            Population::from_individuals(fields, short),
            Err(ConfigurationError::ChromosomeCount {
                row: 0,
                found: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn test_malformed_genes_rejected() {
        let perm_fields = vec![Field::permutation(3)];
        for bad in [vec![0, 5, 2], vec![0, 1, 1]] {
            let rows = vec![
                Individual::new(vec![Genes::Permutation(vec![2, 1, 0])]),
                Individual::new(vec![Genes::Permutation(bad)]),
            ];
            assert!(matches!(
                Population::from_individuals(perm_fields.clone(), rows),
                Err(ConfigurationError::InvalidGenes { row: 1, index: 0, .. })
            ));
        }

        let bit_fields = vec![Field::binary(vec![0.0], vec![1.0], vec![3], false)];
        let rows = vec![Individual::new(vec![Genes::Binary(vec![0, 2, 1])])];
        assert!(matches!(
            Population::from_individuals(bit_fields, rows),
            Err(ConfigurationError::InvalidGenes { row: 0, index: 0, .. })
        ));

        let real_fields = vec![Field::real(vec![0.0], vec![1.0])];
        let rows = vec![Individual::new(vec![Genes::Real(vec![f64::NAN])])];
        assert!(matches!(
            Population::from_individuals(real_fields, rows),
            Err(ConfigurationError::InvalidGenes { row: 0, index: 0, .. })
        ));
    }

    #[test]
    fn test_select_rows_and_concat() {
        let mut rng = create_rng(1);
        let pop = Population::random(mixed_fields(), 4, &mut rng).unwrap();

        let picked = pop.select_rows(&[3, 3, 0]).unwrap();
        assert_eq!(picked.size(), 3);
        assert_eq!(picked.get(0), pop.get(3));
        assert_eq!(picked.get(1), pop.get(3));
        assert_eq!(picked.get(2), pop.get(0));
        assert!(pop.select_rows(&[4]).is_err());

        let both = picked.concat(&pop).unwrap();
        assert_eq!(both.size(), 7);
        assert_eq!(both.get(3), pop.get(0));

        let other = Population::random(vec![Field::permutation(3)], 2, &mut rng).unwrap();
        assert!(pop.concat(&other).is_err());
    }

    #[test]
    fn test_overwrite_rows_copies_whole_record() {
        let mut rng = create_rng(2);
        let mut parent = Population::random(mixed_fields(), 3, &mut rng).unwrap();
        let mut child = Population::random(mixed_fields(), 3, &mut rng).unwrap();
        child.evaluate_rows(|x| Evaluation::constrained(vec![x[0]], vec![1.0]));
        child.set_fitness(&[7.0, 8.0, 9.0]).unwrap();

        parent.overwrite_rows(&[0, 2], &child, &[2, 1]).unwrap();
        assert_eq!(parent.get(0), child.get(2));
        assert_eq!(parent.get(2), child.get(1));
        assert_eq!(parent.get(0).unwrap().fitness(), 9.0);
        assert!(!parent.get(0).unwrap().is_feasible());

        assert!(parent.overwrite_rows(&[0], &child, &[0, 1]).is_err());
        assert!(parent.overwrite_rows(&[5], &child, &[0]).is_err());
        assert!(parent.overwrite_rows(&[0], &child, &[5]).is_err());
    }

    #[test]
    fn test_signed_objectives_and_check() {
        let mut rng = create_rng(3);
        let mut pop = Population::random(vec![Field::real(vec![0.0], vec![1.0])], 2, &mut rng)
            .unwrap();
        assert!(pop.check_evaluated(1).is_err());

        pop.evaluate_rows(|_| Evaluation::unconstrained(vec![2.0, 3.0]));
        assert!(pop.check_evaluated(2).is_ok());
        assert!(pop.check_evaluated(1).is_err());

        let signed = pop.signed_objectives(&[Direction::Minimize, Direction::Maximize]);
        assert_eq!(signed, vec![vec![-2.0, 3.0], vec![-2.0, 3.0]]);
    }

    #[test]
    fn test_set_fitness_length_mismatch() {
        let mut rng = create_rng(4);
        let mut pop = Population::random(vec![Field::permutation(3)], 3, &mut rng).unwrap();
        assert!(matches!(
            pop.set_fitness(&[1.0]),
            Err(GgapError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_total_violation_ignores_satisfied() {
        let mut ind = Individual::new(vec![]);
        ind.set_evaluation(Evaluation::constrained(vec![0.0], vec![-3.0, 0.5, 1.5]));
        assert_eq!(ind.total_violation(), 2.0);
        assert!(!ind.is_feasible());

        ind.set_evaluation(Evaluation::constrained(vec![0.0], vec![-1.0, 0.0]));
        assert!(ind.is_feasible());
    }
}
