//! Chromosome encodings and segment descriptors.
//!
//! A genome is split into one or more chromosome segments. Each segment has
//! a fixed [`Encoding`] and a [`Field`] describing its decision variables:
//! bounds, integrality and, for bit strings, the number of bits per variable.

use std::fmt;
use std::str::FromStr;

use super::error::ConfigurationError;

/// Number of bits per variable used by [`Field::from_tag`] for `BG` segments.
pub const DEFAULT_BITS_PER_VARIABLE: usize = 16;

/// Largest bit length per variable that still decodes exactly into an `f64`.
const MAX_BITS_PER_VARIABLE: usize = 52;

/// Representation scheme of a chromosome segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Bit strings, optionally Gray-coded (tag `BG`).
    BinaryGray,
    /// Real or integer valued vectors (tag `RI`).
    RealInteger,
    /// Permutations of `0..len` (tag `P`).
    Permutation,
}

impl Encoding {
    /// Parses a short encoding tag (`"BG"`, `"RI"` or `"P"`).
    pub fn from_tag(tag: &str) -> Result<Self, ConfigurationError> {
        match tag {
            "BG" => Ok(Encoding::BinaryGray),
            "RI" => Ok(Encoding::RealInteger),
            "P" => Ok(Encoding::Permutation),
            other => Err(ConfigurationError::UnsupportedEncoding(other.to_string())),
        }
    }

    /// Returns the short tag of this encoding.
    pub fn tag(self) -> &'static str {
        match self {
            Encoding::BinaryGray => "BG",
            Encoding::RealInteger => "RI",
            Encoding::Permutation => "P",
        }
    }
}

impl FromStr for Encoding {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Encoding::from_tag(s)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Optimization direction of one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    /// Multiplier that turns a raw objective into a larger-is-better value.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Minimize => -1.0,
            Direction::Maximize => 1.0,
        }
    }
}

/// Descriptor of one chromosome segment.
///
/// `lower`, `upper` and `integer` have one entry per decision variable, i.e.
/// per phenotype column contributed by this segment. For [`Encoding::BinaryGray`]
/// `bits` holds the bit length of each variable; it is empty otherwise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    encoding: Encoding,
    lower: Vec<f64>,
    upper: Vec<f64>,
    integer: Vec<bool>,
    bits: Vec<usize>,
    gray: bool,
}

impl Field {
    /// Bit-string segment. `bits[i]` bits encode variable `i` in `[lower[i], upper[i]]`.
    pub fn binary(lower: Vec<f64>, upper: Vec<f64>, bits: Vec<usize>, gray: bool) -> Self {
        let integer = vec![false; lower.len()];
        Self {
            encoding: Encoding::BinaryGray,
            lower,
            upper,
            integer,
            bits,
            gray,
        }
    }

    /// Real-valued segment with box bounds.
    pub fn real(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        let integer = vec![false; lower.len()];
        Self {
            encoding: Encoding::RealInteger,
            lower,
            upper,
            integer,
            bits: Vec::new(),
            gray: false,
        }
    }

    /// Permutation segment over the symbols `0..len`.
    pub fn permutation(len: usize) -> Self {
        let top = len.saturating_sub(1) as f64;
        Self {
            encoding: Encoding::Permutation,
            lower: vec![0.0; len],
            upper: vec![top; len],
            integer: vec![true; len],
            bits: Vec::new(),
            gray: false,
        }
    }

    /// Builds a segment from a short encoding tag.
    ///
    /// `BG` segments get [`DEFAULT_BITS_PER_VARIABLE`] bits per variable and
    /// plain binary coding; `P` segments permute `lower.len()` symbols.
    pub fn from_tag(tag: &str, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, ConfigurationError> {
        Ok(match Encoding::from_tag(tag)? {
            Encoding::BinaryGray => {
                let bits = vec![DEFAULT_BITS_PER_VARIABLE; lower.len()];
                Field::binary(lower, upper, bits, false)
            }
            Encoding::RealInteger => Field::real(lower, upper),
            Encoding::Permutation => Field::permutation(lower.len()),
        })
    }

    /// Marks variables as integer valued. Ignored for permutations.
    pub fn with_integer(mut self, integer: Vec<bool>) -> Self {
        if self.encoding != Encoding::Permutation {
            self.integer = integer;
        }
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of decision variables (phenotype columns).
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Number of genes in one row of this segment.
    pub fn genome_len(&self) -> usize {
        match self.encoding {
            Encoding::BinaryGray => self.bits.iter().sum(),
            Encoding::RealInteger | Encoding::Permutation => self.len(),
        }
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn bits(&self) -> &[usize] {
        &self.bits
    }

    pub fn is_gray(&self) -> bool {
        self.gray
    }

    pub fn is_integer(&self, var: usize) -> bool {
        self.integer.get(var).copied().unwrap_or(false)
    }

    /// Checks the descriptor for structural consistency.
    ///
    /// `index` is the chromosome position, used only for error reporting.
    pub fn validate(&self, index: usize) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidField { index, reason };

        if self.lower.is_empty() {
            return Err(invalid("segment has no variables".into()));
        }
        if self.upper.len() != self.lower.len() || self.integer.len() != self.lower.len() {
            return Err(invalid(format!(
                "bounds/integer flags have mismatched lengths ({}, {}, {})",
                self.lower.len(),
                self.upper.len(),
                self.integer.len()
            )));
        }
        for (var, (&lb, &ub)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !lb.is_finite() || !ub.is_finite() || lb > ub {
                return Err(invalid(format!("variable {var} has invalid bounds [{lb}, {ub}]")));
            }
        }
        if self.encoding == Encoding::BinaryGray {
            if self.bits.len() != self.lower.len() {
                return Err(invalid(format!(
                    "expected {} bit lengths, got {}",
                    self.lower.len(),
                    self.bits.len()
                )));
            }
            if let Some(var) = self
                .bits
                .iter()
                .position(|&b| b == 0 || b > MAX_BITS_PER_VARIABLE)
            {
                return Err(invalid(format!(
                    "variable {var} must use 1..={MAX_BITS_PER_VARIABLE} bits"
                )));
            }
        }
        Ok(())
    }
}
