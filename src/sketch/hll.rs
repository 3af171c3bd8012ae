//! Approximate distinct-count sketch.
//!
//! A standard HyperLogLog sketch (Flajolet et al.) over 2^14 registers,
//! hashed with SHA-1 rather than a crate built on `std`'s `RandomState`:
//! `RandomState` seeds itself per-process, which would make two sketches
//! built in different runs non-mergeable even for identical input, since
//! the same value would hash to a different register across processes.
//! SHA-1 is deterministic across runs and machines, which is the only
//! property this sketch actually needs from its hash function.

use sha1::{Digest, Sha1};

use crate::error::{DqError, DqResult};

const PRECISION: u32 = 14;
const NUM_REGISTERS: usize = 1 << PRECISION;

/// A mergeable, serializable approximate-distinct-count sketch.
#[derive(Debug, Clone, PartialEq)]
pub struct DistinctSketch {
    registers: Vec<u8>,
}

impl DistinctSketch {
    pub fn new() -> Self {
        Self {
            registers: vec![0u8; NUM_REGISTERS],
        }
    }

    pub fn add(&mut self, value: &str) {
        let digest = Sha1::digest(value.as_bytes());
        let hash = u64::from_be_bytes(digest[0..8].try_into().expect("sha1 digest is 20 bytes"));
        let index = (hash >> (64 - PRECISION)) as usize;
        let rest = hash << PRECISION | (1 << (PRECISION - 1));
        let rank = (rest.leading_zeros() + 1) as u8;
        if rank > self.registers[index] {
            self.registers[index] = rank;
        }
    }

    /// The estimated number of distinct values added, using the standard
    /// HyperLogLog harmonic-mean estimator with small/large range
    /// corrections.
    pub fn count(&self) -> f64 {
        let m = NUM_REGISTERS as f64;
        let alpha_m = match NUM_REGISTERS {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };

        let sum: f64 = self.registers.iter().map(|&r| 2f64.powi(-(r as i32))).sum();
        let raw_estimate = alpha_m * m * m / sum;

        let zeros = self.registers.iter().filter(|&&r| r == 0).count();
        if raw_estimate <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw_estimate
        }
    }

    /// Merge another sketch into this one: elementwise max of the two
    /// register arrays, the standard HLL merge rule.
    pub fn merge(&mut self, other: &DistinctSketch) -> DqResult<()> {
        if self.registers.len() != other.registers.len() {
            return Err(DqError::StateMerging {
                property: "ApproxDistinctness".to_string(),
                reason: "sketches have different register counts".to_string(),
            });
        }
        for (a, b) in self.registers.iter_mut().zip(other.registers.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> DqResult<Vec<u8>> {
        bincode::serialize(&self.registers).map_err(DqError::SketchEncoding)
    }

    pub fn from_bytes(bytes: &[u8]) -> DqResult<Self> {
        let registers: Vec<u8> = bincode::deserialize(bytes).map_err(DqError::SketchEncoding)?;
        Ok(Self { registers })
    }
}

impl Default for DistinctSketch {
    fn default() -> Self {
        Self::new()
    }
}
