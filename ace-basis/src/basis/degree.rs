use crate::Error;
use super::OneParticleFunction;

/// A degree functional measures the complexity of one-particle functions and
/// of products of one-particle functions, and is used to truncate the basis.
///
/// Adding a function to a product must never decrease its degree: basis
/// enumeration relies on this to stop exploring a branch as soon as its
/// degree goes over the bound.
pub trait DegreeFunction: Send + Sync {
    /// Get the degree of a single one-particle function
    fn one_particle(&self, function: &OneParticleFunction) -> f64;

    /// Get the degree of the product of all the given `functions`. The
    /// default implementation sums the one-particle degrees.
    fn correlation(&self, functions: &[OneParticleFunction]) -> f64 {
        functions.iter().map(|f| self.one_particle(f)).sum()
    }
}

/// Additive degree `weight_radial * n + weight_angular * l`, summed over all
/// the one-particle functions in a product
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct SparseDegree {
    /// Weight of the radial index `n`
    #[serde(default = "default_weight_radial")]
    pub weight_radial: f64,
    /// Weight of the angular index `l`
    #[serde(default = "default_weight_angular")]
    pub weight_angular: f64,
}

fn default_weight_radial() -> f64 { 1.0 }
fn default_weight_angular() -> f64 { 1.5 }

impl Default for SparseDegree {
    fn default() -> SparseDegree {
        SparseDegree {
            weight_radial: default_weight_radial(),
            weight_angular: default_weight_angular(),
        }
    }
}

impl SparseDegree {
    /// Check that both weights are positive and finite
    pub fn validate(&self) -> Result<(), Error> {
        for (name, weight) in [("weight_radial", self.weight_radial), ("weight_angular", self.weight_angular)] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "expected positive and finite {} in degree function, got {}", name, weight
                )));
            }
        }
        return Ok(());
    }

    /// Get the largest radial index `n` such that a single function can have
    /// a degree below `max_degree`
    pub fn max_radial(&self, max_degree: f64) -> usize {
        if max_degree < self.weight_radial {
            return 0;
        }
        return (max_degree / self.weight_radial).floor() as usize;
    }

    /// Get the largest angular index `l` such that a single function (with
    /// `n = 1`) can have a degree below `max_degree`
    pub fn max_angular(&self, max_degree: f64) -> usize {
        if max_degree < self.weight_radial {
            return 0;
        }
        return ((max_degree - self.weight_radial) / self.weight_angular).floor() as usize;
    }
}

impl DegreeFunction for SparseDegree {
    fn one_particle(&self, function: &OneParticleFunction) -> f64 {
        self.weight_radial * function.n as f64 + self.weight_angular * function.l as f64
    }
}
