use crate::Error;
use crate::math::gamma_half_integer;

/// Radial basis made of Gaussian-Type Orbitals.
///
/// The basis is defined as `R_n(r) = N_n r^{n - 1} e^{- r^2 / (2 σ_n^2)}` for
/// `1 <= n <= max_radial`, where `σ_n = cutoff * max(\sqrt{n - 1}, 1) /
/// max_radial` and `N_n = \sqrt{2 / (σ_n^{2n + 1} Γ(n + 1/2))}` normalizes
/// each function on `[0, ∞)`. The functions are not orthogonal to one
/// another.
#[derive(Debug, Clone)]
pub struct GtoRadialBasis {
    max_radial: usize,
    cutoff: f64,
    /// `σ_n` for all n
    gaussian_widths: Vec<f64>,
    /// `N_n` for all n
    normalizations: Vec<f64>,
}

impl GtoRadialBasis {
    /// Create a new GTO radial basis with `max_radial` functions, spread over
    /// the given `cutoff` radius
    pub fn new(max_radial: usize, cutoff: f64) -> Result<GtoRadialBasis, Error> {
        if max_radial == 0 {
            return Err(Error::InvalidParameter(
                "max_radial must be at least 1 for the GTO radial basis".into()
            ));
        }

        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "expected positive and finite cutoff radius, got {}", cutoff
            )));
        }

        let n_max = max_radial as f64;
        let gaussian_widths = (0..max_radial).map(|i| {
            cutoff * f64::max(f64::sqrt(i as f64), 1.0) / n_max
        }).collect::<Vec<_>>();

        let normalizations = gaussian_widths.iter()
            .zip(0..max_radial)
            .map(|(sigma, i)| f64::sqrt(2.0 / (sigma.powi(2 * i as i32 + 3) * gamma_half_integer(i + 1))))
            .collect();

        return Ok(GtoRadialBasis {
            max_radial,
            cutoff,
            gaussian_widths,
            normalizations,
        });
    }

    /// Get the number of radial functions in this basis
    pub fn max_radial(&self) -> usize {
        self.max_radial
    }

    /// Get the cutoff radius of this basis
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Get the vector of GTO Gaussian width `σ_n`
    pub fn gaussian_widths(&self) -> &[f64] {
        &self.gaussian_widths
    }

    /// Evaluate all radial functions at the given `distance`, storing
    /// `R_{n}` in `values[n - 1]`. If `gradients` is `Some`, the radial
    /// derivatives are also computed.
    #[time_graph::instrument(name = "GtoRadialBasis::compute")]
    pub fn compute(&self, distance: f64, values: &mut [f64], gradients: Option<&mut [f64]>) {
        assert_eq!(values.len(), self.max_radial, "wrong size for the radial values");

        for (i, value) in values.iter_mut().enumerate() {
            let sigma = self.gaussian_widths[i];
            let gaussian = f64::exp(-0.5 * distance * distance / (sigma * sigma));
            *value = self.normalizations[i] * distance.powi(i as i32) * gaussian;
        }

        if let Some(gradients) = gradients {
            assert_eq!(gradients.len(), self.max_radial, "wrong size for the radial gradients");

            for (i, gradient) in gradients.iter_mut().enumerate() {
                let sigma = self.gaussian_widths[i];
                let gaussian = f64::exp(-0.5 * distance * distance / (sigma * sigma));
                let polynomial = if i == 0 {
                    // the r^{-1} term vanishes for the first function
                    -distance / (sigma * sigma)
                } else {
                    i as f64 * distance.powi(i as i32 - 1)
                    - distance.powi(i as i32 + 1) / (sigma * sigma)
                };
                *gradient = self.normalizations[i] * polynomial * gaussian;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn normalization() {
        // numerical integration of R_n(r)^2 r^2 over [0, ∞)
        let basis = GtoRadialBasis::new(4, 5.0).unwrap();
        let mut values = vec![0.0; 4];
        let mut integrals = vec![0.0; 4];

        let step = 1e-3;
        for i in 0..30_000 {
            let r = (i as f64 + 0.5) * step;
            basis.compute(r, &mut values, None);
            for (integral, value) in integrals.iter_mut().zip(&values) {
                *integral += value * value * r * r * step;
            }
        }

        for integral in integrals {
            assert_relative_eq!(integral, 1.0, max_relative=1e-6);
        }
    }

    #[test]
    fn widths() {
        let basis = GtoRadialBasis::new(4, 6.0).unwrap();
        assert_relative_eq!(basis.gaussian_widths()[0], 1.5);
        assert_relative_eq!(basis.gaussian_widths()[1], 1.5);
        assert_relative_eq!(basis.gaussian_widths()[3], 1.5 * f64::sqrt(3.0));
    }

    #[test]
    fn finite_differences() {
        let basis = GtoRadialBasis::new(6, 4.5).unwrap();
        let mut values = vec![0.0; 6];
        let mut values_delta = vec![0.0; 6];
        let mut gradients = vec![0.0; 6];

        let delta = 1e-7;
        for &r in &[0.3, 1.0, 2.2, 3.9] {
            basis.compute(r, &mut values, Some(&mut gradients));
            basis.compute(r + delta, &mut values_delta, None);

            for n in 0..6 {
                let finite_difference = (values_delta[n] - values[n]) / delta;
                assert_relative_eq!(gradients[n], finite_difference, epsilon=1e-5, max_relative=1e-5);
            }
        }
    }

    #[test]
    fn invalid() {
        assert!(GtoRadialBasis::new(0, 4.5).is_err());
        assert!(GtoRadialBasis::new(3, -4.5).is_err());
        assert!(GtoRadialBasis::new(3, f64::NAN).is_err());
    }
}
