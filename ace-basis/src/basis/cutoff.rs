use std::f64::consts::PI;

use crate::Error;

/// Smoothing function applied to the radial basis, bringing all functions
/// to zero at the cutoff radius
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub enum CutoffFunction {
    /// Step function, 1 if `r < cutoff` and 0 if `r >= cutoff`
    Step{},
    /// Shifted cosine switching function
    /// `f(r) = 1/2 * (1 + cos(π (r - cutoff + width) / width ))`
    ShiftedCosine {
        width: f64,
    },
}

impl Default for CutoffFunction {
    fn default() -> CutoffFunction {
        CutoffFunction::ShiftedCosine { width: 0.5 }
    }
}

impl CutoffFunction {
    /// Check that this cutoff function can be used with the given cutoff
    /// radius
    pub fn validate(&self, cutoff: f64) -> Result<(), Error> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "expected positive and finite cutoff radius, got {}", cutoff
            )));
        }

        match self {
            CutoffFunction::Step {} => {},
            CutoffFunction::ShiftedCosine { width } => {
                if !width.is_finite() || *width <= 0.0 {
                    return Err(Error::InvalidParameter(format!(
                        "expected positive width for shifted cosine cutoff function, got {}",
                        width
                    )));
                }

                if *width > cutoff {
                    return Err(Error::InvalidParameter(format!(
                        "the width of the shifted cosine cutoff function ({}) \
                        can not be larger than the cutoff radius ({})",
                        width, cutoff
                    )));
                }
            }
        }
        return Ok(());
    }

    /// Evaluate the cutoff function at the distance `r` for the given `cutoff`
    pub fn compute(&self, r: f64, cutoff: f64) -> f64 {
        match self {
            CutoffFunction::Step{} => {
                if r >= cutoff { 0.0 } else { 1.0 }
            },
            CutoffFunction::ShiftedCosine { width } => {
                if r <= (cutoff - width) {
                    1.0
                } else if r >= cutoff {
                    0.0
                } else {
                    let s = PI * (r - cutoff + width) / width;
                    0.5 * (1. + f64::cos(s))
                }
            }
        }
    }

    /// Evaluate the derivative of the cutoff function at the distance `r` for
    /// the given `cutoff`
    pub fn derivative(&self, r: f64, cutoff: f64) -> f64 {
        match self {
            CutoffFunction::Step{} => 0.0,
            CutoffFunction::ShiftedCosine { width } => {
                if r <= (cutoff - width) || r >= cutoff {
                    0.0
                } else {
                    let s = PI * (r - cutoff + width) / width;
                    return -0.5 * PI * f64::sin(s) / width;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn step() {
        let function = CutoffFunction::Step{};
        let cutoff = 4.0;

        assert_eq!(function.compute(2.0, cutoff), 1.0);
        assert_eq!(function.compute(4.0, cutoff), 0.0);
        assert_eq!(function.compute(5.0, cutoff), 0.0);

        assert_eq!(function.derivative(2.0, cutoff), 0.0);
        assert_eq!(function.derivative(5.0, cutoff), 0.0);
    }

    #[test]
    fn shifted_cosine() {
        let function = CutoffFunction::ShiftedCosine { width: 0.5 };
        let cutoff = 4.0;

        assert_eq!(function.compute(2.0, cutoff), 1.0);
        assert_eq!(function.compute(3.5, cutoff), 1.0);
        assert_relative_eq!(function.compute(3.75, cutoff), 0.5, max_relative=1e-15);
        assert_eq!(function.compute(4.0, cutoff), 0.0);
        assert_eq!(function.compute(5.0, cutoff), 0.0);

        assert_eq!(function.derivative(2.0, cutoff), 0.0);
        assert_relative_eq!(function.derivative(3.75, cutoff), -PI, max_relative=1e-15);
        assert_eq!(function.derivative(5.0, cutoff), 0.0);
    }

    #[test]
    fn finite_differences() {
        let function = CutoffFunction::ShiftedCosine { width: 1.2 };
        let cutoff = 3.0;
        let delta = 1e-6;

        for &r in &[1.9, 2.2, 2.5, 2.9] {
            let finite_difference = (function.compute(r + delta, cutoff) - function.compute(r, cutoff)) / delta;
            assert_relative_eq!(function.derivative(r, cutoff), finite_difference, epsilon=1e-5);
        }
    }

    #[test]
    fn validate() {
        assert!(CutoffFunction::Step{}.validate(3.0).is_ok());
        assert!(CutoffFunction::ShiftedCosine { width: 0.5 }.validate(3.0).is_ok());

        let error = CutoffFunction::Step{}.validate(-3.0).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: expected positive and finite cutoff radius, got -3");

        let error = CutoffFunction::ShiftedCosine { width: -0.5 }.validate(3.0).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid parameter: expected positive width for shifted cosine cutoff function, got -0.5"
        );

        assert!(CutoffFunction::ShiftedCosine { width: 4.0 }.validate(3.0).is_err());
    }
}
