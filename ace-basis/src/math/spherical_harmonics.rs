use std::f64::consts::SQRT_2;

use num_complex::Complex64;

use crate::Vector3D;
use super::m_1_pow;

/// `\sqrt{\frac{1}{2 \pi}}`
const SQRT_1_OVER_2PI: f64 = 0.3989422804014327;
/// `\sqrt{3}`
const SQRT_3: f64 = 1.7320508075688772;
/// `\sqrt{3 / 2}`
const SQRT_3_OVER_2: f64 = 1.224744871391589;

/// Array storing real data for `0 <= l <= l_max`, `0 <= m <= l`, indexed with
/// `[l, m]`.
#[derive(Debug, Clone)]
struct LegendreArray {
    max_angular: usize,
    data: Vec<f64>,
}

impl LegendreArray {
    fn new(max_angular: usize) -> LegendreArray {
        let size = (max_angular + 1) * (max_angular + 2) / 2;
        LegendreArray {
            max_angular: max_angular,
            data: vec![0.0; size],
        }
    }

    #[inline]
    fn linear_index(&self, index: [usize; 2]) -> usize {
        let [l, m] = index;
        debug_assert!(l <= self.max_angular && m <= l);
        return m + l * (l + 1) / 2;
    }
}

impl std::ops::Index<[usize; 2]> for LegendreArray {
    type Output = f64;
    fn index(&self, index: [usize; 2]) -> &f64 {
        &self.data[self.linear_index(index)]
    }
}

impl std::ops::IndexMut<[usize; 2]> for LegendreArray {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut f64 {
        let i = self.linear_index(index);
        &mut self.data[i]
    }
}

/// Array storing complex data for `0 <= l <= l_max`, `-l <= m <= l`. This type
/// implements `Index<[isize; 2]>` and `IndexMut<[isize; 2]>` to allow writing
/// code like
///
/// ```
/// # use ace_basis::math::SphericalHarmonicsArray;
/// # use num_complex::Complex64;
/// let mut array = SphericalHarmonicsArray::new(8);
/// array[[6, 3]] = Complex64::new(3.0, 1.0);
/// array[[6, -3]] = Complex64::new(-3.0, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct SphericalHarmonicsArray {
    max_angular: isize,
    data: Vec<Complex64>,
}

impl SphericalHarmonicsArray {
    /// Create a new `SphericalHarmonicsArray` with the given maximal angular
    /// degree, and all elements set to zero.
    pub fn new(max_angular: usize) -> SphericalHarmonicsArray {
        let size = (max_angular + 1) * (max_angular + 1);
        SphericalHarmonicsArray {
            max_angular: max_angular as isize,
            data: vec![Complex64::new(0.0, 0.0); size],
        }
    }

    /// Get the maximal angular degree stored in this array
    pub fn max_angular(&self) -> usize {
        self.max_angular as usize
    }

    #[inline]
    #[allow(clippy::suspicious_operation_groupings)]
    fn linear_index(&self, index: [isize; 2]) -> usize {
        let [l, m] = index;
        debug_assert!(l <= self.max_angular && -l <= m && m <= l);
        return (m + l + (l * l)) as usize;
    }
}

impl std::ops::Index<[isize; 2]> for SphericalHarmonicsArray {
    type Output = Complex64;
    fn index(&self, index: [isize; 2]) -> &Complex64 {
        &self.data[self.linear_index(index)]
    }
}

impl std::ops::IndexMut<[isize; 2]> for SphericalHarmonicsArray {
    fn index_mut(&mut self, index: [isize; 2]) -> &mut Complex64 {
        let i = self.linear_index(index);
        &mut self.data[i]
    }
}

/// Compute a full set of complex spherical harmonics `Y_l^m` (including the
/// Condon-Shortley phase) at given directions, together with their gradients.
///
/// The harmonics with negative `m` are obtained from the positive ones with
/// `Y_l^{-m} = (-1)^m conj(Y_l^m)`.
///
/// The associated Legendre polynomials are computed following the algorithm
/// described in <https://arxiv.org/abs/1410.1748>.
#[derive(Debug, Clone)]
pub struct SphericalHarmonics {
    max_angular: usize,
    /// normalized associated Legendre polynomials, multiplied by `sqrt(2)`
    legendre_polynomials: LegendreArray,
    /// 'A' coefficient from the arxiv paper
    coefficient_a: LegendreArray,
    /// 'B' coefficient from the arxiv paper
    coefficient_b: LegendreArray,
    /// `sqrt((l + m) * (l - m + 1)) P_l^{m - 1} - sqrt((l - m) * (l + m + 1)) P_l^{m + 1}`
    delta_legendre_polynomials: LegendreArray,
    /// either `m / sin(θ) P_l^m` or `- 1 / (2 cos(θ)) ∆P_l^m` depending on
    /// theta, to keep the `1 / sin(θ)` singularity away from the poles
    legendre_over_theta: LegendreArray,
}

impl SphericalHarmonics {
    /// Build a new `SphericalHarmonics` calculator with the given `l_max`, and
    /// pre-compute all required quantities
    pub fn new(max_angular: usize) -> SphericalHarmonics {
        let mut coefficient_a = LegendreArray::new(max_angular);
        let mut coefficient_b = LegendreArray::new(max_angular);
        for l in 2..(max_angular + 1) {
            let ls = (l * l) as f64;
            let lm1s = ((l - 1) * (l - 1)) as f64;
            for m in 0..(l - 1) {
                let ms = (m * m) as f64;
                coefficient_a[[l, m]] = f64::sqrt((4.0 * ls - 1.0) / (ls - ms));
                coefficient_b[[l, m]] = -f64::sqrt((lm1s - ms) / (4.0 * lm1s - 1.0));
            }
        }

        SphericalHarmonics {
            max_angular: max_angular,
            legendre_polynomials: LegendreArray::new(max_angular),
            delta_legendre_polynomials: LegendreArray::new(max_angular),
            legendre_over_theta: LegendreArray::new(max_angular),
            coefficient_a: coefficient_a,
            coefficient_b: coefficient_b,
        }
    }

    /// Get the maximal angular degree computed by this `SphericalHarmonics`
    pub fn max_angular(&self) -> usize {
        self.max_angular
    }

    fn compute_legendre_polynomials(&mut self, cos_theta: f64, sin_theta: f64) {
        let p = &mut self.legendre_polynomials;

        let mut diagonal = SQRT_1_OVER_2PI;
        p[[0, 0]] = diagonal;

        if self.max_angular == 0 {
            return;
        }

        p[[1, 0]] = cos_theta * SQRT_3 * diagonal;
        diagonal *= -SQRT_3_OVER_2 * sin_theta;
        p[[1, 1]] = diagonal;

        for l in 2..(self.max_angular + 1) {
            for m in 0..(l - 1) {
                let a = self.coefficient_a[[l, m]];
                let b = self.coefficient_b[[l, m]];
                p[[l, m]] = a * (cos_theta * p[[l - 1, m]] + b * p[[l - 2, m]]);
            }

            p[[l, l - 1]] = cos_theta * f64::sqrt(2.0 * l as f64 + 1.0) * diagonal;
            diagonal *= -f64::sqrt(1.0 + 0.5 / l as f64) * sin_theta;
            p[[l, l]] = diagonal;
        }
    }

    /// Fill `delta_legendre_polynomials` and `legendre_over_theta` for
    /// `m >= 1`, which are the only values used by the gradients.
    fn compute_derivative_factors(&mut self, cos_theta: f64, sin_theta: f64) {
        let p = &self.legendre_polynomials;
        let delta = &mut self.delta_legendre_polynomials;

        for l in 1..(self.max_angular + 1) {
            for m in 1..=l {
                let p_m_minus_1 = p[[l, m - 1]];
                let p_m_plus_1 = if m < l { p[[l, m + 1]] } else { 0.0 };

                delta[[l, m]] = f64::sqrt(((l + m) * (l - m + 1)) as f64) * p_m_minus_1
                              - f64::sqrt(((l - m) * (l + m + 1)) as f64) * p_m_plus_1;
            }
        }

        // close to the poles, use `m P_l^m / sin(θ) = -1 / (2 cos(θ)) *
        // (sqrt((l + m)(l - m + 1)) P_l^{m-1} + sqrt((l - m)(l + m + 1)) P_l^{m+1})`
        let over_theta = &mut self.legendre_over_theta;
        for l in 1..(self.max_angular + 1) {
            for m in 1..=l {
                over_theta[[l, m]] = if sin_theta > 0.1 {
                    m as f64 / sin_theta * p[[l, m]]
                } else {
                    let p_m_minus_1 = p[[l, m - 1]];
                    let p_m_plus_1 = if m < l { p[[l, m + 1]] } else { 0.0 };
                    let sum = f64::sqrt(((l + m) * (l - m + 1)) as f64) * p_m_minus_1
                            + f64::sqrt(((l - m) * (l + m + 1)) as f64) * p_m_plus_1;
                    -0.5 / cos_theta * sum
                };
            }
        }
    }

    /// Evaluate all spherical harmonics for the given normalized `direction`,
    /// and store the results in `values`. If `gradients` is `Some`, this
    /// function also computes the Cartesian gradients of the harmonics (as a
    /// function of the direction vector, evaluated on the unit sphere) and
    /// stores them in `gradients`.
    #[time_graph::instrument(name = "SphericalHarmonics::compute")]
    pub fn compute(
        &mut self,
        direction: Vector3D,
        values: &mut SphericalHarmonicsArray,
        mut gradients: Option<&mut [SphericalHarmonicsArray; 3]>
    ) {
        assert!(
            (direction.norm2() - 1.0).abs() < 1e-9,
            "expected the direction vector to be normalized in spherical harmonics"
        );
        assert_eq!(
            values.max_angular as usize, self.max_angular,
            "wrong size for the values array, expected max_angular to be {}, got {}",
            self.max_angular, values.max_angular,
        );
        if let Some(ref gradients) = gradients {
            for gradient in gradients.iter() {
                assert_eq!(
                    gradient.max_angular as usize, self.max_angular,
                    "wrong size for one gradient array, expected max_angular to be {}, got {}",
                    self.max_angular, gradient.max_angular,
                );
            }
        }

        let sqrt_xy = f64::hypot(direction[0], direction[1]);
        let cos_theta = direction[2];
        let sin_theta = sqrt_xy;

        let (cos_phi, sin_phi) = if sqrt_xy > f64::EPSILON {
            (direction[0] / sqrt_xy, direction[1] / sqrt_xy)
        } else {
            (1.0, 0.0)
        };

        self.compute_legendre_polynomials(cos_theta, sin_theta);
        if gradients.is_some() {
            self.compute_derivative_factors(cos_theta, sin_theta);
        }

        let p = &self.legendre_polynomials;
        for l in 0..(self.max_angular + 1) {
            values[[l as isize, 0]] = Complex64::new(p[[l, 0]] / SQRT_2, 0.0);
        }

        if let Some(ref mut gradients) = gradients {
            for gradient in gradients.iter_mut() {
                gradient[[0, 0]] = Complex64::new(0.0, 0.0);
            }

            for l in 1..(self.max_angular + 1) {
                let legendre_factor = f64::sqrt(0.5 * (l * (l + 1)) as f64) * p[[l, 1]];

                gradients[0][[l as isize, 0]] = Complex64::new(cos_phi * cos_theta * legendre_factor, 0.0);
                gradients[1][[l as isize, 0]] = Complex64::new(sin_phi * cos_theta * legendre_factor, 0.0);
                gradients[2][[l as isize, 0]] = Complex64::new(-sin_theta * legendre_factor, 0.0);
            }
        }

        let e_i_phi = Complex64::new(cos_phi, sin_phi);
        let mut e_i_m_phi = Complex64::new(1.0, 0.0);
        for m in 1..(self.max_angular + 1) {
            e_i_m_phi *= e_i_phi;
            let phase = e_i_m_phi / SQRT_2;
            let sign = m_1_pow(m as isize);
            let (l_m, m) = (m, m as isize);

            for l in l_m..(self.max_angular + 1) {
                let value = p[[l, l_m]] * phase;
                values[[l as isize, m]] = value;
                values[[l as isize, -m]] = sign * value.conj();
            }

            if let Some(ref mut gradients) = gradients {
                for l in l_m..(self.max_angular + 1) {
                    let delta_p_lm = self.delta_legendre_polynomials[[l, l_m]];
                    let p_lm_over_theta = self.legendre_over_theta[[l, l_m]];

                    // d/dx: e^{imϕ} / √2 (-i sin(ϕ) m / sin(θ) P_l^m - cos(θ) cos(ϕ) / 2 ∆P_l^m)
                    let d_dx = phase * Complex64::new(
                        -0.5 * cos_theta * cos_phi * delta_p_lm,
                        -sin_phi * p_lm_over_theta,
                    );
                    // d/dy: e^{imϕ} / √2 (i cos(ϕ) m / sin(θ) P_l^m - cos(θ) sin(ϕ) / 2 ∆P_l^m)
                    let d_dy = phase * Complex64::new(
                        -0.5 * cos_theta * sin_phi * delta_p_lm,
                        cos_phi * p_lm_over_theta,
                    );
                    // d/dz: e^{imϕ} / √2 sin(θ) / 2 ∆P_l^m
                    let d_dz = phase * (0.5 * sin_theta * delta_p_lm);

                    for (spatial, gradient) in [d_dx, d_dy, d_dz].into_iter().enumerate() {
                        gradients[spatial][[l as isize, m]] = gradient;
                        gradients[spatial][[l as isize, -m]] = sign * gradient.conj();
                    }
                }
            }
        }
    }
}
