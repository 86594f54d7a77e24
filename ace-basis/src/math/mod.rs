use once_cell::sync::Lazy;

mod eigen;
pub(crate) use self::eigen::SymmetricEigen;

mod spherical_harmonics;
pub use self::spherical_harmonics::{SphericalHarmonics, SphericalHarmonicsArray};

mod clebsch_gordan;
pub use self::clebsch_gordan::clebsch_gordan;

/// Largest `n` for which `n!` is representable as a finite `f64`
const MAX_FACTORIAL: usize = 170;

static FACTORIALS: Lazy<Vec<f64>> = Lazy::new(|| {
    let mut factorials = Vec::with_capacity(MAX_FACTORIAL + 1);
    factorials.push(1.0);
    for n in 1..=MAX_FACTORIAL {
        factorials.push(factorials[n - 1] * n as f64);
    }
    factorials
});

/// Get `n!` as a floating point value.
///
/// # Panics
///
/// If `n!` does not fit in a `f64`, i.e. for `n > 170`.
#[inline]
pub fn factorial(n: usize) -> f64 {
    assert!(n <= MAX_FACTORIAL, "{}! is too large to be represented as a f64", n);
    FACTORIALS[n]
}

/// Evaluate `Γ(n + 1/2) = (2n)! √π / (4^n n!)` for integer `n`
pub fn gamma_half_integer(n: usize) -> f64 {
    factorial(2 * n) * f64::sqrt(std::f64::consts::PI) / (4.0_f64.powi(n as i32) * factorial(n))
}

/// Specialized function to compute (-1)^n
#[inline]
pub(crate) fn m_1_pow(n: isize) -> f64 {
    if n % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}
