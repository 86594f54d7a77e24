use super::{factorial, m_1_pow};

/// Compute the Clebsch-Gordan coefficient `<l1 m1; l2 m2 | l m>` for integer
/// angular momenta, using the Racah formula.
///
/// The coefficients follow the Condon-Shortley phase convention, and are zero
/// whenever the selection rules (`m = m1 + m2`, `|l1 - l2| ≤ l ≤ l1 + l2`,
/// `|m_i| ≤ l_i`) are not satisfied.
#[allow(clippy::similar_names)]
pub fn clebsch_gordan(l1: usize, m1: isize, l2: usize, m2: isize, l: usize, m: isize) -> f64 {
    let (l1, l2, l) = (l1 as isize, l2 as isize, l as isize);

    if m != m1 + m2 || m1.abs() > l1 || m2.abs() > l2 || m.abs() > l {
        return 0.0;
    }

    if l < (l1 - l2).abs() || l > l1 + l2 {
        return 0.0;
    }

    let f = |n: isize| {
        debug_assert!(n >= 0);
        factorial(n as usize)
    };

    let triangle = (2 * l + 1) as f64
        * f(l + l1 - l2) * f(l - l1 + l2) * f(l1 + l2 - l)
        / f(l1 + l2 + l + 1);

    let projections = f(l + m) * f(l - m)
        * f(l1 - m1) * f(l1 + m1)
        * f(l2 - m2) * f(l2 + m2);

    let k_min = 0.max(l2 - l - m1).max(l1 - l + m2);
    let k_max = (l1 + l2 - l).min(l1 - m1).min(l2 + m2);

    let mut sum = 0.0;
    for k in k_min..=k_max {
        sum += m_1_pow(k) / (
            f(k) * f(l1 + l2 - l - k) * f(l1 - m1 - k)
            * f(l2 + m2 - k) * f(l - l2 + m1 + k) * f(l - l1 - m2 + k)
        );
    }

    return f64::sqrt(triangle * projections) * sum;
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn known_values() {
        assert_relative_eq!(clebsch_gordan(0, 0, 0, 0, 0, 0), 1.0);
        assert_relative_eq!(clebsch_gordan(1, 0, 1, 0, 0, 0), -1.0 / f64::sqrt(3.0), max_relative=1e-14);
        assert_relative_eq!(clebsch_gordan(1, 1, 1, -1, 0, 0), 1.0 / f64::sqrt(3.0), max_relative=1e-14);
        assert_relative_eq!(clebsch_gordan(1, 1, 1, -1, 2, 0), 1.0 / f64::sqrt(6.0), max_relative=1e-14);
        assert_relative_eq!(clebsch_gordan(1, 1, 1, -1, 1, 0), 1.0 / f64::sqrt(2.0), max_relative=1e-14);
        assert_relative_eq!(clebsch_gordan(1, 0, 1, 0, 2, 0), f64::sqrt(2.0 / 3.0), max_relative=1e-14);
        assert_relative_eq!(clebsch_gordan(2, 2, 1, -1, 2, 1), f64::sqrt(1.0 / 3.0), max_relative=1e-14);
        assert_relative_eq!(clebsch_gordan(3, 3, 2, 2, 5, 5), 1.0, max_relative=1e-14);
    }

    #[test]
    fn coupling_to_zero() {
        // <l m; l -m | 0 0> = (-1)^(l - m) / sqrt(2l + 1)
        for l in 0..8_usize {
            for m in -(l as isize)..=(l as isize) {
                let expected = m_1_pow(l as isize - m) / f64::sqrt((2 * l + 1) as f64);
                assert_relative_eq!(clebsch_gordan(l, m, l, -m, 0, 0), expected, max_relative=1e-13);
            }
        }
    }

    #[test]
    fn selection_rules() {
        assert_eq!(clebsch_gordan(1, 0, 1, 1, 2, 0), 0.0);
        assert_eq!(clebsch_gordan(1, 0, 1, 0, 3, 0), 0.0);
        assert_eq!(clebsch_gordan(3, 0, 1, 0, 1, 0), 0.0);
        assert_eq!(clebsch_gordan(1, 2, 1, -2, 0, 0), 0.0);
    }

    #[test]
    fn orthogonality() {
        let (l1, l2) = (2_usize, 3_usize);
        for l in 1..=5_usize {
            for l_prime in 1..=5_usize {
                for m in -1..=1_isize {
                    let mut sum = 0.0;
                    for m1 in -(l1 as isize)..=(l1 as isize) {
                        let m2 = m - m1;
                        sum += clebsch_gordan(l1, m1, l2, m2, l, m)
                             * clebsch_gordan(l1, m1, l2, m2, l_prime, m);
                    }

                    let expected = if l == l_prime { 1.0 } else { 0.0 };
                    assert_relative_eq!(sum, expected, epsilon=1e-13);
                }
            }
        }
    }
}
