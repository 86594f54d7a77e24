use ndarray::{Array1, Array2};

/// Maximal number of Jacobi sweeps before giving up on convergence
const MAX_SWEEPS: usize = 100;

/// Eigendecomposition of a real symmetric matrix into eigenvalues and
/// eigenvectors, using the cyclic Jacobi method.
///
/// The matrices we decompose (Gram matrices of coupling coefficients) are
/// small, for which Jacobi rotations are both simple and very accurate.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues of the input matrix, sorted in increasing order
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors of the input matrix, stored as columns
    pub eigenvectors: Array2<f64>,
}

impl SymmetricEigen {
    /// Compute the eigendecomposition of a symmetric real matrix
    #[allow(clippy::float_cmp, clippy::many_single_char_names)]
    pub fn new(matrix: Array2<f64>) -> SymmetricEigen {
        assert_eq!(matrix.nrows(), matrix.ncols(), "matrix is not square");

        let n = matrix.ncols();
        for i in 0..n {
            for j in i..n {
                debug_assert_eq!(matrix[[i, j]], matrix[[j, i]], "matrix is not symmetric");
            }
        }

        let mut a = matrix;
        let mut v = Array2::<f64>::eye(n);

        for _ in 0..MAX_SWEEPS {
            let mut off_diagonal = 0.0;
            let mut scale = 0.0;
            for i in 0..n {
                scale += a[[i, i]] * a[[i, i]];
                for j in (i + 1)..n {
                    off_diagonal += a[[i, j]] * a[[i, j]];
                }
            }

            if off_diagonal <= f64::EPSILON * f64::EPSILON * scale || off_diagonal == 0.0 {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = a[[p, q]];
                    if apq == 0.0 {
                        continue;
                    }

                    // rotation angle zeroing a[p, q]
                    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + f64::hypot(theta, 1.0));
                    let c = 1.0 / f64::hypot(t, 1.0);
                    let s = t * c;

                    for k in 0..n {
                        let akp = a[[k, p]];
                        let akq = a[[k, q]];
                        a[[k, p]] = c * akp - s * akq;
                        a[[k, q]] = s * akp + c * akq;
                    }

                    for k in 0..n {
                        let apk = a[[p, k]];
                        let aqk = a[[q, k]];
                        a[[p, k]] = c * apk - s * aqk;
                        a[[q, k]] = s * apk + c * aqk;
                    }

                    for k in 0..n {
                        let vkp = v[[k, p]];
                        let vkq = v[[k, q]];
                        v[[k, p]] = c * vkp - s * vkq;
                        v[[k, q]] = s * vkp + c * vkq;
                    }
                }
            }
        }

        let mut order = (0..n).collect::<Vec<_>>();
        order.sort_by(|&i, &j| {
            a[[i, i]].partial_cmp(&a[[j, j]]).expect("got NaN in eigenvalues")
        });

        let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect::<Array1<_>>();
        let mut eigenvectors = Array2::zeros((n, n));
        for (new, &old) in order.iter().enumerate() {
            eigenvectors.column_mut(new).assign(&v.column(old));
        }

        SymmetricEigen {
            eigenvalues,
            eigenvectors,
        }
    }

    /// Get the indexes of eigenvalues larger than `rtol` times the largest
    /// eigenvalue, starting from the largest one.
    pub fn significant(&self, rtol: f64) -> Vec<usize> {
        let n = self.eigenvalues.len();
        if n == 0 {
            return Vec::new();
        }

        let largest = self.eigenvalues[n - 1];
        if largest <= 0.0 {
            return Vec::new();
        }

        return (0..n).rev()
            .filter(|&i| self.eigenvalues[i] > rtol * largest)
            .collect();
    }
}
