//! Generalized Clebsch-Gordan coupling coefficients, used to combine products
//! of one-particle functions into rotation invariant functions.

use std::collections::HashMap;
use std::sync::Mutex;

use itertools::Itertools;
use log::debug;
use ndarray::{Array2, Axis};

use crate::Error;
use crate::math::{clebsch_gordan, SymmetricEigen};

/// Relative tolerance on the Gram matrix eigenvalues used to discard linearly
/// dependent coupled functions
const EIGENVALUE_RTOL: f64 = 1e-7;

/// Coupling coefficients for all the products of one-particle functions
/// sharing the same `(z, n, l)` signature.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingBlock {
    /// Coefficients, with one row for each rotation invariant function and
    /// one column for each entry in `m_tuples`
    pub coefficients: Array2<f64>,
    /// The values of `m` for each one-particle function in the product,
    /// associated with each column of `coefficients`
    pub m_tuples: Vec<Vec<isize>>,
}

impl CouplingBlock {
    /// Create a block without any coupled function
    pub fn empty() -> CouplingBlock {
        CouplingBlock {
            coefficients: Array2::zeros((0, 0)),
            m_tuples: Vec::new(),
        }
    }

    /// Get the number of rotation invariant functions in this block
    pub fn n_rows(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Is this block empty, i.e. does it not contain any function?
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }
}

/// Source of coupling coefficients when building a rotation invariant basis.
pub trait CouplingCoefficients: Send + Sync {
    /// Get the coefficients coupling the products of one-particle functions
    /// with neighbor species `zz`, radial indices `nn` and angular indices
    /// `ll`, around a center of species `z0`.
    fn coupling(&self, z0: i32, zz: &[i32], nn: &[usize], ll: &[usize]) -> Result<CouplingBlock, Error>;
}

type Signature = (Vec<i32>, Vec<usize>, Vec<usize>);

/// Coupling coefficients for invariance under 3D rotations.
///
/// Products are coupled through all the binary coupling trees
/// `l_1 ⊗ l_2 → L_1`, `L_1 ⊗ l_3 → L_2`, ... ending at a total angular
/// momentum of 0. The resulting functions are then made linearly independent
/// once symmetrized over the permutations of identical one-particle
/// functions, and orthonormal with respect to this symmetrized product.
///
/// The coefficients do not depend on the center species, and are cached for
/// each signature.
#[derive(Debug, Default)]
pub struct Rotation3DCoefficients {
    cache: Mutex<HashMap<Signature, CouplingBlock>>,
}

impl Rotation3DCoefficients {
    /// Create a new set of coupling coefficients with an empty cache
    pub fn new() -> Rotation3DCoefficients {
        Rotation3DCoefficients::default()
    }

    /// Get the number of signatures currently in the cache
    pub fn cache_size(&self) -> usize {
        self.cache.lock().expect("mutex was poisoned").len()
    }
}

impl CouplingCoefficients for Rotation3DCoefficients {
    fn coupling(&self, _: i32, zz: &[i32], nn: &[usize], ll: &[usize]) -> Result<CouplingBlock, Error> {
        if zz.len() != nn.len() || zz.len() != ll.len() {
            return Err(Error::InvalidParameter(format!(
                "inconsistent signature for coupling coefficients: got {} species, {} radial and {} angular indexes",
                zz.len(), nn.len(), ll.len()
            )));
        }

        let signature = (zz.to_vec(), nn.to_vec(), ll.to_vec());
        if let Some(block) = self.cache.lock().expect("mutex was poisoned").get(&signature) {
            debug!("using cached coupling coefficients for zz={:?} nn={:?} ll={:?}", zz, nn, ll);
            return Ok(block.clone());
        }

        let block = compute_coupling(zz, nn, ll);
        debug!(
            "computed coupling coefficients for zz={:?} nn={:?} ll={:?}: {} functions from {} m-tuples",
            zz, nn, ll, block.n_rows(), block.m_tuples.len()
        );

        self.cache.lock().expect("mutex was poisoned").insert(signature, block.clone());
        return Ok(block);
    }
}

fn compute_coupling(zz: &[i32], nn: &[usize], ll: &[usize]) -> CouplingBlock {
    match ll.len() {
        0 => CouplingBlock::empty(),
        1 => {
            if ll[0] == 0 {
                CouplingBlock {
                    coefficients: Array2::ones((1, 1)),
                    m_tuples: vec![vec![0]],
                }
            } else {
                CouplingBlock::empty()
            }
        }
        _ => {
            let m_tuples = m_tuples(ll);
            let coupled = coupling_trees(ll, &m_tuples);
            if coupled.nrows() == 0 {
                return CouplingBlock {
                    coefficients: coupled,
                    m_tuples: m_tuples,
                };
            }

            let (gram, n_permutations) = symmetrized_gram(zz, nn, ll, &coupled, &m_tuples);
            let eigen = SymmetricEigen::new(gram);

            // coupled functions have unit norm, so the eigenvalues of a
            // non-vanishing Gram matrix are of the order of n_permutations
            let scale = n_permutations as f64;
            let significant = eigen.significant(EIGENVALUE_RTOL).into_iter()
                .filter(|&i| eigen.eigenvalues[i] > EIGENVALUE_RTOL * scale)
                .collect::<Vec<_>>();
            let mut coefficients = Array2::zeros((significant.len(), m_tuples.len()));
            for (row, &i) in significant.iter().enumerate() {
                let vector = eigen.eigenvectors.column(i);
                let scale = 1.0 / f64::sqrt(eigen.eigenvalues[i]);
                coefficients.row_mut(row).assign(&(vector.dot(&coupled) * scale));
            }

            CouplingBlock {
                coefficients: coefficients,
                m_tuples: m_tuples,
            }
        }
    }
}

/// Get all ordered tuples of `m` with `|m_i| <= l_i` and `Σ m_i = 0`, in
/// lexicographic order
fn m_tuples(ll: &[usize]) -> Vec<Vec<isize>> {
    ll.iter()
        .map(|&l| -(l as isize)..=(l as isize))
        .multi_cartesian_product()
        .filter(|mm| mm.iter().sum::<isize>() == 0)
        .collect()
}

/// Get all sequences of intermediate angular momenta `L_1, ..., L_{N-2}`
/// coupling `ll` to a total angular momentum of 0
fn intermediate_momenta(ll: &[usize]) -> Vec<Vec<usize>> {
    let mut all = Vec::new();
    let mut current = Vec::new();
    intermediate_momenta_recursive(ll, ll[0], 1, &mut current, &mut all);
    return all;
}

fn intermediate_momenta_recursive(
    ll: &[usize],
    previous: usize,
    next: usize,
    current: &mut Vec<usize>,
    all: &mut Vec<Vec<usize>>,
) {
    if next == ll.len() - 1 {
        // the last coupling must give L = 0
        if previous == ll[next] {
            all.push(current.clone());
        }
        return;
    }

    let l = ll[next];
    let min = if previous > l { previous - l } else { l - previous };
    for coupled in min..=(previous + l) {
        current.push(coupled);
        intermediate_momenta_recursive(ll, coupled, next + 1, current, all);
        current.pop();
    }
}

/// Evaluate the coupling coefficients for each coupling tree (rows) and each
/// m-tuple (columns)
fn coupling_trees(ll: &[usize], m_tuples: &[Vec<isize>]) -> Array2<f64> {
    let trees = intermediate_momenta(ll);
    let mut coupled = Array2::zeros((trees.len(), m_tuples.len()));

    for (i_tree, tree) in trees.iter().enumerate() {
        // L_0 = l_1, L_k from the tree, and L_{N - 1} = 0
        let mut momenta = Vec::with_capacity(ll.len());
        momenta.push(ll[0]);
        momenta.extend_from_slice(tree);
        momenta.push(0);

        for (i_m, mm) in m_tuples.iter().enumerate() {
            let mut value = 1.0;
            let mut previous_m = mm[0];
            for k in 1..ll.len() {
                let coupled_m = previous_m + mm[k];
                value *= clebsch_gordan(momenta[k - 1], previous_m, ll[k], mm[k], momenta[k], coupled_m);
                if value == 0.0 {
                    break;
                }
                previous_m = coupled_m;
            }
            coupled[[i_tree, i_m]] = value;
        }
    }

    return coupled;
}

/// Compute the Gram matrix `Σ_σ U[:, mm] U[:, σ(mm)]^T` of the coupled
/// functions, summing over all permutations `σ` that leave the signature
/// unchanged. This also returns the number of such permutations.
fn symmetrized_gram(
    zz: &[i32],
    nn: &[usize],
    ll: &[usize],
    coupled: &Array2<f64>,
    m_tuples: &[Vec<isize>],
) -> (Array2<f64>, usize) {
    let order = ll.len();
    let columns = m_tuples.iter()
        .enumerate()
        .map(|(i, mm)| (mm.clone(), i))
        .collect::<HashMap<_, _>>();

    let n_rows = coupled.nrows();
    let mut gram = Array2::zeros((n_rows, n_rows));
    let mut n_permutations = 0;
    for permutation in (0..order).permutations(order) {
        let preserves_signature = permutation.iter().enumerate().all(|(i, &p)| {
            zz[i] == zz[p] && nn[i] == nn[p] && ll[i] == ll[p]
        });
        if !preserves_signature {
            continue;
        }
        n_permutations += 1;

        let permuted_columns = m_tuples.iter().map(|mm| {
            let permuted = permutation.iter().map(|&p| mm[p]).collect::<Vec<_>>();
            columns[&permuted]
        }).collect::<Vec<_>>();

        let permuted = coupled.select(Axis(1), &permuted_columns);
        gram += &coupled.dot(&permuted.t());
    }

    // remove rounding errors breaking the symmetry
    let transposed = gram.t().to_owned();
    return ((gram + transposed) / 2.0, n_permutations);
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn order_one() {
        let oracle = Rotation3DCoefficients::new();

        let block = oracle.coupling(1, &[1], &[3], &[0]).unwrap();
        assert_eq!(block.coefficients, ndarray::array![[1.0]]);
        assert_eq!(block.m_tuples, vec![vec![0]]);

        let block = oracle.coupling(1, &[1], &[3], &[2]).unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn degenerate_blocks() {
        let oracle = Rotation3DCoefficients::new();

        // l1 != l2 can not couple to 0
        assert!(oracle.coupling(1, &[1, 1], &[1, 2], &[1, 2]).unwrap().is_empty());
        // 1 ⊗ 1 ⊗ 1 does contain an invariant, but identical functions make
        // it vanish after symmetrization
        assert!(oracle.coupling(1, &[1, 1, 1], &[1, 1, 1], &[1, 1, 1]).unwrap().is_empty());
        // a single l=1 function can not be coupled with two l=0 functions
        assert!(oracle.coupling(1, &[1, 1, 1], &[1, 2, 3], &[0, 0, 1]).unwrap().is_empty());
    }

    #[test]
    fn order_two() {
        let oracle = Rotation3DCoefficients::new();
        let block = oracle.coupling(1, &[1, 1], &[1, 2], &[1, 1]).unwrap();

        assert_eq!(block.m_tuples, vec![vec![-1, 1], vec![0, 0], vec![1, -1]]);
        assert_eq!(block.n_rows(), 1);

        // proportional to <1 m; 1 -m | 0 0> = (-1)^(1 - m) / sqrt(3)
        let row = block.coefficients.row(0);
        let sign = row[0].signum();
        let expected = 1.0 / f64::sqrt(3.0);
        assert_relative_eq!(sign * row[0], expected, max_relative=1e-12);
        assert_relative_eq!(sign * row[1], -expected, max_relative=1e-12);
        assert_relative_eq!(sign * row[2], expected, max_relative=1e-12);
    }

    #[test]
    fn identical_functions() {
        let oracle = Rotation3DCoefficients::new();
        let block = oracle.coupling(1, &[1, 1], &[2, 2], &[2, 2]).unwrap();
        assert_eq!(block.n_rows(), 1);
        assert_eq!(block.m_tuples.len(), 5);

        let block = oracle.coupling(1, &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]).unwrap();
        // (r·r)^2 is the only invariant built from four identical l=1 functions
        assert_eq!(block.n_rows(), 1);
    }

    #[test]
    fn independent_functions() {
        // 1 ⊗ 1 ⊗ 2 ⊗ 2 with distinct functions has one invariant per
        // possible intermediate L in {0, 1, 2}
        let oracle = Rotation3DCoefficients::new();
        let block = oracle.coupling(1, &[1, 1, 1, 1], &[1, 2, 1, 2], &[1, 1, 2, 2]).unwrap();
        assert_eq!(block.n_rows(), 3);

        // rows are orthonormal when there are no permutations to consider
        let overlap = block.coefficients.dot(&block.coefficients.t());
        assert_relative_eq!(overlap, Array2::<f64>::eye(3), epsilon=1e-12);
    }

    #[test]
    fn zero_sum_m_tuples() {
        let tuples = m_tuples(&[1, 2, 1]);
        for mm in &tuples {
            assert_eq!(mm.iter().sum::<isize>(), 0);
            assert!(mm[0].abs() <= 1 && mm[1].abs() <= 2 && mm[2].abs() <= 1);
        }
        // for each (m1, m3), m2 = -(m1 + m3) is always allowed
        assert_eq!(tuples.len(), 9);

        let mut sorted = tuples.clone();
        sorted.sort();
        assert_eq!(sorted, tuples);
    }

    #[test]
    fn trees() {
        assert_eq!(intermediate_momenta(&[1, 1]), vec![Vec::<usize>::new()]);
        assert!(intermediate_momenta(&[1, 2]).is_empty());
        assert_eq!(intermediate_momenta(&[1, 1, 2]), vec![vec![2]]);
        assert_eq!(intermediate_momenta(&[2, 1, 1]), vec![vec![1]]);
        assert_eq!(intermediate_momenta(&[1, 1, 1, 1]), vec![vec![0, 1], vec![1, 1], vec![2, 1]]);
    }

    #[test]
    fn cache() {
        let oracle = Rotation3DCoefficients::new();
        assert_eq!(oracle.cache_size(), 0);

        let first = oracle.coupling(1, &[1, 1, 1], &[1, 2, 3], &[1, 1, 2]).unwrap();
        assert_eq!(oracle.cache_size(), 1);

        // the center species does not change the coefficients
        let second = oracle.coupling(8, &[1, 1, 1], &[1, 2, 3], &[1, 1, 2]).unwrap();
        assert_eq!(oracle.cache_size(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_signature() {
        let oracle = Rotation3DCoefficients::new();
        assert!(oracle.coupling(1, &[1, 1], &[1], &[0, 0]).is_err());
    }
}
