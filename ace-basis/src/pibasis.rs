//! Permutation-invariant (PI) basis: all symmetric products of one-particle
//! functions up to a maximal correlation order and degree.

use std::collections::HashMap;

use log::debug;
use ndarray::{ArrayView1, ArrayView3, ArrayViewMut1, ArrayViewMut3};
use num_complex::Complex64;
use num_traits::{One, Zero};

use crate::basis::{DegreeFunction, OneParticleFunction};

/// A single function in the PI basis: the product of the one-particle
/// functions at the given A-indices, for a given center species.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PIBasisFunction {
    /// species of the central atom
    pub z0: i32,
    /// A-indices of the one-particle functions in this product, always
    /// sorted in increasing order
    pub indices: Vec<usize>,
}

impl PIBasisFunction {
    /// Get the correlation order of this function
    pub fn order(&self) -> usize {
        self.indices.len()
    }
}

/// Filter for PI basis functions that can contribute to the rotation
/// invariant basis:
///
/// - order 0 is never kept;
/// - order 1 is kept only for `l = 0`;
/// - higher orders are kept only if `Σ l` is even and `Σ m = 0`.
pub fn rpi_filter(functions: &[OneParticleFunction]) -> bool {
    match functions.len() {
        0 => false,
        1 => functions[0].l == 0,
        _ => {
            let sum_l = functions.iter().map(|f| f.l).sum::<usize>();
            let sum_m = functions.iter().map(|f| f.m).sum::<isize>();
            sum_l % 2 == 0 && sum_m == 0
        }
    }
}

/// The permutation-invariant basis, storing the functions for each center
/// species separately.
#[derive(Debug, Clone)]
pub struct PIBasis {
    species: Vec<i32>,
    max_correlation: usize,
    one_particle: Vec<OneParticleFunction>,
    /// functions for each species, ordered by correlation order and then
    /// lexicographically by indices
    functions: Vec<Vec<PIBasisFunction>>,
    /// map from sorted A-indices to position in `functions`, for each species
    lookup: Vec<HashMap<Vec<usize>, usize>>,
}

impl PIBasis {
    /// Enumerate all the products of up to `max_correlation` functions taken
    /// from `one_particle` with a degree lower or equal to `max_degree`, and
    /// keep the ones for which `keep(z0, functions)` returns `true`, for
    /// each center species `z0` in `species`.
    ///
    /// The enumeration assumes that replacing a function in a product by one
    /// with larger one-particle degree never decreases the product degree,
    /// which is true for additive degrees.
    pub fn new<D, F>(
        one_particle: &[OneParticleFunction],
        species: &[i32],
        max_correlation: usize,
        degree: &D,
        max_degree: f64,
        keep: F,
    ) -> PIBasis where
        D: DegreeFunction + ?Sized,
        F: Fn(i32, &[OneParticleFunction]) -> bool,
    {
        let candidates = sorted_by_degree(one_particle, degree, max_degree);

        let mut all_tuples = Vec::new();
        let mut current = Vec::new();
        enumerate_products(
            one_particle,
            &candidates,
            0,
            max_correlation,
            degree,
            max_degree,
            &mut current,
            &mut all_tuples,
        );

        for tuple in &mut all_tuples {
            tuple.sort_unstable();
        }
        all_tuples.sort_unstable_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        all_tuples.dedup();

        debug!(
            "enumerated {} products of one-particle functions up to order {} and degree {}",
            all_tuples.len(), max_correlation, max_degree
        );

        let mut functions = Vec::with_capacity(species.len());
        let mut lookup = Vec::with_capacity(species.len());
        let mut buffer = Vec::new();
        for &z0 in species {
            let mut species_functions = Vec::new();
            let mut species_lookup = HashMap::new();
            for tuple in &all_tuples {
                buffer.clear();
                buffer.extend(tuple.iter().map(|&k| one_particle[k]));
                if !keep(z0, &buffer) {
                    continue;
                }

                species_lookup.insert(tuple.clone(), species_functions.len());
                species_functions.push(PIBasisFunction {
                    z0: z0,
                    indices: tuple.clone(),
                });
            }

            functions.push(species_functions);
            lookup.push(species_lookup);
        }

        return PIBasis {
            species: species.to_vec(),
            max_correlation: max_correlation,
            one_particle: one_particle.to_vec(),
            functions: functions,
            lookup: lookup,
        };
    }

    /// Get the list of center species in this basis
    pub fn species(&self) -> &[i32] {
        &self.species
    }

    /// Get the position of the center species `z0` in [`PIBasis::species`]
    pub fn species_index(&self, z0: i32) -> Option<usize> {
        self.species.iter().position(|&s| s == z0)
    }

    /// Get the maximal correlation order used to create this basis
    pub fn max_correlation(&self) -> usize {
        self.max_correlation
    }

    /// Get the one-particle functions used to create this basis, indexed by
    /// A-index
    pub fn one_particle(&self) -> &[OneParticleFunction] {
        &self.one_particle
    }

    /// Get the number of PI functions for the species at `species_index`
    pub fn len(&self, species_index: usize) -> usize {
        self.functions[species_index].len()
    }

    /// Get all PI functions for the species at `species_index`, the position
    /// of a function in this list is its AA-index
    pub fn functions(&self, species_index: usize) -> &[PIBasisFunction] {
        &self.functions[species_index]
    }

    /// Get the AA-index for the product of the one-particle functions at
    /// `indices`, which must be sorted. This returns `None` if this product
    /// is not part of the basis.
    pub fn lookup(&self, species_index: usize, indices: &[usize]) -> Option<usize> {
        debug_assert!(indices.windows(2).all(|w| w[0] <= w[1]));
        self.lookup[species_index].get(indices).copied()
    }

    /// Compute `AA_i = Π_k A_k` for all functions of the species at
    /// `species_index`, using the one-particle values in `a`.
    #[time_graph::instrument(name = "PIBasis::evaluate")]
    pub fn evaluate(
        &self,
        species_index: usize,
        a: ArrayView1<'_, Complex64>,
        mut aa: ArrayViewMut1<'_, Complex64>,
    ) {
        let functions = &self.functions[species_index];
        assert_eq!(a.len(), self.one_particle.len(), "wrong size for the A values");
        assert_eq!(aa.len(), functions.len(), "wrong size for the AA values");

        for (function, aa) in functions.iter().zip(aa.iter_mut()) {
            let mut product = Complex64::one();
            for &k in &function.indices {
                product *= a[k];
            }
            *aa = product;
        }
    }

    /// Compute `AA_i` as [`PIBasis::evaluate`], together with the gradients
    /// of `AA_i` with respect to all neighbors positions.
    ///
    /// `a_gradients` contains the gradients of the one-particle functions for
    /// each neighbor, with shape `(n_neighbors, 3, n_one_particle)`, and
    /// `aa_gradients` will be filled with shape `(n_neighbors, 3, n_functions)`.
    #[time_graph::instrument(name = "PIBasis::evaluate_gradient")]
    pub fn evaluate_gradient(
        &self,
        species_index: usize,
        a: ArrayView1<'_, Complex64>,
        a_gradients: ArrayView3<'_, Complex64>,
        mut aa: ArrayViewMut1<'_, Complex64>,
        mut aa_gradients: ArrayViewMut3<'_, Complex64>,
    ) {
        let functions = &self.functions[species_index];
        let n_neighbors = a_gradients.shape()[0];
        assert_eq!(a.len(), self.one_particle.len(), "wrong size for the A values");
        assert_eq!(a_gradients.shape(), [n_neighbors, 3, self.one_particle.len()], "wrong shape for the A gradients");
        assert_eq!(aa.len(), functions.len(), "wrong size for the AA values");
        assert_eq!(aa_gradients.shape(), [n_neighbors, 3, functions.len()], "wrong shape for the AA gradients");

        // product of all factors except the one at a given position
        let mut partial_products = Vec::new();
        for (i_function, function) in functions.iter().enumerate() {
            let indices = &function.indices;

            partial_products.clear();
            partial_products.resize(indices.len(), Complex64::one());

            let mut prefix = Complex64::one();
            for (t, &k) in indices.iter().enumerate() {
                partial_products[t] = prefix;
                prefix *= a[k];
            }
            aa[i_function] = prefix;

            let mut suffix = Complex64::one();
            for (t, &k) in indices.iter().enumerate().rev() {
                partial_products[t] *= suffix;
                suffix *= a[k];
            }

            for neighbor in 0..n_neighbors {
                for spatial in 0..3 {
                    let mut gradient = Complex64::zero();
                    for (t, &k) in indices.iter().enumerate() {
                        gradient += partial_products[t] * a_gradients[[neighbor, spatial, k]];
                    }
                    aa_gradients[[neighbor, spatial, i_function]] = gradient;
                }
            }
        }
    }
}

/// Get the A-indices of all one-particle functions with a degree lower than
/// `max_degree`, sorted by increasing degree
fn sorted_by_degree<D: DegreeFunction + ?Sized>(
    one_particle: &[OneParticleFunction],
    degree: &D,
    max_degree: f64,
) -> Vec<usize> {
    let mut candidates = one_particle.iter()
        .enumerate()
        .map(|(k, function)| (degree.one_particle(function), k))
        .filter(|&(d, _)| d <= max_degree)
        .collect::<Vec<_>>();

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    return candidates.into_iter().map(|(_, k)| k).collect();
}

/// Depth-first enumeration of all multisets of `candidates`, using
/// non-decreasing positions in `candidates` to visit each multiset once.
#[allow(clippy::too_many_arguments)]
fn enumerate_products<D: DegreeFunction + ?Sized>(
    one_particle: &[OneParticleFunction],
    candidates: &[usize],
    start: usize,
    max_correlation: usize,
    degree: &D,
    max_degree: f64,
    current: &mut Vec<usize>,
    output: &mut Vec<Vec<usize>>,
) {
    output.push(current.clone());
    if current.len() == max_correlation {
        return;
    }

    let mut functions = current.iter().map(|&k| one_particle[k]).collect::<Vec<_>>();
    for position in start..candidates.len() {
        let k = candidates[position];
        functions.push(one_particle[k]);
        let too_large = degree.correlation(&functions) > max_degree;
        functions.pop();

        if too_large {
            // all remaining candidates have a larger degree
            break;
        }

        current.push(k);
        enumerate_products(
            one_particle, candidates, position, max_correlation,
            degree, max_degree, current, output
        );
        current.pop();
    }
}
