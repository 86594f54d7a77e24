//! One-particle basis functions `φ_{z,n,l,m}(r_j, z_j)`, evaluated over the
//! neighbors of an atomic environment, and the degree functionals used to
//! truncate products of these functions.

use ndarray::{ArrayViewMut1, ArrayViewMut3};
use num_complex::Complex64;

use crate::Environment;

mod cutoff;
pub use self::cutoff::CutoffFunction;

mod radial;
pub use self::radial::GtoRadialBasis;

mod degree;
pub use self::degree::{DegreeFunction, SparseDegree};

mod spherical;
pub use self::spherical::{SphericalBasis, SphericalBasisTemporaries};

/// Descriptor of a single one-particle function: neighbor species `z`, radial
/// index `n >= 1`, angular index `l` and `-l <= m <= l`.
///
/// The derived ordering is lexicographic over `(species, n, l, m)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OneParticleFunction {
    /// species of the neighbors this function is non-zero for
    pub species: i32,
    /// radial index
    pub n: usize,
    /// angular index
    pub l: usize,
    /// magnetic index
    pub m: isize,
}

/// A set of one-particle basis functions.
///
/// The position of a function in [`OneParticleBasis::functions`] is its
/// "A-index", used everywhere else to refer to this function.
pub trait OneParticleBasis: Send + Sync {
    /// Scratch memory used when evaluating this basis. Each thread should
    /// use its own temporaries.
    type Temporaries: Send;

    /// Get the list of neighbor species this basis knows about
    fn species(&self) -> &[i32];

    /// Get the list of all one-particle functions in this basis
    fn functions(&self) -> &[OneParticleFunction];

    /// Allocate new scratch memory for this basis
    fn allocate_temporaries(&self) -> Self::Temporaries;

    /// Compute `A_k = Σ_j φ_k(r_j, z_j)` for all functions `k` in this basis
    /// and store the result in `values`, which must have one entry per
    /// function.
    ///
    /// The environment is expected to already be validated.
    fn compute(
        &self,
        environment: &Environment,
        temporaries: &mut Self::Temporaries,
        values: ArrayViewMut1<'_, Complex64>,
    );

    /// Compute `A_k` as [`OneParticleBasis::compute`], together with the
    /// gradients of `φ_k(r_j, z_j)` with respect to each neighbor position
    /// `r_j`. `gradients` must have a shape of `(n_neighbors, 3, n_functions)`.
    fn compute_gradients(
        &self,
        environment: &Environment,
        temporaries: &mut Self::Temporaries,
        values: ArrayViewMut1<'_, Complex64>,
        gradients: ArrayViewMut3<'_, Complex64>,
    );
}
