//! Rotation and permutation invariant (RPI) basis, obtained by projecting the
//! permutation invariant products of one-particle functions with coupling
//! coefficients.

use std::cell::RefCell;
use std::ops::Range;

use indexmap::IndexSet;
use log::{info, warn};
use ndarray::{s, Array1, Array2, Array3, ArrayViewMut1, ArrayViewMut3, Axis};
use num_complex::Complex64;
use rayon::prelude::*;
use thread_local::ThreadLocal;

use crate::{Environment, Error, SparseMatrix};
use crate::basis::{DegreeFunction, OneParticleBasis, SphericalBasis};
use crate::coupling::{CouplingCoefficients, Rotation3DCoefficients};
use crate::pibasis::{rpi_filter, PIBasis};

mod a2b;
use self::a2b::build_a2b_map;

mod parameters;
pub use self::parameters::RpiBasisParameters;

/// Scratch memory used when evaluating a [`RpiBasis`].
///
/// Temporaries are tied to the basis they were allocated for, and should not
/// be shared between threads.
#[derive(Debug, Clone)]
pub struct RpiTemporaries<T> {
    /// scratch memory for the one-particle basis
    one_particle: T,
    /// values of the one-particle basis, summed over neighbors
    a: Array1<Complex64>,
    /// values of the PI basis, sized for the largest species
    aa: Array1<Complex64>,
    /// gradients of the one-particle functions, `(n_neighbors, 3, n_a)`
    a_gradients: Array3<Complex64>,
    /// gradients of the PI basis, `(n_neighbors, 3, n_aa)`
    aa_gradients: Array3<Complex64>,
}

impl<T> RpiTemporaries<T> {
    /// Get the number of neighbors these temporaries can store gradients for
    pub fn neighbors_capacity(&self) -> usize {
        self.a_gradients.shape()[0]
    }

    /// Make sure gradients for at least `n_neighbors` neighbors fit
    fn reserve_neighbors(&mut self, n_neighbors: usize) {
        if n_neighbors <= self.neighbors_capacity() {
            return;
        }

        let n_a = self.a_gradients.shape()[2];
        let n_aa = self.aa_gradients.shape()[2];
        self.a_gradients = Array3::from_elem((n_neighbors, 3, n_a), Complex64::new(0.0, 0.0));
        self.aa_gradients = Array3::from_elem((n_neighbors, 3, n_aa), Complex64::new(0.0, 0.0));
    }
}

/// Rotation and permutation invariant basis.
///
/// This stores, for each center species, the sparse projection (A2B map) from
/// the permutation invariant products of one-particle functions to the final
/// basis functions. Outputs for all species are concatenated, the range of
/// outputs used by each species is given by [`RpiBasis::bz0inds`].
///
/// The basis is immutable once created, and can be shared between threads.
#[derive(Debug, Clone)]
pub struct RpiBasis<B = SphericalBasis> {
    one_particle: B,
    pibasis: PIBasis,
    a2b_maps: Vec<SparseMatrix>,
    bz0inds: Vec<Range<usize>>,
}

impl RpiBasis<SphericalBasis> {
    /// Create a new basis with [`SphericalBasis`] one-particle functions
    /// from the given parameters.
    pub fn from_parameters(parameters: RpiBasisParameters) -> Result<RpiBasis<SphericalBasis>, Error> {
        parameters.degree.validate()?;
        validate_max_degree(parameters.max_degree)?;

        // the one-particle basis needs at least one function even if the
        // degree bound would not admit any, these are then removed when
        // enumerating products.
        let max_radial = usize::max(parameters.degree.max_radial(parameters.max_degree), 1);
        let max_angular = parameters.degree.max_angular(parameters.max_degree);

        let one_particle = SphericalBasis::new(
            &parameters.species,
            max_radial,
            max_angular,
            parameters.cutoff,
            parameters.cutoff_function,
        )?;

        return RpiBasis::new(
            one_particle,
            parameters.max_correlation,
            &parameters.degree,
            parameters.max_degree,
        );
    }

    /// Create a new basis from JSON-formatted [`RpiBasisParameters`]
    pub fn from_json(parameters: &str) -> Result<RpiBasis<SphericalBasis>, Error> {
        let parameters = serde_json::from_str::<RpiBasisParameters>(parameters)?;
        return RpiBasis::from_parameters(parameters);
    }
}

impl<B: OneParticleBasis> RpiBasis<B> {
    /// Create a new basis with products of up to `max_correlation` functions
    /// from `one_particle`, with a `degree` up to `max_degree`. The
    /// coefficients for invariance under 3D rotations are computed with
    /// [`Rotation3DCoefficients`].
    pub fn new<D>(
        one_particle: B,
        max_correlation: usize,
        degree: &D,
        max_degree: f64,
    ) -> Result<RpiBasis<B>, Error> where D: DegreeFunction + ?Sized {
        let coupling = Rotation3DCoefficients::new();
        return RpiBasis::with_coupling(one_particle, max_correlation, degree, max_degree, &coupling);
    }

    /// Create a new basis as [`RpiBasis::new`], using custom `coupling`
    /// coefficients
    pub fn with_coupling<D, C>(
        one_particle: B,
        max_correlation: usize,
        degree: &D,
        max_degree: f64,
        coupling: &C,
    ) -> Result<RpiBasis<B>, Error> where
        D: DegreeFunction + ?Sized,
        C: CouplingCoefficients + ?Sized,
    {
        validate_max_degree(max_degree)?;
        validate_one_particle(&one_particle)?;

        let species = one_particle.species().to_vec();
        let pibasis = PIBasis::new(
            one_particle.functions(),
            &species,
            max_correlation,
            degree,
            max_degree,
            |_, functions| rpi_filter(functions),
        );

        let a2b_maps = (0..species.len())
            .into_par_iter()
            .map(|species_index| build_a2b_map(&pibasis, species_index, coupling))
            .collect::<Result<Vec<_>, Error>>()?;

        let mut bz0inds = Vec::with_capacity(species.len());
        let mut start = 0;
        for (a2b, &z0) in a2b_maps.iter().zip(&species) {
            let stop = start + a2b.nrows();
            info!(
                "basis for center species {}: {} PI functions, {} RPI functions",
                z0, a2b.ncols(), a2b.nrows()
            );
            bz0inds.push(start..stop);
            start = stop;
        }

        if start == 0 {
            warn!(
                "the RPI basis does not contain any function (max_correlation = {}, max_degree = {})",
                max_correlation, max_degree
            );
        }

        return Ok(RpiBasis {
            one_particle,
            pibasis,
            a2b_maps,
            bz0inds,
        });
    }

    /// Get the total number of functions in this basis, for all species
    pub fn len(&self) -> usize {
        self.bz0inds.last().map_or(0, |range| range.end)
    }

    /// Is this basis empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of functions in this basis for center species `z0`
    pub fn len_for_species(&self, z0: i32) -> Result<usize, Error> {
        let species_index = self.species_index(z0)?;
        return Ok(self.bz0inds[species_index].len());
    }

    /// Get the list of species in this basis
    pub fn species(&self) -> &[i32] {
        self.pibasis.species()
    }

    /// Get the range of outputs corresponding to each species, in the same
    /// order as [`RpiBasis::species`]
    pub fn bz0inds(&self) -> &[Range<usize>] {
        &self.bz0inds
    }

    /// Get the sparse projection from the PI basis to this basis for center
    /// species `z0`
    pub fn a2b_map(&self, z0: i32) -> Result<&SparseMatrix, Error> {
        let species_index = self.species_index(z0)?;
        return Ok(&self.a2b_maps[species_index]);
    }

    /// Get the permutation invariant basis underlying this basis
    pub fn pibasis(&self) -> &PIBasis {
        &self.pibasis
    }

    /// Get the one-particle basis underlying this basis
    pub fn one_particle(&self) -> &B {
        &self.one_particle
    }

    /// Allocate scratch memory to evaluate this basis on environments
    pub fn allocate_temporaries(&self) -> RpiTemporaries<B::Temporaries> {
        self.allocate_gradient_temporaries(0)
    }

    /// Allocate scratch memory to evaluate this basis and its gradients on
    /// environments with up to `n_neighbors` neighbors. Larger environments
    /// are still supported, but require new allocations.
    pub fn allocate_gradient_temporaries(&self, n_neighbors: usize) -> RpiTemporaries<B::Temporaries> {
        let n_a = self.one_particle.functions().len();
        let n_aa = (0..self.species().len())
            .map(|species_index| self.pibasis.len(species_index))
            .max()
            .unwrap_or(0);

        let zero = Complex64::new(0.0, 0.0);
        RpiTemporaries {
            one_particle: self.one_particle.allocate_temporaries(),
            a: Array1::from_elem(n_a, zero),
            aa: Array1::from_elem(n_aa, zero),
            a_gradients: Array3::from_elem((n_neighbors, 3, n_a), zero),
            aa_gradients: Array3::from_elem((n_neighbors, 3, n_aa), zero),
        }
    }

    fn species_index(&self, z0: i32) -> Result<usize, Error> {
        self.pibasis.species_index(z0).ok_or(Error::UnknownSpecies(z0))
    }

    /// Check the environment and temporaries, returning the index of the
    /// center species
    fn check_environment(
        &self,
        environment: &Environment,
        temporaries: &RpiTemporaries<B::Temporaries>,
    ) -> Result<usize, Error> {
        environment.validate()?;

        let species_index = self.species_index(environment.center())?;
        for &species in environment.species() {
            if !self.species().contains(&species) {
                return Err(Error::UnknownSpecies(species));
            }
        }

        if temporaries.a.len() != self.one_particle.functions().len()
            || temporaries.aa.len() < self.pibasis.len(species_index) {
            return Err(Error::InvalidParameter(
                "the temporaries were not allocated for this basis".into()
            ));
        }

        return Ok(species_index);
    }

    /// Evaluate all basis functions on the given `environment`, and store
    /// the results in `output`.
    ///
    /// Only the entries in the range associated with the center species are
    /// non-zero, all other entries are set to zero.
    #[time_graph::instrument(name = "RpiBasis::evaluate")]
    pub fn evaluate(
        &self,
        environment: &Environment,
        temporaries: &mut RpiTemporaries<B::Temporaries>,
        mut output: ArrayViewMut1<'_, f64>,
    ) -> Result<(), Error> {
        let species_index = self.check_environment(environment, temporaries)?;
        if output.len() != self.len() {
            return Err(Error::InvalidEnvironment(format!(
                "wrong size for the output array: expected {}, got {}",
                self.len(), output.len()
            )));
        }

        self.one_particle.compute(environment, &mut temporaries.one_particle, temporaries.a.view_mut());

        let n_aa = self.pibasis.len(species_index);
        let mut aa = temporaries.aa.slice_mut(s![..n_aa]);
        self.pibasis.evaluate(species_index, temporaries.a.view(), aa.view_mut());

        output.fill(0.0);
        let range = self.bz0inds[species_index].clone();
        self.a2b_maps[species_index].real_dot_into(aa.view(), output.slice_mut(s![range]));

        return Ok(());
    }

    /// Evaluate the gradients of all basis functions with respect to the
    /// neighbors positions in the given `environment`, and store the results
    /// in `output`, with shape `(len, n_neighbors, 3)`.
    #[time_graph::instrument(name = "RpiBasis::evaluate_gradient")]
    pub fn evaluate_gradient(
        &self,
        environment: &Environment,
        temporaries: &mut RpiTemporaries<B::Temporaries>,
        mut output: ArrayViewMut3<'_, f64>,
    ) -> Result<(), Error> {
        let species_index = self.check_environment(environment, temporaries)?;
        let n_neighbors = environment.len();
        if output.shape() != [self.len(), n_neighbors, 3] {
            return Err(Error::InvalidEnvironment(format!(
                "wrong shape for the gradient array: expected {:?}, got {:?}",
                [self.len(), n_neighbors, 3], output.shape()
            )));
        }

        temporaries.reserve_neighbors(n_neighbors);

        self.one_particle.compute_gradients(
            environment,
            &mut temporaries.one_particle,
            temporaries.a.view_mut(),
            temporaries.a_gradients.slice_mut(s![..n_neighbors, .., ..]),
        );

        let n_aa = self.pibasis.len(species_index);
        self.pibasis.evaluate_gradient(
            species_index,
            temporaries.a.view(),
            temporaries.a_gradients.slice(s![..n_neighbors, .., ..]),
            temporaries.aa.slice_mut(s![..n_aa]),
            temporaries.aa_gradients.slice_mut(s![..n_neighbors, .., ..n_aa]),
        );

        output.fill(0.0);
        let a2b = &self.a2b_maps[species_index];
        let range = self.bz0inds[species_index].clone();
        for neighbor in 0..n_neighbors {
            for spatial in 0..3 {
                a2b.real_dot_into(
                    temporaries.aa_gradients.slice(s![neighbor, spatial, ..n_aa]),
                    output.slice_mut(s![range.clone(), neighbor, spatial]),
                );
            }
        }

        return Ok(());
    }

    /// Evaluate all basis functions on the given `environment`, allocating
    /// new temporaries and output
    pub fn compute(&self, environment: &Environment) -> Result<Array1<f64>, Error> {
        let mut temporaries = self.allocate_temporaries();
        let mut output = Array1::zeros(self.len());
        self.evaluate(environment, &mut temporaries, output.view_mut())?;
        return Ok(output);
    }

    /// Evaluate the gradients of all basis functions on the given
    /// `environment`, allocating new temporaries and output
    pub fn compute_gradient(&self, environment: &Environment) -> Result<Array3<f64>, Error> {
        let mut temporaries = self.allocate_gradient_temporaries(environment.len());
        let mut output = Array3::zeros((self.len(), environment.len(), 3));
        self.evaluate_gradient(environment, &mut temporaries, output.view_mut())?;
        return Ok(output);
    }

    /// Evaluate all basis functions on multiple environments in parallel.
    /// The output contains one row for each environment.
    pub fn compute_many(&self, environments: &[Environment]) -> Result<Array2<f64>, Error> {
        let mut output = Array2::zeros((environments.len(), self.len()));
        let temporaries = ThreadLocal::new();

        output.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(environments.par_iter())
            .try_for_each(|(row, environment)| {
                let mut temporaries = temporaries.get_or(|| {
                    RefCell::new(self.allocate_temporaries())
                }).borrow_mut();

                self.evaluate(environment, &mut temporaries, row)
            })?;

        return Ok(output);
    }
}

fn validate_max_degree(max_degree: f64) -> Result<(), Error> {
    if !max_degree.is_finite() || max_degree < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "expected a positive and finite maximal degree, got {}", max_degree
        )));
    }
    return Ok(());
}

/// Check that the one-particle basis is usable to build a RPI basis
fn validate_one_particle<B: OneParticleBasis>(one_particle: &B) -> Result<(), Error> {
    let species = one_particle.species();
    if species.is_empty() {
        return Err(Error::InvalidParameter(
            "the list of species can not be empty".into()
        ));
    }

    let unique = species.iter().copied().collect::<IndexSet<_>>();
    if unique.len() != species.len() {
        return Err(Error::InvalidParameter(format!(
            "the list of species contains duplicated entries: {:?}", species
        )));
    }

    let functions = one_particle.functions();
    for function in functions {
        if !unique.contains(&function.species) {
            return Err(Error::InvalidParameter(format!(
                "one-particle function {:?} uses a species which is not in the basis", function
            )));
        }

        if function.n == 0 || function.m.unsigned_abs() > function.l {
            return Err(Error::InvalidParameter(format!(
                "invalid one-particle function {:?}", function
            )));
        }
    }

    if !functions.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(Error::InvalidParameter(
            "one-particle functions must be sorted and unique".into()
        ));
    }

    return Ok(());
}
