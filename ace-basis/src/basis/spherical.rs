use std::ops::Range;

use indexmap::IndexSet;
use ndarray::{ArrayViewMut1, ArrayViewMut3};
use num_complex::Complex64;

use crate::{Environment, Error};
use crate::math::{SphericalHarmonics, SphericalHarmonicsArray};

use super::{CutoffFunction, GtoRadialBasis, OneParticleBasis, OneParticleFunction};

/// One-particle basis `φ_{z,n,l,m}(r_j, z_j) = δ(z, z_j) f_c(r_j) R_n(r_j)
/// Y_l^m(r̂_j)`, where `R_n` are GTO radial functions, `f_c` a smooth cutoff
/// function, and `Y_l^m` complex spherical harmonics.
#[derive(Debug, Clone)]
pub struct SphericalBasis {
    species: Vec<i32>,
    max_angular: usize,
    radial: GtoRadialBasis,
    cutoff_function: CutoffFunction,
    functions: Vec<OneParticleFunction>,
    /// range in `functions` for each entry in `species`
    ranges: Vec<Range<usize>>,
}

/// Scratch memory for [`SphericalBasis`]
#[derive(Debug, Clone)]
pub struct SphericalBasisTemporaries {
    spherical_harmonics: SphericalHarmonics,
    sph_values: SphericalHarmonicsArray,
    sph_gradients: [SphericalHarmonicsArray; 3],
    radial_values: Vec<f64>,
    radial_gradients: Vec<f64>,
}

impl SphericalBasis {
    /// Create a new spherical basis for neighbors of the given `species`, with
    /// all functions with `1 <= n <= max_radial` and `0 <= l <= max_angular`.
    pub fn new(
        species: &[i32],
        max_radial: usize,
        max_angular: usize,
        cutoff: f64,
        cutoff_function: CutoffFunction,
    ) -> Result<SphericalBasis, Error> {
        if species.is_empty() {
            return Err(Error::InvalidParameter(
                "the list of species for the one-particle basis can not be empty".into()
            ));
        }

        let unique = species.iter().copied().collect::<IndexSet<_>>();
        if unique.len() != species.len() {
            return Err(Error::InvalidParameter(format!(
                "the list of species for the one-particle basis contains duplicated entries: {:?}",
                species
            )));
        }

        cutoff_function.validate(cutoff)?;
        let radial = GtoRadialBasis::new(max_radial, cutoff)?;

        let mut sorted = species.to_vec();
        sorted.sort_unstable();

        let mut functions = Vec::new();
        for &z in &sorted {
            for n in 1..=max_radial {
                for l in 0..=max_angular {
                    let l_signed = l as isize;
                    for m in -l_signed..=l_signed {
                        functions.push(OneParticleFunction { species: z, n, l, m });
                    }
                }
            }
        }

        // all species have the same number of functions
        let per_species = functions.len() / sorted.len();
        let ranges = species.iter().map(|z| {
            let rank = sorted.iter().filter(|&other| other < z).count();
            (rank * per_species)..((rank + 1) * per_species)
        }).collect();

        return Ok(SphericalBasis {
            species: species.to_vec(),
            max_angular,
            radial,
            cutoff_function,
            functions,
            ranges,
        });
    }

    /// Get the number of radial functions in this basis
    pub fn max_radial(&self) -> usize {
        self.radial.max_radial()
    }

    /// Get the maximal angular index in this basis
    pub fn max_angular(&self) -> usize {
        self.max_angular
    }

    /// Get the cutoff radius of this basis
    pub fn cutoff(&self) -> f64 {
        self.radial.cutoff()
    }

    /// Get the cutoff function of this basis
    pub fn cutoff_function(&self) -> CutoffFunction {
        self.cutoff_function
    }

    fn species_range(&self, species: i32) -> Option<Range<usize>> {
        self.species.iter()
            .position(|&s| s == species)
            .map(|i| self.ranges[i].clone())
    }
}

impl OneParticleBasis for SphericalBasis {
    type Temporaries = SphericalBasisTemporaries;

    fn species(&self) -> &[i32] {
        &self.species
    }

    fn functions(&self) -> &[OneParticleFunction] {
        &self.functions
    }

    fn allocate_temporaries(&self) -> SphericalBasisTemporaries {
        SphericalBasisTemporaries {
            spherical_harmonics: SphericalHarmonics::new(self.max_angular),
            sph_values: SphericalHarmonicsArray::new(self.max_angular),
            sph_gradients: [
                SphericalHarmonicsArray::new(self.max_angular),
                SphericalHarmonicsArray::new(self.max_angular),
                SphericalHarmonicsArray::new(self.max_angular),
            ],
            radial_values: vec![0.0; self.max_radial()],
            radial_gradients: vec![0.0; self.max_radial()],
        }
    }

    fn compute(
        &self,
        environment: &Environment,
        temporaries: &mut SphericalBasisTemporaries,
        mut values: ArrayViewMut1<'_, Complex64>,
    ) {
        assert_eq!(
            values.len(), self.functions.len(),
            "wrong size for the one-particle values, expected {}, got {}",
            self.functions.len(), values.len()
        );

        values.fill(Complex64::new(0.0, 0.0));

        let cutoff = self.cutoff();
        for (&species, &position) in environment.species().iter().zip(environment.positions()) {
            let range = match self.species_range(species) {
                Some(range) => range,
                None => continue,
            };

            let distance = position.norm();
            if distance >= cutoff {
                continue;
            }

            let cutoff_value = self.cutoff_function.compute(distance, cutoff);
            self.radial.compute(distance, &mut temporaries.radial_values, None);
            temporaries.spherical_harmonics.compute(position / distance, &mut temporaries.sph_values, None);

            for k in range {
                let function = &self.functions[k];
                let radial = cutoff_value * temporaries.radial_values[function.n - 1];
                values[k] += radial * temporaries.sph_values[[function.l as isize, function.m]];
            }
        }
    }

    fn compute_gradients(
        &self,
        environment: &Environment,
        temporaries: &mut SphericalBasisTemporaries,
        mut values: ArrayViewMut1<'_, Complex64>,
        mut gradients: ArrayViewMut3<'_, Complex64>,
    ) {
        assert_eq!(
            values.len(), self.functions.len(),
            "wrong size for the one-particle values, expected {}, got {}",
            self.functions.len(), values.len()
        );
        assert_eq!(
            gradients.shape(), [environment.len(), 3, self.functions.len()],
            "wrong shape for the one-particle gradients"
        );

        values.fill(Complex64::new(0.0, 0.0));
        gradients.fill(Complex64::new(0.0, 0.0));

        let cutoff = self.cutoff();
        let neighbors = environment.species().iter().zip(environment.positions());
        for (neighbor, (&species, &position)) in neighbors.enumerate() {
            let range = match self.species_range(species) {
                Some(range) => range,
                None => continue,
            };

            let distance = position.norm();
            if distance >= cutoff {
                continue;
            }

            let direction = position / distance;
            let cutoff_value = self.cutoff_function.compute(distance, cutoff);
            let cutoff_derivative = self.cutoff_function.derivative(distance, cutoff);

            self.radial.compute(
                distance,
                &mut temporaries.radial_values,
                Some(&mut temporaries.radial_gradients),
            );
            temporaries.spherical_harmonics.compute(
                direction,
                &mut temporaries.sph_values,
                Some(&mut temporaries.sph_gradients),
            );

            for k in range {
                let function = &self.functions[k];
                let (l, m) = (function.l as isize, function.m);

                let radial_value = temporaries.radial_values[function.n - 1];
                let radial = cutoff_value * radial_value;
                let radial_derivative = cutoff_derivative * radial_value
                    + cutoff_value * temporaries.radial_gradients[function.n - 1];

                let sph_value = temporaries.sph_values[[l, m]];
                values[k] += radial * sph_value;

                for spatial in 0..3 {
                    let sph_gradient = temporaries.sph_gradients[spatial][[l, m]];
                    gradients[[neighbor, spatial, k]] =
                        radial_derivative * direction[spatial] * sph_value
                        + radial * sph_gradient / distance;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array3};

    use crate::Vector3D;
    use super::*;

    fn environment() -> Environment {
        let mut environment = Environment::new(1);
        environment.add_neighbor(1, Vector3D::new(0.5, 0.8, -0.3));
        environment.add_neighbor(8, Vector3D::new(-1.2, 0.1, 0.7));
        environment.add_neighbor(1, Vector3D::new(0.0, 0.0, 2.1));
        environment.add_neighbor(8, Vector3D::new(0.9, -1.4, 1.1));
        return environment;
    }

    #[test]
    fn functions() {
        let basis = SphericalBasis::new(&[8, 1], 2, 1, 3.5, CutoffFunction::Step{}).unwrap();

        let functions = basis.functions();
        assert_eq!(functions.len(), 2 * 2 * 4);
        assert_eq!(functions[0], OneParticleFunction { species: 1, n: 1, l: 0, m: 0 });
        assert_eq!(functions[1], OneParticleFunction { species: 1, n: 1, l: 1, m: -1 });
        assert_eq!(functions[8], OneParticleFunction { species: 8, n: 1, l: 0, m: 0 });

        let mut sorted = functions.to_vec();
        sorted.sort();
        assert_eq!(sorted, functions);

        assert_eq!(basis.species_range(8), Some(8..16));
        assert_eq!(basis.species_range(1), Some(0..8));
        assert_eq!(basis.species_range(6), None);
    }

    #[test]
    fn species_and_cutoff() {
        let basis = SphericalBasis::new(&[1], 3, 2, 2.0, CutoffFunction::default()).unwrap();
        let mut temporaries = basis.allocate_temporaries();
        let mut values = Array1::from_elem(basis.functions().len(), Complex64::new(1.0, 1.0));

        // unknown species and neighbors outside the cutoff do not contribute
        let mut environment = Environment::new(1);
        environment.add_neighbor(8, Vector3D::new(0.5, 0.0, 0.0));
        environment.add_neighbor(1, Vector3D::new(0.0, 2.5, 0.0));
        basis.compute(&environment, &mut temporaries, values.view_mut());
        assert!(values.iter().all(|v| *v == Complex64::new(0.0, 0.0)));

        // l = 0 functions only have a real part
        environment.add_neighbor(1, Vector3D::new(0.3, 0.4, 0.5));
        basis.compute(&environment, &mut temporaries, values.view_mut());
        let function = basis.functions().iter()
            .position(|f| f.l == 0)
            .unwrap();
        assert!(values[function].re > 0.0);
        assert_eq!(values[function].im, 0.0);
    }

    #[test]
    fn gradients_values_match() {
        let basis = SphericalBasis::new(&[1, 8], 3, 3, 3.0, CutoffFunction::default()).unwrap();
        let environment = environment();
        let n_functions = basis.functions().len();

        let mut temporaries = basis.allocate_temporaries();
        let mut values = Array1::from_elem(n_functions, Complex64::new(0.0, 0.0));
        let mut values_with_gradients = values.clone();
        let mut gradients = Array3::from_elem((environment.len(), 3, n_functions), Complex64::new(0.0, 0.0));

        basis.compute(&environment, &mut temporaries, values.view_mut());
        basis.compute_gradients(&environment, &mut temporaries, values_with_gradients.view_mut(), gradients.view_mut());

        assert_eq!(values, values_with_gradients);
    }

    #[test]
    fn finite_differences() {
        let basis = SphericalBasis::new(&[1, 8], 4, 4, 3.0, CutoffFunction::ShiftedCosine { width: 1.0 }).unwrap();
        let environment = environment();
        let n_functions = basis.functions().len();

        let mut temporaries = basis.allocate_temporaries();
        let mut values = Array1::from_elem(n_functions, Complex64::new(0.0, 0.0));
        let mut values_delta = values.clone();
        let mut gradients = Array3::from_elem((environment.len(), 3, n_functions), Complex64::new(0.0, 0.0));

        basis.compute_gradients(&environment, &mut temporaries, values.view_mut(), gradients.view_mut());

        let delta = 1e-6;
        for neighbor in 0..environment.len() {
            for spatial in 0..3 {
                let mut positions = environment.positions().to_vec();
                positions[neighbor][spatial] += delta;
                let displaced = Environment::from_parts(
                    environment.center(), environment.species().to_vec(), positions
                );

                basis.compute(&displaced, &mut temporaries, values_delta.view_mut());
                for k in 0..n_functions {
                    let finite_difference = (values_delta[k] - values[k]) / delta;
                    let gradient = gradients[[neighbor, spatial, k]];
                    assert_relative_eq!(finite_difference.re, gradient.re, epsilon=1e-5, max_relative=1e-4);
                    assert_relative_eq!(finite_difference.im, gradient.im, epsilon=1e-5, max_relative=1e-4);
                }
            }
        }
    }

    #[test]
    fn invalid_parameters() {
        let error = SphericalBasis::new(&[], 3, 2, 2.0, CutoffFunction::Step{}).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid parameter: the list of species for the one-particle basis can not be empty"
        );

        let error = SphericalBasis::new(&[1, 6, 1], 3, 2, 2.0, CutoffFunction::Step{}).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid parameter: the list of species for the one-particle basis contains duplicated entries: [1, 6, 1]"
        );

        assert!(SphericalBasis::new(&[1], 0, 2, 2.0, CutoffFunction::Step{}).is_err());
        assert!(SphericalBasis::new(&[1], 3, 2, 0.0, CutoffFunction::Step{}).is_err());
    }
}
