#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use ace_basis::{Environment, Matrix3, RpiBasis, RpiBasisParameters, Vector3D};
use ace_basis::basis::{CutoffFunction, SparseDegree};

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed_ace0)
}

/// Create a basis for the given species, correlation order and degree bound,
/// using a cutoff of 5 and default values for everything else
pub fn basis(species: &[i32], max_correlation: usize, max_degree: f64) -> RpiBasis {
    let parameters = RpiBasisParameters {
        species: species.to_vec(),
        max_correlation: max_correlation,
        max_degree: max_degree,
        degree: SparseDegree::default(),
        cutoff: 5.0,
        cutoff_function: CutoffFunction::ShiftedCosine { width: 0.5 },
    };

    RpiBasis::from_parameters(parameters).expect("failed to create basis")
}

/// Create an environment with `n_neighbors` neighbors at a distance between
/// `min_distance` and `max_distance`, with species taken from `species`
pub fn random_environment(
    rng: &mut StdRng,
    center: i32,
    species: &[i32],
    n_neighbors: usize,
    min_distance: f64,
    max_distance: f64,
) -> Environment {
    let mut environment = Environment::new(center);
    for _ in 0..n_neighbors {
        let direction = random_direction(rng);
        let distance = rng.gen_range(min_distance..max_distance);
        let neighbor = species[rng.gen_range(0..species.len())];
        environment.add_neighbor(neighbor, distance * direction);
    }
    return environment;
}

pub fn random_direction(rng: &mut StdRng) -> Vector3D {
    loop {
        let vector = Vector3D::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );

        let norm = vector.norm();
        if norm > 1e-3 && norm < 1.0 {
            return vector / norm;
        }
    }
}

pub fn random_rotation(rng: &mut StdRng) -> Matrix3 {
    let axis = random_direction(rng);
    let angle = rng.gen_range(0.0..(2.0 * std::f64::consts::PI));
    Matrix3::rotation(axis, angle)
}

/// Relative difference between two vectors, using the norm of `expected`
pub fn relative_difference(actual: &[f64], expected: &[f64]) -> f64 {
    assert_eq!(actual.len(), expected.len());

    let mut difference = 0.0;
    let mut norm = 0.0;
    for (a, e) in actual.iter().zip(expected) {
        difference += (a - e) * (a - e);
        norm += e * e;
    }

    if norm == 0.0 {
        return f64::sqrt(difference);
    }
    return f64::sqrt(difference / norm);
}
