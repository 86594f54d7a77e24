use crate::{Error, Matrix3, Vector3D};

/// A single atomic environment: the species of a central atom, together with
/// the species and positions (relative to the center) of its neighbors.
///
/// Neighbor lists are not built here: the caller is expected to provide all
/// neighbors, and the ones outside of the basis cutoff are simply ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    center: i32,
    species: Vec<i32>,
    positions: Vec<Vector3D>,
}

impl Environment {
    /// Create a new environment without any neighbor around a center of the
    /// given species
    pub fn new(center: i32) -> Environment {
        Environment {
            center: center,
            species: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Create an environment from already existing neighbor data. The data
    /// is only checked when used for a calculation.
    pub fn from_parts(center: i32, species: Vec<i32>, positions: Vec<Vector3D>) -> Environment {
        Environment { center, species, positions }
    }

    /// Add a neighbor with the given `species`, at the given `position`
    /// relative to the center
    pub fn add_neighbor(&mut self, species: i32, position: Vector3D) {
        self.species.push(species);
        self.positions.push(position);
    }

    /// Get the species of the central atom
    pub fn center(&self) -> i32 {
        self.center
    }

    /// Get the species of all neighbors
    pub fn species(&self) -> &[i32] {
        &self.species
    }

    /// Get the positions of all neighbors, relative to the center
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get the number of neighbors in this environment
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Does this environment contain any neighbor?
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get a copy of this environment where all neighbors positions have been
    /// multiplied by the given `rotation` matrix
    #[must_use]
    pub fn rotated(&self, rotation: &Matrix3) -> Environment {
        Environment {
            center: self.center,
            species: self.species.clone(),
            positions: self.positions.iter().map(|&position| rotation * position).collect(),
        }
    }

    /// Check that species and positions have the same size, and that all
    /// positions are finite and different from the center position
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.species.len() != self.positions.len() {
            return Err(Error::InvalidEnvironment(format!(
                "got {} neighbor species but {} neighbor positions",
                self.species.len(), self.positions.len()
            )));
        }

        for (neighbor, position) in self.positions.iter().enumerate() {
            let distance = position.norm();
            if !distance.is_finite() {
                return Err(Error::InvalidEnvironment(format!(
                    "neighbor {} has a non-finite position", neighbor
                )));
            }

            if distance < 1e-12 {
                return Err(Error::InvalidEnvironment(format!(
                    "neighbor {} is on top of the central atom", neighbor
                )));
            }
        }

        return Ok(());
    }
}
