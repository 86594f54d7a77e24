use crate::basis::{CutoffFunction, SparseDegree};

/// Parameters for a rotation and permutation invariant basis built on top of
/// [`SphericalBasis`](crate::basis::SphericalBasis) one-particle functions.
///
/// The number of radial and angular functions is derived from the degree
/// bound: only functions which can appear in at least one product with a
/// degree below `max_degree` are created.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct RpiBasisParameters {
    /// Species of the atoms, used both for central atoms and for neighbors
    pub species: Vec<i32>,
    /// Maximal correlation order, i.e. number of neighbors in each product
    pub max_correlation: usize,
    /// Maximal degree of the products included in the basis
    pub max_degree: f64,
    /// Degree function used to measure the complexity of products
    #[serde(default)]
    pub degree: SparseDegree,
    /// Spherical cutoff radius for atomic environments
    pub cutoff: f64,
    /// Cutoff function used to smooth the behavior around the cutoff radius
    #[serde(default)]
    pub cutoff_function: CutoffFunction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json() {
        let parameters: RpiBasisParameters = serde_json::from_str(r#"{
            "species": [1, 8],
            "max_correlation": 3,
            "max_degree": 8.5,
            "cutoff": 4.5
        }"#).unwrap();

        assert_eq!(parameters.species, [1, 8]);
        assert_eq!(parameters.max_correlation, 3);
        assert_eq!(parameters.degree, SparseDegree::default());
        assert_eq!(parameters.cutoff_function, CutoffFunction::ShiftedCosine { width: 0.5 });

        let parameters: RpiBasisParameters = serde_json::from_str(r#"{
            "species": [6],
            "max_correlation": 2,
            "max_degree": 6,
            "degree": {"weight_radial": 2.0, "weight_angular": 1.0},
            "cutoff": 4.5,
            "cutoff_function": {"Step": {}}
        }"#).unwrap();

        assert_eq!(parameters.degree.weight_radial, 2.0);
        assert_eq!(parameters.cutoff_function, CutoffFunction::Step {});

        let serialized = serde_json::to_string(&parameters).unwrap();
        let roundtrip: RpiBasisParameters = serde_json::from_str(&serialized).unwrap();
        assert_eq!(roundtrip, parameters);
    }

    #[test]
    fn missing_field() {
        let result = serde_json::from_str::<RpiBasisParameters>(r#"{"species": [1]}"#);
        assert!(result.is_err());
    }
}
