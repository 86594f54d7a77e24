use std::collections::HashMap;

use crate::{Error, SparseMatrix, TripletAccumulator};
use crate::basis::OneParticleFunction;
use crate::coupling::CouplingCoefficients;
use crate::pibasis::PIBasis;

/// Build the sparse projection from the PI basis to the RPI basis for the
/// center species at `species_index`.
///
/// Each PI function with all `m = 0` is used as a representative of its
/// `(z, n, l)` signature. The coupling coefficients of this signature give
/// new rows in the projection, and each column of the coupling block is
/// mapped back to the AA-index of the corresponding product. Contributions
/// of permutation-equivalent columns to the same AA-index are summed.
pub(crate) fn build_a2b_map<C>(
    pibasis: &PIBasis,
    species_index: usize,
    coupling: &C,
) -> Result<SparseMatrix, Error> where C: CouplingCoefficients + ?Sized {
    let z0 = pibasis.species()[species_index];
    let one_particle = pibasis.one_particle();
    let a_indexes = one_particle.iter()
        .enumerate()
        .map(|(k, function)| (*function, k))
        .collect::<HashMap<_, _>>();

    let mut triplets = TripletAccumulator::new();
    let mut n_rows = 0;

    let mut zz = Vec::new();
    let mut nn = Vec::new();
    let mut ll = Vec::new();
    let mut column = Vec::new();
    for function in pibasis.functions(species_index) {
        if function.indices.iter().any(|&k| one_particle[k].m != 0) {
            continue;
        }

        zz.clear();
        nn.clear();
        ll.clear();
        for &k in &function.indices {
            zz.push(one_particle[k].species);
            nn.push(one_particle[k].n);
            ll.push(one_particle[k].l);
        }

        let block = coupling.coupling(z0, &zz, &nn, &ll)?;
        if block.is_empty() {
            continue;
        }

        if block.coefficients.ncols() != block.m_tuples.len() {
            return Err(Error::Internal(format!(
                "coupling block for zz={:?} nn={:?} ll={:?} has {} columns but {} m-tuples",
                zz, nn, ll, block.coefficients.ncols(), block.m_tuples.len()
            )));
        }

        for (i_column, mm) in block.m_tuples.iter().enumerate() {
            if mm.len() != function.order() {
                return Err(Error::Internal(format!(
                    "m-tuple {:?} does not match the correlation order {}", mm, function.order()
                )));
            }

            column.clear();
            for (t, &m) in mm.iter().enumerate() {
                let wanted = OneParticleFunction { species: zz[t], n: nn[t], l: ll[t], m: m };
                let k = a_indexes.get(&wanted).ok_or_else(|| Error::Internal(format!(
                    "one-particle function {:?} is not part of the basis", wanted
                )))?;
                column.push(*k);
            }
            column.sort_unstable();

            let aa_index = pibasis.lookup(species_index, &column).ok_or_else(|| Error::Internal(format!(
                "could not find the product of one-particle functions {:?} in the PI basis for species {}",
                column, z0
            )))?;

            for row in 0..block.n_rows() {
                let value = block.coefficients[[row, i_column]];
                if value != 0.0 {
                    triplets.add(n_rows + row, aa_index, value);
                }
            }
        }

        n_rows += block.n_rows();
    }

    return Ok(triplets.finish((n_rows, pibasis.len(species_index))));
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use crate::basis::{OneParticleFunction, SparseDegree};
    use crate::coupling::{CouplingBlock, Rotation3DCoefficients};
    use crate::pibasis::rpi_filter;
    use super::*;

    fn one_particle(max_radial: usize, max_angular: usize) -> Vec<OneParticleFunction> {
        let mut functions = Vec::new();
        for n in 1..=max_radial {
            for l in 0..=max_angular {
                for m in -(l as isize)..=(l as isize) {
                    functions.push(OneParticleFunction { species: 1, n, l, m });
                }
            }
        }
        return functions;
    }

    /// Coupling returning a fixed block for all signatures with l = 1
    struct FixedCoupling(CouplingBlock);

    impl CouplingCoefficients for FixedCoupling {
        fn coupling(&self, _: i32, _: &[i32], _: &[usize], ll: &[usize]) -> Result<CouplingBlock, Error> {
            if ll.iter().all(|&l| l == 1) {
                Ok(self.0.clone())
            } else {
                Ok(CouplingBlock::empty())
            }
        }
    }

    #[test]
    fn rotation_coupling() {
        let functions = one_particle(2, 1);
        let degree = SparseDegree::default();
        let pibasis = PIBasis::new(&functions, &[1], 2, &degree, 5.0, |_, f| rpi_filter(f));
        let oracle = Rotation3DCoefficients::new();

        let a2b = build_a2b_map(&pibasis, 0, &oracle).unwrap();
        assert_eq!(a2b.ncols(), pibasis.len(0));

        // order 1: n = 1, 2 with l = 0
        // order 2: (n, l) pairs (1, 0)x(1, 0), (1, 0)x(2, 0), (2, 0)x(2, 0)
        //          and (1, 1)x(1, 1). (1, 1)x(2, 1) is above the degree bound
        assert_eq!(a2b.nrows(), 2 + 4);

        for row in 0..a2b.nrows() {
            assert!(a2b.row(row).count() > 0);
        }
    }

    #[test]
    fn duplicated_columns_are_summed() {
        let functions = one_particle(1, 1);
        let degree = SparseDegree::default();
        let pibasis = PIBasis::new(&functions, &[1], 2, &degree, 10.0, |_, f| rpi_filter(f) && f.len() == 2);

        // (m1, m2) = (-1, 1) and (1, -1) are the same product of identical
        // functions
        let coupling = FixedCoupling(CouplingBlock {
            coefficients: array![[0.5, 1.0, 0.25]],
            m_tuples: vec![vec![-1, 1], vec![0, 0], vec![1, -1]],
        });

        let a2b = build_a2b_map(&pibasis, 0, &coupling).unwrap();

        // a single row, for the l = 1 signature
        assert_eq!(a2b.nrows(), 1);

        // A-indices: (l=0, m=0) -> 0, (l=1, m=-1) -> 1, (l=1, m=0) -> 2, (l=1, m=1) -> 3
        let minus_plus = pibasis.lookup(0, &[1, 3]).unwrap();
        let zero_zero = pibasis.lookup(0, &[2, 2]).unwrap();
        assert_eq!(a2b.get(0, minus_plus), 0.75);
        assert_eq!(a2b.get(0, zero_zero), 1.0);
        assert_eq!(a2b.row(0).count(), 2);
    }

    #[test]
    fn cancelling_entries_are_dropped() {
        let functions = one_particle(1, 1);
        let degree = SparseDegree::default();
        let pibasis = PIBasis::new(&functions, &[1], 2, &degree, 10.0, |_, f| rpi_filter(f) && f.len() == 2);

        let coupling = FixedCoupling(CouplingBlock {
            coefficients: array![[0.5, 1.0, -0.5]],
            m_tuples: vec![vec![-1, 1], vec![0, 0], vec![1, -1]],
        });

        let a2b = build_a2b_map(&pibasis, 0, &coupling).unwrap();
        let minus_plus = pibasis.lookup(0, &[1, 3]).unwrap();
        assert_eq!(a2b.get(0, minus_plus), 0.0);
        assert_eq!(a2b.row(0).count(), 1);
    }

    #[test]
    fn missing_column() {
        let functions = one_particle(1, 1);
        let degree = SparseDegree::default();
        let pibasis = PIBasis::new(&functions, &[1], 2, &degree, 10.0, |_, f| rpi_filter(f) && f.len() == 2);

        // (0, 1) is not part of the PI basis since the sum of m is not zero
        let coupling = FixedCoupling(CouplingBlock {
            coefficients: array![[1.0]],
            m_tuples: vec![vec![0, 1]],
        });

        let error = build_a2b_map(&pibasis, 0, &coupling).unwrap_err();
        assert!(matches!(error, Error::Internal(_)));
    }
}
