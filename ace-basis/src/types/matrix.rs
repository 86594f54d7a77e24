use std::ops::{Index, IndexMut, Mul};

use super::Vector3D;

/// A 3x3 matrix type, stored in row-major order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Create a new `Matrix3` from the given rows
    pub fn new(rows: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(rows)
    }

    /// Create the identity matrix
    pub fn one() -> Matrix3 {
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Create the rotation matrix of the given `angle` (in radians) around
    /// `axis`, following the right-hand rule. The axis does not need to be
    /// normalized.
    pub fn rotation(axis: Vector3D, angle: f64) -> Matrix3 {
        let u = axis.normalized();
        let (sin, cos) = angle.sin_cos();
        let one_minus_cos = 1.0 - cos;

        Matrix3([
            [
                cos + u[0] * u[0] * one_minus_cos,
                u[0] * u[1] * one_minus_cos - u[2] * sin,
                u[0] * u[2] * one_minus_cos + u[1] * sin,
            ], [
                u[1] * u[0] * one_minus_cos + u[2] * sin,
                cos + u[1] * u[1] * one_minus_cos,
                u[1] * u[2] * one_minus_cos - u[0] * sin,
            ], [
                u[2] * u[0] * one_minus_cos - u[1] * sin,
                u[2] * u[1] * one_minus_cos + u[0] * sin,
                cos + u[2] * u[2] * one_minus_cos,
            ],
        ])
    }

    /// Get the transposed matrix
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.0;
        Matrix3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Get the determinant of this matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
      - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
      + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }
}

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.0[index]
    }
}

impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D, self, vector,
    Vector3D::new(
        self[0][0] * vector[0] + self[0][1] * vector[1] + self[0][2] * vector[2],
        self[1][0] * vector[0] + self[1][1] * vector[1] + self[1][2] * vector[2],
        self[2][0] * vector[0] + self[2][1] * vector[1] + self[2][2] * vector[2],
    )
);

impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3, self, other,
    {
        let mut result = Matrix3([[0.0; 3]; 3]);
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result[i][j] += self[i][k] * other[k][j];
                }
            }
        }
        result
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn rotation() {
        let rotation = Matrix3::rotation(Vector3D::new(0.0, 0.0, 2.0), std::f64::consts::FRAC_PI_2);
        let rotated = rotation * Vector3D::new(1.0, 0.0, 0.0);

        assert_ulps_eq!(rotated[0], 0.0);
        assert_ulps_eq!(rotated[1], 1.0);
        assert_ulps_eq!(rotated[2], 0.0);

        assert_ulps_eq!(rotation.determinant(), 1.0);
    }

    #[test]
    fn orthogonal() {
        let rotation = Matrix3::rotation(Vector3D::new(0.3, -1.2, 0.7), 2.1);
        let product = rotation * rotation.transposed();
        let one = Matrix3::one();
        for i in 0..3 {
            for j in 0..3 {
                assert_ulps_eq!(product[i][j], one[i][j], epsilon = 1e-15);
            }
        }
    }
}
