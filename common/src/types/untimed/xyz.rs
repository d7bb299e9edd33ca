use nalgebra::Vector3;

use std::ops::{Add, Mul, Sub};

use crate::constants::N_XYZ_COORDINATES;

/// Tri-axis measurement (acceleration in m/s^2 or angular velocity in rad/s).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct XYZ(Vector3<f64>);

impl XYZ {
    pub fn new(data: [f64; N_XYZ_COORDINATES]) -> Self {
        Self(Vector3::from(data))
    }

    pub fn from_vector(data: Vector3<f64>) -> Self {
        Self(data)
    }

    pub fn inner(&self) -> [f64; N_XYZ_COORDINATES] {
        [self.0.x, self.0.y, self.0.z]
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Euclidean norm of the vector.
    pub fn magnitude(&self) -> f64 {
        self.0.norm()
    }
}

impl From<XYZ> for [f64; N_XYZ_COORDINATES] {
    fn from(value: XYZ) -> Self {
        value.inner()
    }
}

impl From<[f64; N_XYZ_COORDINATES]> for XYZ {
    fn from(value: [f64; N_XYZ_COORDINATES]) -> Self {
        Self(Vector3::from(value))
    }
}

impl From<XYZ> for Vec<f64> {
    fn from(value: XYZ) -> Self {
        value.inner().to_vec()
    }
}

impl TryFrom<Vec<f64>> for XYZ {
    type Error = &'static str;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        if value.len() != N_XYZ_COORDINATES {
            return Err("Can't convert to XYZ");
        }
        Ok(Self(Vector3::from_vec(value)))
    }
}

impl Add for XYZ {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for XYZ {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for XYZ {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new() {
        let data = [1.0, 2.0, 3.0];
        let xyz = XYZ::new(data);
        assert_eq!(xyz.inner(), data);
        assert_eq!((xyz.x(), xyz.y(), xyz.z()), (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_magnitude() {
        assert_relative_eq!(XYZ::new([3.0, 4.0, 0.0]).magnitude(), 5.0);
        assert_eq!(XYZ::default().magnitude(), 0.0);
    }

    #[test]
    fn test_try_from_wrong_length() {
        assert!(XYZ::try_from(vec![1.0, 2.0]).is_err());
        assert_eq!(
            XYZ::try_from(vec![1.0, 2.0, 3.0]).unwrap(),
            XYZ::new([1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn test_add_sub_mul() {
        let xyz1 = XYZ::new([1.0, 2.0, 3.0]);
        let xyz2 = XYZ::new([4.0, 5.0, 6.0]);
        assert_eq!((xyz1 + xyz2).inner(), [5.0, 7.0, 9.0]);
        assert_eq!((xyz2 - xyz1).inner(), [3.0, 3.0, 3.0]);
        assert_eq!((xyz1 * 2.0).inner(), [2.0, 4.0, 6.0]);
    }
}
