//! Conversion between ndarray and nalgebra types.
//!
//! Residuals and Jacobians live in ndarray; the dense solves in the
//! Levenberg-Marquardt step and the covariance calculation use nalgebra.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Convert an ndarray Array2 to a nalgebra DMatrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// Convert an ndarray Array1 to a nalgebra DVector.
pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(arr.len(), arr.iter().copied())
}

/// Convert a nalgebra DVector to an ndarray Array1.
pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Array1<f64> {
    vec.iter().copied().collect()
}
