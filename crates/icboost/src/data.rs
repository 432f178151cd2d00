//! Feature access for prediction.
//!
//! [`SampleAccessor`] gives read-only access to the feature values of one
//! observation. It is implemented for slices, fixed-size arrays and `ndarray`
//! rows so that prediction works on whatever row type the caller already has.
//!
//! ```
//! use icboost::data::SampleAccessor;
//!
//! let row: &[f64] = &[0.5, 1.2, 3.4];
//! assert_eq!(row.feature(1), 1.2);
//! assert_eq!(row.n_features(), 3);
//! ```

use ndarray::{Array1, ArrayView1};

// ============================================================================
// SampleAccessor Trait
// ============================================================================

/// Access features for a single observation (row).
pub trait SampleAccessor {
    /// Feature value at `index`.
    fn feature(&self, index: usize) -> f64;

    /// Number of features in this row.
    fn n_features(&self) -> usize;
}

impl SampleAccessor for [f64] {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }
}

impl<const N: usize> SampleAccessor for [f64; N] {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    #[inline]
    fn n_features(&self) -> usize {
        N
    }
}

impl SampleAccessor for Vec<f64> {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }
}

// May be contiguous or strided (e.g. a column-major row).
impl SampleAccessor for ArrayView1<'_, f64> {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }
}

impl SampleAccessor for Array1<f64> {
    #[inline]
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }
}
