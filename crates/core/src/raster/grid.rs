//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::RasterElement;
use ndarray::Array2;

/// A 2D raster grid of values of type `T` with an optional no-data value.
///
/// Pipeline grids carry no local georeferencing; the region and pixel scale
/// travel with the remote requests instead. For float grids the masking
/// convention is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            nodata: None,
        }
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            nodata: None,
        }
    }

    /// Create a raster from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            nodata: None,
        })
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self { data, nodata: None }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    // No-data handling

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Number of valid (non-nodata) cells
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !self.is_nodata(**v)).count()
    }

    /// Whether every cell is no-data
    pub fn is_fully_masked(&self) -> bool {
        self.valid_count() == 0
    }
}

impl Raster<f64> {
    /// A raster of the given shape with every cell masked (NaN).
    pub fn masked(rows: usize, cols: usize) -> Self {
        let mut r = Self::filled(rows, cols, f64::NAN);
        r.set_nodata(Some(f64::NAN));
        r
    }

    /// Apply a function to every valid cell, preserving NaN.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        let mut out = self.clone();
        out.set_nodata(Some(f64::NAN));
        out.data_mut().mapv_inplace(|v| if v.is_nan() { v } else { f(v) });
        out
    }

    /// Replace every masked cell with `fill`, leaving no masked cells.
    pub fn unmask(&self, fill: f64) -> Self {
        let mut out = self.clone();
        out.data_mut().mapv_inplace(|v| if v.is_nan() { fill } else { v });
        out.set_nodata(None);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f64> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
    }

    #[test]
    fn test_from_vec_rejects_bad_len() {
        assert!(Raster::from_vec(vec![1.0; 5], 2, 3).is_err());
        assert!(Raster::from_vec(vec![1.0; 6], 2, 3).is_ok());
    }

    #[test]
    fn test_masked_raster() {
        let r = Raster::<f64>::masked(4, 4);
        assert!(r.is_fully_masked());
        assert_eq!(r.valid_count(), 0);
    }

    #[test]
    fn test_unmask_fills_nan() {
        let mut r = Raster::filled(2, 2, 3.0);
        r.set_nodata(Some(f64::NAN));
        r.set(0, 0, f64::NAN).unwrap();
        let filled = r.unmask(-9999.0);
        assert_eq!(filled.get(0, 0).unwrap(), -9999.0);
        assert_eq!(filled.get(1, 1).unwrap(), 3.0);
        assert_eq!(filled.nodata(), None);
    }

    #[test]
    fn test_map_preserves_nan() {
        let mut r = Raster::filled(2, 2, 3.0);
        r.set_nodata(Some(f64::NAN));
        r.set(0, 0, f64::NAN).unwrap();
        let doubled = r.map(|v| v * 2.0);
        assert!(doubled.get(0, 0).unwrap().is_nan());
        assert_eq!(doubled.get(1, 1).unwrap(), 6.0);
        assert_eq!(doubled.valid_count(), 3);
    }
}
