//! Array shapes and the flat table they address.
//!
//! A shape is a sequence of labelled dimensions, labels `'a'..='z'`. The
//! data live row-major in a flat `Vec<f64>` with the LAST dimension fastest,
//! so each innermost run is a contiguous slice — which is exactly what
//! inverse-CDF sampling wants to borrow.
//!
//! ```rust
//! use epi_io::{Shape, Table};
//!
//! // mortality[birth_year][sex][age]
//! let shape = Shape::new(&[('b', 141), ('s', 2), ('a', 122)]).unwrap();
//! let mut m = Table::zeros(shape);
//! m.set(&[3, 1, 40], 0.25);
//! assert_eq!(m.get(&[3, 1, 40]), 0.25);
//! assert_eq!(m.row(&[3, 1]).len(), 122);
//! ```

use crate::error::{IoError, IoResult};

// ── Shape ─────────────────────────────────────────────────────────────────────

/// One labelled dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dim {
    pub label: char,
    pub len: usize,
}

/// An ordered list of labelled dimensions.
#[derive(Clone, Debug)]
pub struct Shape {
    dims: Vec<Dim>,
    /// Stride of each dimension: product of the lengths after it.
    widths: Vec<usize>,
}

impl Shape {
    pub fn new(dims: &[(char, usize)]) -> IoResult<Shape> {
        for &(label, len) in dims {
            if !label.is_ascii_lowercase() {
                return Err(IoError::BadLabel { label });
            }
            if len == 0 {
                return Err(IoError::BadDimension { label });
            }
        }
        let mut widths = vec![1usize; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            widths[i] = widths[i + 1] * dims[i + 1].1;
        }
        Ok(Shape {
            dims: dims.iter().map(|&(label, len)| Dim { label, len }).collect(),
            widths,
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn total_len(&self) -> usize {
        self.dims.iter().map(|d| d.len).product()
    }

    /// Position of a label among the dimensions.
    pub fn axis(&self, label: char) -> Option<usize> {
        self.dims.iter().position(|d| d.label == label)
    }

    /// Stride of the dimension with this label.
    pub fn width(&self, label: char) -> Option<usize> {
        self.axis(label).map(|i| self.widths[i])
    }

    pub fn len_of(&self, label: char) -> Option<usize> {
        self.axis(label).map(|i| self.dims[i].len)
    }

    #[inline]
    pub fn width_at(&self, axis: usize) -> usize {
        self.widths[axis]
    }

    /// Flat offset of a full index tuple.
    pub fn offset(&self, idx: &[usize]) -> usize {
        debug_assert_eq!(idx.len(), self.dims.len());
        idx.iter().zip(&self.widths).map(|(i, w)| i * w).sum()
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// A shape plus its flat storage.
#[derive(Clone, Debug)]
pub struct Table {
    shape: Shape,
    data: Vec<f64>,
}

impl Table {
    pub fn zeros(shape: Shape) -> Table {
        let n = shape.total_len();
        Table { shape, data: vec![0.0; n] }
    }

    /// Build from existing flat data (row-major, last dimension fastest).
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Table {
        assert_eq!(shape.total_len(), data.len());
        Table { shape, data }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, idx: &[usize]) -> f64 {
        self.data[self.shape.offset(idx)]
    }

    #[inline]
    pub fn set(&mut self, idx: &[usize], v: f64) {
        let o = self.shape.offset(idx);
        self.data[o] = v;
    }

    /// Contiguous slice along the last dimension, addressed by the leading
    /// indices.
    pub fn row(&self, leading: &[usize]) -> &[f64] {
        assert_eq!(leading.len() + 1, self.shape.rank());
        let last = self.shape.dims().last().unwrap().len;
        let mut base = 0;
        for (k, &i) in leading.iter().enumerate() {
            base += i * self.shape.width_at(k);
        }
        &self.data[base..base + last]
    }

    /// Mutable variant of [`Table::row`].
    pub fn row_mut(&mut self, leading: &[usize]) -> &mut [f64] {
        assert_eq!(leading.len() + 1, self.shape.rank());
        let last = self.shape.dims().last().unwrap().len;
        let mut base = 0;
        for (k, &i) in leading.iter().enumerate() {
            base += i * self.shape.width_at(k);
        }
        &mut self.data[base..base + last]
    }
}
