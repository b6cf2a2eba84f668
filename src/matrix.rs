// src/matrix.rs

//! Destination-matrix seam.
//!
//! The shim never owns the numeric matrices it fills; the training loop
//! supplies them. [`MatrixSink`] is the contract those destinations must
//! satisfy, and [`CpuMatrix`] is a host-memory reference implementation
//! suitable for tests and CPU-only deployments.

use crate::reader::SequenceLayout;

/// A numeric element that can be decoded from a raw stream buffer.
pub trait Element:
    Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static
{
    /// Width of one encoded element in bytes.
    const WIDTH: usize;

    /// Decodes one element from exactly [`Self::WIDTH`] native-endian bytes.
    /// Returns `None` if `bytes` has the wrong length.
    fn decode(bytes: &[u8]) -> Option<Self>;
}

impl Element for f32 {
    const WIDTH: usize = 4;

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(f32::from_ne_bytes(bytes.try_into().ok()?))
    }
}

impl Element for f64 {
    const WIDTH: usize = 8;

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(f64::from_ne_bytes(bytes.try_into().ok()?))
    }
}

/// Compute device a matrix's storage resides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Gpu(u32),
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu(ordinal) => write!(f, "gpu:{ordinal}"),
        }
    }
}

/// A caller-supplied destination matrix.
///
/// All destinations passed to one consumption call must report the same
/// [`Device`]. A destination with a nonzero `expected_rows` constrains the
/// row count of the stream assigned to it.
pub trait MatrixSink {
    type Elem: Element;

    /// Device affinity of this matrix's storage.
    fn device(&self) -> Device;

    /// Expected row count; zero means unconstrained.
    fn expected_rows(&self) -> usize;

    /// Replaces the matrix contents with `rows x columns` dense values,
    /// laid out contiguously as produced by the reader.
    fn assign_dense(&mut self, rows: usize, columns: usize, values: Vec<Self::Elem>);

    /// Replaces the matrix contents with a compressed-sparse-column matrix.
    /// `column_pointers` has `columns + 1` entries; `values` and
    /// `row_indices` each have `nnz` entries.
    fn assign_csc(
        &mut self,
        rows: usize,
        columns: usize,
        nnz: usize,
        values: Vec<Self::Elem>,
        row_indices: Vec<u32>,
        column_pointers: Vec<u32>,
    );

    /// Adopts the sequence layout of the stream buffer the matrix was
    /// filled from.
    fn set_sequence_layout(&mut self, layout: SequenceLayout);
}

/// Contents of a [`CpuMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixStorage<E> {
    /// Nothing assigned yet.
    Empty,
    Dense(Vec<E>),
    SparseCsc {
        nnz: usize,
        values: Vec<E>,
        row_indices: Vec<u32>,
        column_pointers: Vec<u32>,
    },
}

/// Host-memory reference implementation of [`MatrixSink`].
#[derive(Debug, Clone)]
pub struct CpuMatrix<E> {
    expected_rows: usize,
    rows: usize,
    columns: usize,
    storage: MatrixStorage<E>,
    layout: SequenceLayout,
}

impl<E: Element> CpuMatrix<E> {
    /// Creates an empty matrix with an unconstrained row count.
    pub fn new() -> Self {
        Self::with_expected_rows(0)
    }

    /// Creates an empty matrix that only accepts streams declaring exactly
    /// `expected_rows` rows.
    pub fn with_expected_rows(expected_rows: usize) -> Self {
        Self {
            expected_rows,
            rows: 0,
            columns: 0,
            storage: MatrixStorage::Empty,
            layout: SequenceLayout::default(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn storage(&self) -> &MatrixStorage<E> {
        &self.storage
    }

    pub fn layout(&self) -> &SequenceLayout {
        &self.layout
    }

    /// Dense contents, if dense values have been assigned.
    pub fn dense_values(&self) -> Option<&[E]> {
        match &self.storage {
            MatrixStorage::Dense(values) => Some(values),
            _ => None,
        }
    }
}

impl<E: Element> Default for CpuMatrix<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> MatrixSink for CpuMatrix<E> {
    type Elem = E;

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn expected_rows(&self) -> usize {
        self.expected_rows
    }

    fn assign_dense(&mut self, rows: usize, columns: usize, values: Vec<E>) {
        self.rows = rows;
        self.columns = columns;
        self.storage = MatrixStorage::Dense(values);
    }

    fn assign_csc(
        &mut self,
        rows: usize,
        columns: usize,
        nnz: usize,
        values: Vec<E>,
        row_indices: Vec<u32>,
        column_pointers: Vec<u32>,
    ) {
        self.rows = rows;
        self.columns = columns;
        self.storage = MatrixStorage::SparseCsc {
            nnz,
            values,
            row_indices,
            column_pointers,
        };
    }

    fn set_sequence_layout(&mut self, layout: SequenceLayout) {
        self.layout = layout;
    }
}
