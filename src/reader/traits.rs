// src/reader/traits.rs

use std::collections::HashMap;

use crate::error::Result;

/// Storage encoding of one stream's minibatch buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Contiguous native-endian elements.
    Dense,
    /// Compressed sparse column: an nnz header, then values, row indices,
    /// and column pointers.
    SparseCsc,
    /// Block sparse column. Readers may declare it, but it cannot be
    /// materialized into a destination matrix.
    SparseBsc,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Dense => write!(f, "dense"),
            StorageKind::SparseCsc => write!(f, "sparse_csc"),
            StorageKind::SparseBsc => write!(f, "sparse_bsc"),
        }
    }
}

/// Per-sample tensor shape of a stream.
///
/// The product of the dimensions is the number of elements one sample
/// occupies, and therefore the row count of the materialized matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleShape {
    dims: Vec<usize>,
}

impl SampleShape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total element count of one sample.
    pub fn elements(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Immutable description of one named input stream.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Stable identifier; equals the stream's position in the declared list.
    pub id: usize,
    /// Unique name the consumer requests the stream by.
    pub name: String,
    pub storage: StorageKind,
    pub sample_shape: SampleShape,
}

/// Epoch parameters handed to the reader at the start of every epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochConfig {
    pub worker_rank: usize,
    pub number_of_workers: usize,
    pub minibatch_size_in_samples: usize,
    pub total_epoch_size_in_samples: usize,
    pub epoch_index: usize,
}

/// Column and sequence geometry of one stream buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLayout {
    /// Samples across all sequences, i.e. the matrix column count.
    pub columns: usize,
    /// Independent sequences packed side by side in this minibatch.
    pub parallel_sequences: usize,
}

impl Default for SequenceLayout {
    fn default() -> Self {
        Self {
            columns: 0,
            parallel_sequences: 1,
        }
    }
}

/// Raw bytes for one stream within a minibatch, plus their geometry.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    pub bytes: Vec<u8>,
    pub layout: SequenceLayout,
}

/// One unit of data produced by the reader.
#[derive(Debug, Clone, Default)]
pub struct Minibatch {
    /// Set on the last minibatch of the epoch. A minibatch may carry both
    /// this flag and data (a final partial minibatch).
    pub end_of_epoch: bool,
    /// Stream id to buffer. Ids must be a subset of the declared streams.
    pub streams: HashMap<usize, StreamBuffer>,
}

impl Minibatch {
    /// The synthetic completion a drained reader produces: end of epoch,
    /// no data.
    pub fn end_marker() -> Self {
        Self {
            end_of_epoch: true,
            streams: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// A pull-based producer of minibatches.
///
/// Implementations own parsing, randomization, chunking, and disk or network
/// I/O. The shim only relays, counts, and reshapes what they produce.
/// `read_minibatch` may be invoked from a background prefetch thread, hence
/// the `Send + 'static` bound.
pub trait DataReader: Send + 'static {
    /// Declared streams. Called once, before any epoch.
    fn stream_descriptions(&self) -> Vec<StreamDescriptor>;

    /// Begins a new epoch. Called once per epoch, before any reads.
    fn start_epoch(&mut self, config: &EpochConfig) -> Result<()>;

    /// Produces the next minibatch. Called once per prefetch cycle.
    fn read_minibatch(&mut self) -> Result<Minibatch>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape_elements() {
        assert_eq!(SampleShape::new(vec![3]).elements(), 3);
        assert_eq!(SampleShape::new(vec![3, 4, 2]).elements(), 24);
        // A scalar sample occupies one element
        assert_eq!(SampleShape::new(vec![]).elements(), 1);
    }

    #[test]
    fn test_storage_kind_display() {
        assert_eq!(StorageKind::Dense.to_string(), "dense");
        assert_eq!(StorageKind::SparseCsc.to_string(), "sparse_csc");
        assert_eq!(StorageKind::SparseBsc.to_string(), "sparse_bsc");
    }

    #[test]
    fn test_end_marker() {
        let minibatch = Minibatch::end_marker();
        assert!(minibatch.end_of_epoch);
        assert!(minibatch.is_empty());
    }
}
