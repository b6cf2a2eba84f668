// src/materialize.rs

//! Materialization of raw stream buffers into destination matrices.

use crate::error::{Result, ShimError};
use crate::matrix::MatrixSink;
use crate::reader::{decode, StorageKind, StreamBuffer};

/// Fills `matrix` from `buffer` according to the stream's declared storage
/// encoding, after validating the declared row count against the matrix's
/// expectation. The column count comes from the buffer's layout.
///
/// On success the buffer's sequence layout is copied into the destination
/// and its parallel-sequence count returned, so the caller can track it
/// explicitly. On failure the destination is left unmutated.
pub fn fill_from_stream<M: MatrixSink>(
    kind: StorageKind,
    matrix: &mut M,
    declared_rows: usize,
    name: &str,
    buffer: &StreamBuffer,
) -> Result<usize> {
    let expected_rows = matrix.expected_rows();
    if expected_rows > 0 && expected_rows != declared_rows {
        return Err(ShimError::shape_mismatch(name, expected_rows, declared_rows));
    }

    let columns = buffer.layout.columns;
    match kind {
        StorageKind::Dense => {
            let values =
                decode::decode_dense::<M::Elem>(name, &buffer.bytes, declared_rows, columns)?;
            matrix.assign_dense(declared_rows, columns, values);
        }
        StorageKind::SparseCsc => {
            let view = decode::decode_csc::<M::Elem>(name, &buffer.bytes, declared_rows, columns)?;
            matrix.assign_csc(
                declared_rows,
                columns,
                view.nnz,
                view.values,
                view.row_indices,
                view.column_pointers,
            );
        }
        other => return Err(ShimError::unsupported_storage(other)),
    }

    matrix.set_sequence_layout(buffer.layout.clone());
    Ok(buffer.layout.parallel_sequences)
}
