// src/reader/decode.rs

//! Bounds-checked decoding of raw stream buffers.
//!
//! Stream buffers arrive as untyped bytes whose layout is promised by the
//! stream's declared storage kind. Everything here goes through an explicit
//! cursor, so a truncated or inconsistent buffer surfaces as a
//! malformed-buffer error instead of an out-of-bounds read.
//!
//! Sparse CSC buffers are bit-exact:
//! `[nnz: u64][values: nnz x elem][row indices: nnz x u32][column pointers: (columns + 1) x u32]`
//! with all integers and elements native-endian.

use crate::error::{Result, ShimError};
use crate::matrix::Element;

/// Decoded view of a compressed-sparse-column buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CscView<E> {
    pub nnz: usize,
    pub values: Vec<E>,
    pub row_indices: Vec<u32>,
    pub column_pointers: Vec<u32>,
}

struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        if end > self.buf.len() {
            return None;
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Some(slice)
    }

    fn read_u64(&mut self) -> Option<u64> {
        let bytes = self.take(8)?;
        Some(u64::from_ne_bytes(bytes.try_into().ok()?))
    }

    fn read_u32s(&mut self, count: usize) -> Option<Vec<u32>> {
        let bytes = self.take(count.checked_mul(4)?)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|chunk| {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(chunk);
                    u32::from_ne_bytes(raw)
                })
                .collect(),
        )
    }

    fn read_elements<E: Element>(&mut self, count: usize) -> Option<Vec<E>> {
        let bytes = self.take(count.checked_mul(E::WIDTH)?)?;
        bytes.chunks_exact(E::WIDTH).map(E::decode).collect()
    }
}

/// Decodes a dense buffer of exactly `rows * columns` elements.
pub fn decode_dense<E: Element>(
    name: &str,
    bytes: &[u8],
    rows: usize,
    columns: usize,
) -> Result<Vec<E>> {
    let expected = rows
        .checked_mul(columns)
        .and_then(|elements| elements.checked_mul(E::WIDTH))
        .ok_or_else(|| ShimError::malformed_buffer(name, "dense extent overflows"))?;
    if bytes.len() != expected {
        return Err(ShimError::malformed_buffer(
            name,
            format!(
                "dense buffer holds {} bytes, expected {} ({} x {} elements of {} bytes)",
                bytes.len(),
                expected,
                rows,
                columns,
                E::WIDTH
            ),
        ));
    }
    bytes
        .chunks_exact(E::WIDTH)
        .map(E::decode)
        .collect::<Option<Vec<E>>>()
        .ok_or_else(|| ShimError::malformed_buffer(name, "undecodable dense element"))
}

/// Decodes a compressed-sparse-column buffer for a `rows x columns` matrix.
///
/// Trailing bytes after the column pointers are tolerated; sparse buffers
/// may be over-allocated.
pub fn decode_csc<E: Element>(
    name: &str,
    bytes: &[u8],
    rows: usize,
    columns: usize,
) -> Result<CscView<E>> {
    let mut cursor = ByteCursor::new(bytes);

    let nnz = cursor
        .read_u64()
        .ok_or_else(|| ShimError::malformed_buffer(name, "missing non-zero-count header"))?
        as usize;
    let values = cursor.read_elements::<E>(nnz).ok_or_else(|| {
        ShimError::malformed_buffer(name, format!("truncated value section ({nnz} elements)"))
    })?;
    let row_indices = cursor.read_u32s(nnz).ok_or_else(|| {
        ShimError::malformed_buffer(name, format!("truncated row-index section ({nnz} entries)"))
    })?;
    let column_pointers = cursor.read_u32s(columns + 1).ok_or_else(|| {
        ShimError::malformed_buffer(
            name,
            format!("truncated column-pointer section ({} entries)", columns + 1),
        )
    })?;

    if column_pointers[columns] as usize != nnz {
        return Err(ShimError::malformed_buffer(
            name,
            format!(
                "final column pointer {} does not match the non-zero count {}",
                column_pointers[columns], nnz
            ),
        ));
    }
    if let Some(out_of_range) = row_indices.iter().find(|&&row| row as usize >= rows) {
        return Err(ShimError::malformed_buffer(
            name,
            format!("row index {out_of_range} exceeds the row count {rows}"),
        ));
    }

    Ok(CscView {
        nnz,
        values,
        row_indices,
        column_pointers,
    })
}
