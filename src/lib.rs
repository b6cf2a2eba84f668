// src/lib.rs

//! Minibatch reader shim.
//!
//! This crate bridges a pull-based minibatch reader and the fixed-shape
//! matrix consumption contract of an iterative training loop. While the
//! consumer works on the current minibatch, the next read is already in
//! flight: exactly one request is outstanding at any time, which overlaps
//! data preparation with compute while keeping memory bounded and delivery
//! order deterministic.
//!
//! The reader side is the [`DataReader`] trait; the consumer side is the
//! [`MatrixSink`] trait, with [`CpuMatrix`] as a host-memory reference
//! implementation. [`ReaderShim`] sits in between: it resolves the reader's
//! declared streams, runs the epoch protocol, and materializes raw dense or
//! sparse-CSC stream buffers into the caller's matrices with shape and
//! device validation.

pub mod config;
pub mod error;
pub mod materialize;
pub mod matrix;
pub mod prefetch;
pub mod reader;
pub mod shim;

// Re-export commonly used types for convenience
pub use config::ShimConfig;
pub use error::{Result, ShimError};
pub use materialize::fill_from_stream;
pub use matrix::{CpuMatrix, Device, Element, MatrixSink, MatrixStorage};
pub use prefetch::ScheduleMode;
pub use reader::{
    DataReader, EpochConfig, Minibatch, SampleShape, SequenceLayout, StorageKind, StreamBuffer,
    StreamCatalog, StreamDescriptor,
};
pub use shim::ReaderShim;
