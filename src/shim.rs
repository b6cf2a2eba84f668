// src/shim.rs

//! Shim orchestration.
//!
//! [`ReaderShim`] wraps a [`DataReader`] and exposes the minibatch-loop
//! surface a training loop consumes: start an epoch, pull materialized
//! minibatches until the epoch ends, repeat. Between pulls, the next read is
//! already in flight.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use reader_shim::{CpuMatrix, ReaderShim, ShimConfig};
//!
//! let mut shim = ReaderShim::new(reader, &ShimConfig::default())?;
//! shim.start_minibatch_loop(256, 0, epoch_size)?;
//!
//! let mut inputs = BTreeMap::new();
//! inputs.insert("features".to_string(), CpuMatrix::<f32>::new());
//! inputs.insert("labels".to_string(), CpuMatrix::<f32>::new());
//!
//! while shim.get_next_minibatch(&mut inputs)? {
//!     // train on inputs["features"], inputs["labels"]
//! }
//! ```

use std::collections::BTreeMap;

use crate::config::ShimConfig;
use crate::error::{Result, ShimError};
use crate::materialize::fill_from_stream;
use crate::matrix::MatrixSink;
use crate::prefetch::{PrefetchSlot, ScheduleMode};
use crate::reader::{DataReader, EpochConfig, StreamCatalog};

/// Whether the current epoch can still produce minibatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpochPhase {
    Active,
    Ended,
}

/// Bridge between a pull-based [`DataReader`] and fixed-shape destination
/// matrices, prefetching one minibatch ahead of the consumer.
pub struct ReaderShim<R> {
    catalog: StreamCatalog,
    prefetch: PrefetchSlot<R>,
    phase: EpochPhase,
    num_parallel_sequences: usize,
}

impl<R: DataReader> ReaderShim<R> {
    /// Wraps `reader`, resolving its declared streams into the catalog and
    /// selecting the scheduling mode from `config`.
    pub fn new(reader: R, config: &ShimConfig) -> Result<Self> {
        config.validate()?;

        let catalog = StreamCatalog::from_descriptors(reader.stream_descriptions())?;
        let mode = if config.prefetch_enabled {
            ScheduleMode::Parallel
        } else {
            ScheduleMode::OnDemand
        };
        tracing::debug!(streams = catalog.len(), ?mode, "initialized reader shim");

        Ok(Self {
            catalog,
            prefetch: PrefetchSlot::new(reader, mode),
            // No epoch has been started yet; consumption is a clean `false`
            // until the first start_minibatch_loop call.
            phase: EpochPhase::Ended,
            num_parallel_sequences: config.initial_parallel_sequences(),
        })
    }

    /// Starts an epoch on the single-worker partition (rank 0 of 1).
    pub fn start_minibatch_loop(
        &mut self,
        minibatch_size: usize,
        epoch: usize,
        requested_epoch_samples: usize,
    ) -> Result<()> {
        self.start_distributed_minibatch_loop(minibatch_size, epoch, 0, 1, requested_epoch_samples)
    }

    /// Starts an epoch on one partition of a distributed worker group and
    /// issues the first prefetch read.
    pub fn start_distributed_minibatch_loop(
        &mut self,
        minibatch_size: usize,
        epoch: usize,
        worker_rank: usize,
        number_of_workers: usize,
        requested_epoch_samples: usize,
    ) -> Result<()> {
        if number_of_workers == 0 || worker_rank >= number_of_workers {
            return Err(ShimError::config(format!(
                "worker rank {worker_rank} is outside the worker group of size {number_of_workers}"
            )));
        }

        let config = EpochConfig {
            worker_rank,
            number_of_workers,
            minibatch_size_in_samples: minibatch_size,
            total_epoch_size_in_samples: requested_epoch_samples,
            epoch_index: epoch,
        };
        tracing::debug!(
            epoch,
            worker_rank,
            number_of_workers,
            minibatch_size,
            "starting epoch"
        );

        // Reclaiming the reader drains a stale in-flight read, if any.
        self.prefetch.reader_mut()?.start_epoch(&config)?;
        self.phase = EpochPhase::Active;
        self.prefetch.issue();
        Ok(())
    }

    /// Takes the pending minibatch, materializes every requested input, and
    /// issues the next read.
    ///
    /// Every declared stream must be requested on every call; the input set
    /// is matched against the catalog by size first and by name during
    /// materialization. Returns `true` when a minibatch with data was
    /// delivered, `false` at (and after) the end of the epoch.
    ///
    /// All destination matrices must share one device affinity; that is a
    /// caller precondition, double-checked here.
    pub fn get_next_minibatch<M: MatrixSink>(
        &mut self,
        inputs: &mut BTreeMap<String, M>,
    ) -> Result<bool> {
        if inputs.len() != self.catalog.len() {
            return Err(ShimError::input_count_mismatch(
                self.catalog.len(),
                inputs.len(),
            ));
        }

        if self.phase == EpochPhase::Ended {
            return Ok(false);
        }

        if let Some(reference) = inputs.values().next().map(|matrix| matrix.device()) {
            for (name, matrix) in inputs.iter() {
                if matrix.device() != reference {
                    return Err(ShimError::device_mismatch(name, reference, matrix.device()));
                }
            }
        }

        let minibatch = self.prefetch.take()?;
        if minibatch.end_of_epoch {
            tracing::trace!("end of epoch reached");
            self.phase = EpochPhase::Ended;
            if minibatch.is_empty() {
                return Ok(false);
            }
        }

        let has_data = !minibatch.is_empty();
        if has_data {
            for (name, matrix) in inputs.iter_mut() {
                let id = self.catalog.resolve(name)?;
                let stream = minibatch.streams.get(&id).ok_or_else(|| {
                    ShimError::reader(format!(
                        "reader produced no buffer for stream '{name}' (id {id})"
                    ))
                })?;
                let descriptor = self.catalog.describe(id);
                let declared_rows = descriptor.sample_shape.elements();
                self.num_parallel_sequences =
                    fill_from_stream(descriptor.storage, matrix, declared_rows, name, stream)?;
            }
        }

        if self.phase == EpochPhase::Active {
            self.prefetch.issue();
        }

        Ok(has_data)
    }

    /// Parallel-sequence count of the most recently materialized minibatch,
    /// or the configured initial value before the first one.
    pub fn num_parallel_sequences(&self) -> usize {
        self.num_parallel_sequences
    }

    /// End-of-data detection is not implemented at this layer; epoch
    /// termination is signalled through [`Self::get_next_minibatch`]
    /// returning `false`.
    pub fn data_end(&self) -> bool {
        false
    }

    /// The resolved stream catalog.
    pub fn catalog(&self) -> &StreamCatalog {
        &self.catalog
    }
}
