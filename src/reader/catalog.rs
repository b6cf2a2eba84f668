// src/reader/catalog.rs

use std::collections::BTreeMap;

use crate::error::{Result, ShimError};

use super::traits::StreamDescriptor;

/// Name-to-id resolution over the reader's declared streams.
///
/// Built once per reader instantiation and never mutated afterward. Each
/// descriptor's id must equal its position in the declared list, and names
/// must be unique; a reader violating either has misdeclared its streams.
#[derive(Debug)]
pub struct StreamCatalog {
    by_name: BTreeMap<String, usize>,
    descriptors: Vec<StreamDescriptor>,
}

impl StreamCatalog {
    pub fn from_descriptors(descriptors: Vec<StreamDescriptor>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for (position, descriptor) in descriptors.iter().enumerate() {
            if descriptor.id != position {
                return Err(ShimError::reader(format!(
                    "stream '{}' declares id {} but sits at position {}",
                    descriptor.name, descriptor.id, position
                )));
            }
            if by_name.insert(descriptor.name.clone(), descriptor.id).is_some() {
                return Err(ShimError::reader(format!(
                    "duplicate stream name '{}'",
                    descriptor.name
                )));
            }
        }
        Ok(Self {
            by_name,
            descriptors,
        })
    }

    /// Resolves a consumer-facing input name to a stream id.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ShimError::unknown_input(name, self.available_inputs()))
    }

    /// Descriptor lookup by id. Ids come from [`Self::resolve`], so an
    /// out-of-range id is a bug in the calling code.
    pub fn describe(&self, id: usize) -> &StreamDescriptor {
        &self.descriptors[id]
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All valid input names, sorted, quoted, comma-separated. Used in
    /// unknown-input messages.
    pub fn available_inputs(&self) -> String {
        self.by_name
            .keys()
            .map(|name| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
