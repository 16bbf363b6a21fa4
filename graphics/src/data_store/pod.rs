use std::collections::HashMap;

use crate::error::GraphicsError;

use super::PodDataStore;

#[derive(Debug)]
struct PodEntry {
    type_name: String,
    data: Vec<u8>,
}

/// In-memory [`PodDataStore`].
#[derive(Debug, Default)]
pub struct DefaultPodDataStore {
    name: String,
    entries: HashMap<String, PodEntry>,
}

impl DefaultPodDataStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PodDataStore for DefaultPodDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_pod(
        &mut self,
        type_name: &str,
        name: &str,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if self.entries.contains_key(name) {
            return Err(GraphicsError::InvalidParameter(format!(
                "POD entry `{name}` already exists"
            )));
        }
        self.entries.insert(
            name.to_string(),
            PodEntry {
                type_name: type_name.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|entry| entry.data.as_slice())
    }

    fn set(&mut self, name: &str, data: &[u8]) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) if entry.data.len() == data.len() => {
                entry.data.copy_from_slice(data);
                true
            }
            _ => false,
        }
    }

    fn destroy_pod(&mut self, type_name: &str, name: &str) -> bool {
        match self.entries.get(name) {
            Some(entry) if entry.type_name == type_name => {
                self.entries.remove(name);
                true
            }
            _ => false,
        }
    }
}
