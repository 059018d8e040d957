use super::data::Entity;
use crate::error::{BookError, Result};

/// The bundled encyclopedia dataset, compiled into the binary
const BUILTIN_ANIMALS: &str = include_str!("../../data/animals.json");

/// The ContentStore holds the immutable, ordered list of entries.
/// It is built once at start-up and only ever read afterwards.
#[derive(Debug, Clone)]
pub struct ContentStore {
    entities: Vec<Entity>,
}

impl ContentStore {
    /// Load the dataset that ships with the application
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_ANIMALS)
    }

    /// Parse a JSON array of records and validate the id sequence
    pub fn from_json(json: &str) -> Result<Self> {
        let entities: Vec<Entity> =
            serde_json::from_str(json).map_err(BookError::ContentParse)?;
        Self::new(entities)
    }

    /// Build a store from records, rejecting non-contiguous ids
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        for (position, entity) in entities.iter().enumerate() {
            let expected = position as u32 + 1;
            if entity.id != expected {
                return Err(BookError::ContentId {
                    position,
                    expected,
                    found: entity.id,
                });
            }
        }

        log::info!("📚 Content store loaded with {} entries", entities.len());
        Ok(Self { entities })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entry by 0-based index
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Photo filenames referenced by the dataset, in record order
    pub fn image_files(&self) -> Vec<String> {
        self.entities
            .iter()
            .filter_map(|e| e.image.clone())
            .collect()
    }
}
