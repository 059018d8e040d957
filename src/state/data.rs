/// Shared data structures for the book content
///
/// These structs represent the read-only records that every page
/// of the book is rasterized from.

use serde::{Deserialize, Serialize};

/// Size category of an animal, used for the colored badge
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
    Giant,
}

impl SizeCategory {
    /// Upper-case label drawn inside the badge
    pub fn label(&self) -> &'static str {
        match self {
            SizeCategory::Small => "SMALL",
            SizeCategory::Medium => "MEDIUM",
            SizeCategory::Large => "LARGE",
            SizeCategory::Giant => "GIANT",
        }
    }
}

/// Represents a single encyclopedia entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entity {
    /// 1-based id, contiguous across the dataset
    pub id: u32,
    /// English display name (e.g., "Red Fox")
    pub name_en: String,
    /// Russian display name
    pub name_ru: String,
    pub size: SizeCategory,
    /// Free-form weight range (e.g., "3–8 kg")
    pub weight: String,
    /// Free-form length range
    pub length: String,
    /// Where the animal lives
    pub origin: String,
    pub description: String,
    pub diet: String,
    pub fun_fact: String,
    /// Conservation status line
    pub status: String,
    /// Filename of the photograph (e.g., "fox.jpg"), None if not provided
    #[serde(default)]
    pub image: Option<String>,
}
