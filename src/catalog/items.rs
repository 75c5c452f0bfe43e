//! Sortable item and map area reference data.
//!
//! Items are a flat ordered list; area membership is derived by filtering on
//! the `area` foreign key. The area sort session counts items per area at
//! start to seed its progress tracking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Difficulty rating shared by items and areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// Material category of a sortable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Plastic,
    Metal,
    Glass,
    Paper,
    Organic,
    Other,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plastic => "plastic",
            Self::Metal => "metal",
            Self::Glass => "glass",
            Self::Paper => "paper",
            Self::Organic => "organic",
            Self::Other => "other",
        }
    }
}

/// A sortable item found in one of the map areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub is_recyclable: bool,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fun_fact: String,
    /// Foreign key into the area list.
    pub area: String,
}

/// A map area items are found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub difficulty: Difficulty,
}

/// Item and area catalog.
///
/// Owns both ordered lists; lookups go through id indexes. Construction
/// rejects duplicate ids and dangling area references.
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    items: Vec<Item>,
    areas: Vec<Area>,
    item_index: HashMap<String, usize>,
    area_index: HashMap<String, usize>,
}

impl ItemCatalog {
    pub fn new(items: Vec<Item>, areas: Vec<Area>) -> Result<Self, CatalogError> {
        let mut area_index = HashMap::new();
        for (i, area) in areas.iter().enumerate() {
            if area_index.insert(area.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateArea(area.id.clone()));
            }
        }

        let mut item_index = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            if item_index.insert(item.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateItem(item.id.clone()));
            }
            if !area_index.contains_key(&item.area) {
                return Err(CatalogError::UnknownArea {
                    item: item.id.clone(),
                    area: item.area.clone(),
                });
            }
        }

        Ok(Self {
            items,
            areas,
            item_index,
            area_index,
        })
    }

    /// Parse from two JSON arrays (items, areas).
    pub fn from_json(items_json: &str, areas_json: &str) -> Result<Self, CatalogError> {
        let items: Vec<Item> = serde_json::from_str(items_json)?;
        let areas: Vec<Area> = serde_json::from_str(areas_json)?;
        Self::new(items, areas)
    }

    /// Get an item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.item_index.get(id).map(|&i| &self.items[i])
    }

    /// Get an area by id.
    pub fn area(&self, id: &str) -> Option<&Area> {
        self.area_index.get(id).map(|&i| &self.areas[i])
    }

    /// All items in catalog order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All areas in catalog order.
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Items belonging to an area, in catalog order.
    pub fn items_in_area(&self, area_id: &str) -> Vec<&Item> {
        self.items.iter().filter(|item| item.area == area_id).collect()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }
}
