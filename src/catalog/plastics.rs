//! Plastic item reference data for the scanner game.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Resin codes the scanner routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlasticType {
    Pet,
    Hdpe,
    Pvc,
    Ldpe,
    Pp,
    Ps,
}

impl PlasticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pet => "PET",
            Self::Hdpe => "HDPE",
            Self::Pvc => "PVC",
            Self::Ldpe => "LDPE",
            Self::Pp => "PP",
            Self::Ps => "PS",
        }
    }

    /// Resin identification code (1-6).
    pub fn recycle_code(&self) -> u8 {
        match self {
            Self::Pet => 1,
            Self::Hdpe => 2,
            Self::Pvc => 3,
            Self::Ldpe => 4,
            Self::Pp => 5,
            Self::Ps => 6,
        }
    }
}

impl std::fmt::Display for PlasticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference dial values for one plastic item, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasticProperties {
    pub melting_point: f64,
    pub density: f64,
    pub softening_point: f64,
    pub chlorine: f64,
}

impl PlasticProperties {
    fn values(&self) -> [f64; 4] {
        [self.melting_point, self.density, self.softening_point, self.chlorine]
    }
}

/// Density hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatSink {
    Float,
    Sink,
}

/// Melting point hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeltPeak {
    Sharp,
    Broad,
}

/// Softening hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BendCue {
    Flexible,
    Rigid,
    Brittle,
}

/// Qualitative cues shown alongside the dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasticHints {
    pub float_sink: FloatSink,
    pub melt_peak: MeltPeak,
    pub bend_cue: BendCue,
    pub chlorine_alert: bool,
}

/// A plastic item fed to the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasticItem {
    pub id: String,
    pub name: String,
    pub correct_type: PlasticType,
    pub properties: PlasticProperties,
    pub hints: PlasticHints,
}

/// Plastic item catalog for the scanner game.
#[derive(Debug, Clone)]
pub struct PlasticCatalog {
    items: Vec<PlasticItem>,
    index: HashMap<String, usize>,
}

impl PlasticCatalog {
    pub fn new(items: Vec<PlasticItem>) -> Result<Self, CatalogError> {
        let mut index = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicatePlastic(item.id.clone()));
            }
            for value in item.properties.values() {
                if !(0.0..=100.0).contains(&value) {
                    return Err(CatalogError::PropertyOutOfRange {
                        item: item.id.clone(),
                        value,
                    });
                }
            }
        }
        Ok(Self { items, index })
    }

    /// Parse from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<PlasticItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    /// Get an item by id.
    pub fn item(&self, id: &str) -> Option<&PlasticItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// All items in catalog order.
    pub fn items(&self) -> &[PlasticItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
