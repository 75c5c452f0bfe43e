//! Immutable reference data for the EcoSort mini-games.
//!
//! Catalogs are loaded once at startup and never mutate. Each catalog owns an
//! ordered list of entities plus id indexes for lookup:
//!
//! - `items` - sortable items and the map areas they belong to
//! - `lab` - diagnostic tests (with their step sequences) and plastic samples
//! - `plastics` - scanner items with reference dial properties
//!
//! Construction validates referential integrity (duplicate ids, foreign keys,
//! empty step lists, out-of-range properties) so sessions can assume a
//! well-formed catalog. The `from_json` constructors accept the JSON documents
//! the reference datasets ship as.

pub mod items;
pub mod lab;
pub mod plastics;

pub use items::{Area, Difficulty, Item, ItemCatalog, ItemCategory};
pub use lab::{LabCatalog, LabStep, LabTest, PlasticSample, StepAction, TestType, TESTS_PER_SAMPLE};
pub use plastics::{
    BendCue, FloatSink, MeltPeak, PlasticCatalog, PlasticHints, PlasticItem, PlasticProperties,
    PlasticType,
};

/// Catalog construction/parse errors.
#[derive(Debug)]
pub enum CatalogError {
    /// The JSON document failed to parse.
    Parse(serde_json::Error),
    DuplicateItem(String),
    DuplicateArea(String),
    /// An item references an area that is not in the area list.
    UnknownArea { item: String, area: String },
    DuplicateTest(TestType),
    DuplicateSample(String),
    /// A test has no steps; the step machine needs at least one.
    EmptySteps(TestType),
    /// Fewer tests than a sample's test sequence draws.
    NotEnoughTests { have: usize },
    DuplicatePlastic(String),
    /// A reference property is outside the dial range [0, 100].
    PropertyOutOfRange { item: String, value: f64 },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse catalog JSON: {}", err),
            Self::DuplicateItem(id) => write!(f, "Duplicate item id: {}", id),
            Self::DuplicateArea(id) => write!(f, "Duplicate area id: {}", id),
            Self::UnknownArea { item, area } => {
                write!(f, "Item {} references unknown area {}", item, area)
            }
            Self::DuplicateTest(id) => write!(f, "Duplicate test id: {}", id.as_str()),
            Self::DuplicateSample(id) => write!(f, "Duplicate sample id: {}", id),
            Self::EmptySteps(id) => write!(f, "Test {} has no steps", id.as_str()),
            Self::NotEnoughTests { have } => {
                write!(f, "Need at least {} tests, have {}", TESTS_PER_SAMPLE, have)
            }
            Self::DuplicatePlastic(id) => write!(f, "Duplicate plastic item id: {}", id),
            Self::PropertyOutOfRange { item, value } => {
                write!(f, "Plastic item {} has property {} outside [0, 100]", item, value)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}
