//! EcoSort State Library
//!
//! This crate provides state management for the EcoSort mini-game suite.
//!
//! # Overview
//!
//! Three independently playable mini-games, each driven by its own
//! finite-state session:
//!
//! - **Area Sort** - sort items found across map areas as recyclable or
//!   not, with lives, streaks, and per-area progress.
//!
//! - **Home Lab** - run diagnostic tests on a plastic sample step by step,
//!   then identify its material.
//!
//! - **Plastic Scanner** - tune four dial readings against an item's
//!   reference properties and route it to the correct resin line before
//!   the countdown runs out.
//!
//! # Design Principles
//!
//! 1. **Catalogs are immutable** - Reference data loads once at startup
//!    and is validated on construction; sessions only look it up.
//!
//! 2. **Commands run to completion** - Each command mutates the session
//!    and publishes a consistent snapshot. Invalid input is a silent no-op,
//!    never a panic or a corrupted invariant.
//!
//! 3. **No I/O** - This crate is pure state: no networking, no files, no
//!    background threads. Deferred effects are deadline objects the host
//!    drives by polling.
//!
//! 4. **Serialization-ready** - Catalogs parse from JSON; sessions convert
//!    to JSON snapshots for clients.
//!
//! # Example
//!
//! ```rust
//! use ecosort_state::catalog::{Area, Difficulty, Item, ItemCatalog, ItemCategory};
//! use ecosort_state::state::{AreaSortSession, IdentifyOutcome};
//!
//! let catalog = ItemCatalog::new(
//!     vec![Item {
//!         id: "bottle".to_string(),
//!         name: "Water bottle".to_string(),
//!         category: ItemCategory::Plastic,
//!         is_recyclable: true,
//!         difficulty: Difficulty::Easy,
//!         description: String::new(),
//!         fun_fact: String::new(),
//!         area: "beach".to_string(),
//!     }],
//!     vec![Area {
//!         id: "beach".to_string(),
//!         name: "Beach".to_string(),
//!         icon: String::new(),
//!         difficulty: Difficulty::Easy,
//!     }],
//! )
//! .unwrap();
//!
//! let mut session = AreaSortSession::new(catalog);
//! session.start_game();
//! session.enter_area("beach");
//!
//! let outcome = session.identify_item("bottle", true, 2.5);
//! assert_eq!(outcome, Some(IdentifyOutcome::Correct { streak_bonus: false }));
//! assert_eq!(session.score, 10);
//! ```

pub mod catalog;
pub mod state;

// Re-export the catalog and session types at the crate root
pub use catalog::{
    Area, CatalogError, Difficulty, Item, ItemCatalog, ItemCategory, LabCatalog, LabStep, LabTest,
    PlasticCatalog, PlasticItem, PlasticProperties, PlasticSample, PlasticType, StepAction,
    TestType,
};
pub use state::{
    dial_accuracy, AreaProgress, AreaSortSession, Dial, DialReadings, IdentifiedItem,
    IdentifyOutcome, LabPhase, LabResult, LabRules, LabSession, Language, RouteVerdict,
    ScannerPhase, ScannerResult, ScannerRules, ScannerSession, SettingsUpdate, SortPhase,
    SortRules, SortSettings,
};
