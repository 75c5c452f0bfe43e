//! Session state machines for the three EcoSort mini-games.
//!
//! Each mini-game has its own session type. The machines are structurally
//! similar but independent: no shared runtime state, each purpose-built and
//! fixed-shape.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  AreaSortSession          LabSession            ScannerSession       │
//! │                                                                      │
//! │  map ─ zooming ─ area     intro ─ testing       ready ─ scanning     │
//! │   │      popup   │          │   identify │        │   feedback │     │
//! │   │   feedback   │          │  feedback  │        │            │     │
//! │   └── results ───┘          └─ results ──┘        └─ results ──┘     │
//! │                                                                      │
//! │  owns: ItemCatalog        owns: LabCatalog      owns: PlasticCatalog │
//! │        deferred zoom            RNG + sample          RNG + item     │
//! │        transition               order                 order,         │
//! │                                                       countdown      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands run to completion against the current state; there is no
//! locking because sessions are never shared between game instances. Time-
//! deferred effects (the zoom transition, the scan animation, the scanner
//! countdown) are deadline objects from [`timer`], owned by the session and
//! applied by `poll()` from the host's clock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ecosort_state::state::{AreaSortSession, LabSession, ScannerSession};
//!
//! let mut sort = AreaSortSession::new(item_catalog);
//! sort.start_game();
//! sort.enter_area("beach");
//! sort.poll(); // applies the zoom transition once due
//! let outcome = sort.identify_item("bottle", true, 2.5);
//!
//! let mut lab = LabSession::new(lab_catalog);
//! lab.start_game();
//! lab.perform_step();
//! lab.complete_step(true);
//!
//! let mut scanner = ScannerSession::new(plastic_catalog);
//! scanner.start_game();
//! scanner.set_dial(Dial::Density, 72.0);
//! scanner.route_to_line(PlasticType::Pet);
//! ```

pub mod area_sort;
pub mod lab;
pub mod scanner;
pub mod timer;

// Re-export commonly used types
pub use area_sort::{
    AreaProgress, AreaSortSession, IdentifiedItem, IdentifyOutcome, Language, SettingsUpdate,
    SortPhase, SortRules, SortSettings,
};
pub use lab::{LabPhase, LabResult, LabRules, LabSession};
pub use scanner::{
    dial_accuracy, Dial, DialReadings, RouteVerdict, ScannerPhase, ScannerResult, ScannerRules,
    ScannerSession,
};
pub use timer::{Countdown, OneShot};
