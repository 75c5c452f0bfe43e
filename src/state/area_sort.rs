//! Area sort session - "sort items found across map areas".
//!
//! Tracks one play-through of the map game: the player zooms into areas,
//! inspects items, and calls each one recyclable or not. Scoring, lives,
//! streaks and per-area progress live here.
//!
//! # Phase Diagram
//!
//! ```text
//! ┌─────────┐ enter_area ┌─────────┐  (zoom delay)  ┌────────┐
//! │   Map   │───────────▶│ Zooming │───────────────▶│  Area  │◀──────────┐
//! └─────────┘            └─────────┘                └───┬────┘           │
//!      ▲                                                │ open_item_popup│
//!      │ dismiss_feedback                               ▼                │
//!      │ (area complete)                            ┌────────┐ close     │
//!      │                                            │ Popup  │───────────┘
//!      │                 ┌──────────┐ identify_item └───┬────┘
//!      ├─────────────────│ Feedback │◀──────────────────┘
//!      │                 └────┬─────┘
//!      │                      │ dismiss_feedback (game over)
//!      │                      ▼
//!      │                 ┌─────────┐
//!      └───exit_area─────│ Results │
//!                        └─────────┘
//! ```
//!
//! The zoom transition is deferred: `enter_area` schedules it and `poll`
//! applies it only if the session is still zooming (a player exiting
//! mid-animation leaves the stale transition unapplied).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::catalog::ItemCatalog;

use super::timer::OneShot;

/// Points for a correct identification.
pub const BASE_POINTS: u32 = 10;

/// Streak length that triggers the one-time bonus.
pub const STREAK_BONUS_AT: u32 = 5;

/// Bonus points granted when the streak hits [`STREAK_BONUS_AT`].
pub const STREAK_BONUS: u32 = 50;

/// Lives at game start.
pub const STARTING_LIVES: u32 = 3;

/// Delay before the map zoom settles into the area view.
pub const ZOOM_DELAY: Duration = Duration::from_millis(800);

/// Area sort state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPhase {
    /// Looking at the map
    #[default]
    Map,
    /// Zoom animation into an area
    Zooming,
    /// Inside an area
    Area,
    /// Item detail popup open
    Popup,
    /// Showing answer feedback
    Feedback,
    /// Final results screen
    Results,
}

impl SortPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Zooming => "zooming",
            Self::Area => "area",
            Self::Popup => "popup",
            Self::Feedback => "feedback",
            Self::Results => "results",
        }
    }

    /// Check if this is the terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Results)
    }
}

/// Display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    ZhHk,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhHk => "zh-HK",
        }
    }
}

/// Player settings. These survive `reset` and `start_game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSettings {
    pub sound_enabled: bool,
    pub language: Language,
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            language: Language::En,
        }
    }
}

impl SortSettings {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sound_enabled": self.sound_enabled,
            "language": self.language.as_str()
        })
    }
}

/// Partial settings update; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub sound_enabled: Option<bool>,
    pub language: Option<Language>,
}

/// Scoring configuration, defaulted from the module constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortRules {
    pub base_points: u32,
    pub streak_bonus_at: u32,
    pub streak_bonus: u32,
    pub starting_lives: u32,
    pub zoom_delay: Duration,
}

impl Default for SortRules {
    fn default() -> Self {
        Self {
            base_points: BASE_POINTS,
            streak_bonus_at: STREAK_BONUS_AT,
            streak_bonus: STREAK_BONUS,
            starting_lives: STARTING_LIVES,
            zoom_delay: ZOOM_DELAY,
        }
    }
}

/// Identification progress within one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaProgress {
    pub total: u32,
    pub found: u32,
    pub correct: u32,
}

impl AreaProgress {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total": self.total,
            "found": self.found,
            "correct": self.correct
        })
    }
}

/// Record of one identified item.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedItem {
    pub item_id: String,
    pub correct: bool,
    /// true = player said recyclable
    pub player_choice: bool,
    pub time_to_decide: f64,
    pub timestamp: DateTime<Utc>,
}

impl IdentifiedItem {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "item_id": self.item_id,
            "correct": self.correct,
            "player_choice": self.player_choice,
            "time_to_decide": self.time_to_decide,
            "timestamp": self.timestamp.to_rfc3339()
        })
    }
}

/// Immediate feedback returned by `identify_item`, distinct from the
/// published session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyOutcome {
    Correct { streak_bonus: bool },
    Incorrect,
}

/// A deferred phase change. Applied by `poll` only if the session is still
/// in the phase it was scheduled from.
#[derive(Debug, Clone, Copy)]
struct DeferredPhase {
    fires: OneShot,
    expected: SortPhase,
    target: SortPhase,
}

/// Area sort session state.
#[derive(Debug, Clone)]
pub struct AreaSortSession {
    catalog: ItemCatalog,
    rules: SortRules,

    /// Opaque pass-through identifiers; no logic attached.
    pub user_id: Option<i64>,
    pub session_id: Option<i64>,

    pub score: u32,
    pub lives: u32,
    pub max_lives: u32,
    pub current_streak: u32,
    pub longest_streak: u32,

    pub total_items_identified: u32,
    pub total_items: u32,
    pub current_area: Option<String>,
    pub area_progress: HashMap<String, AreaProgress>,
    /// Append-only; an area is added the moment its last item is found.
    pub completed_areas: Vec<String>,
    pub inspected_item: Option<String>,
    pub identified_items: HashMap<String, IdentifiedItem>,

    pub is_playing: bool,
    pub is_paused: bool,
    pub phase: SortPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,

    pub settings: SortSettings,

    pending_zoom: Option<DeferredPhase>,
}

impl AreaSortSession {
    /// Create a session over a catalog with default rules.
    pub fn new(catalog: ItemCatalog) -> Self {
        Self::with_rules(catalog, SortRules::default())
    }

    /// Create a session with custom rules.
    pub fn with_rules(catalog: ItemCatalog, rules: SortRules) -> Self {
        let area_progress = Self::build_area_progress(&catalog);
        let total_items = catalog.item_count() as u32;
        Self {
            catalog,
            rules,
            user_id: None,
            session_id: None,
            score: 0,
            lives: rules.starting_lives,
            max_lives: rules.starting_lives,
            current_streak: 0,
            longest_streak: 0,
            total_items_identified: 0,
            total_items,
            current_area: None,
            area_progress,
            completed_areas: Vec::new(),
            inspected_item: None,
            identified_items: HashMap::new(),
            is_playing: false,
            is_paused: false,
            phase: SortPhase::Map,
            started_at: None,
            ended_at: None,
            settings: SortSettings::default(),
            pending_zoom: None,
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &SortRules {
        &self.rules
    }

    fn build_area_progress(catalog: &ItemCatalog) -> HashMap<String, AreaProgress> {
        catalog
            .areas()
            .iter()
            .map(|area| {
                let total = catalog.items_in_area(&area.id).len() as u32;
                (area.id.clone(), AreaProgress { total, found: 0, correct: 0 })
            })
            .collect()
    }

    /// Reset everything except settings and pass-through ids.
    fn clear(&mut self) {
        self.score = 0;
        self.lives = self.rules.starting_lives;
        self.max_lives = self.rules.starting_lives;
        self.current_streak = 0;
        self.longest_streak = 0;
        self.total_items_identified = 0;
        self.total_items = self.catalog.item_count() as u32;
        self.current_area = None;
        self.area_progress = Self::build_area_progress(&self.catalog);
        self.completed_areas.clear();
        self.inspected_item = None;
        self.identified_items.clear();
        self.is_playing = false;
        self.is_paused = false;
        self.phase = SortPhase::Map;
        self.started_at = None;
        self.ended_at = None;
        self.pending_zoom = None;
    }

    /// Start a new game.
    pub fn start_game(&mut self) {
        self.clear();
        self.is_playing = true;
        self.started_at = Some(Utc::now());
        debug!("area-sort: game started, {} items to find", self.total_items);
    }

    /// Enter an area from the map. The phase switches to `Zooming`
    /// immediately; the bump to `Area` is applied by `poll` after the zoom
    /// delay, and only if the session is still zooming.
    pub fn enter_area(&mut self, area_id: &str) {
        if self.catalog.area(area_id).is_none() {
            debug!("area-sort: enter_area ignored, unknown area {area_id}");
            return;
        }
        self.current_area = Some(area_id.to_string());
        self.phase = SortPhase::Zooming;
        self.pending_zoom = Some(DeferredPhase {
            fires: OneShot::after(self.rules.zoom_delay),
            expected: SortPhase::Zooming,
            target: SortPhase::Area,
        });
    }

    /// Apply any due deferred transition.
    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Apply any due deferred transition, judged against `now`.
    pub fn poll_at(&mut self, now: Instant) {
        let pending = match self.pending_zoom {
            Some(p) if p.fires.is_due(now) => p,
            _ => return,
        };
        self.pending_zoom = None;
        // Stale guard: the player may have exited mid-zoom.
        if self.phase == pending.expected {
            self.phase = pending.target;
        }
    }

    /// Exit the current area back to the map.
    pub fn exit_area(&mut self) {
        self.current_area = None;
        self.inspected_item = None;
        self.phase = SortPhase::Map;
    }

    /// Open the detail popup for an item.
    pub fn open_item_popup(&mut self, item_id: &str) {
        if self.catalog.item(item_id).is_none() {
            debug!("area-sort: open_item_popup ignored, unknown item {item_id}");
            return;
        }
        self.inspected_item = Some(item_id.to_string());
        self.phase = SortPhase::Popup;
    }

    /// Close the item popup.
    pub fn close_item_popup(&mut self) {
        self.inspected_item = None;
        self.phase = SortPhase::Area;
    }

    /// Identify an item as recyclable or not.
    ///
    /// No-op (returns `None`) when there is no active game, no current area,
    /// the item is unknown, belongs to another area, or was already
    /// identified. Otherwise scores the answer, updates area progress, and
    /// moves to `Feedback`.
    pub fn identify_item(
        &mut self,
        item_id: &str,
        says_recyclable: bool,
        time_to_decide: f64,
    ) -> Option<IdentifyOutcome> {
        if !self.is_playing {
            debug!("area-sort: identify ignored, no active game");
            return None;
        }
        let area_id = match &self.current_area {
            Some(id) => id.clone(),
            None => {
                debug!("area-sort: identify ignored, no current area");
                return None;
            }
        };
        let is_recyclable = match self.catalog.item(item_id) {
            Some(item) if item.area == area_id => item.is_recyclable,
            Some(_) => {
                debug!("area-sort: identify ignored, item {item_id} not in {area_id}");
                return None;
            }
            None => {
                debug!("area-sort: identify ignored, unknown item {item_id}");
                return None;
            }
        };
        if self.identified_items.contains_key(item_id) {
            debug!("area-sort: identify ignored, {item_id} already identified");
            return None;
        }

        let correct = is_recyclable == says_recyclable;
        self.current_streak = if correct { self.current_streak + 1 } else { 0 };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        let streak_bonus = correct && self.current_streak == self.rules.streak_bonus_at;
        if correct {
            self.score += self.rules.base_points;
            if streak_bonus {
                self.score += self.rules.streak_bonus;
            }
        } else {
            self.lives = self.lives.saturating_sub(1);
        }

        self.total_items_identified += 1;
        self.identified_items.insert(
            item_id.to_string(),
            IdentifiedItem {
                item_id: item_id.to_string(),
                correct,
                player_choice: says_recyclable,
                time_to_decide,
                timestamp: Utc::now(),
            },
        );

        if let Some(progress) = self.area_progress.get_mut(&area_id) {
            progress.found += 1;
            if correct {
                progress.correct += 1;
            }
            if progress.found >= progress.total && !self.completed_areas.contains(&area_id) {
                self.completed_areas.push(area_id.clone());
            }
        }

        let game_over = self.lives == 0 || self.completed_areas.len() >= self.catalog.area_count();
        if game_over {
            self.is_playing = false;
            self.ended_at = Some(Utc::now());
            debug!("area-sort: game over, score {}", self.score);
        }

        self.inspected_item = None;
        self.phase = SortPhase::Feedback;

        Some(if correct {
            IdentifyOutcome::Correct { streak_bonus }
        } else {
            IdentifyOutcome::Incorrect
        })
    }

    /// Dismiss the answer feedback and route to the next phase.
    pub fn dismiss_feedback(&mut self) {
        if self.phase != SortPhase::Feedback {
            return;
        }
        if !self.is_playing {
            self.phase = SortPhase::Results;
            return;
        }
        if let Some(area_id) = &self.current_area {
            if self.completed_areas.contains(area_id) {
                self.current_area = None;
                self.phase = SortPhase::Map;
                return;
            }
        }
        self.phase = SortPhase::Area;
    }

    /// End the game early.
    pub fn end_game(&mut self) {
        self.is_playing = false;
        self.phase = SortPhase::Results;
        self.ended_at = Some(Utc::now());
    }

    pub fn toggle_pause(&mut self) {
        self.is_paused = !self.is_paused;
    }

    /// Apply a partial settings update.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        if let Some(sound) = update.sound_enabled {
            self.settings.sound_enabled = sound;
        }
        if let Some(language) = update.language {
            self.settings.language = language;
        }
    }

    /// Restore the initial state. Settings are kept; pass-through ids are
    /// cleared.
    pub fn reset(&mut self) {
        self.clear();
        self.user_id = None;
        self.session_id = None;
    }

    // Derived projections

    /// Count of correctly identified items.
    pub fn correct_count(&self) -> u32 {
        self.identified_items.values().filter(|i| i.correct).count() as u32
    }

    /// Rounded percentage of correct identifications, 0 if none yet.
    pub fn accuracy(&self) -> u32 {
        if self.total_items_identified == 0 {
            return 0;
        }
        let ratio = f64::from(self.correct_count()) / f64::from(self.total_items_identified);
        (ratio * 100.0).round() as u32
    }

    pub fn is_game_over(&self) -> bool {
        !self.is_playing && self.total_items_identified > 0
    }

    /// Whole seconds between game start and end (or now while playing).
    pub fn time_elapsed(&self) -> i64 {
        match self.started_at {
            Some(start) => {
                let end = self.ended_at.unwrap_or_else(Utc::now);
                (end - start).num_seconds().max(0)
            }
            None => 0,
        }
    }

    /// Convert the session to a JSON snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        let area_progress: serde_json::Map<String, serde_json::Value> = self
            .area_progress
            .iter()
            .map(|(id, p)| (id.clone(), p.to_json()))
            .collect();
        let identified: Vec<serde_json::Value> = self
            .identified_items
            .values()
            .map(|i| i.to_json())
            .collect();

        serde_json::json!({
            "phase": self.phase.as_str(),
            "score": self.score,
            "lives": self.lives,
            "max_lives": self.max_lives,
            "current_streak": self.current_streak,
            "longest_streak": self.longest_streak,
            "total_items_identified": self.total_items_identified,
            "total_items": self.total_items,
            "current_area": self.current_area,
            "area_progress": area_progress,
            "completed_areas": self.completed_areas,
            "inspected_item": self.inspected_item,
            "identified_items": identified,
            "is_playing": self.is_playing,
            "is_paused": self.is_paused,
            "accuracy": self.accuracy(),
            "correct_count": self.correct_count(),
            "settings": self.settings.to_json()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Area, Difficulty, Item, ItemCategory};

    fn make_item(id: &str, area: &str, recyclable: bool) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Item {}", id),
            category: ItemCategory::Plastic,
            is_recyclable: recyclable,
            difficulty: Difficulty::Easy,
            description: String::new(),
            fun_fact: String::new(),
            area: area.to_string(),
        }
    }

    fn make_area(id: &str) -> Area {
        Area {
            id: id.to_string(),
            name: format!("Area {}", id),
            icon: String::new(),
            difficulty: Difficulty::Easy,
        }
    }

    /// 12 recyclable items in "beach", 2 non-recyclable in "park".
    fn make_catalog() -> ItemCatalog {
        let mut items: Vec<Item> = (0..12)
            .map(|i| make_item(&format!("b{}", i), "beach", true))
            .collect();
        items.push(make_item("p0", "park", false));
        items.push(make_item("p1", "park", false));
        ItemCatalog::new(items, vec![make_area("beach"), make_area("park")]).unwrap()
    }

    fn make_session() -> AreaSortSession {
        let mut session = AreaSortSession::new(make_catalog());
        session.start_game();
        session
    }

    #[test]
    fn test_initial_state() {
        let session = AreaSortSession::new(make_catalog());
        assert_eq!(session.phase, SortPhase::Map);
        assert!(!session.is_playing);
        assert_eq!(session.lives, STARTING_LIVES);
        assert_eq!(session.total_items, 14);
        assert_eq!(session.area_progress["beach"].total, 12);
        assert_eq!(session.area_progress["park"].total, 2);
    }

    #[test]
    fn test_start_game() {
        let session = make_session();
        assert!(session.is_playing);
        assert_eq!(session.phase, SortPhase::Map);
        assert!(session.started_at.is_some());
        assert!(session.ended_at.is_none());
    }

    #[test]
    fn test_zoom_transition_applies_when_due() {
        let mut session = make_session();
        session.enter_area("beach");
        assert_eq!(session.phase, SortPhase::Zooming);

        // Not yet due.
        session.poll_at(Instant::now());
        assert_eq!(session.phase, SortPhase::Zooming);

        session.poll_at(Instant::now() + Duration::from_millis(900));
        assert_eq!(session.phase, SortPhase::Area);
    }

    #[test]
    fn test_zoom_stale_guard() {
        let mut session = make_session();
        session.enter_area("beach");
        session.exit_area();
        assert_eq!(session.phase, SortPhase::Map);

        // The deferred transition fires but the phase moved on.
        session.poll_at(Instant::now() + Duration::from_millis(900));
        assert_eq!(session.phase, SortPhase::Map);
    }

    #[test]
    fn test_enter_unknown_area_noop() {
        let mut session = make_session();
        session.enter_area("moon");
        assert_eq!(session.phase, SortPhase::Map);
        assert!(session.current_area.is_none());
    }

    #[test]
    fn test_identify_correct() {
        let mut session = make_session();
        session.enter_area("beach");

        let outcome = session.identify_item("b0", true, 2.0);
        assert_eq!(outcome, Some(IdentifyOutcome::Correct { streak_bonus: false }));
        assert_eq!(session.score, 10);
        assert_eq!(session.lives, 3);
        assert_eq!(session.total_items_identified, 1);
        assert_eq!(session.current_streak, 1);
        assert_eq!(session.phase, SortPhase::Feedback);
        assert_eq!(session.area_progress["beach"].found, 1);
        assert_eq!(session.area_progress["beach"].correct, 1);
    }

    #[test]
    fn test_identify_incorrect_costs_life_and_streak() {
        let mut session = make_session();
        session.enter_area("beach");

        session.identify_item("b0", true, 1.0);
        session.identify_item("b1", true, 1.0);
        assert_eq!(session.current_streak, 2);

        let outcome = session.identify_item("b2", false, 1.0);
        assert_eq!(outcome, Some(IdentifyOutcome::Incorrect));
        assert_eq!(session.current_streak, 0);
        assert_eq!(session.longest_streak, 2);
        assert_eq!(session.lives, 2);
        assert_eq!(session.score, 20);
        assert_eq!(session.area_progress["beach"].found, 3);
        assert_eq!(session.area_progress["beach"].correct, 2);
    }

    #[test]
    fn test_streak_bonus_fires_exactly_at_threshold() {
        let mut session = make_session();
        session.enter_area("beach");

        for i in 0..4 {
            let outcome = session.identify_item(&format!("b{}", i), true, 1.0);
            assert_eq!(outcome, Some(IdentifyOutcome::Correct { streak_bonus: false }));
        }
        let fifth = session.identify_item("b4", true, 1.0);
        assert_eq!(fifth, Some(IdentifyOutcome::Correct { streak_bonus: true }));
        assert_eq!(session.score, 10 * 5 + 50);

        // Streak passes 5 only once in an unbroken run; no bonus at 6..=10.
        for i in 5..10 {
            let outcome = session.identify_item(&format!("b{}", i), true, 1.0);
            assert_eq!(outcome, Some(IdentifyOutcome::Correct { streak_bonus: false }));
        }
        assert_eq!(session.score, 10 * 10 + 50);
        assert_eq!(session.current_streak, 10);
    }

    #[test]
    fn test_streak_bonus_fires_again_after_reset() {
        let mut session = make_session();
        session.enter_area("beach");

        for i in 0..5 {
            session.identify_item(&format!("b{}", i), true, 1.0);
        }
        assert_eq!(session.score, 100);

        // Miss resets the streak; climbing back to 5 pays the bonus again.
        session.identify_item("b5", false, 1.0);
        for i in 6..11 {
            session.identify_item(&format!("b{}", i), true, 1.0);
        }
        assert_eq!(session.current_streak, 5);
        assert_eq!(session.score, 100 + 10 * 5 + 50);
        assert_eq!(session.longest_streak, 5);
    }

    #[test]
    fn test_identify_noops_keep_state_identical() {
        let mut session = make_session();
        session.enter_area("beach");
        session.identify_item("b0", true, 1.0);

        let before = session.to_json();

        // Unknown item, repeat item, item from another area.
        assert_eq!(session.identify_item("nope", true, 1.0), None);
        assert_eq!(session.identify_item("b0", false, 1.0), None);
        assert_eq!(session.identify_item("p0", false, 1.0), None);

        assert_eq!(before, session.to_json());
    }

    #[test]
    fn test_identify_without_area_noop() {
        let mut session = make_session();
        assert_eq!(session.identify_item("b0", true, 1.0), None);
        assert_eq!(session.total_items_identified, 0);
    }

    #[test]
    fn test_progress_invariant_holds() {
        let mut session = make_session();
        session.enter_area("park");
        session.identify_item("p0", true, 1.0);
        session.identify_item("p0", true, 1.0);
        session.identify_item("p1", false, 1.0);
        session.identify_item("p1", false, 1.0);

        let progress = session.area_progress["park"];
        assert!(progress.correct <= progress.found);
        assert!(progress.found <= progress.total);
        assert_eq!(progress.found, 2);
    }

    #[test]
    fn test_area_completion_routes_to_map() {
        let mut session = make_session();
        session.enter_area("park");
        session.identify_item("p0", false, 1.0);
        session.dismiss_feedback();
        assert_eq!(session.phase, SortPhase::Area);

        session.identify_item("p1", false, 1.0);
        assert_eq!(session.completed_areas, vec!["park".to_string()]);

        session.dismiss_feedback();
        assert_eq!(session.phase, SortPhase::Map);
        assert!(session.current_area.is_none());
    }

    #[test]
    fn test_game_over_on_lives_exhausted() {
        let mut session = make_session();
        session.enter_area("beach");
        session.identify_item("b0", false, 1.0);
        session.dismiss_feedback();
        session.identify_item("b1", false, 1.0);
        session.dismiss_feedback();
        session.identify_item("b2", false, 1.0);

        assert_eq!(session.lives, 0);
        assert!(!session.is_playing);
        assert!(session.is_game_over());
        assert!(session.ended_at.is_some());

        session.dismiss_feedback();
        assert_eq!(session.phase, SortPhase::Results);
    }

    #[test]
    fn test_game_over_on_all_areas_complete() {
        let mut session = make_session();
        session.enter_area("beach");
        for i in 0..12 {
            session.identify_item(&format!("b{}", i), true, 1.0);
            session.dismiss_feedback();
        }
        session.enter_area("park");
        session.identify_item("p0", false, 1.0);
        session.dismiss_feedback();
        session.identify_item("p1", false, 1.0);

        assert_eq!(session.completed_areas.len(), 2);
        assert!(!session.is_playing);
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn test_accuracy() {
        let mut session = make_session();
        assert_eq!(session.accuracy(), 0);

        session.enter_area("beach");
        session.identify_item("b0", true, 1.0);
        session.identify_item("b1", true, 1.0);
        session.identify_item("b2", false, 1.0);
        assert_eq!(session.correct_count(), 2);
        assert_eq!(session.accuracy(), 67);
    }

    #[test]
    fn test_reset_preserves_settings() {
        let mut session = make_session();
        session.update_settings(SettingsUpdate {
            sound_enabled: Some(false),
            language: Some(Language::ZhHk),
        });
        session.enter_area("beach");
        session.identify_item("b0", true, 1.0);
        session.reset();

        let mut fresh = AreaSortSession::new(make_catalog());
        fresh.update_settings(SettingsUpdate {
            sound_enabled: Some(false),
            language: Some(Language::ZhHk),
        });
        assert_eq!(session.to_json(), fresh.to_json());
        assert_eq!(session.settings.language, Language::ZhHk);
    }

    #[test]
    fn test_pause_and_end_game() {
        let mut session = make_session();
        session.toggle_pause();
        assert!(session.is_paused);
        session.toggle_pause();
        assert!(!session.is_paused);

        session.end_game();
        assert!(!session.is_playing);
        assert_eq!(session.phase, SortPhase::Results);
        assert!(session.time_elapsed() >= 0);
    }

    #[test]
    fn test_custom_rules() {
        let rules = SortRules {
            streak_bonus_at: 2,
            ..SortRules::default()
        };
        let mut session = AreaSortSession::with_rules(make_catalog(), rules);
        session.start_game();
        session.enter_area("beach");

        session.identify_item("b0", true, 1.0);
        let second = session.identify_item("b1", true, 1.0);
        assert_eq!(second, Some(IdentifyOutcome::Correct { streak_bonus: true }));
        assert_eq!(session.score, 10 + 10 + 50);
    }
}
