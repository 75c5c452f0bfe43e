//! Scanner session - "tune four dial readings, then route item to its bin".
//!
//! The player tunes melting point, density, softening point and chlorine
//! dials to match a plastic item's reference properties, then routes the
//! item to a resin line. A 120-second countdown runs for the whole game.
//!
//! # Phase Diagram
//!
//! ```text
//! ┌───────┐ start_game ┌──────────┐ route_to_line ┌──────────┐
//! │ Ready │───────────▶│ Scanning │──────────────▶│ Feedback │
//! └───────┘            └──────────┘               └────┬─────┘
//!                           ▲                          │ next_item
//!                           └──────────────────────────┤
//!                                                      │ (no lives / items /
//!                                                      │  time, or countdown
//!                                                 ┌────▼─────┐ hits zero)
//!                                                 │ Results  │
//!                                                 └──────────┘
//! ```
//!
//! The countdown is an owned deadline object driven by `poll`; it is
//! replaced on `start_game` and dropped on terminal transitions and `reset`,
//! so at most one countdown is ever live for a session.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::catalog::{PlasticCatalog, PlasticItem, PlasticProperties, PlasticType};

use super::timer::{Countdown, OneShot};

/// Points for a correct routing.
pub const BASE_POINTS: u32 = 15;

/// Minimum streak for the streak bonus.
pub const STREAK_BONUS_MIN: u32 = 3;

/// Bonus points for a correct routing at or above [`STREAK_BONUS_MIN`].
pub const STREAK_BONUS: u32 = 5;

/// Dial accuracy above this earns the accuracy bonus.
pub const DIAL_BONUS_THRESHOLD: f64 = 70.0;

/// Lives at game start.
pub const STARTING_LIVES: u32 = 3;

/// Countdown length in seconds.
pub const TIME_LIMIT_SECS: u32 = 120;

/// Countdown tick interval.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How long the scan animation runs before clearing.
pub const SCAN_DELAY: Duration = Duration::from_secs(1);

/// Default position of every dial.
pub const DEFAULT_READING: f64 = 50.0;

/// Scanner state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScannerPhase {
    #[default]
    Ready,
    Scanning,
    Feedback,
    Results,
}

impl ScannerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Scanning => "scanning",
            Self::Feedback => "feedback",
            Self::Results => "results",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Results)
    }
}

/// The four tunable dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dial {
    MeltingPoint,
    Density,
    SofteningPoint,
    Chlorine,
}

impl Dial {
    pub const ALL: [Dial; 4] = [
        Dial::MeltingPoint,
        Dial::Density,
        Dial::SofteningPoint,
        Dial::Chlorine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MeltingPoint => "melting_point",
            Self::Density => "density",
            Self::SofteningPoint => "softening_point",
            Self::Chlorine => "chlorine",
        }
    }
}

/// Player-set dial values, each clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialReadings {
    pub melting_point: f64,
    pub density: f64,
    pub softening_point: f64,
    pub chlorine: f64,
}

impl Default for DialReadings {
    fn default() -> Self {
        Self {
            melting_point: DEFAULT_READING,
            density: DEFAULT_READING,
            softening_point: DEFAULT_READING,
            chlorine: DEFAULT_READING,
        }
    }
}

impl DialReadings {
    pub fn get(&self, dial: Dial) -> f64 {
        match dial {
            Dial::MeltingPoint => self.melting_point,
            Dial::Density => self.density,
            Dial::SofteningPoint => self.softening_point,
            Dial::Chlorine => self.chlorine,
        }
    }

    /// Set a dial, clamping to [0, 100].
    pub fn set(&mut self, dial: Dial, value: f64) {
        let value = value.clamp(0.0, 100.0);
        match dial {
            Dial::MeltingPoint => self.melting_point = value,
            Dial::Density => self.density = value,
            Dial::SofteningPoint => self.softening_point = value,
            Dial::Chlorine => self.chlorine = value,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "melting_point": self.melting_point,
            "density": self.density,
            "softening_point": self.softening_point,
            "chlorine": self.chlorine
        })
    }
}

/// Closeness of the dial readings to an item's reference properties, 0-100.
///
/// 100 minus the mean absolute difference across the four dials, floored at
/// zero. The routing bonus is computed from this wherever it is needed.
pub fn dial_accuracy(readings: &DialReadings, reference: &PlasticProperties) -> f64 {
    let diffs = [
        (readings.melting_point - reference.melting_point).abs(),
        (readings.density - reference.density).abs(),
        (readings.softening_point - reference.softening_point).abs(),
        (readings.chlorine - reference.chlorine).abs(),
    ];
    let avg = diffs.iter().sum::<f64>() / diffs.len() as f64;
    (100.0 - avg).max(0.0)
}

/// Outcome of the last routing. The correct type is only carried when the
/// player got it wrong; a correct route already names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteVerdict {
    Correct,
    Incorrect { correct_type: PlasticType },
}

impl RouteVerdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Correct => serde_json::json!({"result": "correct"}),
            Self::Incorrect { correct_type } => serde_json::json!({
                "result": "incorrect",
                "correct_type": correct_type.as_str()
            }),
        }
    }
}

/// Scoring configuration, defaulted from the module constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScannerRules {
    pub base_points: u32,
    pub streak_bonus_min: u32,
    pub streak_bonus: u32,
    pub dial_bonus_threshold: f64,
    pub starting_lives: u32,
    pub time_limit_secs: u32,
    pub tick_interval: Duration,
    pub scan_delay: Duration,
}

impl Default for ScannerRules {
    fn default() -> Self {
        Self {
            base_points: BASE_POINTS,
            streak_bonus_min: STREAK_BONUS_MIN,
            streak_bonus: STREAK_BONUS,
            dial_bonus_threshold: DIAL_BONUS_THRESHOLD,
            starting_lives: STARTING_LIVES,
            time_limit_secs: TIME_LIMIT_SECS,
            tick_interval: TICK_INTERVAL,
            scan_delay: SCAN_DELAY,
        }
    }
}

/// Outcome record for one routed item.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerResult {
    pub item_id: String,
    pub player_choice: PlasticType,
    pub correct_type: PlasticType,
    pub correct: bool,
    /// Dial positions at decision time.
    pub dial_readings: DialReadings,
    pub time_to_decide: f64,
}

impl ScannerResult {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "item_id": self.item_id,
            "player_choice": self.player_choice.as_str(),
            "correct_type": self.correct_type.as_str(),
            "correct": self.correct,
            "dial_readings": self.dial_readings.to_json(),
            "time_to_decide": self.time_to_decide
        })
    }
}

/// Scanner session state.
#[derive(Debug, Clone)]
pub struct ScannerSession {
    catalog: PlasticCatalog,
    rules: ScannerRules,
    rng: StdRng,
    /// Shuffled indices into the item list; reshuffled each `start_game`.
    item_order: Vec<usize>,

    pub phase: ScannerPhase,
    pub score: u32,
    pub lives: u32,
    pub max_lives: u32,

    pub current_item_index: usize,
    pub total_items: usize,
    pub dial_readings: DialReadings,
    pub is_scanning: bool,
    pub last_route: Option<RouteVerdict>,
    pub streak: u32,
    pub longest_streak: u32,

    pub results: Vec<ScannerResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub time_limit: u32,
    pub time_remaining: u32,

    countdown: Option<Countdown>,
    scan_clear: Option<OneShot>,
}

impl ScannerSession {
    /// Create a session over a catalog with default rules.
    pub fn new(catalog: PlasticCatalog) -> Self {
        Self::build(catalog, ScannerRules::default(), StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a session with custom rules.
    pub fn with_rules(catalog: PlasticCatalog, rules: ScannerRules) -> Self {
        Self::build(catalog, rules, StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a session with a fixed RNG seed (deterministic shuffle).
    pub fn with_seed(catalog: PlasticCatalog, seed: u64) -> Self {
        Self::build(catalog, ScannerRules::default(), StdRng::seed_from_u64(seed))
    }

    fn build(catalog: PlasticCatalog, rules: ScannerRules, rng: StdRng) -> Self {
        Self {
            catalog,
            rules,
            rng,
            item_order: Vec::new(),
            phase: ScannerPhase::Ready,
            score: 0,
            lives: rules.starting_lives,
            max_lives: rules.starting_lives,
            current_item_index: 0,
            total_items: 0,
            dial_readings: DialReadings::default(),
            is_scanning: false,
            last_route: None,
            streak: 0,
            longest_streak: 0,
            results: Vec::new(),
            started_at: None,
            time_limit: rules.time_limit_secs,
            time_remaining: rules.time_limit_secs,
            countdown: None,
            scan_clear: None,
        }
    }

    pub fn catalog(&self) -> &PlasticCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &ScannerRules {
        &self.rules
    }

    /// Shuffled play order, as indices into the item list.
    pub fn item_order(&self) -> &[usize] {
        &self.item_order
    }

    /// The item currently on the belt.
    pub fn current_item(&self) -> Option<&PlasticItem> {
        self.item_order
            .get(self.current_item_index)
            .and_then(|&i| self.catalog.items().get(i))
    }

    fn clear(&mut self) {
        self.item_order.clear();
        self.phase = ScannerPhase::Ready;
        self.score = 0;
        self.lives = self.rules.starting_lives;
        self.max_lives = self.rules.starting_lives;
        self.current_item_index = 0;
        self.total_items = 0;
        self.dial_readings = DialReadings::default();
        self.is_scanning = false;
        self.last_route = None;
        self.streak = 0;
        self.longest_streak = 0;
        self.results.clear();
        self.started_at = None;
        self.time_limit = self.rules.time_limit_secs;
        self.time_remaining = self.rules.time_limit_secs;
        self.countdown = None;
        self.scan_clear = None;
    }

    fn elapsed_secs(&self) -> f64 {
        match self.started_at {
            Some(start) => ((Utc::now() - start).num_milliseconds() as f64 / 1000.0).max(0.0),
            None => 0.0,
        }
    }

    /// Start a new game: reshuffle items, reset dials, start the countdown.
    /// Any countdown from a previous game is dropped first.
    pub fn start_game(&mut self) {
        self.clear();
        let mut order: Vec<usize> = (0..self.catalog.item_count()).collect();
        order.shuffle(&mut self.rng);
        self.item_order = order;
        self.total_items = self.item_order.len();
        self.phase = ScannerPhase::Scanning;
        self.started_at = Some(Utc::now());
        self.countdown = Some(Countdown::new(self.rules.tick_interval));
        debug!(
            "scanner: game started with {} items, {}s limit",
            self.total_items, self.time_limit
        );
    }

    /// Apply due countdown ticks and scan-animation clears.
    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Apply due countdown ticks and scan-animation clears, judged against
    /// `now`. When the countdown reaches zero it is dropped and the phase is
    /// forced to `Results`.
    pub fn poll_at(&mut self, now: Instant) {
        if let Some(countdown) = self.countdown.as_mut() {
            let ticks = countdown.due_ticks(now);
            if ticks > 0 {
                self.time_remaining = self.time_remaining.saturating_sub(ticks);
                if self.time_remaining == 0 {
                    self.countdown = None;
                    self.phase = ScannerPhase::Results;
                    debug!("scanner: time expired, score {}", self.score);
                }
            }
        }
        if let Some(shot) = self.scan_clear {
            if shot.is_due(now) {
                self.is_scanning = false;
                self.scan_clear = None;
            }
        }
    }

    /// Set a dial reading, clamped to [0, 100].
    pub fn set_dial(&mut self, dial: Dial, value: f64) {
        self.dial_readings.set(dial, value);
    }

    /// Run the scan animation. Cosmetic only; cleared by `poll` after the
    /// scan delay.
    pub fn scan(&mut self) {
        if self.phase != ScannerPhase::Scanning {
            return;
        }
        self.is_scanning = true;
        self.scan_clear = Some(OneShot::after(self.rules.scan_delay));
    }

    /// Route the current item to a resin line.
    pub fn route_to_line(&mut self, choice: PlasticType) {
        if self.phase != ScannerPhase::Scanning {
            debug!("scanner: route ignored outside scanning phase");
            return;
        }
        let (item_id, correct_type, reference) = match self.current_item() {
            Some(item) => (item.id.clone(), item.correct_type, item.properties),
            None => {
                debug!("scanner: route ignored, no current item");
                return;
            }
        };

        let correct = correct_type == choice;
        self.streak = if correct { self.streak + 1 } else { 0 };
        self.longest_streak = self.longest_streak.max(self.streak);

        if correct {
            self.score += self.rules.base_points;
            if self.streak >= self.rules.streak_bonus_min {
                self.score += self.rules.streak_bonus;
            }
            let accuracy = dial_accuracy(&self.dial_readings, &reference);
            if accuracy > self.rules.dial_bonus_threshold {
                self.score += (accuracy / 10.0).round() as u32;
            }
        } else {
            self.lives = self.lives.saturating_sub(1);
        }

        self.results.push(ScannerResult {
            item_id,
            player_choice: choice,
            correct_type,
            correct,
            dial_readings: self.dial_readings,
            time_to_decide: self.elapsed_secs(),
        });
        self.last_route = Some(if correct {
            RouteVerdict::Correct
        } else {
            RouteVerdict::Incorrect { correct_type }
        });
        self.phase = ScannerPhase::Feedback;
    }

    /// Move to the next item, or to results when out of lives, items, or
    /// time. Terminal transitions drop the countdown.
    pub fn next_item(&mut self) {
        if self.phase != ScannerPhase::Feedback {
            return;
        }
        let next = self.current_item_index + 1;
        if self.lives == 0 || next >= self.item_order.len() || self.time_remaining == 0 {
            self.countdown = None;
            self.scan_clear = None;
            self.is_scanning = false;
            self.phase = ScannerPhase::Results;
            debug!("scanner: session finished, score {}", self.score);
            return;
        }
        self.current_item_index = next;
        self.dial_readings = DialReadings::default();
        self.last_route = None;
        self.is_scanning = false;
        self.scan_clear = None;
        self.phase = ScannerPhase::Scanning;
    }

    /// Restore the initial state, dropping any running countdown.
    pub fn reset(&mut self) {
        self.clear();
    }

    // Derived projections

    pub fn correct_count(&self) -> u32 {
        self.results.iter().filter(|r| r.correct).count() as u32
    }

    /// Rounded percentage of correct routings, 0 if none yet.
    pub fn accuracy(&self) -> u32 {
        if self.results.is_empty() {
            return 0;
        }
        let ratio = f64::from(self.correct_count()) / self.results.len() as f64;
        (ratio * 100.0).round() as u32
    }

    /// Convert the session to a JSON snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        let results: Vec<serde_json::Value> = self.results.iter().map(|r| r.to_json()).collect();

        serde_json::json!({
            "phase": self.phase.as_str(),
            "score": self.score,
            "lives": self.lives,
            "max_lives": self.max_lives,
            "current_item_index": self.current_item_index,
            "total_items": self.total_items,
            "dial_readings": self.dial_readings.to_json(),
            "is_scanning": self.is_scanning,
            "last_route": self.last_route.map(|r| r.to_json()),
            "streak": self.streak,
            "longest_streak": self.longest_streak,
            "results": results,
            "time_limit": self.time_limit,
            "time_remaining": self.time_remaining,
            "accuracy": self.accuracy()
        })
    }
}
