//! Home lab session - "run diagnostic tests on a sample, then identify it".
//!
//! Each sample gets a random sequence of three diagnostic tests drawn from
//! the catalog. The player performs every step of every test, reads the
//! collected observations, and names the material.
//!
//! # Phase Diagram
//!
//! ```text
//! ┌───────┐ start_game ┌─────────┐ all tests done ┌──────────┐
//! │ Intro │───────────▶│ Testing │───────────────▶│ Identify │
//! └───────┘            └─────────┘                └────┬─────┘
//!                           ▲                          │ identify_sample
//!                           │ next_sample         ┌────▼─────┐
//!                           └─────────────────────│ Feedback │
//!                                                 └────┬─────┘
//!                                                      │ next_sample
//!                                                      │ (no lives / no samples)
//!                                                 ┌────▼─────┐
//!                                                 │ Results  │
//!                                                 └──────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::catalog::{LabCatalog, PlasticSample, TestType, TESTS_PER_SAMPLE};

/// Points for a correct identification.
pub const IDENTIFY_POINTS: u32 = 20;

/// Lives at game start.
pub const STARTING_LIVES: u32 = 3;

/// Lab state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabPhase {
    #[default]
    Intro,
    Testing,
    Identify,
    Feedback,
    Results,
}

impl LabPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Testing => "testing",
            Self::Identify => "identify",
            Self::Feedback => "feedback",
            Self::Results => "results",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Results)
    }
}

/// Scoring configuration, defaulted from the module constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabRules {
    pub identify_points: u32,
    pub tests_per_sample: usize,
    pub starting_lives: u32,
}

impl Default for LabRules {
    fn default() -> Self {
        Self {
            identify_points: IDENTIFY_POINTS,
            tests_per_sample: TESTS_PER_SAMPLE,
            starting_lives: STARTING_LIVES,
        }
    }
}

/// Outcome record for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LabResult {
    pub sample_id: String,
    pub player_guess: String,
    pub correct_type: String,
    pub correct: bool,
    pub tests_completed: usize,
    /// Seconds since game start when the guess was made.
    pub time_spent: f64,
}

impl LabResult {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sample_id": self.sample_id,
            "player_guess": self.player_guess,
            "correct_type": self.correct_type,
            "correct": self.correct,
            "tests_completed": self.tests_completed,
            "time_spent": self.time_spent
        })
    }
}

/// Lab session state.
#[derive(Debug, Clone)]
pub struct LabSession {
    catalog: LabCatalog,
    rules: LabRules,
    rng: StdRng,
    /// Shuffled indices into the sample list; reshuffled each `start_game`.
    sample_order: Vec<usize>,

    pub phase: LabPhase,
    pub score: u32,
    pub lives: u32,
    pub max_lives: u32,

    pub current_sample_index: usize,
    pub total_samples: usize,
    pub current_test_index: usize,
    pub current_step_index: usize,
    pub test_sequence: Vec<TestType>,
    pub completed_tests: Vec<TestType>,
    /// Observation text collected per completed test.
    pub test_results: HashMap<TestType, String>,

    /// Progress of the current step, 0-100.
    pub step_progress: u8,
    pub is_performing_step: bool,
    pub last_step_success: bool,

    pub results: Vec<LabResult>,
    pub started_at: Option<DateTime<Utc>>,
}

impl LabSession {
    /// Create a session over a catalog with default rules.
    pub fn new(catalog: LabCatalog) -> Self {
        Self::build(catalog, LabRules::default(), StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a session with custom rules.
    pub fn with_rules(catalog: LabCatalog, rules: LabRules) -> Self {
        Self::build(catalog, rules, StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a session with a fixed RNG seed (deterministic draws).
    pub fn with_seed(catalog: LabCatalog, seed: u64) -> Self {
        Self::build(catalog, LabRules::default(), StdRng::seed_from_u64(seed))
    }

    fn build(catalog: LabCatalog, rules: LabRules, rng: StdRng) -> Self {
        Self {
            catalog,
            rules,
            rng,
            sample_order: Vec::new(),
            phase: LabPhase::Intro,
            score: 0,
            lives: rules.starting_lives,
            max_lives: rules.starting_lives,
            current_sample_index: 0,
            total_samples: 0,
            current_test_index: 0,
            current_step_index: 0,
            test_sequence: Vec::new(),
            completed_tests: Vec::new(),
            test_results: HashMap::new(),
            step_progress: 0,
            is_performing_step: false,
            last_step_success: false,
            results: Vec::new(),
            started_at: None,
        }
    }

    pub fn catalog(&self) -> &LabCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &LabRules {
        &self.rules
    }

    /// Shuffled play order, as indices into the sample list.
    pub fn sample_order(&self) -> &[usize] {
        &self.sample_order
    }

    /// The sample currently under the microscope.
    pub fn current_sample(&self) -> Option<&PlasticSample> {
        self.sample_order
            .get(self.current_sample_index)
            .and_then(|&i| self.catalog.samples().get(i))
    }

    fn clear(&mut self) {
        self.sample_order.clear();
        self.phase = LabPhase::Intro;
        self.score = 0;
        self.lives = self.rules.starting_lives;
        self.max_lives = self.rules.starting_lives;
        self.current_sample_index = 0;
        self.total_samples = 0;
        self.current_test_index = 0;
        self.current_step_index = 0;
        self.test_sequence.clear();
        self.completed_tests.clear();
        self.test_results.clear();
        self.step_progress = 0;
        self.is_performing_step = false;
        self.last_step_success = false;
        self.results.clear();
        self.started_at = None;
    }

    fn draw_test_sequence(&mut self) -> Vec<TestType> {
        let mut ids: Vec<TestType> = self.catalog.tests().iter().map(|t| t.id).collect();
        ids.shuffle(&mut self.rng);
        ids.truncate(self.rules.tests_per_sample);
        ids
    }

    fn elapsed_secs(&self) -> f64 {
        match self.started_at {
            Some(start) => ((Utc::now() - start).num_milliseconds() as f64 / 1000.0).max(0.0),
            None => 0.0,
        }
    }

    /// Start a new game: reshuffle the samples, draw a fresh test sequence.
    pub fn start_game(&mut self) {
        self.clear();
        let mut order: Vec<usize> = (0..self.catalog.sample_count()).collect();
        order.shuffle(&mut self.rng);
        self.sample_order = order;
        self.total_samples = self.sample_order.len();
        self.test_sequence = self.draw_test_sequence();
        self.phase = LabPhase::Testing;
        self.started_at = Some(Utc::now());
        debug!("lab: game started with {} samples", self.total_samples);
    }

    /// Begin the current step's interaction.
    pub fn perform_step(&mut self) {
        if self.phase != LabPhase::Testing {
            return;
        }
        self.is_performing_step = true;
        self.step_progress = 0;
    }

    /// Finish the current step and advance the step/test machinery.
    pub fn complete_step(&mut self, success: bool) {
        if self.phase != LabPhase::Testing {
            debug!("lab: complete_step ignored outside testing");
            return;
        }
        let test_id = match self.test_sequence.get(self.current_test_index) {
            Some(&id) => id,
            None => return,
        };
        let step_count = match self.catalog.test(test_id) {
            Some(test) => test.steps.len(),
            None => {
                debug!("lab: complete_step ignored, test {} missing", test_id.as_str());
                return;
            }
        };

        self.is_performing_step = false;
        self.last_step_success = success;

        if self.current_step_index + 1 < step_count {
            // Next step within the same test.
            self.current_step_index += 1;
            let ratio = self.current_step_index as f64 / step_count as f64;
            self.step_progress = (ratio * 100.0).round() as u8;
            return;
        }

        // Test complete - record the sample's canned observation.
        self.step_progress = 100;
        let observation = match self.current_sample() {
            Some(sample) => sample
                .test_results
                .get(&test_id)
                .cloned()
                .unwrap_or_else(|| "No result".to_string()),
            None => "No result".to_string(),
        };
        self.test_results.insert(test_id, observation);
        self.completed_tests.push(test_id);

        if self.current_test_index + 1 >= self.test_sequence.len() {
            // All tests done - time to identify.
            self.phase = LabPhase::Identify;
        } else {
            self.current_test_index += 1;
            self.current_step_index = 0;
        }
    }

    /// Set the hold-gesture progress directly, clamped to 100.
    pub fn update_hold_progress(&mut self, progress: u8) {
        self.step_progress = progress.min(100);
    }

    /// Name the sample's material.
    pub fn identify_sample(&mut self, guess: &str) {
        if self.phase != LabPhase::Identify {
            debug!("lab: identify ignored outside identify phase");
            return;
        }
        let (sample_id, correct_type) = match self.current_sample() {
            Some(sample) => (sample.id.clone(), sample.actual_type.clone()),
            None => {
                debug!("lab: identify ignored, no current sample");
                return;
            }
        };

        let correct = guess == correct_type;
        if correct {
            self.score += self.rules.identify_points;
        } else {
            self.lives = self.lives.saturating_sub(1);
        }

        self.results.push(LabResult {
            sample_id,
            player_guess: guess.to_string(),
            correct_type,
            correct,
            tests_completed: self.completed_tests.len(),
            time_spent: self.elapsed_secs(),
        });
        self.phase = LabPhase::Feedback;
    }

    /// Move on to the next sample, or to results when out of lives/samples.
    pub fn next_sample(&mut self) {
        if self.phase != LabPhase::Feedback {
            return;
        }
        let next = self.current_sample_index + 1;
        if self.lives == 0 || next >= self.sample_order.len() {
            self.phase = LabPhase::Results;
            debug!("lab: session finished, score {}", self.score);
            return;
        }
        self.current_sample_index = next;
        self.test_sequence = self.draw_test_sequence();
        self.current_test_index = 0;
        self.current_step_index = 0;
        self.completed_tests.clear();
        self.test_results.clear();
        self.step_progress = 0;
        self.is_performing_step = false;
        self.phase = LabPhase::Testing;
    }

    /// Restore the initial state.
    pub fn reset(&mut self) {
        self.clear();
    }

    // Derived projections

    pub fn correct_count(&self) -> u32 {
        self.results.iter().filter(|r| r.correct).count() as u32
    }

    /// Rounded percentage of correct identifications, 0 if none yet.
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
            "current_sample_index": self.current_sample_index,
            "total_samples": self.total_samples,
            "current_test_index": self.current_test_index,
            "current_step_index": self.current_step_index,
            "test_sequence": self.test_sequence,
            "completed_tests": self.completed_tests,
            "test_results": self.test_results,
            "step_progress": self.step_progress,
            "is_performing_step": self.is_performing_step,
            "last_step_success": self.last_step_success,
            "results": results,
            "accuracy": self.accuracy()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::catalog::{LabStep, LabTest, StepAction};

    fn make_test(id: TestType, step_count: usize) -> LabTest {
        let steps = (0..step_count)
            .map(|i| LabStep {
                id: format!("{}-{}", id.as_str(), i),
                action: StepAction::Tap,
                instruction: String::new(),
                duration_ms: None,
            })
            .collect();
        LabTest {
            id,
            name: id.as_str().to_string(),
            instruction: String::new(),
            description: String::new(),
            steps,
        }
    }

    fn make_sample(id: &str, actual: &str) -> PlasticSample {
        let mut results = HashMap::new();
        for test in [
            TestType::Float,
            TestType::Bend,
            TestType::Heat,
            TestType::Scratch,
            TestType::Transparency,
        ] {
            results.insert(test, format!("{} observation for {}", test.as_str(), id));
        }
        PlasticSample {
            id: id.to_string(),
            name: format!("Sample {}", id),
            actual_type: actual.to_string(),
            test_results: results,
            test_outcomes: HashMap::new(),
        }
    }

    fn make_catalog(sample_count: usize) -> LabCatalog {
        let types = ["PET", "HDPE", "PVC", "LDPE", "PP"];
        let samples = (0..sample_count)
            .map(|i| make_sample(&format!("s{}", i), types[i % types.len()]))
            .collect();
        LabCatalog::new(
            vec![
                make_test(TestType::Float, 2),
                make_test(TestType::Bend, 1),
                make_test(TestType::Heat, 3),
                make_test(TestType::Scratch, 1),
                make_test(TestType::Transparency, 2),
            ],
            samples,
        )
        .unwrap()
    }

    fn make_session(sample_count: usize) -> LabSession {
        let mut session = LabSession::with_seed(make_catalog(sample_count), 7);
        session.start_game();
        session
    }

    /// Perform and complete every step of every test in the sequence.
    fn run_all_tests(session: &mut LabSession) {
        for i in 0..session.test_sequence.len() {
            let test_id = session.test_sequence[i];
            let step_count = session.catalog().test(test_id).unwrap().steps.len();
            for _ in 0..step_count {
                session.perform_step();
                session.complete_step(true);
            }
        }
    }

    #[test]
    fn test_initial_state() {
        let session = LabSession::with_seed(make_catalog(3), 1);
        assert_eq!(session.phase, LabPhase::Intro);
        assert_eq!(session.lives, STARTING_LIVES);
        assert!(session.test_sequence.is_empty());
        assert_eq!(session.total_samples, 0);
    }

    #[test]
    fn test_start_game_draws_three_distinct_tests() {
        let session = make_session(3);
        assert_eq!(session.phase, LabPhase::Testing);
        assert_eq!(session.total_samples, 3);
        assert_eq!(session.test_sequence.len(), 3);

        let distinct: HashSet<TestType> = session.test_sequence.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
        assert!(session.current_sample().is_some());
    }

    #[test]
    fn test_step_progress_advances_within_test() {
        let mut session = make_session(3);
        let first_test = session.test_sequence[0];
        let step_count = session.catalog().test(first_test).unwrap().steps.len();

        session.perform_step();
        assert!(session.is_performing_step);
        assert_eq!(session.step_progress, 0);

        session.complete_step(true);
        assert!(!session.is_performing_step);
        assert!(session.last_step_success);
        if step_count > 1 {
            let expected = ((1.0 / step_count as f64) * 100.0).round() as u8;
            assert_eq!(session.step_progress, expected);
            assert_eq!(session.current_step_index, 1);
        } else {
            // Single-step test completes immediately.
            assert_eq!(session.step_progress, 100);
            assert_eq!(session.completed_tests, vec![first_test]);
        }
    }

    #[test]
    fn test_completing_all_tests_reaches_identify() {
        let mut session = make_session(3);
        run_all_tests(&mut session);

        assert_eq!(session.phase, LabPhase::Identify);
        assert_eq!(session.completed_tests.len(), 3);
        assert_eq!(session.test_results.len(), 3);
        for test_id in &session.completed_tests {
            assert!(session.test_results[test_id].contains(test_id.as_str()));
        }
    }

    #[test]
    fn test_identify_correct_scores() {
        let mut session = make_session(3);
        run_all_tests(&mut session);
        let actual = session.current_sample().unwrap().actual_type.clone();

        session.identify_sample(&actual);
        assert_eq!(session.phase, LabPhase::Feedback);
        assert_eq!(session.score, IDENTIFY_POINTS);
        assert_eq!(session.lives, 3);
        assert_eq!(session.results.len(), 1);
        assert!(session.results[0].correct);
        assert_eq!(session.results[0].tests_completed, 3);
        assert_eq!(session.accuracy(), 100);
    }

    #[test]
    fn test_identify_incorrect_costs_life() {
        let mut session = make_session(3);
        run_all_tests(&mut session);

        session.identify_sample("NOT-A-PLASTIC");
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, 2);
        assert!(!session.results[0].correct);
        assert_eq!(session.accuracy(), 0);
    }

    #[test]
    fn test_identify_outside_phase_noop() {
        let mut session = make_session(3);
        assert_eq!(session.phase, LabPhase::Testing);
        session.identify_sample("PET");
        assert!(session.results.is_empty());
        assert_eq!(session.phase, LabPhase::Testing);
    }

    #[test]
    fn test_complete_step_outside_phase_noop() {
        let mut session = LabSession::with_seed(make_catalog(3), 2);
        session.complete_step(true);
        assert_eq!(session.phase, LabPhase::Intro);
        assert!(session.completed_tests.is_empty());
    }

    #[test]
    fn test_next_sample_advances_with_fresh_sequence() {
        let mut session = make_session(3);
        run_all_tests(&mut session);
        let actual = session.current_sample().unwrap().actual_type.clone();
        session.identify_sample(&actual);

        session.next_sample();
        assert_eq!(session.phase, LabPhase::Testing);
        assert_eq!(session.current_sample_index, 1);
        assert_eq!(session.current_test_index, 0);
        assert_eq!(session.current_step_index, 0);
        assert_eq!(session.test_sequence.len(), 3);
        assert!(session.completed_tests.is_empty());
        assert!(session.test_results.is_empty());
        assert_eq!(session.step_progress, 0);
    }

    #[test]
    fn test_results_after_all_samples() {
        let mut session = make_session(2);
        for _ in 0..2 {
            run_all_tests(&mut session);
            let actual = session.current_sample().unwrap().actual_type.clone();
            session.identify_sample(&actual);
            session.next_sample();
        }
        assert_eq!(session.phase, LabPhase::Results);
        assert_eq!(session.results.len(), 2);
        assert_eq!(session.score, 2 * IDENTIFY_POINTS);
    }

    #[test]
    fn test_results_when_lives_exhausted() {
        let mut session = make_session(5);
        for _ in 0..3 {
            run_all_tests(&mut session);
            session.identify_sample("NOT-A-PLASTIC");
            session.next_sample();
        }
        // Three misses with five samples: lives ran out first.
        assert_eq!(session.lives, 0);
        assert_eq!(session.phase, LabPhase::Results);
        assert_eq!(session.results.len(), 3);
    }

    #[test]
    fn test_update_hold_progress_clamps() {
        let mut session = make_session(3);
        session.update_hold_progress(42);
        assert_eq!(session.step_progress, 42);
        session.update_hold_progress(250);
        assert_eq!(session.step_progress, 100);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut session = make_session(3);
        run_all_tests(&mut session);
        session.identify_sample("PET");
        session.reset();

        let fresh = LabSession::with_seed(make_catalog(3), 99);
        assert_eq!(session.to_json(), fresh.to_json());
        assert!(session.sample_order().is_empty());
    }
}
