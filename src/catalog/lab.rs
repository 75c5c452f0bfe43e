//! Diagnostic test and plastic sample reference data for the home lab game.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// How many tests a sample's test sequence draws (without replacement).
pub const TESTS_PER_SAMPLE: usize = 3;

/// The fixed set of diagnostic tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Float,
    Bend,
    Heat,
    Scratch,
    Transparency,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Bend => "bend",
            Self::Heat => "heat",
            Self::Scratch => "scratch",
            Self::Transparency => "transparency",
        }
    }
}

/// Player gesture a lab step asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepAction {
    Tap,
    SwipeDown,
    SwipeRight,
    Hold,
    Drag,
}

/// One mini-action within a diagnostic test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabStep {
    pub id: String,
    pub action: StepAction,
    #[serde(default)]
    pub instruction: String,
    /// Hold duration in milliseconds, for `Hold` steps.
    #[serde(rename = "duration")]
    pub duration_ms: Option<u64>,
}

/// A diagnostic test and its ordered step sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: TestType,
    pub name: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<LabStep>,
}

/// A sample under the lab's microscope, with canned per-test observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasticSample {
    pub id: String,
    pub name: String,
    /// True material code ("PET", "HDPE", ...).
    pub actual_type: String,
    /// Observation text recorded when a test completes.
    pub test_results: HashMap<TestType, String>,
    /// Observable effect shown while a test runs.
    #[serde(default)]
    pub test_outcomes: HashMap<TestType, String>,
}

/// Test and sample catalog for the lab game.
#[derive(Debug, Clone)]
pub struct LabCatalog {
    tests: Vec<LabTest>,
    samples: Vec<PlasticSample>,
    sample_index: HashMap<String, usize>,
}

impl LabCatalog {
    pub fn new(tests: Vec<LabTest>, samples: Vec<PlasticSample>) -> Result<Self, CatalogError> {
        if tests.len() < TESTS_PER_SAMPLE {
            return Err(CatalogError::NotEnoughTests { have: tests.len() });
        }

        let mut seen = HashSet::new();
        for test in &tests {
            if !seen.insert(test.id) {
                return Err(CatalogError::DuplicateTest(test.id));
            }
            if test.steps.is_empty() {
                return Err(CatalogError::EmptySteps(test.id));
            }
        }

        let mut sample_index = HashMap::new();
        for (i, sample) in samples.iter().enumerate() {
            if sample_index.insert(sample.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateSample(sample.id.clone()));
            }
        }

        Ok(Self {
            tests,
            samples,
            sample_index,
        })
    }

    /// Parse from two JSON arrays (tests, samples).
    pub fn from_json(tests_json: &str, samples_json: &str) -> Result<Self, CatalogError> {
        let tests: Vec<LabTest> = serde_json::from_str(tests_json)?;
        let samples: Vec<PlasticSample> = serde_json::from_str(samples_json)?;
        Self::new(tests, samples)
    }

    /// Get a test by type.
    pub fn test(&self, id: TestType) -> Option<&LabTest> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Get a sample by id.
    pub fn sample(&self, id: &str) -> Option<&PlasticSample> {
        self.sample_index.get(id).map(|&i| &self.samples[i])
    }

    /// All tests in catalog order.
    pub fn tests(&self) -> &[LabTest] {
        &self.tests
    }

    /// All samples in catalog order.
    pub fn samples(&self) -> &[PlasticSample] {
        &self.samples
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
