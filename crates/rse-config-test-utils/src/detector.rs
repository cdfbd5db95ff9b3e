use rse_config::ProjectDetector;
use serde_json::Value;
use std::path::Path;

/// Detector that reports the same facts for every project.
#[derive(Clone, Debug)]
pub struct FixedDetector {
    facts: Value,
}

impl FixedDetector {
    pub fn new(facts: Value) -> Self {
        Self { facts }
    }
}

impl ProjectDetector for FixedDetector {
    fn detect(&self, _project_root: &Path) -> Value {
        self.facts.clone()
    }
}
