//! Test helpers shared across rse config crates.

pub mod detector;
pub mod project;
pub mod prompt;

pub use detector::FixedDetector;
pub use project::TempProject;
pub use prompt::ScriptedPrompt;
