use parking_lot::Mutex;
use rse_config::{Encoding, EncodingPrompt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Encoding prompt with a fixed answer that records every project it was asked about.
pub struct ScriptedPrompt {
    answer: Option<Encoding>,
    asked: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedPrompt {
    pub fn new(answer: Option<Encoding>) -> (Self, Arc<Mutex<Vec<PathBuf>>>) {
        let asked = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                answer,
                asked: asked.clone(),
            },
            asked,
        )
    }
}

impl EncodingPrompt for ScriptedPrompt {
    fn choose_encoding(&self, project_root: &Path) -> Option<Encoding> {
        self.asked.lock().push(project_root.to_path_buf());
        self.answer
    }
}
