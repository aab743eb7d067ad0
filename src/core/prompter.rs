use std::sync::{Arc, Mutex};

/// Confirmation and alert capability supplied by the presentation layer.
pub trait Prompter: Send {
    /// Synchronous yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;
    /// One-way message, used for validation failures.
    fn notify(&mut self, message: &str);
}

/// Prompter with a fixed answer that records everything it was asked.
///
/// Clones share the same transcript, so a test can keep a handle after
/// moving the prompter into a store.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answer: bool,
    transcript: Arc<Mutex<Transcript>>,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub prompts: Vec<String>,
    pub notifications: Vec<String>,
}

impl ScriptedPrompter {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            transcript: Arc::default(),
        }
    }

    pub fn set_answer(&mut self, answer: bool) {
        self.answer = answer;
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, prompt: &str) -> bool {
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.prompts.push(prompt.to_string());
        }
        self.answer
    }

    fn notify(&mut self, message: &str) {
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.notifications.push(message.to_string());
        }
    }
}
