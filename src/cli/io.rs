use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::{cli::output, core::Prompter};

/// Environment variable that answers confirmations in script mode.
pub const ASSUME_YES_ENV: &str = "LEDGER_TRACKER_ASSUME_YES";

/// Interactive prompter backed by `dialoguer`.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str) -> bool {
        match Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(err) => {
                output::error(format!("Confirmation failed: {err}"));
                false
            }
        }
    }

    fn notify(&mut self, message: &str) {
        output::warning(message);
    }
}

/// Non-interactive prompter for script mode: echoes prompts and answers them
/// from [`ASSUME_YES_ENV`].
pub struct ScriptPrompter {
    assume_yes: bool,
}

impl ScriptPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    pub fn from_env() -> Self {
        Self::new(assume_yes_from_env())
    }
}

impl Prompter for ScriptPrompter {
    fn confirm(&mut self, prompt: &str) -> bool {
        let answer = if self.assume_yes { "yes" } else { "no" };
        output::info(format!("{prompt} [{answer}]"));
        self.assume_yes
    }

    fn notify(&mut self, message: &str) {
        output::warning(message);
    }
}

fn assume_yes_from_env() -> bool {
    std::env::var(ASSUME_YES_ENV)
        .map(|value| parse_yes(&value))
        .unwrap_or(false)
}

pub(crate) fn parse_yes(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "true" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_values_are_recognised() {
        for value in ["1", "YES", " y ", "true", "on"] {
            assert!(parse_yes(value), "{value} should mean yes");
        }
        for value in ["", "0", "no", "nope"] {
            assert!(!parse_yes(value), "{value} should mean no");
        }
    }

    #[test]
    fn script_prompter_answers_configured_value() {
        assert!(ScriptPrompter::new(true).confirm("Proceed?"));
        assert!(!ScriptPrompter::new(false).confirm("Proceed?"));
    }
}
