//! Asking the user to pick between alternatives.
//!
//! Core operations that may need confirmation take a `&dyn Prompter` so that
//! tests can script the answers.

use inquire::{InquireError, Select, Text};

use crate::error::{ProfileError, Result};

pub trait Prompter {
    /// Present `options` and return the selected index, or `None` if the
    /// prompt was dismissed.
    fn choose(&self, prompt: &str, options: &[&str], default: usize) -> Result<Option<usize>>;

    /// Ask for a line of text, or `None` if the prompt was dismissed.
    fn input(&self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive prompts on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn choose(&self, prompt: &str, options: &[&str], default: usize) -> Result<Option<usize>> {
        let answer = Select::new(prompt, options.to_vec())
            .with_starting_cursor(default)
            .with_help_message("↑↓ to move, Enter to select, Esc to cancel")
            .prompt();

        match answer {
            Ok(selected) => Ok(options.iter().position(|o| *o == selected)),
            Err(e) => dismissed(e),
        }
    }

    fn input(&self, prompt: &str) -> Result<Option<String>> {
        match Text::new(prompt).prompt() {
            Ok(text) => Ok(Some(text)),
            Err(e) => dismissed(e),
        }
    }
}

fn dismissed<T>(e: InquireError) -> Result<Option<T>> {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => Ok(None),
        other => Err(ProfileError::Prompt(other.to_string())),
    }
}

/// Answers to a "name/path already taken" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    ProvideNew,
    Overwrite,
    Cancel,
}

impl Resolution {
    const OPTIONS: [(&'static str, Resolution); 3] = [
        ("Provide a new one", Resolution::ProvideNew),
        ("Overwrite the existing one", Resolution::Overwrite),
        ("Cancel", Resolution::Cancel),
    ];

    /// Ask how to resolve a conflict; dismissing the prompt cancels.
    pub fn ask(prompter: &dyn Prompter, prompt: &str) -> Result<Self> {
        let labels: Vec<&str> = Self::OPTIONS.iter().map(|(label, _)| *label).collect();
        let picked = prompter.choose(prompt, &labels, 2)?;
        Ok(picked
            .and_then(|i| Self::OPTIONS.get(i))
            .map(|(_, r)| *r)
            .unwrap_or(Resolution::Cancel))
    }
}

/// Yes/No question that defaults to No
pub fn confirm(prompter: &dyn Prompter, prompt: &str) -> Result<bool> {
    Ok(prompter.choose(prompt, &["Yes", "No"], 1)? == Some(0))
}
