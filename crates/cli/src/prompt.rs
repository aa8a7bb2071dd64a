//! Terminal prompts backed by dialoguer

use dialoguer::{Confirm, Input, Password};
use patcher_core::Prompter;
use patcher_domain::{PatcherError, Result};

/// Prompter reading answers from the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

fn prompt_error(err: dialoguer::Error) -> PatcherError {
    PatcherError::setup(format!("unable to read answer: {err}"))
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::new().with_prompt(message).default(default).interact().map_err(prompt_error)
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(message);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(prompt_error)
    }

    fn secret(&self, message: &str) -> Result<String> {
        Password::new().with_prompt(message).interact().map_err(prompt_error)
    }
}
