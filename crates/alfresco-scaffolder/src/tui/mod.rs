//! Interactive output using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

use crate::context::Output;
use crate::registry::ModuleRecord;
use crate::ProjectConfig;
use std::io;

/// `Output` rendered as cliclack log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct ClackOutput;

impl Output for ClackOutput {
    fn info(&self, message: &str) {
        let _ = cliclack::log::info(message);
    }

    fn warn(&self, message: &str) {
        let _ = cliclack::log::warning(message);
    }
}

/// Ask a yes/no question; `assume_yes` skips the prompt (non-interactive mode)
pub fn confirm(message: &str, assume_yes: bool) -> io::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    cliclack::confirm(message).initial_value(false).interact()
}

/// Print the registry as a cliclack note
pub fn show_modules(config: &ProjectConfig, modules: &[ModuleRecord]) -> io::Result<()> {
    if modules.is_empty() {
        return cliclack::log::info("No modules registered");
    }
    let lines: Vec<String> = modules
        .iter()
        .map(|module| module.colored_name(config))
        .collect();
    cliclack::note("Registered modules", lines.join("\n"))
}
