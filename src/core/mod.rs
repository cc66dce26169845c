//! Core module for responsive state tracking.
//!
//! This module provides:
//!
//! - The state manager and the states it tracks
//! - Config options that gate state lifecycle phases
//! - The media query and resize traits hosts implement
//! - Loading state definitions from files
//! - The simulation runner and its output formatting

pub mod config_option;
pub mod definitions;
pub mod media;
pub mod output;
pub mod runner;
pub mod state;

/// Exit codes for the simulation CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// The simulation ran to completion.
    Success = 0,

    /// General error (configuration, definitions file, output, etc.).
    GeneralError = 1,

    /// No state was left to track.
    NoStates = 2,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable description of the exit code.
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Simulation completed successfully",
            ExitCode::GeneralError => "General error occurred",
            ExitCode::NoStates => "No states to track",
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Exit Code Values
    ///
    /// Verifies that all exit codes have the correct numeric values.
    ///
    /// ## Expected Outcome
    /// - All exit codes map to their documented numeric values
    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::GeneralError.code(), 1);
        assert_eq!(ExitCode::NoStates.code(), 2);
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(
            format!("{}", ExitCode::NoStates),
            ExitCode::NoStates.description()
        );
        let _: std::process::ExitCode = ExitCode::GeneralError.into();
    }
}
