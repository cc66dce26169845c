use crate::core::runner::OptionRule;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fmt;
use std::str::FromStr;

/// Version shown by `--version`, including the commit it was built from.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser, Clone, Debug)]
#[command(name = "responsive-states")]
#[command(version = LONG_VERSION)]
#[command(about = "Track which responsive breakpoint states are active as a viewport changes")]
#[command(
    long_about = "Simulates a viewport and reports which breakpoint states enter, leave and \
receive resize notifications as it is resized.\n\nStates come from a TOML or JSON definitions \
file, or default to the xs/sm/md/lg breakpoints."
)]
#[command(after_help = "EXAMPLES:
    Walk the default breakpoints:
        responsive-states simulate --widths 320,800,1024,1400

    Use a definitions file and stream events as NDJSON:
        responsive-states simulate --states states.toml --widths 500,1300 --output ndjson

    Reject states whose colorbox option is false:
        responsive-states simulate --require-option colorbox=once

    Evaluate a media query:
        responsive-states query \"screen and (min-width: 768px)\" --width 800

    Create a sample configuration file:
        responsive-states --create-config")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Create a sample configuration file and exit
    #[arg(long)]
    pub create_config: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Logging flags. They are also read before clap runs, see
/// [`parse_early_log_config`](crate::logging::parse_early_log_config).
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct LogArgs {
    /// Log level: trace, debug, info, warn, error [env: RESPONSIVE_STATES_LOG_LEVEL]
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr [env: RESPONSIVE_STATES_LOG_FILE]
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_file: Option<String>,

    /// Log format: text, json [env: RESPONSIVE_STATES_LOG_FORMAT]
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Resize a simulated viewport and report state lifecycle events
    Simulate(SimulateArgs),
    /// Evaluate a media query against a viewport size
    Query(QueryArgs),
    /// List the state definitions that would be loaded
    States(StatesArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct SimulateArgs {
    /// State definitions file (.toml or .json)
    #[arg(short, long, help_heading = "States")]
    pub states: Option<String>,

    /// Config option to enforce as NAME[=PHASE]; PHASE is once, match or resize [default phase: resize]
    #[arg(long = "require-option", value_name = "NAME[=PHASE]", help_heading = "States")]
    pub require_options: Vec<OptionRule>,

    /// Viewport sizes to resize to, as WIDTH or WIDTHxHEIGHT
    #[arg(
        short,
        long,
        value_delimiter = ',',
        value_name = "SIZES",
        help_heading = "Viewport"
    )]
    pub widths: Vec<ViewportStep>,

    /// Initial viewport width [default: 1280]
    #[arg(long, help_heading = "Viewport")]
    pub initial_width: Option<u32>,

    /// Viewport height for the initial size and steps without one [default: 800]
    #[arg(long, help_heading = "Viewport")]
    pub height: Option<u32>,

    /// Resize debounce window in milliseconds [default: 25]
    #[arg(long, help_heading = "Viewport")]
    pub debounce_ms: Option<u64>,

    /// Output format: text, json, ndjson
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help_heading = "Output Options")]
    pub output: OutputFormat,

    /// Hide resize notifications in text output
    #[arg(short, long, help_heading = "Output Options")]
    pub quiet: bool,
}

/// Arguments for the `query` subcommand.
#[derive(ClapArgs, Clone, Debug)]
pub struct QueryArgs {
    /// The media query, e.g. "(min-width: 768px) and (max-width: 991px)"
    pub query: String,

    /// Viewport width [default: configured initial width]
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height [default: configured initial height]
    #[arg(long)]
    pub height: Option<u32>,
}

/// Arguments for the `states` subcommand.
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct StatesArgs {
    /// State definitions file (.toml or .json)
    #[arg(short, long)]
    pub states: Option<String>,

    /// Output format: text, json, ndjson
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// One resize step given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportStep {
    pub width: u32,
    /// Falls back to the run's height when absent.
    pub height: Option<u32>,
}

impl FromStr for ViewportStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str, what: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid {} '{}' in '{}'", what, part.trim(), s))
        };
        match s.split_once(['x', 'X']) {
            Some((width, height)) => Ok(Self {
                width: parse(width, "width")?,
                height: Some(parse(height, "height")?),
            }),
            None => Ok(Self {
                width: parse(s, "width")?,
                height: None,
            }),
        }
    }
}

impl fmt::Display for ViewportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.height {
            Some(height) => write!(f, "{}x{}", self.width, height),
            None => write!(f, "{}", self.width),
        }
    }
}

/// Output format for simulation results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON summary at the end.
    Json,
    /// Newline-delimited JSON (one event per line).
    Ndjson,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_option::Phase;

    /// # Simulate Arguments
    ///
    /// ## Test Scenario
    /// - Parses a full `simulate` command line
    ///
    /// ## Expected Outcome
    /// - Comma separated steps, repeated options and global log flags all land
    #[test]
    fn test_parse_simulate_args() {
        let args = Args::try_parse_from([
            "responsive-states",
            "simulate",
            "--states",
            "states.toml",
            "--widths",
            "320,800x600,1400",
            "--require-option",
            "colorbox=once",
            "--require-option",
            "lazy",
            "--debounce-ms",
            "40",
            "--output",
            "ndjson",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.log.log_level.as_deref(), Some("debug"));
        let Some(Commands::Simulate(simulate)) = args.command else {
            panic!("expected simulate subcommand");
        };
        assert_eq!(simulate.states.as_deref(), Some("states.toml"));
        assert_eq!(
            simulate.widths,
            vec![
                ViewportStep {
                    width: 320,
                    height: None
                },
                ViewportStep {
                    width: 800,
                    height: Some(600)
                },
                ViewportStep {
                    width: 1400,
                    height: None
                },
            ]
        );
        assert_eq!(
            simulate.require_options,
            vec![
                OptionRule::new("colorbox", Phase::Once),
                OptionRule::new("lazy", Phase::Resize),
            ]
        );
        assert_eq!(simulate.debounce_ms, Some(40));
        assert_eq!(simulate.output, OutputFormat::Ndjson);
        assert!(!simulate.quiet);
    }

    #[test]
    fn test_parse_rejects_bad_steps_and_phases() {
        assert!(
            Args::try_parse_from(["responsive-states", "simulate", "--widths", "wide"]).is_err()
        );
        assert!(
            Args::try_parse_from([
                "responsive-states",
                "simulate",
                "--require-option",
                "colorbox=never"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_parse_query_and_create_config() {
        let args = Args::try_parse_from([
            "responsive-states",
            "query",
            "(min-width: 768px)",
            "--width",
            "800",
        ])
        .unwrap();
        let Some(Commands::Query(query)) = args.command else {
            panic!("expected query subcommand");
        };
        assert_eq!(query.query, "(min-width: 768px)");
        assert_eq!(query.width, Some(800));
        assert_eq!(query.height, None);

        let args = Args::try_parse_from(["responsive-states", "--create-config"]).unwrap();
        assert!(args.create_config);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_viewport_step_display() {
        let step: ViewportStep = "1024X768".parse().unwrap();
        assert_eq!(step.to_string(), "1024x768");
        assert_eq!("640".parse::<ViewportStep>().unwrap().to_string(), "640");
        assert!("x768".parse::<ViewportStep>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Ndjson.to_string(), "ndjson");
    }
}
