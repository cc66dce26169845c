use anyhow::{Context, Result};
use clap::Parser;

use responsive_states::{
    Config,
    core::{
        ExitCode,
        definitions::StateDefinition,
        runner::{SimulationConfig, SimulationRunner},
        state::DEFAULT_QUERY,
    },
    logging::{init_logging, parse_early_log_config},
    models::{Args, Commands, OutputFormat, QueryArgs, SimulateArgs, StatesArgs},
    parsed_property::ParsedProperty,
    viewport::{MediaQueryList, Viewport},
};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Logging starts before clap so config resolution can already log
    let raw_args: Vec<String> = std::env::args().collect();
    let _log_guard = init_logging(parse_early_log_config(&raw_args));

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code.into(),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::GeneralError.into()
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    if args.create_config {
        let path = Config::create_sample_config()?;
        println!("Sample config at: {}", path.display());
        return Ok(ExitCode::Success);
    }

    match args
        .command
        .unwrap_or_else(|| Commands::Simulate(SimulateArgs::default()))
    {
        Commands::Simulate(simulate_args) => simulate(simulate_args).await,
        Commands::Query(query_args) => query(query_args),
        Commands::States(states_args) => states(states_args),
    }
}

async fn simulate(args: SimulateArgs) -> Result<ExitCode> {
    let config = Config::resolve(Config::from_simulate_args(&args))?;
    let definitions = config.load_definitions()?;

    let height = config.initial_height();
    let steps = args
        .widths
        .iter()
        .map(|step| Viewport::new(step.width, step.height.unwrap_or(height)))
        .collect();

    let mut runner = SimulationRunner::new(SimulationConfig {
        definitions,
        rules: args.require_options,
        initial: Viewport::new(config.initial_width(), height),
        steps,
        resize_debounce: config.resize_debounce(),
        output_format: args.output,
        quiet: args.quiet,
    });

    let result = runner.run().await;
    if let Some(message) = &result.message {
        eprintln!("{}", message);
    }
    Ok(result.exit_code)
}

fn query(args: QueryArgs) -> Result<ExitCode> {
    let config = Config::resolve(Config::empty())?;
    let viewport = Viewport::new(
        args.width.unwrap_or_else(|| config.initial_width()),
        args.height.unwrap_or_else(|| config.initial_height()),
    );

    let parsed = MediaQueryList::parse(&args.query)
        .with_context(|| format!("Invalid media query '{}'", args.query))?;
    let verdict = if parsed.matches(viewport) {
        "matches"
    } else {
        "does not match"
    };
    println!("{} {} at {}", args.query, verdict, viewport);
    Ok(ExitCode::Success)
}

fn states(args: StatesArgs) -> Result<ExitCode> {
    let cli = Config {
        states_file: args
            .states
            .map(|path| ParsedProperty::Cli(path.clone(), path)),
        ..Config::empty()
    };
    let definitions = Config::resolve(cli)?.load_definitions()?;

    match args.output {
        OutputFormat::Text => print_definitions(&definitions),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&definitions)?),
        OutputFormat::Ndjson => {
            for definition in &definitions {
                println!("{}", serde_json::to_string(definition)?);
            }
        }
    }

    if definitions.is_empty() {
        return Ok(ExitCode::NoStates);
    }
    Ok(ExitCode::Success)
}

fn print_definitions(definitions: &[StateDefinition]) {
    for definition in definitions {
        let id = definition.id.as_deref().unwrap_or("(generated)");
        let query = definition
            .resolved_query()
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());
        if definition.extra.is_empty() {
            println!("{:<12} {}", id, query);
        } else {
            let options = serde_json::Value::Object(definition.extra.clone());
            println!("{:<12} {}  {}", id, query, options);
        }
    }
}
