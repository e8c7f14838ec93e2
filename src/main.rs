//! Stepwise CLI Entry Point
//!
//! A small front end that collects a JSON object over several invocations.
//! Each invocation runs one stage, which merges the object given on the
//! command line into the fields gathered so far. The last stage prints the
//! merged object and the next invocation starts over.
//!
//! # Usage
//!
//! ```bash
//! # Two-stage run (the default)
//! stepwise '{"name": "Peter"}'
//! stepwise '{"surname": "Parker"}'
//!
//! # Custom state file and stage count
//! stepwise --state runs/signup.yaml --stages 3 '{"email": "p@example.com"}'
//!
//! # Inspect or abandon the run in progress
//! stepwise --status
//! stepwise --reset
//! ```

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{debug, info};
use serde_json::{Map, Value};

use stepwise::error::report;
use stepwise::execution::{Orchestrator, Progress};
use stepwise::workflow::{FileStore, Stage, StageContext, StageError, StageResult};
use stepwise::{APP_NAME, VERSION};

/// Default state file used when none is specified.
const DEFAULT_STATE_PATH: &str = ".stepwise/workflow.json";

/// Default number of stages in a run.
const DEFAULT_STAGES: usize = 2;

/// What the invocation should do.
#[derive(Debug, PartialEq)]
enum Action {
    Advance,
    Status,
    Reset,
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    state_path: PathBuf,
    stages: usize,
    input: Option<String>,
    action: Action,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            stages: DEFAULT_STAGES,
            input: None,
            action: Action::Advance,
            verbose: false,
        }
    }
}

/// Merges the invocation's JSON object into the fields collected so far.
struct CollectFields {
    input: Map<String, Value>,
}

impl Stage for CollectFields {
    type Output = Map<String, Value>;

    fn run(
        &self,
        ctx: &StageContext,
        previous: Option<&StageResult>,
    ) -> Result<Self::Output, StageError> {
        ctx.check()?;

        let mut fields: Map<String, Value> = match previous {
            Some(result) => result.decode()?,
            None => Map::new(),
        };
        fields.extend(self.input.clone());
        Ok(fields)
    }

    fn name(&self) -> &str {
        "collect-fields"
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: stepwise [OPTIONS] [JSON_OBJECT]");
    println!();
    println!("Arguments:");
    println!("  [JSON_OBJECT]       Fields to merge in this stage (default: {{}})");
    println!();
    println!("Options:");
    println!("  --state PATH        State file, .json or .yaml (default: {})", DEFAULT_STATE_PATH);
    println!("  --stages N          Stages per run (default: {})", DEFAULT_STAGES);
    println!("  --status            Show progress without running a stage");
    println!("  --reset             Abandon the run in progress");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  stepwise '{{\"name\": \"Peter\"}}'");
    println!("  stepwise '{{\"surname\": \"Parker\"}}'");
    println!("  stepwise --state runs/signup.yaml --stages 3 '{{\"email\": \"p@example.com\"}}'");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--status" => config.action = Action::Status,
            "--reset" => config.action = Action::Reset,
            "--verbose" | "-v" => config.verbose = true,
            "--state" => {
                i += 1;
                if i >= args.len() {
                    return Err("--state requires a path argument".to_string());
                }
                config.state_path = PathBuf::from(&args[i]);
            }
            "--stages" => {
                i += 1;
                if i >= args.len() {
                    return Err("--stages requires a number argument".to_string());
                }
                config.stages = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid stage count: {}", args[i]))?;
                if config.stages == 0 {
                    return Err("--stages must be at least 1".to_string());
                }
            }
            arg if arg.starts_with("--") => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.input.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.input = Some(arg.clone());
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Parses the positional input as a JSON object.
fn parse_input(input: Option<&str>) -> Result<Map<String, Value>, String> {
    let Some(text) = input else {
        return Ok(Map::new());
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err("Input must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON input: {}", e)),
    }
}

/// Refuses a state file written with more stages than this invocation has.
///
/// The stage count comes from the command line, so it can disagree with a
/// persisted index; the library treats that as corruption and panics.
fn check_stage_count(progress: &Progress) -> Result<(), String> {
    if progress.current_stage < progress.total_stages {
        return Ok(());
    }
    Err(format!(
        "State file is at stage {} but --stages is {}; pass the --stages value the run was started with (at least {}), or --reset to start over",
        progress.current_stage + 1,
        progress.total_stages,
        progress.current_stage + 1
    ))
}

/// Performs the configured action and returns the text to print.
fn execute(config: &Config) -> Result<String, Box<dyn Error>> {
    let input = parse_input(config.input.as_deref())?;

    let mut builder = Orchestrator::builder(FileStore::new(&config.state_path));
    for _ in 0..config.stages {
        builder = builder.stage(CollectFields {
            input: input.clone(),
        });
    }
    let workflow = builder.build()?;

    match config.action {
        Action::Status => {
            let progress = workflow.status()?;
            check_stage_count(&progress)?;
            Ok(format!(
                "Stage {} of {} pending{}",
                progress.current_stage + 1,
                progress.total_stages,
                if progress.is_fresh() { " (new run)" } else { "" }
            ))
        }
        Action::Reset => {
            workflow.reset()?;
            Ok("Workflow reset".to_string())
        }
        Action::Advance => {
            // Separate read from the one inside advance; only used to reject
            // a mismatched stage count, never to describe what ran.
            check_stage_count(&workflow.status()?)?;

            match workflow.advance(&StageContext::new())? {
                Some(result) => {
                    info!("Workflow complete");
                    let fields: Value = result.decode()?;
                    Ok(serde_json::to_string_pretty(&fields)?)
                }
                None => Ok(format!(
                    "Stage recorded ({} per run), run again to continue",
                    workflow.stage_count()
                )),
            }
        }
    }
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);
    debug!("{} v{} using {}", APP_NAME, VERSION, config.state_path.display());

    println!("{}", execute(&config)?);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", report(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}
