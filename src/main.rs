//! tooling-link CLI
//!
//! Entry point for the `tooling-link` command-line tool. Requests are served
//! by the in-process provider.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tooling_link::{
    interrupt, CancelTimer, CancellationSignal, ClientConfig, ExitKind, InterruptState, LinkConfig, LoadedConfig,
    ModelError, ProviderConnection, TimeoutConfig,
};
use tooling_protocol::{BuildParameters, ModelIdentifier};
use tooling_provider::ModelRequestDispatcher;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tooling-link")]
#[command(about = "Cancellable model requests against a build provider", version)]
struct Cli {
    /// Path to config file (default: .tooling/link.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the provider descriptor and the negotiated protocol version
    Describe,

    /// List the models the provider can build
    Models {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Request a model
    Get {
        /// Fully qualified model name
        model: String,

        /// Build argument, passed verbatim (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Named option as KEY=VALUE; VALUE is parsed as JSON, else a string (repeatable)
        #[arg(long = "option", value_parser = parse_option)]
        options: Vec<(String, Value)>,

        /// Cancel the request after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output compact JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loaded = match LinkConfig::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(ExitKind::BuildFailed.code());
        }
    };
    debug!(path = ?loaded.source.path, digest = ?loaded.source.digest, "loaded configuration");

    let exit = match cli.command {
        Commands::Describe => run_describe(&loaded),
        Commands::Models { json } => run_models(&loaded, json),
        Commands::Get {
            model,
            args,
            options,
            timeout,
            json,
        } => run_get(&loaded, model, args, options, timeout, json),
    };
    process::exit(exit.code());
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty option name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn connect(loaded: &LoadedConfig) -> ProviderConnection {
    let dispatcher = Arc::new(ModelRequestDispatcher::with_builtin(&loaded.config.provider));
    let descriptor = dispatcher.descriptor().clone();

    match ProviderConnection::connect(dispatcher, descriptor, &loaded.config.client) {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("Incompatible provider: {}", e);
            process::exit(ExitKind::IllegalState.code());
        }
    }
}

fn run_describe(loaded: &LoadedConfig) -> ExitKind {
    let connection = connect(loaded);
    let output = json!({
        "descriptor": connection.descriptor(),
        "protocol_version": connection.protocol_version(),
        "config": loaded.source,
    });
    print_json(&output, false);
    ExitKind::Success
}

fn run_models(loaded: &LoadedConfig, json: bool) -> ExitKind {
    let registry = tooling_provider::ProducerRegistry::builtin(&loaded.config.provider);
    let models = registry.model_names();

    if json {
        print_json(&json!({ "models": models }), true);
    } else if models.is_empty() {
        println!("No models available.");
    } else {
        for model in models {
            println!("{}", model);
        }
    }
    ExitKind::Success
}

fn run_get(
    loaded: &LoadedConfig,
    model: String,
    args: Vec<String>,
    options: Vec<(String, Value)>,
    timeout: Option<u64>,
    json: bool,
) -> ExitKind {
    let connection = connect(loaded);

    let timeout = match effective_timeout(&loaded.config.client, timeout) {
        Ok(timeout) => timeout,
        Err(e) => {
            eprintln!("Invalid timeout: {}", e);
            process::exit(ExitKind::BuildFailed.code());
        }
    };

    let mut parameters = BuildParameters::new();
    for arg in args {
        parameters = parameters.with_argument(arg);
    }
    for (key, value) in options {
        parameters = parameters.with_option(key, value);
    }

    let signal = Arc::new(CancellationSignal::new());

    let interrupts = Arc::new(InterruptState::new());
    interrupts.attach(Arc::clone(&signal));
    if let Err(e) = interrupt::install(Arc::clone(&interrupts)) {
        warn!(error = %e, "failed to install interrupt handler");
    }

    let timer = timeout.map(|t| CancelTimer::start(Arc::clone(&signal), t));

    let result = connection.get_model(ModelIdentifier::new(model), &signal, parameters);

    interrupts.detach();
    if let Some(timer) = timer {
        if timer.disarm() {
            debug!("request was cancelled by timeout");
        }
    }

    match result {
        Ok(value) => {
            print_json(&value, !json);
            ExitKind::Success
        }
        Err(e) => report_error(&e),
    }
}

fn effective_timeout(client: &ClientConfig, flag: Option<u64>) -> Result<Option<Duration>, tooling_link::TimeoutValidationError> {
    let seconds = flag.or(client.timeout_seconds);
    match seconds {
        Some(overall_seconds) => {
            let config = TimeoutConfig { overall_seconds };
            config.validate()?;
            Ok(Some(config.duration()))
        }
        None => Ok(None),
    }
}

fn report_error(error: &ModelError) -> ExitKind {
    eprintln!("Error: {}", error);
    if let ModelError::BuildFailed(failure) | ModelError::Cancelled(failure) = error {
        for cause in &failure.causes {
            eprintln!("  caused by: {}", cause);
        }
    }
    error.exit_kind()
}

fn print_json(value: &Value, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(ExitKind::BuildFailed.code());
        }
    }
}
