// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! bramble CLI - run CommonJS module trees

use bramble_runtime::{Runtime, RuntimeConfig, VERSION};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bramble",
    about = "CommonJS module loader and runner",
    author = "Pegasus Heavy Industries",
    disable_version_flag = true
)]
struct Cli {
    /// Entry module to run (resolved like `require` from the working directory)
    script: Option<String>,

    /// Evaluate script from command line
    #[arg(short = 'e', long = "eval", conflicts_with = "script")]
    eval: Option<String>,

    /// Compile the entry module into a snapshot at this path instead of running it
    #[arg(long, value_name = "OUT", requires = "script")]
    snapshot: Option<PathBuf>,

    /// Load runtime configuration from a JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Normalize every candidate path and reject ones escaping the root
    #[arg(long)]
    strict_paths: bool,

    /// Log how long each module load takes
    #[arg(long)]
    load_stats: bool,

    /// Print version and exit
    #[arg(short = 'v', long = "version")]
    show_version: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Arguments passed to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// What the CLI was asked to do
enum Task {
    Run(String),
    Eval(String),
    Snapshot { entry: String, out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "bramble_runtime=debug"
    } else {
        "bramble_runtime=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Handle version flag
    if cli.show_version {
        println!("bramble v{}", VERSION);
        return Ok(());
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    let task = if let Some(code) = cli.eval {
        Task::Eval(code)
    } else if let Some(entry) = cli.script {
        match cli.snapshot {
            Some(out) => Task::Snapshot { entry, out },
            None => Task::Run(entry),
        }
    } else if atty::is(atty::Stream::Stdin) {
        eprintln!("{}: no entry module given (try --help)", "Error".red().bold());
        std::process::exit(2);
    } else {
        // Read from stdin
        let mut code = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut tokio::io::stdin(), &mut code).await?;
        Task::Eval(code)
    };

    // Module loading is synchronous; keep it off the async workers
    match tokio::task::spawn_blocking(move || execute(config, task)).await? {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(e) => fail(e),
    }

    Ok(())
}

/// Flags first, then the config file, then the process environment.
fn build_config(cli: &Cli) -> anyhow::Result<RuntimeConfig> {
    let mut argv = vec!["bramble".to_string()];
    argv.extend(cli.script.iter().cloned());
    argv.extend(cli.args.iter().cloned());

    let flags = RuntimeConfig {
        strict_paths: cli.strict_paths,
        load_stats: cli.load_stats,
        argv,
        ..Default::default()
    };

    let file = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };

    Ok(flags.or(file).or(RuntimeConfig::from_env()))
}

/// Runs the task and renders whatever should be printed.
fn execute(config: RuntimeConfig, task: Task) -> anyhow::Result<Option<String>> {
    let mut runtime = Runtime::new(config);
    match task {
        Task::Run(entry) => {
            runtime.run_main(&entry)?;
            Ok(None)
        }
        Task::Eval(code) => {
            let result = runtime.eval(&code)?;
            Ok((!result.is_undefined()).then(|| result.inspect()))
        }
        Task::Snapshot { entry, out } => {
            let source = runtime.make_snapshot(&entry, &out)?;
            Ok(Some(format!(
                "{} {} -> {}",
                "Compiled".green().bold(),
                source.display(),
                out.display()
            )))
        }
    }
}

fn fail(e: anyhow::Error) -> ! {
    eprintln!("{}: {}", "Error".red().bold(), e);
    std::process::exit(1);
}
