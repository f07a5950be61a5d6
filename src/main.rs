//! flakecheck - Repeated Test Invoker
//!
//! A CLI tool that launches an external test command as N concurrent
//! child processes, waits for every one to exit, and fails the overall
//! run if any invocation exits non-zero. Built as a regression check for
//! flaky test suites: run the same suite several times at once and
//! demand that every run passes.
//!
//! ## Usage
//!
//! ```bash
//! # Run `npm test` twice concurrently (the default)
//! flakecheck run -- npm test
//!
//! # Run it five times, three rounds, with a 50s timeout per round
//! flakecheck run --times 5 --rounds 3 --timeout 50 -- npm test
//!
//! # Preflight: is the command resolvable?
//! flakecheck check npm
//!
//! # Inspect stored results
//! flakecheck results --latest
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;

mod cli;
mod config;
mod invoker;
mod models;
mod output;
mod results;
mod utils;

use cli::Args;
use config::{ConfigFile, EnvConfig};
use invoker::{resolve_command, BatchRunner, RepeatedInvoker, RunError};
use models::InvocationSpec;
use output::{OutputFormat, ResultFormatter};
use results::{ResultsStorage, StoredRun};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let verbose = args.verbose || env.verbose.unwrap_or(false);
    utils::init_logger(utils::resolve_level(env.log_level.as_deref(), verbose));

    match args.command {
        cli::Command::Run(run_args) => {
            run_invocations(run_args, env).await?;
        }
        cli::Command::Check(check_args) => {
            check_command(check_args)?;
        }
        cli::Command::Results(results_args) => {
            show_results(results_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
    }

    Ok(())
}

async fn run_invocations(args: cli::RunArgs, env: EnvConfig) -> Result<()> {
    let config = match args.config.as_deref().or(env.config_file.as_deref()) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    // Precedence: CLI > environment > config file > defaults.
    let (command, command_args) = if let Some((cmd, rest)) = args.command.split_first() {
        (cmd.clone(), rest.to_vec())
    } else if let Some(cmd) = env.command.clone() {
        (cmd, Vec::new())
    } else if let Some(cmd) = config.app.command.clone() {
        (cmd, config.app.args.clone())
    } else {
        anyhow::bail!(
            "No command given. Pass one after `--` or set app.command in flakecheck.yaml"
        );
    };

    let times = args.times.or(env.times).unwrap_or(config.app.times);
    if times == 0 {
        anyhow::bail!("--times must be at least 1");
    }

    let rounds = args.rounds.or(env.rounds).unwrap_or(config.app.rounds);
    if rounds == 0 {
        anyhow::bail!("--rounds must be at least 1");
    }

    let timeout = args
        .timeout
        .or(env.timeout)
        .map(Duration::from_secs)
        .or_else(|| config.app.timeout());

    let format_name = args
        .format
        .clone()
        .or(env.format.clone())
        .unwrap_or_else(|| config.app.format.clone());
    let format = OutputFormat::from_str(&format_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format_name}"))?;

    let mut formatter = ResultFormatter::new(format);
    if args.no_color {
        formatter = formatter.no_color();
    }

    let spec = InvocationSpec::new(command)
        .with_args(command_args)
        .with_times(times);

    info!("Invoking {} ({} round(s))", spec, rounds);

    let mut invoker = RepeatedInvoker::new(spec.clone());
    if let Some(timeout) = timeout {
        invoker = invoker.with_timeout(timeout);
    }

    let save = args.save || config.app.save_results;
    let mut stored = StoredRun::new(spec.command_line());

    let outcome = if rounds > 1 {
        let runner = BatchRunner::new(invoker, rounds);
        let summaries = runner.run_rounds().await?;

        for summary in &summaries {
            println!("{}", formatter.format_summary(summary));
        }

        let aggregate = BatchRunner::aggregate(&summaries);
        println!("{}", formatter.format_aggregate(&aggregate, &spec.command_line()));

        for summary in summaries {
            stored.add_round(summary);
        }
        stored.set_aggregate(&aggregate);

        if stored.all_passed() {
            Ok(())
        } else {
            let failed = aggregate.total_invocations - aggregate.passed;
            Err(RunError::TestsFailed {
                failed,
                total: aggregate.total_invocations,
            })
        }
    } else {
        let summary = invoker.run().await?;
        println!("{}", formatter.format_summary(&summary));

        let round_verdict = invoker::verdict(&summary);
        stored.add_round(summary);
        round_verdict
    };

    if save {
        let storage = ResultsStorage::default_dir()?;
        let path = storage.save(&stored)?;
        println!("Results saved to: {}", path.display());
    }

    outcome.map_err(Into::into)
}

fn check_command(args: cli::CheckArgs) -> Result<()> {
    let command = match args.command {
        Some(command) => command,
        None => {
            let config = ConfigFile::load_default()?;
            config
                .app
                .command
                .context("No command given and none configured")?
        }
    };

    match resolve_command(&command) {
        Some(path) => {
            println!("✓ {} resolves to {}", command, path.display());
            Ok(())
        }
        None => {
            println!("✗ {command} is not resolvable on PATH");
            std::process::exit(1);
        }
    }
}

fn show_results(args: cli::ResultsArgs) -> Result<()> {
    let storage = ResultsStorage::default_dir()?;
    let formatter = ResultFormatter::new(
        OutputFormat::from_str(&args.format)
            .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?,
    );

    if let Some(id) = &args.id {
        let run = storage.load(id)?;
        print_stored_run(&run, &formatter);
        return Ok(());
    }

    if args.latest {
        match storage.latest()? {
            Some(run) => print_stored_run(&run, &formatter),
            None => println!("No stored results found."),
        }
        return Ok(());
    }

    let ids = storage.list_runs()?;
    if ids.is_empty() {
        println!("No stored results found.");
        println!("Run with: flakecheck run --save -- <command>");
        return Ok(());
    }

    println!("\nStored runs ({}):", ids.len());
    for id in &ids {
        match storage.load(id) {
            Ok(run) => {
                let verdict = if run.all_passed() { "pass" } else { "FAIL" };
                println!(
                    "  {} | {} | {} round(s) | {}",
                    id, run.command_line, run.rounds, verdict
                );
            }
            Err(_) => println!("  {id} | <unreadable>"),
        }
    }
    println!("\nUse --id <run_id> to view details for a specific run.");

    Ok(())
}

fn print_stored_run(run: &StoredRun, formatter: &ResultFormatter) {
    println!("Run: {} ({})", run.id, run.command_line);
    println!("Started: {}", run.started_at.to_rfc3339());
    for summary in &run.summaries {
        println!("{}", formatter.format_summary(summary));
    }
    if let Some(aggregate) = &run.aggregate {
        println!(
            "Across {} rounds: {}/{} invocations passed ({:.1}%){}",
            aggregate.rounds,
            aggregate.passed,
            aggregate.total_invocations,
            aggregate.pass_rate,
            if aggregate.flaky { " - FLAKY" } else { "" }
        );
    }
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    use std::path::Path;

    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            let config = ConfigFile::example();
            config.save(path)?;
            println!("✓ Configuration file created: {output}");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                let env_config = EnvConfig::load();
                if env_config.has_any() {
                    println!("{env_config:#?}");
                } else {
                    println!("No FLAKECHECK_* environment variables set.");
                }
            } else {
                let config = ConfigFile::load_default()?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file.unwrap_or_else(|| {
                ConfigFile::find()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| "./flakecheck.yaml".to_string())
            });

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Set { key, value, file } => {
            let path = file.unwrap_or_else(|| "./flakecheck.yaml".to_string());
            let mut config = if Path::new(&path).exists() {
                ConfigFile::load(&path)?
            } else {
                ConfigFile::default()
            };

            let value_display = value.clone();

            match key.as_str() {
                "app.command" => config.app.command = Some(value),
                "app.times" => config.app.times = value.parse()?,
                "app.rounds" => config.app.rounds = value.parse()?,
                "app.timeout_secs" => config.app.timeout_secs = value.parse()?,
                "app.format" => config.app.format = value,
                "app.save_results" => config.app.save_results = value.parse()?,
                _ => {
                    anyhow::bail!("Unknown configuration key: {key}");
                }
            }

            config.validate()?;
            config.save(&path)?;
            println!("✓ Set {key} = {value_display} in {path}");
        }

        cli::ConfigAction::Get { key, file } => {
            let config = if let Some(path) = file {
                ConfigFile::load(&path)?
            } else {
                ConfigFile::load_default()?
            };

            let value = match key.as_str() {
                "app.command" => config.app.command.unwrap_or_default(),
                "app.times" => config.app.times.to_string(),
                "app.rounds" => config.app.rounds.to_string(),
                "app.timeout_secs" => config.app.timeout_secs.to_string(),
                "app.format" => config.app.format,
                "app.save_results" => config.app.save_results.to_string(),
                _ => {
                    anyhow::bail!("Unknown configuration key: {key}");
                }
            };

            println!("{value}");
        }

        cli::ConfigAction::Env => {
            config::env::print_env_help();
        }
    }

    Ok(())
}
