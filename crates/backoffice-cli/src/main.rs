// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use backoffice_app::AppState;
use config::Config;
use runtime::ThreadRuntime;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const DEMO_SEED: u64 = 2026;
const DEMO_LATENCY: Duration = Duration::from_millis(250);

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `backoffice --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let settings = config.list_settings();

    let client = if options.demo {
        None
    } else {
        Some(
            backoffice_api::Client::new(config.base_url(), config.timeout()?, config.token())
                .with_context(|| {
                    format!(
                        "invalid [api] config in {}; fix base_url/timeout/token values",
                        options.config_path.display()
                    )
                })?,
        )
    };
    if options.check_only {
        config.log_file()?;
        return Ok(());
    }

    let _log_guard = logging::init(&config)?;
    let mut state = AppState::starting_on(config.start_screen());
    match client {
        Some(client) => {
            info!(base_url = client.base_url(), "starting console");
            let mut runtime = ThreadRuntime::new(Arc::new(client));
            backoffice_tui::run_app(&mut state, &mut runtime, settings)
        }
        None => {
            info!(seed = DEMO_SEED, "starting console against in-memory demo data");
            let mut runtime = ThreadRuntime::new(backoffice_testkit::demo_api(
                DEMO_SEED,
                DEMO_LATENCY,
            ));
            backoffice_tui::run_app(&mut state, &mut runtime, settings)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("backoffice");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Run against in-memory demo data instead of the API");
    println!("  --check                  Validate config and API settings, then exit");
    println!("  --help                   Show this help");
    println!();
    println!("  {}=<filter>      Override [log].level (for example backoffice_app=debug)", logging::LOG_ENV);
}
