// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use fatoora_app::AppState;
use fatoora_db::Store;
use runtime::{Backend, CliRuntime, DEMO_INVOICE_COUNT, DEMO_SEED, DemoBackend};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEMO_LATENCY: Duration = Duration::from_millis(400);

const HELP: &str = "\
fatoora: invoices from the terminal

  --config <path>          Use a specific config path
  --print-config-path      Print resolved config path
  --print-path             Print resolved draft database path
  --print-example-config   Print a config template
  --demo                   Seeded invoices, in-memory drafts, no network
  --check                  Validate config, database and API settings, then exit
  --help, -h               Show this help
";

/// What the process does after parsing flags. Print actions win over
/// `--check`, which wins over launching the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Launch,
    Check,
    PrintConfigPath,
    PrintDbPath,
    PrintExampleConfig,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    demo: bool,
    action: Action,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        Action::Help => {
            print!("{HELP}");
            return Ok(());
        }
        Action::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        Action::PrintExampleConfig => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        Action::PrintDbPath | Action::Check | Action::Launch => {}
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `fatoora --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.action == Action::PrintDbPath {
        println!("{}", db_path.display());
        return Ok(());
    }

    let mut store = open_store(&db_path)?;
    let backend = build_backend(&config, &options)?;
    let start_view = config.start_view()?;
    let page_size = config.page_size()?;
    let language = config.language()?;

    if options.action == Action::Check {
        logging::env_filter(&config.log_level())?;
        println!("ok: config, draft database and [api] settings are valid");
        return Ok(());
    }

    logging::init_logging(&config.log_level(), &config.log_path()?)?;
    info!(
        config = %options.config_path.display(),
        db = %db_path.display(),
        demo = options.demo,
        "starting fatoora"
    );

    let mut state = AppState::with_start(start_view, page_size, language);
    let mut runtime = CliRuntime::new(&mut store, backend);
    fatoora_tui::run_app(&mut state, &mut runtime)
}

fn open_store(db_path: &Path) -> Result<Store> {
    let store = Store::open(db_path).with_context(|| {
        format!(
            "open draft database {} -- set [storage].db_path or FATOORA_DB_PATH to a writable file",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    Ok(store)
}

fn build_backend(config: &Config, options: &CliOptions) -> Result<Backend> {
    if options.demo {
        return Ok(Backend::Demo(DemoBackend::new(DEMO_SEED, DEMO_INVOICE_COUNT, DEMO_LATENCY)));
    }
    let client = fatoora_api::Client::new(config.api_base_url(), config.api_timeout()?)
        .and_then(|client| client.with_send_path(config.api_send_path()))
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url, timeout or send_path",
                options.config_path.display()
            )
        })?;
    Ok(Backend::Remote(client))
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        demo: false,
        action: Action::Launch,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let requested = match arg.as_ref() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(path.as_ref());
                continue;
            }
            "--demo" => {
                options.demo = true;
                continue;
            }
            "--check" => Action::Check,
            "--print-config-path" => Action::PrintConfigPath,
            "--print-path" => Action::PrintDbPath,
            "--print-example-config" => Action::PrintExampleConfig,
            "--help" | "-h" => Action::Help,
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        };
        options.action = options.action.max_priority(requested);
    }

    Ok(options)
}

impl Action {
    fn priority(self) -> u8 {
        match self {
            Self::Launch => 0,
            Self::Check => 1,
            Self::PrintDbPath => 2,
            Self::PrintExampleConfig => 3,
            Self::PrintConfigPath => 4,
            Self::Help => 5,
        }
    }

    fn max_priority(self, other: Self) -> Self {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}
