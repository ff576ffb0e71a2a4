use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::index::{OrderedStore, RelationalStore};
use crate::models::{EngineKind, SearchResponse};
use crate::search::harness::{self, SearchOutcome};
use crate::search::{OrderedEngine, PrefixEngine, RelationalEngine};
use crate::server::{self, AppState};
use crate::vocabulary;

mod args;
mod config;
mod format;
mod http_backend;

pub use args::{
    Cli, Commands, EngineArg, EngineSettings, OutputFormat, SearchArgs, SeedArgs, SeedBackendArg,
    ServeArgs,
};

use config::{
    apply_search_config_defaults, apply_seed_config_defaults, apply_serve_config_defaults,
    load_cli_config,
};
use http_backend::HttpSearchBackend;

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Seed(mut seed_args)) => {
            if let Some(ref config) = cli_config {
                apply_seed_config_defaults(config, &mut seed_args);
            }

            let config = args::seed_config_from_args(&seed_args);
            let summaries = crate::index::run_seed(&config)?;
            format::print_seed_summaries(&summaries)
        }
        Some(Commands::Search(mut search_args)) => {
            let explicit_bounds = search_args.window.is_some() || search_args.limit.is_some();

            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }

            let kind = search_args.engine.to_model();
            let response = if let Some(server_url) =
                effective_server_url(search_args.server.as_deref(), search_args.no_server)
            {
                if explicit_bounds {
                    bail!(
                        "--window and --limit apply to local queries only; \
                         the server uses its own bounds (pass --no-server to query locally)"
                    );
                }
                if search_args.window.is_some() || search_args.limit.is_some() {
                    tracing::warn!("configured window/limit ignored for server-backed search");
                }

                let backend = HttpSearchBackend::new(server_url)?;
                into_response(backend.search(kind, &search_args.query)?)?
            } else {
                let settings = args::engine_settings_from_search_args(&search_args)?;
                let engine = open_engine(kind, &settings)?;
                into_response(harness::run(engine.as_ref(), Some(&search_args.query)))?
            };

            match search_args.format {
                OutputFormat::Text => format::print_text(&response),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &response)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Serve(mut serve_args)) => {
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }

            let settings = args::engine_settings_from_serve_args(&serve_args)?;
            let addr: SocketAddr = serve_args
                .addr
                .parse()
                .with_context(|| format!("invalid listen address {:?}", serve_args.addr))?;

            let ordered = Arc::new(OrderedStore::open(&settings.index_path)?);
            let relational = Arc::new(RelationalStore::open(&settings.db_path)?);

            if serve_args.seed {
                let words = match &serve_args.words {
                    Some(path) => vocabulary::load_words(path)?,
                    None => vocabulary::builtin_words(),
                };
                ordered
                    .rebuild(&words)
                    .context("failed to seed ordered index")?;
                relational
                    .rebuild(&words)
                    .context("failed to seed relational table")?;
                tracing::info!(words = words.len(), "seeded both engines before serving");
            }

            let state = Arc::new(AppState {
                ordered: OrderedEngine::new(ordered).with_window(settings.window),
                relational: RelationalEngine::new(relational).with_limit(settings.limit),
            });

            println!("Starting speedsearch HTTP server on http://{addr}");

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(server::run(addr, state))?;
            Ok(())
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`, defaulting
/// to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_engine(kind: EngineKind, settings: &EngineSettings) -> Result<Box<dyn PrefixEngine>> {
    let engine: Box<dyn PrefixEngine> = match kind {
        EngineKind::Ordered => {
            let store = OrderedStore::open(&settings.index_path)?;
            Box::new(OrderedEngine::new(Arc::new(store)).with_window(settings.window))
        }
        EngineKind::Relational => {
            let store = RelationalStore::open(&settings.db_path)?;
            Box::new(RelationalEngine::new(Arc::new(store)).with_limit(settings.limit))
        }
    };
    Ok(engine)
}

fn into_response(outcome: SearchOutcome) -> Result<SearchResponse> {
    match outcome {
        SearchOutcome::Found(response) => Ok(response),
        SearchOutcome::Invalid(body) => bail!("{}", body.error),
        SearchOutcome::Failed(body) => bail!("{}", body.message),
    }
}

fn effective_server_url(server_flag: Option<&str>, no_server: bool) -> Option<String> {
    if no_server {
        None
    } else {
        server_flag.map(|s| s.to_string())
    }
}
