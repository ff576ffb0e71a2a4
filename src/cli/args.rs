use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::{EngineKind, SeedConfig, SeedTarget, DEFAULT_LIMIT, DEFAULT_WINDOW};

/// Default location of the ordered index snapshot.
pub const DEFAULT_INDEX_PATH: &str = ".speedsearch/ordered.jsonl";

/// Default location of the relational database.
pub const DEFAULT_DB_PATH: &str = ".speedsearch/countries.sqlite";

/// Default bind address for `serve`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:7878";

/// Top-level CLI entrypoint for `speedsearch`.
#[derive(Parser, Debug)]
#[command(
    name = "speedsearch",
    about = "Prefix autocomplete over an ordered index and a relational table",
    author = "speedsearch developers",
    version,
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the ordered index and/or relational table from a vocabulary.
    Seed(SeedArgs),
    /// Run a single prefix query.
    Search(SearchArgs),
    /// Run a long-lived HTTP+JSON server.
    Serve(ServeArgs),
}

/// CLI representation of engine kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineArg {
    Ordered,
    Relational,
}

impl EngineArg {
    pub fn to_model(self) -> EngineKind {
        match self {
            EngineArg::Ordered => EngineKind::Ordered,
            EngineArg::Relational => EngineKind::Relational,
        }
    }
}

/// CLI representation of the stores a rebuild targets.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedBackendArg {
    Ordered,
    Relational,
    All,
}

impl SeedBackendArg {
    pub fn to_model(self) -> SeedTarget {
        match self {
            SeedBackendArg::Ordered => SeedTarget::Ordered,
            SeedBackendArg::Relational => SeedTarget::Relational,
            SeedBackendArg::All => SeedTarget::All,
        }
    }
}

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments specific to the `seed` subcommand.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Which store(s) to rebuild.
    ///
    /// When omitted, both stores are rebuilt.
    #[arg(long = "backend", value_enum)]
    pub backend: Option<SeedBackendArg>,

    /// Word file with one entry per line.
    ///
    /// When omitted, the builtin country list is used.
    #[arg(long = "words")]
    pub words: Option<PathBuf>,

    /// Location of the ordered index snapshot.
    #[arg(long = "index-path")]
    pub index_path: Option<PathBuf>,

    /// Location of the SQLite database.
    #[arg(long = "db-path")]
    pub db_path: Option<PathBuf>,
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Prefix to complete.
    pub query: String,

    /// Engine used to answer the query.
    #[arg(long = "engine", value_enum, default_value_t = EngineArg::Ordered)]
    pub engine: EngineArg,

    /// Maximum number of ordered-index entries scanned.
    #[arg(long = "window")]
    pub window: Option<usize>,

    /// Maximum number of relational rows returned.
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    /// Location of the ordered index snapshot.
    #[arg(long = "index-path")]
    pub index_path: Option<PathBuf>,

    /// Location of the SQLite database.
    #[arg(long = "db-path")]
    pub db_path: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Optional server URL for delegating the query to a running server.
    ///
    /// When set (either via this flag or the `SPEEDSEARCH_SERVER_URL`
    /// environment variable), the CLI sends the query to the HTTP server
    /// instead of opening the stores locally. Use `--no-server` to
    /// override this and force local execution.
    #[arg(long = "server", env = "SPEEDSEARCH_SERVER_URL")]
    pub server: Option<String>,

    /// Disable use of any configured server and force a local query.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments specific to the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to, e.g. "127.0.0.1:7878".
    #[arg(long = "addr", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Maximum number of ordered-index entries scanned per query.
    #[arg(long = "window")]
    pub window: Option<usize>,

    /// Maximum number of relational rows returned per query.
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    /// Location of the ordered index snapshot.
    #[arg(long = "index-path")]
    pub index_path: Option<PathBuf>,

    /// Location of the SQLite database.
    #[arg(long = "db-path")]
    pub db_path: Option<PathBuf>,

    /// Rebuild both stores before serving.
    #[arg(long = "seed")]
    pub seed: bool,

    /// Word file used with `--seed`; defaults to the builtin country list.
    #[arg(long = "words", requires = "seed")]
    pub words: Option<PathBuf>,
}

/// Resolved store locations and query bounds shared by `search` and
/// `serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub index_path: PathBuf,
    pub db_path: PathBuf,
    pub window: usize,
    pub limit: usize,
}

/// Build a core `SeedConfig` from CLI `SeedArgs`.
pub fn seed_config_from_args(args: &SeedArgs) -> SeedConfig {
    SeedConfig {
        target: args.backend.unwrap_or(SeedBackendArg::All).to_model(),
        words: args.words.clone(),
        index_path: args
            .index_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_PATH)),
        db_path: args
            .db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
    }
}

pub fn engine_settings_from_search_args(args: &SearchArgs) -> Result<EngineSettings> {
    engine_settings(
        args.index_path.as_ref(),
        args.db_path.as_ref(),
        args.window,
        args.limit,
    )
}

pub fn engine_settings_from_serve_args(args: &ServeArgs) -> Result<EngineSettings> {
    engine_settings(
        args.index_path.as_ref(),
        args.db_path.as_ref(),
        args.window,
        args.limit,
    )
}

fn engine_settings(
    index_path: Option<&PathBuf>,
    db_path: Option<&PathBuf>,
    window: Option<usize>,
    limit: Option<usize>,
) -> Result<EngineSettings> {
    let window = window.unwrap_or(DEFAULT_WINDOW);
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    if window == 0 {
        bail!("--window must be at least 1");
    }
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    Ok(EngineSettings {
        index_path: index_path
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_PATH)),
        db_path: db_path
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
        window,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(query: &str) -> SearchArgs {
        SearchArgs {
            query: query.to_string(),
            engine: EngineArg::Ordered,
            window: None,
            limit: None,
            index_path: None,
            db_path: None,
            format: OutputFormat::Text,
            server: None,
            no_server: false,
        }
    }

    #[test]
    fn seed_config_defaults_to_all_backends_and_default_paths() {
        let args = SeedArgs {
            backend: None,
            words: None,
            index_path: None,
            db_path: None,
        };

        let config = seed_config_from_args(&args);
        assert_eq!(config.target, SeedTarget::All);
        assert_eq!(config.words, None);
        assert_eq!(config.index_path, PathBuf::from(DEFAULT_INDEX_PATH));
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn engine_settings_default_to_reference_bounds() {
        let settings = engine_settings_from_search_args(&search_args("fra")).expect("settings");
        assert_eq!(settings.window, 100);
        assert_eq!(settings.limit, 10);
    }

    #[test]
    fn engine_settings_respect_all_fields() {
        let mut args = search_args("fra");
        args.window = Some(25);
        args.limit = Some(3);
        args.index_path = Some(PathBuf::from("idx.jsonl"));
        args.db_path = Some(PathBuf::from("db.sqlite"));

        let settings = engine_settings_from_search_args(&args).expect("settings");
        assert_eq!(
            settings,
            EngineSettings {
                index_path: PathBuf::from("idx.jsonl"),
                db_path: PathBuf::from("db.sqlite"),
                window: 25,
                limit: 3,
            }
        );
    }

    #[test]
    fn zero_window_is_rejected() {
        let mut args = search_args("fra");
        args.window = Some(0);
        assert!(engine_settings_from_search_args(&args).is_err());
    }

    #[test]
    fn cli_parses_serve_with_seed_words() {
        let cli = Cli::try_parse_from(["speedsearch", "serve", "--seed", "--words", "w.txt"])
            .expect("parse");
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve command");
        };
        assert!(args.seed);
        assert_eq!(args.words, Some(PathBuf::from("w.txt")));
        assert_eq!(args.addr, DEFAULT_ADDR);
    }
}
