use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::{EngineArg, OutputFormat, SeedBackendArg, DEFAULT_ADDR};
use crate::cli::{SearchArgs, SeedArgs, ServeArgs};

/// Top-level representation of `.speedsearch/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub seed: Option<SeedSection>,

    #[serde(default)]
    pub search: Option<SearchSection>,

    #[serde(default)]
    pub serve: Option<ServeSection>,

    #[serde(default)]
    pub http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedSection {
    #[serde(default)]
    pub backend: Option<SeedBackendArg>,
    #[serde(default)]
    pub words: Option<PathBuf>,
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub engine: Option<EngineArg>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub no_server: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpSection {
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Discover and load a project-local `.speedsearch/config.toml` (or
/// `.speedsearch/speedsearch.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = find_project_config(&cwd);

    let Some(path) = config_path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded project config");
    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let project_dir = current.join(".speedsearch");
        let config_toml = project_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let named_toml = project_dir.join("speedsearch.toml");
        if named_toml.is_file() {
            return Some(named_toml);
        }

        dir = current.parent();
    }

    None
}

pub fn apply_seed_config_defaults(config: &CliConfig, args: &mut SeedArgs) {
    if let Some(seed) = &config.seed {
        if args.backend.is_none() {
            args.backend = seed.backend;
        }

        if args.words.is_none() {
            args.words = seed.words.clone();
        }

        if args.index_path.is_none() {
            args.index_path = seed.index_path.clone();
        }

        if args.db_path.is_none() {
            args.db_path = seed.db_path.clone();
        }
    }
}

pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    if let Some(search) = &config.search {
        if matches!(args.engine, EngineArg::Ordered) {
            if let Some(engine) = search.engine {
                args.engine = engine;
            }
        }

        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = search.format {
                args.format = format;
            }
        }

        if args.window.is_none() {
            args.window = search.window;
        }

        if args.limit.is_none() {
            args.limit = search.limit;
        }

        if args.index_path.is_none() {
            args.index_path = search.index_path.clone();
        }

        if args.db_path.is_none() {
            args.db_path = search.db_path.clone();
        }

        if args.server.is_none() {
            if let Some(server) = &search.server {
                args.server = Some(server.clone());
            } else if let Some(url) = config.http.as_ref().and_then(|h| h.server_url.as_ref()) {
                args.server = Some(url.clone());
            }
        }

        if !args.no_server {
            if let Some(true) = search.no_server {
                args.no_server = true;
            }
        }
    } else if args.server.is_none() {
        // Without a search section, fall back to a global HTTP server URL
        // when present.
        if let Some(url) = config.http.as_ref().and_then(|h| h.server_url.as_ref()) {
            args.server = Some(url.clone());
        }
    }
}

pub fn apply_serve_config_defaults(config: &CliConfig, args: &mut ServeArgs) {
    if let Some(serve) = &config.serve {
        if args.addr == DEFAULT_ADDR {
            if let Some(addr) = &serve.addr {
                args.addr = addr.clone();
            }
        }

        if args.window.is_none() {
            args.window = serve.window;
        }

        if args.limit.is_none() {
            args.limit = serve.limit;
        }

        if args.index_path.is_none() {
            args.index_path = serve.index_path.clone();
        }

        if args.db_path.is_none() {
            args.db_path = serve.db_path.clone();
        }
    }
}
