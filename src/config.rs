use std::path::{Path, PathBuf};

use clap::Parser;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Map};
use serde::Deserialize;

use crate::scrape::DEFAULT_BASE_URL;

pub const SERVER_CONFIG_NAME: &str = "excuses-server.yml";
pub const CLIENT_CONFIG_NAME: &str = "excuses-client.yml";
pub const ENV_PREFIX: &str = "EXCUSES";
pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_SERVER: &str = "localhost:1234";

const BASE_URL_KEY: &str = "baseURL";

/// Start the quote server
#[derive(Parser, Debug, Default)]
#[command(name = "excuses-server", version, about = "Start the quote server")]
pub struct ServerCli {
    /// Port to listen on [default: 1234]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Config file (default is ./excuses-server.yml, then ~/excuses-server.yml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// A TUI for cyber security excuses
#[derive(Parser, Debug, Default)]
#[command(
    name = "excuses-client",
    version,
    about = "A TUI for cyber security excuses",
    long_about = "A terminal user interface that displays excuses from https://cyber.excusesecu.fr/"
)]
pub struct ClientCli {
    /// RPC server address [default: localhost:1234]
    #[arg(long)]
    pub server: Option<String>,

    /// Config file (default is ./excuses-client.yml, then ~/excuses-client.yml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub port: u16,
    pub debug: bool,
    // Read by hand: files keep the key's case while environment keys arrive
    // lowercased, so serde would see `baseURL` and `baseurl` as two fields.
    #[serde(skip)]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    pub server: String,
}

/// Where a settings lookup reads from. `home` is `None` when it cannot be
/// determined; `env` is `None` to read the process environment.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    pub env: Option<Map<String, String>>,
}

impl SearchPaths {
    pub fn from_env() -> Self {
        Self {
            cwd: PathBuf::from("."),
            home: dirs::home_dir(),
            env: None,
        }
    }
}

/// Environment variables with the `EXCUSES_BASEURL` entry split off.
fn split_env(paths: &SearchPaths) -> (Map<String, String>, Option<String>) {
    let mut vars: Map<String, String> = match &paths.env {
        Some(vars) => vars.clone(),
        None => std::env::vars().collect(),
    };
    let wanted = format!("{}_{}", ENV_PREFIX, BASE_URL_KEY);
    let key = vars.keys().find(|k| k.eq_ignore_ascii_case(&wanted)).cloned();
    let base_url = key.and_then(|k| vars.remove(&k));
    (vars, base_url)
}

/// Home file, then the one in the working directory, then an explicit file,
/// then `EXCUSES_*` environment variables. Later sources win.
fn layered(
    mut builder: ConfigBuilder<DefaultState>,
    file_name: &str,
    explicit: Option<&Path>,
    paths: &SearchPaths,
    env: Map<String, String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match explicit {
        Some(path) => {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }
        None => {
            let home = paths
                .home
                .as_ref()
                .ok_or_else(|| ConfigError::Message("could not determine home directory".into()))?;
            builder = builder
                .add_source(File::from(home.join(file_name)).format(FileFormat::Yaml).required(false))
                .add_source(File::from(paths.cwd.join(file_name)).format(FileFormat::Yaml).required(false));
        }
    }
    Ok(builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true).source(Some(env))))
}

impl ServerSettings {
    pub fn load(cli: &ServerCli) -> Result<Self, ConfigError> {
        Self::load_from(cli, &SearchPaths::from_env())
    }

    pub fn load_from(cli: &ServerCli, paths: &SearchPaths) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("debug", false)?;
        let (env, env_base_url) = split_env(paths);
        let mut builder = layered(builder, SERVER_CONFIG_NAME, cli.config.as_deref(), paths, env)?;

        // Flags given on the command line beat every other source.
        if let Some(port) = cli.port {
            builder = builder.set_override("port", i64::from(port))?;
        }
        if cli.debug {
            builder = builder.set_override("debug", true)?;
        }

        let config = builder.build()?;
        let file_base_url = config
            .get_string(BASE_URL_KEY)
            .or_else(|_| config.get_string(&BASE_URL_KEY.to_lowercase()))
            .ok();

        let mut settings: ServerSettings = config.try_deserialize()?;
        settings.base_url = env_base_url
            .into_iter()
            .chain(file_base_url)
            .find(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(settings)
    }
}

impl ClientSettings {
    pub fn load(cli: &ClientCli) -> Result<Self, ConfigError> {
        Self::load_from(cli, &SearchPaths::from_env())
    }

    pub fn load_from(cli: &ClientCli, paths: &SearchPaths) -> Result<Self, ConfigError> {
        let builder = Config::builder().set_default("server", DEFAULT_SERVER)?;
        let (env, _) = split_env(paths);
        let mut builder = layered(builder, CLIENT_CONFIG_NAME, cli.config.as_deref(), paths, env)?;
        if let Some(server) = &cli.server {
            builder = builder.set_override("server", server.as_str())?;
        }
        builder.build()?.try_deserialize()
    }
}
