use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend used when `--backend` is not given
    pub backend: BackendChoice,

    /// Formatting mode sent to backends that understand it
    pub mode: ModeChoice,

    /// Fixed output line width, when the formatter should override its own
    pub line_length: Option<u32>,

    /// Globs selecting which files a directory walk formats
    pub include: Vec<String>,

    /// Extra ignore globs (in addition to .gitignore)
    pub ignore_patterns: Vec<String>,

    /// Subprocess backend settings
    pub subprocess: SubprocessSection,

    /// Daemon backend settings
    pub daemon: DaemonSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Subprocess,
    Daemon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModeChoice {
    Fast,
    #[default]
    Safe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubprocessSection {
    /// Formatter executable; `~` and `$VAR` are expanded
    pub command: String,

    /// Arguments before the file path (include the in-place flag here)
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSection {
    /// Daemon executable; spawned on demand
    pub command: String,

    /// Spawn arguments; `{host}` and `{port}` are substituted
    pub args: Vec<String>,

    /// Bind host for the daemon endpoint
    pub host: String,

    /// Bind port for the daemon endpoint
    pub port: u16,

    /// Startup grace period before the first request, in milliseconds
    pub startup_grace_ms: u64,

    /// Per-request timeout, in milliseconds
    pub request_timeout_ms: u64,

    /// Poll the endpoint during the grace period instead of sleeping it out
    pub probe_readiness: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Subprocess,
            mode: ModeChoice::Safe,
            line_length: None,
            include: vec!["**/*.rs".to_string()],
            ignore_patterns: vec![
                "target/**".to_string(),
                "node_modules/**".to_string(),
                ".git/**".to_string(),
            ],
            subprocess: SubprocessSection::default(),
            daemon: DaemonSection::default(),
        }
    }
}

impl Default for SubprocessSection {
    fn default() -> Self {
        Self {
            command: "rustfmt".to_string(),
            args: vec![],
        }
    }
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            command: "blackd".to_string(),
            args: vec![
                "--bind-host".to_string(),
                "{host}".to_string(),
                "--bind-port".to_string(),
                "{port}".to_string(),
            ],
            host: "127.0.0.1".to_string(),
            port: 45484,
            startup_grace_ms: 1500,
            request_timeout_ms: 5000,
            probe_readiness: true,
        }
    }
}

pub fn load_config() -> Result<Config> {
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    let config_paths = ["patchup.toml", ".patchup.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
            break;
        }
    }

    // Add environment variables with PATCHUP_ prefix
    builder = builder.add_source(config::Environment::with_prefix("PATCHUP").separator("_"));

    let cfg = builder.build().context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(args: InitArgs, ctx: &AppContext) -> Result<()> {
    let config_path = args.path.join("patchup.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run {
        if !ctx.quiet {
            println!("would write config file at {}", config_path.display());
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
