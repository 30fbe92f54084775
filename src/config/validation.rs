use anyhow::Result;
use clap::Args;
use figment::{Figment, providers::{Env, Format, Toml, Serialized}};
use garde::Validate;
use std::path::PathBuf;

use super::AppConfig;

/// Configuration flags shared by every command
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// Path to an additional configuration file
    #[arg(long, env = "APP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Environment name, selects config/{environment}.toml
    #[arg(long, env = "ENVIRONMENT", global = true)]
    pub environment: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

impl ConfigArgs {
    fn environment_name(&self) -> String {
        self.environment.clone().unwrap_or_else(|| "production".to_string())
    }
}

/// Build the layered configuration source:
/// defaults, config/default.toml, config/{environment}.toml, --config file,
/// then APP_ prefixed environment variables.
pub fn config_figment(args: &ConfigArgs) -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file("config/default.toml"))
        .merge(Toml::file(format!("config/{}.toml", args.environment_name())));

    if let Some(path) = &args.config {
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(Env::prefixed("APP_").split("__"))
}

/// Load and validate configuration; CLI flags take the highest priority
pub fn load_config(args: &ConfigArgs) -> Result<AppConfig> {
    let mut config: AppConfig = config_figment(args).extract()?;

    if args.debug {
        config.logging.level = "debug".to_string();
        config.logging.format = "pretty".to_string();
    }

    config.validate()?;

    Ok(config)
}
