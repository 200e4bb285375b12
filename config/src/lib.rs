//! databot configuration.
//!
//! - [`load_and_apply`]: read XDG `config.toml` and project `.env`, then apply them to the
//!   process environment with priority **existing env > .env > XDG**.
//! - [`BotSettings`]: typed settings read from the environment once it is populated.
//! - `logging` (feature `tracing-init`): tracing subscriber setup shared by the binaries.

mod env_file;
#[cfg(feature = "tracing-init")]
pub mod logging;
mod settings;
mod xdg_toml;

use std::path::Path;
use thiserror::Error;

pub use settings::{BotSettings, ClassifierKind};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set.
///
/// When a key is missing from the process environment:
/// 1. value from project `.env` (current directory or `override_dir` if given)
/// 2. value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(&key).or_else(|| xdg_map.get(&key)) {
            std::env::set_var(&key, v);
        }
    }

    Ok(())
}
