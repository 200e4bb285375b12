//! Load `[env]` table from `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set, else the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into())),
    }
}

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    Ok(path.exists().then_some(path))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Returns env key-value pairs from `[env]` section. Missing file or empty section returns empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = match xdg_config_path(app_name)? {
        Some(p) => p,
        None => return Ok(HashMap::new()),
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.env)
}
