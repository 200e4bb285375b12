//! Read a project `.env` into a key-value map (no overwrite of existing env here; applied in lib).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` in `override_dir` if given, else in the current directory.
fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Loads `.env` into a map without touching the process environment. Missing file returns an
/// empty map.
pub fn load_env_map(
    override_dir: Option<&Path>,
) -> Result<HashMap<String, String>, dotenvy::Error> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let mut out = HashMap::new();
    for item in dotenvy::from_path_iter(&path)? {
        let (key, value) = item?;
        out.insert(key, value);
    }
    Ok(out)
}
