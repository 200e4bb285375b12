//! Portal registry: `{ "udata_root": [string, ...] }`, read-only.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("read portal registry {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse portal registry {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Base URLs of the configured uData portals, in query order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalRegistry {
    #[serde(default)]
    pub udata_root: Vec<String>,
}

impl PortalRegistry {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            udata_root: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn roots(&self) -> &[String] {
        &self.udata_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_udata_roots_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portals.json");
        std::fs::write(
            &path,
            r#"{"udata_root": ["https://data.public.lu", "https://www.data.gouv.fr"]}"#,
        )
        .unwrap();
        let reg = PortalRegistry::load(&path).unwrap();
        assert_eq!(
            reg.roots(),
            &["https://data.public.lu".to_string(), "https://www.data.gouv.fr".to_string()]
        );
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PortalRegistry::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portals.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            PortalRegistry::load(&path),
            Err(RegistryError::Parse { .. })
        ));
    }
}
