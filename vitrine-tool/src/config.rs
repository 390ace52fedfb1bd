use std::path::{Path, PathBuf};

use serde::Deserialize;
use vitrine_catalog::CatalogConfig;

use crate::error::VitError;
use crate::store::default_store_path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vitrine").join("config.toml"))
}

/// Reads the config file at `path`. A missing file gives the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, VitError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e.into()),
    };
    Ok(toml::from_str(&content)?)
}

pub fn load_config() -> Result<Config, VitError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

impl Config {
    /// Store location: the command line wins over the file.
    pub fn store_path(&self, cli_path: Option<PathBuf>) -> PathBuf {
        cli_path
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(default_store_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.store.path, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[store]
path = "/srv/vitrine"

[catalog]
page_size = 9

[catalog.image]
quality = 60
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from("/srv/vitrine")));
        assert_eq!(config.catalog.page_size, 9);
        assert_eq!(config.catalog.collection, "joias");
        assert_eq!(config.catalog.image.quality, 60);
        assert_eq!(config.catalog.image.max_width, 800);
        assert_eq!(config.catalog.image.threshold, 1_048_487);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog]\npage_size = \"eight\"\n").unwrap();

        assert!(matches!(load_config_from(&path), Err(VitError::Config(_))));
    }

    #[test]
    fn cli_path_overrides_file() {
        let config = Config {
            store: StoreConfig {
                path: Some(PathBuf::from("/from/file")),
            },
            ..Config::default()
        };
        assert_eq!(
            config.store_path(Some(PathBuf::from("/from/cli"))),
            PathBuf::from("/from/cli")
        );
        assert_eq!(config.store_path(None), PathBuf::from("/from/file"));
    }
}
