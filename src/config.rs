use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "campdir.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration, loaded from a TOML file with every field optional;
/// CLI flags override on top (see the binary).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Seed data, geocoder table, and store snapshot live here.
    pub data_dir: PathBuf,
    /// Destination for uploaded photos.
    pub upload_dir: PathBuf,
    /// Upper bound on an uploaded photo, in bytes.
    pub max_file_upload: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            data_dir: PathBuf::from("_data"),
            upload_dir: PathBuf::from("public/uploads"),
            max_file_upload: 1_000_000,
        }
    }
}

impl Config {
    /// Loads from `path` if given, else from `campdir.toml` if present,
    /// else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let raw = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        Ok(toml::from_str(&raw)?)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    #[must_use]
    pub fn geocoder_path(&self) -> PathBuf {
        self.data_dir.join("zipcodes.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campdir.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "port = 8080").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, Config::default().host);
        assert_eq!(cfg.max_file_upload, Config::default().max_file_upload);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campdir.toml");
        std::fs::write(&path, "prot = 8080\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse(_))));
    }
}
