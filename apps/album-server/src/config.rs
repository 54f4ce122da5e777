use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// One JSON file per record under the data directory
    Json,
    /// `album.db` under the data directory
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub store: StoreKind,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("ALBUM_SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let addr = addr
            .parse()
            .with_context(|| format!("ALBUM_SERVER_ADDR={}", addr))?;

        let data_dir = lookup("ALBUM_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "album_data".to_string())
            .into();

        let store = match lookup("ALBUM_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("json") => StoreKind::Json,
            Some("sqlite") => StoreKind::Sqlite,
            Some(other) => bail!("ALBUM_STORE must be 'json' or 'sqlite', got '{}'", other),
        };

        Ok(Self {
            addr,
            data_dir,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.data_dir, PathBuf::from("album_data"));
        assert_eq!(config.store, StoreKind::Json);
    }

    #[test]
    fn test_sqlite_and_bad_store() {
        let config = ServerConfig::from_lookup(|name| match name {
            "ALBUM_STORE" => Some("sqlite".to_string()),
            "ALBUM_SERVER_ADDR" => Some("0.0.0.0:8080".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.addr.port(), 8080);

        let err = ServerConfig::from_lookup(|name| {
            (name == "ALBUM_STORE").then(|| "redis".to_string())
        });
        assert!(err.is_err());
    }
}
