use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub user: String,
    pub password: String,
    /// Concurrent client connections; extra connections are dropped on accept.
    pub max_connections: usize,
    /// WAL appends since the last compaction that trigger the next one.
    pub compact_threshold: u64,
    /// Writers give up on the wall lock after this long (WALL_LOCK_TIMEOUT_MS, 0 = wait forever).
    pub lock_timeout: Option<Duration>,
    pub metrics_port: Option<u16>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    /// tracing-subscriber filter directive (WALL_LOG).
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take their defaults; set but
    /// unparseable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parsed = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|v| v.trim().parse::<u64>().map_err(|_| ConfigError::Invalid { key, value: v }))
                .transpose()
        };
        let port = |key: &'static str| -> Result<Option<u16>, ConfigError> {
            lookup(key)
                .map(|v| v.trim().parse::<u16>().map_err(|_| ConfigError::Invalid { key, value: v }))
                .transpose()
        };

        let max_connections = parsed("WALL_MAX_CONNECTIONS")?.unwrap_or(256) as usize;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "WALL_MAX_CONNECTIONS",
                value: "0".into(),
            });
        }

        Ok(Self {
            bind: lookup("WALL_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: port("WALL_PORT")?.unwrap_or(5433),
            data_dir: PathBuf::from(lookup("WALL_DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            user: lookup("WALL_USER").unwrap_or_else(|| "wall".to_string()),
            password: lookup("WALL_PASSWORD").unwrap_or_else(|| "wall".to_string()),
            max_connections,
            compact_threshold: parsed("WALL_COMPACT_THRESHOLD")?.unwrap_or(1000),
            lock_timeout: match parsed("WALL_LOCK_TIMEOUT_MS")? {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => Some(Duration::from_secs(5)),
            },
            metrics_port: port("WALL_METRICS_PORT")?,
            tls_cert: lookup("WALL_TLS_CERT").map(PathBuf::from),
            tls_key: lookup("WALL_TLS_KEY").map(PathBuf::from),
            log_filter: lookup("WALL_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("wall.wal")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => write!(f, "{key}: invalid value {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.listen_addr(), "0.0.0.0:5433");
        assert_eq!(cfg.wal_path(), PathBuf::from("./data/wall.wal"));
        assert_eq!(cfg.max_connections, 256);
        assert_eq!(cfg.compact_threshold, 1000);
        assert_eq!(cfg.lock_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.metrics_port, None);
        assert!(cfg.tls_cert.is_none() && cfg.tls_key.is_none());
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("WALL_PORT", "6000"),
            ("WALL_DATA_DIR", "/var/lib/wall"),
            ("WALL_LOCK_TIMEOUT_MS", "0"),
            ("WALL_METRICS_PORT", "9100"),
            ("WALL_LOG", "pixelwall=debug"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 6000);
        assert_eq!(cfg.wal_path(), PathBuf::from("/var/lib/wall/wall.wal"));
        assert_eq!(cfg.lock_timeout, None);
        assert_eq!(cfg.metrics_port, Some(9100));
        assert_eq!(cfg.log_filter, "pixelwall=debug");
    }

    #[test]
    fn bad_values_are_errors() {
        let err = config(&[("WALL_PORT", "seventy")]).unwrap_err();
        assert!(err.to_string().contains("WALL_PORT"));
        assert!(config(&[("WALL_PORT", "70000")]).is_err());
        assert!(config(&[("WALL_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config(&[("WALL_COMPACT_THRESHOLD", "-1")]).is_err());
    }
}
