//! Startup configuration, read from the environment (and `.env`) in one place.

use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

pub const BIND: &str = "KLLCHAT_BIND";
pub const BACKEND_URL: &str = "KLLCHAT_BACKEND_URL";
pub const REDIRECT_DELAY_SECS: &str = "KLLCHAT_REDIRECT_DELAY_SECS";

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = get(BIND).unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = bind.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: BIND,
            reason: format!("{bind:?}: {e}"),
        })?;

        Ok(Self { bind })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `ws://` or `wss://` base of the relay, without the `/ws` path.
    pub backend_url: String,
    pub redirect_delay: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend_url = get(BACKEND_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(BACKEND_URL))?;
        if !(backend_url.starts_with("ws://") || backend_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid {
                key: BACKEND_URL,
                reason: format!("{backend_url:?} is not a ws:// or wss:// url"),
            });
        }

        let redirect_delay = match get(REDIRECT_DELAY_SECS) {
            Some(secs) => Duration::from_secs(secs.trim().parse::<u64>().map_err(|e| {
                ConfigError::Invalid {
                    key: REDIRECT_DELAY_SECS,
                    reason: format!("{secs:?}: {e}"),
                }
            })?),
            None => DEFAULT_REDIRECT_DELAY,
        };

        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_owned(),
            redirect_delay,
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    dotenv::var(key).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn server_defaults_to_all_interfaces() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn server_rejects_garbage_bind() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[(BIND, "localhost")])),
            Err(ConfigError::Invalid { key: BIND, .. })
        ));
    }

    #[test]
    fn client_fails_fast_without_backend() {
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing(BACKEND_URL))
        );
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[(BACKEND_URL, "  ")])),
            Err(ConfigError::Missing(BACKEND_URL))
        );
    }

    #[test]
    fn client_requires_websocket_scheme() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(BACKEND_URL, "http://chat.example")])),
            Err(ConfigError::Invalid { key: BACKEND_URL, .. })
        ));
    }

    #[test]
    fn client_reads_backend_and_delay() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BACKEND_URL, "wss://chat.example/"),
            (REDIRECT_DELAY_SECS, "2"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ClientConfig {
                backend_url: "wss://chat.example".to_owned(),
                redirect_delay: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn client_delay_defaults_to_five_seconds() {
        let config =
            ClientConfig::from_lookup(lookup(&[(BACKEND_URL, "ws://127.0.0.1:8080")])).unwrap();
        assert_eq!(config.redirect_delay, Duration::from_secs(5));
    }
}
