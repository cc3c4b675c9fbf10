use std::time::Duration;

use feud_board_api::socketio::TRANSPORT_QUERY;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// The configuration passed by the host page.
///
/// Every field is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of all http requests. Empty for the current origin.
    pub api_base: String,
    /// Full url of the Socket.IO endpoint. Derived from the page location when `None`.
    pub socket_url: Option<String>,
    pub socket_path: String,
    pub namespace: String,
    /// Name of the event carrying a state snapshot.
    pub event: String,
    /// Milliseconds to wait before reconnecting a closed channel.
    pub reconnect_delay: u64,
    pub log_level: LevelFilter,
}

impl Config {
    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay)
    }

    /// Returns the websocket url of the Socket.IO endpoint for a page served with the given
    /// `protocol` (e.g. `https:`) from `host`.
    pub fn socket_url(&self, protocol: &str, host: &str) -> String {
        if let Some(url) = &self.socket_url {
            return url.clone();
        }

        let scheme = match protocol {
            "https:" => "wss",
            _ => "ws",
        };

        let separator = if self.socket_path.contains('?') {
            '&'
        } else {
            '?'
        };

        format!(
            "{}://{}{}{}{}",
            scheme, host, self.socket_path, separator, TRANSPORT_QUERY
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            socket_url: None,
            socket_path: String::from("/socket.io/"),
            namespace: String::from("/game"),
            event: String::from("state_update"),
            reconnect_delay: 5000,
            log_level: LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use serde_json::json;

    use super::Config;

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.namespace, "/game");
        assert_eq!(config.event, "state_update");
        assert_eq!(config.reconnect_delay().as_secs(), 5);
    }

    #[test]
    fn test_config_partial() {
        let config: Config = serde_json::from_value(json!({
            "namespace": "/judge",
            "log_level": "debug",
        }))
        .unwrap();

        assert_eq!(config.namespace, "/judge");
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.event, "state_update");
    }

    #[test]
    fn test_config_socket_url() {
        let config = Config::default();
        assert_eq!(
            config.socket_url("http:", "localhost:8000"),
            "ws://localhost:8000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            config.socket_url("https:", "feud.example"),
            "wss://feud.example/socket.io/?EIO=4&transport=websocket"
        );

        let config = Config {
            socket_url: Some(String::from("ws://other:5000/socket.io/?EIO=4&transport=websocket")),
            ..Default::default()
        };
        assert_eq!(
            config.socket_url("https:", "feud.example"),
            "ws://other:5000/socket.io/?EIO=4&transport=websocket"
        );
    }
}
