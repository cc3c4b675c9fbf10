pub mod channel;
pub mod http;
pub mod socketio;
pub mod state;
pub mod websocket;

use std::borrow::Cow;

use crate::channel::ChannelBuilder;
use crate::state::StateClient;

pub use crate::state::{ActiveTeam, GameState};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] http::Error),
    #[error("unexpected status code: {0}")]
    Status(::http::StatusCode),
    #[error("request rejected with {status}: {message}")]
    Rejected {
        status: ::http::StatusCode,
        message: String,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(target_family = "wasm")]
    #[error("websocket: {0}")]
    WebSocket(#[from] gloo_utils::errors::JsError),
    #[error("socket.io: {0}")]
    Protocol(#[from] socketio::Error),
    #[error("not supported on this target")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, Error>;

/// The client for the scoreboard server.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: Cow<'static, str>,
    http: http::Client,
}

impl Client {
    /// Creates a new `Client` sending all requests to `base_url`. An empty `base_url` sends
    /// requests relative to the current origin.
    pub fn new<T>(base_url: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            base_url: base_url.into(),
            http: http::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> StateClient<'_> {
        StateClient::new(self)
    }

    /// Returns a [`ChannelBuilder`] for a Socket.IO connection at `uri`.
    pub fn channel<T>(&self, uri: T) -> ChannelBuilder
    where
        T: Into<Cow<'static, str>>,
    {
        ChannelBuilder::new(uri)
    }

    pub(crate) fn request(&self) -> http::RequestBuilder {
        http::RequestBuilder::new(self.base_url.to_string())
    }

    pub(crate) async fn send(&self, request: http::Request) -> Result<http::Response> {
        self.http.send(request).await
    }
}
