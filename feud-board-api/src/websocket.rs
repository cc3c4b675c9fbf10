use crate::Error;

use std::borrow::Cow;
use std::time::Duration;

/// A WebSocket connection.
///
/// The connection is automatically closed when the `WebSocket` is dropped.
#[derive(Debug)]
#[repr(transparent)]
pub struct WebSocket {
    #[cfg(not(target_family = "wasm"))]
    #[allow(unused)]
    inner: (),
    #[cfg(target_family = "wasm")]
    #[allow(unused)]
    inner: wasm::WebSocket,
}

impl WebSocket {
    /// Opens a new `WebSocket` connection using the given `uri`.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if creating the connection fails. Outside of the browser this
    /// always returns [`Error::Unsupported`].
    #[inline]
    pub fn new(uri: &str, handler: Box<dyn EventHandler>) -> Result<Self, Error> {
        log::debug!("Connecting to {}", uri);

        #[cfg(not(target_family = "wasm"))]
        {
            drop(handler);
            return Err(Error::Unsupported);
        }

        #[cfg(target_family = "wasm")]
        {
            let inner = wasm::WebSocket::new(uri, handler)?;
            Ok(Self { inner })
        }
    }
}

/// Receiver for messages from a [`WebSocket`].
pub trait EventHandler {
    /// Handles a message read from the connection. The returned messages are written back into
    /// the connection in order. Returning [`WebSocketMessage::Close`] closes the connection.
    fn dispatch(&mut self, msg: WebSocketMessage) -> Vec<WebSocketMessage>;

    /// Returns a new deadline for the next message, if the last dispatch set one. The
    /// connection is closed when a deadline passes before it is replaced.
    fn heartbeat(&mut self) -> Option<Duration> {
        None
    }
}

/// Builder for a [`WebSocket`].
pub struct WebSocketBuilder {
    uri: Cow<'static, str>,
    handler: Option<Box<dyn EventHandler>>,
}

impl WebSocketBuilder {
    /// Creates a new `WebSocketBuilder` using the given `uri` for the connection.
    pub fn new<T>(uri: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            uri: uri.into(),
            handler: None,
        }
    }

    /// Sets the [`EventHandler`] for the `WebSocket`.
    pub fn handler(mut self, handler: Box<dyn EventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Consumes the `WebSocketBuilder` and opens a new [`WebSocket`] using the parameters
    /// provided by the builder.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] when creating a new [`WebSocket `] fails. For more details see
    /// [`WebSocket::new`].
    pub fn build(self) -> Result<WebSocket, Error> {
        let handler = match self.handler {
            Some(handler) => handler,
            None => Box::new(DefaultHandler),
        };

        WebSocket::new(&self.uri, handler)
    }
}

struct DefaultHandler;

impl EventHandler for DefaultHandler {
    fn dispatch(&mut self, _msg: WebSocketMessage) -> Vec<WebSocketMessage> {
        Vec::new()
    }
}

/// A message that can be sent or received from a [`WebSocket`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebSocketMessage {
    Bytes(Vec<u8>),
    Text(String),
    Close,
}

#[cfg(target_family = "wasm")]
mod wasm {
    use super::{EventHandler, WebSocketMessage};
    use crate::Error;

    use futures::channel::oneshot;
    use futures::future::{Fuse, FutureExt};
    use futures::stream::SplitSink;
    use futures::{select, SinkExt, StreamExt};
    use gloo_timers::future::{sleep, TimeoutFuture};
    use reqwasm::websocket::{Message, WebSocketError};
    use wasm_bindgen_futures::spawn_local;

    type Writer = SplitSink<reqwasm::websocket::futures::WebSocket, Message>;

    /// Dropping the `WebSocket` stops the connection task.
    #[derive(Debug)]
    pub struct WebSocket {
        _close: oneshot::Sender<()>,
    }

    impl WebSocket {
        pub fn new(uri: &str, mut handler: Box<dyn EventHandler>) -> Result<Self, Error> {
            let ws = reqwasm::websocket::futures::WebSocket::open(uri)?;

            let (tx, rx) = oneshot::channel::<()>();

            spawn_local(async move {
                let (mut writer, reader) = ws.split();
                let mut reader = reader.fuse();
                let mut closed = rx.fuse();
                let mut deadline: Fuse<TimeoutFuture> = Fuse::terminated();

                'outer: loop {
                    select! {
                        _ = closed => {
                            log::debug!("ws handle dropped");
                            break;
                        }

                        _ = deadline => {
                            log::debug!("Connection timed out");
                            break;
                        }

                        msg = reader.next() => {
                            let replies = match msg {
                                Some(Ok(Message::Bytes(buf))) => {
                                    log::debug!("Received bytes from ws peer: {:?}", buf);
                                    handler.dispatch(WebSocketMessage::Bytes(buf))
                                }
                                Some(Ok(Message::Text(string))) => {
                                    log::debug!("Received text from ws peer: {:?}", string);
                                    handler.dispatch(WebSocketMessage::Text(string))
                                }
                                Some(Err(err)) => {
                                    log::error!("Failed to read from ws: {:?}", err);
                                    break;
                                }
                                None => {
                                    log::debug!("ws reader closed");
                                    break;
                                }
                            };

                            if let Some(timeout) = handler.heartbeat() {
                                deadline = sleep(timeout).fuse();
                            }

                            for reply in replies {
                                if reply == WebSocketMessage::Close {
                                    break 'outer;
                                }

                                if write(&mut writer, reply).await.is_err() {
                                    break 'outer;
                                }
                            }
                        }
                    }
                }

                let _ = writer.close().await;
                handler.dispatch(WebSocketMessage::Close);
                log::debug!("Dropped ws");
            });

            Ok(Self { _close: tx })
        }
    }

    async fn write(writer: &mut Writer, msg: WebSocketMessage) -> Result<(), WebSocketError> {
        let msg = match msg {
            WebSocketMessage::Bytes(buf) => Message::Bytes(buf),
            WebSocketMessage::Text(string) => Message::Text(string),
            WebSocketMessage::Close => return Ok(()),
        };

        match writer.send(msg).await {
            Ok(()) => Ok(()),
            Err(err) => {
                log::debug!("Failed to send buffer: {:?}", err);
                Err(err)
            }
        }
    }
}
