//! Subscription to a single Socket.IO namespace.
use std::borrow::Cow;
use std::time::Duration;

use serde_json::Value;

use crate::socketio::{Action, Session};
use crate::websocket::{EventHandler, WebSocket, WebSocketBuilder, WebSocketMessage};
use crate::Result;

/// Receiver for the events of a [`Channel`].
pub trait ChannelHandler {
    /// Called once the server accepted the namespace connection.
    fn connected(&mut self) {}

    fn event(&mut self, name: &str, args: Vec<Value>);

    /// Called exactly once when the underlying connection is closed.
    fn disconnected(&mut self) {}
}

/// An open Socket.IO connection to one namespace.
///
/// The connection is closed when the `Channel` is dropped, or when the server misses a
/// heartbeat.
#[derive(Debug)]
pub struct Channel {
    _ws: WebSocket,
}

/// Builder for a [`Channel`].
pub struct ChannelBuilder {
    uri: Cow<'static, str>,
    namespace: Cow<'static, str>,
    handler: Option<Box<dyn ChannelHandler>>,
}

impl ChannelBuilder {
    /// Creates a new `ChannelBuilder` connecting to the root namespace at `uri`.
    pub fn new<T>(uri: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            uri: uri.into(),
            namespace: Cow::Borrowed("/"),
            handler: None,
        }
    }

    pub fn namespace<T>(mut self, namespace: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.namespace = namespace.into();
        self
    }

    pub fn handler(mut self, handler: Box<dyn ChannelHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<Channel> {
        let handler = match self.handler {
            Some(handler) => handler,
            None => Box::new(DefaultHandler),
        };

        let ws = WebSocketBuilder::new(self.uri)
            .handler(Box::new(SessionHandler::new(
                Session::new(self.namespace.into_owned()),
                handler,
            )))
            .build()?;

        Ok(Channel { _ws: ws })
    }
}

struct DefaultHandler;

impl ChannelHandler for DefaultHandler {
    fn event(&mut self, _name: &str, _args: Vec<Value>) {}
}

/// Drives a [`Session`] from the frames of a [`WebSocket`].
struct SessionHandler {
    session: Session,
    handler: Box<dyn ChannelHandler>,
    heartbeat: Option<Duration>,
}

impl SessionHandler {
    fn new(session: Session, handler: Box<dyn ChannelHandler>) -> Self {
        Self {
            session,
            handler,
            heartbeat: None,
        }
    }
}

impl EventHandler for SessionHandler {
    fn dispatch(&mut self, msg: WebSocketMessage) -> Vec<WebSocketMessage> {
        let frame = match msg {
            WebSocketMessage::Text(frame) => frame,
            WebSocketMessage::Bytes(buf) => {
                log::warn!("Dropping {} byte binary frame", buf.len());
                return Vec::new();
            }
            WebSocketMessage::Close => {
                self.handler.disconnected();
                return Vec::new();
            }
        };

        let actions = match self.session.handle(&frame) {
            Ok(actions) => actions,
            Err(err) => {
                log::error!("Failed to decode socket.io frame {:?}: {}", frame, err);
                return Vec::new();
            }
        };

        let mut replies = Vec::new();
        for action in actions {
            match action {
                Action::Send(frame) => replies.push(WebSocketMessage::Text(frame)),
                Action::Connected => self.handler.connected(),
                Action::Event { name, args } => self.handler.event(&name, args),
                Action::Heartbeat(timeout) => self.heartbeat = Some(timeout),
                Action::Close => replies.push(WebSocketMessage::Close),
            }
        }

        replies
    }

    fn heartbeat(&mut self) -> Option<Duration> {
        self.heartbeat.take()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::{ChannelHandler, SessionHandler};
    use crate::socketio::Session;
    use crate::websocket::{EventHandler, WebSocketMessage};

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Connected,
        Event(String, Vec<Value>),
        Disconnected,
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Event>>>);

    impl ChannelHandler for Recorder {
        fn connected(&mut self) {
            self.0.borrow_mut().push(Event::Connected);
        }

        fn event(&mut self, name: &str, args: Vec<Value>) {
            self.0.borrow_mut().push(Event::Event(name.to_owned(), args));
        }

        fn disconnected(&mut self) {
            self.0.borrow_mut().push(Event::Disconnected);
        }
    }

    fn text(s: &str) -> WebSocketMessage {
        WebSocketMessage::Text(s.to_owned())
    }

    #[test]
    fn test_session_handler() {
        let recorder = Recorder::default();
        let mut handler = SessionHandler::new(Session::new("/game"), Box::new(recorder.clone()));

        let replies = handler.dispatch(text(r#"0{"sid":"a","pingInterval":25000}"#));
        assert_eq!(replies, vec![text("40/game,")]);
        assert_eq!(handler.heartbeat(), Some(Duration::from_secs(25)));
        assert_eq!(handler.heartbeat(), None);

        assert!(handler.dispatch(text(r#"40/game,{"sid":"b"}"#)).is_empty());
        assert!(handler
            .dispatch(text(r#"42/game,["state_update",{"team1Score":1}]"#))
            .is_empty());
        assert_eq!(handler.heartbeat(), None);

        assert_eq!(handler.dispatch(text("2")), vec![text("3")]);
        assert_eq!(handler.heartbeat(), Some(Duration::from_secs(25)));

        // Malformed frames are dropped.
        assert!(handler.dispatch(text("42/game,[")).is_empty());
        assert!(handler.dispatch(WebSocketMessage::Bytes(vec![1, 2])).is_empty());

        assert_eq!(
            handler.dispatch(text("41/game,")),
            vec![WebSocketMessage::Close]
        );
        assert!(handler.dispatch(WebSocketMessage::Close).is_empty());

        assert_eq!(
            *recorder.0.borrow(),
            vec![
                Event::Connected,
                Event::Event(String::from("state_update"), vec![json!({"team1Score": 1})]),
                Event::Disconnected,
            ]
        );
    }
}
