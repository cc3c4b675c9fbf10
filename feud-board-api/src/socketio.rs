//! Client side of the Engine.IO (protocol 4) and Socket.IO (protocol 5) text framing.
//!
//! Only the parts required to join a namespace and receive events are implemented. Binary
//! attachments are not supported.
use std::fmt::Write;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// The query string selecting the Engine.IO protocol and the websocket transport.
pub const TRANSPORT_QUERY: &str = "EIO=4&transport=websocket";

/// An error which can occur while decoding a packet.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("empty packet")]
    Empty,
    #[error("invalid packet type: {0:?}")]
    InvalidType(char),
    #[error("invalid ack id")]
    InvalidAckId,
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("invalid event")]
    InvalidEvent,
    #[error("binary packets are not supported")]
    Binary,
}

/// The handshake sent by the server in the Engine.IO `open` packet.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

impl Handshake {
    /// Returns the longest time the server may stay silent between two pings. This is `None`
    /// if the server did not announce any heartbeat.
    pub fn heartbeat(&self) -> Option<Duration> {
        match self.ping_interval.saturating_add(self.ping_timeout) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// An Engine.IO packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnginePacket<'a> {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    /// A message carrying an encoded [`Packet`].
    Message(&'a str),
    Upgrade,
    Noop,
}

impl<'a> EnginePacket<'a> {
    pub fn decode(frame: &'a str) -> Result<Self, Error> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(Error::Empty)?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(rest)),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            // Base64 encoded binary message.
            'b' => Err(Error::Binary),
            c => Err(Error::InvalidType(c)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            // Never sent by a client.
            Self::Open(_) => String::from("0"),
            Self::Close => String::from("1"),
            Self::Ping => String::from("2"),
            Self::Pong => String::from("3"),
            Self::Message(msg) => format!("4{}", msg),
            Self::Upgrade => String::from("5"),
            Self::Noop => String::from("6"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PacketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl PacketKind {
    #[inline]
    pub fn to_char(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
            Self::BinaryEvent => '5',
            Self::BinaryAck => '6',
        }
    }

    #[inline]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Connect),
            '1' => Some(Self::Disconnect),
            '2' => Some(Self::Event),
            '3' => Some(Self::Ack),
            '4' => Some(Self::ConnectError),
            '5' => Some(Self::BinaryEvent),
            '6' => Some(Self::BinaryAck),
            _ => None,
        }
    }
}

/// A Socket.IO packet.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    pub kind: PacketKind,
    pub namespace: String,
    pub id: Option<u64>,
    pub data: Option<Value>,
}

impl Packet {
    /// Creates a new `CONNECT` packet for the given `namespace`.
    pub fn connect<T>(namespace: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            kind: PacketKind::Connect,
            namespace: namespace.into(),
            id: None,
            data: None,
        }
    }

    pub fn decode(msg: &str) -> Result<Self, Error> {
        let mut chars = msg.chars();
        let c = chars.next().ok_or(Error::Empty)?;
        let kind = PacketKind::from_char(c).ok_or(Error::InvalidType(c))?;

        if matches!(kind, PacketKind::BinaryEvent | PacketKind::BinaryAck) {
            return Err(Error::Binary);
        }

        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(index) => {
                    let namespace = &rest[..index];
                    rest = &rest[index + 1..];
                    namespace
                }
                None => {
                    let namespace = rest;
                    rest = "";
                    namespace
                }
            }
        } else {
            "/"
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            let id = rest[..digits].parse().map_err(|_| Error::InvalidAckId)?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        Ok(Self {
            kind,
            namespace: namespace.to_owned(),
            id,
            data,
        })
    }

    pub fn encode(&self) -> String {
        let mut buf = String::new();
        buf.push(self.kind.to_char());

        if self.namespace != "/" {
            buf.push_str(&self.namespace);
            buf.push(',');
        }

        if let Some(id) = self.id {
            let _ = write!(buf, "{}", id);
        }

        if let Some(data) = &self.data {
            buf.push_str(&data.to_string());
        }

        buf
    }

    /// Splits an `EVENT` packet into the event name and its arguments.
    pub fn into_event(self) -> Result<(String, Vec<Value>), Error> {
        let mut args = match self.data {
            Some(Value::Array(args)) => args.into_iter(),
            _ => return Err(Error::InvalidEvent),
        };

        match args.next() {
            Some(Value::String(name)) => Ok((name, args.collect())),
            _ => Err(Error::InvalidEvent),
        }
    }
}

/// An outcome of feeding a frame into a [`Session`].
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Send the frame to the server.
    Send(String),
    /// The namespace accepted the connection.
    Connected,
    Event { name: String, args: Vec<Value> },
    /// The next ping must arrive within the given time, otherwise the connection is dead.
    Heartbeat(Duration),
    /// The session ended. The transport should be closed.
    Close,
}

/// The client state of a single Socket.IO connection to one namespace.
#[derive(Clone, Debug)]
pub struct Session {
    namespace: String,
    connected: bool,
    heartbeat: Option<Duration>,
}

impl Session {
    pub fn new<T>(namespace: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            connected: false,
            heartbeat: None,
        }
    }

    /// Returns `true` once the server acknowledged the namespace connection.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Handles a single text frame read from the transport.
    pub fn handle(&mut self, frame: &str) -> Result<Vec<Action>, Error> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                log::debug!(
                    "Engine.IO session {} opened (ping interval {}ms)",
                    handshake.sid,
                    handshake.ping_interval
                );

                let packet = Packet::connect(self.namespace.clone()).encode();
                let mut actions = vec![Action::Send(EnginePacket::Message(&packet).encode())];

                self.heartbeat = handshake.heartbeat();
                actions.extend(self.heartbeat.map(Action::Heartbeat));
                Ok(actions)
            }
            EnginePacket::Ping => {
                let mut actions = vec![Action::Send(EnginePacket::Pong.encode())];
                actions.extend(self.heartbeat.map(Action::Heartbeat));
                Ok(actions)
            }
            EnginePacket::Close => {
                self.connected = false;
                Ok(vec![Action::Close])
            }
            EnginePacket::Message(msg) => self.handle_packet(Packet::decode(msg)?),
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => Ok(Vec::new()),
        }
    }

    fn handle_packet(&mut self, packet: Packet) -> Result<Vec<Action>, Error> {
        if packet.namespace != self.namespace {
            log::trace!("Ignoring packet for namespace {}", packet.namespace);
            return Ok(Vec::new());
        }

        match packet.kind {
            PacketKind::Connect => {
                self.connected = true;
                Ok(vec![Action::Connected])
            }
            PacketKind::Disconnect => {
                self.connected = false;
                Ok(vec![Action::Close])
            }
            PacketKind::ConnectError => {
                log::warn!(
                    "Server refused connection to {}: {}",
                    self.namespace,
                    packet.data.unwrap_or(Value::Null)
                );

                self.connected = false;
                Ok(vec![Action::Close])
            }
            PacketKind::Event => {
                let (name, args) = packet.into_event()?;
                Ok(vec![Action::Event { name, args }])
            }
            PacketKind::Ack | PacketKind::BinaryEvent | PacketKind::BinaryAck => Ok(Vec::new()),
        }
    }
}
