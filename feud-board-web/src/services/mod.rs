use std::cell::RefCell;
use std::rc::Rc;

use feud_board_api::channel::ChannelHandler;
use feud_board_api::Client;
use futures::channel::oneshot;
use gloo_timers::future::sleep;
use serde_json::Value;
use wasm_bindgen_futures::spawn_local;

use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::dom::Document;
use crate::mirror::StateMirror;

pub type SharedMirror<D> = Rc<RefCell<StateMirror<D>>>;

/// Keeps a [`StateMirror`] fed with the state of the server.
pub struct StateService<D> {
    client: Client,
    config: Rc<Config>,
    mirror: SharedMirror<D>,
}

impl<D> StateService<D>
where
    D: Document + 'static,
{
    pub fn new(config: Config, mirror: StateMirror<D>) -> Self {
        Self {
            client: Client::new(config.api_base.clone()),
            config: Rc::new(config),
            mirror: Rc::new(RefCell::new(mirror)),
        }
    }

    /// Subscribes to the state broadcasts and loads the initial state. `socket_url` is the
    /// websocket url of the Socket.IO endpoint.
    pub fn start(&self, socket_url: String) {
        self.subscribe(socket_url);
        self.load_initial();
    }

    /// Fetches the current state once. Failures are only reported.
    fn load_initial(&self) {
        let client = self.client.clone();
        let mirror = self.mirror.clone();

        spawn_local(async move {
            let res = client.state().get_raw().await;
            complete_initial(&mut mirror.borrow_mut(), res);
        });
    }

    /// Keeps a channel open for the lifetime of the page, reconnecting after a delay whenever
    /// it closes.
    fn subscribe(&self, socket_url: String) {
        let client = self.client.clone();
        let config = self.config.clone();
        let mirror = self.mirror.clone();

        spawn_local(async move {
            loop {
                let (tx, rx) = oneshot::channel();

                let handler = Handler {
                    event: config.event.clone(),
                    mirror: mirror.clone(),
                    closed: Some(tx),
                };

                let channel = client
                    .channel(socket_url.clone())
                    .namespace(config.namespace.clone())
                    .handler(Box::new(handler))
                    .build();

                match channel {
                    Ok(channel) => {
                        // Resolves once the connection closed.
                        let _ = rx.await;
                        drop(channel);
                    }
                    Err(err) => mirror.borrow_mut().report(Diagnostic::ChannelFailed(err)),
                }

                log::debug!("Reconnecting in {}ms", config.reconnect_delay);
                sleep(config.reconnect_delay()).await;
            }
        });
    }
}

/// Renders the result of the initial fetch. A failure leaves the page untouched.
fn complete_initial<D>(mirror: &mut StateMirror<D>, res: feud_board_api::Result<Value>)
where
    D: Document,
{
    match res {
        Ok(raw) => {
            mirror.apply_value(raw);
        }
        Err(err) => mirror.report(Diagnostic::FetchFailed(err)),
    }
}

struct Handler<D> {
    event: String,
    mirror: SharedMirror<D>,
    closed: Option<oneshot::Sender<()>>,
}

impl<D> ChannelHandler for Handler<D>
where
    D: Document,
{
    fn connected(&mut self) {
        self.mirror.borrow_mut().report(Diagnostic::Connected);
    }

    fn event(&mut self, name: &str, args: Vec<Value>) {
        if name != self.event {
            log::trace!("Ignoring event {}", name);
            return;
        }

        let raw = args.into_iter().next().unwrap_or(Value::Null);
        self.mirror.borrow_mut().apply_value(raw);
    }

    fn disconnected(&mut self) {
        self.mirror.borrow_mut().report(Diagnostic::Disconnected);

        if let Some(tx) = self.closed.take() {
            let _ = tx.send(());
        }
    }
}
