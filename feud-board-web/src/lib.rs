pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod logger;
pub mod mirror;
pub mod render;
pub mod services;

use js_sys::{Function, Reflect};
use log::LevelFilter;
use wasm_bindgen::prelude::*;

pub use config::Config;
pub use mirror::StateMirror;

use render::JsHook;
use services::StateService;

/// The names of the host page hooks, in the order they are called.
pub const HOOKS: [&str; 2] = ["renderState", "onStateUpdate"];

/// Starts mirroring the game state into the current page.
///
/// `render_state` and `on_state_update` are called with every snapshot before the built-in team
/// widgets are updated.
#[wasm_bindgen]
pub fn run(config: JsValue, render_state: Option<Function>, on_state_update: Option<Function>) {
    init_logger();
    let config = parse_config(config);

    let hooks = HOOKS
        .into_iter()
        .zip([render_state, on_state_update])
        .filter_map(|(name, func)| func.map(|func| JsHook::new(name, func)))
        .collect();

    run_with_config(config, hooks);
}

/// Same as [`run`], using the hooks defined as globals on `window` at the time of the call.
#[wasm_bindgen(js_name = runWithGlobals)]
pub fn run_with_globals(config: JsValue) {
    init_logger();
    let config = parse_config(config);

    let window = gloo_utils::window();
    let hooks = HOOKS
        .into_iter()
        .filter_map(|name| {
            let value = Reflect::get(&window, &JsValue::from_str(name)).ok()?;
            let func = value.dyn_into::<Function>().ok()?;
            Some(JsHook::new(name, func))
        })
        .collect();

    run_with_config(config, hooks);
}

pub fn run_with_config(config: Config, hooks: Vec<JsHook>) {
    log::set_max_level(config.log_level);

    let window = gloo_utils::window();
    let document = gloo_utils::document();

    let mut builder = StateMirror::builder(document);
    for hook in hooks {
        log::debug!("Registering hook {}", render::Renderer::name(&hook));
        builder = builder.hook(hook);
    }

    let location = window.location();
    let socket_url = config.socket_url(
        &location.protocol().unwrap_or_default(),
        &location.host().unwrap_or_default(),
    );

    let service = StateService::new(config, builder.build());
    service.start(socket_url);
}

fn init_logger() {
    // SAFETY: Called from a single threaded context. No race conditions can occur.
    unsafe {
        logger::init(LevelFilter::Trace);
    }
}

fn parse_config(config: JsValue) -> Config {
    if config.is_undefined() || config.is_null() {
        return Config::default();
    }

    match serde_wasm_bindgen::from_value(config) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid config, using defaults: {}", err);
            Config::default()
        }
    }
}
