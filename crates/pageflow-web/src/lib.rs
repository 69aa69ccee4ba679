//! Browser binding for Pageflow
//!
//! Wires `pageflow-core` into a live page: DOM listeners, timers and
//! `IntersectionObserver`s are forwarded to a `PageController` as
//! `PageEvent`s, and the controller writes back through the browser host.
//!
//! ```js
//! import init, { Pageflow } from "./pageflow_web.js";
//!
//! await init();
//! const pageflow = new Pageflow();
//! pageflow.attach();
//! ```

mod host;
mod logging;
mod runtime;

use std::rc::Rc;

use pageflow_core::{PageflowConfig, PageflowError};
use wasm_bindgen::prelude::*;

pub use logging::{log, MakeConsoleWriter};

use runtime::Dispatcher;

fn to_js(err: PageflowError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Interaction controller bound to the current document
#[wasm_bindgen]
pub struct Pageflow {
    dispatcher: Rc<Dispatcher>,
}

#[wasm_bindgen]
impl Pageflow {
    /// Create a controller. `config_json` overrides any subset of the
    /// default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Pageflow, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let config = match config_json.as_deref() {
            Some(json) => PageflowConfig::from_json(json).map_err(to_js)?,
            None => PageflowConfig::default(),
        };
        let dispatcher = Dispatcher::new(config).map_err(to_js)?;
        Ok(Self { dispatcher })
    }

    /// Bind to the document. Returns false when already attached.
    #[wasm_bindgen]
    pub fn attach(&self) -> Result<bool, JsValue> {
        let attached = self.dispatcher.attach().map_err(to_js)?;
        if attached {
            log("Attached");
        }
        Ok(attached)
    }

    /// Remove listeners, stop timers and observers, close the menu.
    #[wasm_bindgen]
    pub fn detach(&self) {
        self.dispatcher.detach();
        log("Detached");
    }

    #[wasm_bindgen]
    pub fn is_menu_open(&self) -> bool {
        self.dispatcher.is_menu_open()
    }

    #[wasm_bindgen]
    pub fn open_menu(&self) -> bool {
        self.dispatcher.open_menu()
    }

    #[wasm_bindgen]
    pub fn close_menu(&self) -> bool {
        self.dispatcher.close_menu()
    }

    /// Number of DOM listeners currently bound
    #[wasm_bindgen]
    pub fn listener_count(&self) -> usize {
        self.dispatcher.listener_count()
    }

    /// Timeouts and intervals scheduled and not yet fired or cleared
    #[wasm_bindgen]
    pub fn timer_count(&self) -> usize {
        self.dispatcher.timer_count()
    }

    /// Live `IntersectionObserver`s
    #[wasm_bindgen]
    pub fn observer_count(&self) -> usize {
        self.dispatcher.observer_count()
    }

    /// Deferred images still waiting to load
    #[wasm_bindgen]
    pub fn pending_images(&self) -> usize {
        self.dispatcher.pending_images()
    }
}

/// Route `tracing` output to the console. `level` is one of `error`,
/// `warn`, `info`, `debug`, `trace` (default `info`).
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) -> Result<(), JsValue> {
    let level = match level.as_deref() {
        Some(name) => logging::parse_level(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown log level: {name}")))?,
        None => tracing::Level::INFO,
    };
    logging::init(level);
    Ok(())
}

/// The default configuration as JSON, as a starting point for overrides.
#[wasm_bindgen]
pub fn default_config() -> Result<String, JsValue> {
    serde_json::to_string_pretty(&PageflowConfig::default())
        .map_err(|err| to_js(PageflowError::from(err)))
}

/// Create a controller and attach it in one step.
#[wasm_bindgen]
pub fn start(config_json: Option<String>) -> Result<Pageflow, JsValue> {
    let pageflow = Pageflow::new(config_json)?;
    pageflow.attach()?;
    Ok(pageflow)
}
