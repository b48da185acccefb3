//! Browser console logging.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_web::MakeWebConsoleWriter;
use wasm_bindgen::prelude::*;

pub const DEFAULT_FILTER: &str = "info,scrollcam_core=info,scrollcam_web=info";

/// Installs the panic hook and a console tracing subscriber. Only the first
/// call installs anything.
pub fn init(filter: &str) {
    console_error_panic_hook::set_once();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// `initLogging("debug")` from JS; defaults to [`DEFAULT_FILTER`].
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) {
    init(filter.as_deref().unwrap_or(DEFAULT_FILTER));
}
