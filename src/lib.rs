//! viewport-adapter
//!
//! Makes a browser game behave on phones and tablets. On handheld devices the
//! page asks for a landscape orientation lock, goes fullscreen on the first
//! touch or click and, where the lock is unavailable, covers the page with a
//! "please rotate your device" prompt while the device is held upright.
//! Desktop sessions are left untouched.
//!
//! The logic is written against the [`host::Host`] trait so it runs natively
//! against a simulated page as well as in the browser, where `web::WebHost`
//! backs it with `web-sys`.
//!
//! High-level modules
//! - `adapter`: the [`ViewportAdapter`] and its page lifecycle
//! - `capability`: ordered tables of standard and vendor-prefixed presentation APIs
//! - `config`: thresholds, delays and prompt texts
//! - `host`: the seam to the browser (DOM, listeners, timers, reflection)
//! - `overlay`: rotation prompt markup and the injected touch style
//! - `profile`: viewport orientation and handheld detection
//! - `web`: the wasm32 host and entry point
//!

pub mod adapter;
pub mod capability;
pub mod config;
pub mod host;
pub mod overlay;
pub mod profile;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use adapter::ViewportAdapter;
pub use config::AdapterConfig;
pub use profile::{DeviceProfile, Orientation, Viewport};

/// Installs the platform logger: `console_log` in the browser, `env_logger`
/// everywhere else. A logger that is already installed is kept.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize console logger: {}", e);
        }
    }
}
